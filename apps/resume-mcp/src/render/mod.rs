//! Template rendering. Executes a user template against a resume record,
//! wraps the output in the preview HTML shell and optionally prints it to PDF.
//!
//! Templates are Handlebars in strict mode: referencing a field the record
//! does not have is an execution error naming that field.

mod pdf;
mod shell;

use std::sync::Arc;

use chrono::NaiveDate;
use handlebars::{handlebars_helper, Handlebars, Template};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ResumeRecord, DATE_FORMAT};

pub use pdf::{ChromePdfPrinter, PdfPrinter};
pub use shell::ShellOptions;

const TEMPLATE_NAME: &str = "resume";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template parse error: {0}")]
    Parse(String),

    #[error("Template execution error: {0}")]
    Execution(String),

    #[error("PDF generation error: {0}")]
    Pdf(String),
}

// `{{format_date start_date "%b %Y"}}`; null renders as empty, unparseable input passes through.
handlebars_helper!(format_date: |date: Json, pattern: str| {
    match date.as_str() {
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(|d| d.format(pattern).to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => String::new(),
    }
});

#[derive(Clone)]
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
    printer: Arc<dyn PdfPrinter>,
}

impl TemplateRenderer {
    pub fn new(printer: Arc<dyn PdfPrinter>) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_helper("format_date", Box::new(format_date));
        TemplateRenderer { registry, printer }
    }

    /// Executes `template` against `resume` and returns the bare body fragment.
    pub fn render_body(&self, template: &str, resume: &ResumeRecord) -> Result<String, RenderError> {
        let compiled = Template::compile(template).map_err(|e| {
            debug!("Template parse error: {e}");
            RenderError::Parse(e.to_string())
        })?;

        // The shared registry only holds helpers; each render gets its own copy.
        let mut registry = self.registry.clone();
        registry.register_template(TEMPLATE_NAME, compiled);
        registry.render(TEMPLATE_NAME, resume).map_err(|e| {
            debug!("Template execution error: {e}");
            RenderError::Execution(e.to_string())
        })
    }

    /// Full preview document: HTML shell, optional CSS block, optional download bar.
    pub fn render_html(
        &self,
        template: &str,
        css: &str,
        resume: &ResumeRecord,
        options: &ShellOptions,
    ) -> Result<String, RenderError> {
        let body = self.render_body(template, resume)?;
        Ok(shell::wrap(&body, css, options))
    }

    /// Trial render with no CSS, used to reject templates before they are stored.
    pub fn validate(&self, template: &str, resume: &ResumeRecord) -> Result<(), RenderError> {
        self.render_body(template, resume).map(|_| ())
    }

    /// Renders without the download bar and prints the page to PDF.
    pub async fn render_pdf(
        &self,
        template: &str,
        css: &str,
        resume: &ResumeRecord,
    ) -> Result<Vec<u8>, RenderError> {
        let html = self.render_html(template, css, resume, &ShellOptions::default())?;
        self.printer.print(&html).await.map_err(|e| {
            warn!(resume_id = resume.resume.id, "PDF generation failed: {e}");
            e
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::{
        ContactRow, ExperienceRecord, ExperienceRef, FeatureMap, ResumeRow, WorkExperienceRow,
    };

    /// Returns the HTML it was given as the "PDF" bytes.
    pub struct EchoPrinter;

    #[async_trait]
    impl PdfPrinter for EchoPrinter {
        async fn print(&self, html: &str) -> Result<Vec<u8>, RenderError> {
            Ok(html.as_bytes().to_vec())
        }
    }

    pub fn renderer() -> TemplateRenderer {
        TemplateRenderer::new(Arc::new(EchoPrinter))
    }

    pub fn sample_record() -> ResumeRecord {
        ResumeRecord {
            resume: ResumeRow {
                id: 1,
                name: "John Doe".into(),
                photo: String::new(),
                description: "Backend <engineer>".into(),
                owner_id: String::new(),
                created_at: "2024-01-01T00:00:00+00:00".into(),
                updated_at: "2024-01-01T00:00:00+00:00".into(),
            },
            contacts: vec![ContactRow {
                id: 1,
                resume_id: 1,
                key: "email".into(),
                value: "john@example.com".into(),
            }],
            work_experiences: vec![ExperienceRecord {
                entry: WorkExperienceRow {
                    id: 1,
                    resume_id: 1,
                    company: "Acme".into(),
                    job_title: "Engineer".into(),
                    employment_type: "fulltime".into(),
                    start_date: "2021-03-01".into(),
                    end_date: String::new(),
                },
                feature_maps: vec![FeatureMap {
                    id: 1,
                    experience: ExperienceRef::Work(1),
                    key: "skill".into(),
                    value: "Rust".into(),
                    category: String::new(),
                }],
            }],
            educations: vec![],
            other_experiences: vec![],
        }
    }

    #[test]
    fn test_render_simple_template() {
        let html = renderer()
            .render_html("<h1>{{name}}</h1>", "", &sample_record(), &ShellOptions::default())
            .unwrap();
        assert!(html.contains("<h1>John Doe</h1>"));
        assert!(html.contains(r#"<script src="https://cdn.tailwindcss.com"></script>"#));
        assert!(html.contains("<title>Resume Preview</title>"));
        assert!(!html.contains("<style>"));
    }

    #[test]
    fn test_render_nested_collections() {
        let template = "{{#each contacts}}<li>{{key}}: {{value}}</li>{{/each}}\
                        {{#each work_experiences}}<p>{{company}} {{format_date start_date \"%b %Y\"}}\
                        {{#each feature_maps}} [{{key}}={{value}}]{{/each}}</p>{{/each}}";
        let body = renderer().render_body(template, &sample_record()).unwrap();
        assert_eq!(
            body,
            "<li>email: john@example.com</li><p>Acme Mar 2021 [skill=Rust]</p>"
        );
    }

    #[test]
    fn test_values_are_html_escaped() {
        let body = renderer().render_body("{{description}}", &sample_record()).unwrap();
        assert_eq!(body, "Backend &lt;engineer&gt;");
    }

    #[test]
    fn test_missing_field_is_execution_error_naming_field() {
        let err = renderer()
            .render_body("<p>{{nickname}}</p>", &sample_record())
            .unwrap_err();
        match err {
            RenderError::Execution(msg) => assert!(msg.contains("nickname"), "{msg}"),
            other => panic!("expected execution error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_template_is_parse_error() {
        let err = renderer()
            .validate("{{#each contacts}}<p>unclosed", &sample_record())
            .unwrap_err();
        assert!(matches!(err, RenderError::Parse(_)));
    }

    #[test]
    fn test_format_date_handles_null() {
        let body = renderer()
            .render_body(
                "{{#each work_experiences}}[{{format_date end_date \"%Y\"}}]{{/each}}",
                &sample_record(),
            )
            .unwrap();
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_render_pdf_omits_download_bar() {
        let bytes = renderer()
            .render_pdf("<h1>{{name}}</h1>", "h1 { color: red; }", &sample_record())
            .await
            .unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.contains("<style>h1 { color: red; }</style>"));
        assert!(!html.contains("download-btn"));
    }
}
