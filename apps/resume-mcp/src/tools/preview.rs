use serde_json::Value;

use super::params::{optional_str, required_id, required_str, string_schema};
use super::{OrFail, ToolDefinition, ToolError, ToolOutput, Toolbox};
use crate::models::AuthContext;
use crate::render::ShellOptions;

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "generate_preview",
            description: "Generate an HTML preview of a resume using a saved template. Returns a \
                          preview URL and a PDF download URL. Templates include Tailwind CSS.",
            input_schema: string_schema(
                &[
                    ("resume_id", "The ID of the resume to generate preview for"),
                    ("template_id", "The ID of the template to use for rendering"),
                ],
                &[("css", "Additional CSS for the preview")],
            ),
        },
        ToolDefinition {
            name: "update_preview_style",
            description: "Replace the CSS of an existing preview session.",
            input_schema: string_schema(
                &[
                    ("session_id", "The session ID of the preview to update"),
                    ("css", "New CSS styles for the preview"),
                ],
                &[],
            ),
        },
    ]
}

pub async fn generate_preview(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    let template_id = required_id(args, "template_id")?;
    let css = optional_str(args, "css")?.unwrap_or_default();

    let record = tb
        .repo
        .get_resume_record(auth, resume_id)
        .await
        .or_fail("Error getting resume")?;
    let template = tb
        .repo
        .get_template(auth, template_id)
        .await
        .or_fail("Error getting template")?;
    if template.resume_id != resume_id {
        return Err(ToolError::Failed(
            "Template does not belong to the specified resume".to_string(),
        ));
    }

    // Render once up front so a broken template never gets a session.
    tb.renderer
        .render_html(&template.template_body, css, &record, &ShellOptions::default())
        .or_fail("Error generating preview")?;

    let session = tb
        .repo
        .create_preview_session(auth, resume_id, &template.template_body, css)
        .await
        .or_fail("Error generating preview")?;

    Ok(ToolOutput::texts([
        format!("Preview: {}\n", tb.urls.preview(&session.id)),
        format!("Download PDF: {}", tb.urls.download(&session.id)),
    ]))
}

pub async fn update_preview_style(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let session_id = required_str(args, "session_id")?;
    let css = required_str(args, "css")?;

    let session = tb
        .repo
        .update_preview_css(auth, session_id, css)
        .await
        .or_fail("Error updating preview style")?;

    Ok(ToolOutput::text(format!(
        "Preview style updated successfully. URL: {}",
        tb.urls.preview(&session.id)
    )))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tools::tests::{embedded_json, toolbox};

    async fn seed(tb: &Toolbox, name: &str, body: &str) -> (String, String) {
        let auth = AuthContext::local();
        let resume = tb
            .call("create_resume", &json!({ "name": name, "description": "d" }), &auth)
            .await
            .unwrap();
        let resume_id = embedded_json(&resume)["id"].as_i64().unwrap().to_string();
        let template = tb
            .call(
                "create_template",
                &json!({ "resume_id": resume_id, "name": "t", "template_data": body }),
                &auth,
            )
            .await
            .unwrap();
        let template_id = embedded_json(&template)["template_id"]
            .as_i64()
            .unwrap()
            .to_string();
        (resume_id, template_id)
    }

    async fn session_count(tb: &Toolbox) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM preview_sessions")
            .fetch_one(tb.repo.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_preview_returns_both_urls() {
        let (tb, _dir) = toolbox().await;
        let (resume_id, template_id) = seed(&tb, "John Doe", "<h1>{{name}}</h1>").await;

        let out = tb
            .call(
                "generate_preview",
                &json!({ "resume_id": resume_id, "template_id": template_id }),
                &AuthContext::local(),
            )
            .await
            .unwrap();

        assert!(!out.is_error, "{}", out.joined_text());
        assert_eq!(out.content.len(), 2);
        let text = out.joined_text();
        assert!(text.contains("Preview: http://localhost:8080/resume/preview/"));
        assert!(text.contains("Download PDF: http://localhost:8080/resume/download/"));
        assert_eq!(session_count(&tb).await, 1);
    }

    #[tokio::test]
    async fn test_foreign_template_rejected_before_session_created() {
        let (tb, _dir) = toolbox().await;
        let (resume_a, _) = seed(&tb, "A", "<p>{{name}}</p>").await;
        let (_, template_b) = seed(&tb, "B", "<p>{{name}}</p>").await;

        let out = tb
            .call(
                "generate_preview",
                &json!({ "resume_id": resume_a, "template_id": template_b }),
                &AuthContext::local(),
            )
            .await
            .unwrap();

        assert!(out.is_error);
        assert_eq!(
            out.joined_text(),
            "Template does not belong to the specified resume"
        );
        assert_eq!(session_count(&tb).await, 0);
    }

    #[tokio::test]
    async fn test_update_preview_style() {
        let (tb, _dir) = toolbox().await;
        let auth = AuthContext::local();
        let (resume_id, template_id) = seed(&tb, "John Doe", "<h1>{{name}}</h1>").await;
        tb.call(
            "generate_preview",
            &json!({ "resume_id": resume_id, "template_id": template_id }),
            &auth,
        )
        .await
        .unwrap();
        let session_id: String = sqlx::query_scalar("SELECT id FROM preview_sessions")
            .fetch_one(tb.repo.pool())
            .await
            .unwrap();

        let out = tb
            .call(
                "update_preview_style",
                &json!({ "session_id": session_id, "css": "h1 { color: red; }" }),
                &auth,
            )
            .await
            .unwrap();
        assert_eq!(
            out.joined_text(),
            format!("Preview style updated successfully. URL: http://localhost:8080/resume/preview/{session_id}")
        );

        let missing = tb
            .call(
                "update_preview_style",
                &json!({ "session_id": "nope", "css": "" }),
                &auth,
            )
            .await
            .unwrap();
        assert!(missing.is_error);
    }
}
