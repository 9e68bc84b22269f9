use std::fmt::Display;

use serde_json::{json, Value};

use super::params::{optional_id, optional_string, required_id, required_str, string_schema};
use super::{to_json, OrFail, ToolDefinition, ToolError, ToolOutput, Toolbox};
use crate::errors::AppError;
use crate::models::{AuthContext, NewTemplate, ResumeRecord, TemplatePatch};

const TEMPLATE_GUIDE: &str = "Templates are Handlebars rendered against the full resume record \
(call get_resume_context for its schema). Tailwind CSS is available. Referencing a field that \
does not exist is an error. Example:\n\
<div class=\"max-w-4xl mx-auto p-8\">\n\
  <h1 class=\"text-3xl font-bold\">{{name}}</h1>\n\
  <p>{{description}}</p>\n\
  {{#each contacts}}<p>{{key}}: {{value}}</p>{{/each}}\n\
  {{#each work_experiences}}\n\
    <h3>{{job_title}} at {{company}}</h3>\n\
    <p>{{format_date start_date \"%b %Y\"}} - {{#if end_date}}{{format_date end_date \"%b %Y\"}}{{else}}Present{{/if}}</p>\n\
    {{#each feature_maps}}<p>{{key}}: {{value}}</p>{{/each}}\n\
  {{/each}}\n\
</div>";

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "create_template",
            description: TEMPLATE_GUIDE,
            input_schema: string_schema(
                &[
                    ("resume_id", "ID of the resume this template belongs to"),
                    ("name", "Name of the template"),
                    ("template_data", "Handlebars template rendering the resume HTML"),
                ],
                &[
                    ("description", "Description of what this template does"),
                    (
                        "copy_from_resume_id",
                        "Copy contacts and experiences from this resume into the target resume first",
                    ),
                ],
            ),
        },
        ToolDefinition {
            name: "get_template",
            description: "Get a template by ID.",
            input_schema: string_schema(&[("template_id", "The ID of the template")], &[]),
        },
        ToolDefinition {
            name: "list_templates",
            description: "List all templates of a resume.",
            input_schema: string_schema(&[("resume_id", "The ID of the resume")], &[]),
        },
        ToolDefinition {
            name: "update_template",
            description: "Update a template. A new template_data is validated against the resume \
                          before it is saved. Empty or omitted fields are left unchanged.",
            input_schema: string_schema(
                &[("template_id", "The ID of the template to update")],
                &[
                    ("name", "New name"),
                    ("description", "New description"),
                    ("template_data", "New Handlebars template"),
                ],
            ),
        },
        ToolDefinition {
            name: "delete_template",
            description: "Delete a template by ID.",
            input_schema: string_schema(&[("template_id", "The ID of the template to delete")], &[]),
        },
    ]
}

fn validation_failed(e: impl Display) -> ToolError {
    ToolError::Failed(format!(
        "Template validation failed: {e}. Please check your Handlebars syntax and ensure \
         all referenced fields exist on the resume model."
    ))
}

fn validate(tb: &Toolbox, template: &str, record: &ResumeRecord) -> Result<(), ToolError> {
    tb.renderer.validate(template, record).map_err(validation_failed)
}

pub async fn create_template(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    let name = required_str(args, "name")?.to_string();
    let template_body = required_str(args, "template_data")?.to_string();
    let description = optional_string(args, "description")?.unwrap_or_default();
    let copy_from = optional_id(args, "copy_from_resume_id")?;

    // Validation runs against the resume after the copy, inside the same transaction.
    let renderer = &tb.renderer;
    let template = tb
        .repo
        .create_template(
            auth,
            NewTemplate {
                resume_id,
                name,
                description,
                template_body,
            },
            copy_from,
            |body, record| Ok(renderer.validate(body, record)?),
        )
        .await
        .map_err(|e| match e {
            AppError::Render(e) => validation_failed(e),
            AppError::NotFound(msg) => ToolError::Failed(format!("Resume not found: {msg}")),
            other => ToolError::Failed(format!("Failed to create template: {other}")),
        })?;

    let mut result = json!({ "success": true, "template_id": template.id });
    if let Some(source_id) = copy_from {
        result["copied_from_resume_id"] = json!(source_id);
    }
    Ok(ToolOutput::text(format!(
        "Created template successfully: {}",
        to_json(&result)?
    )))
}

pub async fn get_template(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let template_id = required_id(args, "template_id")?;
    let template = tb
        .repo
        .get_template(auth, template_id)
        .await
        .or_fail("Template not found")?;
    Ok(ToolOutput::text(format!(
        "Template retrieved successfully: {}",
        to_json(&template)?
    )))
}

pub async fn list_templates(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    let templates = tb
        .repo
        .list_templates(auth, resume_id)
        .await
        .or_fail("Failed to list templates")?;
    let result = json!({
        "success": true,
        "count": templates.len(),
        "templates": templates,
    });
    Ok(ToolOutput::text(format!(
        "Templates listed successfully: {}",
        to_json(&result)?
    )))
}

pub async fn update_template(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let template_id = required_id(args, "template_id")?;
    let patch = TemplatePatch {
        name: optional_string(args, "name")?,
        description: optional_string(args, "description")?,
        template_body: optional_string(args, "template_data")?,
    };

    let existing = tb
        .repo
        .get_template(auth, template_id)
        .await
        .or_fail("Template not found")?;

    if let Some(body) = &patch.template_body {
        let record = tb
            .repo
            .get_resume_record(auth, existing.resume_id)
            .await
            .or_fail("Resume not found")?;
        validate(tb, body, &record)?;
    }

    let updated = tb
        .repo
        .update_template(auth, template_id, patch)
        .await
        .or_fail("Failed to update template")?;

    let result = json!({
        "success": true,
        "message": format!("Template '{}' updated successfully", updated.name),
    });
    Ok(ToolOutput::text(format!(
        "Template updated successfully: {}",
        to_json(&result)?
    )))
}

pub async fn delete_template(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let template_id = required_id(args, "template_id")?;
    let template = tb
        .repo
        .get_template(auth, template_id)
        .await
        .or_fail("Template not found")?;
    tb.repo
        .delete_template(auth, template_id)
        .await
        .or_fail("Failed to delete template")?;

    let result = json!({
        "success": true,
        "message": format!("Template '{}' deleted successfully", template.name),
    });
    Ok(ToolOutput::text(format!(
        "Template deleted successfully: {}",
        to_json(&result)?
    )))
}
