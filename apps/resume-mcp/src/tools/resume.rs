use serde_json::{json, Value};

use super::params::{optional_id, optional_string, required_id, required_str, string_schema};
use super::{to_json, OrFail, ToolDefinition, ToolError, ToolOutput, Toolbox};
use crate::models::{AuthContext, NewResume, ResumePatch};

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "create_resume",
            description: "Create a new resume with basic information. Optionally copy all contacts, \
                          experiences, feature maps and templates from an existing resume.",
            input_schema: string_schema(
                &[
                    ("name", "Full name of the person"),
                    ("description", "Short professional summary"),
                ],
                &[
                    ("photo", "URL of a profile photo"),
                    ("copy_from_resume_id", "ID of an existing resume to copy data from"),
                ],
            ),
        },
        ToolDefinition {
            name: "update_basic_info",
            description: "Update the name, photo or description of a resume. Empty or omitted \
                          fields are left unchanged.",
            input_schema: string_schema(
                &[("resume_id", "The ID of the resume to update")],
                &[
                    ("name", "New name"),
                    ("photo", "New photo URL"),
                    ("description", "New description"),
                ],
            ),
        },
        ToolDefinition {
            name: "get_resume_by_name",
            description: "Get a complete resume, with all contacts, experiences and feature maps, by name.",
            input_schema: string_schema(&[("name", "The exact resume name")], &[]),
        },
        ToolDefinition {
            name: "list_resumes",
            description: "List all resumes as \"<id>: <name>\" entries.",
            input_schema: string_schema(&[], &[]),
        },
        ToolDefinition {
            name: "delete_resume",
            description: "Delete a resume and everything attached to it.",
            input_schema: string_schema(&[("resume_id", "The ID of the resume to delete")], &[]),
        },
    ]
}

pub async fn create_resume(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let new = NewResume {
        name: required_str(args, "name")?.to_string(),
        description: required_str(args, "description")?.to_string(),
        photo: optional_string(args, "photo")?.unwrap_or_default(),
    };
    let copy_from = optional_id(args, "copy_from_resume_id")?;

    let (resume, copied) = match copy_from {
        Some(source_id) => {
            let (resume, stats) = tb
                .repo
                .create_resume_from(auth, new, source_id)
                .await
                .or_fail("Error creating resume")?;
            (resume, Some((source_id, stats)))
        }
        None => (
            tb.repo
                .create_resume(auth, new)
                .await
                .or_fail("Error creating resume")?,
            None,
        ),
    };

    let mut result = json!({
        "id": resume.id,
        "name": resume.name,
        "photo": resume.photo,
        "description": resume.description,
        "created_at": resume.created_at,
    });
    if let Some((source_id, stats)) = copied {
        result["copied_from_resume_id"] = json!(source_id.to_string());
        result["copied"] = json!(stats);
        result["message"] = json!(format!(
            "Resume created successfully and copied data from resume ID {source_id}"
        ));
    }

    Ok(ToolOutput::text(format!(
        "Resume created successfully: {}",
        to_json(&result)?
    )))
}

pub async fn update_basic_info(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    let patch = ResumePatch {
        name: optional_string(args, "name")?,
        photo: optional_string(args, "photo")?,
        description: optional_string(args, "description")?,
    };

    let resume = tb
        .repo
        .update_basic_info(auth, resume_id, patch)
        .await
        .or_fail("Error updating resume")?;

    Ok(ToolOutput::text(format!(
        "Resume updated successfully: {}",
        to_json(&resume)?
    )))
}

pub async fn get_resume_by_name(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let name = required_str(args, "name")?;

    let resume = tb
        .repo
        .get_resume_by_name(auth, name)
        .await
        .or_fail("Error getting resume")?
        .ok_or_else(|| ToolError::Failed(format!("Resume not found: no resume named '{name}'")))?;
    let record = tb
        .repo
        .get_resume_record(auth, resume.id)
        .await
        .or_fail("Error getting resume")?;

    Ok(ToolOutput::texts([
        format!("Resume found: for {name}"),
        to_json(&record)?,
    ]))
}

pub async fn list_resumes(tb: &Toolbox, auth: &AuthContext) -> Result<ToolOutput, ToolError> {
    let resumes = tb
        .repo
        .list_resumes(auth)
        .await
        .or_fail("Error listing resumes")?;
    let entries: Vec<String> = resumes
        .iter()
        .map(|r| format!("{}: {}", r.id, r.name))
        .collect();

    Ok(ToolOutput::texts([
        format!("Resumes found: {}", resumes.len()),
        to_json(&entries)?,
    ]))
}

pub async fn delete_resume(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    tb.repo
        .delete_resume(auth, resume_id)
        .await
        .or_fail("Error deleting resume")?;
    Ok(ToolOutput::text(format!(
        "Resume with ID {resume_id} deleted successfully"
    )))
}
