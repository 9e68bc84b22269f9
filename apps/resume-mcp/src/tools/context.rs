use serde_json::{json, Value};

use super::params::{required_id, string_schema};
use super::{to_json, OrFail, ToolDefinition, ToolError, ToolOutput, Toolbox};
use crate::models::AuthContext;

pub fn definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: "get_resume_context",
        description: "Get the JSON schema of the resume record templates are rendered against. \
                      Use it to learn which fields a template may reference.",
        input_schema: string_schema(&[("resume_id", "The ID of the resume")], &[]),
    }]
}

fn string() -> Value {
    json!({ "type": "string" })
}

fn nullable_date() -> Value {
    json!({ "type": ["string", "null"], "format": "date" })
}

fn feature_maps() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "id": { "type": "integer" },
                "experience_type": { "type": "string", "enum": ["work", "education", "other"] },
                "experience_id": { "type": "integer" },
                "key": string(),
                "value": string(),
                "category": string(),
            },
        },
    })
}

fn experience_list(properties: Value) -> Value {
    let mut properties = properties;
    if let Some(map) = properties.as_object_mut() {
        map.insert("id".into(), json!({ "type": "integer" }));
        map.insert("resume_id".into(), json!({ "type": "integer" }));
        map.insert("feature_maps".into(), feature_maps());
    }
    json!({
        "type": "array",
        "items": { "type": "object", "properties": properties },
    })
}

/// Schema of the serialized [`crate::models::ResumeRecord`].
pub fn record_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Resume",
        "type": "object",
        "properties": {
            "id": { "type": "integer" },
            "name": string(),
            "photo": string(),
            "description": string(),
            "created_at": { "type": "string", "format": "date-time" },
            "updated_at": { "type": "string", "format": "date-time" },
            "contacts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "resume_id": { "type": "integer" },
                        "key": string(),
                        "value": string(),
                    },
                },
            },
            "work_experiences": experience_list(json!({
                "company": string(),
                "job_title": string(),
                "employment_type": { "type": "string", "enum": ["fulltime", "parttime", "internship"] },
                "start_date": { "type": "string", "format": "date" },
                "end_date": nullable_date(),
            })),
            "educations": experience_list(json!({
                "school_name": string(),
                "employment_type": { "type": "string", "enum": ["fulltime", "parttime", "internship"] },
                "start_date": { "type": "string", "format": "date" },
                "end_date": nullable_date(),
            })),
            "other_experiences": experience_list(json!({
                "category": string(),
            })),
        },
    })
}

pub async fn get_resume_context(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    tb.repo
        .require_resume(auth, resume_id)
        .await
        .or_fail("Error getting resume")?;

    let result = json!({
        "success": true,
        "message": "Resume JSON schema retrieved successfully",
        "context": { "json_schema": record_schema() },
    });
    Ok(ToolOutput::text(to_json(&result)?))
}
