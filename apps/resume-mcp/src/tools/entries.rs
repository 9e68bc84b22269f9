//! Contacts, experiences and feature maps.

use serde_json::Value;

use super::params::{
    employment_type, optional_date, optional_string, parse_date, required_id, required_str,
    string_schema,
};
use super::{to_json, OrFail, ToolDefinition, ToolError, ToolOutput, Toolbox};
use crate::models::{
    AuthContext, ExperienceKind, ExperienceRef, FeatureMapPatch, NewEducation, NewFeatureMap,
    NewWorkExperience,
};

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "add_contact_info",
            description: "Add a contact entry (email, phone, website, ...) to a resume.",
            input_schema: string_schema(
                &[
                    ("resume_id", "The ID of the resume"),
                    ("key", "Contact type, e.g. email or phone"),
                    ("value", "Contact value"),
                ],
                &[],
            ),
        },
        ToolDefinition {
            name: "delete_contact",
            description: "Delete a contact entry by ID.",
            input_schema: string_schema(&[("contact_id", "The ID of the contact to delete")], &[]),
        },
        ToolDefinition {
            name: "add_work_experience",
            description: "Add a work experience to a resume. Dates use YYYY-MM-DD; omit end_date \
                          for a current position.",
            input_schema: string_schema(
                &[
                    ("resume_id", "The ID of the resume"),
                    ("company", "Company name"),
                    ("job_title", "Job title"),
                    ("start_date", "Start date (YYYY-MM-DD)"),
                ],
                &[
                    ("type", "Employment type: fulltime, parttime or internship (default fulltime)"),
                    ("end_date", "End date (YYYY-MM-DD)"),
                ],
            ),
        },
        ToolDefinition {
            name: "add_education",
            description: "Add an education entry to a resume. Dates use YYYY-MM-DD.",
            input_schema: string_schema(
                &[
                    ("resume_id", "The ID of the resume"),
                    ("school_name", "School or university name"),
                    ("start_date", "Start date (YYYY-MM-DD)"),
                ],
                &[
                    ("type", "Study mode: fulltime, parttime or internship (default fulltime)"),
                    ("end_date", "End date (YYYY-MM-DD)"),
                ],
            ),
        },
        ToolDefinition {
            name: "add_other_experience",
            description: "Add an experience that is neither work nor education, such as projects, \
                          awards or volunteering.",
            input_schema: string_schema(
                &[
                    ("resume_id", "The ID of the resume"),
                    ("category", "Category, e.g. Projects or Awards"),
                ],
                &[],
            ),
        },
        ToolDefinition {
            name: "delete_experience",
            description: "Delete a work, education or other experience together with its feature maps.",
            input_schema: string_schema(
                &[
                    ("experience_type", "One of: work, education, other"),
                    ("experience_id", "The ID of the experience"),
                ],
                &[],
            ),
        },
        ToolDefinition {
            name: "add_feature_map",
            description: "Add flexible key-value features to any experience (work, education, other). \
                          Use this for details like GPA, responsibilities, achievements or skills.",
            input_schema: string_schema(
                &[
                    ("experience_type", "One of: work, education, other"),
                    ("experience_id", "The ID of the experience to add features to"),
                    ("key", "The feature key"),
                    ("value", "The feature value"),
                ],
                &[("category", "Optional grouping label")],
            ),
        },
        ToolDefinition {
            name: "update_feature_map",
            description: "Update an existing feature map by ID. Empty or omitted fields are left unchanged.",
            input_schema: string_schema(
                &[("feature_map_id", "The ID of the feature map to update")],
                &[
                    ("key", "The feature key"),
                    ("value", "The feature value"),
                    ("category", "Grouping label"),
                ],
            ),
        },
        ToolDefinition {
            name: "delete_feature_map",
            description: "Delete a feature map by ID.",
            input_schema: string_schema(
                &[("feature_map_id", "The ID of the feature map to delete")],
                &[],
            ),
        },
    ]
}

fn experience_ref(args: &Value) -> Result<ExperienceRef, ToolError> {
    let kind = required_str(args, "experience_type")?
        .parse::<ExperienceKind>()
        .map_err(ToolError::Failed)?;
    let id = required_id(args, "experience_id")?;
    Ok(ExperienceRef::new(kind, id))
}

pub async fn add_contact_info(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    let key = required_str(args, "key")?;
    let value = required_str(args, "value")?;

    let contact = tb
        .repo
        .add_contact(auth, resume_id, key, value)
        .await
        .or_fail("Error adding contact info")?;
    Ok(ToolOutput::text(format!(
        "Contact info added successfully: {}",
        to_json(&contact)?
    )))
}

pub async fn delete_contact(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let contact_id = required_id(args, "contact_id")?;
    tb.repo
        .delete_contact(auth, contact_id)
        .await
        .or_fail("Error deleting contact")?;
    Ok(ToolOutput::text(format!(
        "Contact with ID {contact_id} deleted successfully"
    )))
}

pub async fn add_work_experience(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    let company = required_str(args, "company")?.to_string();
    let job_title = required_str(args, "job_title")?.to_string();
    let start_date = required_str(args, "start_date")?;
    let new = NewWorkExperience {
        company,
        job_title,
        employment_type: employment_type(args)?,
        start_date: parse_date(start_date, "start_date")?,
        end_date: optional_date(args, "end_date")?,
    };

    let row = tb
        .repo
        .add_work_experience(auth, resume_id, new)
        .await
        .or_fail("Error adding work experience")?;
    Ok(ToolOutput::text(format!(
        "Work experience added successfully: {}",
        to_json(&row)?
    )))
}

pub async fn add_education(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    let school_name = required_str(args, "school_name")?.to_string();
    let start_date = required_str(args, "start_date")?;
    let new = NewEducation {
        school_name,
        employment_type: employment_type(args)?,
        start_date: parse_date(start_date, "start_date")?,
        end_date: optional_date(args, "end_date")?,
    };

    let row = tb
        .repo
        .add_education(auth, resume_id, new)
        .await
        .or_fail("Error adding education")?;
    Ok(ToolOutput::text(format!(
        "Education added successfully: {}",
        to_json(&row)?
    )))
}

pub async fn add_other_experience(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let resume_id = required_id(args, "resume_id")?;
    let category = required_str(args, "category")?;

    let row = tb
        .repo
        .add_other_experience(auth, resume_id, category)
        .await
        .or_fail("Error adding other experience")?;
    Ok(ToolOutput::text(format!(
        "Other experience added successfully: {}",
        to_json(&row)?
    )))
}

pub async fn delete_experience(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let experience = experience_ref(args)?;
    tb.repo
        .delete_experience(auth, experience)
        .await
        .or_fail("Error deleting experience")?;
    Ok(ToolOutput::text(format!(
        "{} experience with ID {} deleted successfully",
        experience.kind(),
        experience.id()
    )))
}

pub async fn add_feature_map(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let experience = experience_ref(args)?;
    let new = NewFeatureMap {
        experience,
        key: required_str(args, "key")?.to_string(),
        value: required_str(args, "value")?.to_string(),
        category: optional_string(args, "category")?.unwrap_or_default(),
    };

    let map = tb
        .repo
        .add_feature_map(auth, new)
        .await
        .or_fail("Error adding feature map")?;
    Ok(ToolOutput::text(format!(
        "Feature map added successfully: {}",
        to_json(&map)?
    )))
}

pub async fn update_feature_map(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let id = required_id(args, "feature_map_id")?;
    let patch = FeatureMapPatch {
        key: optional_string(args, "key")?,
        value: optional_string(args, "value")?,
        category: optional_string(args, "category")?,
    };

    let map = tb
        .repo
        .update_feature_map(auth, id, patch)
        .await
        .or_fail("Error updating feature map")?;
    Ok(ToolOutput::text(format!(
        "Feature map updated successfully: {}",
        to_json(&map)?
    )))
}

pub async fn delete_feature_map(
    tb: &Toolbox,
    auth: &AuthContext,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let id = required_id(args, "feature_map_id")?;
    tb.repo
        .delete_feature_map(auth, id)
        .await
        .or_fail("Error deleting feature map")?;
    Ok(ToolOutput::text(format!(
        "Feature map with ID {id} deleted successfully"
    )))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::tools::tests::{embedded_json, toolbox};

    async fn resume_id(tb: &Toolbox) -> i64 {
        let out = tb
            .call(
                "create_resume",
                &json!({ "name": "John Doe", "description": "Engineer" }),
                &AuthContext::local(),
            )
            .await
            .unwrap();
        embedded_json(&out)["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_add_work_experience_validation() {
        let (tb, _dir) = toolbox().await;
        let auth = AuthContext::local();
        let id = resume_id(&tb).await.to_string();

        let bad_type = tb
            .call(
                "add_work_experience",
                &json!({ "resume_id": id, "company": "Acme", "job_title": "Dev",
                         "start_date": "2020-01-01", "type": "freelance" }),
                &auth,
            )
            .await
            .unwrap();
        assert!(bad_type.is_error);
        assert!(bad_type.joined_text().contains("fulltime, parttime, or internship"));

        let bad_date = tb
            .call(
                "add_work_experience",
                &json!({ "resume_id": id, "company": "Acme", "job_title": "Dev",
                         "start_date": "01/02/2020" }),
                &auth,
            )
            .await
            .unwrap();
        assert!(bad_date.is_error);
        assert!(bad_date.joined_text().starts_with("Invalid start_date format"));

        let ok = tb
            .call(
                "add_work_experience",
                &json!({ "resume_id": id, "company": "Acme", "job_title": "Dev",
                         "start_date": "2020-01-01", "end_date": "2022-12-31", "type": "internship" }),
                &auth,
            )
            .await
            .unwrap();
        assert!(!ok.is_error);
        let row = embedded_json(&ok);
        assert_eq!(row["employment_type"], "internship");
        assert_eq!(row["end_date"], "2022-12-31");
    }

    #[tokio::test]
    async fn test_feature_map_lifecycle_and_experience_cascade() {
        let (tb, _dir) = toolbox().await;
        let auth = AuthContext::local();
        let id = resume_id(&tb).await.to_string();

        let edu = tb
            .call(
                "add_education",
                &json!({ "resume_id": id, "school_name": "MIT", "start_date": "2015-09-01" }),
                &auth,
            )
            .await
            .unwrap();
        let edu_id = embedded_json(&edu)["id"].as_i64().unwrap().to_string();

        let map = tb
            .call(
                "add_feature_map",
                &json!({ "experience_type": "education", "experience_id": edu_id,
                         "key": "gpa", "value": "3.9" }),
                &auth,
            )
            .await
            .unwrap();
        let map_json = embedded_json(&map);
        assert_eq!(map_json["experience_type"], "education");
        let map_id = map_json["id"].as_i64().unwrap().to_string();

        let updated = tb
            .call(
                "update_feature_map",
                &json!({ "feature_map_id": map_id, "value": "4.0" }),
                &auth,
            )
            .await
            .unwrap();
        assert_eq!(embedded_json(&updated)["key"], "gpa");
        assert_eq!(embedded_json(&updated)["value"], "4.0");

        let deleted = tb
            .call(
                "delete_experience",
                &json!({ "experience_type": "education", "experience_id": edu_id }),
                &auth,
            )
            .await
            .unwrap();
        assert!(!deleted.is_error);

        let gone = tb
            .call("delete_feature_map", &json!({ "feature_map_id": map_id }), &auth)
            .await
            .unwrap();
        assert!(gone.is_error);
    }

    #[tokio::test]
    async fn test_unknown_experience_type_is_in_band_error() {
        let (tb, _dir) = toolbox().await;
        let out = tb
            .call(
                "add_feature_map",
                &json!({ "experience_type": "hobby", "experience_id": "1",
                         "key": "k", "value": "v" }),
                &AuthContext::local(),
            )
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.joined_text().contains("experience_type"));
    }

    #[tokio::test]
    async fn test_contact_add_and_delete() {
        let (tb, _dir) = toolbox().await;
        let auth = AuthContext::local();
        let id = resume_id(&tb).await.to_string();

        let added = tb
            .call(
                "add_contact_info",
                &json!({ "resume_id": id, "key": "email", "value": "john@example.com" }),
                &auth,
            )
            .await
            .unwrap();
        let contact_id = embedded_json(&added)["id"].as_i64().unwrap().to_string();

        let deleted = tb
            .call("delete_contact", &json!({ "contact_id": contact_id }), &auth)
            .await
            .unwrap();
        assert_eq!(
            deleted.joined_text(),
            format!("Contact with ID {contact_id} deleted successfully")
        );
    }
}
