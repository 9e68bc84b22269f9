//! Argument extraction shared by every tool handler.
//!
//! Missing required arguments and wrong JSON types are protocol errors
//! (`InvalidParams`). Values that are present but malformed, such as a
//! non-numeric id or a bad date, are reported in-band (`Failed`).

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use super::ToolError;
use crate::models::{EmploymentType, DATE_FORMAT};

pub fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Null) | None => Err(ToolError::InvalidParams(format!(
            "{name} parameter is required"
        ))),
        Some(_) => Err(ToolError::InvalidParams(format!("{name} must be a string"))),
    }
}

/// Absent, null and empty all mean "not provided".
pub fn optional_str<'a>(args: &'a Value, name: &str) -> Result<Option<&'a str>, ToolError> {
    match args.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s)),
        Some(Value::String(_)) | Some(Value::Null) | None => Ok(None),
        Some(_) => Err(ToolError::InvalidParams(format!("{name} must be a string"))),
    }
}

pub fn optional_string(args: &Value, name: &str) -> Result<Option<String>, ToolError> {
    Ok(optional_str(args, name)?.map(str::to_string))
}

/// Ids travel as strings; a bare JSON integer is accepted as well.
/// Row ids start at 1, so zero and negatives are malformed.
pub fn required_id(args: &Value, name: &str) -> Result<i64, ToolError> {
    match args.get(name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .filter(|id| *id >= 1)
            .ok_or_else(|| ToolError::Failed(format!("Invalid {name}: {n}"))),
        _ => parse_id(required_str(args, name)?, name),
    }
}

pub fn optional_id(args: &Value, name: &str) -> Result<Option<i64>, ToolError> {
    match args.get(name) {
        Some(Value::Number(_)) => required_id(args, name).map(Some),
        _ => optional_str(args, name)?
            .map(|raw| parse_id(raw, name))
            .transpose(),
    }
}

fn parse_id(raw: &str, name: &str) -> Result<i64, ToolError> {
    let id = raw
        .trim()
        .parse::<i64>()
        .map_err(|e| ToolError::Failed(format!("Invalid {name}: {e}")))?;
    if id < 1 {
        return Err(ToolError::Failed(format!(
            "Invalid {name}: {raw} is not a positive integer"
        )));
    }
    Ok(id)
}

pub fn parse_date(raw: &str, name: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        ToolError::Failed(format!("Invalid {name} format: {e}. Expected YYYY-MM-DD"))
    })
}

pub fn optional_date(args: &Value, name: &str) -> Result<Option<NaiveDate>, ToolError> {
    optional_str(args, name)?
        .map(|raw| parse_date(raw, name))
        .transpose()
}

pub fn employment_type(args: &Value) -> Result<EmploymentType, ToolError> {
    match optional_str(args, "type")? {
        Some(raw) => raw.parse::<EmploymentType>().map_err(ToolError::Failed),
        None => Ok(EmploymentType::default()),
    }
}

/// Object schema in which every property is a string.
pub fn string_schema(required: &[(&str, &str)], optional: &[(&str, &str)]) -> Value {
    let mut properties = Map::new();
    for (name, description) in required.iter().chain(optional) {
        properties.insert(
            (*name).to_string(),
            json!({ "type": "string", "description": description }),
        );
    }
    let required: Vec<&str> = required.iter().map(|(name, _)| *name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_str_missing_is_invalid_params() {
        let args = json!({ "other": "x" });
        assert!(matches!(
            required_str(&args, "name"),
            Err(ToolError::InvalidParams(_))
        ));
        assert!(matches!(
            required_str(&json!({ "name": 5 }), "name"),
            Err(ToolError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_optional_str_treats_empty_as_absent() {
        let args = json!({ "photo": "", "name": "Jo" });
        assert_eq!(optional_str(&args, "photo").unwrap(), None);
        assert_eq!(optional_str(&args, "missing").unwrap(), None);
        assert_eq!(optional_str(&args, "name").unwrap(), Some("Jo"));
    }

    #[test]
    fn test_required_id_parsing() {
        assert_eq!(required_id(&json!({ "resume_id": "42" }), "resume_id").unwrap(), 42);
        assert_eq!(required_id(&json!({ "resume_id": 42 }), "resume_id").unwrap(), 42);
        match required_id(&json!({ "resume_id": "abc" }), "resume_id") {
            Err(ToolError::Failed(msg)) => assert!(msg.starts_with("Invalid resume_id")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_ids_are_malformed() {
        for args in [
            json!({ "resume_id": "-3" }),
            json!({ "resume_id": "0" }),
            json!({ "resume_id": -3 }),
        ] {
            match required_id(&args, "resume_id") {
                Err(ToolError::Failed(msg)) => assert!(msg.starts_with("Invalid resume_id")),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(matches!(
            optional_id(&json!({ "copy_from_resume_id": "-1" }), "copy_from_resume_id"),
            Err(ToolError::Failed(_))
        ));
    }

    #[test]
    fn test_dates_and_employment_type() {
        assert!(parse_date("2024-02-30", "start_date").is_err());
        assert_eq!(
            parse_date("2024-02-29", "start_date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(optional_date(&json!({}), "end_date").unwrap(), None);
        assert_eq!(employment_type(&json!({})).unwrap(), EmploymentType::Fulltime);
        assert!(matches!(
            employment_type(&json!({ "type": "gig" })),
            Err(ToolError::Failed(_))
        ));
    }

    #[test]
    fn test_string_schema_shape() {
        let schema = string_schema(&[("resume_id", "Resume id")], &[("css", "Extra CSS")]);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["css"]["type"], "string");
        assert_eq!(schema["required"], json!(["resume_id"]));
    }
}
