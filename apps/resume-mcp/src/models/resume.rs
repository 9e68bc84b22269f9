use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;

use super::experience::{EmploymentType, ExperienceKind, ExperienceRef};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ────────────────────────────────────────────────────────────────────────────
// Rows
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: i64,
    pub name: String,
    pub photo: String,
    pub description: String,
    /// Empty for resumes created in single-user mode.
    #[serde(skip_serializing, default)]
    pub owner_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub resume_id: i64,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkExperienceRow {
    pub id: i64,
    pub resume_id: i64,
    pub company: String,
    pub job_title: String,
    pub employment_type: String,
    pub start_date: String,
    #[serde(with = "open_ended")]
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EducationRow {
    pub id: i64,
    pub resume_id: i64,
    pub school_name: String,
    pub employment_type: String,
    pub start_date: String,
    #[serde(with = "open_ended")]
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OtherExperienceRow {
    pub id: i64,
    pub resume_id: i64,
    pub category: String,
}

/// `feature_maps` row as projected by the repository: the three FK columns
/// arrive already collapsed into `experience_type` and `experience_id`.
#[derive(Debug, Clone, FromRow)]
pub struct FeatureMapRow {
    pub id: i64,
    pub experience_type: String,
    pub experience_id: i64,
    pub key: String,
    pub value: String,
    pub category: String,
}

impl FeatureMapRow {
    /// `None` only for an unknown `experience_type`, which the projection never yields.
    pub fn into_feature_map(self) -> Option<FeatureMap> {
        let kind = self.experience_type.parse::<ExperienceKind>().ok()?;
        Some(FeatureMap {
            id: self.id,
            experience: ExperienceRef::new(kind, self.experience_id),
            key: self.key,
            value: self.value,
            category: self.category,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureMap {
    pub id: i64,
    pub experience: ExperienceRef,
    pub key: String,
    pub value: String,
    pub category: String,
}

impl Serialize for FeatureMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FeatureMap", 6)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("experience_type", &self.experience.kind())?;
        s.serialize_field("experience_id", &self.experience.id())?;
        s.serialize_field("key", &self.key)?;
        s.serialize_field("value", &self.value)?;
        s.serialize_field("category", &self.category)?;
        s.end()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateRow {
    pub id: i64,
    pub resume_id: i64,
    pub name: String,
    pub description: String,
    pub template_body: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PreviewSessionRow {
    pub id: String,
    pub resume_id: i64,
    pub template_body: String,
    pub css: String,
    #[serde(skip_serializing, default)]
    pub owner_id: String,
    pub created_at: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregates
// ────────────────────────────────────────────────────────────────────────────

/// An experience entry together with its feature maps.
#[derive(Debug, Clone, Serialize)]
pub struct ExperienceRecord<T> {
    #[serde(flatten)]
    pub entry: T,
    pub feature_maps: Vec<FeatureMap>,
}

/// The full resume graph. This is both the JSON returned to agents and the
/// data templates are executed against.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeRecord {
    #[serde(flatten)]
    pub resume: ResumeRow,
    pub contacts: Vec<ContactRow>,
    pub work_experiences: Vec<ExperienceRecord<WorkExperienceRow>>,
    pub educations: Vec<ExperienceRecord<EducationRow>>,
    pub other_experiences: Vec<ExperienceRecord<OtherExperienceRow>>,
}

impl ResumeRecord {
    pub fn feature_map_count(&self) -> usize {
        self.work_experiences.iter().map(|e| e.feature_maps.len()).sum::<usize>()
            + self.educations.iter().map(|e| e.feature_maps.len()).sum::<usize>()
            + self.other_experiences.iter().map(|e| e.feature_maps.len()).sum::<usize>()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewResume {
    pub name: String,
    pub description: String,
    pub photo: String,
}

/// Partial update: `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ResumePatch {
    pub name: Option<String>,
    pub photo: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewWorkExperience {
    pub company: String,
    pub job_title: String,
    pub employment_type: EmploymentType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewEducation {
    pub school_name: String,
    pub employment_type: EmploymentType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewFeatureMap {
    pub experience: ExperienceRef,
    pub key: String,
    pub value: String,
    pub category: String,
}

#[derive(Debug, Clone, Default)]
pub struct FeatureMapPatch {
    pub key: Option<String>,
    pub value: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub resume_id: i64,
    pub name: String,
    pub description: String,
    pub template_body: String,
}

#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub template_body: Option<String>,
}

impl TemplatePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.template_body.is_none()
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `end_date` is stored as `''` while an entry is ongoing and travels as JSON null.
mod open_ended {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.serialize_str(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_resume() -> ResumeRow {
        ResumeRow {
            id: 1,
            name: "John Doe".into(),
            photo: String::new(),
            description: "Engineer".into(),
            owner_id: "user-1".into(),
            created_at: "2024-01-01T00:00:00+00:00".into(),
            updated_at: "2024-01-01T00:00:00+00:00".into(),
        }
    }

    #[test]
    fn test_record_serializes_flat_with_children() {
        let record = ResumeRecord {
            resume: sample_resume(),
            contacts: vec![ContactRow {
                id: 3,
                resume_id: 1,
                key: "email".into(),
                value: "john@example.com".into(),
            }],
            work_experiences: vec![ExperienceRecord {
                entry: WorkExperienceRow {
                    id: 5,
                    resume_id: 1,
                    company: "Acme".into(),
                    job_title: "Engineer".into(),
                    employment_type: "fulltime".into(),
                    start_date: "2020-01-01".into(),
                    end_date: String::new(),
                },
                feature_maps: vec![FeatureMap {
                    id: 9,
                    experience: ExperienceRef::Work(5),
                    key: "skill".into(),
                    value: "Rust".into(),
                    category: String::new(),
                }],
            }],
            educations: vec![],
            other_experiences: vec![],
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "John Doe");
        assert!(json.get("owner_id").is_none());
        assert_eq!(json["contacts"][0]["key"], "email");
        assert_eq!(json["work_experiences"][0]["company"], "Acme");
        assert!(json["work_experiences"][0]["end_date"].is_null());
        assert_eq!(json["work_experiences"][0]["feature_maps"][0]["experience_type"], "work");
        assert_eq!(record.feature_map_count(), 1);
    }

    #[test]
    fn test_feature_map_row_conversion() {
        let row = FeatureMapRow {
            id: 2,
            experience_type: "other".into(),
            experience_id: 4,
            key: "award".into(),
            value: "Best Paper".into(),
            category: "research".into(),
        };
        let map = row.into_feature_map().unwrap();
        assert_eq!(map.experience.kind(), ExperienceKind::Other);
        assert_eq!(map.experience.id(), 4);

        let unknown = FeatureMapRow {
            id: 3,
            experience_type: "project".into(),
            experience_id: 1,
            key: "k".into(),
            value: "v".into(),
            category: String::new(),
        };
        assert!(unknown.into_feature_map().is_none());
    }

    #[test]
    fn test_end_date_round_trips_through_json() {
        let ongoing = EducationRow {
            id: 1,
            resume_id: 1,
            school_name: "MIT".into(),
            employment_type: "fulltime".into(),
            start_date: "2018-09-01".into(),
            end_date: String::new(),
        };
        let json = serde_json::to_value(&ongoing).unwrap();
        assert!(json["end_date"].is_null());
        let back: EducationRow = serde_json::from_value(json).unwrap();
        assert_eq!(back.end_date, "");

        let finished: EducationRow = serde_json::from_value(serde_json::json!({
            "id": 2, "resume_id": 1, "school_name": "MIT", "employment_type": "fulltime",
            "start_date": "2018-09-01", "end_date": "2022-06-01"
        }))
        .unwrap();
        assert_eq!(finished.end_date, "2022-06-01");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2023, 3, 7).unwrap();
        assert_eq!(format_date(date), "2023-03-07");
    }
}
