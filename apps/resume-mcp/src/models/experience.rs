use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Employment mode of a work or education entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentType {
    #[default]
    Fulltime,
    Parttime,
    Internship,
}

impl EmploymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentType::Fulltime => "fulltime",
            EmploymentType::Parttime => "parttime",
            EmploymentType::Internship => "internship",
        }
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fulltime" => Ok(EmploymentType::Fulltime),
            "parttime" => Ok(EmploymentType::Parttime),
            "internship" => Ok(EmploymentType::Internship),
            other => Err(format!(
                "Invalid type '{other}'. Must be: fulltime, parttime, or internship"
            )),
        }
    }
}

/// The three experience tables a feature map can hang off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceKind {
    Work,
    Education,
    Other,
}

impl ExperienceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceKind::Work => "work",
            ExperienceKind::Education => "education",
            ExperienceKind::Other => "other",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            ExperienceKind::Work => "work_experiences",
            ExperienceKind::Education => "educations",
            ExperienceKind::Other => "other_experiences",
        }
    }

    /// The `feature_maps` FK column pointing at this kind's table.
    pub fn feature_map_column(self) -> &'static str {
        match self {
            ExperienceKind::Work => "work_experience_id",
            ExperienceKind::Education => "education_id",
            ExperienceKind::Other => "other_experience_id",
        }
    }
}

impl fmt::Display for ExperienceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" | "work_experience" => Ok(ExperienceKind::Work),
            "education" => Ok(ExperienceKind::Education),
            "other" | "other_experience" => Ok(ExperienceKind::Other),
            other => Err(format!(
                "Invalid experience_type '{other}'. Must be: work, education, or other"
            )),
        }
    }
}

/// Typed reference to the experience a feature map belongs to.
/// Ids of different kinds live in different id-spaces and are never interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExperienceRef {
    Work(i64),
    Education(i64),
    Other(i64),
}

impl ExperienceRef {
    pub fn new(kind: ExperienceKind, id: i64) -> Self {
        match kind {
            ExperienceKind::Work => ExperienceRef::Work(id),
            ExperienceKind::Education => ExperienceRef::Education(id),
            ExperienceKind::Other => ExperienceRef::Other(id),
        }
    }

    pub fn kind(self) -> ExperienceKind {
        match self {
            ExperienceRef::Work(_) => ExperienceKind::Work,
            ExperienceRef::Education(_) => ExperienceKind::Education,
            ExperienceRef::Other(_) => ExperienceKind::Other,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            ExperienceRef::Work(id) | ExperienceRef::Education(id) | ExperienceRef::Other(id) => id,
        }
    }
}

impl fmt::Display for ExperienceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} experience {}", self.kind(), self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employment_type_parsing() {
        assert_eq!("parttime".parse::<EmploymentType>(), Ok(EmploymentType::Parttime));
        assert_eq!(EmploymentType::default().as_str(), "fulltime");
        let err = "contract".parse::<EmploymentType>().unwrap_err();
        assert!(err.contains("fulltime, parttime, or internship"));
    }

    #[test]
    fn test_experience_kind_accepts_long_names() {
        assert_eq!("work_experience".parse::<ExperienceKind>(), Ok(ExperienceKind::Work));
        assert_eq!("other".parse::<ExperienceKind>(), Ok(ExperienceKind::Other));
        assert!("project".parse::<ExperienceKind>().is_err());
    }

    #[test]
    fn test_experience_ref_kind_and_column() {
        let reference = ExperienceRef::new(ExperienceKind::Education, 7);
        assert_eq!(reference, ExperienceRef::Education(7));
        assert_eq!(reference.id(), 7);
        assert_eq!(reference.kind().feature_map_column(), "education_id");
        assert_eq!(reference.kind().table(), "educations");
        assert_eq!(reference.to_string(), "education experience 7");
    }
}
