//! The lesson form: subject, grade, title, period count and audience tier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::catalog::{CatalogError, Grade, Subject};

/// Placeholder inserted when the lesson title is left empty.
pub const TITLE_PLACEHOLDER: &str = "[Tên bài]";

/// Period count used when the field is left empty.
pub const DEFAULT_PERIOD_COUNT: &str = "1";

/// Which students the generated material targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudienceTier {
    /// Regular class, competency-based framework guidance.
    #[default]
    Standard,
    /// Students with inclusive-education needs; simplified content.
    InclusiveNeeds,
}

impl AudienceTier {
    /// Label used inside prompts and shown in the form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "học sinh đại trà",
            Self::InclusiveNeeds => "học sinh hòa nhập",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Standard => Self::InclusiveNeeds,
            Self::InclusiveNeeds => Self::Standard,
        }
    }
}

impl fmt::Display for AudienceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::InclusiveNeeds => f.write_str("inclusive-needs"),
        }
    }
}

impl FromStr for AudienceTier {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "daitra" => Ok(Self::Standard),
            "inclusive" | "inclusive-needs" | "hoanhap" => Ok(Self::InclusiveNeeds),
            _ => Err(CatalogError::UnknownAudience(s.to_string())),
        }
    }
}

/// Current state of the lesson form.
///
/// `lesson_title` and `period_count` are free text and may be empty; the
/// prompt assembler substitutes placeholders for empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonConfig {
    pub subject: Subject,
    pub grade: Grade,
    #[serde(default)]
    pub lesson_title: String,
    #[serde(default)]
    pub period_count: String,
    #[serde(default)]
    pub audience: AudienceTier,
}

impl LessonConfig {
    /// The lesson title as typed, or [`TITLE_PLACEHOLDER`] when blank.
    pub fn title_or_placeholder(&self) -> &str {
        non_blank(&self.lesson_title).unwrap_or(TITLE_PLACEHOLDER)
    }

    /// The period count, or [`DEFAULT_PERIOD_COUNT`] when blank.
    pub fn period_count_or_default(&self) -> &str {
        non_blank(&self.period_count).unwrap_or(DEFAULT_PERIOD_COUNT)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_fall_back_to_placeholders() {
        let cfg = LessonConfig {
            lesson_title: "   ".to_string(),
            ..LessonConfig::default()
        };
        assert_eq!(cfg.title_or_placeholder(), "[Tên bài]");
        assert_eq!(cfg.period_count_or_default(), "1");
    }

    #[test]
    fn filled_fields_are_kept_as_typed() {
        let cfg = LessonConfig {
            lesson_title: " Phân số ".to_string(),
            period_count: "2 ".to_string(),
            ..LessonConfig::default()
        };
        assert_eq!(cfg.title_or_placeholder(), " Phân số ");
        assert_eq!(cfg.period_count_or_default(), "2 ");
    }

    #[test]
    fn audience_parses_aliases() {
        assert_eq!("inclusive".parse::<AudienceTier>(), Ok(AudienceTier::InclusiveNeeds));
        assert_eq!("Standard".parse::<AudienceTier>(), Ok(AudienceTier::Standard));
        assert!("gifted".parse::<AudienceTier>().is_err());
        assert_eq!(AudienceTier::Standard.toggle(), AudienceTier::InclusiveNeeds);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: LessonConfig =
            serde_json::from_str(r#"{"subject": "tin-hoc", "grade": "Lớp 10"}"#).unwrap();
        assert_eq!(cfg.subject.name(), "Tin học");
        assert_eq!(cfg.grade.name(), "Lớp 10");
        assert!(cfg.lesson_title.is_empty());
        assert_eq!(cfg.audience, AudienceTier::Standard);

        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["audience"], "standard");
    }
}
