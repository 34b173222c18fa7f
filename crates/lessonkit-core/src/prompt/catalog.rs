//! Subject and grade catalog.
//!
//! The lesson form only accepts the subjects and grades listed in
//! `catalog.toml`, which is embedded in the binary at compile time.
//! Values are stored as indices into the catalog so they are `Copy` and
//! cycle cheaply in form widgets.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single catalog row: display name plus an ASCII alias.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    /// Label shown to teachers and inserted into prompts (e.g. `Toán`).
    pub name: String,
    /// ASCII alias accepted on the command line (e.g. `toan`).
    pub slug: String,
}

/// Container for deserializing the embedded TOML file.
#[derive(Debug, Deserialize)]
struct Catalog {
    subjects: Vec<CatalogEntry>,
    grades: Vec<CatalogEntry>,
}

/// The embedded catalog TOML.
static CATALOG_TOML: &str = include_str!("catalog.toml");

/// Parsed catalog.
///
/// # Panics
///
/// Panics on first access if the embedded TOML is malformed. The file is
/// compiled in, so a built binary always carries a valid catalog (the unit
/// tests below parse it).
static CATALOG: LazyLock<Catalog> =
    LazyLock::new(|| toml::from_str(CATALOG_TOML).expect("embedded catalog.toml is invalid"));

/// Errors from parsing form values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown subject {0:?}")]
    UnknownSubject(String),
    #[error("unknown grade {0:?}")]
    UnknownGrade(String),
    #[error("unknown audience tier {0:?} (expected \"standard\" or \"inclusive\")")]
    UnknownAudience(String),
    #[error("unknown template {0:?}")]
    UnknownTemplate(String),
}

macro_rules! catalog_value {
    ($(#[$meta:meta])* $name:ident, $field:ident, $err:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(usize);

        impl $name {
            /// Every value in catalog order.
            pub fn all() -> impl Iterator<Item = Self> {
                (0..CATALOG.$field.len()).map(Self)
            }

            /// Parse a display name or slug. Slugs match case-insensitively.
            pub fn parse(input: &str) -> Result<Self, CatalogError> {
                let wanted = input.trim();
                CATALOG
                    .$field
                    .iter()
                    .position(|e| e.name == wanted || e.slug.eq_ignore_ascii_case(wanted))
                    .map(Self)
                    .ok_or_else(|| CatalogError::$err(input.to_string()))
            }

            pub fn name(self) -> &'static str {
                &CATALOG.$field[self.0].name
            }

            pub fn slug(self) -> &'static str {
                &CATALOG.$field[self.0].slug
            }

            /// The following catalog value, wrapping around at the end.
            pub fn next(self) -> Self {
                Self((self.0 + 1) % CATALOG.$field.len())
            }

            /// The preceding catalog value, wrapping around at the start.
            pub fn prev(self) -> Self {
                let len = CATALOG.$field.len();
                Self((self.0 + len - 1) % len)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

catalog_value!(
    /// A school subject from the catalog.
    Subject,
    subjects,
    UnknownSubject
);

catalog_value!(
    /// A grade level (`Lớp 1` to `Lớp 12`).
    Grade,
    grades,
    UnknownGrade
);

impl Default for Subject {
    fn default() -> Self {
        Self(0)
    }
}

impl Default for Grade {
    fn default() -> Self {
        Self::parse("6").unwrap_or(Self(0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses() {
        assert!(Subject::all().count() > 0);
        assert_eq!(Grade::all().count(), 12);
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs: Vec<&str> = Subject::all().map(Subject::slug).collect();
        let before = slugs.len();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), before, "duplicate subject slug in catalog.toml");
    }

    #[test]
    fn parse_accepts_name_and_slug() {
        let by_name = Subject::parse("Toán").unwrap();
        let by_slug = Subject::parse("TOAN").unwrap();
        assert_eq!(by_name, by_slug);
        assert_eq!(by_name.name(), "Toán");

        assert_eq!(Grade::parse("Lớp 6").unwrap(), Grade::parse(" 6 ").unwrap());
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert_eq!(
            Subject::parse("Thiên văn"),
            Err(CatalogError::UnknownSubject("Thiên văn".to_string()))
        );
        assert!(Grade::parse("Lớp 13").is_err());
    }

    #[test]
    fn defaults_match_form_defaults() {
        assert_eq!(Subject::default().name(), "Toán");
        assert_eq!(Grade::default().name(), "Lớp 6");
    }

    #[test]
    fn next_and_prev_wrap_around() {
        let first = Grade::parse("1").unwrap();
        let last = Grade::parse("12").unwrap();
        assert_eq!(last.next(), first);
        assert_eq!(first.prev(), last);
        assert_eq!(first.next().prev(), first);
    }

    #[test]
    fn serde_uses_display_name() {
        let grade = Grade::parse("7").unwrap();
        let json = serde_json::to_string(&grade).unwrap();
        assert_eq!(json, "\"Lớp 7\"");

        let back: Grade = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(back, grade);

        let bad: Result<Subject, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }
}
