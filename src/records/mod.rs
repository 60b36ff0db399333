pub mod fetcher;
pub mod reconcile;
pub mod semester;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::portal::http::{number_field, text_field};
use crate::records::semester::Semester;

/// A graded course as reported to the user and written to snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub name: String,
    pub credits: f64,
    #[serde(rename = "score")]
    pub raw_score: String,
    pub semester: Semester,
    pub is_major: bool,
}

impl CourseRecord {
    pub fn key(&self) -> CourseKey {
        CourseKey::new(&self.name, self.credits, self.semester)
    }
}

/// Identity of a course across sources and cycles: (name, credits, semester).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CourseKey {
    name: String,
    credits_bits: u64,
    semester: Semester,
}

impl CourseKey {
    pub fn new(name: &str, credits: f64, semester: Semester) -> Self {
        // 0.0 and -0.0 must compare equal
        let credits = if credits == 0.0 { 0.0 } else { credits };
        Self {
            name: name.to_string(),
            credits_bits: credits.to_bits(),
            semester,
        }
    }

    pub fn credits(&self) -> f64 {
        f64::from_bits(self.credits_bits)
    }
}

impl Display for CourseKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} credits, {})", self.name, self.credits(), self.semester)
    }
}

/// One portal item after field normalization, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCourse {
    pub name: Option<String>,
    pub credits: f64,
    pub score: Option<String>,
    pub semester: Semester,
    pub completion: Option<String>,
}

impl RawCourse {
    /// Reads `kcmc`/`xf`/`cj`/`xkkh`/`xdbjmc`. Unparseable or negative credits become 0.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let credits = number_field(object, "xf").unwrap_or(0.0).max(0.0);
        let semester = text_field(object, "xkkh")
            .map(|code| Semester::from_code(&code))
            .unwrap_or(Semester::Unknown);
        Some(Self {
            name: text_field(object, "kcmc"),
            credits,
            score: text_field(object, "cj"),
            semester,
            completion: text_field(object, "xdbjmc"),
        })
    }

    pub fn key(&self) -> Option<CourseKey> {
        self.name
            .as_deref()
            .map(|name| CourseKey::new(name, self.credits, self.semester))
    }
}
