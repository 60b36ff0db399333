use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const UNKNOWN_SEMESTER: &str = "未知学期";
const AUTUMN_WINTER: &str = "秋冬";
const SPRING_SUMMER: &str = "春夏";
const MIN_CODE_CHARS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    AutumnWinter,
    SpringSummer,
}

impl Season {
    fn label(&self) -> &'static str {
        match self {
            Self::AutumnWinter => AUTUMN_WINTER,
            Self::SpringSummer => SPRING_SUMMER,
        }
    }
}

/// Academic term in the portal's short form, e.g. `23-24秋冬`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semester {
    Term { start: u8, end: u8, season: Season },
    Unknown,
}

impl Semester {
    /// Normalizes a selection code such as `(2023-2024-1)-211G0210-0088157-1`.
    ///
    /// Term `1` is autumn-winter and every other term spring-summer. Anything too
    /// short or off-pattern becomes [`Semester::Unknown`].
    pub fn from_code(code: &str) -> Self {
        if code.chars().count() < MIN_CODE_CHARS {
            return Self::Unknown;
        }
        let mut chars = code.chars();
        chars.next();
        let inner = chars.as_str().split(')').next().unwrap_or_default();
        let parts = inner.split('-').collect::<Vec<_>>();
        let [start, end, term] = parts.as_slice() else {
            return Self::Unknown;
        };
        let (Some(start), Some(end)) = (short_year(start), short_year(end)) else {
            return Self::Unknown;
        };
        let season = if *term == "1" {
            Season::AutumnWinter
        } else {
            Season::SpringSummer
        };
        Self::Term { start, end, season }
    }

    /// Parses a label previously produced by `Display`; anything else is unknown.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        let (years, season) = if let Some(years) = label.strip_suffix(AUTUMN_WINTER) {
            (years, Season::AutumnWinter)
        } else if let Some(years) = label.strip_suffix(SPRING_SUMMER) {
            (years, Season::SpringSummer)
        } else {
            return Self::Unknown;
        };
        let Some((start, end)) = years.split_once('-') else {
            return Self::Unknown;
        };
        match (two_digits(start), two_digits(end)) {
            (Some(start), Some(end)) => Self::Term { start, end, season },
            _ => Self::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

fn short_year(raw: &str) -> Option<u8> {
    let year = raw.trim().parse::<i64>().ok()?;
    u8::try_from(year.rem_euclid(100)).ok()
}

fn two_digits(raw: &str) -> Option<u8> {
    if raw.len() != 2 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

impl Display for Semester {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Term { start, end, season } => {
                write!(f, "{start:02}-{end:02}{}", season.label())
            }
            Self::Unknown => write!(f, "{UNKNOWN_SEMESTER}"),
        }
    }
}

impl Serialize for Semester {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Semester {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}
