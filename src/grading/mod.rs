pub mod metrics;
pub mod table;

use serde::{Deserialize, Serialize};

/// A raw portal score mapped onto the percentage and grade-point scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedScore {
    pub score: f64,
    pub grade_point: f64,
}

impl ResolvedScore {
    pub const ZERO: ResolvedScore = ResolvedScore {
        score: 0.0,
        grade_point: 0.0,
    };

    pub const fn new(score: f64, grade_point: f64) -> Self {
        Self { score, grade_point }
    }
}

/// The four weighted averages reported after every successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricsSnapshot {
    pub gpa: f64,
    pub avg_score: f64,
    pub major_gpa: f64,
    pub major_avg_score: f64,
}
