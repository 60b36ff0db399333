use crate::config::GradingConfig;
use crate::grading::table::resolve_score;
use crate::grading::MetricsSnapshot;
use crate::records::CourseRecord;

/// Credit multipliers for the overall averages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseWeights {
    pub major: f64,
    pub non_major: f64,
}

impl Default for CourseWeights {
    fn default() -> Self {
        Self {
            major: 1.0,
            non_major: 0.3,
        }
    }
}

impl CourseWeights {
    pub fn from_config(grading: &GradingConfig) -> Self {
        Self {
            non_major: grading.non_major_weight,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct WeightedSum {
    weight: f64,
    grade_points: f64,
    scores: f64,
}

impl WeightedSum {
    fn add(&mut self, weight: f64, score: f64, grade_point: f64) {
        self.weight += weight;
        self.grade_points += grade_point * weight;
        self.scores += score * weight;
    }

    fn gpa(&self) -> f64 {
        ratio(self.grade_points, self.weight)
    }

    fn avg_score(&self) -> f64 {
        ratio(self.scores, self.weight)
    }
}

/// Overall averages weight every course by credits times its major/non-major
/// multiplier; major averages use plain credits over major courses only.
pub fn compute_metrics(records: &[CourseRecord], weights: CourseWeights) -> MetricsSnapshot {
    let mut overall = WeightedSum::default();
    let mut major = WeightedSum::default();

    for record in records {
        let resolved = resolve_score(&record.raw_score);
        let multiplier = if record.is_major {
            weights.major
        } else {
            weights.non_major
        };
        overall.add(record.credits * multiplier, resolved.score, resolved.grade_point);
        if record.is_major {
            major.add(record.credits, resolved.score, resolved.grade_point);
        }
    }

    MetricsSnapshot {
        gpa: round4(overall.gpa()),
        avg_score: round4(overall.avg_score()),
        major_gpa: round4(major.gpa()),
        major_avg_score: round4(major.avg_score()),
    }
}

fn ratio(total: f64, weight: f64) -> f64 {
    if weight > 0.0 {
        total / weight
    } else {
        0.0
    }
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
