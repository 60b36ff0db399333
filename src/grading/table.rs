use crate::grading::ResolvedScore;

/// Closed integer score interval and the grade point it earns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBand {
    pub low: u8,
    pub high: u8,
    pub grade_point: f64,
}

impl GradeBand {
    const fn new(low: u8, high: u8, grade_point: f64) -> Self {
        Self {
            low,
            high,
            grade_point,
        }
    }

    pub fn contains(&self, score: f64) -> bool {
        f64::from(self.low) <= score && score <= f64::from(self.high)
    }
}

pub const GRADE_BANDS: [GradeBand; 14] = [
    GradeBand::new(95, 100, 5.0),
    GradeBand::new(92, 94, 4.8),
    GradeBand::new(89, 91, 4.5),
    GradeBand::new(86, 88, 4.2),
    GradeBand::new(83, 85, 3.9),
    GradeBand::new(80, 82, 3.6),
    GradeBand::new(77, 79, 3.3),
    GradeBand::new(74, 76, 3.0),
    GradeBand::new(71, 73, 2.7),
    GradeBand::new(68, 70, 2.4),
    GradeBand::new(65, 67, 2.1),
    GradeBand::new(62, 64, 1.8),
    GradeBand::new(60, 61, 1.5),
    GradeBand::new(0, 59, 0.0),
];

/// Five-level grades: excellent, good, fair, pass, fail.
pub const QUALITATIVE_GRADES: [(&str, ResolvedScore); 5] = [
    ("优秀", ResolvedScore::new(90.0, 4.5)),
    ("良好", ResolvedScore::new(80.0, 3.5)),
    ("中等", ResolvedScore::new(70.0, 2.5)),
    ("及格", ResolvedScore::new(60.0, 1.5)),
    ("不及格", ResolvedScore::new(0.0, 0.0)),
];

pub fn qualitative_grade(text: &str) -> Option<ResolvedScore> {
    QUALITATIVE_GRADES
        .iter()
        .find(|(label, _)| *label == text)
        .map(|(_, resolved)| *resolved)
}

/// First band containing `score`; `None` outside [0, 100] and between integer bands.
pub fn band_for(score: f64) -> Option<&'static GradeBand> {
    GRADE_BANDS.iter().find(|band| band.contains(score))
}

/// Maps a raw portal score to (score, grade point). Never fails: numbers outside
/// every band keep their value with grade point 0, and other text is (0, 0).
pub fn resolve_score(raw: &str) -> ResolvedScore {
    let text = raw.trim();
    if let Some(resolved) = qualitative_grade(text) {
        return resolved;
    }
    match text.parse::<f64>() {
        Ok(score) if score.is_finite() => {
            let grade_point = band_for(score).map_or(0.0, |band| band.grade_point);
            ResolvedScore::new(score, grade_point)
        }
        _ => ResolvedScore::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::{band_for, resolve_score, GRADE_BANDS, QUALITATIVE_GRADES};
    use crate::grading::ResolvedScore;

    #[test]
    fn every_integer_score_has_exactly_one_band() {
        for score in 0u8..=100 {
            let matches = GRADE_BANDS
                .iter()
                .filter(|band| band.contains(f64::from(score)))
                .count();
            assert_eq!(matches, 1, "score {score}");
        }
    }

    #[test]
    fn bands_are_ordered_and_adjacent() {
        for pair in GRADE_BANDS.windows(2) {
            assert!(pair[0].low <= pair[0].high);
            assert_eq!(pair[1].high + 1, pair[0].low);
            assert!(pair[1].grade_point < pair[0].grade_point);
        }
        assert_eq!(GRADE_BANDS[0].high, 100);
        assert_eq!(GRADE_BANDS[GRADE_BANDS.len() - 1].low, 0);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(resolve_score("95"), ResolvedScore::new(95.0, 5.0));
        assert_eq!(resolve_score("94"), ResolvedScore::new(94.0, 4.8));
        assert_eq!(resolve_score("92"), ResolvedScore::new(92.0, 4.8));
        assert_eq!(resolve_score("61"), ResolvedScore::new(61.0, 1.5));
        assert_eq!(resolve_score("60"), ResolvedScore::new(60.0, 1.5));
        assert_eq!(resolve_score("59"), ResolvedScore::new(59.0, 0.0));
        assert_eq!(resolve_score(" 100 "), ResolvedScore::new(100.0, 5.0));
    }

    #[test]
    fn every_qualitative_entry_resolves() {
        for (label, expected) in QUALITATIVE_GRADES {
            assert_eq!(resolve_score(label), expected, "{label}");
        }
        assert_eq!(resolve_score("良好"), ResolvedScore::new(80.0, 3.5));
    }

    #[test]
    fn unresolvable_text_is_zero() {
        assert_eq!(resolve_score("合格"), ResolvedScore::ZERO);
        assert_eq!(resolve_score(""), ResolvedScore::ZERO);
        assert_eq!(resolve_score("NaN"), ResolvedScore::ZERO);
        assert_eq!(resolve_score("inf"), ResolvedScore::ZERO);
    }

    #[test]
    fn numbers_outside_every_band_keep_their_score() {
        assert_eq!(resolve_score("120"), ResolvedScore::new(120.0, 0.0));
        assert_eq!(resolve_score("94.5"), ResolvedScore::new(94.5, 0.0));
        assert!(band_for(-1.0).is_none());
    }
}
