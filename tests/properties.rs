//! Property tests for score resolution, semester parsing, reconciliation,
//! metrics and change detection.

use std::collections::HashSet;

use grade_monitor::grading::metrics::{compute_metrics, CourseWeights};
use grade_monitor::grading::table::{band_for, resolve_score};
use grade_monitor::records::reconcile::reconcile;
use grade_monitor::records::semester::Semester;
use grade_monitor::records::{CourseRecord, RawCourse};
use grade_monitor::watch::history::{Observation, PollHistory};
use proptest::prelude::*;

const NAMES: [&str; 5] = ["数据结构", "体育", "线性代数", "编译原理", "大学英语"];
const SCORES: [&str; 10] = ["95", "92", "88", "73", "60", "45", "优秀", "良好", "合格", ""];
const SEMESTERS: [&str; 4] = ["22-23秋冬", "22-23春夏", "23-24秋冬", "未知学期"];
const CREDITS: [f64; 6] = [0.0, 0.5, 1.0, 2.0, 3.0, 4.5];

fn raw_course() -> impl Strategy<Value = RawCourse> {
    (
        prop::sample::select(NAMES.to_vec()),
        prop::sample::select(CREDITS.to_vec()),
        prop::sample::select(SCORES.to_vec()),
        prop::sample::select(SEMESTERS.to_vec()),
        any::<bool>(),
    )
        .prop_map(|(name, credits, score, semester, named)| RawCourse {
            name: named.then(|| name.to_string()),
            credits,
            score: (!score.is_empty()).then(|| score.to_string()),
            semester: Semester::from_label(semester),
            completion: None,
        })
}

fn course_record() -> impl Strategy<Value = CourseRecord> {
    (
        prop::sample::select(NAMES.to_vec()),
        prop::sample::select(CREDITS.to_vec()),
        prop::sample::select(SCORES.to_vec()),
        prop::sample::select(SEMESTERS.to_vec()),
        any::<bool>(),
    )
        .prop_map(|(name, credits, score, semester, is_major)| CourseRecord {
            name: name.to_string(),
            credits,
            raw_score: score.to_string(),
            semester: Semester::from_label(semester),
            is_major,
        })
}

fn as_raw(record: &CourseRecord) -> RawCourse {
    RawCourse {
        name: Some(record.name.clone()),
        credits: record.credits,
        score: Some(record.raw_score.clone()),
        semester: record.semester,
        completion: None,
    }
}

fn key_set(records: &[CourseRecord]) -> std::collections::BTreeSet<grade_monitor::records::CourseKey> {
    records.iter().map(CourseRecord::key).collect()
}

proptest! {
    #[test]
    fn every_integer_score_resolves_through_a_band(score in 0u8..=100) {
        let band = band_for(f64::from(score));
        prop_assert!(band.is_some());
        let resolved = resolve_score(&score.to_string());
        prop_assert_eq!(resolved.score, f64::from(score));
        prop_assert_eq!(resolved.grade_point, band.map_or(-1.0, |b| b.grade_point));
    }

    #[test]
    fn semester_parsing_is_total(code in "\\PC{0,40}") {
        let semester = Semester::from_code(&code);
        if code.chars().count() < 12 {
            prop_assert_eq!(semester, Semester::Unknown);
        }
        prop_assert_eq!(Semester::from_label(&semester.to_string()), semester);
    }

    #[test]
    fn well_formed_codes_always_parse(start in 1990i64..2100, term in prop::sample::select(vec!["1", "2", "3"])) {
        let code = format!("({}-{}-{})-211G0210-0088157-1", start, start + 1, term);
        prop_assert!(Semester::from_code(&code).is_known());
    }

    #[test]
    fn reconciled_identities_are_unique(
        major in prop::collection::vec(raw_course(), 0..12),
        transcript in prop::collection::vec(raw_course(), 0..12),
    ) {
        let records = reconcile(&major, &transcript);
        let keys: HashSet<_> = records.iter().map(CourseRecord::key).collect();
        prop_assert_eq!(keys.len(), records.len());
    }

    #[test]
    fn reconciling_a_reconciled_set_changes_nothing(
        major in prop::collection::vec(raw_course(), 0..12),
        transcript in prop::collection::vec(raw_course(), 0..12),
    ) {
        let records = reconcile(&major, &transcript);
        let again_major: Vec<_> = records.iter().filter(|r| r.is_major).map(as_raw).collect();
        let again_transcript: Vec<_> = records.iter().filter(|r| !r.is_major).map(as_raw).collect();
        prop_assert_eq!(reconcile(&again_major, &again_transcript), records);
    }

    #[test]
    fn metrics_stay_within_component_bounds(records in prop::collection::vec(course_record(), 0..16)) {
        let metrics = compute_metrics(&records, CourseWeights::default());
        let weighted: Vec<_> = records
            .iter()
            .filter(|r| r.credits > 0.0)
            .map(|r| resolve_score(&r.raw_score))
            .collect();
        if weighted.is_empty() {
            prop_assert_eq!(metrics.gpa, 0.0);
            prop_assert_eq!(metrics.avg_score, 0.0);
        } else {
            let tolerance = 1e-4;
            let lo_gp = weighted.iter().map(|s| s.grade_point).fold(f64::INFINITY, f64::min);
            let hi_gp = weighted.iter().map(|s| s.grade_point).fold(f64::NEG_INFINITY, f64::max);
            let lo_score = weighted.iter().map(|s| s.score).fold(f64::INFINITY, f64::min);
            let hi_score = weighted.iter().map(|s| s.score).fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(metrics.gpa >= lo_gp - tolerance && metrics.gpa <= hi_gp + tolerance);
            prop_assert!(metrics.avg_score >= lo_score - tolerance && metrics.avg_score <= hi_score + tolerance);
        }
        if !records.iter().any(|r| r.is_major && r.credits > 0.0) {
            prop_assert_eq!(metrics.major_gpa, 0.0);
            prop_assert_eq!(metrics.major_avg_score, 0.0);
        }
    }

    #[test]
    fn change_detection_is_monotonic_additive(
        first in prop::collection::vec(course_record(), 0..8),
        second in prop::collection::vec(course_record(), 0..8),
    ) {
        let mut history = PollHistory::new();
        prop_assert_eq!(history.observe(&first), Observation::First);
        let before = history.baseline().cloned();

        match history.observe(&second) {
            Observation::Added(added) => {
                prop_assert!(!added.is_empty());
                let old = before.clone().unwrap_or_default();
                prop_assert!(added.iter().all(|r| !old.contains(&r.key())));
                prop_assert_eq!(history.baseline().cloned(), Some(key_set(&second)));
            }
            Observation::Unchanged => {
                prop_assert!(key_set(&second).is_subset(&before.clone().unwrap_or_default()));
                prop_assert_eq!(history.baseline().cloned(), before);
            }
            Observation::First => prop_assert!(false, "baseline already existed"),
        }
    }
}
