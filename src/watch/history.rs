use std::collections::BTreeSet;

use crate::records::{CourseKey, CourseRecord};

#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// No baseline existed yet; the records became the baseline.
    First,
    /// Courses whose identity was absent from the baseline, in portal order.
    Added(Vec<CourseRecord>),
    Unchanged,
}

/// Identities accepted by the last successful cycle.
///
/// Only additions count as change. A cycle that merely loses identities leaves
/// the baseline untouched, so a course that vanishes and reappears is not
/// reported twice.
#[derive(Debug, Clone, Default)]
pub struct PollHistory {
    baseline: Option<BTreeSet<CourseKey>>,
}

impl PollHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(records: &[CourseRecord]) -> Self {
        Self {
            baseline: Some(key_set(records)),
        }
    }

    pub fn baseline(&self) -> Option<&BTreeSet<CourseKey>> {
        self.baseline.as_ref()
    }

    pub fn observe(&mut self, records: &[CourseRecord]) -> Observation {
        let Some(baseline) = &self.baseline else {
            self.baseline = Some(key_set(records));
            return Observation::First;
        };
        let added = records
            .iter()
            .filter(|record| !baseline.contains(&record.key()))
            .cloned()
            .collect::<Vec<_>>();
        if added.is_empty() {
            return Observation::Unchanged;
        }
        self.baseline = Some(key_set(records));
        Observation::Added(added)
    }
}

fn key_set(records: &[CourseRecord]) -> BTreeSet<CourseKey> {
    records.iter().map(CourseRecord::key).collect()
}
