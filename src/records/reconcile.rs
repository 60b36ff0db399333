use std::collections::HashSet;

use crate::records::{CourseKey, CourseRecord, RawCourse};

/// Merges the two portal sources into one record set.
///
/// Major-statistics courses come first and are authoritative for any identity
/// they share with the transcript. Transcript courses fill in the rest as
/// non-major. Items without a name or a score are dropped, and a repeated
/// identity keeps its first occurrence.
pub fn reconcile(major: &[RawCourse], transcript: &[RawCourse]) -> Vec<CourseRecord> {
    let mut seen: HashSet<CourseKey> = HashSet::new();
    let mut records = Vec::with_capacity(major.len() + transcript.len());

    let tagged = major
        .iter()
        .map(|raw| (raw, true))
        .chain(transcript.iter().map(|raw| (raw, false)));
    for (raw, is_major) in tagged {
        let (Some(name), Some(score)) = (raw.name.as_ref(), raw.score.as_ref()) else {
            continue;
        };
        let record = CourseRecord {
            name: name.clone(),
            credits: raw.credits,
            raw_score: score.clone(),
            semester: raw.semester,
            is_major,
        };
        if seen.insert(record.key()) {
            records.push(record);
        }
    }
    records
}
