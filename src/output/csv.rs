use anyhow::Result;

use crate::grading::table::resolve_score;
use crate::records::CourseRecord;

pub fn courses_to_csv(records: &[CourseRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "name",
        "credits",
        "score",
        "grade_point",
        "semester",
        "is_major",
    ])?;
    for record in records {
        let resolved = resolve_score(&record.raw_score);
        writer.write_record([
            record.name.clone(),
            record.credits.to_string(),
            record.raw_score.clone(),
            format!("{:.1}", resolved.grade_point),
            record.semester.to_string(),
            record.is_major.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
