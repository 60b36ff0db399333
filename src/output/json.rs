use anyhow::Result;
use serde::Serialize;

use crate::grading::MetricsSnapshot;
use crate::records::CourseRecord;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[derive(Serialize)]
struct GradeReport<'a> {
    courses: &'a [CourseRecord],
    metrics: &'a MetricsSnapshot,
}

/// `{ "courses": [...], "metrics": {...} }`
pub fn render_report_json(records: &[CourseRecord], metrics: &MetricsSnapshot) -> Result<String> {
    render_json(&GradeReport {
        courses: records,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::render_report_json;
    use crate::grading::MetricsSnapshot;
    use crate::records::semester::Semester;
    use crate::records::CourseRecord;

    #[test]
    fn report_nests_courses_and_metrics() {
        let records = vec![CourseRecord {
            name: "数据结构".to_string(),
            credits: 3.0,
            raw_score: "92".to_string(),
            semester: Semester::from_label("23-24秋冬"),
            is_major: true,
        }];
        let metrics = MetricsSnapshot {
            gpa: 4.8,
            avg_score: 92.0,
            major_gpa: 4.8,
            major_avg_score: 92.0,
        };
        let value: Value =
            serde_json::from_str(&render_report_json(&records, &metrics).expect("render"))
                .expect("json");
        assert_eq!(value["courses"][0]["score"], "92");
        assert_eq!(value["metrics"]["major_gpa"], 4.8);
    }
}
