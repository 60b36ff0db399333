use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::grading::table::resolve_score;
use crate::grading::MetricsSnapshot;
use crate::records::CourseRecord;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn render_course_table(records: &[CourseRecord]) -> String {
    let mut table = new_table();
    table.set_header(vec!["课程", "学分", "成绩", "绩点", "学期", "主修"]);

    for record in records {
        let resolved = resolve_score(&record.raw_score);
        let point_cell = if resolved.grade_point >= 4.0 {
            Cell::new(format!("{:.1}", resolved.grade_point)).fg(Color::Green)
        } else if resolved.grade_point == 0.0 {
            Cell::new(format!("{:.1}", resolved.grade_point)).fg(Color::Red)
        } else {
            Cell::new(format!("{:.1}", resolved.grade_point))
        };
        table.add_row(Row::from(vec![
            Cell::new(&record.name),
            Cell::new(record.credits),
            Cell::new(&record.raw_score),
            point_cell,
            Cell::new(record.semester),
            Cell::new(if record.is_major { "是" } else { "否" }),
        ]));
    }
    table.to_string()
}

pub fn render_metrics_table(metrics: &MetricsSnapshot) -> String {
    let mut table = new_table();
    table.set_header(vec!["指标", "数值"]);
    table.add_row(vec!["加权GPA".to_string(), format!("{:.4}", metrics.gpa)]);
    table.add_row(vec!["加权均分".to_string(), format!("{:.4}", metrics.avg_score)]);
    table.add_row(vec!["主修GPA".to_string(), format!("{:.4}", metrics.major_gpa)]);
    table.add_row(vec![
        "主修均分".to_string(),
        format!("{:.4}", metrics.major_avg_score),
    ]);
    table.to_string()
}
