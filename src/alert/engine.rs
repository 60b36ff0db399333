use serde::{Deserialize, Serialize};

use crate::records::CourseRecord;

pub const NEW_GRADES_TITLE: &str = "新成绩通知";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub title: String,
    pub body: String,
    pub courses: Vec<String>,
}

/// Builds the "new grades posted" alert, or nothing when no course was added.
pub fn new_grades_alert(added: &[CourseRecord]) -> Option<AlertEvent> {
    if added.is_empty() {
        return None;
    }
    let courses = added
        .iter()
        .map(|record| record.name.clone())
        .collect::<Vec<_>>();
    Some(AlertEvent {
        title: NEW_GRADES_TITLE.to_string(),
        body: format!("有新科目出分：{}", courses.join(", ")),
        courses,
    })
}
