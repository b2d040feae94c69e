use serde::{Deserialize, Serialize};

use super::Session;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSection {
    pub id: i64,
    pub course_code: String,
    pub course_title: String,
    pub schedule: String,
    pub student_count: i64,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl ClassSection {
    pub fn has_session(&self, session_id: i64) -> bool {
        self.sessions.iter().any(|s| s.id == session_id)
    }
}

/// Pulls the clock portion out of a schedule string such as
/// `"MWF 9:00 AM - 10:30 AM"`: everything from the first digit onward.
/// A schedule without any digit is returned whole.
pub fn time_range_from_schedule(schedule: &str) -> String {
    let schedule = schedule.trim();
    match schedule.find(|c: char| c.is_ascii_digit()) {
        Some(start) => schedule[start..].trim().to_string(),
        None => schedule.to_string(),
    }
}
