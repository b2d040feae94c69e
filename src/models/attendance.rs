use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Roster column value for an enrollment without a record for the session.
pub const NOT_MARKED: &str = "not-marked";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    #[serde(alias = "excuse")]
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, AttendanceStatus::Present)
    }

    /// Decodes a roster status column, mapping the `not-marked` sentinel to `None`.
    pub fn from_roster_column(value: &str) -> Result<Option<Self>, AppError> {
        if value == NOT_MARKED {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            "excused" | "excuse" => Ok(AttendanceStatus::Excused),
            other => Err(AppError::BadRequest(format!("unknown attendance status: {}", other))),
        }
    }
}

/// One enrolled student as seen from a session roster. `status` is a
/// projection of the stored record for the session being viewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub enrollment_id: i64,
    pub name: String,
    pub student_number: String,
    pub status: Option<AttendanceStatus>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub session_id: i64,
    pub enrollment_id: i64,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertAttendanceRequest {
    pub session_id: i64,
    pub enrollment_id: i64,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl UpsertAttendanceRequest {
    pub fn new(
        session_id: i64,
        enrollment_id: i64,
        status: AttendanceStatus,
        remarks: Option<String>,
    ) -> Self {
        Self {
            session_id,
            enrollment_id,
            status,
            remarks: normalize_remarks(remarks),
        }
    }
}

/// Blank remarks are stored as NULL.
pub fn normalize_remarks(remarks: Option<String>) -> Option<String> {
    remarks
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}
