use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Lecture,
    Laboratory,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Lecture => "lecture",
            SessionType::Laboratory => "laboratory",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Lecture => "Lecture",
            SessionType::Laboratory => "Laboratory",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lecture" => Ok(SessionType::Lecture),
            "laboratory" | "lab" => Ok(SessionType::Laboratory),
            other => Err(AppError::BadRequest(format!("unknown session type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub section_id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub time_range: String,
    pub session_type: SessionType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSessionRequest {
    pub title: String,
    pub date: String,
    pub session_type: SessionType,
    #[serde(default)]
    pub time_range: Option<String>,
}

impl NewSessionRequest {
    /// Blocking checks run before anything touches the store.
    pub fn validate(&self) -> Result<NaiveDate, AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("session title is required".to_string()));
        }
        let date = self.date.trim();
        if date.is_empty() {
            return Err(AppError::Validation("session date is required".to_string()));
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            AppError::Validation(format!("session date must be YYYY-MM-DD, got {}", date))
        })
    }
}
