pub mod http;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    AttendanceRecord, ClassSection, NewSessionRequest, Session, Student, UpsertAttendanceRequest,
};

pub use http::HttpAttendanceStore;
pub use sqlite::SqliteAttendanceStore;

/// Read/write contract of the attendance tables, as seen by the workflow.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn fetch_classes(&self) -> Result<Vec<ClassSection>, AppError>;
    async fn fetch_sessions(&self, section_id: i64) -> Result<Vec<Session>, AppError>;
    /// Enrolled students with their status for `session_id`, `None` when unmarked.
    async fn fetch_roster(&self, section_id: i64, session_id: i64) -> Result<Vec<Student>, AppError>;
    /// Insert-or-update keyed by `(session_id, enrollment_id)`; last write wins.
    async fn upsert_record(&self, req: &UpsertAttendanceRequest) -> Result<AttendanceRecord, AppError>;
    async fn create_session(
        &self,
        section_id: i64,
        req: &NewSessionRequest,
    ) -> Result<Session, AppError>;
}
