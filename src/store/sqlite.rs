use async_trait::async_trait;
use sqlx::SqlitePool;

use super::AttendanceStore;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    AttendanceRecord, ClassSection, NewSessionRequest, Session, Student, UpsertAttendanceRequest,
};

/// Talks to the attendance tables directly through a pool.
#[derive(Clone)]
pub struct SqliteAttendanceStore {
    db: SqlitePool,
}

impl SqliteAttendanceStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AttendanceStore for SqliteAttendanceStore {
    async fn fetch_classes(&self) -> Result<Vec<ClassSection>, AppError> {
        repository::fetch_classes(&self.db).await
    }

    async fn fetch_sessions(&self, section_id: i64) -> Result<Vec<Session>, AppError> {
        repository::fetch_sessions(&self.db, section_id).await
    }

    async fn fetch_roster(&self, section_id: i64, session_id: i64) -> Result<Vec<Student>, AppError> {
        repository::fetch_roster(&self.db, section_id, session_id).await
    }

    async fn upsert_record(&self, req: &UpsertAttendanceRequest) -> Result<AttendanceRecord, AppError> {
        repository::upsert_record(&self.db, req).await
    }

    async fn create_session(
        &self,
        section_id: i64,
        req: &NewSessionRequest,
    ) -> Result<Session, AppError> {
        repository::insert_session(&self.db, section_id, req).await
    }
}
