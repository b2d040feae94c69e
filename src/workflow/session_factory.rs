use std::sync::Arc;

use tracing::info;

use crate::error::AppError;
use crate::models::{ClassSection, NewSessionRequest, Session, time_range_from_schedule};
use crate::store::AttendanceStore;

/// Creates sessions for a class. Validation runs before the store is called.
pub struct SessionFactory {
    store: Arc<dyn AttendanceStore>,
}

impl SessionFactory {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self { store }
    }

    /// Persists `req` and appends the created session to `class.sessions`.
    /// A missing time range is taken from the class schedule.
    pub async fn create_session(
        &self,
        class: &mut ClassSection,
        mut req: NewSessionRequest,
    ) -> Result<Session, AppError> {
        req.validate()?;

        req.title = req.title.trim().to_string();
        req.date = req.date.trim().to_string();
        let has_time_range = req
            .time_range
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_time_range {
            req.time_range = Some(time_range_from_schedule(&class.schedule));
        }

        let session = self.store.create_session(class.id, &req).await?;
        info!(
            "created {} session {} for {}",
            session.session_type, session.id, class.course_code
        );
        class.sessions.push(session.clone());
        Ok(session)
    }
}
