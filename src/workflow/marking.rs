use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{AttendanceStatus, Student, UpsertAttendanceRequest};
use crate::store::AttendanceStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideshowState {
    Presenting {
        index: usize,
    },
    AwaitingRemarks {
        index: usize,
        pending_status: AttendanceStatus,
        remarks_draft: String,
    },
    Done,
}

/// Walks a roster snapshot one student at a time.
///
/// Only `mark_present` and `submit_remarks` write. A write is awaited before
/// the index moves; when it fails the state stays exactly where it was.
pub struct AttendanceMarkingWorkflow {
    store: Arc<dyn AttendanceStore>,
    session_id: i64,
    roster: Vec<Student>,
    state: SlideshowState,
}

impl AttendanceMarkingWorkflow {
    pub fn start(
        store: Arc<dyn AttendanceStore>,
        session_id: i64,
        roster: Vec<Student>,
    ) -> Result<Self, AppError> {
        if roster.is_empty() {
            return Err(AppError::Validation("no students to mark".to_string()));
        }

        info!("marking session {} for {} students", session_id, roster.len());
        Ok(Self {
            store,
            session_id,
            roster,
            state: SlideshowState::Presenting { index: 0 },
        })
    }

    pub fn state(&self) -> &SlideshowState {
        &self.state
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    pub fn is_done(&self) -> bool {
        self.state == SlideshowState::Done
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            SlideshowState::Presenting { index } | SlideshowState::AwaitingRemarks { index, .. } => {
                Some(index)
            }
            SlideshowState::Done => None,
        }
    }

    pub fn current_student(&self) -> Option<&Student> {
        self.current_index().and_then(|i| self.roster.get(i))
    }

    /// One-based position and roster length, e.g. `(3, 10)`.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current_index().map(|i| (i + 1, self.roster.len()))
    }

    pub async fn mark_present(&mut self) -> Result<&SlideshowState, AppError> {
        let index = self.presenting_index()?;
        self.write(index, AttendanceStatus::Present, None).await?;
        Ok(self.advance_or_finish(index))
    }

    /// Holds `status` until remarks are submitted or skipped. Nothing is written.
    pub fn mark_non_present(&mut self, status: AttendanceStatus) -> Result<(), AppError> {
        if status.is_present() {
            return Err(AppError::Validation(
                "present is marked directly, without remarks".to_string(),
            ));
        }
        let index = self.presenting_index()?;
        self.state = SlideshowState::AwaitingRemarks {
            index,
            pending_status: status,
            remarks_draft: String::new(),
        };
        Ok(())
    }

    pub fn update_remarks_draft(&mut self, text: impl Into<String>) -> Result<(), AppError> {
        match &mut self.state {
            SlideshowState::AwaitingRemarks { remarks_draft, .. } => {
                *remarks_draft = text.into();
                Ok(())
            }
            _ => Err(not_awaiting_remarks()),
        }
    }

    pub async fn submit_remarks(&mut self) -> Result<&SlideshowState, AppError> {
        let (index, status, remarks) = match &self.state {
            SlideshowState::AwaitingRemarks {
                index,
                pending_status,
                remarks_draft,
            } => (*index, *pending_status, remarks_draft.clone()),
            _ => return Err(not_awaiting_remarks()),
        };

        self.write(index, status, Some(remarks)).await?;
        Ok(self.advance_or_finish(index))
    }

    /// Drops the pending status and draft; the student stays unmarked.
    pub fn skip_remarks(&mut self) -> Result<(), AppError> {
        match self.state {
            SlideshowState::AwaitingRemarks { index, .. } => {
                self.state = SlideshowState::Presenting { index };
                Ok(())
            }
            _ => Err(not_awaiting_remarks()),
        }
    }

    pub fn navigate_previous(&mut self) -> Result<(), AppError> {
        let index = self.presenting_index()?;
        self.state = SlideshowState::Presenting {
            index: index.saturating_sub(1),
        };
        Ok(())
    }

    pub fn navigate_next(&mut self) -> Result<(), AppError> {
        let index = self.presenting_index()?;
        let last = self.roster.len() - 1;
        self.state = SlideshowState::Presenting {
            index: (index + 1).min(last),
        };
        Ok(())
    }

    fn presenting_index(&self) -> Result<usize, AppError> {
        match self.state {
            SlideshowState::Presenting { index } => Ok(index),
            SlideshowState::AwaitingRemarks { .. } => Err(AppError::InvalidTransition(
                "finish or skip remarks first".to_string(),
            )),
            SlideshowState::Done => Err(AppError::InvalidTransition(
                "marking already finished".to_string(),
            )),
        }
    }

    fn advance_or_finish(&mut self, index: usize) -> &SlideshowState {
        self.state = if index + 1 >= self.roster.len() {
            info!("finished marking session {}", self.session_id);
            SlideshowState::Done
        } else {
            SlideshowState::Presenting { index: index + 1 }
        };
        &self.state
    }

    async fn write(
        &mut self,
        index: usize,
        status: AttendanceStatus,
        remarks: Option<String>,
    ) -> Result<(), AppError> {
        let student = &self.roster[index];
        let req = UpsertAttendanceRequest::new(self.session_id, student.enrollment_id, status, remarks);

        match self.store.upsert_record(&req).await {
            Ok(record) => {
                info!(
                    "marked {} as {} in session {}",
                    self.roster[index].name, record.status, self.session_id
                );
                let student = &mut self.roster[index];
                student.status = Some(record.status);
                student.remarks = record.remarks;
                Ok(())
            }
            Err(e) => {
                warn!(
                    "failed to mark enrollment {} in session {}: {}",
                    req.enrollment_id, self.session_id, e
                );
                Err(e)
            }
        }
    }
}

fn not_awaiting_remarks() -> AppError {
    AppError::InvalidTransition("no status is waiting for remarks".to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::{AttendanceRecord, ClassSection, NewSessionRequest, Session};

    /// Records upserts in memory; can be told to fail every write. Reads
    /// return whatever was preloaded.
    #[derive(Default)]
    pub(crate) struct RecordingStore {
        pub classes: Vec<ClassSection>,
        pub roster: Vec<Student>,
        pub writes: Mutex<Vec<UpsertAttendanceRequest>>,
        pub created_sessions: Mutex<Vec<(i64, NewSessionRequest)>>,
        pub fail_writes: AtomicBool,
    }

    impl RecordingStore {
        pub fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AttendanceStore for RecordingStore {
        async fn fetch_classes(&self) -> Result<Vec<ClassSection>, AppError> {
            Ok(self.classes.clone())
        }

        async fn fetch_sessions(&self, section_id: i64) -> Result<Vec<Session>, AppError> {
            Ok(self
                .classes
                .iter()
                .find(|c| c.id == section_id)
                .map(|c| c.sessions.clone())
                .unwrap_or_default())
        }

        async fn fetch_roster(&self, _section_id: i64, _session_id: i64) -> Result<Vec<Student>, AppError> {
            Ok(self.roster.clone())
        }

        async fn upsert_record(&self, req: &UpsertAttendanceRequest) -> Result<AttendanceRecord, AppError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Store("connection refused".to_string()));
            }
            let mut writes = self.writes.lock().unwrap();
            writes.push(req.clone());
            Ok(AttendanceRecord {
                id: writes.len() as i64,
                session_id: req.session_id,
                enrollment_id: req.enrollment_id,
                status: req.status,
                remarks: req.remarks.clone(),
                recorded_at: "2024-12-15T09:00:00+00:00".to_string(),
            })
        }

        async fn create_session(
            &self,
            section_id: i64,
            req: &NewSessionRequest,
        ) -> Result<Session, AppError> {
            let date = req.validate()?;
            let mut created = self.created_sessions.lock().unwrap();
            created.push((section_id, req.clone()));
            Ok(Session {
                id: 1000 + created.len() as i64,
                section_id,
                title: req.title.clone(),
                date,
                time_range: req.time_range.clone().unwrap_or_default(),
                session_type: req.session_type,
            })
        }
    }

    pub(crate) fn roster(n: usize) -> Vec<Student> {
        (0..n as i64)
            .map(|i| Student {
                id: i + 1,
                enrollment_id: 100 + i,
                name: format!("Student {}", i + 1),
                student_number: format!("2024-{:05}", i + 1),
                status: None,
                remarks: None,
            })
            .collect()
    }

    fn workflow(n: usize) -> (Arc<RecordingStore>, AttendanceMarkingWorkflow) {
        let store = Arc::new(RecordingStore::default());
        let wf = AttendanceMarkingWorkflow::start(store.clone(), 10, roster(n)).unwrap();
        (store, wf)
    }

    #[test]
    fn test_start_requires_students() {
        let store = Arc::new(RecordingStore::default());
        let result = AttendanceMarkingWorkflow::start(store, 10, Vec::new());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_mark_present_finishes_after_last_student() {
        let (store, mut wf) = workflow(3);
        assert_eq!(wf.position(), Some((1, 3)));

        for expected_next in 1..3 {
            let state = wf.mark_present().await.unwrap();
            assert_eq!(*state, SlideshowState::Presenting { index: expected_next });
            assert!(!wf.is_done());
        }
        let state = wf.mark_present().await.unwrap();
        assert_eq!(*state, SlideshowState::Done);
        assert_eq!(store.write_count(), 3);
        assert!(wf.roster().iter().all(|s| s.status == Some(AttendanceStatus::Present)));

        assert!(matches!(wf.mark_present().await, Err(AppError::InvalidTransition(_))));
        assert_eq!(store.write_count(), 3);
    }

    #[tokio::test]
    async fn test_single_student_roster_finishes_on_first_mark() {
        let (_store, mut wf) = workflow(1);
        assert_eq!(*wf.mark_present().await.unwrap(), SlideshowState::Done);
        assert_eq!(wf.current_student(), None);
    }

    #[test]
    fn test_navigation_clamps_without_writing() {
        let (store, mut wf) = workflow(2);

        wf.navigate_previous().unwrap();
        assert_eq!(wf.current_index(), Some(0));
        wf.navigate_next().unwrap();
        wf.navigate_next().unwrap();
        assert_eq!(wf.current_index(), Some(1));
        assert_eq!(wf.current_student().map(|s| s.enrollment_id), Some(101));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_non_present_requires_remarks_step() {
        let (store, mut wf) = workflow(2);

        wf.mark_non_present(AttendanceStatus::Late).unwrap();
        assert_eq!(store.write_count(), 0);
        assert!(matches!(wf.navigate_next(), Err(AppError::InvalidTransition(_))));
        assert!(matches!(wf.mark_present().await, Err(AppError::InvalidTransition(_))));

        wf.update_remarks_draft("bus delay").unwrap();
        let state = wf.submit_remarks().await.unwrap();
        assert_eq!(*state, SlideshowState::Presenting { index: 1 });

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].enrollment_id, 100);
        assert_eq!(writes[0].status, AttendanceStatus::Late);
        assert_eq!(writes[0].remarks.as_deref(), Some("bus delay"));
    }

    #[tokio::test]
    async fn test_skip_remarks_never_writes() {
        let (store, mut wf) = workflow(2);

        wf.mark_non_present(AttendanceStatus::Absent).unwrap();
        wf.update_remarks_draft("typed then abandoned").unwrap();
        wf.skip_remarks().unwrap();

        assert_eq!(*wf.state(), SlideshowState::Presenting { index: 0 });
        assert_eq!(store.write_count(), 0);
        assert_eq!(wf.roster()[0].status, None);

        // the draft does not leak into the next remarks step
        wf.mark_non_present(AttendanceStatus::Excused).unwrap();
        match wf.state() {
            SlideshowState::AwaitingRemarks { remarks_draft, .. } => assert!(remarks_draft.is_empty()),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_submit_on_last_student_finishes() {
        let (store, mut wf) = workflow(2);
        wf.navigate_next().unwrap();

        wf.mark_non_present(AttendanceStatus::Absent).unwrap();
        assert_eq!(*wf.submit_remarks().await.unwrap(), SlideshowState::Done);
        assert_eq!(store.write_count(), 1);
        // blank remarks are stored as none
        assert_eq!(store.writes.lock().unwrap()[0].remarks, None);
    }

    #[test]
    fn test_present_is_not_a_remarks_status() {
        let (_store, mut wf) = workflow(2);
        assert!(matches!(
            wf.mark_non_present(AttendanceStatus::Present),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(wf.skip_remarks(), Err(AppError::InvalidTransition(_))));
        assert!(matches!(wf.update_remarks_draft("x"), Err(AppError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_state() {
        let (store, mut wf) = workflow(2);
        store.fail_writes.store(true, Ordering::SeqCst);

        assert!(matches!(wf.mark_present().await, Err(AppError::Store(_))));
        assert_eq!(*wf.state(), SlideshowState::Presenting { index: 0 });

        wf.mark_non_present(AttendanceStatus::Late).unwrap();
        wf.update_remarks_draft("traffic").unwrap();
        assert!(wf.submit_remarks().await.is_err());
        assert_eq!(
            *wf.state(),
            SlideshowState::AwaitingRemarks {
                index: 0,
                pending_status: AttendanceStatus::Late,
                remarks_draft: "traffic".to_string(),
            }
        );

        store.fail_writes.store(false, Ordering::SeqCst);
        assert_eq!(
            *wf.submit_remarks().await.unwrap(),
            SlideshowState::Presenting { index: 1 }
        );
        assert_eq!(store.write_count(), 1);
    }
}
