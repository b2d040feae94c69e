use std::sync::Arc;

use tracing::{debug, info};

use super::marking::AttendanceMarkingWorkflow;
use super::navigation::{BackOutcome, NavigationController, View};
use super::search::SearchScopeManager;
use super::session_factory::SessionFactory;
use crate::error::AppError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, ClassSection, NewSessionRequest, Session, Student,
    UpsertAttendanceRequest,
};
use crate::store::AttendanceStore;

/// At most one dialog is open at a time.
pub enum Overlay {
    None,
    CreateSession,
    DirectMark { enrollment_id: i64 },
    Slideshow(AttendanceMarkingWorkflow),
}

impl Overlay {
    pub fn is_none(&self) -> bool {
        matches!(self, Overlay::None)
    }

    fn name(&self) -> &'static str {
        match self {
            Overlay::None => "none",
            Overlay::CreateSession => "create-session",
            Overlay::DirectMark { .. } => "direct-mark",
            Overlay::Slideshow(_) => "slideshow",
        }
    }
}

/// The attendance subsystem as a host embeds it: navigation, the loaded
/// collections for each level, and whichever overlay is active.
pub struct AttendanceScreen {
    store: Arc<dyn AttendanceStore>,
    nav: NavigationController,
    factory: SessionFactory,
    classes: Vec<ClassSection>,
    roster: Vec<Student>,
    overlay: Overlay,
}

impl AttendanceScreen {
    pub async fn open(store: Arc<dyn AttendanceStore>) -> Result<Self, AppError> {
        let classes = store.fetch_classes().await?;
        info!("attendance opened with {} classes", classes.len());
        Ok(Self::with_navigation(store, NavigationController::new(), classes))
    }

    /// Starts on the class detail of `class_id`; backing out of it leaves the
    /// subsystem instead of showing the class list.
    pub async fn open_deep_linked(
        store: Arc<dyn AttendanceStore>,
        class_id: i64,
    ) -> Result<Self, AppError> {
        let classes = store.fetch_classes().await?;
        let class = classes
            .iter()
            .find(|c| c.id == class_id)
            .cloned()
            .ok_or(AppError::NotFound)?;

        info!("attendance opened on class {}", class.course_code);
        Ok(Self::with_navigation(store, NavigationController::deep_linked(class), classes))
    }

    fn with_navigation(
        store: Arc<dyn AttendanceStore>,
        nav: NavigationController,
        classes: Vec<ClassSection>,
    ) -> Self {
        Self {
            factory: SessionFactory::new(store.clone()),
            store,
            nav,
            classes,
            roster: Vec::new(),
            overlay: Overlay::None,
        }
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn view(&self) -> View {
        self.nav.view()
    }

    pub fn search_mut(&mut self) -> &mut SearchScopeManager {
        self.nav.search_mut()
    }

    pub fn toggle_roster_view(&mut self) {
        self.nav.toggle_roster_view();
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn classes(&self) -> &[ClassSection] {
        &self.classes
    }

    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    pub fn visible_classes(&self) -> Vec<&ClassSection> {
        self.nav.search().classes(&self.classes)
    }

    pub fn visible_sessions(&self) -> Vec<&Session> {
        match self.nav.selected_class() {
            Some(class) => self.nav.search().sessions(&class.sessions),
            None => Vec::new(),
        }
    }

    pub fn visible_roster(&self) -> Vec<&Student> {
        self.nav.search().students(&self.roster)
    }

    pub async fn select_class(&mut self, class_id: i64) -> Result<(), AppError> {
        self.require_no_overlay()?;
        if self.nav.view() == View::SessionDetail {
            return Err(AppError::InvalidTransition(
                "cannot select a class while a session is open".to_string(),
            ));
        }

        let mut class = self
            .classes
            .iter()
            .find(|c| c.id == class_id)
            .cloned()
            .ok_or(AppError::NotFound)?;
        class.sessions = self.store.fetch_sessions(class_id).await?;

        self.sync_class(&class);
        self.nav.select_class(class)?;
        self.roster.clear();
        Ok(())
    }

    pub async fn select_session(&mut self, session_id: i64) -> Result<(), AppError> {
        self.require_no_overlay()?;
        let class = match self.nav.selected_class() {
            Some(class) if self.nav.view() == View::ClassDetail => class,
            _ => {
                return Err(AppError::InvalidTransition(
                    "sessions can only be opened from a class".to_string(),
                ));
            }
        };
        let session = class
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or(AppError::NotFound)?;
        let class_id = class.id;

        let roster = self.store.fetch_roster(class_id, session.id).await?;
        self.nav.select_session(session)?;
        self.roster = roster;
        Ok(())
    }

    /// Re-reads the roster of the open session from the store.
    pub async fn refresh_roster(&mut self) -> Result<(), AppError> {
        let (Some(class), Some(session)) = (self.nav.selected_class(), self.nav.selected_session())
        else {
            return Err(AppError::InvalidTransition("no session is open".to_string()));
        };

        self.roster = self.store.fetch_roster(class.id, session.id).await?;
        debug!("roster refreshed: {} students", self.roster.len());
        Ok(())
    }

    /// Dismisses the active overlay if there is one, otherwise navigates up.
    pub async fn back(&mut self) -> Result<BackOutcome, AppError> {
        if !self.overlay.is_none() {
            self.close_overlay().await?;
            return Ok(BackOutcome::Navigated(self.nav.view()));
        }

        let outcome = self.nav.back();
        match outcome {
            BackOutcome::Navigated(View::SessionDetail) => {}
            BackOutcome::Navigated(_) => self.roster.clear(),
            BackOutcome::Exit => info!("leaving attendance"),
        }
        Ok(outcome)
    }

    /// Closes whatever overlay is open. Records already written by a
    /// slideshow stay written; the roster is re-read to show them.
    pub async fn close_overlay(&mut self) -> Result<(), AppError> {
        match std::mem::replace(&mut self.overlay, Overlay::None) {
            Overlay::Slideshow(_) => self.refresh_roster().await,
            _ => Ok(()),
        }
    }

    pub fn open_create_session(&mut self) -> Result<(), AppError> {
        self.require_no_overlay()?;
        if self.nav.view() != View::ClassDetail {
            return Err(AppError::InvalidTransition(
                "sessions are created from a class".to_string(),
            ));
        }
        self.overlay = Overlay::CreateSession;
        Ok(())
    }

    /// On a validation error the dialog stays open so it can be corrected.
    pub async fn submit_create_session(
        &mut self,
        req: NewSessionRequest,
    ) -> Result<Session, AppError> {
        if !matches!(self.overlay, Overlay::CreateSession) {
            return Err(AppError::InvalidTransition(
                "create-session dialog is not open".to_string(),
            ));
        }
        let class = self
            .nav
            .selected_class_mut()
            .ok_or_else(|| AppError::InvalidTransition("no class selected".to_string()))?;

        let session = self.factory.create_session(class, req).await?;
        let class = class.clone();
        self.sync_class(&class);
        self.overlay = Overlay::None;
        Ok(session)
    }

    pub fn open_direct_mark(&mut self, enrollment_id: i64) -> Result<(), AppError> {
        self.require_no_overlay()?;
        if self.nav.view() != View::SessionDetail {
            return Err(AppError::InvalidTransition("no session is open".to_string()));
        }
        if !self.roster.iter().any(|s| s.enrollment_id == enrollment_id) {
            return Err(AppError::NotFound);
        }
        self.overlay = Overlay::DirectMark { enrollment_id };
        Ok(())
    }

    /// Writes one record for the student in the direct-mark dialog and
    /// closes it. On failure the dialog stays open.
    pub async fn confirm_direct_mark(
        &mut self,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        let Overlay::DirectMark { enrollment_id } = self.overlay else {
            return Err(AppError::InvalidTransition(
                "direct-mark dialog is not open".to_string(),
            ));
        };
        let session_id = self
            .nav
            .selected_session()
            .map(|s| s.id)
            .ok_or_else(|| AppError::InvalidTransition("no session is open".to_string()))?;

        let req = UpsertAttendanceRequest::new(session_id, enrollment_id, status, None);
        let record = self.store.upsert_record(&req).await?;
        info!(
            "direct mark: enrollment {} is {} in session {}",
            enrollment_id, record.status, session_id
        );

        if let Some(student) = self.roster.iter_mut().find(|s| s.enrollment_id == enrollment_id) {
            student.status = Some(record.status);
            student.remarks = record.remarks.clone();
        }
        self.overlay = Overlay::None;
        Ok(record)
    }

    /// Snapshots the currently filtered roster and starts walking it.
    pub fn start_slideshow(&mut self) -> Result<(), AppError> {
        self.require_no_overlay()?;
        let session_id = self
            .nav
            .selected_session()
            .map(|s| s.id)
            .ok_or_else(|| AppError::InvalidTransition("no session is open".to_string()))?;

        let snapshot: Vec<Student> = self.visible_roster().into_iter().cloned().collect();
        let workflow = AttendanceMarkingWorkflow::start(self.store.clone(), session_id, snapshot)?;
        self.overlay = Overlay::Slideshow(workflow);
        Ok(())
    }

    pub fn slideshow(&self) -> Option<&AttendanceMarkingWorkflow> {
        match &self.overlay {
            Overlay::Slideshow(workflow) => Some(workflow),
            _ => None,
        }
    }

    pub fn slideshow_mut(&mut self) -> Option<&mut AttendanceMarkingWorkflow> {
        match &mut self.overlay {
            Overlay::Slideshow(workflow) => Some(workflow),
            _ => None,
        }
    }

    pub async fn finish_slideshow(&mut self) -> Result<(), AppError> {
        if self.slideshow().is_none() {
            return Err(AppError::InvalidTransition("slideshow is not open".to_string()));
        }
        self.close_overlay().await
    }

    fn require_no_overlay(&self) -> Result<(), AppError> {
        if self.overlay.is_none() {
            Ok(())
        } else {
            Err(AppError::InvalidTransition(format!(
                "{} dialog is open",
                self.overlay.name()
            )))
        }
    }

    fn sync_class(&mut self, class: &ClassSection) {
        if let Some(existing) = self.classes.iter_mut().find(|c| c.id == class.id) {
            existing.sessions = class.sessions.clone();
        }
    }
}
