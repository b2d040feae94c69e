use std::mem;

use tracing::debug;

use super::search::SearchScopeManager;
use crate::error::AppError;
use crate::models::{ClassSection, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    ClassList,
    ClassDetail,
    SessionDetail,
}

/// How the subsystem was entered. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryContext {
    Standalone,
    DeepLinkedClass,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RosterViewMode {
    #[default]
    Card,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    Navigated(View),
    /// Control goes back to whatever hosts the subsystem.
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
enum Location {
    ClassList,
    ClassDetail { class: ClassSection },
    SessionDetail { class: ClassSection, session: Session },
}

#[derive(Debug, Clone)]
pub struct NavigationController {
    location: Location,
    entry: EntryContext,
    search: SearchScopeManager,
    roster_view: RosterViewMode,
}

impl Default for NavigationController {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationController {
    pub fn new() -> Self {
        Self {
            location: Location::ClassList,
            entry: EntryContext::Standalone,
            search: SearchScopeManager::default(),
            roster_view: RosterViewMode::default(),
        }
    }

    /// Entered from an external class picker with `class` already chosen.
    pub fn deep_linked(class: ClassSection) -> Self {
        Self {
            location: Location::ClassDetail { class },
            entry: EntryContext::DeepLinkedClass,
            search: SearchScopeManager::default(),
            roster_view: RosterViewMode::default(),
        }
    }

    pub fn view(&self) -> View {
        match self.location {
            Location::ClassList => View::ClassList,
            Location::ClassDetail { .. } => View::ClassDetail,
            Location::SessionDetail { .. } => View::SessionDetail,
        }
    }

    pub fn entry_context(&self) -> EntryContext {
        self.entry
    }

    pub fn selected_class(&self) -> Option<&ClassSection> {
        match &self.location {
            Location::ClassList => None,
            Location::ClassDetail { class } | Location::SessionDetail { class, .. } => Some(class),
        }
    }

    pub fn selected_class_mut(&mut self) -> Option<&mut ClassSection> {
        match &mut self.location {
            Location::ClassList => None,
            Location::ClassDetail { class } | Location::SessionDetail { class, .. } => Some(class),
        }
    }

    pub fn selected_session(&self) -> Option<&Session> {
        match &self.location {
            Location::SessionDetail { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn search(&self) -> &SearchScopeManager {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchScopeManager {
        &mut self.search
    }

    pub fn roster_view(&self) -> RosterViewMode {
        self.roster_view
    }

    pub fn toggle_roster_view(&mut self) {
        self.roster_view = match self.roster_view {
            RosterViewMode::Card => RosterViewMode::List,
            RosterViewMode::List => RosterViewMode::Card,
        };
    }

    pub fn select_class(&mut self, class: ClassSection) -> Result<(), AppError> {
        if let Location::SessionDetail { .. } = self.location {
            return Err(AppError::InvalidTransition(
                "cannot select a class while a session is open".to_string(),
            ));
        }

        debug!("select class {} ({})", class.id, class.course_code);
        self.location = Location::ClassDetail { class };
        self.search.session.reset();
        Ok(())
    }

    pub fn select_session(&mut self, session: Session) -> Result<(), AppError> {
        let class = match mem::replace(&mut self.location, Location::ClassList) {
            Location::ClassDetail { class } => class,
            other => {
                self.location = other;
                return Err(AppError::InvalidTransition(
                    "sessions can only be opened from a class".to_string(),
                ));
            }
        };

        if session.section_id != class.id {
            let message = format!("session {} does not belong to class {}", session.id, class.id);
            self.location = Location::ClassDetail { class };
            return Err(AppError::BadRequest(message));
        }

        debug!("select session {} ({})", session.id, session.title);
        self.location = Location::SessionDetail { class, session };
        self.search.student.reset();
        self.roster_view = RosterViewMode::Card;
        Ok(())
    }

    pub fn back(&mut self) -> BackOutcome {
        match mem::replace(&mut self.location, Location::ClassList) {
            Location::SessionDetail { class, .. } => {
                self.location = Location::ClassDetail { class };
                self.search.student.reset();
                BackOutcome::Navigated(View::ClassDetail)
            }
            Location::ClassDetail { class } => match self.entry {
                EntryContext::DeepLinkedClass => {
                    self.location = Location::ClassDetail { class };
                    BackOutcome::Exit
                }
                EntryContext::Standalone => BackOutcome::Navigated(View::ClassList),
            },
            Location::ClassList => BackOutcome::Exit,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::SessionType;
    use crate::workflow::search::SearchLevel;

    fn class(id: i64) -> ClassSection {
        ClassSection {
            id,
            course_code: format!("CS{}", id),
            course_title: "Intro".to_string(),
            schedule: "MWF 9:00-10:00".to_string(),
            student_count: 3,
            sessions: vec![session(id * 100, id)],
        }
    }

    fn session(id: i64, section_id: i64) -> Session {
        Session {
            id,
            section_id,
            title: "Week 1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 12, 11).unwrap(),
            time_range: "9:00-10:00".to_string(),
            session_type: SessionType::Lecture,
        }
    }

    #[test]
    fn test_select_class_resets_session_search() {
        let mut nav = NavigationController::new();
        assert_eq!(nav.view(), View::ClassList);

        nav.select_class(class(1)).unwrap();
        nav.search_mut().toggle(SearchLevel::Session);
        nav.search_mut().set_query(SearchLevel::Session, "lab");

        nav.select_class(class(2)).unwrap();
        assert_eq!(nav.view(), View::ClassDetail);
        assert_eq!(nav.selected_class().map(|c| c.id), Some(2));
        assert_eq!(nav.search().session.query, "");
        assert!(!nav.search().session.expanded);
        assert!(nav.selected_session().is_none());
    }

    #[test]
    fn test_select_session_resets_student_scope_and_view_mode() {
        let mut nav = NavigationController::new();
        nav.select_class(class(1)).unwrap();
        nav.search_mut().set_query(SearchLevel::Student, "stale");
        nav.toggle_roster_view();
        assert_eq!(nav.roster_view(), RosterViewMode::List);

        nav.select_session(session(100, 1)).unwrap();
        assert_eq!(nav.view(), View::SessionDetail);
        assert_eq!(nav.selected_session().map(|s| s.id), Some(100));
        assert_eq!(nav.search().student.query, "");
        assert_eq!(nav.roster_view(), RosterViewMode::Card);
    }

    #[test]
    fn test_select_session_rejected_outside_class_detail() {
        let mut nav = NavigationController::new();
        assert!(matches!(
            nav.select_session(session(100, 1)),
            Err(AppError::InvalidTransition(_))
        ));
        assert_eq!(nav.view(), View::ClassList);

        nav.select_class(class(1)).unwrap();
        assert!(matches!(nav.select_session(session(200, 2)), Err(AppError::BadRequest(_))));
        assert_eq!(nav.view(), View::ClassDetail);

        nav.select_session(session(100, 1)).unwrap();
        assert!(matches!(nav.select_class(class(2)), Err(AppError::InvalidTransition(_))));
        assert!(matches!(
            nav.select_session(session(100, 1)),
            Err(AppError::InvalidTransition(_))
        ));
        assert_eq!(nav.view(), View::SessionDetail);
    }

    #[test]
    fn test_back_standalone_walks_every_level() {
        let mut nav = NavigationController::new();
        nav.select_class(class(1)).unwrap();
        nav.select_session(session(100, 1)).unwrap();
        nav.search_mut().set_query(SearchLevel::Student, "ana");

        assert_eq!(nav.back(), BackOutcome::Navigated(View::ClassDetail));
        assert!(nav.selected_session().is_none());
        assert_eq!(nav.search().student.query, "");

        assert_eq!(nav.back(), BackOutcome::Navigated(View::ClassList));
        assert!(nav.selected_class().is_none());

        assert_eq!(nav.back(), BackOutcome::Exit);
    }

    #[test]
    fn test_back_from_deep_linked_class_exits() {
        let mut nav = NavigationController::deep_linked(class(7));
        assert_eq!(nav.view(), View::ClassDetail);
        assert_eq!(nav.entry_context(), EntryContext::DeepLinkedClass);

        nav.select_session(session(700, 7)).unwrap();
        assert_eq!(nav.back(), BackOutcome::Navigated(View::ClassDetail));
        assert_eq!(nav.back(), BackOutcome::Exit);
        assert_eq!(nav.view(), View::ClassDetail);
        assert_eq!(nav.entry_context(), EntryContext::DeepLinkedClass);
    }
}
