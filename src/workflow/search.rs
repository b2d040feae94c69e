//! Case-insensitive substring filters, one per navigation level.

use crate::models::{ClassSection, Session, Student};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLevel {
    Class,
    Session,
    Student,
}

/// Query text and search-bar visibility for one level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub expanded: bool,
}

impl SearchState {
    pub fn reset(&mut self) {
        *self = SearchState::default();
    }

    /// Collapsing the bar also drops whatever was typed into it.
    pub fn toggle(&mut self) {
        if self.expanded {
            self.reset();
        } else {
            self.expanded = true;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchScopeManager {
    pub class: SearchState,
    pub session: SearchState,
    pub student: SearchState,
}

impl SearchScopeManager {
    pub fn level(&self, level: SearchLevel) -> &SearchState {
        match level {
            SearchLevel::Class => &self.class,
            SearchLevel::Session => &self.session,
            SearchLevel::Student => &self.student,
        }
    }

    pub fn level_mut(&mut self, level: SearchLevel) -> &mut SearchState {
        match level {
            SearchLevel::Class => &mut self.class,
            SearchLevel::Session => &mut self.session,
            SearchLevel::Student => &mut self.student,
        }
    }

    pub fn set_query(&mut self, level: SearchLevel, query: impl Into<String>) {
        self.level_mut(level).query = query.into();
    }

    pub fn toggle(&mut self, level: SearchLevel) {
        self.level_mut(level).toggle();
    }

    pub fn classes<'a>(&self, classes: &'a [ClassSection]) -> Vec<&'a ClassSection> {
        filter_classes(classes, &self.class.query)
    }

    pub fn sessions<'a>(&self, sessions: &'a [Session]) -> Vec<&'a Session> {
        filter_sessions(sessions, &self.session.query)
    }

    pub fn students<'a>(&self, students: &'a [Student]) -> Vec<&'a Student> {
        filter_students(students, &self.student.query)
    }
}

fn matches_any(query: &str, fields: &[&str]) -> bool {
    fields.iter().any(|f| f.to_lowercase().contains(query))
}

/// Whitespace is part of the query; only an empty query matches everything.
fn normalized(query: &str) -> String {
    query.to_lowercase()
}

/// Matches course code or title; input order is kept.
pub fn filter_classes<'a>(classes: &'a [ClassSection], query: &str) -> Vec<&'a ClassSection> {
    let query = normalized(query);
    classes
        .iter()
        .filter(|c| {
            query.is_empty() || matches_any(&query, &[c.course_code.as_str(), c.course_title.as_str()])
        })
        .collect()
}

/// Matches title or session type, then orders by date, most recent first.
pub fn filter_sessions<'a>(sessions: &'a [Session], query: &str) -> Vec<&'a Session> {
    let query = normalized(query);
    let mut filtered: Vec<&Session> = sessions
        .iter()
        .filter(|s| {
            query.is_empty() || matches_any(&query, &[s.title.as_str(), s.session_type.label()])
        })
        .collect();
    filtered.sort_by(|a, b| b.date.cmp(&a.date));
    filtered
}

/// Matches display name or institutional number.
pub fn filter_students<'a>(students: &'a [Student], query: &str) -> Vec<&'a Student> {
    let query = normalized(query);
    students
        .iter()
        .filter(|s| {
            query.is_empty() || matches_any(&query, &[s.name.as_str(), s.student_number.as_str()])
        })
        .collect()
}
