//! Client-side state for taking attendance: three-level navigation, per-level
//! search, the marking slideshow and session creation.

pub mod marking;
pub mod navigation;
pub mod screen;
pub mod search;
pub mod session_factory;

pub use marking::{AttendanceMarkingWorkflow, SlideshowState};
pub use navigation::{BackOutcome, EntryContext, NavigationController, RosterViewMode, View};
pub use screen::{AttendanceScreen, Overlay};
pub use search::{SearchLevel, SearchScopeManager, SearchState};
pub use session_factory::SessionFactory;
