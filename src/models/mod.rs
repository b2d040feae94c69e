pub mod attendance;
pub mod section;
pub mod session;

pub use attendance::{
    AttendanceRecord, AttendanceStatus, NOT_MARKED, Student, UpsertAttendanceRequest, normalize_remarks,
};
pub use section::{ClassSection, time_range_from_schedule};
pub use session::{NewSessionRequest, Session, SessionType};
