use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::error::AppError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, ClassSection, NOT_MARKED, NewSessionRequest, Session,
    Student, UpsertAttendanceRequest, normalize_remarks, time_range_from_schedule,
};

#[derive(Debug, FromRow)]
struct SectionRow {
    id: i64,
    course_code: String,
    course_title: String,
    schedule: String,
    student_count: i64,
}

impl SectionRow {
    fn into_section(self, sessions: Vec<Session>) -> ClassSection {
        ClassSection {
            id: self.id,
            course_code: self.course_code,
            course_title: self.course_title,
            schedule: self.schedule,
            student_count: self.student_count,
            sessions,
        }
    }
}

#[derive(Debug, FromRow)]
struct SessionRow {
    id: i64,
    section_id: i64,
    title: String,
    date: NaiveDate,
    time_range: String,
    session_type: String,
}

impl TryFrom<SessionRow> for Session {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: row.id,
            section_id: row.section_id,
            title: row.title,
            date: row.date,
            time_range: row.time_range,
            session_type: row.session_type.parse()?,
        })
    }
}

#[derive(Debug, FromRow)]
struct RosterRow {
    student_id: i64,
    enrollment_id: i64,
    name: String,
    student_number: String,
    status: String,
    remarks: Option<String>,
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: i64,
    session_id: i64,
    enrollment_id: i64,
    status: String,
    remarks: Option<String>,
    recorded_at: String,
}

impl TryFrom<RecordRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        Ok(AttendanceRecord {
            id: row.id,
            session_id: row.session_id,
            enrollment_id: row.enrollment_id,
            status: row.status.parse()?,
            remarks: row.remarks,
            recorded_at: row.recorded_at,
        })
    }
}

const SECTION_COLUMNS: &str = r#"
    SELECT
        s.id AS id,
        s.course_code AS course_code,
        s.course_title AS course_title,
        s.schedule AS schedule,
        (SELECT COUNT(*) FROM enrollments e WHERE e.section_id = s.id) AS student_count
    FROM sections s
"#;

const SESSION_COLUMNS: &str = r#"
    SELECT
        id,
        section_id,
        title,
        session_date AS date,
        time_range,
        session_type
    FROM sessions
"#;

pub async fn fetch_classes(db: &SqlitePool) -> Result<Vec<ClassSection>, AppError> {
    let rows = sqlx::query_as::<_, SectionRow>(&format!(
        "{} ORDER BY s.course_code, s.id",
        SECTION_COLUMNS
    ))
    .fetch_all(db)
    .await?;

    // One pass over all sessions instead of a query per section
    let mut sessions_by_section: HashMap<i64, Vec<Session>> = HashMap::new();
    let session_rows = sqlx::query_as::<_, SessionRow>(&format!(
        "{} ORDER BY session_date DESC, id DESC",
        SESSION_COLUMNS
    ))
    .fetch_all(db)
    .await?;
    for row in session_rows {
        let session = Session::try_from(row)?;
        sessions_by_section
            .entry(session.section_id)
            .or_default()
            .push(session);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let sessions = sessions_by_section.remove(&row.id).unwrap_or_default();
            row.into_section(sessions)
        })
        .collect())
}

pub async fn find_class_by_id(
    db: &SqlitePool,
    section_id: i64,
) -> Result<Option<ClassSection>, AppError> {
    let row = sqlx::query_as::<_, SectionRow>(&format!("{} WHERE s.id = ?1", SECTION_COLUMNS))
        .bind(section_id)
        .fetch_optional(db)
        .await?;

    match row {
        Some(row) => {
            let sessions = fetch_sessions(db, section_id).await?;
            Ok(Some(row.into_section(sessions)))
        }
        None => Ok(None),
    }
}

/// Sessions of one section, most recent first.
pub async fn fetch_sessions(db: &SqlitePool, section_id: i64) -> Result<Vec<Session>, AppError> {
    sqlx::query_as::<_, SessionRow>(&format!(
        "{} WHERE section_id = ?1 ORDER BY session_date DESC, id DESC",
        SESSION_COLUMNS
    ))
    .bind(section_id)
    .fetch_all(db)
    .await?
    .into_iter()
    .map(Session::try_from)
    .collect()
}

pub async fn find_session_by_id(
    db: &SqlitePool,
    session_id: i64,
) -> Result<Option<Session>, AppError> {
    sqlx::query_as::<_, SessionRow>(&format!("{} WHERE id = ?1", SESSION_COLUMNS))
        .bind(session_id)
        .fetch_optional(db)
        .await?
        .map(Session::try_from)
        .transpose()
}

pub async fn insert_session(
    db: &SqlitePool,
    section_id: i64,
    req: &NewSessionRequest,
) -> Result<Session, AppError> {
    let date = req.validate()?;

    let schedule: Option<String> = sqlx::query_scalar("SELECT schedule FROM sections WHERE id = ?1")
        .bind(section_id)
        .fetch_optional(db)
        .await?;
    let Some(schedule) = schedule else {
        return Err(AppError::NotFound);
    };

    let time_range = req
        .time_range
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| time_range_from_schedule(&schedule));
    let title = req.title.trim().to_string();
    let now = Utc::now().to_rfc3339();

    let id = sqlx::query(
        r#"
        INSERT INTO sessions
            (section_id, title, session_date, time_range, session_type, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(section_id)
    .bind(&title)
    .bind(date)
    .bind(&time_range)
    .bind(req.session_type.as_str())
    .bind(&now)
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(Session {
        id,
        section_id,
        title,
        date,
        time_range,
        session_type: req.session_type,
    })
}

/// Every enrolled student of the section, annotated with the status recorded
/// for `session_id`. Students without a record carry `status = None`.
pub async fn fetch_roster(
    db: &SqlitePool,
    section_id: i64,
    session_id: i64,
) -> Result<Vec<Student>, AppError> {
    match find_session_by_id(db, session_id).await? {
        Some(session) if session.section_id == section_id => {}
        _ => return Err(AppError::NotFound),
    }

    let rows = sqlx::query_as::<_, RosterRow>(
        r#"
        SELECT
            st.id AS student_id,
            e.id AS enrollment_id,
            st.full_name AS name,
            st.student_number AS student_number,
            COALESCE(ar.status, ?3) AS status,
            ar.remarks AS remarks
        FROM enrollments e
        JOIN students st ON st.id = e.student_id
        LEFT JOIN attendance_records ar
            ON ar.enrollment_id = e.id AND ar.session_id = ?2
        WHERE e.section_id = ?1
        ORDER BY st.full_name COLLATE NOCASE, st.id
        "#,
    )
    .bind(section_id)
    .bind(session_id)
    .bind(NOT_MARKED)
    .fetch_all(db)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(Student {
                id: row.student_id,
                enrollment_id: row.enrollment_id,
                name: row.name,
                student_number: row.student_number,
                status: AttendanceStatus::from_roster_column(&row.status)?,
                remarks: row.remarks,
            })
        })
        .collect()
}

pub async fn find_record(
    db: &SqlitePool,
    session_id: i64,
    enrollment_id: i64,
) -> Result<Option<AttendanceRecord>, AppError> {
    sqlx::query_as::<_, RecordRow>(
        r#"
        SELECT id, session_id, enrollment_id, status, remarks, recorded_at
        FROM attendance_records
        WHERE session_id = ?1 AND enrollment_id = ?2
        "#,
    )
    .bind(session_id)
    .bind(enrollment_id)
    .fetch_optional(db)
    .await?
    .map(AttendanceRecord::try_from)
    .transpose()
}

/// Inserts or updates the record keyed by `(session_id, enrollment_id)`.
/// Both paths stamp `recorded_at`; the key never gets a second row.
pub async fn upsert_record(
    db: &SqlitePool,
    req: &UpsertAttendanceRequest,
) -> Result<AttendanceRecord, AppError> {
    let same_section: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT 1
        FROM sessions s
        JOIN enrollments e ON e.section_id = s.section_id
        WHERE s.id = ?1 AND e.id = ?2
        "#,
    )
    .bind(req.session_id)
    .bind(req.enrollment_id)
    .fetch_optional(db)
    .await?;
    if same_section.is_none() {
        return Err(AppError::NotFound);
    }

    let remarks = normalize_remarks(req.remarks.clone());
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO attendance_records (session_id, enrollment_id, status, remarks, recorded_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (session_id, enrollment_id) DO UPDATE
        SET status = excluded.status,
            remarks = excluded.remarks,
            recorded_at = excluded.recorded_at
        "#,
    )
    .bind(req.session_id)
    .bind(req.enrollment_id)
    .bind(req.status.as_str())
    .bind(&remarks)
    .bind(&now)
    .execute(db)
    .await?;

    find_record(db, req.session_id, req.enrollment_id)
        .await?
        .ok_or(AppError::NotFound)
}
