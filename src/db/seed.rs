//! Sections, students and enrollments are owned by other parts of the
//! records system. These inserts exist for local development and tests.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;

pub async fn insert_section(
    db: &SqlitePool,
    course_code: &str,
    course_title: &str,
    schedule: &str,
) -> Result<i64, AppError> {
    let id = sqlx::query(
        "INSERT INTO sections (course_code, course_title, schedule) VALUES (?1, ?2, ?3)",
    )
    .bind(course_code)
    .bind(course_title)
    .bind(schedule)
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn insert_student(
    db: &SqlitePool,
    full_name: &str,
    student_number: &str,
) -> Result<i64, AppError> {
    let id = sqlx::query("INSERT INTO students (full_name, student_number) VALUES (?1, ?2)")
        .bind(full_name)
        .bind(student_number)
        .execute(db)
        .await?
        .last_insert_rowid();

    Ok(id)
}

pub async fn enroll_student(
    db: &SqlitePool,
    section_id: i64,
    student_id: i64,
) -> Result<i64, AppError> {
    let id = sqlx::query("INSERT INTO enrollments (section_id, student_id) VALUES (?1, ?2)")
        .bind(section_id)
        .bind(student_id)
        .execute(db)
        .await?
        .last_insert_rowid();

    Ok(id)
}

pub async fn insert_session_row(
    db: &SqlitePool,
    section_id: i64,
    title: &str,
    date: &str,
    time_range: &str,
    session_type: &str,
) -> Result<i64, AppError> {
    let id = sqlx::query(
        r#"
        INSERT INTO sessions (section_id, title, session_date, time_range, session_type, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(section_id)
    .bind(title)
    .bind(date)
    .bind(time_range)
    .bind(session_type)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Seeds one section with a small roster. Does nothing when sections exist.
pub async fn seed_demo(db: &SqlitePool) -> Result<(), AppError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sections")
        .fetch_one(db)
        .await?;
    if existing > 0 {
        info!("skipping demo seed, {} sections present", existing);
        return Ok(());
    }

    let cs101 = insert_section(db, "CS101", "Intro to Computing", "MWF 9:00 AM - 10:30 AM").await?;
    let math201 = insert_section(db, "MATH201", "Calculus II", "TTh 13:00-14:30").await?;

    let students = [
        ("Ana Reyes", "2024-00011"),
        ("Ben Cruz", "2024-00012"),
        ("Carla Santos", "2024-00013"),
        ("Dan Lim", "2024-00014"),
    ];
    for (name, number) in students {
        let student_id = insert_student(db, name, number).await?;
        enroll_student(db, cs101, student_id).await?;
        enroll_student(db, math201, student_id).await?;
    }

    insert_session_row(db, cs101, "Week 1 Lecture", "2024-12-11", "9:00 AM - 10:30 AM", "lecture").await?;
    insert_session_row(db, cs101, "Week 1 Lab", "2024-12-13", "9:00 AM - 10:30 AM", "laboratory").await?;
    insert_session_row(db, math201, "Limits Review", "2024-12-12", "13:00-14:30", "lecture").await?;

    info!("seeded demo sections {} and {}", cs101, math201);
    Ok(())
}
