#![allow(dead_code)]

use attendance::db::{self, seed};
use sqlx::SqlitePool;

pub struct Fixture {
    pub pool: SqlitePool,
    pub section_id: i64,
    pub other_section_id: i64,
    /// Week 1 (2024-12-11) then Week 2 (2024-12-15).
    pub session_ids: Vec<i64>,
    /// Ana Reyes, Ben Cruz, Carla Santos.
    pub enrollments: Vec<i64>,
}

pub async fn setup() -> Fixture {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create test db");

    let section_id = seed::insert_section(&pool, "CS101", "Intro to Computing", "MWF 9:00 AM - 10:30 AM")
        .await
        .expect("Failed to insert section");
    let other_section_id = seed::insert_section(&pool, "MATH201", "Calculus", "TTh 13:00-14:30")
        .await
        .expect("Failed to insert section");

    let mut enrollments = Vec::new();
    for (name, number) in [
        ("Ana Reyes", "2024-00011"),
        ("Ben Cruz", "2024-00012"),
        ("Carla Santos", "2024-00013"),
    ] {
        let student_id = seed::insert_student(&pool, name, number)
            .await
            .expect("Failed to insert student");
        let enrollment_id = seed::enroll_student(&pool, section_id, student_id)
            .await
            .expect("Failed to enroll student");
        enrollments.push(enrollment_id);
    }

    let mut session_ids = Vec::new();
    for (title, date, kind) in [
        ("Week 1", "2024-12-11", "lecture"),
        ("Week 2 Lab", "2024-12-15", "laboratory"),
    ] {
        let id = seed::insert_session_row(&pool, section_id, title, date, "9:00 AM - 10:30 AM", kind)
            .await
            .expect("Failed to insert session");
        session_ids.push(id);
    }

    Fixture {
        pool,
        section_id,
        other_section_id,
        session_ids,
        enrollments,
    }
}

pub async fn record_count(pool: &SqlitePool, session_id: i64, enrollment_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM attendance_records WHERE session_id = ?1 AND enrollment_id = ?2",
    )
    .bind(session_id)
    .bind(enrollment_id)
    .fetch_one(pool)
    .await
    .expect("Failed to count records")
}
