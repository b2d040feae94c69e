use axum::Json;
use axum::extract::Path;
use axum::routing::put;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::{debug, info};

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sections", get(list_sections))
        .route(
            "/sections/{section_id}/sessions",
            get(list_sessions).post(create_session),
        )
        .route(
            "/sections/{section_id}/sessions/{session_id}/roster",
            get(session_roster),
        )
        .route("/attendance", put(upsert_attendance))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_sections(State(state): State<AppState>) -> Result<Json<Vec<ClassSection>>, AppError> {
    let sections = repository::fetch_classes(&state.db).await?;
    Ok(Json(sections))
}

async fn list_sessions(
    State(state): State<AppState>,
    Path(section_id): Path<i64>,
) -> Result<Json<Vec<Session>>, AppError> {
    if repository::find_class_by_id(&state.db, section_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let sessions = repository::fetch_sessions(&state.db, section_id).await?;
    Ok(Json(sessions))
}

async fn create_session(
    State(state): State<AppState>,
    Path(section_id): Path<i64>,
    Json(req): Json<NewSessionRequest>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let session = repository::insert_session(&state.db, section_id, &req).await?;
    info!(
        "created session {} ({}) for section {}",
        session.id, session.title, section_id
    );
    Ok((StatusCode::CREATED, Json(session)))
}

async fn session_roster(
    State(state): State<AppState>,
    Path((section_id, session_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<Student>>, AppError> {
    let roster = repository::fetch_roster(&state.db, section_id, session_id).await?;
    debug!(
        "roster for section {} session {}: {} students",
        section_id,
        session_id,
        roster.len()
    );
    Ok(Json(roster))
}

async fn upsert_attendance(
    State(state): State<AppState>,
    Json(req): Json<UpsertAttendanceRequest>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let record = repository::upsert_record(&state.db, &req).await?;
    info!(
        "recorded {} for enrollment {} in session {}",
        record.status, record.enrollment_id, record.session_id
    );
    Ok(Json(record))
}
