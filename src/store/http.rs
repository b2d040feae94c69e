use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::AttendanceStore;
use crate::config::StoreConfig;
use crate::error::{AppError, ErrorResponse};
use crate::models::{
    AttendanceRecord, ClassSection, NewSessionRequest, Session, Student, UpsertAttendanceRequest,
};

/// Client for the attendance HTTP API served by this crate's router.
pub struct HttpAttendanceStore {
    client: Client,
    config: StoreConfig,
}

impl HttpAttendanceStore {
    pub fn new(config: StoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Store(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = self
            .client
            .get(self.config.url(path))
            .send()
            .await
            .map_err(|e| AppError::Store(format!("GET {} failed: {}", path, e)))?;

        decode(response).await
    }
}

/// Maps the router's error statuses back onto `AppError`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| AppError::Store(format!("Failed to parse response: {}", e)));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    Err(match status {
        StatusCode::NOT_FOUND => AppError::NotFound,
        StatusCode::BAD_REQUEST => AppError::BadRequest(message),
        StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(message),
        StatusCode::CONFLICT => AppError::InvalidTransition(message),
        _ => AppError::Store(format!("{} {}", status, message)),
    })
}

#[async_trait]
impl AttendanceStore for HttpAttendanceStore {
    async fn fetch_classes(&self) -> Result<Vec<ClassSection>, AppError> {
        self.get("/sections").await
    }

    async fn fetch_sessions(&self, section_id: i64) -> Result<Vec<Session>, AppError> {
        self.get(&format!("/sections/{}/sessions", section_id)).await
    }

    async fn fetch_roster(&self, section_id: i64, session_id: i64) -> Result<Vec<Student>, AppError> {
        self.get(&format!("/sections/{}/sessions/{}/roster", section_id, session_id))
            .await
    }

    async fn upsert_record(&self, req: &UpsertAttendanceRequest) -> Result<AttendanceRecord, AppError> {
        let response = self
            .client
            .put(self.config.url("/attendance"))
            .json(req)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("PUT /attendance failed: {}", e)))?;

        decode(response).await
    }

    async fn create_session(
        &self,
        section_id: i64,
        req: &NewSessionRequest,
    ) -> Result<Session, AppError> {
        let path = format!("/sections/{}/sessions", section_id);
        let response = self
            .client
            .post(self.config.url(&path))
            .json(req)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("POST {} failed: {}", path, e)))?;

        decode(response).await
    }
}
