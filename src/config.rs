use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite://attendance.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;
        let seed_demo_data = env::var("SEED_DEMO_DATA")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            bind_addr,
            seed_demo_data,
        })
    }
}

/// Where `HttpAttendanceStore` sends its requests.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub base_url: String,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("ATTENDANCE_API_URL")
            .map_err(|_| AppError::Config("ATTENDANCE_API_URL is not set".to_string()))?;
        Ok(Self::new(base_url))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
