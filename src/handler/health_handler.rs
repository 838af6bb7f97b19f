use crate::config::logging::secure_log;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::response::app_response::SuccessResponse;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub database: DatabaseHealth,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DatabaseHealth {
    pub status: String,
    pub response_time_ms: Option<u128>,
    pub error: Option<String>,
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

pub fn init_start_time() {
    START_TIME.set(Instant::now()).ok();
}

pub fn get_uptime_seconds() -> u64 {
    START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

pub async fn health_check(
    State(user_repo): State<Arc<dyn UserRepositoryTrait>>,
) -> SuccessResponse<HealthStatus> {
    let database = check_database_health(user_repo.as_ref()).await;

    let status = if database.status == "healthy" {
        "healthy"
    } else {
        "unhealthy"
    };

    SuccessResponse::send(HealthStatus {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: get_uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    })
}

async fn check_database_health(user_repo: &dyn UserRepositoryTrait) -> DatabaseHealth {
    let start_time = Instant::now();

    match user_repo.ping().await {
        Ok(()) => {
            let response_time = start_time.elapsed().as_millis();
            info!("Database health check passed in {}ms", response_time);
            DatabaseHealth {
                status: "healthy".to_string(),
                response_time_ms: Some(response_time),
                error: None,
            }
        }
        Err(e) => {
            secure_log::secure_error!("Database health check failed", e);
            DatabaseHealth {
                status: "unhealthy".to_string(),
                response_time_ms: None,
                error: Some("Database unreachable".to_string()),
            }
        }
    }
}
