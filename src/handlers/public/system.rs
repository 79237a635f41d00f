// handlers/public/system.rs - GET / and GET /health handlers

use axum::{extract::State, response::IntoResponse};
use serde_json::json;

use crate::app::AppState;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::ApiResponse;

/// GET / - service name, version and endpoint map
pub async fn root() -> impl IntoResponse {
    ApiResponse::success(json!({
        "name": "Estate API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "auth": "/auth/register, /auth/login (public), /auth/me (bearer)",
            "properties": "/properties[/:id], /properties/featured (public reads, admin writes)",
            "locations": "/locations/regions, /locations/neighborhoods, /locations/features (public)",
            "contact": "/contact (public)",
            "admin": "/admin/{users,regions,neighborhoods,features,messages} (admin)",
            "uploads": "/uploads/* (public static)",
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "database": "ok"
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiError::service_unavailable("Database unavailable").into_response()
        }
    }
}
