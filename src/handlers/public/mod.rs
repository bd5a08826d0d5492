// Public handlers: service info and read-only policy reference data
pub mod policy;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::server::AppState;

pub use policy::{policy_roles, policy_zones};

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Cauca Org API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Territorial role hierarchy and member provisioning",
            "endpoints": {
                "health": "/health (public)",
                "policy": "/api/policy/roles, /api/policy/zones (public)",
                "members": "/api/members[/:id[/subordinates|/superiors]] (protected)",
                "roles": "/api/roles/:role/members (protected)",
                "audit": "/api/audit/coverage (protected)",
            }
        }
    }))
}

/// GET /health - liveness plus store connectivity
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(pool) = state.pool.as_ref() else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "store": "memory" }
            })),
        );
    };

    match DatabaseManager::health_check(pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "store": "postgres" }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
