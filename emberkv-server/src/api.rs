//! HTTP API for the EmberKV server

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use emberkv_core::store::Store;
use emberkv_core::VERSION;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state
pub type AppState = Arc<Store>;

/// Create the API router
pub fn create_router(store: Arc<Store>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Key-value operations
        .route("/v1/set", post(set_key))
        .route("/v1/get", get(get_key))
        .route("/v1/delete", post(delete_key))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: String,
    /// Seconds until the value expires; zero or negative means no expiry
    #[serde(default)]
    pub ttl_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct SetResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct GetParams {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct GetResponse {
    pub found: bool,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Keys are validated here, at the boundary; the engine itself accepts
/// any string.
fn require_key(key: &str) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if key.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "key cannot be empty".to_string(),
            }),
        ));
    }
    Ok(())
}

async fn set_key(
    State(store): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_key(&req.key)?;

    // A negative TTL clamps to "no expiry" rather than erroring.
    let ttl_seconds = if req.ttl_seconds > 0 {
        req.ttl_seconds as u64
    } else {
        0
    };

    store.set(req.key, req.value, ttl_seconds, true);
    Ok(Json(SetResponse { success: true }))
}

async fn get_key(
    State(store): State<AppState>,
    Query(params): Query<GetParams>,
) -> Result<Json<GetResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_key(&params.key)?;

    match store.get(&params.key) {
        Some(value) => Ok(Json(GetResponse { found: true, value })),
        None => Ok(Json(GetResponse {
            found: false,
            value: String::new(),
        })),
    }
}

async fn delete_key(
    State(store): State<AppState>,
    Json(req): Json<DeleteRequest>,
) -> Result<Json<DeleteResponse>, (StatusCode, Json<ErrorResponse>)> {
    require_key(&req.key)?;

    store.delete(&req.key);
    Ok(Json(DeleteResponse { success: true }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use emberkv_core::store::StoreConfig;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> AppState {
        Arc::new(Store::open(StoreConfig::new(dir.path())).unwrap())
    }

    #[tokio::test]
    async fn test_set_get_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let set = set_key(
            State(store.clone()),
            Json(SetRequest {
                key: "city".to_string(),
                value: "ember".to_string(),
                ttl_seconds: 0,
            }),
        )
        .await
        .unwrap();
        assert!(set.0.success);

        let got = get_key(
            State(store.clone()),
            Query(GetParams {
                key: "city".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(got.0.found);
        assert_eq!(got.0.value, "ember");

        let deleted = delete_key(
            State(store.clone()),
            Json(DeleteRequest {
                key: "city".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(deleted.0.success);

        let got = get_key(
            State(store),
            Query(GetParams {
                key: "city".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!got.0.found);
        assert_eq!(got.0.value, "");
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected_at_the_boundary() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let (status, Json(body)) = set_key(
            State(store.clone()),
            Json(SetRequest {
                key: String::new(),
                value: "v".to_string(),
                ttl_seconds: 0,
            }),
        )
        .await
        .expect_err("empty key must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "key cannot be empty");

        let (status, _) = get_key(
            State(store.clone()),
            Query(GetParams { key: String::new() }),
        )
        .await
        .expect_err("empty key must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = delete_key(
            State(store.clone()),
            Json(DeleteRequest { key: String::new() }),
        )
        .await
        .expect_err("empty key must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // None of the rejected calls reached the engine.
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_negative_ttl_clamps_to_no_expiry() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        set_key(
            State(store.clone()),
            Json(SetRequest {
                key: "k".to_string(),
                value: "v".to_string(),
                ttl_seconds: -30,
            }),
        )
        .await
        .unwrap();

        // Stored without an expiry instead of arriving already expired.
        assert_eq!(store.get("k"), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let res = health().await;
        assert_eq!(res.0.status, "ok");
        assert_eq!(res.0.version, VERSION);
    }

    #[test]
    fn test_response_wire_shapes() {
        let body = serde_json::to_value(GetResponse {
            found: false,
            value: String::new(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "found": false, "value": "" }));

        let body = serde_json::to_value(SetResponse { success: true }).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true }));

        let body = serde_json::to_value(ErrorResponse {
            error: "key cannot be empty".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "error": "key cannot be empty" }));
    }
}
