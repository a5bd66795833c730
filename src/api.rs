use anyhow::{Context, Result};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::import::Importer;
use crate::types::{ImportResponse, RawPost};
use crate::TARGET_IMPORT;

/// Request payload for `/import`.
#[derive(Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub posts: Vec<RawPost>,
}

/// Shared handler state. Batches run one at a time.
#[derive(Clone)]
pub struct AppState {
    importer: Arc<Mutex<Importer>>,
}

impl AppState {
    pub fn new(importer: Importer) -> Self {
        AppState {
            importer: Arc::new(Mutex::new(importer)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", post(status_check))
        .route("/import", post(import_posts))
        .with_state(state)
}

/// Set up and run the Axum-based API server.
pub async fn app_api_loop(importer: Importer, port: u16) -> Result<()> {
    let app = router(AppState::new(importer));
    let addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;

    info!("Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("API server stopped")?;

    Ok(())
}

/// Import a batch of posts. The response is sent once the whole batch has
/// been processed.
pub async fn import_posts(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, (StatusCode, Json<Value>)> {
    info!(target: TARGET_IMPORT, "Received import request with {} posts", payload.posts.len());

    let mut importer = state.importer.lock().await;
    match importer.run(payload.posts).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!(target: TARGET_IMPORT, "Import failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            ))
        }
    }
}

async fn status_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::extract::Extractor;

    #[tokio::test]
    async fn test_import_handler_returns_summary() {
        let db = Database::in_memory().await.unwrap();
        let state = AppState::new(Importer::new(db, Extractor::new(None)));

        let request: ImportRequest = serde_json::from_value(json!({
            "posts": [{
                "text": "2BHK flat for rent in Kondapur, Rs 35k per month",
                "postUrl": "https://www.instagram.com/p/rent1/"
            }]
        }))
        .unwrap();

        let Json(response) = import_posts(State(state), Json(request)).await.unwrap();
        assert!(response.success);
        assert_eq!(response.summary.total, 1);
        assert_eq!(response.summary.added + response.summary.skipped, 1);
    }

    #[tokio::test]
    async fn test_status() {
        assert_eq!(status_check().await, "OK");
    }
}
