use super::table::FrequencyTable;
use super::types::ErrorResponse;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::Value;
use std::sync::Arc;

/// Read-only endpoint exposing the current word counts.
pub const ENDPOINT_WORDS: &str = "/words";

pub fn router(table: Arc<FrequencyTable>) -> Router {
    Router::new()
        .route(ENDPOINT_WORDS, get(handle_words))
        .layer(Extension(table))
}

pub async fn handle_words(
    Extension(table): Extension<Arc<FrequencyTable>>,
) -> (StatusCode, Json<Value>) {
    let snapshot = table.snapshot();

    match serde_json::to_value(&snapshot) {
        Ok(body) => {
            tracing::debug!("Serving {} words", snapshot.len());
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            tracing::error!("Unable to convert words to JSON: {}", e);
            let body = serde_json::to_value(ErrorResponse {
                error: "Unable to provide words".to_string(),
            })
            .unwrap_or(Value::Null);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
        }
    }
}
