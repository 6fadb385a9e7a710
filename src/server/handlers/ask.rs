use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskBody {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response: String,
}

/// Answers a query from the best-matching indexed chunk.
///
/// Always replies 200. Search and generation failures arrive as text in
/// `response`; a bad body or a crashed pipeline task arrives as
/// `{error, type}`.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AskBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
    tracing::info!(query_len = body.query.chars().count(), "Received query");

    let pipeline = state.pipeline.clone();
    let response = tokio::spawn(async move { pipeline.answer(&body.query).await })
        .await
        .map_err(|err| {
            tracing::error!("Ask pipeline task failed: {}", err);
            ApiError::internal(err)
        })?;

    Ok(Json(AskResponse { response }))
}
