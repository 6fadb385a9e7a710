use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Reports configuration-derived status. Makes no network calls and never
/// includes credentials.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let openai = &state.settings.openai;
    let search = &state.settings.search;

    Json(json!({
        "status": "healthy",
        "openai_base": openai.api_base,
        "openai_version": openai.api_version,
        "search_service": search.service,
        "search_index": search.index_name,
        "env_vars": {
            "OPENAI_API_TYPE": "azure",
            "OPENAI_API_BASE": openai.api_base,
            "OPENAI_API_VERSION": openai.api_version,
        },
        "started_at": state.started_at.to_rfc3339(),
    }))
}
