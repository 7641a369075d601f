use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde::Deserialize;

use crate::members::MemberRecord;
use crate::templates::{TemplateError, page_context};

use super::error::AppError;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MemberPayload {
    pub info: String,
    pub email: String,
}

pub async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let html = render_page(&state, &state.index_key).await?;
    Ok(Html(html))
}

pub async fn signup_handler(
    State(state): State<AppState>,
    Json(payload): Json<MemberPayload>,
) -> Result<StatusCode, AppError> {
    let record = MemberRecord::new(payload.info, &payload.email)?;
    state.members.add(record).await?;
    Ok(StatusCode::CREATED)
}

pub async fn update_member_handler(
    State(state): State<AppState>,
    Json(payload): Json<MemberPayload>,
) -> Result<StatusCode, AppError> {
    let record = MemberRecord::new(payload.info, &payload.email)?;
    state.member_writer.write(&record).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Render snapshot page `key`, or `<fallback_dir>/<key>.hbs` when the snapshot
/// has no such page.
async fn render_page(state: &AppState, key: &str) -> Result<String, TemplateError> {
    let stored = state.site.read().await.snapshot().get(key).map(str::to_string);

    let source = match stored {
        Some(source) => source,
        None => {
            let path = state.fallback_dir.join(format!("{key}.hbs"));
            crate::debug_event!("http", "fallback", "{}", path.display());
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| TemplateError::Io { path, source })?
        }
    };

    state.site.read().await.render(&source, &page_context())
}
