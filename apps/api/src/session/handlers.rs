//! Axum route handlers for the candidate's interview session page.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::session::manager::{MountResponse, SessionView};
use crate::state::AppState;

/// POST /api/v1/sessions/:tab/mount
///
/// Mounts the session page and auto-starts the call. Without a stored
/// interview context the response tells the page to redirect.
pub async fn handle_mount(
    State(state): State<AppState>,
    Path(tab): Path<String>,
) -> Result<Json<MountResponse>, AppError> {
    Ok(Json(state.sessions.mount(&tab).await?))
}

/// GET /api/v1/sessions/:tab
pub async fn handle_view(
    State(state): State<AppState>,
    Path(tab): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.view(&tab).await?))
}

/// POST /api/v1/sessions/:tab/mute
pub async fn handle_toggle_mute(
    State(state): State<AppState>,
    Path(tab): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.toggle_mute(&tab).await?))
}

/// POST /api/v1/sessions/:tab/end
///
/// The page asks for confirmation before calling this.
pub async fn handle_end(
    State(state): State<AppState>,
    Path(tab): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.end_interview(&tab).await?))
}

/// DELETE /api/v1/sessions/:tab
pub async fn handle_unmount(
    State(state): State<AppState>,
    Path(tab): Path<String>,
) -> Result<StatusCode, AppError> {
    state.sessions.unmount(&tab).await?;
    Ok(StatusCode::NO_CONTENT)
}
