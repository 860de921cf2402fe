use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::extract::{BearerToken, CurrentUser};
use crate::auth::AuthEvent;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    /// Where the provider sends the recruiter back; defaults to the dashboard.
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub url: String,
}

/// GET /api/v1/auth/sign-in
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Query(params): Query<SignInQuery>,
) -> Result<Json<SignInResponse>, AppError> {
    let redirect_to = params.redirect_to.unwrap_or_else(|| {
        format!("{}/dashboard", state.config.host_url.trim_end_matches('/'))
    });
    Ok(Json(SignInResponse {
        url: state.auth.sign_in_url(&redirect_to)?,
    }))
}

/// POST /api/v1/auth/sign-out
pub async fn handle_sign_out(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, AppError> {
    state.auth.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/users/me
///
/// First call after sign-in creates the `users` row.
pub async fn handle_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UserRow>, AppError> {
    state
        .auth
        .on_auth_state_change(AuthEvent::SignedIn, Some(&user))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No user record for {}", user.email)))
}
