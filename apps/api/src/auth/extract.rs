//! Request extractors for authenticated routes.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::auth::supabase::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

/// The raw `Authorization: Bearer <token>` value.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// A recruiter resolved from the bearer token by the identity provider.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer(parts)
            .map(|t| BearerToken(t.to_string()))
            .ok_or_else(|| AppError::Permission("Sign in required".to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        Ok(CurrentUser(state.auth.current_user(&token).await?))
    }
}
