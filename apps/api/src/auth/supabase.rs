//! Identity provider client over the Supabase Auth REST API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity provider unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("identity provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid identity provider url: {0}")]
    Url(String),

    #[error("signed-in user has no email address")]
    MissingEmail,
}

/// The signed-in user as the identity provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL that starts the OAuth sign-in and lands back on `redirect_to`.
    fn sign_in_url(&self, redirect_to: &str) -> Result<String, AuthError>;
    /// `None` when the token is expired or rejected.
    async fn get_current_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    name: Option<String>,
    full_name: Option<String>,
    picture: Option<String>,
    avatar_url: Option<String>,
}

impl TryFrom<SupabaseUser> for AuthUser {
    type Error = AuthError;

    fn try_from(user: SupabaseUser) -> Result<Self, Self::Error> {
        let email = user.email.filter(|e| !e.is_empty()).ok_or(AuthError::MissingEmail)?;
        let meta = user.user_metadata;
        Ok(AuthUser {
            id: user.id,
            email,
            name: meta.name.or(meta.full_name),
            picture: meta.picture.or(meta.avatar_url),
        })
    }
}

pub struct SupabaseIdentity {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseIdentity {
    pub fn new(base_url: String, anon_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(15))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    fn sign_in_url(&self, redirect_to: &str) -> Result<String, AuthError> {
        let mut url = Url::parse(&format!("{}/auth/v1/authorize", self.base_url))
            .map_err(|e| AuthError::Url(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", "google")
            .append_pair("redirect_to", redirect_to);
        Ok(url.into())
    }

    async fn get_current_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(AuthError::Unreachable)?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!("Identity provider rejected access token ({status})");
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Identity provider returned {status}: {message}");
            return Err(AuthError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let user: SupabaseUser = response.json().await.map_err(AuthError::Unreachable)?;
        AuthUser::try_from(user).map(Some)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(AuthError::Unreachable)?;

        let status = response.status();
        // An already-expired session is signed out either way.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            info!("Signed out");
            return Ok(());
        }
        Err(AuthError::Api {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_url_targets_google_provider() {
        let identity =
            SupabaseIdentity::new("https://proj.supabase.co/".to_string(), "anon".to_string())
                .unwrap();
        let url = identity
            .sign_in_url("https://hire.example/dashboard")
            .unwrap();
        assert_eq!(
            url,
            "https://proj.supabase.co/auth/v1/authorize?provider=google&redirect_to=https%3A%2F%2Fhire.example%2Fdashboard"
        );
    }

    #[test]
    fn test_user_metadata_fallbacks() {
        let user: SupabaseUser = serde_json::from_str(
            r#"{"id":"u1","email":"ada@example.com",
                "user_metadata":{"full_name":"Ada L","avatar_url":"https://img/a.png"}}"#,
        )
        .unwrap();
        let user = AuthUser::try_from(user).unwrap();
        assert_eq!(user.name.as_deref(), Some("Ada L"));
        assert_eq!(user.picture.as_deref(), Some("https://img/a.png"));
    }

    #[test]
    fn test_user_without_email_is_rejected() {
        let user: SupabaseUser = serde_json::from_str(r#"{"id":"u1"}"#).unwrap();
        assert!(matches!(
            AuthUser::try_from(user),
            Err(AuthError::MissingEmail)
        ));
    }
}
