//! Recruiter authentication.
//!
//! `AuthSession` is created once at startup and handed to handlers through
//! `AppState`; there is no ambient "current user" anywhere else. Handlers
//! that need a signed-in recruiter take the `CurrentUser` extractor.

use std::sync::Arc;

use tracing::info;

use crate::errors::AppError;
use crate::models::user::UserRow;

pub mod extract;
pub mod handlers;
pub mod supabase;
pub mod users;

use supabase::{AuthUser, IdentityProvider};
use users::UserStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
}

#[derive(Clone)]
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserStore>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn IdentityProvider>, users: Arc<dyn UserStore>) -> Self {
        Self { provider, users }
    }

    pub fn sign_in_url(&self, redirect_to: &str) -> Result<String, AppError> {
        Ok(self.provider.sign_in_url(redirect_to)?)
    }

    /// Resolves a bearer token. Expired or unknown tokens are a `Permission` error.
    pub async fn current_user(&self, access_token: &str) -> Result<AuthUser, AppError> {
        self.provider
            .get_current_user(access_token)
            .await?
            .ok_or_else(|| AppError::Permission("Session expired, please sign in again".to_string()))
    }

    /// On sign-in, makes sure the recruiter has a `users` row and returns it.
    pub async fn on_auth_state_change(
        &self,
        event: AuthEvent,
        user: Option<&AuthUser>,
    ) -> Result<Option<UserRow>, AppError> {
        match (event, user) {
            (AuthEvent::SignedIn, Some(user)) => {
                if let Some(row) = self.users.find_by_email(&user.email).await? {
                    return Ok(Some(row));
                }
                let row = self.users.insert(user).await?;
                info!("Created user record for {}", row.email);
                Ok(Some(row))
            }
            (AuthEvent::SignedIn, None) => Err(AppError::Permission(
                "Sign-in event without a user".to_string(),
            )),
            (AuthEvent::SignedOut, _) => Ok(None),
        }
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        self.provider.sign_out(access_token).await?;
        self.on_auth_state_change(AuthEvent::SignedOut, None).await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    //! Token-table identity provider.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::supabase::AuthError;
    use super::*;

    #[derive(Default)]
    pub struct FakeIdentity {
        pub tokens: Mutex<HashMap<String, AuthUser>>,
        pub signed_out: Mutex<Vec<String>>,
    }

    impl FakeIdentity {
        pub fn with_user(token: &str, email: &str) -> Self {
            let fake = Self::default();
            fake.tokens.lock().unwrap().insert(
                token.to_string(),
                AuthUser {
                    id: format!("id-{email}"),
                    email: email.to_string(),
                    name: Some("Recruiter".to_string()),
                    picture: None,
                },
            );
            fake
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        fn sign_in_url(&self, redirect_to: &str) -> Result<String, AuthError> {
            Ok(format!("https://idp.example/authorize?redirect_to={redirect_to}"))
        }

        async fn get_current_user(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
            Ok(self.tokens.lock().unwrap().get(access_token).cloned())
        }

        async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
            self.tokens.lock().unwrap().remove(access_token);
            self.signed_out.lock().unwrap().push(access_token.to_string());
            Ok(())
        }
    }
}
