use std::sync::Arc;

use crate::auth::AuthSession;
use crate::config::Config;
use crate::interviews::store::InterviewStore;
use crate::llm_client::TextGeneration;
use crate::session::manager::SessionManager;
use crate::storage::StorageRoot;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Question and feedback generation. `LlmClient` in production.
    pub llm: Arc<dyn TextGeneration>,
    pub interviews: Arc<dyn InterviewStore>,
    pub auth: AuthSession,
    /// Mounted candidate session pages, one voice call each.
    pub sessions: Arc<SessionManager>,
    /// Per-user durable storage (drafts).
    pub storage: StorageRoot,
    pub config: Config,
}
