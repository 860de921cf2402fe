mod auth;
mod config;
mod db;
mod errors;
mod interviews;
mod llm_client;
mod models;
mod notices;
mod routes;
mod session;
mod state;
mod storage;
mod voice;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::auth::supabase::SupabaseIdentity;
use crate::auth::users::PgUserStore;
use crate::auth::AuthSession;
use crate::config::Config;
use crate::db::create_pool;
use crate::interviews::store::PgInterviewStore;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::manager::SessionManager;
use crate::state::AppState;
use crate::storage::StorageRoot;
use crate::voice::client::HttpVoiceClientFactory;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recruiter API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize text generation
    let llm = LlmClient::new(
        config.llm_base_url.clone(),
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    // Identity provider + users table
    let auth = AuthSession::new(
        Arc::new(SupabaseIdentity::new(
            config.supabase_url.clone(),
            config.supabase_anon_key.clone(),
        )?),
        Arc::new(PgUserStore::new(db.clone())),
    );

    // Local durable storage for tab contexts and drafts
    let storage = StorageRoot::new(config.data_dir.clone());
    info!("Local storage at {}", config.data_dir.display());

    // Voice sessions: one provider client per mounted session page
    let voice = HttpVoiceClientFactory::new(
        config.voice_api_base_url.clone(),
        config.voice_api_key.clone(),
    )?;
    let sessions = Arc::new(SessionManager::new(
        storage.clone(),
        Arc::new(voice),
        config.voice_connect_timeout,
    ));
    if config.voice_webhook_secret.is_none() {
        info!("VOICE_WEBHOOK_SECRET not set; voice webhook accepts unsigned events");
    }

    // Build app state
    let state = AppState {
        llm: Arc::new(llm),
        interviews: Arc::new(PgInterviewStore::new(db)),
        auth,
        sessions,
        storage,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to HOST_URL once the dashboard origin is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
