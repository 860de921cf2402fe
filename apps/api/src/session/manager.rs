//! Session manager: owns every mounted session page.
//!
//! One controller and one voice-client instance per mounted tab. All
//! intents and provider events for a tab go through that tab's controller
//! mutex, so they apply in arrival order and `end_call` cannot interleave
//! with a late event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::notices::Notice;
use crate::session::context_store::SessionContextStore;
use crate::session::controller::{CallPhase, MuteOutcome, StartOutcome, VoiceSessionController};
use crate::session::presenter::{present, CallView};
use crate::session::SessionContext;
use crate::storage::{SharedStorage, StorageRoot};
use crate::voice::client::{VoiceClientFactory, VoiceEvent};

pub type TabContextStore = SessionContextStore<SharedStorage>;

struct MountedSession {
    tab: String,
    controller: AsyncMutex<VoiceSessionController>,
    context: watch::Receiver<Option<SessionContext>>,
    /// Set once the end of this session's call has been processed.
    settled: AtomicBool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MountResponse {
    /// No saved context: send the candidate back to the landing page.
    Redirect { location: String },
    Mounted(SessionView),
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub call: CallView,
    pub join_url: Option<String>,
    pub error: Option<String>,
    pub notices: Vec<Notice>,
}

pub struct SessionManager {
    storage: StorageRoot,
    voice: Arc<dyn VoiceClientFactory>,
    connect_timeout: Duration,
    contexts: Mutex<HashMap<String, Arc<TabContextStore>>>,
    mounted: Mutex<HashMap<String, Arc<MountedSession>>>,
    /// Provider call id → the session that started it. Entries live only
    /// while the call is in flight.
    calls: Mutex<HashMap<String, Arc<MountedSession>>>,
}

impl SessionManager {
    pub fn new(
        storage: StorageRoot,
        voice: Arc<dyn VoiceClientFactory>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            voice,
            connect_timeout,
            contexts: Mutex::new(HashMap::new()),
            mounted: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// The tab's context store, restored from disk on first access.
    pub fn context_store(&self, tab: &str) -> Result<Arc<TabContextStore>, AppError> {
        let mut contexts = self.contexts.lock().map_err(poisoned)?;
        if let Some(store) = contexts.get(tab) {
            return Ok(store.clone());
        }
        let storage = self.storage.tab(tab).map_err(|e| AppError::Internal(e.into()))?;
        let store = Arc::new(SessionContextStore::open(storage));
        contexts.insert(tab.to_string(), store.clone());
        Ok(store)
    }

    /// Mounts the session page for a tab and auto-starts the call.
    /// Re-mounting a live session returns its current view without a second start.
    pub async fn mount(&self, tab: &str) -> Result<MountResponse, AppError> {
        let store = self.context_store(tab)?;
        let Some(context) = store.load() else {
            return Ok(MountResponse::Redirect {
                location: "/interview".to_string(),
            });
        };

        let mut live = None;
        if let Some(session) = self.session(tab)? {
            if session.controller.lock().await.phase() != CallPhase::Ended {
                live = Some(session);
            }
        }
        let session = match live {
            Some(session) => session,
            None => {
                let session = Arc::new(MountedSession {
                    tab: tab.to_string(),
                    controller: AsyncMutex::new(VoiceSessionController::new(
                        self.voice.create(),
                        self.connect_timeout,
                    )),
                    context: store.subscribe(),
                    settled: AtomicBool::new(false),
                });
                let replaced = self
                    .mounted
                    .lock()
                    .map_err(poisoned)?
                    .insert(tab.to_string(), session.clone());
                if let Some(old) = replaced {
                    self.forget_call(&*old.controller.lock().await)?;
                }
                info!("Mounted interview session for tab {tab}");
                session
            }
        };

        let mut controller = session.controller.lock().await;
        if let StartOutcome::Started(handle) = controller.auto_start(Some(&context)).await {
            self.calls
                .lock()
                .map_err(poisoned)?
                .insert(handle.call_id, session.clone());
        }
        self.settle(&session, &controller).await?;
        Ok(MountResponse::Mounted(Self::view_of(&session, &mut controller)))
    }

    pub async fn view(&self, tab: &str) -> Result<SessionView, AppError> {
        let session = self.require(tab)?;
        let mut controller = session.controller.lock().await;
        controller.check_connect_timeout().await;
        self.settle(&session, &controller).await?;
        Ok(Self::view_of(&session, &mut controller))
    }

    pub async fn toggle_mute(&self, tab: &str) -> Result<SessionView, AppError> {
        let session = self.require(tab)?;
        let mut controller = session.controller.lock().await;
        controller.check_connect_timeout().await;
        if let MuteOutcome::Toggled { muted } = controller.toggle_mute().await {
            debug!("Tab {tab} muted={muted}");
        }
        self.settle(&session, &controller).await?;
        Ok(Self::view_of(&session, &mut controller))
    }

    /// Candidate ends the interview: stop the call, then clear the tab's context.
    pub async fn end_interview(&self, tab: &str) -> Result<SessionView, AppError> {
        let session = self.require(tab)?;
        let mut controller = session.controller.lock().await;
        controller.end_call().await;
        self.settle(&session, &controller).await?;
        Ok(Self::view_of(&session, &mut controller))
    }

    /// Page unmount: stop the voice client whatever the phase.
    pub async fn unmount(&self, tab: &str) -> Result<(), AppError> {
        let removed = self.mounted.lock().map_err(poisoned)?.remove(tab);
        let Some(session) = removed else {
            return Ok(());
        };
        let mut controller = session.controller.lock().await;
        controller.shutdown().await;
        self.settle(&session, &controller).await?;
        self.forget_call(&controller)?;
        info!("Unmounted interview session for tab {tab}");
        Ok(())
    }

    /// Routes a provider event to the session that started the call.
    /// Returns false when the call is unknown or already over.
    pub async fn dispatch(&self, call_id: &str, event: VoiceEvent) -> Result<bool, AppError> {
        let session = self.calls.lock().map_err(poisoned)?.get(call_id).cloned();
        let Some(session) = session else {
            debug!("Event {:?} for unknown call {call_id}", event);
            return Ok(false);
        };
        let mut controller = session.controller.lock().await;
        if session.settled.load(Ordering::SeqCst) {
            debug!("Event {:?} for finished call {call_id}", event);
            return Ok(false);
        }
        controller.handle_event(event).await;
        self.settle(&session, &controller).await?;
        Ok(true)
    }

    fn session(&self, tab: &str) -> Result<Option<Arc<MountedSession>>, AppError> {
        Ok(self.mounted.lock().map_err(poisoned)?.get(tab).cloned())
    }

    fn require(&self, tab: &str) -> Result<Arc<MountedSession>, AppError> {
        self.session(tab)?
            .ok_or_else(|| AppError::NotFound(format!("No interview session mounted for tab {tab}")))
    }

    fn forget_call(&self, controller: &VoiceSessionController) -> Result<(), AppError> {
        if let Some(call) = controller.call() {
            self.calls.lock().map_err(poisoned)?.remove(&call.call_id);
        }
        Ok(())
    }

    /// The first time a session is seen Ended its call is forgotten and the
    /// tab's context cleared, so a new session for this tab has to go through
    /// the landing page again. Runs once per session: a finished session
    /// never touches a context saved by a later join.
    async fn settle(
        &self,
        session: &MountedSession,
        controller: &VoiceSessionController,
    ) -> Result<(), AppError> {
        if controller.phase() != CallPhase::Ended || session.settled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.forget_call(controller)?;

        let store = self.context_store(&session.tab)?;
        if store.current().is_none() {
            return Ok(());
        }
        let cleared = tokio::task::spawn_blocking(move || store.set(None))
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        if let Err(e) = cleared {
            warn!("Failed to clear interview context for tab {}: {e}", session.tab);
        }
        Ok(())
    }

    fn view_of(session: &MountedSession, controller: &mut VoiceSessionController) -> SessionView {
        let context = session.context.borrow().clone();
        SessionView {
            call: present(
                &controller.state(),
                context.as_ref().map(|c| c.user_name.as_str()),
            ),
            join_url: controller.call().and_then(|c| c.join_url.clone()),
            error: controller.last_error().map(str::to_string),
            notices: controller.take_notices(),
        }
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> AppError {
    AppError::Internal(anyhow::anyhow!("session registry lock poisoned"))
}
