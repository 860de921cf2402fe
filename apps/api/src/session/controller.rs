//! Voice Session Controller: the call-lifecycle state machine.
//!
//! ```text
//! Idle ──auto_start──▶ Connecting ──call-start──▶ Active ──call-end / end_call──▶ Ended
//!                         │                          │
//!                         └──── error / timeout / end_call ─────────────────────▶ Ended
//! ```
//!
//! `Ended` is terminal: a new call needs a freshly mounted controller.
//! Events are applied in arrival order and never coalesced. Any event that
//! is meaningless in the current phase is ignored.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::notices::Notice;
use crate::session::SessionContext;
use crate::voice::assistant::build_assistant_config;
use crate::voice::client::{CallHandle, VoiceClient, VoiceEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    #[default]
    Idle,
    Connecting,
    Active,
    Ended,
}

/// Snapshot of the call for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallState {
    pub phase: CallPhase,
    pub is_muted: bool,
    pub is_assistant_speaking: bool,
    /// Negation of `is_assistant_speaking`; presentational emphasis only.
    pub is_user_turn: bool,
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(CallHandle),
    /// A call was already started on this controller.
    AlreadyStarted,
    /// No session context: the page should send the candidate back to the landing page.
    NoContext,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteOutcome {
    /// Not Active; nothing forwarded.
    Ignored,
    Toggled { muted: bool },
    Failed,
}

pub struct VoiceSessionController {
    client: Arc<dyn VoiceClient>,
    connect_timeout: Duration,
    phase: CallPhase,
    is_muted: bool,
    is_assistant_speaking: bool,
    connecting_since: Option<Instant>,
    active_since: Option<Instant>,
    /// Clock value frozen when the call ends.
    final_elapsed: Option<Duration>,
    call: Option<CallHandle>,
    last_error: Option<String>,
    notices: Vec<Notice>,
}

impl VoiceSessionController {
    pub fn new(client: Arc<dyn VoiceClient>, connect_timeout: Duration) -> Self {
        Self {
            client,
            connect_timeout,
            phase: CallPhase::Idle,
            is_muted: false,
            is_assistant_speaking: false,
            connecting_since: None,
            active_since: None,
            final_elapsed: None,
            call: None,
            last_error: None,
            notices: Vec::new(),
        }
    }

    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    pub fn call(&self) -> Option<&CallHandle> {
        self.call.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn state(&self) -> CallState {
        let elapsed = match (self.final_elapsed, self.active_since) {
            (Some(frozen), _) => frozen,
            (None, Some(since)) => since.elapsed(),
            (None, None) => Duration::ZERO,
        };
        CallState {
            phase: self.phase,
            is_muted: self.is_muted,
            is_assistant_speaking: self.is_assistant_speaking,
            is_user_turn: !self.is_assistant_speaking,
            elapsed_seconds: elapsed.as_secs(),
        }
    }

    /// Drains notices accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Builds the assistant config and starts the call. Single attempt:
    /// any phase other than `Idle` makes this a no-op.
    pub async fn auto_start(&mut self, context: Option<&SessionContext>) -> StartOutcome {
        if self.phase != CallPhase::Idle {
            debug!("Auto-start skipped, phase is {:?}", self.phase);
            return StartOutcome::AlreadyStarted;
        }
        let Some(context) = context else {
            info!("No interview context found, redirecting to landing page");
            return StartOutcome::NoContext;
        };

        let config = build_assistant_config(context);
        self.phase = CallPhase::Connecting;
        self.connecting_since = Some(Instant::now());
        info!(
            "Starting interview call for {} ({} questions)",
            context.interview.interview_id,
            context.interview.question_list.len()
        );

        match self.client.start(&config).await {
            Ok(handle) => {
                self.call = Some(handle.clone());
                StartOutcome::Started(handle)
            }
            Err(e) => {
                self.fail(format!("Could not start the interview call: {e}"))
                    .await;
                StartOutcome::Failed
            }
        }
    }

    /// Applies one provider event.
    pub async fn handle_event(&mut self, event: VoiceEvent) {
        match (self.phase, event) {
            (CallPhase::Connecting, VoiceEvent::CallStart) => {
                self.phase = CallPhase::Active;
                self.active_since = Some(Instant::now());
                self.connecting_since = None;
                self.notices.push(Notice::success("Interview started"));
                info!("Interview call is active");
            }
            (CallPhase::Active, VoiceEvent::CallStart) => {
                debug!("Duplicate call-start ignored");
            }
            (CallPhase::Connecting | CallPhase::Active, VoiceEvent::CallEnd) => {
                info!("Provider ended the interview call");
                self.mark_ended();
            }
            (CallPhase::Active, VoiceEvent::SpeechStart) => self.is_assistant_speaking = true,
            (CallPhase::Active, VoiceEvent::SpeechEnd) => self.is_assistant_speaking = false,
            (CallPhase::Connecting | CallPhase::Active, VoiceEvent::Error { message }) => {
                self.fail(message).await;
            }
            (phase, event) => {
                debug!("Ignoring {:?} in phase {:?}", event, phase);
            }
        }
    }

    /// Forwards the opposite mute flag; local state flips only once the
    /// provider accepted it.
    pub async fn toggle_mute(&mut self) -> MuteOutcome {
        if self.phase != CallPhase::Active {
            return MuteOutcome::Ignored;
        }
        let desired = !self.is_muted;
        match self.client.set_muted(desired).await {
            Ok(()) => {
                self.is_muted = desired;
                MuteOutcome::Toggled { muted: desired }
            }
            Err(e) => {
                warn!("Mute toggle failed: {e}");
                self.notices.push(Notice::error(if desired {
                    "Failed to mute microphone"
                } else {
                    "Failed to unmute microphone"
                }));
                MuteOutcome::Failed
            }
        }
    }

    /// Candidate's explicit end (also the manual abort of a stuck connect).
    /// Stops the provider call before marking `Ended`. Returns false when
    /// already ended.
    pub async fn end_call(&mut self) -> bool {
        if self.phase == CallPhase::Ended {
            return false;
        }
        if let Err(e) = self.client.stop().await {
            warn!("Stopping the interview call failed: {e}");
            self.notices
                .push(Notice::error("The call could not be stopped cleanly"));
        }
        self.mark_ended();
        self.notices.push(Notice::info("Interview ended"));
        true
    }

    /// Fails a `Connecting` phase that outlived the connect timeout.
    pub async fn check_connect_timeout(&mut self) {
        let timed_out = self.phase == CallPhase::Connecting
            && self
                .connecting_since
                .is_some_and(|since| since.elapsed() >= self.connect_timeout);
        if timed_out {
            self.fail(format!(
                "Connecting to the interviewer timed out after {}s",
                self.connect_timeout.as_secs()
            ))
            .await;
        }
    }

    /// Unmount teardown: always stops the provider client.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.client.stop().await {
            warn!("Stopping voice client on unmount failed: {e}");
        }
        if self.phase != CallPhase::Ended {
            self.mark_ended();
        }
    }

    async fn fail(&mut self, message: String) {
        warn!("Interview call failed: {message}");
        self.notices.push(Notice::error(message.clone()));
        self.last_error = Some(message);
        if let Err(e) = self.client.stop().await {
            warn!("Stopping failed interview call also failed: {e}");
        }
        self.mark_ended();
    }

    fn mark_ended(&mut self) {
        self.final_elapsed = Some(
            self.active_since
                .map(|since| since.elapsed())
                .unwrap_or(Duration::ZERO),
        );
        self.phase = CallPhase::Ended;
        self.is_assistant_speaking = false;
        self.connecting_since = None;
    }
}
