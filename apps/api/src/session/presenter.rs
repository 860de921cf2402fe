//! Call UI Presenter: pure rendering of `CallState`.
//!
//! Never talks to the voice client: the view only says which intents
//! (`toggle_mute`, `end_interview`) the page may offer.

use serde::Serialize;

use crate::session::controller::{CallPhase, CallState};

pub const END_CONFIRMATION: &str = "Are you sure you want to end the interview?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallView {
    pub phase: CallPhase,
    pub status_label: &'static str,
    pub candidate_name: Option<String>,
    /// Avatar letter for the candidate tile.
    pub candidate_initial: String,
    pub assistant_speaking: bool,
    pub user_turn: bool,
    pub muted: bool,
    /// `HH:MM:SS` since the call became active.
    pub clock: String,
    pub can_toggle_mute: bool,
    pub can_end: bool,
    pub end_confirmation: &'static str,
}

pub fn present(state: &CallState, candidate_name: Option<&str>) -> CallView {
    let active = state.phase == CallPhase::Active;
    CallView {
        phase: state.phase,
        status_label: status_label(state.phase),
        candidate_name: candidate_name.map(str::to_string),
        candidate_initial: candidate_name
            .and_then(|n| n.trim().chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string()),
        assistant_speaking: active && state.is_assistant_speaking,
        user_turn: active && state.is_user_turn,
        muted: state.is_muted,
        clock: format_clock(state.elapsed_seconds),
        can_toggle_mute: active,
        can_end: matches!(state.phase, CallPhase::Connecting | CallPhase::Active),
        end_confirmation: END_CONFIRMATION,
    }
}

fn status_label(phase: CallPhase) -> &'static str {
    match phase {
        CallPhase::Idle => "Loading interview session...",
        CallPhase::Connecting => "Connecting to your AI interviewer...",
        CallPhase::Active => "Interview in progress...",
        CallPhase::Ended => "Interview ended",
    }
}

pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{mins:02}:{secs:02}")
}
