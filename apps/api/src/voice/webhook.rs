//! Provider server messages → `VoiceEvent`s.

use serde::Deserialize;

use crate::voice::client::VoiceEvent;

#[derive(Debug, Deserialize)]
pub struct ProviderEnvelope {
    pub message: ProviderMessage,
}

#[derive(Debug, Deserialize)]
pub struct CallRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProviderMessage {
    #[serde(rename_all = "camelCase")]
    StatusUpdate {
        status: String,
        call: Option<CallRef>,
        ended_reason: Option<String>,
    },
    SpeechUpdate {
        status: String,
        role: String,
        call: Option<CallRef>,
    },
    EndOfCallReport {
        call: Option<CallRef>,
    },
    /// The assistant stopped responding mid-call.
    Hang {
        call: Option<CallRef>,
    },
    Error {
        /// A plain message, or an object for some failure kinds.
        error: Option<serde_json::Value>,
        call: Option<CallRef>,
    },
    #[serde(other)]
    Other,
}

impl ProviderMessage {
    pub fn call_id(&self) -> Option<&str> {
        match self {
            ProviderMessage::StatusUpdate { call, .. }
            | ProviderMessage::SpeechUpdate { call, .. }
            | ProviderMessage::EndOfCallReport { call }
            | ProviderMessage::Hang { call }
            | ProviderMessage::Error { call, .. } => call.as_ref().map(|c| c.id.as_str()),
            ProviderMessage::Other => None,
        }
    }

    /// Maps the message to a controller event. Messages with no lifecycle
    /// meaning (queued, ringing, user speech, transcripts...) map to `None`.
    pub fn to_event(&self) -> Option<VoiceEvent> {
        match self {
            ProviderMessage::StatusUpdate {
                status,
                ended_reason,
                ..
            } => match status.as_str() {
                "in-progress" => Some(VoiceEvent::CallStart),
                "ended" => match ended_reason.as_deref() {
                    Some(reason) if is_failure_reason(reason) => Some(VoiceEvent::Error {
                        message: format!("Call ended unexpectedly: {reason}"),
                    }),
                    _ => Some(VoiceEvent::CallEnd),
                },
                _ => None,
            },
            ProviderMessage::SpeechUpdate { status, role, .. } if role == "assistant" => {
                match status.as_str() {
                    "started" => Some(VoiceEvent::SpeechStart),
                    "stopped" => Some(VoiceEvent::SpeechEnd),
                    _ => None,
                }
            }
            ProviderMessage::EndOfCallReport { .. } => Some(VoiceEvent::CallEnd),
            ProviderMessage::Hang { .. } => Some(VoiceEvent::Error {
                message: "The interviewer stopped responding".to_string(),
            }),
            ProviderMessage::Error { error, .. } => Some(VoiceEvent::Error {
                message: match error {
                    Some(serde_json::Value::String(message)) => message.clone(),
                    Some(other) => other.to_string(),
                    None => "Voice call failed".to_string(),
                },
            }),
            _ => None,
        }
    }
}

fn is_failure_reason(reason: &str) -> bool {
    reason.contains("error") || reason.contains("failed")
}
