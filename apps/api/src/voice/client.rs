//! Voice-session client: the hosted provider that runs transcription, the
//! conversational model and speech synthesis for an interview call.
//!
//! The controller only ever sees the `VoiceClient` trait. Lifecycle events are
//! not polled from the client: the provider posts them to our webhook and the
//! session manager routes them to the owning controller by call id.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::voice::assistant::AssistantConfig;

pub const DEFAULT_VOICE_API_BASE_URL: &str = "https://api.vapi.ai";

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("voice provider unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("voice provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("no call is in progress")]
    NoActiveCall,
}

/// Lifecycle events emitted by the provider for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VoiceEvent {
    CallStart,
    CallEnd,
    SpeechStart,
    SpeechEnd,
    Error { message: String },
}

/// Returned by a successful `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallHandle {
    pub call_id: String,
    /// URL the candidate's browser joins to stream audio, when the provider issues one.
    pub join_url: Option<String>,
}

/// Start/stop/mute surface of the external voice client.
#[async_trait]
pub trait VoiceClient: Send + Sync {
    async fn start(&self, config: &AssistantConfig) -> Result<CallHandle, VoiceError>;
    async fn stop(&self) -> Result<(), VoiceError>;
    async fn set_muted(&self, muted: bool) -> Result<(), VoiceError>;
}

/// Creates one client instance per mounted session page.
pub trait VoiceClientFactory: Send + Sync {
    fn create(&self) -> Arc<dyn VoiceClient>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebCallResponse {
    id: String,
    web_call_url: Option<String>,
    monitor: Option<CallMonitor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallMonitor {
    control_url: Option<String>,
}

#[derive(Debug, Clone)]
struct ActiveCall {
    id: String,
    control_url: Option<String>,
}

/// Voice client over the provider's REST API.
pub struct HttpVoiceClient {
    client: Client,
    base_url: String,
    api_key: String,
    call: Mutex<Option<ActiveCall>>,
}

impl HttpVoiceClient {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            call: Mutex::new(None),
        }
    }

    async fn send_control(&self, control_url: &str, body: serde_json::Value) -> Result<(), VoiceError> {
        let response = self
            .client
            .post(control_url)
            .json(&body)
            .send()
            .await
            .map_err(VoiceError::Unreachable)?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, VoiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!("Voice provider returned {}: {}", status, message);
    Err(VoiceError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl VoiceClient for HttpVoiceClient {
    async fn start(&self, config: &AssistantConfig) -> Result<CallHandle, VoiceError> {
        let response = self
            .client
            .post(format!("{}/call/web", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "assistant": config }))
            .send()
            .await
            .map_err(VoiceError::Unreachable)?;

        let call: WebCallResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(VoiceError::Unreachable)?;

        info!("Voice call {} created", call.id);

        let control_url = call.monitor.and_then(|m| m.control_url);
        *self.call.lock().await = Some(ActiveCall {
            id: call.id.clone(),
            control_url,
        });

        Ok(CallHandle {
            call_id: call.id,
            join_url: call.web_call_url,
        })
    }

    async fn stop(&self) -> Result<(), VoiceError> {
        let Some(call) = self.call.lock().await.take() else {
            debug!("Stop requested with no call in progress");
            return Ok(());
        };

        match call.control_url.as_deref() {
            Some(url) => {
                self.send_control(url, json!({ "type": "end-call" })).await?;
                info!("Voice call {} stopped", call.id);
            }
            None => warn!("Voice call {} has no control URL; cannot end it remotely", call.id),
        }
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<(), VoiceError> {
        let call = self.call.lock().await.clone().ok_or(VoiceError::NoActiveCall)?;
        let url = call.control_url.ok_or(VoiceError::NoActiveCall)?;
        let control = if muted { "mute-customer" } else { "unmute-customer" };
        self.send_control(&url, json!({ "type": "control", "control": control }))
            .await
    }
}

/// Factory for `HttpVoiceClient`s sharing one connection pool.
pub struct HttpVoiceClientFactory {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpVoiceClientFactory {
    pub fn new(base_url: String, api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            base_url,
            api_key,
        })
    }
}

impl VoiceClientFactory for HttpVoiceClientFactory {
    fn create(&self) -> Arc<dyn VoiceClient> {
        Arc::new(HttpVoiceClient::new(
            self.client.clone(),
            self.base_url.clone(),
            self.api_key.clone(),
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_event_serializes_kebab_case() {
        let json = serde_json::to_value(VoiceEvent::CallStart).unwrap();
        assert_eq!(json["type"], "call-start");

        let json = serde_json::to_value(VoiceEvent::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_web_call_response_parses_control_url() {
        let body = r#"{
            "id": "c-9",
            "webCallUrl": "https://rooms.example/c-9",
            "monitor": {"controlUrl": "https://control.example/c-9"}
        }"#;
        let call: WebCallResponse = serde_json::from_str(body).unwrap();
        assert_eq!(call.id, "c-9");
        assert_eq!(
            call.monitor.and_then(|m| m.control_url).as_deref(),
            Some("https://control.example/c-9")
        );
    }

    #[tokio::test]
    async fn test_http_client_stop_without_call_is_noop() {
        let client = HttpVoiceClient::new(
            Client::new(),
            "http://127.0.0.1:9".to_string(),
            "key".to_string(),
        );
        assert!(client.stop().await.is_ok());
        assert!(matches!(
            client.set_muted(true).await,
            Err(VoiceError::NoActiveCall)
        ));
    }
}
