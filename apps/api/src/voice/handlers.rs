use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::voice::webhook::ProviderEnvelope;

pub const SECRET_HEADER: &str = "x-vapi-secret";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// False when the message carried no lifecycle event or no live session owns the call.
    pub handled: bool,
}

/// POST /api/v1/voice/events
///
/// Provider server messages for in-flight calls. Always acknowledged with
/// 200 unless the shared secret is wrong, so the provider does not retry.
pub async fn handle_voice_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(envelope): Json<ProviderEnvelope>,
) -> Result<Json<WebhookAck>, AppError> {
    if let Some(expected) = state.config.voice_webhook_secret.as_deref() {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            warn!("Rejected voice webhook with missing or wrong secret");
            return Err(AppError::Permission("Invalid webhook secret".to_string()));
        }
    }

    let message = envelope.message;
    let (Some(call_id), Some(event)) = (message.call_id(), message.to_event()) else {
        debug!("Voice webhook message without lifecycle event: {:?}", message);
        return Ok(Json(WebhookAck { handled: false }));
    };

    let handled = state.sessions.dispatch(call_id, event).await?;
    Ok(Json(WebhookAck { handled }))
}
