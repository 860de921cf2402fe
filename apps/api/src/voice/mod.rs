// Voice sessions: assistant configuration, the provider client and its webhook.
// The call state machine itself lives in session::controller.

pub mod assistant;
pub mod client;
pub mod handlers;
pub mod webhook;
