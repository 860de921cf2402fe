//! Candidate interview sessions.
//!
//! Flow: candidate joins (context stored for their tab) → session page mounts →
//! controller builds the assistant config and auto-starts the call →
//! presenter renders call state until the candidate ends the interview.

use serde::{Deserialize, Serialize};

use crate::models::interview::InterviewRecord;

pub mod context_store;
pub mod controller;
pub mod drafts;
pub mod handlers;
pub mod manager;
pub mod presenter;

/// Tab-scoped candidate identity plus the interview they joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub user_name: String,
    pub interview: InterviewRecord,
}
