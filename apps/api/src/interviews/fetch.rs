//! Interview Fetch Client: loads an interview record by id for the
//! candidate landing page.
//!
//! A failed fetch leaves an inline `Failed` state with a retry control and
//! an error notice. Nothing is retried automatically: `retry` is the user's
//! button press and re-issues the identical query.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::interviews::store::InterviewStore;
use crate::models::interview::InterviewRecord;
use crate::notices::Notice;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchState {
    Loading,
    Loaded { interview: InterviewRecord },
    Failed {
        code: &'static str,
        message: String,
        retryable: bool,
    },
}

pub struct InterviewFetchClient {
    store: Arc<dyn InterviewStore>,
    interview_id: String,
    state: FetchState,
    notices: Vec<Notice>,
}

impl InterviewFetchClient {
    pub fn new(store: Arc<dyn InterviewStore>, interview_id: impl Into<String>) -> Self {
        Self {
            store,
            interview_id: interview_id.into(),
            state: FetchState::Loading,
            notices: Vec::new(),
        }
    }

    pub fn interview_id(&self) -> &str {
        &self.interview_id
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub async fn fetch(&mut self) -> &FetchState {
        self.state = match self.store.fetch_by_id(&self.interview_id).await {
            Ok(interview) => {
                info!("Loaded interview {}", self.interview_id);
                self.notices
                    .push(Notice::success("Interview details loaded successfully!"));
                FetchState::Loaded { interview }
            }
            Err(e) => {
                warn!("Fetching interview {} failed: {e}", self.interview_id);
                let message = e.user_message();
                self.notices.push(Notice::error(message.clone()));
                FetchState::Failed {
                    code: e.code(),
                    message,
                    retryable: true,
                }
            }
        };
        &self.state
    }

    /// Same query, same id.
    pub async fn retry(&mut self) -> &FetchState {
        info!("Retrying fetch of interview {}", self.interview_id);
        self.fetch().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interviews::store::testing::MemoryInterviewStore;
    use crate::models::interview::{Question, QuestionType};

    fn record(id: &str) -> InterviewRecord {
        InterviewRecord {
            interview_id: id.to_string(),
            job_position: "Data Engineer".to_string(),
            job_description: "Pipelines".to_string(),
            duration_minutes: 45,
            interview_types: vec!["Technical".to_string()],
            question_list: vec![Question {
                question: "What is a watermark?".to_string(),
                kind: QuestionType::Technical,
            }],
            user_email: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_zero_rows_shows_not_found_and_retry_reissues_same_query() {
        let store = Arc::new(MemoryInterviewStore::default());
        let mut client = InterviewFetchClient::new(store.clone(), "abc123");

        let state = client.fetch().await.clone();
        assert_eq!(
            state,
            FetchState::Failed {
                code: "NOT_FOUND",
                message: "Interview not found".to_string(),
                retryable: true,
            }
        );
        assert_eq!(client.take_notices(), vec![Notice::error("Interview not found")]);

        client.retry().await;
        assert_eq!(store.fetched(), vec!["abc123".to_string(), "abc123".to_string()]);
    }

    #[tokio::test]
    async fn test_retry_after_row_appears_loads() {
        let store = Arc::new(MemoryInterviewStore::default());
        let mut client = InterviewFetchClient::new(store.clone(), "abc123");
        client.fetch().await;

        store.records.lock().unwrap().push(record("abc123"));
        let state = client.retry().await;
        assert!(matches!(state, FetchState::Loaded { interview } if interview.interview_id == "abc123"));
    }

    #[tokio::test]
    async fn test_backend_failure_is_retryable_and_not_retried() {
        let store = Arc::new(MemoryInterviewStore::with(vec![record("x")]));
        *store.fail.lock().unwrap() = true;
        let mut client = InterviewFetchClient::new(store.clone(), "x");

        let state = client.fetch().await;
        assert!(matches!(
            state,
            FetchState::Failed { code: "BACKEND_ERROR", retryable: true, .. }
        ));
        assert_eq!(store.fetched().len(), 1);
    }

    #[tokio::test]
    async fn test_success_emits_success_notice() {
        let store = Arc::new(MemoryInterviewStore::with(vec![record("x")]));
        let mut client = InterviewFetchClient::new(store, "x");
        client.fetch().await;
        assert_eq!(
            client.take_notices(),
            vec![Notice::success("Interview details loaded successfully!")]
        );
    }
}
