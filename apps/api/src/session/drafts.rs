//! Interview drafts: unfinished question sets kept in the recruiter's local
//! storage under `interviewDrafts`. Only the most recent drafts are retained.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::interviews::questions::InterviewForm;
use crate::models::interview::Question;
use crate::storage::{LocalStorage, StorageError};

pub const DRAFTS_KEY: &str = "interviewDrafts";
pub const MAX_DRAFTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub form_data: InterviewForm,
    pub questions: Vec<Question>,
    pub timestamp: DateTime<Utc>,
    pub id: String,
}

pub struct DraftStore<S: LocalStorage> {
    storage: S,
}

impl<S: LocalStorage> DraftStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Saved drafts, oldest first.
    pub fn list(&self) -> Result<Vec<Draft>, StorageError> {
        match self.storage.get_item(DRAFTS_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Appends a draft and drops the oldest beyond `MAX_DRAFTS`.
    pub fn save(
        &self,
        form_data: InterviewForm,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Result<Draft, StorageError> {
        let draft = Draft {
            form_data,
            questions,
            timestamp: now,
            id: format!("draft_{}", now.timestamp_millis()),
        };

        let mut kept = 0;
        self.storage.update_item(DRAFTS_KEY, &mut |raw| {
            let mut drafts: Vec<Draft> = match raw {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Vec::new(),
            };
            drafts.push(draft.clone());
            if drafts.len() > MAX_DRAFTS {
                drafts.drain(..drafts.len() - MAX_DRAFTS);
            }
            kept = drafts.len();
            Ok(serde_json::to_string(&drafts)?)
        })?;
        info!("Saved interview draft {} ({kept} kept)", draft.id);
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::interview::QuestionType;
    use crate::storage::{MemoryStorage, StorageRoot};

    fn form(position: &str) -> InterviewForm {
        InterviewForm {
            job_position: Some(position.to_string()),
            job_description: Some("Ship features end to end".to_string()),
            duration: Some(30),
            interview_types: Some(vec!["Technical".to_string()]),
        }
    }

    #[test]
    fn test_list_is_empty_initially() {
        let store = DraftStore::new(MemoryStorage::default());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_save_assigns_millisecond_id() {
        let store = DraftStore::new(MemoryStorage::default());
        let now = DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let draft = store
            .save(
                form("SRE"),
                vec![Question {
                    question: "What is an SLO?".to_string(),
                    kind: QuestionType::Technical,
                }],
                now,
            )
            .unwrap();
        assert_eq!(draft.id, format!("draft_{}", now.timestamp_millis()));
        assert_eq!(store.list().unwrap(), vec![draft]);
    }

    #[test]
    fn test_keeps_only_ten_most_recent() {
        let store = DraftStore::new(MemoryStorage::default());
        let start = Utc::now();
        for i in 0..15 {
            store
                .save(
                    form(&format!("Role {i}")),
                    Vec::new(),
                    start + Duration::seconds(i),
                )
                .unwrap();
        }

        let drafts = store.list().unwrap();
        assert_eq!(drafts.len(), MAX_DRAFTS);
        let positions: Vec<_> = drafts
            .iter()
            .map(|d| d.form_data.job_position.clone().unwrap())
            .collect();
        let expected: Vec<_> = (5..15).map(|i| format!("Role {i}")).collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn test_corrupted_drafts_fail_save() {
        let storage = MemoryStorage::default();
        storage.set_item(DRAFTS_KEY, "not json").unwrap();
        let store = DraftStore::new(storage);
        assert!(store.save(form("QA"), Vec::new(), Utc::now()).is_err());
    }

    #[test]
    fn test_concurrent_saves_for_one_user_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path());
        let start = Utc::now();

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let root = root.clone();
                std::thread::spawn(move || {
                    DraftStore::new(root.user("pm@example.com").unwrap()).save(
                        form(&format!("Role {i}")),
                        Vec::new(),
                        start + Duration::milliseconds(i),
                    )
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap().unwrap();
        }

        let drafts = DraftStore::new(root.user("pm@example.com").unwrap())
            .list()
            .unwrap();
        assert_eq!(drafts.len(), 8);
    }
}
