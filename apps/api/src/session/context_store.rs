//! Session Context Store: the candidate's context for one tab, mirrored to
//! durable storage under `interviewInfo` so a reload keeps the session.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::session::SessionContext;
use crate::storage::{LocalStorage, StorageError};

pub const CONTEXT_KEY: &str = "interviewInfo";

pub struct SessionContextStore<S: LocalStorage> {
    storage: S,
    tx: watch::Sender<Option<SessionContext>>,
}

impl<S: LocalStorage> SessionContextStore<S> {
    /// Opens the store, restoring any persisted context.
    pub fn open(storage: S) -> Self {
        let initial = load_from(&storage);
        let (tx, _rx) = watch::channel(initial);
        Self { storage, tx }
    }

    /// Re-reads the persisted context. A corrupted entry is cleared and yields `None`.
    pub fn load(&self) -> Option<SessionContext> {
        let loaded = load_from(&self.storage);
        self.tx.send_replace(loaded.clone());
        loaded
    }

    pub fn current(&self) -> Option<SessionContext> {
        self.tx.borrow().clone()
    }

    /// Replaces the context. `Some` persists it, `None` deletes the entry.
    /// Subscribers see the new value even if persisting fails.
    pub fn set(&self, context: Option<SessionContext>) -> Result<(), StorageError> {
        let persisted = match &context {
            Some(ctx) => serde_json::to_string(ctx)
                .map_err(StorageError::from)
                .and_then(|raw| self.storage.set_item(CONTEXT_KEY, &raw)),
            None => self.storage.remove_item(CONTEXT_KEY),
        };
        self.tx.send_replace(context);
        persisted
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SessionContext>> {
        self.tx.subscribe()
    }
}

fn load_from<S: LocalStorage>(storage: &S) -> Option<SessionContext> {
    let raw = match storage.get_item(CONTEXT_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e @ StorageError::Corrupted { .. }) => {
            warn!("Saved interview context is unreadable, clearing it: {e}");
            clear_corrupted(storage);
            return None;
        }
        Err(e) => {
            warn!("Failed to read saved interview context: {e}");
            return None;
        }
    };

    match serde_json::from_str::<SessionContext>(&raw) {
        Ok(ctx) => {
            debug!("Restored interview context for {}", ctx.interview.interview_id);
            Some(ctx)
        }
        Err(e) => {
            warn!("Error parsing saved interview context, clearing it: {e}");
            clear_corrupted(storage);
            None
        }
    }
}

fn clear_corrupted<S: LocalStorage>(storage: &S) {
    if let Err(e) = storage.remove_item(CONTEXT_KEY) {
        warn!("Failed to clear corrupted interview context: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::{InterviewRecord, Question, QuestionType};
    use crate::storage::{MemoryStorage, StorageRoot};

    fn sample_context() -> SessionContext {
        SessionContext {
            user_name: "Grace Hopper".to_string(),
            interview: InterviewRecord {
                interview_id: "abc123".to_string(),
                job_position: "Compiler Engineer".to_string(),
                job_description: "Work on the COBOL toolchain".to_string(),
                duration_minutes: 45,
                interview_types: vec!["Technical".to_string(), "Leadership".to_string()],
                question_list: vec![
                    Question {
                        question: "What is a linker?".to_string(),
                        kind: QuestionType::Technical,
                    },
                    Question {
                        question: "How do you mentor juniors?".to_string(),
                        kind: QuestionType::Leadership,
                    },
                ],
                user_email: Some("recruiter@example.com".to_string()),
                created_at: None,
            },
        }
    }

    #[test]
    fn test_set_then_reopen_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path());

        let store = SessionContextStore::open(root.tab("t1").unwrap());
        assert!(store.current().is_none());
        store.set(Some(sample_context())).unwrap();

        // Simulates a page reload: a fresh store over the same storage.
        let reloaded = SessionContextStore::open(root.tab("t1").unwrap());
        assert_eq!(reloaded.current(), Some(sample_context()));
        assert_eq!(reloaded.load(), Some(sample_context()));
    }

    #[test]
    fn test_corrupted_entry_yields_none_and_is_cleared() {
        let storage = MemoryStorage::default();
        storage.set_item(CONTEXT_KEY, "{\"userName\": \"Ada\", ").unwrap();

        let store = SessionContextStore::open(storage);
        assert!(store.current().is_none());
        assert_eq!(store.storage.get_item(CONTEXT_KEY).unwrap(), None);
    }

    #[test]
    fn test_corrupted_namespace_file_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let root = StorageRoot::new(dir.path());
        let storage = root.tab("t").unwrap();
        SessionContextStore::open(storage.clone())
            .set(Some(sample_context()))
            .unwrap();
        let raw = std::fs::read_to_string(storage.path()).unwrap();
        std::fs::write(storage.path(), &raw[..raw.len() / 2]).unwrap();

        let store = SessionContextStore::open(storage.clone());
        assert!(store.current().is_none());
        assert_eq!(storage.get_item(CONTEXT_KEY).unwrap(), None);
        assert_ne!(std::fs::read_to_string(storage.path()).unwrap(), raw[..raw.len() / 2]);
    }

    #[test]
    fn test_load_rereads_storage() {
        let storage = std::sync::Arc::new(MemoryStorage::default());
        let store = SessionContextStore::open(storage.clone());
        storage
            .set_item(CONTEXT_KEY, &serde_json::to_string(&sample_context()).unwrap())
            .unwrap();

        assert!(store.current().is_none());
        assert_eq!(store.load(), Some(sample_context()));
        assert_eq!(store.current(), Some(sample_context()));
    }

    #[test]
    fn test_wrong_shape_entry_is_treated_as_corrupted() {
        let storage = MemoryStorage::default();
        storage.set_item(CONTEXT_KEY, "{\"userName\": 42}").unwrap();

        let store = SessionContextStore::open(storage);
        assert!(store.load().is_none());
        assert_eq!(store.storage.get_item(CONTEXT_KEY).unwrap(), None);
    }

    #[test]
    fn test_set_none_deletes_persisted_entry() {
        let store = SessionContextStore::open(MemoryStorage::default());
        store.set(Some(sample_context())).unwrap();
        assert!(store.storage.get_item(CONTEXT_KEY).unwrap().is_some());

        store.set(None).unwrap();
        assert!(store.current().is_none());
        assert_eq!(store.storage.get_item(CONTEXT_KEY).unwrap(), None);
    }

    #[test]
    fn test_set_fully_replaces_previous_context() {
        let store = SessionContextStore::open(MemoryStorage::default());
        store.set(Some(sample_context())).unwrap();

        let mut other = sample_context();
        other.user_name = "Alan".to_string();
        other.interview.question_list.clear();
        store.set(Some(other.clone())).unwrap();

        assert_eq!(store.current(), Some(other));
    }

    #[tokio::test]
    async fn test_subscribers_observe_changes() {
        let store = SessionContextStore::open(MemoryStorage::default());
        let mut rx = store.subscribe();

        store.set(Some(sample_context())).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().map(|c| c.user_name.as_str()), Some("Grace Hopper"));

        store.set(None).unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
