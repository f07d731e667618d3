//! 会话管理
//!
//! One [`RegistrationState`] per operator session, cached in a `DashMap`
//! and written through to redb after every change.
//!
//! Commands wait for the session lock; preview/process take it with
//! `try_lock` and fail fast with `CommitInProgress` while another commit of
//! the same session is running.

use dashmap::DashMap;
use shared::models::Product;
use shared::{AppError, AppResult, ErrorCode};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::registration::{RegistrationCommand, RegistrationState, apply_command};
use crate::storage::Storage;

pub type SessionHandle = Arc<Mutex<RegistrationState>>;

pub struct SessionManager {
    storage: Storage,
    sessions: DashMap<String, SessionHandle>,
    page_size: usize,
}

impl SessionManager {
    pub fn new(storage: Storage, page_size: usize) -> Self {
        Self {
            storage,
            sessions: DashMap::new(),
            page_size,
        }
    }

    fn validate_id(session_id: &str) -> AppResult<()> {
        let valid = !session_id.is_empty()
            && session_id.len() <= 64
            && session_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(())
        } else {
            Err(AppError::validation("Invalid session id").with_detail("session", session_id))
        }
    }

    /// Open (or resume) `collection` for a session
    ///
    /// A stored state for the same collection and schema is resumed as is;
    /// anything else is discarded and a fresh list is built from `load`.
    pub async fn open_collection(
        &self,
        session_id: &str,
        collection: &str,
        load: impl FnOnce() -> AppResult<Vec<Product>>,
    ) -> AppResult<RegistrationState> {
        Self::validate_id(session_id)?;

        if let Some(handle) = self.sessions.get(session_id).map(|h| h.value().clone()) {
            let state = handle.lock().await;
            if state.is_compatible(collection) {
                return Ok(state.clone());
            }
        }

        let stored = self.storage.load_session(session_id)?;
        let state = match stored {
            Some(state) if state.is_compatible(collection) => {
                tracing::info!(session = %session_id, collection = %collection, "Session resumed");
                state
            }
            stale => {
                if let Some(old) = stale {
                    tracing::info!(
                        session = %session_id,
                        previous = %old.collection,
                        collection = %collection,
                        "Discarding stored list of another collection"
                    );
                }
                let products = load()?;
                tracing::info!(
                    session = %session_id,
                    collection = %collection,
                    products = products.len(),
                    "New registration list"
                );
                RegistrationState::new(collection, products, self.page_size)
            }
        };

        self.storage.save_session(session_id, &state)?;
        self.sessions
            .insert(session_id.to_string(), Arc::new(Mutex::new(state.clone())));
        Ok(state)
    }

    /// Session handle, loading it from storage after a restart
    pub fn handle(&self, session_id: &str) -> AppResult<SessionHandle> {
        if let Some(handle) = self.sessions.get(session_id) {
            return Ok(handle.value().clone());
        }
        Self::validate_id(session_id)?;
        let state = self
            .storage
            .load_session(session_id)?
            .ok_or_else(|| AppError::session_not_found(session_id))?;
        let handle = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(state)))
            .value()
            .clone();
        Ok(handle)
    }

    pub async fn snapshot(&self, session_id: &str) -> AppResult<RegistrationState> {
        let handle = self.handle(session_id)?;
        let state = handle.lock().await;
        Ok(state.clone())
    }

    /// Apply one command and persist; a rejected command changes nothing
    pub async fn apply(
        &self,
        session_id: &str,
        command: RegistrationCommand,
    ) -> AppResult<(Option<usize>, RegistrationState)> {
        let handle = self.handle(session_id)?;
        let mut state = handle.lock().await;

        let mut next = state.clone();
        let structural = command.is_structural();
        let affected = apply_command(&mut next, command)?;
        self.storage.save_session(session_id, &next)?;
        *state = next;

        if structural {
            tracing::debug!(session = %session_id, len = state.len(), "Structural change");
        }
        Ok((affected, state.clone()))
    }

    /// Exclusive access for a commit; fails instead of waiting
    pub fn lock_for_commit(&self, session_id: &str) -> AppResult<OwnedMutexGuard<RegistrationState>> {
        let handle = self.handle(session_id)?;
        handle.try_lock_owned().map_err(|_| {
            AppError::new(ErrorCode::CommitInProgress).with_detail("session", session_id)
        })
    }

    pub fn persist(&self, session_id: &str, state: &RegistrationState) -> AppResult<()> {
        self.storage.save_session(session_id, state)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products() -> Vec<Product> {
        vec![
            Product::new("Demo", "1", "Bolso", vec!["a.jpg".into(), "b.jpg".into()]),
            Product::new("Demo", "1", "Gorra", vec!["x.jpg".into()]),
        ]
    }

    fn manager() -> SessionManager {
        SessionManager::new(Storage::open_in_memory().unwrap(), 25)
    }

    #[tokio::test]
    async fn test_resume_same_collection() {
        let mgr = manager();
        mgr.open_collection("s1", "Demo", || Ok(products())).await.unwrap();
        mgr.apply("s1", RegistrationCommand::Duplicate { position: 0 })
            .await
            .unwrap();

        let resumed = mgr
            .open_collection("s1", "Demo", || panic!("must not reload"))
            .await
            .unwrap();
        assert_eq!(resumed.len(), 3);
    }

    #[tokio::test]
    async fn test_switching_collection_discards_list() {
        let mgr = manager();
        mgr.open_collection("s1", "Demo", || Ok(products())).await.unwrap();
        mgr.apply("s1", RegistrationCommand::Duplicate { position: 0 })
            .await
            .unwrap();

        let other = mgr
            .open_collection("s1", "Otra", || {
                Ok(vec![Product::new("Otra", "1", "Camiseta", vec![])])
            })
            .await
            .unwrap();
        assert_eq!(other.len(), 1);
        assert!(other.duplicate_counters.is_empty());
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let storage = Storage::open_in_memory().unwrap();
        let mgr = SessionManager::new(storage.clone(), 25);
        mgr.open_collection("s1", "Demo", || Ok(products())).await.unwrap();
        mgr.apply(
            "s1",
            RegistrationCommand::SetColor {
                position: 1,
                color: Some("Rojo".into()),
            },
        )
        .await
        .unwrap();

        let restarted = SessionManager::new(storage, 25);
        let state = restarted.snapshot("s1").await.unwrap();
        assert_eq!(
            state.slots[1].annotation.as_ref().unwrap().color.as_deref(),
            Some("Rojo")
        );
        assert_eq!(
            restarted.snapshot("nobody").await.unwrap_err().code,
            ErrorCode::SessionNotFound
        );
    }

    #[tokio::test]
    async fn test_rejected_command_keeps_state() {
        let mgr = manager();
        mgr.open_collection("s1", "Demo", || Ok(products())).await.unwrap();
        let err = mgr
            .apply(
                "s1",
                RegistrationCommand::SetPrimary {
                    position: 1,
                    image: 4,
                    on: true,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ImageIndexOutOfRange);
        assert!(mgr.snapshot("s1").await.unwrap().slots[1].annotation.is_none());
    }

    #[tokio::test]
    async fn test_second_commit_fails_fast() {
        let mgr = manager();
        mgr.open_collection("s1", "Demo", || Ok(products())).await.unwrap();
        let guard = mgr.lock_for_commit("s1").unwrap();
        let err = mgr.lock_for_commit("s1").unwrap_err();
        assert_eq!(err.code, ErrorCode::CommitInProgress);
        drop(guard);
        assert!(mgr.lock_for_commit("s1").is_ok());
    }

    #[tokio::test]
    async fn test_invalid_session_id() {
        let mgr = manager();
        let err = mgr
            .open_collection("../etc", "Demo", || Ok(products()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
