use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file could not be read or written: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is not valid json")]
    Json(#[from] serde_json::Error),
    #[error("OS keychain/secret service is unavailable")]
    Keyring(#[from] keyring::Error),
}

/// Cached credentials. Either token may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Durable key-value storage for the token pair and the signed-in user's
/// profile. Implementations must treat blank strings as absent.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Session, StoreError>;

    /// Full replace, used by login.
    fn save_tokens(&self, access: &str, refresh: &str) -> Result<(), StoreError>;

    /// Access-token replace, used by refresh. The refresh token is untouched.
    fn set_access_token(&self, access: &str) -> Result<(), StoreError>;

    fn load_profile(&self) -> Result<Option<Value>, StoreError>;

    fn save_profile(&self, profile: &Value) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

#[derive(Debug, Default)]
struct MemoryState {
    session: Session,
    profile: Option<Value>,
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    state: Mutex<MemoryState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.session = Session {
                access_token: non_blank(Some(access.to_string())),
                refresh_token: non_blank(Some(refresh.to_string())),
            };
        }
        store
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Session, StoreError> {
        Ok(self.with_state(|s| s.session.clone()))
    }

    fn save_tokens(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        self.with_state(|s| {
            s.session = Session {
                access_token: non_blank(Some(access.to_string())),
                refresh_token: non_blank(Some(refresh.to_string())),
            };
        });
        Ok(())
    }

    fn set_access_token(&self, access: &str) -> Result<(), StoreError> {
        self.with_state(|s| s.session.access_token = non_blank(Some(access.to_string())));
        Ok(())
    }

    fn load_profile(&self) -> Result<Option<Value>, StoreError> {
        Ok(self.with_state(|s| s.profile.clone()))
    }

    fn save_profile(&self, profile: &Value) -> Result<(), StoreError> {
        self.with_state(|s| s.profile = Some(profile.clone()));
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.with_state(|s| *s = MemoryState::default());
        Ok(())
    }
}
