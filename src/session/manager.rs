use super::store::{SessionStore, StoreError};
use super::token::is_token_expired;
use crate::auth::AuthApi;
use crate::error::ApiError;
use crate::types::{Credentials, LoginData};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Hands out a usable access token, refreshing it against the backend when
/// the cached one has expired.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    auth: AuthApi,
    // Held for the duration of a refresh call so concurrent callers with the
    // same expired token share one round-trip.
    refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").field("auth", &self.auth).finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, auth: AuthApi) -> Self {
        Self {
            store,
            auth,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    fn cached_tokens(&self) -> Option<(String, String)> {
        match self.store.load() {
            Ok(session) => Some((session.access_token?, session.refresh_token?)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session store");
                None
            }
        }
    }

    /// `None` when there is no session, or the access token expired and the
    /// refresh failed. A failed refresh leaves the stored refresh token in
    /// place so the next call tries again.
    pub async fn get_valid_access_token(&self) -> Option<String> {
        let (access, _) = self.cached_tokens()?;
        if !is_token_expired(Some(&access)) {
            return Some(access);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate.
        let (access, refresh) = self.cached_tokens()?;
        if !is_token_expired(Some(&access)) {
            tracing::debug!("access token refreshed by a concurrent caller");
            return Some(access);
        }

        tracing::debug!("access token expired, refreshing");
        match self.auth.refresh(&refresh).await {
            Ok(new_access) => {
                if let Err(e) = self.store.set_access_token(&new_access) {
                    tracing::warn!(error = %e, "failed to persist refreshed access token");
                }
                Some(new_access)
            }
            Err(e) => {
                tracing::warn!(kind = %e.kind, status = ?e.status, "token refresh failed");
                None
            }
        }
    }

    /// Checks credentials with the backend. Nothing is persisted here; call
    /// [`SessionManager::establish`] with the returned data.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginData, ApiError> {
        self.auth.login(credentials).await
    }

    pub fn establish(&self, data: &LoginData) -> Result<(), StoreError> {
        self.store.save_tokens(&data.access, &data.refresh)?;
        self.store.save_profile(&data.user)
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.store.clear()
    }

    pub fn profile(&self) -> Option<Value> {
        self.store.load_profile().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read stored user profile");
            None
        })
    }
}
