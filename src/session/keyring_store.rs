use super::store::{non_blank, Session, SessionStore, StoreError};
use serde_json::Value;

const KEYRING_SERVICE: &str = "com.verlo.admin";
pub const KEYRING_USER_ACCESS_TOKEN: &str = "access_token";
pub const KEYRING_USER_REFRESH_TOKEN: &str = "refresh_token";
pub const KEYRING_USER_PROFILE: &str = "user_profile";

/// Keeps the session in the OS credential store: both tokens plus the
/// signed-in user's profile serialized as JSON.
#[derive(Debug)]
pub struct KeyringSessionStore {
    access: Option<keyring::Entry>,
    refresh: Option<keyring::Entry>,
    profile: Option<keyring::Entry>,
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn entry(user: &str) -> Option<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, user).ok()
}

fn require(entry: &Option<keyring::Entry>) -> Result<&keyring::Entry, StoreError> {
    entry
        .as_ref()
        .ok_or_else(|| StoreError::Keyring(keyring::Error::NoStorageAccess("no keyring entry".into())))
}

fn read(entry: &Option<keyring::Entry>) -> Result<Option<String>, StoreError> {
    match require(entry)?.get_password() {
        Ok(pwd) => Ok(non_blank(Some(pwd))),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(keyring::Error::BadEncoding(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write(entry: &Option<keyring::Entry>, value: &str) -> Result<(), StoreError> {
    require(entry)?.set_password(value.trim())?;
    Ok(())
}

fn delete(entry: &Option<keyring::Entry>) -> Result<(), StoreError> {
    match require(entry)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl KeyringSessionStore {
    pub fn new() -> Self {
        Self {
            access: entry(KEYRING_USER_ACCESS_TOKEN),
            refresh: entry(KEYRING_USER_REFRESH_TOKEN),
            profile: entry(KEYRING_USER_PROFILE),
        }
    }

    pub fn is_available(&self) -> bool {
        if self.access.is_none() || self.profile.is_none() {
            return false;
        }
        let Some(entry) = &self.refresh else {
            return false;
        };

        match entry.get_password() {
            Ok(_) => true,
            Err(keyring::Error::NoEntry) => true,
            Err(keyring::Error::BadEncoding(_)) => true,
            Err(keyring::Error::Ambiguous(_)) => true,
            Err(keyring::Error::NoStorageAccess(_)) => false,
            Err(keyring::Error::PlatformFailure(_)) => false,
            Err(_) => false,
        }
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Result<Session, StoreError> {
        Ok(Session {
            access_token: read(&self.access)?,
            refresh_token: read(&self.refresh)?,
        })
    }

    fn save_tokens(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
        write(&self.access, access)?;
        write(&self.refresh, refresh)
    }

    fn set_access_token(&self, access: &str) -> Result<(), StoreError> {
        write(&self.access, access)
    }

    fn load_profile(&self) -> Result<Option<Value>, StoreError> {
        let Some(raw) = read(&self.profile)? else {
            return Ok(None);
        };
        let profile: Value = serde_json::from_str(&raw)?;
        Ok(Some(profile).filter(|p| !p.is_null()))
    }

    fn save_profile(&self, profile: &Value) -> Result<(), StoreError> {
        write(&self.profile, &serde_json::to_string(profile)?)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let access = delete(&self.access);
        let refresh = delete(&self.refresh);
        let profile = delete(&self.profile);
        access.and(refresh).and(profile)
    }
}
