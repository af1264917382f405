use super::store::{non_blank, Session, SessionStore, StoreError};
use serde_json::{json, Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub const KEY_ACCESS: &str = "access";
pub const KEY_REFRESH: &str = "refresh";
pub const KEY_USER: &str = "user";

fn defaults() -> Map<String, Value> {
  let mut map = Map::new();
  map.insert(KEY_ACCESS.to_string(), json!(""));
  map.insert(KEY_REFRESH.to_string(), json!(""));
  map.insert(KEY_USER.to_string(), Value::Null);
  map
}

/// JSON key-value file holding the session. Every mutation is written
/// through to disk before it returns.
#[derive(Debug)]
pub struct FileSessionStore {
  path: PathBuf,
  entries: Mutex<Map<String, Value>>,
}

impl FileSessionStore {
  pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
    let path = path.into();
    let mut entries = defaults();
    match std::fs::read_to_string(&path) {
      Ok(data) if !data.trim().is_empty() => {
        let stored: Value = serde_json::from_str(&data)?;
        if let Value::Object(stored) = stored {
          entries.extend(stored);
        }
      }
      Ok(_) => {}
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => return Err(e.into()),
    }
    Ok(Self {
      path,
      entries: Mutex::new(entries),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn get_string(&self, key: &str) -> Option<String> {
    let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    non_blank(entries.get(key)?.as_str().map(str::to_string))
  }

  /// The in-memory map only changes once the new contents are on disk.
  fn update(&self, f: impl FnOnce(&mut Map<String, Value>)) -> Result<(), StoreError> {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    let mut next = entries.clone();
    f(&mut next);
    self.persist(&next)?;
    *entries = next;
    Ok(())
  }

  fn persist(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(entries)?;
    let tmp = self.path.with_extension("json.tmp");
    write_private(&tmp, &data)?;
    std::fs::rename(&tmp, &self.path)?;
    Ok(())
  }
}

/// Writes a file only the current user can read; it holds bearer tokens.
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
  // A leftover file would keep its old mode.
  match std::fs::remove_file(path) {
    Ok(()) => {}
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
    Err(e) => return Err(e),
  }

  let mut options = std::fs::OpenOptions::new();
  options.write(true).create_new(true);
  #[cfg(unix)]
  {
    use std::os::unix::fs::OpenOptionsExt;
    options.mode(0o600);
  }
  let mut file = options.open(path)?;
  file.write_all(data)?;
  file.sync_all()
}

impl SessionStore for FileSessionStore {
  fn load(&self) -> Result<Session, StoreError> {
    Ok(Session {
      access_token: self.get_string(KEY_ACCESS),
      refresh_token: self.get_string(KEY_REFRESH),
    })
  }

  fn save_tokens(&self, access: &str, refresh: &str) -> Result<(), StoreError> {
    self.update(|map| {
      map.insert(KEY_ACCESS.to_string(), json!(access.trim()));
      map.insert(KEY_REFRESH.to_string(), json!(refresh.trim()));
    })
  }

  fn set_access_token(&self, access: &str) -> Result<(), StoreError> {
    self.update(|map| {
      map.insert(KEY_ACCESS.to_string(), json!(access.trim()));
    })
  }

  fn load_profile(&self) -> Result<Option<Value>, StoreError> {
    let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(entries.get(KEY_USER).filter(|v| !v.is_null()).cloned())
  }

  fn save_profile(&self, profile: &Value) -> Result<(), StoreError> {
    self.update(|map| {
      map.insert(KEY_USER.to_string(), profile.clone());
    })
  }

  fn clear(&self) -> Result<(), StoreError> {
    self.update(|map| *map = defaults())
  }
}
