mod file_store;
mod keyring_store;
mod manager;
mod store;
mod token;

pub use file_store::FileSessionStore;
pub use keyring_store::KeyringSessionStore;
pub use manager::SessionManager;
pub use store::{MemorySessionStore, Session, SessionStore, StoreError};
pub use token::{is_token_expired, is_token_expired_at, token_expiry};
