use crate::http::DEFAULT_BASE_URL;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const STATE_RELATIVE_PATH: &str = ".verlo-admin/session.json";

#[derive(Debug, Error, Clone, Copy)]
pub enum ConfigError {
    #[error("HOME is not set; pass --state-file or set VERLO_STATE_FILE")]
    HomeMissing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TokenStoreKind {
    /// JSON file on disk
    File,
    /// OS keychain / secret service
    Keyring,
    /// Nothing persisted; useful for one-off scripted calls
    Memory,
}

#[derive(Clone, Debug, Parser)]
#[command(name = "verlo-admin", version, about = "Verlo administration console", long_about = None)]
pub struct Config {
    /// Base URL of the Verlo API
    #[arg(long, env = "VERLO_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Where the session tokens are kept
    #[arg(long, env = "VERLO_TOKEN_STORE", value_enum, default_value_t = TokenStoreKind::File)]
    pub token_store: TokenStoreKind,

    /// Session file used by the file token store
    #[arg(long, env = "VERLO_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Whole-request timeout in seconds
    #[arg(long, env = "VERLO_TIMEOUT_SECS", default_value_t = 40)]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[arg(long, env = "VERLO_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Log filter directives, e.g. `verlo_admin_lib=debug`
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    /// `--state-file`, else `$VERLO_HOME/session.json`, else
    /// `$HOME/.verlo-admin/session.json`.
    pub fn state_file_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.state_file {
            return Ok(path.clone());
        }
        if let Ok(verlo_home) = std::env::var("VERLO_HOME") {
            let trimmed = verlo_home.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed).join("session.json"));
            }
        }
        let home = std::env::var("HOME").map_err(|_| ConfigError::HomeMissing)?;
        Ok(PathBuf::from(home).join(STATE_RELATIVE_PATH))
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long, short)]
        username: String,
        #[arg(long, short, env = "VERLO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List one page of a collection
    List {
        /// countries, regions, transport-types, package-types, id-types, users
        kind: String,
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Regions only: restrict to one country
        #[arg(long)]
        country: Option<String>,
    },
    /// Create a record from a JSON body
    Create {
        kind: String,
        #[arg(long)]
        json: String,
    },
    /// Replace a record with a JSON body
    Update {
        kind: String,
        id: String,
        #[arg(long)]
        json: String,
    },
    /// Partially update a record with a JSON body
    Patch {
        kind: String,
        id: String,
        #[arg(long)]
        json: String,
    },
    /// Delete a record
    Delete { kind: String, id: String },
    /// Show one user
    User { id: String },
    /// Set a user's identity verification status
    Identity {
        id: String,
        /// pending, completed or rejected
        status: String,
    },
    /// Dashboard summary metrics, or the reporting set with --reporting
    Metrics {
        #[arg(long)]
        reporting: bool,
    },
    /// One named metric, e.g. trips_per_day
    Metric { name: String },
    /// Combined dashboard data
    Dashboard,
}
