use crate::auth::AuthApi;
use crate::client::ResourceClient;
use crate::commands::{self, CommandOutput};
use crate::config::{Config, TokenStoreKind};
use crate::http::build_client;
use crate::metrics::MetricsClient;
use crate::session::{
  FileSessionStore, KeyringSessionStore, MemorySessionStore, SessionManager, SessionStore,
};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Everything a command needs, wired once per process.
#[derive(Debug, Clone)]
pub struct AdminApp {
  pub session: Arc<SessionManager>,
  pub client: ResourceClient,
  pub metrics: MetricsClient,
}

impl AdminApp {
  pub fn new(http: reqwest::Client, base_url: &str, store: Arc<dyn SessionStore>) -> Self {
    let auth = AuthApi::new(http.clone(), base_url);
    let session = Arc::new(SessionManager::new(store, auth));
    let client = ResourceClient::new(http, base_url, session.clone());
    let metrics = MetricsClient::new(client.clone());
    Self {
      session,
      client,
      metrics,
    }
  }

  pub fn with_timeouts(
    base_url: &str,
    store: Arc<dyn SessionStore>,
    timeout: Duration,
    connect_timeout: Duration,
  ) -> anyhow::Result<Self> {
    let http = build_client(timeout, connect_timeout)?;
    Ok(Self::new(http, base_url, store))
  }
}

pub fn init_logging(directives: &str) {
  let mut filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));
  for noisy in ["hyper=warn", "reqwest=warn", "rustls=warn"] {
    if let Ok(directive) = noisy.parse() {
      filter = filter.add_directive(directive);
    }
  }

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
  let store: Arc<dyn SessionStore> = match config.token_store {
    TokenStoreKind::File => {
      let path = config.state_file_path()?;
      tracing::debug!(path = %path.display(), "using file session store");
      Arc::new(FileSessionStore::open(path)?)
    }
    TokenStoreKind::Keyring => {
      let store = KeyringSessionStore::new();
      if !store.is_available() {
        anyhow::bail!("OS keychain/secret service is unavailable; use --token-store file");
      }
      Arc::new(store)
    }
    TokenStoreKind::Memory => Arc::new(MemorySessionStore::new()),
  };
  Ok(store)
}

async fn start(config: Config) -> anyhow::Result<CommandOutput> {
  let store = open_store(&config)?;
  let app = AdminApp::with_timeouts(
    &config.base_url,
    store,
    config.timeout(),
    config.connect_timeout(),
  )?;
  Ok(commands::execute(&app, config.command).await)
}

pub fn run() -> ExitCode {
  let config = Config::parse();
  init_logging(&config.log_filter);

  let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
    Ok(rt) => rt,
    Err(e) => {
      eprintln!("failed to start async runtime: {e}");
      return ExitCode::FAILURE;
    }
  };

  match runtime.block_on(start(config)) {
    Ok(output) => {
      for line in &output.lines {
        if output.success {
          println!("{line}");
        } else {
          eprintln!("{line}");
        }
      }
      if output.success {
        ExitCode::SUCCESS
      } else {
        ExitCode::FAILURE
      }
    }
    Err(e) => {
      eprintln!("{e:#}");
      ExitCode::FAILURE
    }
  }
}
