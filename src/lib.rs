mod app;
pub mod auth;
pub mod client;
pub mod commands;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod metrics;
mod redact;
pub mod render;
pub mod screens;
pub mod session;
pub mod types;

pub use app::{init_logging, AdminApp};

pub fn run() -> std::process::ExitCode {
    app::run()
}
