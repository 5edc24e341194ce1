use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod backend;
pub mod event;
pub mod planner;
pub mod store;
pub mod web;

use backend::{BackendError, BackendKind};
use event::{Event, ValidationError};
use planner::Action;

/// Result type used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by all fallible operations within this crate.
///
/// The `Display` output of validation and remote errors is meant to be shown to the user as is.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A backend call made on behalf of a user action failed.
    #[error("{}", .action.failure_message())]
    Remote {
        action: Action,
        #[source]
        source: BackendError,
    },
}

/// Event backend configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct BackendConfig {
    /// Which backend stores the events.
    pub kind: BackendKind,
    /// Base URL of the REST backend, without the `/events` path.
    pub base_url: String,
    /// Request timeout for backend calls in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Initial events of the in-memory backend.
    #[serde(default)]
    pub events: Vec<Event>,
}

impl BackendConfig {
    /// The request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// Web frontend configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ServerConfig {
    /// Address on which the web server will listen.
    pub listen_addr: SocketAddr,
    /// Automatically reload templates when they are modified.
    pub template_autoreload: bool,
    /// Path to the template directory.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

/// Global application configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct AppConfig {
    /// Server configuration section.
    pub server: ServerConfig,
    /// Backend configuration section.
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Loads the application configuration from files in the `config/` directory and environment
    /// variables.
    pub fn load() -> Result<AppConfig> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        log::info!("loading configuration using {} environment", app_env);

        let config = Config::builder()
            // Configuration defaults from `config/default.toml`.
            .add_source(File::with_name("config/default"))
            // Optional environment specific config overrides, e.g. `config/production.toml`.
            .add_source(File::with_name(&format!("config/{}", app_env)).required(false))
            // Optional local config overrides from `config/local.toml` (on .gitignore).
            .add_source(File::with_name("config/local").required(false))
            // Config from environment variables.
            .add_source(Environment::default().separator("__"))
            // Config from environment variables prefixed with `TERMINE_`.
            .add_source(
                Environment::with_prefix("TERMINE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        log::debug!("loaded configuration: {:?}", config);

        Ok(config)
    }
}
