//! Runtime settings, from CLI flags or the environment.

use clap::{Args, Parser};
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::http::BackendConfig;
use crate::consts::{DEFAULT_CACHE_TTL_SECS, DEFAULT_LISTEN_ADDR, DEFAULT_POLL_INTERVAL_MS};
use crate::engine::relay::RelayConfig;
use crate::error::RelayError;

/// Everything needed to reach the task runner and serve its output.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Signed work-intake URL runs are posted to
    #[arg(long, env = "ERRAND_TRIGGER_URL")]
    pub trigger_url: String,

    /// Root of the run status API
    #[arg(long, env = "ERRAND_BASE_URL")]
    pub base_url: String,

    /// Profile that owns the task
    #[arg(long, env = "ERRAND_PROFILE")]
    pub profile: String,

    /// Task name
    #[arg(long = "task", env = "ERRAND_TASK")]
    pub task_name: String,

    /// Delay between status polls, in milliseconds
    #[arg(long, env = "ERRAND_POLL_INTERVAL_MS", default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    pub poll_interval_ms: u64,

    /// Give up on a run after this many seconds (default: never)
    #[arg(long, env = "ERRAND_POLL_TIMEOUT_SECS")]
    pub poll_timeout_secs: Option<u64>,

    /// Session credential sent with every poll
    #[arg(long, env = "ERRAND_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    /// Address the HTTP server binds to
    #[arg(long, env = "ERRAND_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// SQLite path for the response cache (use :memory: for ephemeral)
    #[arg(long, env = "ERRAND_CACHE_DB")]
    pub cache_db: Option<PathBuf>,

    /// Seconds a cached GET response stays fresh
    #[arg(long, env = "ERRAND_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,

    /// Serve every request from the backend
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,
}

/// Parses nothing but the environment and defaults.
#[derive(Parser)]
#[command(name = "errand")]
struct EnvOnly {
    #[command(flatten)]
    settings: Settings,
}

impl Settings {
    /// Settings from `ERRAND_*` variables alone, as if no flags were given.
    pub fn from_env() -> Result<Self, RelayError> {
        EnvOnly::try_parse_from(["errand"])
            .map(|parsed| parsed.settings)
            .map_err(|e| RelayError::Config(e.to_string()))
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), RelayError> {
        for (name, value) in [
            ("trigger-url", &self.trigger_url),
            ("base-url", &self.base_url),
            ("profile", &self.profile),
            ("task", &self.task_name),
        ] {
            if value.trim().is_empty() {
                return Err(RelayError::Config(format!("--{name} must not be empty")));
            }
        }

        for (name, value) in [("trigger-url", &self.trigger_url), ("base-url", &self.base_url)] {
            Url::parse(value)
                .map_err(|e| RelayError::Config(format!("--{name} is not a valid URL: {e}")))?;
        }

        if self.poll_interval_ms == 0 {
            return Err(RelayError::Config(
                "--poll-interval-ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            trigger_url: self.trigger_url.clone(),
            base_url: self.base_url.clone(),
            profile: self.profile.clone(),
            task_name: self.task_name.clone(),
            session_token: self.session_token.clone().filter(|t| !t.is_empty()),
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            poll_timeout: self.poll_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
