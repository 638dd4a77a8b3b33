//! Assembles the monitor configuration from CLI flags and the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use monitor_engine::{Credentials, DriverSettings, SessionSettings, TelegramSettings};
use thiserror::Error;
use url::Url;

use crate::cli::Cli;
use crate::retry::RetryPolicy;

pub const EMAIL_VAR: &str = "MOHAWK_EMAIL";
pub const PASSWORD_VAR: &str = "MOHAWK_PASSWORD";
pub const TOKEN_VAR: &str = "TELEGRAM_TOKEN";
pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("invalid WebDriver URL '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("WebDriver URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("{name} must be greater than zero")]
    NotPositive { name: &'static str },
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

/// Loads a dotenv file into the process environment.
///
/// A file that does not exist is not an error. Returns whether a file was read.
pub fn load_env_file(path: Option<&Path>) -> Result<bool, ConfigError> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|_| true),
        None => dotenvy::dotenv().map(|_| true),
    };
    loaded.or_else(|err| match err {
        dotenvy::Error::Io(_) => Ok(false),
        other => Err(ConfigError::EnvFile(other)),
    })
}

/// Everything the process needs to run the monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub credentials: Credentials,
    pub telegram: TelegramSettings,
    pub session: SessionSettings,
    pub driver: DriverSettings,
    pub state_file: PathBuf,
    pub retry: RetryPolicy,
}

impl MonitorConfig {
    /// Builds the configuration; `lookup` resolves environment variables.
    pub fn from_cli<F>(cli: &Cli, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let credentials = Credentials {
            email: require(EMAIL_VAR)?,
            password: require(PASSWORD_VAR)?,
        };
        let telegram = TelegramSettings::new(require(TOKEN_VAR)?, require(CHAT_ID_VAR)?);

        if cli.interval == 0 {
            return Err(ConfigError::NotPositive { name: "interval" });
        }
        if cli.max_retries == 0 {
            return Err(ConfigError::NotPositive {
                name: "max-retries",
            });
        }

        let session = SessionSettings {
            webdriver_url: validate_webdriver_url(&cli.webdriver_url)?,
            headless: !cli.no_headless,
            term: cli.term.clone(),
            ..SessionSettings::default()
        };

        let driver = DriverSettings {
            poll_interval: Duration::from_secs(cli.interval),
            diagnostics_dir: cli.diagnostics_dir.clone(),
            audible_alerts: !cli.quiet,
        };

        Ok(Self {
            credentials,
            telegram,
            session,
            driver,
            state_file: cli.state_file.clone(),
            retry: RetryPolicy {
                max_attempts: cli.max_retries,
                backoff: Duration::from_secs(cli.retry_backoff),
            },
        })
    }
}

fn validate_webdriver_url(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
