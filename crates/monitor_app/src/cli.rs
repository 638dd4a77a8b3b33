//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Watches the registration timetable and reports seat changes to Telegram.
#[derive(Parser, Debug, Clone)]
#[command(name = "course-monitor", version, about, long_about = None)]
pub struct Cli {
    /// Seconds to wait between timetable checks
    #[arg(long, env = "COURSE_MONITOR_INTERVAL", default_value_t = 600)]
    pub interval: u64,

    /// Snapshot file holding the last observed course states
    #[arg(
        long,
        env = "COURSE_MONITOR_STATE_FILE",
        default_value = "course_states.json",
        value_hint = clap::ValueHint::FilePath
    )]
    pub state_file: PathBuf,

    /// WebDriver endpoint (chromedriver or a Selenium server)
    #[arg(long, env = "COURSE_MONITOR_WEBDRIVER_URL", default_value = "http://localhost:4444")]
    pub webdriver_url: String,

    /// Term code selected on the registration page
    #[arg(long, env = "COURSE_MONITOR_TERM", default_value = "559")]
    pub term: String,

    /// Total monitor attempts before giving up
    #[arg(long, env = "COURSE_MONITOR_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Seconds to wait before a new attempt
    #[arg(long, env = "COURSE_MONITOR_RETRY_BACKOFF", default_value_t = 60)]
    pub retry_backoff: u64,

    /// Dotenv file with credentials (default: ./.env when present)
    #[arg(long, env = "COURSE_MONITOR_ENV_FILE", value_hint = clap::ValueHint::FilePath)]
    pub env_file: Option<PathBuf>,

    /// Directory for failure screenshots
    #[arg(
        long,
        env = "COURSE_MONITOR_DIAGNOSTICS_DIR",
        default_value = ".",
        value_hint = clap::ValueHint::DirPath
    )]
    pub diagnostics_dir: PathBuf,

    /// Also write the log to this file
    #[arg(long, env = "COURSE_MONITOR_LOG_FILE", value_hint = clap::ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, env = "COURSE_MONITOR_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Show the browser window
    #[arg(long, env = "COURSE_MONITOR_NO_HEADLESS")]
    pub no_headless: bool,

    /// Do not ring the terminal bell when a seat opens
    #[arg(long, env = "COURSE_MONITOR_QUIET")]
    pub quiet: bool,
}
