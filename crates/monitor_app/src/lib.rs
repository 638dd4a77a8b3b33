//! Process wiring for the `course-monitor` binary: command line, environment
//! configuration, the verification-code prompt and process-level retry.
pub mod cli;
pub mod config;
pub mod prompt;
pub mod retry;
pub mod runtime;

pub use cli::Cli;
pub use config::{load_env_file, ConfigError, MonitorConfig};
pub use prompt::TtyPrompt;
pub use retry::{run_monitor, run_with_retries, RetryPolicy, RunError};
pub use runtime::run_detached;
