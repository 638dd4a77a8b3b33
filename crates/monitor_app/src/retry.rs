//! Process-level retry around whole monitor attempts.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use monitor_core::Lifecycle;
use monitor_engine::{
    CodePrompt, MonitorDriver, MonitorError, MonitorOutcome, Notifier,
    RegistrationPageExtractor, SnapshotStore, WebDriverSession,
};
use monitor_logging::{monitor_error, monitor_info, monitor_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::MonitorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, including the first.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("course monitor stopped after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: MonitorError,
    },
    #[error("course monitor cannot continue: {0}")]
    Fatal(#[source] MonitorError),
}

/// Runs `attempt` until it succeeds, fails with a non-retryable error, or the
/// policy runs out of attempts. An interrupt during backoff stops cleanly.
pub async fn run_with_retries<F, Fut>(
    policy: RetryPolicy,
    notifier: &dyn Notifier,
    shutdown: &CancellationToken,
    mut attempt: F,
) -> Result<MonitorOutcome, RunError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<MonitorOutcome, MonitorError>>,
{
    let mut number = 1;
    loop {
        let err = match attempt(number).await {
            Ok(outcome) => return Ok(outcome),
            Err(err) => err,
        };

        if !err.is_retryable() {
            monitor_error!("Attempt {} failed and cannot be retried: {}", number, err);
            return Err(RunError::Fatal(err));
        }
        if number >= policy.max_attempts {
            monitor_error!("Maximum retries reached. Exiting...");
            notifier.notify(&Lifecycle::RetriesExhausted.message()).await;
            return Err(RunError::RetriesExhausted {
                attempts: number,
                last: err,
            });
        }

        monitor_warn!(
            "Attempt {}/{} failed: {}. Retrying in {} seconds...",
            number,
            policy.max_attempts,
            err,
            policy.backoff.as_secs()
        );
        tokio::select! {
            _ = tokio::time::sleep(policy.backoff) => {}
            _ = shutdown.cancelled() => {
                monitor_info!("Interrupted while waiting to retry");
                notifier.notify(&Lifecycle::StoppedByUser.message()).await;
                return Ok(MonitorOutcome::Stopped { cycles: 0 });
            }
        }
        number += 1;
    }
}

/// Runs the monitor against a live browser session with process-level retry.
pub async fn run_monitor(
    config: &MonitorConfig,
    notifier: Arc<dyn Notifier>,
    prompt: Arc<dyn CodePrompt>,
    shutdown: CancellationToken,
) -> Result<MonitorOutcome, RunError> {
    run_with_retries(config.retry, notifier.as_ref(), &shutdown, |number| {
        let notifier = Arc::clone(&notifier);
        let prompt = Arc::clone(&prompt);
        let shutdown = shutdown.clone();
        async move {
            monitor_info!("Monitor attempt {}", number);
            let connect = WebDriverSession::connect(
                config.session.clone(),
                config.credentials.clone(),
                prompt,
            );
            let session = tokio::select! {
                session = connect => session.map_err(MonitorError::Connect)?,
                _ = shutdown.cancelled() => {
                    notifier.notify(&Lifecycle::StoppedByUser.message()).await;
                    return Ok(MonitorOutcome::Stopped { cycles: 0 });
                }
            };

            MonitorDriver::new(
                Box::new(session),
                Box::new(RegistrationPageExtractor),
                SnapshotStore::new(config.state_file.clone()),
                notifier,
                shutdown,
                config.driver.clone(),
            )
            .run()
            .await
        }
    })
    .await
}
