use std::fmt;

use monitor_core::MonitorPhase;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFailure {
    /// The WebDriver endpoint refused or dropped the session.
    Connect,
    /// An element or page condition did not appear in time.
    Timeout,
    MissingElement,
    /// Reading the verification code from the operator failed.
    Prompt,
    Driver,
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionFailure::Connect => write!(f, "webdriver connection failed"),
            SessionFailure::Timeout => write!(f, "timeout"),
            SessionFailure::MissingElement => write!(f, "element not found"),
            SessionFailure::Prompt => write!(f, "verification code prompt failed"),
            SessionFailure::Driver => write!(f, "webdriver error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SessionError {
    pub kind: SessionFailure,
    pub message: String,
}

impl SessionError {
    pub fn new(kind: SessionFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == SessionFailure::Timeout
    }
}

/// Why a monitor attempt ended with an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("failed to start browser session: {0}")]
    Connect(SessionError),
    #[error("failed to initialize monitoring: {0}")]
    Initialization(SessionError),
    #[error("error in monitoring loop: {0}")]
    Polling(SessionError),
    #[error("error during navigation reset: {0}")]
    Recovery(SessionError),
    #[error("monitor halted in phase {0:?}")]
    Stalled(MonitorPhase),
}

impl MonitorError {
    /// Session-level failures are worth a fresh login; a stalled state machine is not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, MonitorError::Stalled(_))
    }

    pub fn session_error(&self) -> Option<&SessionError> {
        match self {
            MonitorError::Connect(err)
            | MonitorError::Initialization(err)
            | MonitorError::Polling(err)
            | MonitorError::Recovery(err) => Some(err),
            MonitorError::Stalled(_) => None,
        }
    }
}

/// How a monitor attempt ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    Stopped { cycles: u64 },
}
