use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use monitor_core::{
    update, AlertBatch, Effect, Lifecycle, MonitorPhase, MonitorState, Msg, DEFAULT_POLL_INTERVAL,
};
use monitor_logging::{monitor_error, monitor_info, monitor_warn, set_poll_cycle};
use tokio_util::sync::CancellationToken;

use crate::{
    AtomicFileWriter, Extractor, MonitorError, MonitorOutcome, Notifier, RegistrationSession,
    SessionError, SnapshotStore,
};

#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub poll_interval: Duration,
    /// Directory receiving screenshots taken when the session fails.
    pub diagnostics_dir: PathBuf,
    /// Ring the terminal bell when a seat opens up.
    pub audible_alerts: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            diagnostics_dir: PathBuf::from("."),
            audible_alerts: true,
        }
    }
}

/// Runs one monitor attempt: executes the effects of the core state machine
/// against the browser session, snapshot store and notifier.
pub struct MonitorDriver {
    session: Option<Box<dyn RegistrationSession>>,
    extractor: Box<dyn Extractor>,
    store: SnapshotStore,
    notifier: Arc<dyn Notifier>,
    shutdown: CancellationToken,
    settings: DriverSettings,
    failure: Option<MonitorError>,
}

impl MonitorDriver {
    pub fn new(
        session: Box<dyn RegistrationSession>,
        extractor: Box<dyn Extractor>,
        store: SnapshotStore,
        notifier: Arc<dyn Notifier>,
        shutdown: CancellationToken,
        settings: DriverSettings,
    ) -> Self {
        Self {
            session: Some(session),
            extractor,
            store,
            notifier,
            shutdown,
            settings,
            failure: None,
        }
    }

    /// Drives the session until interrupted or an error ends the attempt.
    /// The browser session is closed on every exit path.
    pub async fn run(mut self) -> Result<MonitorOutcome, MonitorError> {
        monitor_info!("Starting course monitoring...");
        let mut state = MonitorState::new(self.settings.poll_interval);
        let mut queue = VecDeque::new();

        let (next, effects) = update(state, Msg::Start);
        state = next;
        queue.extend(effects);

        while let Some(effect) = queue.pop_front() {
            let Some(msg) = self.execute(effect, &state).await else {
                continue;
            };
            let (next, effects) = update(state, msg);
            state = next;
            if state.phase().is_terminal() {
                queue.clear();
            }
            queue.extend(effects);
        }

        self.release_session().await;

        match state.phase() {
            MonitorPhase::Stopped => {
                monitor_info!("Course monitor stopped after {} polls", state.cycles());
                Ok(MonitorOutcome::Stopped {
                    cycles: state.cycles(),
                })
            }
            MonitorPhase::Failed => Err(self
                .failure
                .take()
                .unwrap_or(MonitorError::Stalled(MonitorPhase::Failed))),
            phase => Err(MonitorError::Stalled(phase)),
        }
    }

    async fn execute(&mut self, effect: Effect, state: &MonitorState) -> Option<Msg> {
        match effect {
            Effect::OpenSession => {
                let shutdown = self.shutdown.clone();
                tokio::select! {
                    msg = self.open_session() => Some(msg),
                    _ = shutdown.cancelled() => Some(Msg::Interrupted),
                }
            }
            Effect::LoadSnapshot => Some(Msg::SnapshotLoaded(self.store.load())),
            Effect::ExtractCourses => {
                if self.shutdown.is_cancelled() {
                    return Some(Msg::Interrupted);
                }
                set_poll_cycle(state.cycles() + 1);
                Some(self.extract_courses().await)
            }
            Effect::DeliverAlert(batch) => {
                self.deliver_alert(&batch).await;
                None
            }
            Effect::PersistSnapshot(snapshot) => {
                match self.store.save(&snapshot) {
                    Ok(path) => monitor_info!("Saved {} course states to {:?}", snapshot.len(), path),
                    Err(err) => monitor_error!("Error saving snapshot {:?}: {}", self.store.path(), err),
                }
                None
            }
            Effect::Sleep(interval) => {
                if let Some(summary) = state.last_cycle() {
                    if !summary.compared {
                        monitor_info!("No previous states available for comparison.");
                    } else if summary.changes == 0 {
                        monitor_info!("No changes across {} courses", summary.courses);
                    }
                }
                monitor_info!("Waiting {} seconds before next check...", interval.as_secs());
                tokio::select! {
                    _ = tokio::time::sleep(interval) => Some(Msg::IntervalElapsed),
                    _ = self.shutdown.cancelled() => Some(Msg::Interrupted),
                }
            }
            Effect::RecoverSession => {
                if self.shutdown.is_cancelled() {
                    return Some(Msg::Interrupted);
                }
                Some(self.recover_session().await)
            }
            Effect::Announce(lifecycle) => {
                self.announce(&lifecycle).await;
                None
            }
            Effect::CaptureDiagnostic { file_name } => {
                self.capture_diagnostic(file_name).await;
                None
            }
            Effect::ReleaseSession => {
                self.release_session().await;
                None
            }
        }
    }

    async fn open_session(&mut self) -> Msg {
        let Some(session) = self.session.as_mut() else {
            return self.fail(MonitorError::Initialization(released()));
        };

        if let Err(err) = session.log_in().await {
            monitor_error!("Login failed: {}", err);
            let msg = Msg::LoginFailed {
                reason: err.to_string(),
                timed_out: err.is_timeout(),
            };
            self.failure = Some(MonitorError::Initialization(err));
            return msg;
        }

        match session.open_registration().await {
            Ok(()) => Msg::SessionOpened,
            Err(err) => {
                monitor_error!("Error navigating to registration: {}", err);
                self.fail(MonitorError::Initialization(err))
            }
        }
    }

    async fn extract_courses(&mut self) -> Msg {
        monitor_info!(
            "Checking courses at {}...",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let Some(session) = self.session.as_mut() else {
            return self.fail(MonitorError::Polling(released()));
        };

        match session.course_page().await {
            Ok(html) => {
                let extraction = self.extractor.extract(&html);
                if !extraction.rejected.is_empty() {
                    monitor_info!("Skipped {} rows", extraction.rejected.len());
                }
                Msg::CoursesExtracted(extraction.courses)
            }
            Err(err) if err.is_timeout() => {
                monitor_warn!("Page refresh timeout, attempting to reinitialize navigation...");
                Msg::PageTimedOut {
                    reason: err.to_string(),
                }
            }
            Err(err) => {
                monitor_error!("An error occurred in monitoring loop: {}", err);
                self.fail(MonitorError::Polling(err))
            }
        }
    }

    async fn recover_session(&mut self) -> Msg {
        let Some(session) = self.session.as_mut() else {
            return self.recovery_failed(released());
        };

        let result = match session.return_home().await {
            Ok(()) => {
                monitor_info!("Reinitializing navigation to the registration page...");
                session.open_registration().await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => Msg::SessionRecovered,
            Err(err) => self.recovery_failed(err),
        }
    }

    fn recovery_failed(&mut self, err: SessionError) -> Msg {
        monitor_error!("Error during navigation reset: {}", err);
        let msg = Msg::RecoveryFailed {
            reason: err.to_string(),
        };
        self.failure = Some(MonitorError::Recovery(err));
        msg
    }

    fn fail(&mut self, err: MonitorError) -> Msg {
        let msg = Msg::Fatal {
            reason: err.to_string(),
        };
        self.failure = Some(err);
        msg
    }

    async fn deliver_alert(&self, batch: &AlertBatch) {
        monitor_info!("=== Changes Detected! ===");
        for change in &batch.changes {
            monitor_info!(
                "Course: {} | Instructor: {} | CRN: {} | Status Change: {} → {}",
                change.label(),
                change.instructor,
                change.crn,
                change.old_status,
                change.new_status
            );
        }
        if batch.escalated {
            monitor_warn!("Seat available on a watched course!");
            if self.settings.audible_alerts {
                ring_bell();
            }
        }
        self.notifier.notify(&batch.text).await;
    }

    async fn announce(&self, lifecycle: &Lifecycle) {
        self.notifier.notify(&lifecycle.message()).await;
    }

    async fn capture_diagnostic(&mut self, file_name: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let png = match session.screenshot().await {
            Ok(png) => png,
            Err(err) => {
                monitor_warn!("Could not capture {}: {}", file_name, err);
                return;
            }
        };
        let writer = AtomicFileWriter::new(self.settings.diagnostics_dir.clone());
        match writer.write(file_name, &png) {
            Ok(path) => monitor_info!("Saved diagnostic screenshot to {:?}", path),
            Err(err) => monitor_warn!("Could not write {}: {}", file_name, err),
        }
    }

    async fn release_session(&mut self) {
        if let Some(session) = self.session.take() {
            match session.close().await {
                Ok(()) => monitor_info!("Browser session closed"),
                Err(err) => monitor_warn!("Browser session close failed: {}", err),
            }
        }
    }
}

fn released() -> SessionError {
    SessionError::new(
        crate::SessionFailure::Driver,
        "browser session already released",
    )
}

fn ring_bell() {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(b"\x07");
    let _ = stdout.flush();
}
