use std::collections::VecDeque;
use std::fs;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use monitor_core::{CourseRecord, CourseStatus, SnapshotMap};
use monitor_engine::{
    DriverSettings, MonitorDriver, MonitorError, MonitorOutcome, Notifier,
    RegistrationPageExtractor, RegistrationSession, SessionError, SessionFailure, SnapshotStore,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(monitor_logging::initialize_for_tests);
}

type CallLog = Arc<Mutex<Vec<&'static str>>>;

/// Serves scripted timetable pages; cancels `shutdown` once the last page is served.
struct ScriptedSession {
    pages: VecDeque<Result<String, SessionError>>,
    login: Option<SessionError>,
    /// Login waits forever, like an operator who never types the code.
    hang_login: bool,
    return_home: Option<SessionError>,
    calls: CallLog,
    shutdown: CancellationToken,
}

impl ScriptedSession {
    fn new(
        pages: Vec<Result<String, SessionError>>,
        calls: CallLog,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pages: pages.into(),
            login: None,
            hang_login: false,
            return_home: None,
            calls,
            shutdown,
        }
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl RegistrationSession for ScriptedSession {
    async fn log_in(&mut self) -> Result<(), SessionError> {
        self.record("log_in");
        if self.hang_login {
            std::future::pending::<()>().await;
        }
        match self.login.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn open_registration(&mut self) -> Result<(), SessionError> {
        self.record("open_registration");
        Ok(())
    }

    async fn return_home(&mut self) -> Result<(), SessionError> {
        self.record("return_home");
        match self.return_home.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn course_page(&mut self) -> Result<String, SessionError> {
        self.record("course_page");
        let page = self.pages.pop_front().unwrap_or_else(|| {
            Err(SessionError::new(SessionFailure::Driver, "script exhausted"))
        });
        if self.pages.is_empty() {
            self.shutdown.cancel();
        }
        page
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, SessionError> {
        self.record("screenshot");
        Ok(b"\x89PNG".to_vec())
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        self.record("close");
        Ok(())
    }
}

#[derive(Default, Clone)]
struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }
}

fn timetable(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(crn, status)| {
            format!(
                "<tr class=\"RegPageHeader\"><td></td><td><a>{status}</a></td><td>{crn}</td>\
                 <td>COMP</td><td>10062</td><td><a>Programming</a></td><td><a>Fennell</a></td>\
                 <td><a>Jan 08 - Apr 19</a></td><td>Ada Lovelace</td></tr>"
            )
        })
        .collect();
    format!("<html><body><table><tbody>{body}</tbody></table></body></html>")
}

fn course(crn: &str, status: CourseStatus) -> CourseRecord {
    CourseRecord {
        status,
        crn: crn.to_string(),
        subject: "COMP".to_string(),
        course_num: "10062".to_string(),
        title: "Programming".to_string(),
        campus: "Fennell".to_string(),
        dates: "Jan 08 - Apr 19".to_string(),
        instructor: "Ada Lovelace".to_string(),
    }
}

fn timeout() -> SessionError {
    SessionError::new(SessionFailure::Timeout, "timetable refresh: timed out")
}

struct Harness {
    temp: TempDir,
    calls: CallLog,
    notifier: RecordingNotifier,
    shutdown: CancellationToken,
}

impl Harness {
    fn new() -> Self {
        init_logging();
        Self {
            temp: TempDir::new().unwrap(),
            calls: CallLog::default(),
            notifier: RecordingNotifier::default(),
            shutdown: CancellationToken::new(),
        }
    }

    fn store(&self) -> SnapshotStore {
        SnapshotStore::new(self.temp.path().join("course_states.json"))
    }

    fn session(&self, pages: Vec<Result<String, SessionError>>) -> ScriptedSession {
        ScriptedSession::new(pages, self.calls.clone(), self.shutdown.clone())
    }

    fn driver(&self, session: ScriptedSession, store: SnapshotStore) -> MonitorDriver {
        MonitorDriver::new(
            Box::new(session),
            Box::new(RegistrationPageExtractor),
            store,
            Arc::new(self.notifier.clone()),
            self.shutdown.clone(),
            DriverSettings {
                poll_interval: Duration::from_secs(600),
                diagnostics_dir: self.temp.path().join("diagnostics"),
                audible_alerts: false,
            },
        )
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn close_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == "close").count()
    }
}

#[tokio::test(start_paused = true)]
async fn cold_start_records_without_alerting() {
    let h = Harness::new();
    let session = h.session(vec![Ok(timetable(&[("41300", "Open")]))]);

    let outcome = h.driver(session, h.store()).run().await.unwrap();

    assert_eq!(outcome, MonitorOutcome::Stopped { cycles: 1 });
    assert_eq!(
        h.notifier.messages(),
        vec![
            "Course Monitoring Started Successfully".to_string(),
            "ℹ️ Course monitor stopped by user".to_string(),
        ]
    );
    let saved = h.store().load();
    assert_eq!(saved.get("41300").unwrap().status, CourseStatus::Available);
    assert_eq!(h.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn warm_start_alerts_when_seat_opens() {
    let h = Harness::new();
    let previous: SnapshotMap = vec![course("41300", CourseStatus::Full)].into_iter().collect();
    h.store().save(&previous).unwrap();
    let session = h.session(vec![Ok(timetable(&[("41300", "Open")]))]);

    h.driver(session, h.store()).run().await.unwrap();

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[1].starts_with("🚨 COURSE AVAILABLE! 🚨"));
    assert!(messages[1].contains("Status: Full → Available"));
}

#[tokio::test(start_paused = true)]
async fn later_cycle_compares_against_previous_cycle() {
    let h = Harness::new();
    let previous: SnapshotMap = vec![course("41300", CourseStatus::Full)].into_iter().collect();
    h.store().save(&previous).unwrap();
    let session = h.session(vec![
        Ok(timetable(&[("41300", "Section Full")])),
        Ok(timetable(&[("41300", "Section Full"), ("41999", "Open")])),
    ]);

    let outcome = h.driver(session, h.store()).run().await.unwrap();

    assert_eq!(outcome, MonitorOutcome::Stopped { cycles: 2 });
    let alerts: Vec<String> = h
        .notifier
        .messages()
        .into_iter()
        .filter(|m| m.contains("Course Changes Detected"))
        .collect();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("CRN: 41999"));
    assert!(alerts[0].contains("Status: Not tracked → Available"));
    assert!(!alerts[0].contains("CRN: 41300"));
    assert_eq!(h.store().load().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn page_timeout_recovers_without_new_login() {
    let h = Harness::new();
    let session = h.session(vec![Err(timeout()), Ok(timetable(&[("41300", "Open")]))]);

    let outcome = h.driver(session, h.store()).run().await.unwrap();

    assert_eq!(outcome, MonitorOutcome::Stopped { cycles: 1 });
    assert_eq!(
        h.calls(),
        vec![
            "log_in",
            "open_registration",
            "course_page",
            "return_home",
            "open_registration",
            "course_page",
            "close",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_recovery_ends_attempt_with_diagnostic() {
    let h = Harness::new();
    let mut session = h.session(vec![Err(timeout()), Ok(timetable(&[]))]);
    session.return_home = Some(SessionError::new(
        SessionFailure::MissingElement,
        "home page: no Registration link",
    ));

    let err = h.driver(session, h.store()).run().await.unwrap_err();

    assert!(matches!(err, MonitorError::Recovery(_)));
    assert!(err.is_retryable());
    let messages = h.notifier.messages();
    assert!(messages
        .last()
        .unwrap()
        .starts_with("⚠️ Error during navigation reset:"));
    assert!(h
        .temp
        .path()
        .join("diagnostics")
        .join("navigation_error.png")
        .exists());
    assert_eq!(h.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn login_timeout_is_initialization_error() {
    let h = Harness::new();
    let mut session = h.session(vec![Ok(timetable(&[]))]);
    session.login = Some(SessionError::new(
        SessionFailure::Timeout,
        "password: timed out",
    ));

    let err = h.driver(session, h.store()).run().await.unwrap_err();

    assert!(matches!(err, MonitorError::Initialization(_)));
    assert_eq!(
        h.notifier.messages(),
        vec!["⚠️ Login timeout error: timeout: password: timed out".to_string()]
    );
    assert!(h
        .temp
        .path()
        .join("diagnostics")
        .join("timeout_error.png")
        .exists());
    assert_eq!(h.calls(), vec!["log_in", "screenshot", "close"]);
}

#[tokio::test(start_paused = true)]
async fn driver_error_mid_poll_fails_attempt() {
    let h = Harness::new();
    let session = h.session(vec![
        Err(SessionError::new(SessionFailure::Driver, "session deleted")),
        Ok(timetable(&[])),
    ]);

    let err = h.driver(session, h.store()).run().await.unwrap_err();

    assert!(matches!(err, MonitorError::Polling(_)));
    assert!(h
        .notifier
        .messages()
        .last()
        .unwrap()
        .starts_with("⚠️ Error in course monitor:"));
    assert_eq!(h.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unwritable_snapshot_still_updates_baseline() {
    let h = Harness::new();
    let blocker = h.temp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();
    let store = SnapshotStore::new(blocker.join("course_states.json"));
    let session = h.session(vec![
        Ok(timetable(&[("41300", "Section Full")])),
        Ok(timetable(&[("41300", "Open")])),
    ]);

    let outcome = h.driver(session, store).run().await.unwrap();

    assert_eq!(outcome, MonitorOutcome::Stopped { cycles: 2 });
    assert!(h
        .notifier
        .messages()
        .iter()
        .any(|m| m.contains("Status: Full → Available")));
}

#[tokio::test(start_paused = true)]
async fn interrupt_before_polling_stops_cleanly() {
    let h = Harness::new();
    h.shutdown.cancel();
    let session = h.session(vec![Ok(timetable(&[]))]);

    let outcome = h.driver(session, h.store()).run().await.unwrap();

    assert_eq!(outcome, MonitorOutcome::Stopped { cycles: 0 });
    assert_eq!(
        h.notifier.messages().last().map(String::as_str),
        Some("ℹ️ Course monitor stopped by user")
    );
    assert!(!h.calls().contains(&"course_page"));
    assert_eq!(h.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn interrupt_preempts_unanswered_login() {
    let h = Harness::new();
    let mut session = h.session(vec![Ok(timetable(&[]))]);
    session.hang_login = true;
    let interrupt = h.shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        interrupt.cancel();
    });

    let outcome = h.driver(session, h.store()).run().await.unwrap();

    assert_eq!(outcome, MonitorOutcome::Stopped { cycles: 0 });
    assert_eq!(
        h.notifier.messages(),
        vec!["ℹ️ Course monitor stopped by user".to_string()]
    );
    assert_eq!(h.calls(), vec!["log_in", "close"]);
}
