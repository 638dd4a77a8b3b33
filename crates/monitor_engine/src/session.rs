use std::io;
use std::time::Duration;

use crate::SessionError;

/// Portal login credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of the one-time verification code during login.
pub trait CodePrompt: Send + Sync {
    fn read_code(&self, message: &str) -> io::Result<String>;
}

/// Addresses on the student portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalUrls {
    pub login: String,
    pub home: String,
    pub registration: String,
}

impl Default for PortalUrls {
    fn default() -> Self {
        Self {
            login: "https://mymohawk.mohawkcollege.ca/".to_string(),
            home: "https://mymohawk.mohawkcollege.ca/mymohawk-college/Home".to_string(),
            registration: "https://mymohawk.mohawkcollege.ca/mymohawk-college/Registration"
                .to_string(),
        }
    }
}

impl PortalUrls {
    /// URL fragment that proves the login redirect landed on the home page.
    pub fn home_marker(&self) -> &str {
        self.home
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.home)
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub element_timeout: Duration,
    /// Wait for steps that may legitimately be absent (2FA method choice, "stay signed in").
    pub optional_step_timeout: Duration,
    pub poll_every: Duration,
    pub transition_pause: Duration,
    pub portal: PortalUrls,
    /// Term code clicked on the term selection page.
    pub term: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
            element_timeout: Duration::from_secs(120),
            optional_step_timeout: Duration::from_secs(15),
            poll_every: Duration::from_millis(500),
            transition_pause: Duration::from_secs(2),
            portal: PortalUrls::default(),
            term: "559".to_string(),
        }
    }
}

impl SessionSettings {
    /// Chrome capabilities for the WebDriver new-session request.
    pub fn capabilities(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut args = vec!["--no-sandbox", "--disable-dev-shm-usage", "--disable-gpu"];
        if self.headless {
            args.push("--headless");
        }

        let mut caps = serde_json::Map::new();
        caps.insert("browserName".to_string(), serde_json::json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({ "args": args }),
        );
        caps
    }
}

/// A logged-in browser session on the registration portal.
///
/// Exactly one exists per monitor attempt; `close` consumes it.
#[async_trait::async_trait]
pub trait RegistrationSession: Send {
    /// Runs the portal sign-in including second-factor verification.
    async fn log_in(&mut self) -> Result<(), SessionError>;

    /// Walks from the portal to the timetable page for the configured term.
    async fn open_registration(&mut self) -> Result<(), SessionError>;

    /// Returns to the portal home page without signing in again.
    async fn return_home(&mut self) -> Result<(), SessionError>;

    /// Reloads the timetable page and returns its HTML.
    async fn course_page(&mut self) -> Result<String, SessionError>;

    async fn screenshot(&mut self) -> Result<Vec<u8>, SessionError>;

    async fn close(self: Box<Self>) -> Result<(), SessionError>;
}
