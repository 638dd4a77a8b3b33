use std::sync::Arc;
use std::time::Instant;

use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use monitor_logging::{monitor_info, monitor_warn};

use crate::{
    CodePrompt, Credentials, RegistrationSession, SessionError, SessionFailure, SessionSettings,
};

const EMAIL_INPUT: &str = "//input[@type='email'] | //input[@name='loginfmt']";
const SUBMIT_BUTTON: &str = "//input[@type='submit'] | //input[@id='idSIButton9']";
const PASSWORD_INPUT: &str = "//input[@type='password'] | //input[@name='passwd']";
const TEXT_METHOD_OPTION: &str =
    "//div[contains(text(), 'Text')] | //button[contains(text(), 'Text')]";
const CODE_INPUT: &str = "//input[@name='otc'] | //input[contains(@aria-label, 'Enter code')]";
const VERIFY_BUTTON: &str = "//input[@type='submit'] | //button[contains(text(), 'Verify')] | //input[@id='idSubmit_SAOTCC_Continue']";
const STAY_SIGNED_IN: &str = "//input[@id='idSIButton9'] | //input[@value='Yes']";
const TIMETABLE_LINK: &str = "//a[contains(@href, 'wwskregs.P_WebRegs')]";
const CONFIRM_BUTTON: &str = "//input[@type='submit'][@value='Submit to Confirm']";
const CONTINUE_BUTTON: &str = "//input[@type='submit'][@value='CONTINUE']";
const HOME_REGISTRATION_LINK: &str = "//a[contains(text(), 'Registration')]";
const COURSE_ROWS: &str = "//tr[contains(@class, 'RegPageHeader')]";

const CODE_PROMPT: &str = "Enter the 2FA code sent to your phone: ";

/// Registration session driven through a WebDriver endpoint (chromedriver).
pub struct WebDriverSession {
    client: Client,
    settings: SessionSettings,
    credentials: Credentials,
    prompt: Arc<dyn CodePrompt>,
}

impl WebDriverSession {
    pub async fn connect(
        settings: SessionSettings,
        credentials: Credentials,
        prompt: Arc<dyn CodePrompt>,
    ) -> Result<Self, SessionError> {
        monitor_info!("Starting browser session via {}", settings.webdriver_url);
        let mut builder = ClientBuilder::native();
        builder.capabilities(settings.capabilities());
        let client = builder
            .connect(&settings.webdriver_url)
            .await
            .map_err(|err| SessionError::new(SessionFailure::Connect, err.to_string()))?;

        Ok(Self {
            client,
            settings,
            credentials,
            prompt,
        })
    }

    async fn wait_for(&self, step: &str, xpath: &str) -> Result<Element, SessionError> {
        self.wait_within(step, xpath, self.settings.element_timeout).await
    }

    async fn wait_within(
        &self,
        step: &str,
        xpath: &str,
        timeout: std::time::Duration,
    ) -> Result<Element, SessionError> {
        self.client
            .wait()
            .at_most(timeout)
            .every(self.settings.poll_every)
            .for_element(Locator::XPath(xpath))
            .await
            .map_err(|err| command_error(step, err))
    }

    async fn click(&self, step: &str, xpath: &str) -> Result<(), SessionError> {
        let element = self.wait_for(step, xpath).await?;
        element.click().await.map_err(|err| command_error(step, err))
    }

    async fn fill(&self, step: &str, xpath: &str, value: &str) -> Result<(), SessionError> {
        let element = self.wait_for(step, xpath).await?;
        element.clear().await.map_err(|err| command_error(step, err))?;
        element
            .send_keys(value)
            .await
            .map_err(|err| command_error(step, err))
    }

    async fn goto(&self, step: &str, url: &str) -> Result<(), SessionError> {
        self.client
            .goto(url)
            .await
            .map_err(|err| command_error(step, err))
    }

    async fn pause(&self) {
        tokio::time::sleep(self.settings.transition_pause).await;
    }

    async fn wait_for_home_redirect(&self) -> Result<(), SessionError> {
        let marker = self.settings.portal.home_marker().to_string();
        let started = Instant::now();
        loop {
            let url = self
                .client
                .current_url()
                .await
                .map_err(|err| command_error("login redirect", err))?;
            if url.as_str().contains(&marker) {
                return Ok(());
            }
            if started.elapsed() >= self.settings.element_timeout {
                return Err(SessionError::new(
                    SessionFailure::Timeout,
                    format!("login redirect: still at {url}"),
                ));
            }
            tokio::time::sleep(self.settings.poll_every).await;
        }
    }

    /// Waits for the timetable to open in a new window and switches to the newest one.
    async fn switch_to_newest_window(&self) -> Result<(), SessionError> {
        let started = Instant::now();
        loop {
            let mut windows = self
                .client
                .windows()
                .await
                .map_err(|err| command_error("timetable window", err))?;
            if windows.len() > 1 {
                if let Some(newest) = windows.pop() {
                    return self
                        .client
                        .switch_to_window(newest)
                        .await
                        .map_err(|err| command_error("timetable window", err));
                }
            }
            if started.elapsed() >= self.settings.element_timeout {
                return Err(SessionError::new(
                    SessionFailure::Timeout,
                    "timetable window: no new window opened",
                ));
            }
            tokio::time::sleep(self.settings.poll_every).await;
        }
    }

    async fn read_verification_code(&self) -> Result<String, SessionError> {
        let prompt = self.prompt.clone();
        let code = tokio::task::spawn_blocking(move || prompt.read_code(CODE_PROMPT))
            .await
            .map_err(|err| SessionError::new(SessionFailure::Prompt, err.to_string()))?
            .map_err(|err| SessionError::new(SessionFailure::Prompt, err.to_string()))?;
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(SessionError::new(
                SessionFailure::Prompt,
                "empty verification code",
            ));
        }
        Ok(code)
    }
}

#[async_trait::async_trait]
impl RegistrationSession for WebDriverSession {
    async fn log_in(&mut self) -> Result<(), SessionError> {
        monitor_info!("Step 1: Navigating to portal login page...");
        let login_url = self.settings.portal.login.clone();
        self.goto("login page", &login_url).await?;

        monitor_info!("Step 2: Entering email...");
        self.fill("email", EMAIL_INPUT, &self.credentials.email).await?;
        self.click("email next", SUBMIT_BUTTON).await?;
        self.pause().await;

        monitor_info!("Step 3: Entering password...");
        self.fill("password", PASSWORD_INPUT, &self.credentials.password)
            .await?;
        self.click("sign in", SUBMIT_BUTTON).await?;
        self.pause().await;

        monitor_info!("Step 4: Handling 2FA method selection...");
        match self
            .wait_within(
                "2fa method",
                TEXT_METHOD_OPTION,
                self.settings.optional_step_timeout,
            )
            .await
        {
            Ok(option) => {
                option
                    .click()
                    .await
                    .map_err(|err| command_error("2fa method", err))?;
                monitor_info!("Selected text verification option");
            }
            Err(_) => monitor_info!("No 2FA method selection found, continuing to code entry..."),
        }

        monitor_info!("Step 5: Entering 2FA code...");
        self.wait_for("verification code", CODE_INPUT).await?;
        let code = self.read_verification_code().await?;
        self.fill("verification code", CODE_INPUT, &code).await?;
        self.click("verify", VERIFY_BUTTON).await?;

        monitor_info!("Step 6: Handling 'Stay signed in' prompt...");
        match self
            .wait_within(
                "stay signed in",
                STAY_SIGNED_IN,
                self.settings.optional_step_timeout,
            )
            .await
        {
            Ok(button) => button
                .click()
                .await
                .map_err(|err| command_error("stay signed in", err))?,
            Err(_) => monitor_info!("No 'Stay signed in' prompt found, continuing..."),
        }

        monitor_info!("Step 7: Waiting for successful login redirect...");
        self.wait_for_home_redirect().await?;
        monitor_info!("Successfully logged in!");
        Ok(())
    }

    async fn open_registration(&mut self) -> Result<(), SessionError> {
        let registration_url = self.settings.portal.registration.clone();
        self.goto("registration page", &registration_url).await?;
        self.click("timetable link", TIMETABLE_LINK).await?;
        self.switch_to_newest_window().await?;
        self.click("submit to confirm", CONFIRM_BUTTON).await?;

        let term_span = format!(
            "//span[@class='textLargeCentered'][text()='{}']",
            self.settings.term
        );
        self.click("term selection", &term_span).await?;
        self.click("continue", CONTINUE_BUTTON).await?;

        monitor_info!("Successfully navigated through all registration steps!");
        Ok(())
    }

    async fn return_home(&mut self) -> Result<(), SessionError> {
        monitor_info!("Navigating back to the home page...");
        let home_url = self.settings.portal.home.clone();
        self.goto("home page", &home_url).await?;
        self.wait_for("home page", HOME_REGISTRATION_LINK).await?;
        Ok(())
    }

    async fn course_page(&mut self) -> Result<String, SessionError> {
        self.client
            .refresh()
            .await
            .map_err(|err| command_error("timetable refresh", err))?;
        self.wait_for("timetable refresh", COURSE_ROWS).await?;
        self.client
            .source()
            .await
            .map_err(|err| command_error("timetable source", err))
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, SessionError> {
        self.client
            .screenshot()
            .await
            .map_err(|err| command_error("screenshot", err))
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        let this = *self;
        this.client.close().await.map_err(|err| {
            monitor_warn!("Browser session did not close cleanly: {}", err);
            command_error("close", err)
        })
    }
}

fn command_error(step: &str, err: CmdError) -> SessionError {
    let kind = match &err {
        CmdError::WaitTimeout => SessionFailure::Timeout,
        err if err.is_no_such_element() => SessionFailure::MissingElement,
        _ => SessionFailure::Driver,
    };
    SessionError::new(kind, format!("{step}: {err}"))
}
