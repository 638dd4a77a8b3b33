//! Course monitor engine: browser session, page extraction, persistence,
//! notifications and the effect-executing poll driver.
mod driver;
mod extract;
mod notify;
mod persist;
mod session;
mod types;
mod webdriver;

pub use driver::{DriverSettings, MonitorDriver};
pub use extract::{Extraction, Extractor, RegistrationPageExtractor, RowRejection};
pub use notify::{Notifier, NotifyError, TelegramNotifier, TelegramSettings, TELEGRAM_API_BASE};
pub use persist::{
    ensure_output_dir, AtomicFileWriter, PersistError, SnapshotStore, DEFAULT_SNAPSHOT_FILE,
};
pub use session::{CodePrompt, Credentials, PortalUrls, RegistrationSession, SessionSettings};
pub use types::{MonitorError, MonitorOutcome, SessionError, SessionFailure};
pub use webdriver::WebDriverSession;
