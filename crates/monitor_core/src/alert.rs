use std::fmt::Write;

use crate::ChangeEvent;

const HEADER: &str = "🔔 <b>Course Changes Detected!</b>\n\n";
const AVAILABLE_BANNER: &str = "🚨 COURSE AVAILABLE! 🚨\n\n";

/// One outgoing notification covering every change from a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertBatch {
    pub changes: Vec<ChangeEvent>,
    /// Set when any change is a seat opening; the whole message carries the banner.
    pub escalated: bool,
    pub text: String,
}

impl AlertBatch {
    /// Builds the batch message, or `None` when there is nothing to report.
    pub fn from_changes(changes: Vec<ChangeEvent>) -> Option<Self> {
        if changes.is_empty() {
            return None;
        }

        let escalated = changes.iter().any(ChangeEvent::is_newly_available);

        let mut text = String::new();
        if escalated {
            text.push_str(AVAILABLE_BANNER);
        }
        text.push_str(HEADER);
        for change in &changes {
            // Writing into a String cannot fail.
            let _ = write!(
                text,
                "📚 <b>{}</b>\nInstructor: {}\nCRN: {}\nStatus: {} → {}\n\n",
                change.label(),
                change.instructor,
                change.crn,
                change.old_status,
                change.new_status,
            );
        }

        Some(Self {
            changes,
            escalated,
            text,
        })
    }
}

/// Lifecycle notifications sent outside of change alerts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Started,
    StoppedByUser,
    LoginFailed { reason: String, timed_out: bool },
    NavigationResetFailed { reason: String },
    MonitorFailed { reason: String },
    RetriesExhausted,
}

impl Lifecycle {
    pub fn message(&self) -> String {
        match self {
            Lifecycle::Started => "Course Monitoring Started Successfully".to_string(),
            Lifecycle::StoppedByUser => "ℹ️ Course monitor stopped by user".to_string(),
            Lifecycle::LoginFailed {
                reason,
                timed_out: true,
            } => format!("⚠️ Login timeout error: {reason}"),
            Lifecycle::LoginFailed { reason, .. } => format!("⚠️ Login error: {reason}"),
            Lifecycle::NavigationResetFailed { reason } => {
                format!("⚠️ Error during navigation reset: {reason}")
            }
            Lifecycle::MonitorFailed { reason } => format!("⚠️ Error in course monitor: {reason}"),
            Lifecycle::RetriesExhausted => {
                "⚠️ Course monitor stopped after maximum retries".to_string()
            }
        }
    }
}
