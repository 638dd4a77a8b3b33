use crate::SnapshotMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin monitoring; requests the login flow.
    Start,
    /// Login and navigation to the registration view succeeded.
    SessionOpened,
    /// Login failed before the registration view was reached.
    LoginFailed { reason: String, timed_out: bool },
    /// The persisted snapshot was read (empty if absent or unreadable).
    SnapshotLoaded(SnapshotMap),
    /// A poll extracted the current courses from the page.
    CoursesExtracted(SnapshotMap),
    /// The pause between polls ran out.
    IntervalElapsed,
    /// The page did not come back in time during a poll.
    PageTimedOut { reason: String },
    /// Navigation back to the registration view succeeded.
    SessionRecovered,
    /// Navigation back to the registration view failed.
    RecoveryFailed { reason: String },
    /// Operator interrupt.
    Interrupted,
    /// Any other unrecoverable error.
    Fatal { reason: String },
}
