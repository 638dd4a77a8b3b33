//! Course monitor core: course types, snapshot diffing and the pure poll state machine.
mod alert;
mod course;
mod diff;
mod effect;
mod msg;
mod state;
mod update;

pub use alert::{AlertBatch, Lifecycle};
pub use course::{is_valid_crn, CourseRecord, CourseStatus, SnapshotMap};
pub use diff::{diff, ChangeEvent, PriorStatus};
pub use effect::Effect;
pub use msg::Msg;
pub use state::{Baseline, CycleSummary, MonitorPhase, MonitorState, DEFAULT_POLL_INTERVAL};
pub use update::update;
