use std::time::Duration;

use crate::{AlertBatch, Lifecycle, SnapshotMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenSession,
    LoadSnapshot,
    ExtractCourses,
    DeliverAlert(AlertBatch),
    PersistSnapshot(SnapshotMap),
    Sleep(Duration),
    RecoverSession,
    Announce(Lifecycle),
    CaptureDiagnostic { file_name: &'static str },
    ReleaseSession,
}
