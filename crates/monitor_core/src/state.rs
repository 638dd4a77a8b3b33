use std::time::Duration;

use crate::SnapshotMap;

/// Default pause between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorPhase {
    #[default]
    Uninitialized,
    SessionReady,
    Polling,
    Recovering,
    Stopped,
    Failed,
}

impl MonitorPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MonitorPhase::Stopped | MonitorPhase::Failed)
    }
}

/// Snapshot the next poll is compared against.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Baseline {
    /// Nothing to compare against; the next poll only records.
    #[default]
    Cold,
    Warm(SnapshotMap),
}

impl From<SnapshotMap> for Baseline {
    fn from(snapshot: SnapshotMap) -> Self {
        if snapshot.is_empty() {
            Baseline::Cold
        } else {
            Baseline::Warm(snapshot)
        }
    }
}

/// What happened in the most recent poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycle: u64,
    pub courses: usize,
    /// False when the poll was recorded without a comparison.
    pub compared: bool,
    pub changes: usize,
    pub escalated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    phase: MonitorPhase,
    baseline: Baseline,
    interval: Duration,
    cycles: u64,
    recoveries: u64,
    last_cycle: Option<CycleSummary>,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl MonitorState {
    pub fn new(interval: Duration) -> Self {
        Self {
            phase: MonitorPhase::Uninitialized,
            baseline: Baseline::Cold,
            interval,
            cycles: 0,
            recoveries: 0,
            last_cycle: None,
        }
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of polls that have completed.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn recoveries(&self) -> u64 {
        self.recoveries
    }

    pub fn last_cycle(&self) -> Option<&CycleSummary> {
        self.last_cycle.as_ref()
    }

    pub(crate) fn set_phase(&mut self, phase: MonitorPhase) {
        self.phase = phase;
    }

    pub(crate) fn adopt_baseline(&mut self, snapshot: SnapshotMap) {
        self.baseline = Baseline::from(snapshot);
    }

    pub(crate) fn record_cycle(&mut self, summary: CycleSummary) {
        self.cycles = summary.cycle;
        self.last_cycle = Some(summary);
    }

    pub(crate) fn record_recovery(&mut self) {
        self.recoveries += 1;
    }
}
