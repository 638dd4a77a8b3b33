use crate::{
    diff, AlertBatch, Baseline, CycleSummary, Effect, Lifecycle, MonitorPhase, MonitorState, Msg,
};

const TIMEOUT_DIAGNOSTIC: &str = "timeout_error.png";
const GENERAL_DIAGNOSTIC: &str = "general_error.png";
const NAVIGATION_DIAGNOSTIC: &str = "navigation_error.png";

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages that do not apply to the current phase are ignored.
pub fn update(mut state: MonitorState, msg: Msg) -> (MonitorState, Vec<Effect>) {
    if state.phase().is_terminal() {
        return (state, Vec::new());
    }

    let effects = match (state.phase(), msg) {
        (_, Msg::Interrupted) => {
            state.set_phase(MonitorPhase::Stopped);
            vec![
                Effect::Announce(Lifecycle::StoppedByUser),
                Effect::ReleaseSession,
            ]
        }
        (_, Msg::Fatal { reason }) => {
            state.set_phase(MonitorPhase::Failed);
            vec![
                Effect::CaptureDiagnostic {
                    file_name: GENERAL_DIAGNOSTIC,
                },
                Effect::Announce(Lifecycle::MonitorFailed { reason }),
                Effect::ReleaseSession,
            ]
        }
        (MonitorPhase::Uninitialized, Msg::Start) => vec![Effect::OpenSession],
        (MonitorPhase::Uninitialized, Msg::SessionOpened) => {
            state.set_phase(MonitorPhase::SessionReady);
            vec![Effect::LoadSnapshot]
        }
        (MonitorPhase::Uninitialized, Msg::LoginFailed { reason, timed_out }) => {
            state.set_phase(MonitorPhase::Failed);
            let file_name = if timed_out {
                TIMEOUT_DIAGNOSTIC
            } else {
                GENERAL_DIAGNOSTIC
            };
            vec![
                Effect::CaptureDiagnostic { file_name },
                Effect::Announce(Lifecycle::LoginFailed { reason, timed_out }),
                Effect::ReleaseSession,
            ]
        }
        (MonitorPhase::SessionReady, Msg::SnapshotLoaded(snapshot)) => {
            state.adopt_baseline(snapshot);
            state.set_phase(MonitorPhase::Polling);
            vec![
                Effect::Announce(Lifecycle::Started),
                Effect::ExtractCourses,
            ]
        }
        (MonitorPhase::Polling, Msg::CoursesExtracted(current)) => {
            let cycle = state.cycles() + 1;
            let mut effects = Vec::with_capacity(3);

            let mut summary = CycleSummary {
                cycle,
                courses: current.len(),
                compared: false,
                changes: 0,
                escalated: false,
            };
            if let Baseline::Warm(previous) = state.baseline() {
                let changes = diff(&current, previous);
                summary.compared = true;
                summary.changes = changes.len();
                if let Some(batch) = AlertBatch::from_changes(changes) {
                    summary.escalated = batch.escalated;
                    effects.push(Effect::DeliverAlert(batch));
                }
            }

            state.record_cycle(summary);
            effects.push(Effect::PersistSnapshot(current.clone()));
            state.adopt_baseline(current);
            effects.push(Effect::Sleep(state.interval()));
            effects
        }
        (MonitorPhase::Polling, Msg::IntervalElapsed) => vec![Effect::ExtractCourses],
        (MonitorPhase::Polling, Msg::PageTimedOut { .. }) => {
            state.set_phase(MonitorPhase::Recovering);
            vec![Effect::RecoverSession]
        }
        (MonitorPhase::Recovering, Msg::SessionRecovered) => {
            state.record_recovery();
            state.set_phase(MonitorPhase::Polling);
            vec![Effect::ExtractCourses]
        }
        (MonitorPhase::Recovering, Msg::RecoveryFailed { reason }) => {
            state.set_phase(MonitorPhase::Failed);
            vec![
                Effect::CaptureDiagnostic {
                    file_name: NAVIGATION_DIAGNOSTIC,
                },
                Effect::Announce(Lifecycle::NavigationResetFailed { reason }),
                Effect::ReleaseSession,
            ]
        }
        _ => Vec::new(),
    };

    (state, effects)
}
