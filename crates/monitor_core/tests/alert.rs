use monitor_core::{AlertBatch, ChangeEvent, CourseStatus, Lifecycle, PriorStatus};

fn change(crn: &str, old_status: PriorStatus, new_status: CourseStatus) -> ChangeEvent {
    ChangeEvent {
        crn: crn.to_string(),
        subject: "MATH".to_string(),
        course_num: "10040".to_string(),
        title: "Calculus".to_string(),
        instructor: "B. Prof".to_string(),
        old_status,
        new_status,
    }
}

#[test]
fn empty_batch_sends_nothing() {
    assert!(AlertBatch::from_changes(Vec::new()).is_none());
}

#[test]
fn full_to_available_escalates() {
    let batch = AlertBatch::from_changes(vec![change(
        "123",
        PriorStatus::Seen(CourseStatus::Full),
        CourseStatus::Available,
    )])
    .expect("batch");

    assert!(batch.escalated);
    assert!(batch.text.starts_with("🚨 COURSE AVAILABLE! 🚨\n\n🔔 <b>Course Changes Detected!</b>"));
    assert!(batch.text.contains("📚 <b>MATH 10040 - Calculus</b>\n"));
    assert!(batch.text.contains("Instructor: B. Prof\n"));
    assert!(batch.text.contains("CRN: 123\n"));
    assert!(batch.text.contains("Status: Full → Available\n\n"));
}

#[test]
fn not_tracked_to_available_escalates() {
    let batch = AlertBatch::from_changes(vec![change(
        "123",
        PriorStatus::NotTracked,
        CourseStatus::Available,
    )])
    .expect("batch");

    assert!(batch.escalated);
    assert!(batch.text.contains("Status: Not tracked → Available"));
}

#[test]
fn registered_to_available_does_not_escalate() {
    let batch = AlertBatch::from_changes(vec![change(
        "123",
        PriorStatus::Seen(CourseStatus::Registered),
        CourseStatus::Available,
    )])
    .expect("batch");

    assert!(!batch.escalated);
    assert!(batch.text.starts_with("🔔 <b>Course Changes Detected!</b>\n\n"));
}

#[test]
fn one_qualifying_change_escalates_whole_batch_once() {
    let batch = AlertBatch::from_changes(vec![
        change("1", PriorStatus::Seen(CourseStatus::Available), CourseStatus::Full),
        change("2", PriorStatus::Seen(CourseStatus::Full), CourseStatus::Available),
        change("3", PriorStatus::Seen(CourseStatus::Closed), CourseStatus::Available),
    ])
    .expect("batch");

    assert!(batch.escalated);
    assert_eq!(batch.changes.len(), 3);
    assert_eq!(batch.text.matches("COURSE AVAILABLE").count(), 1);
    assert_eq!(batch.text.matches("📚").count(), 3);
    let first = batch.text.find("CRN: 1\n").unwrap();
    let third = batch.text.find("CRN: 3\n").unwrap();
    assert!(first < third);
}

#[test]
fn lifecycle_messages_match_channel_wording() {
    assert_eq!(
        Lifecycle::LoginFailed {
            reason: "no email field".to_string(),
            timed_out: true
        }
        .message(),
        "⚠️ Login timeout error: no email field"
    );
    assert_eq!(
        Lifecycle::StoppedByUser.message(),
        "ℹ️ Course monitor stopped by user"
    );
    assert_eq!(
        Lifecycle::RetriesExhausted.message(),
        "⚠️ Course monitor stopped after maximum retries"
    );
}
