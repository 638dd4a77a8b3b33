use std::fmt;

use crate::{CourseStatus, SnapshotMap};

/// Status a course had before the current poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorStatus {
    /// The CRN was not in the previous snapshot.
    NotTracked,
    Seen(CourseStatus),
}

impl fmt::Display for PriorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorStatus::NotTracked => f.write_str("Not tracked"),
            PriorStatus::Seen(status) => status.fmt(f),
        }
    }
}

/// A status transition detected between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub crn: String,
    pub subject: String,
    pub course_num: String,
    pub title: String,
    pub instructor: String,
    pub old_status: PriorStatus,
    pub new_status: CourseStatus,
}

impl ChangeEvent {
    pub fn label(&self) -> String {
        format!("{} {} - {}", self.subject, self.course_num, self.title)
    }

    /// A seat opened up on a course that had none (or was unknown).
    pub fn is_newly_available(&self) -> bool {
        self.new_status == CourseStatus::Available
            && matches!(
                self.old_status,
                PriorStatus::NotTracked
                    | PriorStatus::Seen(CourseStatus::Full)
                    | PriorStatus::Seen(CourseStatus::Closed)
            )
    }
}

/// Compares `current` against `previous`, in `current`'s order.
///
/// Courses that disappeared from `current` produce no event.
pub fn diff(current: &SnapshotMap, previous: &SnapshotMap) -> Vec<ChangeEvent> {
    current
        .iter()
        .filter_map(|course| {
            let old_status = match previous.get(&course.crn) {
                Some(prior) if prior.status == course.status => return None,
                Some(prior) => PriorStatus::Seen(prior.status),
                None => PriorStatus::NotTracked,
            };
            Some(ChangeEvent {
                crn: course.crn.clone(),
                subject: course.subject.clone(),
                course_num: course.course_num.clone(),
                title: course.title.clone(),
                instructor: course.instructor.clone(),
                old_status,
                new_status: course.status,
            })
        })
        .collect()
}
