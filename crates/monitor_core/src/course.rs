use std::collections::HashMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seat status of a course section as shown on the registration page.
///
/// `Closed` is never derived from the page; it is accepted only when it shows
/// up in a snapshot written elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseStatus {
    Registered,
    Full,
    Available,
    Closed,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Registered => "Registered",
            CourseStatus::Full => "Full",
            CourseStatus::Available => "Available",
            CourseStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One course section observed during a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourseRecord {
    pub status: CourseStatus,
    pub crn: String,
    pub subject: String,
    pub course_num: String,
    pub title: String,
    pub campus: String,
    pub dates: String,
    pub instructor: String,
}

impl CourseRecord {
    /// `"{subject} {course_num} - {title}"`, the label used in alerts.
    pub fn label(&self) -> String {
        format!("{} {} - {}", self.subject, self.course_num, self.title)
    }
}

/// Returns true when `crn` is a usable course registration number.
pub fn is_valid_crn(crn: &str) -> bool {
    !crn.is_empty() && crn.bytes().all(|b| b.is_ascii_digit())
}

/// CRN-keyed course records in the order they were first inserted.
///
/// Serializes as a JSON object keyed by CRN, preserving order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotMap {
    records: Vec<CourseRecord>,
    index: HashMap<String, usize>,
}

impl SnapshotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under its CRN. A record with the same CRN is replaced
    /// in place and returned.
    pub fn insert(&mut self, record: CourseRecord) -> Option<CourseRecord> {
        match self.index.get(&record.crn) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.index.insert(record.crn.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, crn: &str) -> Option<&CourseRecord> {
        self.index.get(crn).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, crn: &str) -> bool {
        self.index.contains_key(crn)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseRecord> {
        self.records.iter()
    }

    pub fn crns(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.crn.as_str())
    }
}

impl FromIterator<CourseRecord> for SnapshotMap {
    fn from_iter<I: IntoIterator<Item = CourseRecord>>(iter: I) -> Self {
        let mut map = SnapshotMap::new();
        for record in iter {
            map.insert(record);
        }
        map
    }
}

impl<'a> IntoIterator for &'a SnapshotMap {
    type Item = &'a CourseRecord;
    type IntoIter = std::slice::Iter<'a, CourseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for SnapshotMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.crn, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SnapshotMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SnapshotVisitor)
    }
}

struct SnapshotVisitor;

impl<'de> Visitor<'de> for SnapshotVisitor {
    type Value = SnapshotMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of CRN to course record")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut snapshot = SnapshotMap::new();
        while let Some((crn, record)) = access.next_entry::<String, CourseRecord>()? {
            if crn != record.crn {
                return Err(de::Error::custom(format!(
                    "snapshot key {crn} does not match record crn {}",
                    record.crn
                )));
            }
            if !is_valid_crn(&crn) {
                return Err(de::Error::custom(format!("invalid crn {crn:?}")));
            }
            snapshot.insert(record);
        }
        Ok(snapshot)
    }
}
