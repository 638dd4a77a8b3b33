use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use monitor_core::SnapshotMap;
use monitor_logging::{monitor_info, monitor_warn};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Default location of the snapshot file, relative to the working directory.
pub const DEFAULT_SNAPSHOT_FILE: &str = "course_states.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("snapshot path has no file name: {0:?}")]
    InvalidPath(PathBuf),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: impl AsRef<[u8]>) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_ref())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// The flat JSON file holding the last observed snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot. A missing or unreadable file yields an empty map.
    pub fn load(&self) -> SnapshotMap {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                monitor_info!(
                    "No existing snapshot at {:?}. Starting with empty state.",
                    self.path
                );
                return SnapshotMap::new();
            }
            Err(err) => {
                monitor_warn!("Failed to read snapshot from {:?}: {}", self.path, err);
                return SnapshotMap::new();
            }
        };

        match serde_json::from_str::<SnapshotMap>(&content) {
            Ok(snapshot) => {
                monitor_info!(
                    "Loaded {} course states from {:?}",
                    snapshot.len(),
                    self.path
                );
                snapshot
            }
            Err(err) => {
                monitor_warn!(
                    "Failed to parse snapshot {:?}: {}. Starting with empty state.",
                    self.path,
                    err
                );
                SnapshotMap::new()
            }
        }
    }

    /// Replaces the file with `snapshot`, pretty-printed with four-space indent.
    pub fn save(&self, snapshot: &SnapshotMap) -> Result<PathBuf, PersistError> {
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| PersistError::InvalidPath(self.path.clone()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        snapshot.serialize(&mut serializer)?;

        AtomicFileWriter::new(dir).write(filename, &buf)
    }
}
