//! JSON-lines log store.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::model::DeliveryLogEntry;

use super::{LogError, LogStore};

/// Appends entries to a file, one JSON object per line.
///
/// Writes run on the blocking thread pool and are serialized through a
/// process-local lock, so concurrent deliveries never interleave lines.
/// Missing parent directories are created on first write.
#[derive(Debug, Clone)]
pub struct JsonlLogStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonlLogStore {
    /// Creates a store appending to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every entry back. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line is not a valid entry.
    pub fn read_all(&self) -> Result<Vec<DeliveryLogEntry>, LogError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LogError::Read(e)),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(LogError::from))
            .collect()
    }

    fn append_blocking(path: &Path, write_lock: &Mutex<()>, line: &[u8]) -> Result<(), LogError> {
        let _guard = write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(LogError::Write)?;
            }
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(LogError::Write)?;

        file.write_all(line).map_err(LogError::Write)
    }
}

impl LogStore for JsonlLogStore {
    async fn append(&self, entry: DeliveryLogEntry) -> Result<(), LogError> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let path = self.path.clone();
        let write_lock = Arc::clone(&self.write_lock);

        tokio::task::spawn_blocking(move || Self::append_blocking(&path, &write_lock, &line)).await?
    }
}
