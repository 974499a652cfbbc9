use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::StateError;
use crate::spec::KeywordSpec;
use crate::types::{CumulativeState, RunTally};

/// JSON file holding the counts accumulated over every run.
///
/// The file is a nested object `{category: {keyword: count}}`. Writes go to a
/// temporary file in the same directory which is then renamed over the old
/// one, so a crash mid-write leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct CumulativeStore {
    path: PathBuf,
}

impl CumulativeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CumulativeStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Load the persisted state, shaped to `spec`.
    ///
    /// A missing file yields all zeros. Pairs the file lacks are added at zero
    /// and pairs the spec no longer lists are kept. A file that does not parse
    /// is an error; it is never replaced by an empty state.
    pub fn load(&self, spec: &KeywordSpec) -> Result<CumulativeState, StateError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no cumulative state yet, starting from zero");
                return Ok(CumulativeState::zeroed(spec));
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let state: CumulativeState =
            serde_json::from_slice(&bytes).map_err(|source| StateError::Corrupted {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), total = state.total(), "loaded cumulative state");
        Ok(state.conform_to(spec))
    }

    /// Atomically replace the persisted state with `state`.
    pub fn persist(&self, state: &CumulativeState) -> Result<(), StateError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        serde_json::to_writer_pretty(&mut tmp, state)
            .map_err(|e| self.io_error(std::io::Error::from(e)))?;
        tmp.write_all(b"\n").map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        info!(path = %self.path.display(), total = state.total(), "persisted cumulative state");
        Ok(())
    }

    /// Take an exclusive lock guarding load-merge-persist.
    ///
    /// The lock lives on a sidecar `<path>.lock` file so the state file itself
    /// can still be renamed over. Blocks until the lock is available.
    pub fn lock(&self) -> Result<StateLock, StateError> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| self.io_error(e))?;
        file.lock().map_err(|e| self.io_error(e))?;
        debug!(path = %lock_path.display(), "acquired state lock");
        Ok(StateLock { file })
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }
}

/// Held while the cumulative state is being updated. Unlocks on drop.
#[derive(Debug)]
pub struct StateLock {
    file: File,
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Add every count of `tally` into `state`.
///
/// Pairs missing from `tally` are left alone; pairs missing from `state` are
/// appended. Counts saturate instead of wrapping.
pub fn merge(mut state: CumulativeState, tally: &RunTally) -> CumulativeState {
    for (category, keyword, n) in tally.iter() {
        let entry = state.entry_mut(category, keyword);
        *entry = entry.saturating_add(n);
    }
    state
}
