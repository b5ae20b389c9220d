//! Storage layer for taskboard
//!
//! The engine talks to persistence through [`BoardStore`]: a transaction
//! receives a fresh read of the authoritative board state and its changes
//! are committed only when the closure returns `Ok`.
//!
//! # Directory Structure
//!
//! ```text
//! .taskboard/
//!   board.json          # Milestones and tasks (atomic rename on commit)
//!   board.json.lock     # Exclusive writer lock
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::state::BoardState;

/// Name of the board state file inside the storage directory
pub const BOARD_FILE: &str = "board.json";

/// Transactional access to the board state.
pub trait BoardStore {
    /// Read a consistent snapshot of the current state.
    fn read(&self) -> Result<BoardState>;

    /// Run `f` against the current state and commit its changes.
    ///
    /// Writers are serialized; `f` always sees the latest committed state.
    /// If `f` fails, or the commit itself fails, nothing is persisted.
    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut BoardState) -> Result<T>;
}

fn stamp(state: &mut BoardState) {
    state.revision += 1;
    state.updated_at = Utc::now();
}

/// Board state persisted as JSON and guarded by a file lock.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Path to the storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path to the board state file
    pub fn board_file(&self) -> PathBuf {
        self.dir.join(BOARD_FILE)
    }

    /// Path to the writer lock file
    pub fn lock_file(&self) -> PathBuf {
        lock::lock_path_for(&self.board_file())
    }

    pub fn is_initialized(&self) -> bool {
        self.board_file().exists()
    }

    /// Create the storage directory and an empty board if none exists.
    ///
    /// Returns `true` when a new board was created.
    pub fn init(&self) -> Result<bool> {
        fs::create_dir_all(&self.dir)?;
        let _lock = FileLock::acquire(self.lock_file(), self.lock_timeout_ms)?;
        if self.is_initialized() {
            return Ok(false);
        }
        self.write_state(&BoardState::empty())?;
        tracing::info!(dir = %self.dir.display(), "initialized board storage");
        Ok(true)
    }

    fn read_state(&self) -> Result<BoardState> {
        let path = self.board_file();
        if !path.exists() {
            return Err(Error::NotInitialized(self.dir.clone()));
        }
        let content = fs::read_to_string(&path)?;
        let state: BoardState = serde_json::from_str(&content)?;
        Ok(state)
    }

    fn write_state(&self, state: &BoardState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        lock::write_atomic(self.board_file(), json.as_bytes())
    }
}

impl BoardStore for FileStore {
    fn read(&self) -> Result<BoardState> {
        let _lock = FileLock::acquire(self.lock_file(), self.lock_timeout_ms)?;
        self.read_state()
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut BoardState) -> Result<T>,
    {
        let _lock = FileLock::acquire(self.lock_file(), self.lock_timeout_ms)?;
        let mut state = self.read_state()?;

        let result = f(&mut state)?;

        stamp(&mut state);
        self.write_state(&state)
            .map_err(|err| Error::Transaction(format!("commit failed: {err}")))?;
        tracing::debug!(revision = state.revision, "committed board transaction");
        Ok(result)
    }
}

/// In-process board state, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<BoardState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: BoardState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl BoardStore for MemoryStore {
    fn read(&self) -> Result<BoardState> {
        let guard = self
            .state
            .lock()
            .map_err(|_| Error::Transaction("board state lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut BoardState) -> Result<T>,
    {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| Error::Transaction("board state lock poisoned".to_string()))?;

        let mut working = guard.clone();
        let result = f(&mut working)?;

        stamp(&mut working);
        *guard = working;
        Ok(result)
    }
}
