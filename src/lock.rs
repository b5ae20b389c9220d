//! File locking and atomic writes for the board state
//!
//! - Exclusive file locks (fs2/flock) serialize writers across processes
//! - Atomic write pattern (write temp + rename)
//! - Lock timeout with configurable wait

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// Default lock timeout in milliseconds
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// Default retry interval when waiting for a lock
const LOCK_RETRY_INTERVAL_MS: u64 = 10;

fn is_lock_contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    // On Windows, fs2/libc can surface lock/sharing violations as "Other".
    #[cfg(windows)]
    {
        matches!(err.raw_os_error(), Some(32) | Some(33))
    }
    #[cfg(not(windows))]
    {
        false
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?)
}

/// A file lock guard that releases the lock when dropped
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock on a file with timeout
    ///
    /// The lock file is created if missing.
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = open_lock_file(path)?;

        let start = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);
        let retry_interval = Duration::from_millis(LOCK_RETRY_INTERVAL_MS);

        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    return Ok(FileLock { file });
                }
                Err(e) if is_lock_contended(&e) => {
                    if start.elapsed() >= timeout {
                        return Err(Error::LockFailed(path.to_path_buf()));
                    }
                    std::thread::sleep(retry_interval);
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Atomically write data to a file
///
/// Writes a temporary sibling file, then renames it over `path`, so the
/// target is either fully replaced or untouched. Does NOT take a lock.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension(format!(
        "{}.tmp.{}",
        path.extension().and_then(|e| e.to_str()).unwrap_or(""),
        std::process::id()
    ));

    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(data)?;
    temp_file.sync_all()?;
    drop(temp_file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Path of the lock file guarding `path`
pub fn lock_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.lock", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("board.json.lock");

        let lock = FileLock::acquire(&lock_path, 1000).unwrap();
        assert!(lock_path.exists());
        assert!(FileLock::acquire(&lock_path, 20).is_err());

        drop(lock);
        assert!(FileLock::acquire(&lock_path, 20).is_ok());
    }

    #[test]
    fn test_atomic_write_replaces_contents() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("board.json");

        write_atomic(&file_path, b"{\"revision\":1}").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{\"revision\":1}");

        write_atomic(&file_path, b"{\"revision\":2}").unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{\"revision\":2}");
    }

    #[test]
    fn lock_path_appends_suffix() {
        let path = Path::new("/tmp/state/board.json");
        assert_eq!(lock_path_for(path), PathBuf::from("/tmp/state/board.json.lock"));
    }

    #[test]
    fn timeout_returns_lock_failed() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("timeout.lock");

        let _lock = FileLock::acquire(&lock_path, 1000).unwrap();
        let result = FileLock::acquire(&lock_path, 50);
        assert!(matches!(result, Err(Error::LockFailed(_))));
    }
}
