//! Data directory lock
//!
//! An exclusive advisory lock on `<data_dir>/strongbox.lock` held for the
//! lifetime of a context. It serializes whole operations across processes,
//! so two CLI invocations can never interleave inside one custody operation.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use tracing::debug;

use crate::domain::result::{Error, Result};

const LOCK_FILE: &str = "strongbox.lock";

/// Maximum attempts before giving up on a busy data directory
const MAX_ATTEMPTS: u32 = 6;

/// Initial wait between attempts (doubles each time)
const INITIAL_DELAY_MS: u64 = 50;

/// Held lock; released on drop
#[derive(Debug)]
pub struct DataDirLock {
    file: File,
    path: PathBuf,
}

impl DataDirLock {
    /// Acquire the lock, retrying with exponential backoff while another
    /// process holds it
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        for attempt in 0..MAX_ATTEMPTS {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(path = %path.display(), "acquired data directory lock");
                    return Ok(Self { file, path });
                }
                Err(_) if attempt + 1 < MAX_ATTEMPTS => {
                    let delay = Duration::from_millis(INITIAL_DELAY_MS * 2u64.pow(attempt));
                    debug!(attempt = attempt + 1, "data directory busy, waiting {:?}", delay);
                    thread::sleep(delay);
                }
                Err(e) => {
                    return Err(Error::Busy(format!(
                        "{} is held by another process: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Err(Error::Busy(path.display().to_string()))
    }

    /// Single non-blocking attempt
    pub fn try_acquire(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|e| Error::Busy(format!("{}: {}", path.display(), e)))?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_is_exclusive_and_released_on_drop() {
        let dir = tempdir().unwrap();
        let held = DataDirLock::try_acquire(dir.path()).unwrap();
        assert!(held.path().exists());
        assert!(matches!(
            DataDirLock::try_acquire(dir.path()),
            Err(Error::Busy(_))
        ));

        drop(held);
        assert!(DataDirLock::try_acquire(dir.path()).is_ok());
    }
}
