use crate::error::{CadenceError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive cross-process lock over the state file, implemented as an OS
/// advisory lock on a co-located lock file.
///
/// Acquisition polls up to `timeout`, then fails with `LockTimeout`. A lock
/// file whose mtime is older than twice the timeout is treated as abandoned
/// (hung or crashed holder) and force-reclaimed by deleting it; the next
/// open creates a fresh inode that new acquirers contend on. This bounds
/// worst-case staleness but is a heuristic, not a fencing guarantee.
///
/// The guard releases the OS lock and removes the lock file on drop.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    pub fn acquire(path: &Path, timeout: Duration) -> Result<StateLock> {
        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(path)?;

            match file.try_lock_exclusive() {
                Ok(()) => {
                    let mut guard = StateLock {
                        file,
                        path: path.to_path_buf(),
                    };
                    guard.touch()?;
                    return Ok(guard);
                }
                Err(_) => {
                    if is_stale(path, timeout) {
                        // Held too long; reclaim by unlinking. Current
                        // waiters race on the new inode.
                        let _ = std::fs::remove_file(path);
                    }
                }
            }

            if start.elapsed() >= timeout {
                return Err(CadenceError::LockTimeout(timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    // Writing the pid refreshes mtime, which is what staleness is judged by.
    fn touch(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        writeln!(self.file, "{}", std::process::id())?;
        self.file.sync_all()?;
        Ok(())
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

fn is_stale(path: &Path, timeout: Duration) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = meta.modified() else {
        return false;
    };
    let age = SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO);
    age > timeout * 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_creates_and_drop_removes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.lock");
        {
            let _guard = StateLock::acquire(&path, DEFAULT_LOCK_TIMEOUT).unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn reacquire_after_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.lock");
        drop(StateLock::acquire(&path, DEFAULT_LOCK_TIMEOUT).unwrap());
        drop(StateLock::acquire(&path, DEFAULT_LOCK_TIMEOUT).unwrap());
    }

    #[test]
    fn contended_lock_times_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.lock");
        let _held = StateLock::acquire(&path, DEFAULT_LOCK_TIMEOUT).unwrap();

        // A second acquirer in another thread must time out; the holder is
        // alive and the lock file is fresh, so no stale reclaim happens.
        let p = path.clone();
        let waiter = std::thread::spawn(move || StateLock::acquire(&p, Duration::from_millis(200)));
        let result = waiter.join().unwrap();
        assert!(matches!(result, Err(CadenceError::LockTimeout(_))));
    }

    #[test]
    fn stale_detection_by_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.lock");
        std::fs::write(&path, "12345\n").unwrap();
        // Fresh file is not stale.
        assert!(!is_stale(&path, Duration::from_secs(5)));
        // With a tiny timeout, any measurable age makes it stale.
        std::thread::sleep(Duration::from_millis(20));
        assert!(is_stale(&path, Duration::from_millis(1)));
    }
}
