//! Serializes `ql` processes over one tracker directory. The guard wraps
//! an advisory flock on the directory's `.lock` file; whoever holds it may
//! read and write the task file.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// How long a command waits for a concurrent questlog process before
/// giving up.
pub const LOCK_WAIT: Duration = Duration::from_secs(5);

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Error type for lock acquisition
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("timed out waiting for lock {path}; is another ql command running?")]
    Busy { path: PathBuf },
}

/// Exclusive hold on a tracker directory. Every command takes one around
/// `Store::open` — opening persists the daily reset, so even reads write.
#[derive(Debug)]
pub struct WriteGuard {
    file: Option<File>,
    path: PathBuf,
}

/// Lock `dir` with the default wait.
pub fn hold(dir: &Path) -> Result<WriteGuard, LockError> {
    hold_for(dir, LOCK_WAIT)
}

/// Lock `dir`, retrying until `wait` has elapsed.
pub fn hold_for(dir: &Path, wait: Duration) -> Result<WriteGuard, LockError> {
    let path = dir.join(".lock");
    let file = File::create(&path).map_err(|e| LockError::Open {
        path: path.clone(),
        source: e,
    })?;
    let deadline = Instant::now() + wait;
    while !flock_exclusive(&file) {
        if Instant::now() >= deadline {
            return Err(LockError::Busy { path });
        }
        thread::sleep(RETRY_INTERVAL);
    }
    Ok(WriteGuard {
        file: Some(file),
        path,
    })
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        // Closing the descriptor releases the flock; removing the file
        // afterwards is only tidiness.
        drop(self.file.take());
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn flock_exclusive(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

// No flock off Unix; commands run unserialized there.
#[cfg(not(unix))]
fn flock_exclusive(_file: &File) -> bool {
    true
}
