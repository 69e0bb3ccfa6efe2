use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use nv_core::{NvError, NvResult, StorageOp};
use nv_hal::SectionLock;

use crate::{map_io, sibling};

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5000);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory `flock(2)` on `<section>.lock`. Readers never take it, so the
/// lock file only appears once a scope is written.
#[derive(Debug, Clone, Copy)]
pub struct FlockLock {
    timeout: Duration,
}

impl Default for FlockLock {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl FlockLock {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn lock_path(section: &str) -> PathBuf {
        sibling(Path::new(section), ".lock")
    }
}

/// Releases the lock on drop, on every exit path.
#[derive(Debug)]
pub struct FlockGuard {
    file: File,
    path: PathBuf,
}

impl FlockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FlockGuard {
    fn drop(&mut self) {
        let rc = unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
        if rc != 0 {
            // Closing the descriptor releases it regardless
            warn!("{}: unlock failed: {}", self.path.display(), io::Error::last_os_error());
        }
    }
}

impl SectionLock for FlockLock {
    type Guard = FlockGuard;

    fn acquire(&self, section: &str) -> NvResult<FlockGuard> {
        let path = Self::lock_path(section);
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| map_io(StorageOp::Lock, section, e))?;
        }
        let file = OpenOptions::new()
            .read(true).write(true).create(true).truncate(false)
            .open(&path).map_err(|e| map_io(StorageOp::Lock, section, e))?;

        let fd = file.as_raw_fd();
        let deadline = Instant::now() + self.timeout;
        loop {
            let rc = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
            if rc == 0 {
                debug!("{}: write lock held", path.display());
                return Ok(FlockGuard { file, path });
            }

            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EWOULDBLOCK) => {}
                Some(libc::EINTR) => continue,
                _ => return Err(map_io(StorageOp::Lock, section, err)),
            }

            if Instant::now() >= deadline {
                return Err(NvError::LockContention { section: section.to_string() });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}
