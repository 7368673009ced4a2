//! Single-writer guard for training runs.
//!
//! The lock is a file next to the artifact (`<artifact>.lock`) created with
//! `create_new`, so exactly one process can hold it. It records the holder's
//! pid and start time and is removed when the guard is dropped.
//!
//! A holder killed before it could drop the guard leaves the file behind.
//! Waiters treat such a lock as stale once its pid no longer runs (Linux
//! only) or it is older than `stale_secs`, and remove it.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{EmogifError, Result};

/// Lock polling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
    /// Age after which a lock is considered abandoned; 0 disables the check.
    pub stale_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        LockConfig {
            poll_interval_ms: 500,
            timeout_secs: 86_400,
            stale_secs: 86_400,
        }
    }
}

/// Holder details recorded in a lock file.
#[derive(Debug, Clone, PartialEq)]
pub struct LockInfo {
    pub pid: u32,
    pub started: DateTime<Utc>,
}

impl LockInfo {
    fn current() -> Self {
        LockInfo {
            pid: std::process::id(),
            started: Utc::now(),
        }
    }

    /// Parse the `key=value` lines written by [`TrainingLock::try_acquire`].
    pub fn parse(contents: &str) -> Result<Self> {
        let mut pid = None;
        let mut started = None;
        for line in contents.lines() {
            match line.split_once('=') {
                Some(("pid", value)) => {
                    let value = value.trim();
                    pid = Some(
                        value
                            .parse::<u32>()
                            .map_err(|e| anyhow::anyhow!("Invalid lock pid '{value}': {e}"))?,
                    );
                }
                Some(("started", value)) => {
                    let value = value.trim();
                    let time = DateTime::parse_from_rfc3339(value)
                        .map_err(|e| anyhow::anyhow!("Invalid lock start time '{value}': {e}"))?;
                    started = Some(time.with_timezone(&Utc));
                }
                _ => {}
            }
        }

        match (pid, started) {
            (Some(pid), Some(started)) => Ok(LockInfo { pid, started }),
            _ => Err(anyhow::anyhow!("Lock file lacks a pid or start time").into()),
        }
    }

    /// Read the lock file at `path`. `Ok(None)` when it does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn to_file_contents(&self) -> String {
        format!("pid={}\nstarted={}\n", self.pid, self.started.to_rfc3339())
    }

    /// Whether the holder is gone or the lock outlived `config.stale_secs`.
    pub fn is_stale(&self, config: &LockConfig, now: DateTime<Utc>) -> bool {
        if !process_alive(self.pid) {
            return true;
        }
        if config.stale_secs == 0 {
            return false;
        }
        match i64::try_from(config.stale_secs).ok().and_then(TimeDelta::try_seconds) {
            Some(max_age) => now - self.started > max_age,
            None => false,
        }
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    let proc_root = Path::new("/proc");
    // Without procfs nothing can be told; assume alive.
    !proc_root.join("self").exists() || proc_root.join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Path of the lock file guarding `artifact`.
pub fn lock_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    artifact.with_file_name(name)
}

/// An acquired training lock.
#[derive(Debug)]
pub struct TrainingLock {
    path: PathBuf,
}

impl TrainingLock {
    /// Try once to take the lock. `Ok(None)` means another process holds it.
    pub fn try_acquire(artifact: &Path) -> Result<Option<Self>> {
        let path = lock_path(artifact);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(LockInfo::current().to_file_contents().as_bytes())?;
                debug!("Acquired training lock {}", path.display());
                Ok(Some(TrainingLock { path }))
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Block until the lock file for `artifact` is gone, without taking it.
    ///
    /// A stale lock is removed. Fails with [`EmogifError::LockTimeout`]
    /// after `config.timeout_secs`.
    pub fn wait_for_release(artifact: &Path, config: &LockConfig) -> Result<()> {
        let path = lock_path(artifact);
        let deadline = Instant::now() + Duration::from_secs(config.timeout_secs);
        let poll = Duration::from_millis(config.poll_interval_ms.max(1));

        if path.exists() {
            info!(
                "Waiting for another process to finish training ({})",
                path.display()
            );
        }
        while path.exists() {
            if Self::remove_if_stale(&path, config)? {
                continue;
            }
            if Instant::now() >= deadline {
                return Err(EmogifError::LockTimeout(path));
            }
            thread::sleep(poll);
        }
        Ok(())
    }

    /// Remove the lock at `path` when its holder is gone. Returns whether it
    /// was removed.
    fn remove_if_stale(path: &Path, config: &LockConfig) -> Result<bool> {
        let info = match LockInfo::read(path) {
            Ok(Some(info)) => info,
            Ok(None) => return Ok(false),
            // The holder may not have written its details yet.
            Err(e) => {
                debug!("Cannot read training lock {}: {e}", path.display());
                return Ok(false);
            }
        };
        if !info.is_stale(config, Utc::now()) {
            return Ok(false);
        }

        warn!(
            "Removing stale training lock {} (pid {}, started {})",
            path.display(),
            info.pid,
            info.started.to_rfc3339()
        );
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TrainingLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove training lock {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path(Path::new("model/stack_model.bin")),
            PathBuf::from("model/stack_model.bin.lock")
        );
    }

    #[test]
    fn test_exclusive_and_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("model.bin");

        let lock = TrainingLock::try_acquire(&artifact).unwrap().unwrap();
        assert!(lock.path().exists());
        assert!(TrainingLock::try_acquire(&artifact).unwrap().is_none());

        let info = LockInfo::read(lock.path()).unwrap().unwrap();
        assert_eq!(info.pid, std::process::id());
        assert!(!info.is_stale(&LockConfig::default(), Utc::now()));

        drop(lock);
        assert!(!lock_path(&artifact).exists());
        assert!(TrainingLock::try_acquire(&artifact).unwrap().is_some());
    }

    #[test]
    fn test_wait_times_out() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("model.bin");
        let _lock = TrainingLock::try_acquire(&artifact).unwrap().unwrap();

        let config = LockConfig {
            poll_interval_ms: 10,
            timeout_secs: 0,
            ..Default::default()
        };
        let err = TrainingLock::wait_for_release(&artifact, &config).unwrap_err();
        assert!(matches!(err, EmogifError::LockTimeout(_)));
        assert!(err.to_string().contains("model.bin.lock"));
        assert!(err.to_string().contains("remove"));
    }

    #[test]
    fn test_wait_returns_once_released() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("model.bin");
        let lock = TrainingLock::try_acquire(&artifact).unwrap().unwrap();

        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            drop(lock);
        });
        let config = LockConfig {
            poll_interval_ms: 5,
            timeout_secs: 10,
            ..Default::default()
        };
        TrainingLock::wait_for_release(&artifact, &config).unwrap();
        releaser.join().unwrap();
    }

    fn write_lock(artifact: &Path, info: &LockInfo) {
        fs::write(lock_path(artifact), info.to_file_contents()).unwrap();
    }

    #[test]
    fn test_old_lock_is_removed() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("model.bin");
        let info = LockInfo {
            pid: std::process::id(),
            started: Utc::now() - TimeDelta::hours(48),
        };
        write_lock(&artifact, &info);
        assert!(info.is_stale(&LockConfig::default(), Utc::now()));

        let config = LockConfig {
            poll_interval_ms: 10,
            timeout_secs: 0,
            ..Default::default()
        };
        TrainingLock::wait_for_release(&artifact, &config).unwrap();
        assert!(!lock_path(&artifact).exists());
        assert!(TrainingLock::try_acquire(&artifact).unwrap().is_some());
    }

    #[test]
    fn test_age_check_can_be_disabled() {
        let info = LockInfo {
            pid: std::process::id(),
            started: Utc::now() - TimeDelta::days(30),
        };
        let config = LockConfig {
            stale_secs: 0,
            ..Default::default()
        };
        assert!(!info.is_stale(&config, Utc::now()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_lock_of_dead_process_is_removed() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("model.bin");
        // Above any pid_max the kernel allows.
        write_lock(
            &artifact,
            &LockInfo {
                pid: u32::MAX,
                started: Utc::now(),
            },
        );

        let config = LockConfig {
            poll_interval_ms: 10,
            timeout_secs: 0,
            ..Default::default()
        };
        TrainingLock::wait_for_release(&artifact, &config).unwrap();
        assert!(!lock_path(&artifact).exists());
    }

    #[test]
    fn test_malformed_lock_file() {
        let err = LockInfo::parse("pid=abc\nstarted=2024-01-01T00:00:00+00:00\n").unwrap_err();
        assert!(matches!(err, EmogifError::Anyhow(_)));
        assert!(err.to_string().contains("abc"));

        let err = LockInfo::parse("pid=42\n").unwrap_err();
        assert!(matches!(err, EmogifError::Anyhow(_)));

        let info = LockInfo::parse("pid=42\nstarted=2024-01-01T00:00:00+00:00\n").unwrap();
        assert_eq!(info.pid, 42);
    }

    #[test]
    fn test_unreadable_lock_keeps_waiting() {
        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("model.bin");
        fs::write(lock_path(&artifact), "").unwrap();

        let config = LockConfig {
            poll_interval_ms: 10,
            timeout_secs: 0,
            ..Default::default()
        };
        let err = TrainingLock::wait_for_release(&artifact, &config).unwrap_err();
        assert!(matches!(err, EmogifError::LockTimeout(_)));
    }
}
