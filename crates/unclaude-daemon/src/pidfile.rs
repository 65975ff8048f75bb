//! Pid file management (spec §6): a plain integer on disk; "running" means
//! the file exists *and* the process it names is still alive.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::DaemonResult;

/// Write the current process id to `<state_dir>/daemon.pid`.
pub async fn write_pid_file(path: &Path, pid: u32) -> DaemonResult<()> {
    fs::write(path, pid.to_string()).await?;
    Ok(())
}

/// Remove the pid file, if present. Not an error if it's already gone.
pub async fn remove_pid_file(path: &Path) -> DaemonResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error.into()),
    }
}

/// Read the pid recorded in `path`, if the file exists and parses.
pub async fn read_pid_file(path: &Path) -> DaemonResult<Option<u32>> {
    match fs::read_to_string(path).await {
        Ok(body) => Ok(body.trim().parse().ok()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Returns whether a process with the given pid is alive, by sending it
/// signal 0 (the POSIX "check the process exists" idiom — no signal is
/// actually delivered).
#[cfg(unix)]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn process_is_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
#[must_use]
pub fn process_is_alive(_pid: u32) -> bool {
    false
}

/// Returns whether the daemon described by the pid file at `path` is
/// currently running.
pub async fn is_running(path: &Path) -> DaemonResult<bool> {
    Ok(match read_pid_file(path).await? {
        Some(pid) => process_is_alive(pid),
        None => false,
    })
}

/// The conventional pid file path under a state directory.
#[must_use]
pub fn pid_file_path(state_dir: &Path) -> PathBuf {
    state_dir.join("daemon.pid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = pid_file_path(dir.path());
        write_pid_file(&path, 999_999).await.unwrap();
        assert_eq!(read_pid_file(&path).await.unwrap(), Some(999_999));
        remove_pid_file(&path).await.unwrap();
        assert_eq!(read_pid_file(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn a_pid_that_surely_does_not_exist_reports_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = pid_file_path(dir.path());
        write_pid_file(&path, 999_999).await.unwrap();
        assert!(!is_running(&path).await.unwrap());
    }

    #[tokio::test]
    async fn our_own_pid_reports_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = pid_file_path(dir.path());
        write_pid_file(&path, std::process::id()).await.unwrap();
        assert!(is_running(&path).await.unwrap());
    }
}
