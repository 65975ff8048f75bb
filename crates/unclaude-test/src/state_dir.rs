//! Temporary `<state_dir>` fixture (spec §6 on-disk layout).

use tempfile::TempDir;

/// Create a fresh temporary directory laid out like `~/.unclaude`, with the
/// `identity/`, `sessions/`, and `daemon/` subdirectories pre-created.
///
/// The returned [`TempDir`] must be kept alive for the duration of the test;
/// dropping it removes the directory.
///
/// # Panics
///
/// Panics if the temp directory or its subdirectories cannot be created —
/// acceptable in test-only code, never reached in library code.
#[must_use]
pub fn temp_state_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp state dir");
    for sub in ["identity", "sessions", "daemon"] {
        std::fs::create_dir_all(dir.path().join(sub)).expect("create state subdir");
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_creates_expected_subdirs() {
        let dir = temp_state_dir();
        assert!(dir.path().join("identity").is_dir());
        assert!(dir.path().join("sessions").is_dir());
        assert!(dir.path().join("daemon").is_dir());
    }
}
