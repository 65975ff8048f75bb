//! The on-disk state directory layout (spec §6 "On-disk layout"): every
//! path the security core reads or writes is rooted at a single
//! configurable `<state_dir>`, default `~/.unclaude` (or `$UNCLAUDE_HOME`).

use std::io;
use std::path::{Path, PathBuf};

/// Resolved `<state_dir>` and the conventional paths under it.
#[derive(Debug, Clone)]
pub struct UnclaudeHome {
    root: PathBuf,
}

impl UnclaudeHome {
    /// Resolve the state directory.
    ///
    /// Checks `$UNCLAUDE_HOME` first, then falls back to `$HOME/.unclaude`.
    ///
    /// # Errors
    ///
    /// Returns an error if `$UNCLAUDE_HOME` is set but not absolute, or if
    /// neither `$UNCLAUDE_HOME` nor `$HOME` is set.
    pub fn resolve() -> io::Result<Self> {
        let root = if let Ok(custom) = std::env::var("UNCLAUDE_HOME") {
            let path = PathBuf::from(&custom);
            if !path.is_absolute() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "UNCLAUDE_HOME must be an absolute path",
                ));
            }
            path
        } else {
            let home = std::env::var("HOME").map_err(|_| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "neither UNCLAUDE_HOME nor HOME environment variable is set",
                )
            })?;
            PathBuf::from(home).join(".unclaude")
        };

        Ok(Self { root })
    }

    /// Build from an explicit root (used by tests and `--state-dir`).
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create every subdirectory this layout needs, with owner-only
    /// permissions on Unix.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or permission setting fails.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(self.identity_dir())?;
        std::fs::create_dir_all(self.daemon_dir())?;
        std::fs::create_dir_all(self.sessions_dir())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(self.root(), perms.clone())?;
            std::fs::set_permissions(self.identity_dir(), perms)?;
        }
        Ok(())
    }

    /// The state directory root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `identity/` — root and owner keypairs (spec §6).
    #[must_use]
    pub fn identity_dir(&self) -> PathBuf {
        self.root.join("identity")
    }

    /// `audit.db` — the relational audit store.
    #[must_use]
    pub fn audit_db_path(&self) -> PathBuf {
        self.root.join("audit.db")
    }

    /// `daemon/usage.db` — the usage/cost tracker store, colocated with the
    /// rest of the daemon's owned state.
    #[must_use]
    pub fn usage_db_path(&self) -> PathBuf {
        self.daemon_dir().join("usage.db")
    }

    /// `daemon/` — pid file, status, task queue, watcher/proactive state, log.
    #[must_use]
    pub fn daemon_dir(&self) -> PathBuf {
        self.root.join("daemon")
    }

    /// `sessions/` — per-conversation message logs.
    #[must_use]
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    /// `api_keys.yaml` — mode 0600.
    #[must_use]
    pub fn api_keys_path(&self) -> PathBuf {
        self.root.join("api_keys.yaml")
    }

    /// `config.yaml` — non-secret settings.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    /// `proactive.yaml` — the soul file.
    #[must_use]
    pub fn proactive_config_path(&self) -> PathBuf {
        self.root.join("proactive.yaml")
    }

    /// `credentials` — mode 0600; `provider_name -> api_key`.
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.root.join("credentials")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_rooted_under_state_dir() {
        let home = UnclaudeHome::from_path("/tmp/unclaude-test");
        assert_eq!(home.identity_dir(), Path::new("/tmp/unclaude-test/identity"));
        assert_eq!(home.audit_db_path(), Path::new("/tmp/unclaude-test/audit.db"));
        assert_eq!(home.daemon_dir(), Path::new("/tmp/unclaude-test/daemon"));
        assert_eq!(home.config_path(), Path::new("/tmp/unclaude-test/config.yaml"));
    }

    #[test]
    fn ensure_creates_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let home = UnclaudeHome::from_path(dir.path());
        home.ensure().unwrap();
        assert!(home.identity_dir().is_dir());
        assert!(home.daemon_dir().is_dir());
        assert!(home.sessions_dir().is_dir());
    }
}
