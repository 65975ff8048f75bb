//! Per-invocation check context (spec §4.1 `check`/`use`: `{path?, command?, url?}`).

/// The resource a particular invocation touches, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckContext<'a> {
    /// Filesystem path being accessed.
    pub path: Option<&'a str>,
    /// Shell command being run.
    pub command: Option<&'a str>,
    /// URL being fetched/posted/connected to.
    pub url: Option<&'a str>,
}

impl<'a> CheckContext<'a> {
    /// No resource context (capability presence/TTL/quota checks only).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Context carrying a path.
    #[must_use]
    pub fn path(path: &'a str) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    /// Context carrying a command.
    #[must_use]
    pub fn command(command: &'a str) -> Self {
        Self {
            command: Some(command),
            ..Self::default()
        }
    }

    /// Context carrying a URL.
    #[must_use]
    pub fn url(url: &'a str) -> Self {
        Self {
            url: Some(url),
            ..Self::default()
        }
    }
}
