//! Shell-glob matching shared by the sandbox's path/command/domain lists.
//! Mirrors `unclaude-capabilities::pattern` but kept crate-local to avoid a
//! circular dependency between the two pillars (spec §4.3: they compose
//! only inside the policy engine).

use globset::{Glob, GlobMatcher};

use crate::error::{SandboxError, SandboxResult};

/// A compiled glob pattern plus its source text.
#[derive(Clone)]
pub struct GlobPattern {
    source: String,
    matcher: GlobMatcher,
}

impl GlobPattern {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::InvalidPattern`] if the glob syntax is invalid.
    pub fn compile(pattern: impl Into<String>) -> SandboxResult<Self> {
        let source = pattern.into();
        let glob = Glob::new(&source).map_err(|e| SandboxError::InvalidPattern {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source,
            matcher: glob.compile_matcher(),
        })
    }

    /// Original pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether `candidate` matches.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.matcher.is_match(candidate)
    }
}

impl std::fmt::Debug for GlobPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GlobPattern({:?})", self.source)
    }
}

/// Compile a list of pattern strings.
///
/// # Errors
///
/// Returns [`SandboxError::InvalidPattern`] if any pattern fails to compile.
pub fn compile_all<I, S>(patterns: I) -> SandboxResult<Vec<GlobPattern>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    patterns.into_iter().map(GlobPattern::compile).collect()
}

/// First pattern in `patterns` that matches `candidate`, if any.
#[must_use]
pub fn first_match<'a>(patterns: &'a [GlobPattern], candidate: &str) -> Option<&'a GlobPattern> {
    patterns.iter().find(|p| p.matches(candidate))
}
