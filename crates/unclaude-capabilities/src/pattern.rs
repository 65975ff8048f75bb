//! Shell-glob pattern matching shared by capability scopes and the sandbox
//! policy (spec §4.1: "Pattern match uses shell-glob semantics (`*`, `?`,
//! `**` across path separators for paths)").

use globset::{Glob, GlobMatcher};

use crate::error::{CapabilityError, CapabilityResult};

/// A compiled glob pattern plus its source text (kept for audit messages).
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
    /// Returns [`CapabilityError::InvalidPattern`] if the glob syntax is invalid.
    pub fn compile(pattern: impl Into<String>) -> CapabilityResult<Self> {
        let source = pattern.into();
        let glob = Glob::new(&source).map_err(|e| CapabilityError::InvalidPattern {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source,
            matcher: glob.compile_matcher(),
        })
    }

    /// The original pattern text.
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

/// Compile a list of pattern strings, collecting the first compile error.
///
/// # Errors
///
/// Returns [`CapabilityError::InvalidPattern`] if any pattern fails to compile.
pub fn compile_all<I, S>(patterns: I) -> CapabilityResult<Vec<GlobPattern>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    patterns.into_iter().map(GlobPattern::compile).collect()
}

/// `true` if `candidate` matches any pattern, or if `patterns` is empty
/// (the "unrestricted" convention used throughout §3/§4).
#[must_use]
pub fn matches_any_or_unrestricted(patterns: &[GlobPattern], candidate: &str) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| p.matches(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pattern_list_is_unrestricted() {
        assert!(matches_any_or_unrestricted(&[], "/anything"));
    }

    #[test]
    fn double_star_crosses_separators() {
        let patterns = compile_all(["/home/user/**"]).unwrap();
        assert!(matches_any_or_unrestricted(&patterns, "/home/user/a/b/c.txt"));
        assert!(!matches_any_or_unrestricted(&patterns, "/etc/passwd"));
    }

    #[test]
    fn single_star_matches_one_segment() {
        let patterns = compile_all(["~/.ssh/*"]).unwrap();
        assert!(matches_any_or_unrestricted(&patterns, "~/.ssh/id_rsa"));
    }
}
