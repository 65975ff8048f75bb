//! CLI output styling.

use colored::Colorize;

/// Small set of consistently-colored message formatters, shared by every
/// command module.
pub(crate) struct Theme;

impl Theme {
    /// Format a section header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "─".repeat(50).dimmed().to_string()
    }

    /// Format a short id (task id, session id, key id).
    pub(crate) fn short_id(id: &str) -> String {
        let short = if id.len() > 10 { &id[..10] } else { id };
        format!("{}", short.cyan())
    }

    /// Format a UTC timestamp for table display.
    pub(crate) fn timestamp(dt: &chrono::DateTime<chrono::Utc>) -> String {
        dt.format("%Y-%m-%d %H:%M").to_string().dimmed().to_string()
    }
}
