//! Request/task correlation context.
//!
//! Wraps a `tracing` span with a stable correlation ID so audit events,
//! session messages, and log lines for one daemon iteration can be tied
//! together without threading the ID through every function signature.

use tracing::Span;
use uuid::Uuid;

/// A correlation context for one daemon iteration or CLI invocation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: Uuid,
    component: String,
    operation: Option<String>,
}

impl RequestContext {
    /// Start a new context for `component` (e.g. `"daemon"`, `"policy"`).
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            component: component.into(),
            operation: None,
        }
    }

    /// Attach an operation label (e.g. `"agent_iteration"`).
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// The correlation ID, suitable for inclusion in audit event data.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Build the `tracing` span for this context.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "request",
            correlation_id = %self.correlation_id,
            component = %self.component,
            operation = self.operation.as_deref().unwrap_or("-"),
        )
    }

    /// Enter the span, returning a guard that exits it on drop.
    #[must_use]
    pub fn enter(&self) -> RequestGuard {
        RequestGuard {
            _entered: self.span().entered(),
        }
    }
}

/// Guard returned by [`RequestContext::enter`]; exits the span on drop.
pub struct RequestGuard {
    _entered: tracing::span::EnteredSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_carries_a_stable_id() {
        let ctx = RequestContext::new("daemon").with_operation("poll");
        let id = ctx.correlation_id();
        assert_eq!(ctx.correlation_id(), id);
    }
}
