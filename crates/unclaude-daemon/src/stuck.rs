//! Stuck-loop detection for the agent iteration loop (spec §4.8, S6).
//!
//! Three independent signals over the last 20 `(tool_name, args_hash)`
//! calls: three identical calls in a row, one tool dominating recent
//! history, or several iterations in a row with no successful tool call.
//! Any signal raises a warning; the third warning bails the task instead
//! of nudging it again.

use std::collections::VecDeque;

const HISTORY_CAPACITY: usize = 20;
const REPEAT_WINDOW: usize = 5;
const REPEAT_THRESHOLD: usize = 3;
const DOMINANCE_WINDOW: usize = 8;
const DOMINANCE_THRESHOLD: usize = 6;
const NO_SUCCESS_THRESHOLD: u32 = 5;
const MAX_WARNINGS: u32 = 3;

/// The sentinel injected as the final, tools-disabled LLM turn when a task
/// is judged stuck past recovery (spec §4.8).
pub const BAIL_SENTINEL: &str = "BAIL";

/// The outcome of a single `detect` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StuckSignal {
    /// No stuck pattern observed this iteration.
    Clear,
    /// A stuck pattern was observed; inject this text as a warning to the
    /// model and continue.
    Warning(String),
    /// The task has been warned three times and should be abandoned with
    /// one final tools-disabled call.
    Bail,
}

/// Tracks recent tool-call history for one task's iteration loop.
#[derive(Debug)]
pub struct StuckDetector {
    calls: VecDeque<(String, u64)>,
    consecutive_no_success: u32,
    warning_count: u32,
}

impl Default for StuckDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl StuckDetector {
    /// Build an empty detector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: VecDeque::with_capacity(HISTORY_CAPACITY),
            consecutive_no_success: 0,
            warning_count: 0,
        }
    }

    /// Record one tool call made during the current iteration.
    pub fn record_call(&mut self, tool_name: &str, args_hash: u64) {
        if self.calls.len() == HISTORY_CAPACITY {
            self.calls.pop_front();
        }
        self.calls.push_back((tool_name.to_string(), args_hash));
    }

    /// Record how many tool calls in the current iteration succeeded.
    pub fn record_iteration_successes(&mut self, successful_tool_calls: usize) {
        if successful_tool_calls == 0 {
            self.consecutive_no_success = self.consecutive_no_success.saturating_add(1);
        } else {
            self.consecutive_no_success = 0;
        }
    }

    fn last(&self, window: usize) -> Vec<&(String, u64)> {
        let start = self.calls.len().saturating_sub(window);
        self.calls.iter().skip(start).collect()
    }

    fn repeats_last_call(&self) -> bool {
        let window = self.last(REPEAT_WINDOW);
        let Some(last) = window.last() else {
            return false;
        };
        window
            .iter()
            .rev()
            .take(REPEAT_THRESHOLD)
            .all(|entry| *entry == last)
            && window.len() >= REPEAT_THRESHOLD
    }

    fn tool_dominates(&self) -> Option<String> {
        let window = self.last(DOMINANCE_WINDOW);
        if window.len() < DOMINANCE_THRESHOLD {
            return None;
        }
        let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        for (name, _) in &window {
            *counts.entry(name.as_str()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .find(|(_, count)| *count >= DOMINANCE_THRESHOLD)
            .map(|(name, _)| name.to_string())
    }

    /// Evaluate the current history and return the signal for `iteration`.
    pub fn detect(&mut self, iteration: u32) -> StuckSignal {
        let message = if self.repeats_last_call() {
            let tool_name = self
                .calls
                .back()
                .map(|(name, _)| name.clone())
                .unwrap_or_default();
            Some(format!(
                "iteration {iteration}: repeating the exact same '{tool_name}' call"
            ))
        } else if let Some(tool_name) = self.tool_dominates() {
            Some(format!(
                "iteration {iteration}: '{tool_name}' dominates recent tool calls without progress"
            ))
        } else if self.consecutive_no_success >= NO_SUCCESS_THRESHOLD {
            Some(format!(
                "iteration {iteration}: {} consecutive iterations with no successful tool call",
                self.consecutive_no_success
            ))
        } else {
            None
        };

        let Some(message) = message else {
            return StuckSignal::Clear;
        };

        self.warning_count = self.warning_count.saturating_add(1);
        if self.warning_count >= MAX_WARNINGS {
            StuckSignal::Bail
        } else {
            StuckSignal::Warning(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_when_history_is_short() {
        let mut detector = StuckDetector::new();
        detector.record_call("bash_execute", 1);
        assert_eq!(detector.detect(1), StuckSignal::Clear);
    }

    #[test]
    fn three_identical_calls_warn_then_bail_on_third_occurrence() {
        let mut detector = StuckDetector::new();

        // The repeat signal needs 3 identical calls in history before it can
        // fire, so the first two iterations stay clear.
        detector.record_call("bash_execute", 42);
        assert_eq!(detector.detect(1), StuckSignal::Clear);
        detector.record_call("bash_execute", 42);
        assert_eq!(detector.detect(2), StuckSignal::Clear);

        // Iterations 3, 4, 5 each see 3 identical calls in a row and raise
        // warnings 1 and 2, then bail on the third.
        for iteration in 3..=5 {
            detector.record_call("bash_execute", 42);
            let signal = detector.detect(iteration);
            if iteration < 5 {
                match signal {
                    StuckSignal::Warning(message) => {
                        assert!(message.contains("repeating the exact same 'bash_execute' call"));
                    }
                    other => panic!("expected a warning at iteration {iteration}, got {other:?}"),
                }
            } else {
                assert_eq!(signal, StuckSignal::Bail);
            }
        }
    }

    #[test]
    fn dominant_tool_without_exact_repeats_warns() {
        let mut detector = StuckDetector::new();
        let args = [1_u64, 2, 3, 4, 5, 6, 7, 8];
        for hash in args {
            detector.record_call("web_search", hash);
        }
        assert!(matches!(detector.detect(9), StuckSignal::Warning(_)));
    }

    #[test]
    fn repeated_failures_without_success_warn() {
        let mut detector = StuckDetector::new();
        for _ in 0..5 {
            detector.record_iteration_successes(0);
        }
        assert!(matches!(detector.detect(5), StuckSignal::Warning(_)));
    }

    #[test]
    fn a_success_resets_the_no_success_streak() {
        let mut detector = StuckDetector::new();
        for _ in 0..4 {
            detector.record_iteration_successes(0);
        }
        detector.record_iteration_successes(1);
        assert_eq!(detector.detect(5), StuckSignal::Clear);
    }
}
