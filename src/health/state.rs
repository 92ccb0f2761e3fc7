//! Failure streak tracking.
//!
//! # State Transitions
//! ```text
//! success → streak = 0
//! failure → streak = streak + 1
//! streak >= max_consecutive_failures → alerting
//! ```

/// Consecutive failed probes since the last success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureStreak(u32);

impl FailureStreak {
    pub fn count(&self) -> u32 {
        self.0
    }

    /// Fold one probe outcome in and return the new count.
    pub fn observe(&mut self, success: bool) -> u32 {
        if success {
            self.0 = 0;
        } else {
            self.0 = self.0.saturating_add(1);
        }
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// True once the streak has reached the alert threshold.
    pub fn is_alerting(&self, max_consecutive_failures: u32) -> bool {
        self.0 >= max_consecutive_failures
    }
}
