//! Exponential backoff for the heartbeat schedule.

use std::time::Duration;

/// Delay before the next probe given the current failure streak.
///
/// `min(base * 2^streak, cap)`, saturating so that a long streak can never
/// overflow past the cap. A streak of zero yields `base`.
pub fn next_interval(base: Duration, streak: u32, cap: Duration) -> Duration {
    let base_ms = base.as_millis().min(u128::from(u64::MAX)) as u64;
    let cap_ms = cap.as_millis().min(u128::from(u64::MAX)) as u64;

    let factor = 2u64.checked_pow(streak).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(factor);

    Duration::from_millis(delay_ms.min(cap_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_millis(240_000);
    const CAP: Duration = Duration::from_millis(600_000);

    #[test]
    fn test_no_failures_uses_base() {
        assert_eq!(next_interval(BASE, 0, CAP), BASE);
    }

    #[test]
    fn test_doubles_per_failure() {
        let base = Duration::from_millis(100);
        let cap = Duration::from_millis(10_000);
        assert_eq!(next_interval(base, 1, cap), Duration::from_millis(200));
        assert_eq!(next_interval(base, 2, cap), Duration::from_millis(400));
        assert_eq!(next_interval(base, 5, cap), Duration::from_millis(3_200));
    }

    #[test]
    fn test_cap_reached_after_three_failures() {
        assert_eq!(next_interval(BASE, 1, CAP), Duration::from_millis(480_000));
        assert_eq!(next_interval(BASE, 3, CAP), CAP);
    }

    #[test]
    fn test_huge_streak_never_exceeds_cap() {
        assert_eq!(next_interval(BASE, 64, CAP), CAP);
        assert_eq!(next_interval(BASE, u32::MAX, CAP), CAP);
    }
}
