//! Timestamp sources.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Source of creation timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Wall-clock time that never repeats or goes backwards.
///
/// If the system clock returns an instant at or before the previously issued one, the new
/// timestamp is the previous one plus 1 ms. Records created in quick succession therefore keep
/// a strict creation order.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_after(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
        match previous {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let timestamp = Self::next_after(*last, Utc::now());
        *last = Some(timestamp);
        timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_is_constant() {
        let at = Utc.with_ymd_and_hms(2026, 1, 11, 14, 35, 22).unwrap();
        let clock = FixedClock::new(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
    }

    #[test]
    fn next_after_bumps_repeated_instant() {
        let at = Utc.with_ymd_and_hms(2026, 1, 11, 14, 35, 22).unwrap();
        let next = MonotonicClock::next_after(Some(at), at);
        assert_eq!(next, at + Duration::milliseconds(1));

        let earlier = at - Duration::seconds(5);
        assert_eq!(
            MonotonicClock::next_after(Some(at), earlier),
            at + Duration::milliseconds(1)
        );
    }

    #[test]
    fn next_after_keeps_later_instant() {
        let at = Utc.with_ymd_and_hms(2026, 1, 11, 14, 35, 22).unwrap();
        let later = at + Duration::seconds(1);
        assert_eq!(MonotonicClock::next_after(Some(at), later), later);
        assert_eq!(MonotonicClock::next_after(None, at), at);
    }

    #[test]
    fn monotonic_clock_is_strictly_increasing() {
        let clock = MonotonicClock::new();
        let mut previous = clock.now();
        for _ in 0..100 {
            let current = clock.now();
            assert!(current > previous);
            previous = current;
        }
    }
}
