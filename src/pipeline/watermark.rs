//! Processing watermark.
//!
//! Mentions created before the watermark have already been handled. The
//! dispatcher owns the only instance and threads it through each cycle by
//! value.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    /// Start at `at`; live runs pass the current time, debug runs a fixed one.
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// True when a mention created at `created_at` was covered by an earlier cycle.
    pub fn already_processed(&self, created_at: DateTime<Utc>) -> bool {
        created_at < self.0
    }

    /// Move the watermark to `now` at the end of a cycle.
    ///
    /// Never moves backwards, even if the wall clock does.
    pub fn advance(self, now: DateTime<Utc>) -> Self {
        Self(self.0.max(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 5, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_strictly_before_is_processed() {
        let watermark = Watermark::starting_at(at(12));
        assert!(watermark.already_processed(at(11)));
        assert!(!watermark.already_processed(at(12)));
        assert!(!watermark.already_processed(at(13)));
    }

    #[test]
    fn test_advance_moves_forward() {
        let watermark = Watermark::starting_at(at(12)).advance(at(13));
        assert_eq!(watermark.timestamp(), at(13));
    }

    #[test]
    fn test_advance_never_moves_back() {
        let watermark = Watermark::starting_at(at(12)).advance(at(12) - Duration::seconds(5));
        assert_eq!(watermark.timestamp(), at(12));
    }
}
