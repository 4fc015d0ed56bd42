//! Logical and wall-clock time representations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A per-stream logical timestamp.
///
/// Logical time orders packets within a stream and is unrelated to
/// wall-clock time. The value `UNSET` marks a field that carries no
/// timestamp at all.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogicalTime(i64);

impl LogicalTime {
    /// Sentinel for "no timestamp".
    pub const UNSET: Self = Self(i64::MIN);
    /// Smallest assignable timestamp.
    pub const MIN: Self = Self(i64::MIN + 1);
    /// Largest assignable timestamp.
    pub const MAX: Self = Self(i64::MAX);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    pub const fn is_unset(self) -> bool {
        self.0 == i64::MIN
    }

    /// The next logical instant, saturating at `MAX`.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for LogicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            f.write_str("LogicalTime(unset)")
        } else {
            write!(f, "LogicalTime({})", self.0)
        }
    }
}

/// A wall-clock instant in microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WallTime(i64);

impl WallTime {
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    /// The current wall-clock time. A clock before the epoch reads as 0.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Self(micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_is_not_an_assignable_timestamp() {
        assert!(LogicalTime::UNSET.is_unset());
        assert!(!LogicalTime::MIN.is_unset());
        assert!(LogicalTime::UNSET < LogicalTime::MIN);
    }

    #[test]
    fn next_saturates_at_max() {
        assert_eq!(LogicalTime::new(4).next(), LogicalTime::new(5));
        assert_eq!(LogicalTime::MAX.next(), LogicalTime::MAX);
    }

    #[test]
    fn wall_time_orders_by_micros() {
        assert!(WallTime::from_micros(10) < WallTime::from_micros(11));
        assert_eq!(WallTime::from_micros(10).micros(), 10);
        assert!(WallTime::now() > WallTime::from_micros(0));
    }
}
