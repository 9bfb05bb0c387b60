//! Count/byte-size pair used by every aggregate bucket.

use crate::utils::format::human_bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// A count of records together with their cumulative serialized size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizedCount {
    pub count: u64,
    pub bytes: u64,
}

impl SizedCount {
    pub fn new(count: u64, bytes: u64) -> Self {
        Self { count, bytes }
    }

    /// Fold another bucket into this one
    pub fn merge(&mut self, other: SizedCount) {
        self.count += other.count;
        self.bytes += other.bytes;
    }
}

/// Adding a byte size records one more entry of that size
impl AddAssign<u64> for SizedCount {
    fn add_assign(&mut self, bytes: u64) {
        self.count += 1;
        self.bytes += bytes;
    }
}

impl fmt::Display for SizedCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.count, human_bytes(self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assign_counts_entries() {
        let mut sized = SizedCount::default();
        sized += 100;
        sized += 24;
        assert_eq!(sized, SizedCount::new(2, 124));
    }

    #[test]
    fn test_merge() {
        let mut left = SizedCount::new(3, 1000);
        left.merge(SizedCount::new(2, 500));
        assert_eq!(left, SizedCount::new(5, 1500));
    }

    #[test]
    fn test_display() {
        assert_eq!(SizedCount::new(7, 3200).to_string(), "7 (3.1KiB)");
        assert_eq!(SizedCount::default().to_string(), "0 (0.0B)");
    }
}
