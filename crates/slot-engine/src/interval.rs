//! Half-open time ranges and the single overlap test shared by every check.
//!
//! Ranges are `[start, end)`: a range ending exactly when another starts does
//! NOT overlap it. Business breaks, staff breaks and booked appointments all go
//! through [`overlaps`], so a slot ending at 10:00 may sit right before a break
//! starting at 10:00.

use serde::{Deserialize, Serialize};

/// Two intervals `[a_start, a_end)` and `[b_start, b_end)` overlap iff
/// `a_start < b_end && b_start < a_end`.
///
/// This single test covers a slot starting inside the other range, a slot
/// ending inside it, and a slot fully containing it.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// A half-open `[start, end)` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange<T> {
    pub start: T,
    pub end: T,
}

impl<T: PartialOrd + Copy> TimeRange<T> {
    pub fn new(start: T, end: T) -> Self {
        Self { start, end }
    }

    /// `true` when `end <= start`; such a range never overlaps anything.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &TimeRange<T>) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && overlaps(self.start, self.end, other.start, other.end)
    }

    /// `other` lies entirely inside `self` (shared endpoints allowed).
    pub fn contains(&self, other: &TimeRange<T>) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}
