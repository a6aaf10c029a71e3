use std::fmt;

use serde::Serialize;

use super::{Gno, GNO_START_END_SEPARATOR};

/// A closed interval `[start, end]` of GNOs.
///
/// Stored as `start` and the first GNO after the end, so an interval of
/// one element has `next_gno_after_end == start + 1`.  A valid interval
/// has `start > 0` and at least one element.
///
/// Ordering is lexicographic on `(start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GnoInterval {
    start: Gno,
    next_gno_after_end: Gno,
}

impl GnoInterval {
    /// Interval from `start` to `end`, both inclusive.  No validity
    /// check is performed; see [`is_valid`](Self::is_valid).
    pub fn new(start: Gno, end: Gno) -> Self {
        GnoInterval {
            start,
            next_gno_after_end: end + 1,
        }
    }

    pub fn get_start(&self) -> Gno {
        self.start
    }

    pub fn get_end(&self) -> Gno {
        self.next_gno_after_end - 1
    }

    /// Number of GNOs in the interval.
    pub fn count(&self) -> u64 {
        (self.next_gno_after_end - self.start) as u64
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.next_gno_after_end && self.start > 0
    }

    /// True when the intervals share at least one GNO.
    pub fn intersects(&self, other: &GnoInterval) -> bool {
        let other_starts_in_this =
            other.get_start() >= self.start && other.get_start() < self.next_gno_after_end;
        let this_starts_in_other =
            self.start >= other.get_start() && self.start <= other.get_end();
        other_starts_in_this || this_starts_in_other
    }

    /// True when the intervals do not intersect but no GNO lies between
    /// them.
    pub fn contiguous(&self, other: &GnoInterval) -> bool {
        other.get_start() == self.next_gno_after_end || other.get_end() + 1 == self.start
    }

    pub fn intersects_or_contiguous(&self, other: &GnoInterval) -> bool {
        self.intersects(other) || self.contiguous(other)
    }

    /// Extend this interval to the union with `other`.
    ///
    /// Returns true when the union was formed; false when the intervals
    /// are disjoint and non-contiguous, in which case this interval is
    /// unchanged.
    pub fn add(&mut self, other: &GnoInterval) -> bool {
        if !self.intersects_or_contiguous(other) {
            return false;
        }
        self.start = self.start.min(other.get_start());
        self.next_gno_after_end = self.next_gno_after_end.max(other.get_end() + 1);
        true
    }

    /// True when `gno` lies within the interval.
    pub fn contains(&self, gno: Gno) -> bool {
        gno >= self.start && gno < self.next_gno_after_end
    }
}

impl fmt::Display for GnoInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.get_end() {
            write!(f, "{}", self.start)
        } else {
            write!(
                f,
                "{}{}{}",
                self.start,
                GNO_START_END_SEPARATOR,
                self.get_end()
            )
        }
    }
}
