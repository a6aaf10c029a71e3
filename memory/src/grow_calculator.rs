use getset::{CopyGetters, Setters};
use thiserror::Error;
use tracing::trace;

use crate::grow_constraint::GrowConstraint;
use crate::math;

/// Why a grow operation failed.  The data structure is unchanged in
/// either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GrowError {
    /// The existing or requested size exceeds the configured maximum.
    #[error("requested size exceeds the configured maximum size")]
    ExceedsMaxSize,
    /// Memory allocation failed.
    #[error("memory allocation failed")]
    OutOfMemory,
}

/// Policy that computes how much to grow an allocation.
///
/// Same four knobs as [`GrowConstraint`], but with defaults suitable for
/// a growable buffer, and with the [`compute_new_size`] decision
/// procedure.
///
/// [`compute_new_size`]: Self::compute_new_size
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct GrowCalculator {
    /// Size must not exceed this number.
    max_size: usize,
    /// Size grows by at least this factor.
    grow_factor: f64,
    /// Size grows by at least this number of bytes.
    grow_increment: usize,
    /// Size is rounded up to a multiple of this number of bytes.
    block_size: usize,
}

impl GrowCalculator {
    /// By default, limit memory to 1 GiB.
    pub const DEFAULT_MAX_SIZE: usize = 1024 * 1024 * 1024;
    /// By default, double the size in each allocation.
    pub const DEFAULT_GROW_FACTOR: f64 = 2.0;
    /// By default, allocate at least 1 KiB more in each call.
    pub const DEFAULT_GROW_INCREMENT: usize = 1024;
    /// By default, allocate multiples of 1 KiB.
    pub const DEFAULT_BLOCK_SIZE: usize = 1024;

    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the new size for a grow request.
    ///
    /// - Errors with [`GrowError::ExceedsMaxSize`] when the requested or
    ///   the existing size exceeds `max_size`.
    /// - Never shrinks: a request at or below the existing size returns
    ///   the existing size.
    /// - Otherwise grows by at least the grow factor and the grow
    ///   increment, rounds up to a multiple of the block size, and clamps
    ///   to `max_size`.
    ///
    /// All arithmetic saturates rather than overflowing.
    pub fn compute_new_size(
        &self,
        old_size: usize,
        requested_size: usize,
    ) -> Result<usize, GrowError> {
        if old_size.max(requested_size) > self.max_size {
            return Err(GrowError::ExceedsMaxSize);
        }
        if requested_size <= old_size {
            return Ok(old_size);
        }
        let mut new_size = requested_size;
        new_size = new_size.max(math::multiply_bounded(
            old_size,
            self.grow_factor,
            usize::MAX,
        ));
        new_size = new_size.max(math::add_bounded(
            old_size,
            self.grow_increment,
            usize::MAX,
        ));
        let remainder = new_size % self.block_size;
        if remainder != 0 {
            new_size = math::add_bounded(new_size, self.block_size - remainder, usize::MAX);
        }
        new_size = new_size.min(self.max_size);
        debug_assert!(new_size >= requested_size);
        trace!(old_size, requested_size, new_size, "compute_new_size");
        Ok(new_size)
    }

    /// Combine this calculator with a published [`GrowConstraint`],
    /// producing a calculator with the tighter limits.
    pub fn combine_with(&self, constraint: &GrowConstraint) -> GrowCalculator {
        GrowCalculator {
            max_size: self.max_size.min(constraint.max_size()),
            grow_factor: self.grow_factor.max(constraint.grow_factor()),
            grow_increment: self.grow_increment.max(constraint.grow_increment()),
            block_size: self.block_size.max(constraint.block_size()),
        }
    }
}

impl Default for GrowCalculator {
    fn default() -> Self {
        GrowCalculator {
            max_size: Self::DEFAULT_MAX_SIZE,
            grow_factor: Self::DEFAULT_GROW_FACTOR,
            grow_increment: Self::DEFAULT_GROW_INCREMENT,
            block_size: Self::DEFAULT_BLOCK_SIZE,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn calculator() -> GrowCalculator {
        let mut calculator = GrowCalculator::new();
        calculator
            .set_max_size(1000)
            .set_grow_factor(1.5)
            .set_grow_increment(100)
            .set_block_size(101);
        calculator
    }

    #[test]
    fn test_grows_by_increment_and_block_size() {
        assert_eq!(calculator().compute_new_size(0, 1), Ok(101));
    }

    #[test]
    fn test_grows_by_factor() {
        // max(501, 750, 600) rounded up to a multiple of 101.
        assert_eq!(calculator().compute_new_size(500, 501), Ok(808));
    }

    #[test]
    fn test_clamps_to_max_size() {
        assert_eq!(calculator().compute_new_size(700, 701), Ok(1000));
    }

    #[test]
    fn test_rejects_request_above_max_size() {
        assert_eq!(
            calculator().compute_new_size(0, 1001),
            Err(GrowError::ExceedsMaxSize)
        );
    }

    #[test]
    fn test_never_shrinks() {
        assert_eq!(calculator().compute_new_size(500, 100), Ok(500));
        assert_eq!(calculator().compute_new_size(500, 500), Ok(500));
    }

    #[test]
    fn test_zero_request_on_empty() {
        assert_eq!(calculator().compute_new_size(0, 0), Ok(0));
    }

    #[test]
    fn test_saturates_near_usize_max() {
        let mut calculator = GrowCalculator::new();
        calculator.set_max_size(usize::MAX).set_block_size(1024);
        let new_size = calculator
            .compute_new_size(usize::MAX - 10, usize::MAX - 5)
            .unwrap();
        assert_eq!(new_size, usize::MAX);
    }

    #[test]
    fn test_combine_with_constraint() {
        let mut hint = GrowConstraint::default();
        hint.set_grow_increment(128 * 1024).set_max_size(1 << 20);
        let combined = calculator().combine_with(&hint);
        assert_eq!(combined.max_size(), 1000);
        assert_eq!(combined.grow_increment(), 128 * 1024);
        assert_eq!(combined.block_size(), 101);
    }
}
