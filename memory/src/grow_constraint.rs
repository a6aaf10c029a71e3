use getset::{CopyGetters, Setters};

/// Constraints on how an allocation may grow.
///
/// Four knobs:
///
/// - `max_size`: an inclusive upper bound on the size.
/// - `grow_factor`: when the size increases, it increases by at least
///   this factor.  A factor above 1 keeps repeated reservations
///   amortized-linear for containers that copy on grow.
/// - `grow_increment`: when the size increases, it increases by at least
///   this many bytes.
/// - `block_size`: the size is kept to a multiple of this number.
///
/// A default-constructed constraint is unconstrained.  Codecs publish a
/// `GrowConstraint` as a hint, and callers combine it with their own
/// [`GrowCalculator`](crate::GrowCalculator) via [`combine_with`].
///
/// [`combine_with`]: Self::combine_with
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct GrowConstraint {
    /// Size must not exceed this number.
    max_size: usize,
    /// Size should grow by at least this factor.
    grow_factor: f64,
    /// Size should grow by at least this number of bytes.
    grow_increment: usize,
    /// Size should be a multiple of this number of bytes.
    block_size: usize,
}

impl GrowConstraint {
    /// Combine with another constraint, producing the tighter of the two:
    /// the smaller `max_size` and the larger of each of the other knobs.
    pub fn combine_with(&self, other: &GrowConstraint) -> GrowConstraint {
        GrowConstraint {
            max_size: self.max_size.min(other.max_size),
            grow_factor: self.grow_factor.max(other.grow_factor),
            grow_increment: self.grow_increment.max(other.grow_increment),
            block_size: self.block_size.max(other.block_size),
        }
    }
}

impl Default for GrowConstraint {
    /// The unconstrained constraint.
    fn default() -> Self {
        GrowConstraint {
            max_size: usize::MAX,
            grow_factor: 1.0,
            grow_increment: 0,
            block_size: 1,
        }
    }
}
