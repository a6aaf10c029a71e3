//! GTID algebra: transaction identifier value types and interval-based
//! identifier sets.
//!
//! A global transaction identifier is `(uuid, tag, gno)`: the source
//! identity (UUID plus an optional tag distinguishing logical streams)
//! and a positive sequence number within that identity.

pub mod gno_interval;
pub mod gtid;
pub mod gtid_set;
pub mod tag;
pub mod tsid;

pub use gno_interval::GnoInterval;
pub use gtid::Gtid;
pub use gtid_set::GtidSet;
pub use tag::Tag;
pub use tsid::Tsid;

/// The 16-byte source identifier.
pub use uuid::Uuid;

/// Sequence number within one source identity.
pub type Gno = i64;

/// Separator between UUID, tag, and intervals in text form.
pub const GTID_SEPARATOR: char = ':';

/// Separator between UUID sets in a GTID set's text form.
pub const GTID_SET_SEPARATOR: char = ',';

/// Separator between the endpoints of an interval in text form.
pub const GNO_START_END_SEPARATOR: char = '-';

/// Maximal number of characters in a tag.
pub const TAG_MAX_LENGTH: usize = 32;

/// Smallest valid GNO.
pub const MIN_GNO: Gno = 1;

/// Largest valid GNO.
pub const MAX_GNO: Gno = i64::MAX - 1;

/// Binary encoding flavor of a GTID: the untagged (legacy) form omits
/// the tag bytes entirely.  The flavor is chosen by the writer out of
/// band, never inferred from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GtidFormat {
    Untagged,
    Tagged,
}
