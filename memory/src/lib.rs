//! Buffer management for the binlog codec.
//!
//! Two families of containers are provided, both split into a "read part"
//! (bytes already produced) and a "write part" (room for bytes still to be
//! produced) by a movable position:
//!
//! - [`ManagedBuffer`]: contiguous, grows by reallocating and copying the
//!   read part.
//! - [`ManagedBufferSequence`]: non-contiguous, grows by appending a new
//!   buffer and never copies payload data.
//!
//! Growth of either container is governed by a [`GrowCalculator`] policy,
//! and all payload allocations route through a caller-supplied
//! [`MemoryResource`].

pub mod buffer_sequence;
pub mod buffer_view;
pub mod grow_calculator;
pub mod grow_constraint;
pub mod managed_buffer;
pub mod managed_buffer_sequence;
pub mod math;
pub mod resource;
pub mod rw_buffer;
pub mod rw_buffer_sequence;

pub use buffer_sequence::BufferSequenceView;
pub use buffer_view::BufferView;
pub use grow_calculator::{GrowCalculator, GrowError};
pub use grow_constraint::GrowConstraint;
pub use managed_buffer::ManagedBuffer;
pub use managed_buffer_sequence::ManagedBufferSequence;
pub use resource::MemoryResource;
pub use rw_buffer::RwBuffer;
pub use rw_buffer_sequence::RwBufferSequence;
