use std::fmt;

use tracing::trace;

use crate::buffer_view::BufferView;
use crate::grow_calculator::{GrowCalculator, GrowError};
use crate::resource::{MemoryResource, OwnedBuffer};
use crate::rw_buffer::RwBuffer;

/// Owned, growable, contiguous buffer split into a read part and a write
/// part.
///
/// Growing reallocates and copies the read part, so any previously
/// obtained pointer or slice into the buffer is invalidated by a
/// successful reserve; callers re-fetch after growing.
///
/// The buffer can be configured with a *default capacity*.  The first
/// reservation that fits within it allocates one buffer of exactly that
/// size, and that allocation is retained until the `ManagedBuffer` is
/// dropped: growing beyond it switches to a dynamic allocation, and
/// [`reset`] reinstalls the default buffer.  This reduces allocation
/// churn when the same buffer is reused for many mostly-small payloads.
///
/// Growth is governed by the configured [`GrowCalculator`]; all
/// allocations go through the configured [`MemoryResource`].  No method
/// panics on allocation failure; failures surface as [`GrowError`].
///
/// [`reset`]: Self::reset
pub struct ManagedBuffer {
    rw: RwBuffer,
    /// Retained across resets once allocated.
    default_buffer: Option<OwnedBuffer>,
    /// The current oversized allocation, if the default did not suffice.
    dynamic_buffer: Option<OwnedBuffer>,
    default_capacity: usize,
    grow_calculator: GrowCalculator,
    resource: MemoryResource,
}

impl ManagedBuffer {
    pub fn new(resource: MemoryResource) -> Self {
        Self::with_default_capacity(0, resource)
    }

    /// Create a buffer whose first allocation, if it fits, will be one
    /// default buffer of `default_capacity` bytes.
    pub fn with_default_capacity(default_capacity: usize, resource: MemoryResource) -> Self {
        ManagedBuffer {
            rw: RwBuffer::new(BufferView::null()),
            default_buffer: None,
            dynamic_buffer: None,
            default_capacity,
            grow_calculator: GrowCalculator::default(),
            resource,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rw.capacity()
    }

    pub fn position(&self) -> usize {
        self.rw.position()
    }

    pub fn read_part(&self) -> BufferView {
        self.rw.read_part()
    }

    pub fn write_part(&self) -> BufferView {
        self.rw.write_part()
    }

    pub fn read_slice(&self) -> &[u8] {
        self.rw.read_slice()
    }

    pub fn write_slice(&mut self) -> &mut [u8] {
        self.rw.write_slice()
    }

    pub fn set_position(&mut self, new_position: usize) {
        self.rw.set_position(new_position)
    }

    pub fn increase_position(&mut self, increment: usize) {
        self.rw.increase_position(increment)
    }

    pub fn move_position(&mut self, delta: isize) {
        self.rw.move_position(delta)
    }

    pub fn grow_calculator(&self) -> &GrowCalculator {
        &self.grow_calculator
    }

    /// Replace the grow calculator.
    ///
    /// A calculator whose maximum is below the current capacity does not
    /// shrink the buffer, but subsequent reservations will fail.
    pub fn set_grow_calculator(&mut self, grow_calculator: GrowCalculator) {
        self.grow_calculator = grow_calculator;
    }

    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }

    /// Ensure the total capacity is at least `requested_size`.
    ///
    /// On success the object may have been reallocated, following the
    /// rules of the grow calculator; on error it is unchanged.
    pub fn reserve_total_size(&mut self, requested_size: usize) -> Result<(), GrowError> {
        let capacity = self.capacity();
        let new_capacity = self
            .grow_calculator
            .compute_new_size(capacity, requested_size)?;
        if new_capacity > capacity {
            if new_capacity <= self.default_capacity {
                // Capacity below the default capacity is never allocated,
                // so this can only happen on the very first allocation.
                debug_assert!(capacity == 0);
                debug_assert!(self.default_buffer.is_none());
                let buffer = OwnedBuffer::allocate(&self.resource, self.default_capacity)
                    .ok_or(GrowError::OutOfMemory)?;
                let view = buffer.view();
                self.default_buffer = Some(buffer);
                self.replace_buffer(view);
            } else {
                let buffer = OwnedBuffer::allocate(&self.resource, new_capacity)
                    .ok_or(GrowError::OutOfMemory)?;
                let view = buffer.view();
                self.replace_buffer(view);
                // Frees the previous dynamic allocation; the default
                // buffer, if any, stays around for reset.
                self.dynamic_buffer = Some(buffer);
            }
            trace!(requested_size, new_capacity, "managed buffer grown");
        }
        Ok(())
    }

    /// Ensure the write part has at least `requested_write_size` bytes.
    pub fn reserve_write_size(&mut self, requested_write_size: usize) -> Result<(), GrowError> {
        let read_size = self.rw.position();
        if requested_write_size > usize::MAX - read_size {
            return Err(GrowError::ExceedsMaxSize);
        }
        self.reserve_total_size(read_size + requested_write_size)
    }

    /// Make the read part empty and drop any dynamic allocation.  The
    /// write part becomes the default buffer when one has been
    /// allocated, and empty otherwise.
    pub fn reset(&mut self) {
        self.dynamic_buffer = None;
        let view = match &self.default_buffer {
            Some(buffer) => buffer.view(),
            None => BufferView::null(),
        };
        self.rw = RwBuffer::new(view);
    }

    /// Point the buffer at `new_view`, preserving the read part.
    fn replace_buffer(&mut self, mut new_view: BufferView) {
        let read_size = self.rw.position();
        debug_assert!(read_size <= new_view.size());
        if read_size > 0 {
            new_view.as_mut_slice()[..read_size].copy_from_slice(self.rw.read_slice());
        }
        self.rw = RwBuffer::with_position(new_view, read_size);
    }
}

impl fmt::Debug for ManagedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedBuffer")
            .field("capacity", &self.capacity())
            .field("position", &self.position())
            .field("default_capacity", &self.default_capacity)
            .finish()
    }
}
