use tracing::trace;

use crate::buffer_sequence::BufferSequenceView;
use crate::buffer_view::BufferView;
use crate::grow_calculator::{GrowCalculator, GrowError};
use crate::resource::MemoryResource;
use crate::rw_buffer_sequence::SequenceState;

/// Owned, growable, non-contiguous buffer sequence.
///
/// Unlike [`ManagedBuffer`](crate::ManagedBuffer), growing never moves
/// payload data: a new buffer is allocated and appended to the write
/// part.  The container of views may reallocate, so iterators and views
/// are invalidated by a grow, but pointers to payload bytes stay valid
/// for the life of the sequence.
///
/// The read/write split follows the canonical null-slot/split-slot shape
/// of [`RwBufferSequence`](crate::RwBufferSequence).
///
/// Growth is governed by the configured [`GrowCalculator`]; payload
/// allocations go through the configured [`MemoryResource`].  Methods do
/// not panic on allocation failure.
pub struct ManagedBufferSequence {
    buffers: Vec<BufferView>,
    state: SequenceState,
    grow_calculator: GrowCalculator,
    resource: MemoryResource,
}

impl ManagedBufferSequence {
    pub const DEFAULT_BUFFER_COUNT: usize = 16;

    pub fn new(grow_calculator: GrowCalculator, resource: MemoryResource) -> Self {
        Self::with_buffer_count(grow_calculator, resource, Self::DEFAULT_BUFFER_COUNT)
    }

    /// `default_buffer_count` pre-sizes the view container (not the
    /// payload buffers).
    pub fn with_buffer_count(
        grow_calculator: GrowCalculator,
        resource: MemoryResource,
        default_buffer_count: usize,
    ) -> Self {
        let container_size = default_buffer_count.max(1);
        ManagedBufferSequence {
            buffers: vec![BufferView::null(); container_size],
            state: SequenceState::new(0, 0),
            grow_calculator,
            resource,
        }
    }

    pub fn capacity(&self) -> usize {
        self.state.capacity()
    }

    pub fn position(&self) -> usize {
        self.state.position()
    }

    pub fn read_part(&self) -> BufferSequenceView<'_> {
        self.state.read_part(&self.buffers)
    }

    pub fn write_part(&self) -> BufferSequenceView<'_> {
        self.state.write_part(&self.buffers)
    }

    /// Mutable access to the bytes of the first write buffer, for
    /// C-like producers that fill one buffer at a time.
    pub fn first_write_slice(&mut self) -> Option<&mut [u8]> {
        if self.state.write_begin >= self.state.write_end {
            return None;
        }
        let mut view = self.buffers[self.state.write_begin];
        let slice = view.as_mut_slice();
        // The view aliases an allocation owned by self, borrowed
        // mutably for the caller's lifetime.
        Some(unsafe { std::slice::from_raw_parts_mut(slice.as_mut_ptr(), slice.len()) })
    }

    pub fn set_position(&mut self, new_position: usize) {
        self.state.set_position(&mut self.buffers, new_position)
    }

    pub fn increase_position(&mut self, delta: usize) {
        self.state.increase_position(&mut self.buffers, delta)
    }

    pub fn move_position(&mut self, delta: isize) {
        self.state.move_position(&mut self.buffers, delta)
    }

    pub fn grow_calculator(&self) -> &GrowCalculator {
        &self.grow_calculator
    }

    pub fn set_grow_calculator(&mut self, grow_calculator: GrowCalculator) {
        self.grow_calculator = grow_calculator;
    }

    /// Ensure the total capacity is at least `requested_total_size`,
    /// appending a newly allocated buffer to the write part if needed.
    /// Existing payload bytes never move.
    pub fn reserve_total_size(&mut self, requested_total_size: usize) -> Result<(), GrowError> {
        let capacity = self.capacity();
        let new_capacity = self
            .grow_calculator
            .compute_new_size(capacity, requested_total_size)?;
        if new_capacity > capacity {
            self.allocate_and_add_buffer(new_capacity - capacity)?;
            trace!(
                requested_total_size,
                new_capacity,
                "managed buffer sequence grown"
            );
        }
        Ok(())
    }

    /// Ensure the write part has at least `requested_write_size` bytes.
    pub fn reserve_write_size(&mut self, requested_write_size: usize) -> Result<(), GrowError> {
        let read_size = self.state.position();
        if requested_write_size > usize::MAX - read_size {
            return Err(GrowError::ExceedsMaxSize);
        }
        self.reserve_total_size(read_size + requested_write_size)
    }

    /// Append `data`: grow if needed, copy across as many write buffers
    /// as it spans, and advance the position over it.
    pub fn write(&mut self, data: &[u8]) -> Result<(), GrowError> {
        self.reserve_write_size(data.len())?;
        let mut remaining = data;
        let mut index = self.state.write_begin;
        while !remaining.is_empty() {
            let mut buffer = self.buffers[index];
            let copy_size = buffer.size().min(remaining.len());
            buffer.as_mut_slice()[..copy_size].copy_from_slice(&remaining[..copy_size]);
            remaining = &remaining[copy_size..];
            index += 1;
        }
        self.increase_position(data.len());
        Ok(())
    }

    /// Reset both parts to size 0, keeping up to `keep_buffer_count`
    /// allocated buffers in the write part for reuse, and shrinking the
    /// view container when it exceeds twice `keep_container_capacity`.
    pub fn reset(&mut self, keep_buffer_count: usize, keep_container_capacity: usize) {
        // Move everything into the write part; this also merges any
        // split, so each write buffer is one original allocation.
        self.set_position(0);
        debug_assert_eq!(self.state.write_begin, 1);

        let mut kept_buffer_count = 0;
        let mut kept_size = 0;
        let mut index = self.state.write_begin;
        while index < self.state.write_end && kept_buffer_count < keep_buffer_count {
            kept_size += self.buffers[index].size();
            kept_buffer_count += 1;
            index += 1;
        }
        while index < self.state.write_end {
            self.deallocate_buffer(index);
            index += 1;
        }

        let keep_container_capacity = keep_container_capacity.max(2 + kept_buffer_count);
        if self.buffers.len() > 2 * keep_container_capacity {
            self.buffers.truncate(keep_container_capacity);
            self.buffers.shrink_to_fit();
        }

        self.state = SequenceState::new(kept_buffer_count, kept_size);
    }

    fn allocate_and_add_buffer(&mut self, size: usize) -> Result<(), GrowError> {
        let data = self.resource.allocate(size).ok_or(GrowError::OutOfMemory)?;
        let view = unsafe { BufferView::new(data.as_ptr(), size) };
        if self.state.write_end == self.buffers.len() {
            if self.buffers.try_reserve(1).is_err() {
                self.resource.deallocate(data, size);
                return Err(GrowError::OutOfMemory);
            }
            self.buffers.push(view);
        } else {
            debug_assert!(self.buffers[self.state.write_end].is_null());
            self.buffers[self.state.write_end] = view;
        }
        self.state.write_end += 1;
        self.state.write_size += size;
        Ok(())
    }

    fn deallocate_buffer(&mut self, index: usize) {
        let buffer = self.buffers[index];
        if let Some(ptr) = std::ptr::NonNull::new(buffer.data()) {
            self.resource.deallocate(ptr, buffer.size());
        }
        self.buffers[index] = BufferView::null();
    }
}

impl Drop for ManagedBufferSequence {
    fn drop(&mut self) {
        // Merging the position back to 0 reconstitutes the original
        // allocations, which are then released one by one.
        self.set_position(0);
        for index in self.state.write_begin..self.state.write_end {
            self.deallocate_buffer(index);
        }
    }
}
