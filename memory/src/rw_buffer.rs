use std::fmt;

use crate::buffer_view::BufferView;

/// Non-owning read/write manager for one fixed, contiguous buffer.
///
/// The buffer is split by a movable *position* into a read part (the
/// prefix already produced) and a write part (the suffix still to be
/// filled).  The position equals the size of the read part.  Producers
/// write into the write part and then move the position forward over the
/// bytes they wrote.
pub struct RwBuffer {
    buffer: BufferView,
    position: usize,
}

impl RwBuffer {
    /// Manage the given buffer, with position 0.
    pub fn new(buffer: BufferView) -> Self {
        RwBuffer {
            buffer,
            position: 0,
        }
    }

    pub(crate) fn with_position(buffer: BufferView, position: usize) -> Self {
        assert!(position <= buffer.size());
        RwBuffer { buffer, position }
    }

    /// Total size of the read part and the write part.
    pub fn capacity(&self) -> usize {
        self.buffer.size()
    }

    /// The position, i.e. the size of the read part.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn read_part(&self) -> BufferView {
        if self.buffer.is_null() {
            return BufferView::null();
        }
        unsafe { BufferView::new(self.buffer.data(), self.position) }
    }

    pub fn write_part(&self) -> BufferView {
        if self.buffer.is_null() {
            return BufferView::null();
        }
        unsafe {
            BufferView::new(
                self.buffer.data().add(self.position),
                self.buffer.size() - self.position,
            )
        }
    }

    pub fn read_slice(&self) -> &[u8] {
        &self.buffer.as_slice()[..self.position]
    }

    pub fn write_slice(&mut self) -> &mut [u8] {
        let position = self.position;
        &mut self.buffer.as_mut_slice()[position..]
    }

    /// Set the position.  `new_position` must be in `[0, capacity]`;
    /// out-of-range values are clamped (asserted in debug builds).
    pub fn set_position(&mut self, new_position: usize) {
        debug_assert!(new_position <= self.capacity());
        self.position = new_position.min(self.capacity());
    }

    /// Move the position right by `increment` bytes.
    pub fn increase_position(&mut self, increment: usize) {
        debug_assert!(increment <= self.capacity() - self.position);
        self.set_position(self.position + increment);
    }

    /// Move the position left or right by `delta` bytes.
    pub fn move_position(&mut self, delta: isize) {
        let new_position = self.position as isize + delta;
        debug_assert!(new_position >= 0);
        self.set_position(new_position.max(0) as usize);
    }
}

impl fmt::Debug for RwBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RwBuffer(capacity={}, position={})",
            self.capacity(),
            self.position
        )
    }
}
