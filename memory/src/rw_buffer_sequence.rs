use crate::buffer_sequence::BufferSequenceView;
use crate::buffer_view::BufferView;

/// The read/write split state of a buffer sequence: part boundaries as
/// container indices, plus the byte sizes of both parts.
///
/// The container always holds one spare element between the read part
/// and the write part, so the parts can be in one of two shapes:
///
/// ```text
/// Position at a buffer boundary (the spare element is a null buffer):
///   [b_1, ..., b_R, null, b_{R+1}, ..., b_N]
///
/// Position inside a buffer (the buffer is split into two halves):
///   [b_1, ..., b_R[0..x], b_R[x..], b_{R+1}, ..., b_N]
/// ```
///
/// In the first shape `write_begin == read_end + 1`; in the second
/// `write_begin == read_end` and the two elements around the boundary
/// are adjacent halves of one original buffer.  At most one split exists
/// at any time, and every element after the write part is null.
///
/// All position movement funnels through [`set_position`], which
/// restores the canonical shape via `merge_if_split`,
/// `move_position_one_buffer_left` and
/// `move_position_at_most_one_buffer_right`.
///
/// [`set_position`]: Self::set_position
#[derive(Debug, Clone)]
pub(crate) struct SequenceState {
    /// One past the last read buffer.
    pub(crate) read_end: usize,
    /// Index of the first write buffer.
    pub(crate) write_begin: usize,
    /// One past the last write buffer.
    pub(crate) write_end: usize,
    pub(crate) read_size: usize,
    pub(crate) write_size: usize,
}

impl SequenceState {
    /// State for a container whose first element is the null spare and
    /// whose next `buffer_count` elements form the write part.
    pub(crate) fn new(buffer_count: usize, write_size: usize) -> Self {
        SequenceState {
            read_end: 0,
            write_begin: 1,
            write_end: 1 + buffer_count,
            read_size: 0,
            write_size,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.read_size + self.write_size
    }

    pub(crate) fn position(&self) -> usize {
        self.read_size
    }

    pub(crate) fn read_part<'a>(&self, buffers: &'a [BufferView]) -> BufferSequenceView<'a> {
        BufferSequenceView::new(&buffers[..self.read_end], self.read_size)
    }

    pub(crate) fn write_part<'a>(&self, buffers: &'a [BufferView]) -> BufferSequenceView<'a> {
        BufferSequenceView::new(&buffers[self.write_begin..self.write_end], self.write_size)
    }

    /// Move the position to `new_position`, splitting or merging a
    /// buffer at the boundary as needed.  Out-of-range positions are
    /// clamped (asserted in debug builds).
    pub(crate) fn set_position(&mut self, buffers: &mut [BufferView], new_position: usize) {
        let capacity = self.capacity();
        debug_assert!(new_position <= capacity);
        let new_position = new_position.min(capacity);

        let mut position = self.read_size;
        position += self.merge_if_split(buffers);
        while position > new_position {
            position -= self.move_position_one_buffer_left(buffers);
        }
        while position < new_position {
            position += self.move_position_at_most_one_buffer_right(buffers, new_position - position);
        }
        debug_assert_eq!(position, new_position);
        debug_assert_eq!(self.read_size, new_position);
    }

    pub(crate) fn increase_position(&mut self, buffers: &mut [BufferView], delta: usize) {
        self.set_position(buffers, self.read_size + delta);
    }

    pub(crate) fn move_position(&mut self, buffers: &mut [BufferView], delta: isize) {
        let new_position = self.read_size as isize + delta;
        debug_assert!(new_position >= 0);
        self.set_position(buffers, new_position.max(0) as usize);
    }

    /// If a buffer is split across the boundary, glue the halves back
    /// together, leaving both in the read part:
    ///
    /// ```text
    /// [.., b[0..x], b[x..], ..]  ->  [.., b, null, ..]
    /// ```
    ///
    /// Returns the number of bytes the position moved right (0 when
    /// there was no split).
    fn merge_if_split(&mut self, buffers: &mut [BufferView]) -> usize {
        if self.read_end != self.write_begin {
            return 0;
        }
        // Split shape: read part ends with the left half, write part
        // starts with the right half, in the same slot range.
        let delta = buffers[self.write_begin].size();
        let left = self.read_end - 1;
        debug_assert_eq!(buffers[left].end(), buffers[self.write_begin].data());
        buffers[left] =
            unsafe { BufferView::new(buffers[left].data(), buffers[left].size() + delta) };
        buffers[self.read_end] = BufferView::null();
        self.write_begin = self.read_end + 1;
        self.read_size += delta;
        self.write_size -= delta;
        delta
    }

    /// Move the position exactly one whole buffer left.  Requires the
    /// boundary shape (no split):
    ///
    /// ```text
    /// [.., b, null, ..]  ->  [.., null, b, ..]
    /// ```
    fn move_position_one_buffer_left(&mut self, buffers: &mut [BufferView]) -> usize {
        debug_assert_ne!(self.read_end, self.write_begin);
        debug_assert!(buffers[self.read_end].is_null());
        debug_assert!(self.read_end > 0);
        self.read_end -= 1;
        self.write_begin -= 1;
        buffers[self.write_begin] = buffers[self.read_end];
        buffers[self.read_end] = BufferView::null();
        let delta = buffers[self.write_begin].size();
        self.read_size -= delta;
        self.write_size += delta;
        delta
    }

    /// Move the position right by at most one buffer, at most `limit`
    /// bytes; splits the first write buffer when `limit` falls inside
    /// it.  Requires the boundary shape (no split).
    fn move_position_at_most_one_buffer_right(
        &mut self,
        buffers: &mut [BufferView],
        limit: usize,
    ) -> usize {
        debug_assert_ne!(self.read_end, self.write_begin);
        debug_assert!(buffers[self.read_end].is_null());
        debug_assert!(self.write_begin < self.write_end);
        let first = buffers[self.write_begin];
        if first.size() <= limit {
            // [.., null, b, ..] -> [.., b, null, ..]
            buffers[self.read_end] = first;
            buffers[self.write_begin] = BufferView::null();
            self.read_end += 1;
            self.write_begin += 1;
            self.read_size += first.size();
            self.write_size -= first.size();
            first.size()
        } else {
            // [.., null, b, ..] -> [.., b[0..limit], b[limit..], ..]
            buffers[self.read_end] = unsafe { BufferView::new(first.data(), limit) };
            buffers[self.write_begin] =
                unsafe { BufferView::new(first.data().add(limit), first.size() - limit) };
            self.read_end += 1;
            self.read_size += limit;
            self.write_size -= limit;
            limit
        }
    }
}

/// Non-owning read/write manager for a fixed sequence of buffers.
///
/// Like [`RwBuffer`](crate::RwBuffer) but over a sequence of
/// non-contiguous buffers, with the position at byte granularity: when
/// the position falls inside a buffer, that buffer is transparently
/// split across the read/write boundary.
///
/// The caller's slice must start with one null element (the spare slot)
/// followed by zero or more non-null buffers.
pub struct RwBufferSequence<'a> {
    buffers: &'a mut [BufferView],
    state: SequenceState,
}

impl<'a> RwBufferSequence<'a> {
    pub fn new(buffers: &'a mut [BufferView]) -> Self {
        assert!(!buffers.is_empty());
        assert!(buffers[0].is_null());
        let mut write_size = 0;
        for buffer in buffers[1..].iter() {
            assert!(!buffer.is_null());
            write_size += buffer.size();
        }
        let state = SequenceState::new(buffers.len() - 1, write_size);
        RwBufferSequence { buffers, state }
    }

    pub fn capacity(&self) -> usize {
        self.state.capacity()
    }

    pub fn position(&self) -> usize {
        self.state.position()
    }

    pub fn read_part(&self) -> BufferSequenceView<'_> {
        self.state.read_part(&self.buffers[..])
    }

    pub fn write_part(&self) -> BufferSequenceView<'_> {
        self.state.write_part(&self.buffers[..])
    }

    pub fn set_position(&mut self, new_position: usize) {
        self.state.set_position(&mut self.buffers[..], new_position)
    }

    pub fn increase_position(&mut self, delta: usize) {
        self.state.increase_position(&mut self.buffers[..], delta)
    }

    pub fn move_position(&mut self, delta: isize) {
        self.state.move_position(&mut self.buffers[..], delta)
    }
}
