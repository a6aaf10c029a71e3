use bytes::Bytes;

use memory::{GrowConstraint, GrowError, ManagedBuffer};

use super::{CompressionType, DecompressStatus};

/// Streaming decompressor for one frame at a time.
///
/// Feed input once (or in pieces) and repeatedly ask for an exact
/// number of output bytes:
///
/// 1. Call [`feed`] to provide input.
/// 2. Repeatedly call [`decompress`], each time producing as much
///    output as needed.  When it reports [`DecompressStatus::Truncated`],
///    feed more input and call again.
///
/// [`feed`]: Self::feed
/// [`decompress`]: Self::decompress
pub trait Decompressor {
    fn type_code(&self) -> CompressionType;

    /// Abort the current frame and start a new one, discarding
    /// unconsumed input.
    fn reset(&mut self);

    /// Submit input bytes.  The bytes are referenced, not copied.  Must
    /// not be called while previous input is unconsumed.
    fn feed(&mut self, input: Bytes);

    /// Decode exactly `out.len()` bytes into `out`.
    ///
    /// Returns the status and the number of bytes written: `out.len()`
    /// on [`Success`](DecompressStatus::Success), strictly between 0 and
    /// `out.len()` on [`Truncated`](DecompressStatus::Truncated), and 0
    /// otherwise.  Never returns
    /// [`ExceedsMaxSize`](DecompressStatus::ExceedsMaxSize).  This
    /// low-level entry point does not reset the frame on error; the
    /// managed-buffer wrapper does.
    fn decompress_raw(&mut self, out: &mut [u8]) -> (DecompressStatus, usize);

    /// A constraint the caller may combine into the output buffer's
    /// grow calculator to suit this codec's preferred block sizes.
    fn grow_constraint_hint(&self) -> GrowConstraint;

    /// Decode exactly `output_size` bytes into `out`.
    ///
    /// Grows the write part of `out` (under `out`'s grow calculator) to
    /// at least `output_size` bytes, decodes into it, and advances the
    /// position over the decoded bytes.
    ///
    /// Status semantics follow [`DecompressStatus`]; additionally a
    /// grow failure surfaces as
    /// [`ExceedsMaxSize`](DecompressStatus::ExceedsMaxSize) (frame kept,
    /// `out` untouched) or
    /// [`OutOfMemory`](DecompressStatus::OutOfMemory) (frame reset).
    /// On [`Truncated`](DecompressStatus::Truncated) the position
    /// advances over the bytes that were produced, so decompression can
    /// resume after more input is fed.
    fn decompress(&mut self, out: &mut ManagedBuffer, output_size: usize) -> DecompressStatus {
        match out.reserve_write_size(output_size) {
            Err(GrowError::ExceedsMaxSize) => return DecompressStatus::ExceedsMaxSize,
            Err(GrowError::OutOfMemory) => {
                self.reset();
                return DecompressStatus::OutOfMemory;
            }
            Ok(()) => {}
        }
        let (status, written) = self.decompress_raw(&mut out.write_slice()[..output_size]);
        match status {
            DecompressStatus::Success => {
                debug_assert_eq!(written, output_size);
                out.increase_position(output_size);
            }
            DecompressStatus::Truncated => out.increase_position(written),
            DecompressStatus::Corrupted | DecompressStatus::OutOfMemory => self.reset(),
            DecompressStatus::End => {}
            DecompressStatus::ExceedsMaxSize => {
                debug_assert!(false, "decompress_raw must not report ExceedsMaxSize");
            }
        }
        status
    }
}
