use bytes::Bytes;
use tracing::trace;
use zstd::stream::raw::{CParameter, Decoder as RawDecoder, Encoder as RawEncoder, InBuffer, Operation, OutBuffer};
use zstd::zstd_safe;

use memory::{GrowConstraint, ManagedBufferSequence};

use super::compressor::{Compressor, FrameInput};
use super::decompressor::Decompressor;
use super::{CompressError, CompressionType, DecompressStatus};

/// Default ZSTD compression level, as the binlog writer uses.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// ZSTD streaming compressor.
///
/// The compression context is created on first use and reinitialised,
/// not reallocated, between frames.  A pledged input size is passed to
/// ZSTD at frame start, letting it size its windows to the actual data.
pub struct ZstdComp {
    ctx: Option<RawEncoder<'static>>,
    frame: FrameInput,
    /// True once the current frame has started compressing; level
    /// changes apply only on the next frame.
    started: bool,
    current_level: i32,
    next_level: i32,
}

impl ZstdComp {
    pub fn new() -> Self {
        ZstdComp {
            ctx: None,
            frame: FrameInput::new(),
            started: false,
            current_level: DEFAULT_COMPRESSION_LEVEL,
            next_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Set the compression level for subsequent frames.
    pub fn set_compression_level(&mut self, level: i32) {
        self.next_level = level;
    }

    /// Make sure the first write buffer has room, growing by at least
    /// one byte; the grow calculator's knobs turn that one byte into a
    /// decently sized block.
    fn reserve_output(out: &mut ManagedBufferSequence) -> Result<(), CompressError> {
        if out.write_part().size() == 0 {
            out.reserve_write_size(1)?;
        }
        Ok(())
    }

    fn fail_oom(&mut self) -> Result<(), CompressError> {
        self.reset();
        Err(CompressError::OutOfMemory)
    }
}

impl Default for ZstdComp {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for ZstdComp {
    fn type_code(&self) -> CompressionType {
        CompressionType::Zstd
    }

    fn reset(&mut self) {
        if let Some(ctx) = self.ctx.as_mut() {
            let _ = ctx.reinit();
        }
        self.frame.on_reset();
        self.started = false;
    }

    fn feed(&mut self, input: Bytes) {
        self.frame.feed(input);
    }

    fn compress(&mut self, out: &mut ManagedBufferSequence) -> Result<(), CompressError> {
        if self.ctx.is_none() {
            match RawEncoder::new(self.next_level) {
                Ok(ctx) => {
                    self.ctx = Some(ctx);
                    self.current_level = self.next_level;
                }
                Err(_) => return self.fail_oom(),
            }
        }

        if !self.started {
            let ctx = self.ctx.as_mut().expect("context created above");
            if self.next_level != self.current_level {
                if ctx
                    .set_parameter(CParameter::CompressionLevel(self.next_level))
                    .is_err()
                {
                    return self.fail_oom();
                }
                self.current_level = self.next_level;
            }
            if let Some(pledged) = self.frame.pledged_input_size() {
                let _ = ctx.set_pledged_src_size(Some(pledged));
            }
            self.started = true;
        }

        while !self.frame.is_consumed() {
            match Self::reserve_output(out) {
                Ok(()) => {}
                Err(CompressError::OutOfMemory) => return self.fail_oom(),
                Err(e) => return Err(e),
            }
            let slice = out.first_write_slice().expect("write part reserved above");
            let mut outb = OutBuffer::around(slice);
            let mut inb = InBuffer::around(self.frame.remaining());
            let ctx = self.ctx.as_mut().expect("context created above");
            let status = ctx.run(&mut inb, &mut outb);
            let consumed = inb.pos;
            let produced = outb.pos();
            if status.is_err() {
                return self.fail_oom();
            }
            trace!(consumed, produced, "zstd compress step");
            self.frame.advance(consumed);
            out.increase_position(produced);
        }
        self.frame.mark_consumed();
        Ok(())
    }

    fn finish(&mut self, out: &mut ManagedBufferSequence) -> Result<(), CompressError> {
        self.compress(out)?;
        loop {
            match Self::reserve_output(out) {
                Ok(()) => {}
                Err(CompressError::OutOfMemory) => return self.fail_oom(),
                Err(e) => return Err(e),
            }
            let slice = out.first_write_slice().expect("write part reserved above");
            let mut outb = OutBuffer::around(slice);
            let ctx = self.ctx.as_mut().expect("context created by compress");
            let status = ctx.finish(&mut outb, true);
            let produced = outb.pos();
            out.increase_position(produced);
            match status {
                Err(_) => return self.fail_oom(),
                Ok(0) => break,
                Ok(remaining) => {
                    trace!(produced, remaining, "zstd finish step");
                }
            }
        }
        self.started = false;
        self.frame.on_frame_finished();
        Ok(())
    }

    fn set_pledged_input_size(&mut self, size: u64) {
        self.frame.set_pledged_input_size(size);
    }

    fn pledged_input_size(&self) -> Option<u64> {
        self.frame.pledged_input_size()
    }

    fn grow_constraint_hint(&self) -> GrowConstraint {
        let mut hint = GrowConstraint::default();
        hint.set_grow_increment(zstd_safe::CCtx::out_size());
        if let Some(pledged) = self.frame.pledged_input_size() {
            hint.set_max_size(zstd_safe::compress_bound(pledged as usize));
        }
        hint
    }
}

/// ZSTD streaming decompressor.
///
/// Tracks frame boundaries so that a request arriving exactly at the
/// end of a frame with no further data reports
/// [`DecompressStatus::End`].
pub struct ZstdDec {
    ctx: Option<RawDecoder<'static>>,
    input: Bytes,
    pos: usize,
    /// True when the previous decode step ended exactly at a frame
    /// boundary (also true before the first frame).
    frame_boundary: bool,
}

impl ZstdDec {
    pub fn new() -> Self {
        ZstdDec {
            ctx: None,
            input: Bytes::new(),
            pos: 0,
            frame_boundary: true,
        }
    }
}

impl Default for ZstdDec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for ZstdDec {
    fn type_code(&self) -> CompressionType {
        CompressionType::Zstd
    }

    fn reset(&mut self) {
        if let Some(ctx) = self.ctx.as_mut() {
            let _ = ctx.reinit();
        }
        self.input = Bytes::new();
        self.pos = 0;
        self.frame_boundary = true;
    }

    fn feed(&mut self, input: Bytes) {
        assert!(
            self.pos == self.input.len(),
            "feed called while previous input is not consumed"
        );
        self.input = input;
        self.pos = 0;
    }

    fn decompress_raw(&mut self, out: &mut [u8]) -> (DecompressStatus, usize) {
        if self.ctx.is_none() {
            match RawDecoder::new() {
                Ok(ctx) => self.ctx = Some(ctx),
                Err(_) => return (DecompressStatus::OutOfMemory, 0),
            }
        }
        let output_size = out.len();
        let mut outb = OutBuffer::around(out);
        let mut last_step = 1usize;
        // ZSTD stops at a frame boundary even when more input and more
        // output space are available, so repeat until either runs out.
        loop {
            let mut inb = InBuffer::around(&self.input[self.pos..]);
            let ctx = self.ctx.as_mut().expect("context created above");
            let status = ctx.run(&mut inb, &mut outb);
            let consumed = inb.pos;
            self.pos += consumed;
            match status {
                Ok(step) => last_step = step,
                Err(error) => {
                    trace!(%error, "zstd decode error");
                    return (DecompressStatus::Corrupted, 0);
                }
            }
            if !(self.pos < self.input.len() && outb.pos() < output_size) {
                break;
            }
        }
        let produced = outb.pos();
        let was_frame_boundary = self.frame_boundary;
        self.frame_boundary = last_step == 0;
        if produced == 0 && was_frame_boundary {
            return (DecompressStatus::End, 0);
        }
        if produced < output_size {
            return (DecompressStatus::Truncated, produced);
        }
        (DecompressStatus::Success, produced)
    }

    fn grow_constraint_hint(&self) -> GrowConstraint {
        let mut hint = GrowConstraint::default();
        hint.set_grow_increment(zstd_safe::DCtx::out_size());
        hint
    }
}
