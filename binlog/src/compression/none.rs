use bytes::Bytes;

use memory::{GrowConstraint, GrowError, ManagedBufferSequence};

use super::compressor::{Compressor, FrameInput};
use super::decompressor::Decompressor;
use super::{CompressError, CompressionType, DecompressStatus};

/// Compressor that only copies input to output.
#[derive(Debug, Default)]
pub struct NoneComp {
    frame: FrameInput,
}

impl NoneComp {
    pub fn new() -> Self {
        NoneComp {
            frame: FrameInput::new(),
        }
    }
}

impl Compressor for NoneComp {
    fn type_code(&self) -> CompressionType {
        CompressionType::None
    }

    fn reset(&mut self) {
        self.frame.on_reset();
    }

    fn feed(&mut self, input: Bytes) {
        self.frame.feed(input);
    }

    /// Copies all pending input.  Guaranteed to produce all output on
    /// success; `finish` has nothing left to flush.
    fn compress(&mut self, out: &mut ManagedBufferSequence) -> Result<(), CompressError> {
        match out.write(self.frame.remaining()) {
            Ok(()) => {
                let n = self.frame.remaining().len();
                self.frame.advance(n);
                self.frame.mark_consumed();
                Ok(())
            }
            Err(GrowError::OutOfMemory) => {
                self.reset();
                Err(CompressError::OutOfMemory)
            }
            Err(GrowError::ExceedsMaxSize) => Err(CompressError::ExceedsMaxSize),
        }
    }

    fn finish(&mut self, out: &mut ManagedBufferSequence) -> Result<(), CompressError> {
        self.compress(out)?;
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
        GrowConstraint::default()
    }
}

/// Decompressor that returns its input unchanged, treating the entire
/// input as a single frame.
#[derive(Debug, Default)]
pub struct NoneDec {
    input: Bytes,
    pos: usize,
}

impl NoneDec {
    pub fn new() -> Self {
        NoneDec {
            input: Bytes::new(),
            pos: 0,
        }
    }
}

impl Decompressor for NoneDec {
    fn type_code(&self) -> CompressionType {
        CompressionType::None
    }

    fn reset(&mut self) {
        self.input = Bytes::new();
        self.pos = 0;
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
        let available = self.input.len() - self.pos;
        if available == 0 {
            return (DecompressStatus::End, 0);
        }
        let n = available.min(out.len());
        out[..n].copy_from_slice(&self.input[self.pos..self.pos + n]);
        self.pos += n;
        if n < out.len() {
            (DecompressStatus::Truncated, n)
        } else {
            (DecompressStatus::Success, n)
        }
    }

    fn grow_constraint_hint(&self) -> GrowConstraint {
        GrowConstraint::default()
    }
}
