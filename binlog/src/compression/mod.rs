//! Frame-based streaming compression of event payloads.
//!
//! A *frame* is a self-contained compressed segment: it can be
//! decompressed without knowledge of other frames.  [`Compressor`] and
//! [`Decompressor`] objects are long-lived and are reused across frames.

pub mod compressor;
pub mod decompressor;
pub mod factory;
pub mod none;
pub mod payload_stream;
pub mod zstd;

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

pub use compressor::Compressor;
pub use decompressor::Decompressor;
pub use factory::{build_compressor, build_decompressor};
pub use none::{NoneComp, NoneDec};
pub use payload_stream::{EventBuffer, PayloadEventBufferIstream, PayloadStreamError};
pub use self::zstd::{ZstdComp, ZstdDec};

/// Compression algorithm wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum CompressionType {
    /// ZSTD compression.
    Zstd = 0,
    /// No compression.
    None = 255,
}

/// Compression reports the same failures as buffer growth.
pub type CompressError = memory::GrowError;

/// Outcome of a decompression request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressStatus {
    /// The requested bytes were decoded.
    Success,
    /// Nothing was decoded because the input ended at a clean frame
    /// boundary.  Normal end of stream, not an error.
    End,
    /// The input ended mid-frame after producing fewer bytes than
    /// requested.  The frame is still open; more input may be fed.
    Truncated,
    /// The codec rejected the input.  The frame has been reset.
    Corrupted,
    /// Allocation failed.  The frame has been reset.
    OutOfMemory,
    /// The requested size exceeds the output buffer's configured
    /// maximum.  The frame is untouched; the caller may raise the limit
    /// and retry.
    ExceedsMaxSize,
}

impl fmt::Display for DecompressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DecompressStatus::Success => "success",
            DecompressStatus::End => "end",
            DecompressStatus::Truncated => "truncated",
            DecompressStatus::Corrupted => "corrupted",
            DecompressStatus::OutOfMemory => "out of memory",
            DecompressStatus::ExceedsMaxSize => "exceeds max size",
        };
        f.write_str(text)
    }
}
