use super::none::{NoneComp, NoneDec};
use super::zstd::{ZstdComp, ZstdDec};
use super::{Compressor, CompressionType, Decompressor};

/// Build a compressor for the given algorithm.
pub fn build_compressor(compression_type: CompressionType) -> Box<dyn Compressor> {
    match compression_type {
        CompressionType::Zstd => Box::new(ZstdComp::new()),
        CompressionType::None => Box::new(NoneComp::new()),
    }
}

/// Build a decompressor for the given algorithm.
pub fn build_decompressor(compression_type: CompressionType) -> Box<dyn Decompressor> {
    match compression_type {
        CompressionType::Zstd => Box::new(ZstdDec::new()),
        CompressionType::None => Box::new(NoneDec::new()),
    }
}
