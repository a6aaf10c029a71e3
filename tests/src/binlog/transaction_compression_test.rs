#[cfg(test)]
mod test {
    use bytes::{Bytes, BytesMut};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use binlog::compression::{
        build_compressor, build_decompressor, CompressionType, DecompressStatus,
    };
    use binlog::events::TransactionPayloadEvent;
    use common::codec::Encode;
    use memory::{GrowCalculator, ManagedBuffer, ManagedBufferSequence, MemoryResource};

    fn compressible_data(len: usize, seed: u64) -> Vec<u8> {
        // Deterministic, mildly compressible: runs of random bytes.
        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = Vec::with_capacity(len);
        while data.len() < len {
            let byte: u8 = rng.gen();
            let run = (rng.gen::<usize>() % 16) + 1;
            for _ in 0..run.min(len - data.len()) {
                data.push(byte);
            }
        }
        data
    }

    fn round_trip(data: &[u8], compression_type: CompressionType, pieces: usize) {
        let mut comp = build_compressor(compression_type);
        let mut out =
            ManagedBufferSequence::new(GrowCalculator::default(), MemoryResource::default());
        comp.set_pledged_input_size(data.len() as u64);
        let input = Bytes::copy_from_slice(data);
        if pieces <= 1 {
            comp.feed(input);
        } else {
            let chunk = (data.len() / pieces).max(1);
            let mut at = 0;
            while at + chunk < data.len() {
                comp.feed(input.slice(at..at + chunk));
                comp.compress(&mut out).unwrap();
                at += chunk;
            }
            comp.feed(input.slice(at..));
        }
        comp.finish(&mut out).unwrap();
        let compressed = out.read_part().to_vec();

        let mut dec = build_decompressor(compression_type);
        dec.feed(Bytes::from(compressed));
        let mut buffer = ManagedBuffer::new(MemoryResource::default());
        if data.is_empty() {
            assert_eq!(dec.decompress(&mut buffer, 0), DecompressStatus::End);
        } else {
            assert_eq!(
                dec.decompress(&mut buffer, data.len()),
                DecompressStatus::Success
            );
        }
        assert_eq!(buffer.read_slice(), data);
        assert_eq!(dec.decompress(&mut buffer, 1), DecompressStatus::End);
    }

    #[test]
    fn test_round_trip_sizes_one_piece() {
        for compression_type in [CompressionType::None, CompressionType::Zstd] {
            for len in [0usize, 1, 2, 3, 4, 5, 128, 256, 512] {
                round_trip(&compressible_data(len, len as u64), compression_type, 1);
            }
        }
    }

    #[test]
    fn test_round_trip_sizes_many_pieces() {
        for compression_type in [CompressionType::None, CompressionType::Zstd] {
            for pieces in [2usize, 7] {
                round_trip(&compressible_data(1 << 16, 99), compression_type, pieces);
            }
        }
    }

    #[test]
    fn test_round_trip_huge() {
        round_trip(&compressible_data(1 << 28, 7), CompressionType::Zstd, 3);
    }

    /// The payload event carries the compressed stream plus its TLV
    /// metadata end to end.
    #[test]
    fn test_payload_event_wraps_compressed_stream() {
        let data = compressible_data(10_000, 5);
        let mut comp = build_compressor(CompressionType::Zstd);
        let mut out =
            ManagedBufferSequence::new(GrowCalculator::default(), MemoryResource::default());
        comp.feed(Bytes::copy_from_slice(&data));
        comp.finish(&mut out).unwrap();
        let event = TransactionPayloadEvent::new(
            Bytes::from(out.read_part().to_vec()),
            CompressionType::Zstd,
            data.len() as u64,
        );

        let mut encoded = BytesMut::new();
        event.encode(&mut encoded);
        let decoded = TransactionPayloadEvent::decode(&encoded.freeze()).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.uncompressed_size(), data.len() as u64);

        let mut dec = build_decompressor(
            CompressionType::try_from(decoded.compression_type_code()).unwrap(),
        );
        dec.feed(decoded.payload().clone());
        let mut buffer = ManagedBuffer::new(MemoryResource::default());
        assert_eq!(
            dec.decompress(&mut buffer, data.len()),
            DecompressStatus::Success
        );
        assert_eq!(buffer.read_slice(), data.as_slice());
    }
}
