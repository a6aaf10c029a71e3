#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use bytes::{BufMut, Bytes, BytesMut};

    use binlog::compression::{
        build_compressor, CompressionType, DecompressStatus, PayloadEventBufferIstream,
    };
    use binlog::events::{Header, LogEventType, LOG_EVENT_HEADER_LEN};
    use common::codec::Encode;
    use memory::{GrowCalculator, ManagedBufferSequence, MemoryResource};

    const EVENT_TIMESTAMP: u32 = 4711;

    /// One mock event: valid common header, body filled with the type
    /// code byte.
    fn mock_event(event_type: LogEventType, data_size: usize) -> Vec<u8> {
        let type_code = u8::from(event_type);
        let length = (LOG_EVENT_HEADER_LEN + data_size) as u32;
        let header = Header::new(EVENT_TIMESTAMP, type_code, 1, length, 0, 0);
        let mut buf = BytesMut::with_capacity(length as usize);
        header.encode(&mut buf);
        buf.put_bytes(type_code, data_size);
        buf.to_vec()
    }

    fn compress(events: &[Vec<u8>], compression_type: CompressionType) -> Vec<u8> {
        let mut comp = build_compressor(compression_type);
        let mut out =
            ManagedBufferSequence::new(GrowCalculator::default(), MemoryResource::default());
        for event in events {
            comp.feed(Bytes::from(event.clone()));
            comp.compress(&mut out).unwrap();
        }
        comp.finish(&mut out).unwrap();
        out.read_part().to_vec()
    }

    fn five_events() -> Vec<Vec<u8>> {
        let shapes = [
            (LogEventType::QueryEvent, 10usize),
            (LogEventType::RowsQueryLogEvent, 500),
            (LogEventType::TableMapEvent, 500),
            (LogEventType::WriteRowsEventV2, 500),
            (LogEventType::XidEvent, 100_000),
        ];
        shapes
            .iter()
            .map(|&(event_type, size)| mock_event(event_type, size))
            .collect()
    }

    /// The concrete end-to-end scenario: five events with varying type
    /// codes and sizes, compressed with ZSTD, read back in order.
    #[test]
    fn test_five_event_zstd_round_trip() {
        let events = five_events();
        let compressed = compress(&events, CompressionType::Zstd);
        let mut stream = PayloadEventBufferIstream::new(
            Bytes::from(compressed),
            CompressionType::Zstd.into(),
        );
        for (index, expected) in events.iter().enumerate() {
            let event = stream
                .next()
                .unwrap_or_else(|| panic!("missing event {index}"))
                .unwrap();
            assert_eq!(event.len(), expected.len(), "event {index}");
            let bytes = event.to_vec();
            assert_eq!(&bytes, expected, "event {index}");
            // Body bytes carry the type code.
            let type_code = bytes[4];
            assert!(bytes[LOG_EVENT_HEADER_LEN..]
                .iter()
                .all(|&b| b == type_code));
        }
        assert!(stream.next().is_none());
        assert_eq!(stream.get_status(), DecompressStatus::End);
        assert!(!stream.has_error());
        assert_eq!(stream.get_error_str(), "");
    }

    #[test]
    fn test_round_trip_both_algorithms_with_custom_buffer_size() {
        for compression_type in [CompressionType::None, CompressionType::Zstd] {
            for default_buffer_size in [0usize, 32, 1 << 16] {
                let events = five_events();
                let compressed = compress(&events, compression_type);
                let mut stream = PayloadEventBufferIstream::with_options(
                    Bytes::from(compressed),
                    compression_type.into(),
                    default_buffer_size,
                    MemoryResource::default(),
                );
                let collected: Result<Vec<_>, _> = (&mut stream).collect();
                let collected = collected.unwrap();
                assert_eq!(collected.len(), events.len());
                for (event, expected) in collected.iter().zip(&events) {
                    assert_eq!(&event.to_vec(), expected);
                }
                assert_eq!(stream.get_status(), DecompressStatus::End);
            }
        }
    }

    /// Truncating the compressed blob after the first event yields
    /// `corrupted` on the read that encounters the truncation; earlier
    /// events still read successfully.
    #[test]
    fn test_truncation_at_every_byte_after_first_event() {
        let events = vec![
            mock_event(LogEventType::QueryEvent, 40),
            mock_event(LogEventType::XidEvent, 60),
        ];
        let compressed = compress(&events, CompressionType::None);
        let first_len = events[0].len();
        // Cutting exactly at the event boundary is indistinguishable
        // from a clean end for the identity codec, so start one past.
        for cut in first_len + 1..compressed.len() {
            let mut stream = PayloadEventBufferIstream::new(
                Bytes::copy_from_slice(&compressed[..cut]),
                CompressionType::None.into(),
            );
            let first = stream.next().unwrap().unwrap();
            assert_eq!(first.to_vec(), events[0], "cut {cut}");
            drop(first);
            let error = stream.next().unwrap().unwrap_err();
            assert_eq!(error.status, DecompressStatus::Corrupted, "cut {cut}");
            assert!(stream.next().is_none());
            assert!(stream.has_error());
        }
    }

    /// ZSTD frame boundaries inside the compressed stream, including
    /// mid-event ones, are invisible to the reader.
    #[test]
    fn test_frame_boundaries_are_transparent() {
        let events = five_events();
        let raw: Vec<u8> = events.iter().flatten().copied().collect();
        // One frame per chunk of 777 bytes, cutting across events.
        let mut comp = build_compressor(CompressionType::Zstd);
        let mut out =
            ManagedBufferSequence::new(GrowCalculator::default(), MemoryResource::default());
        for chunk in raw.chunks(777) {
            comp.feed(Bytes::copy_from_slice(chunk));
            comp.finish(&mut out).unwrap();
        }
        let mut stream = PayloadEventBufferIstream::new(
            Bytes::from(out.read_part().to_vec()),
            CompressionType::Zstd.into(),
        );
        for expected in &events {
            let event = stream.next().unwrap().unwrap();
            assert_eq!(&event.to_vec(), expected);
        }
        assert!(stream.next().is_none());
        assert_eq!(stream.get_status(), DecompressStatus::End);
    }

    /// An allocator that fails after the k-th allocation, for every k:
    /// the stream either succeeds completely or fails cleanly with
    /// `out_of_memory`/`corrupted`; never leaks and never crashes.
    #[test]
    fn test_allocation_failure_resilience() {
        let events = vec![
            mock_event(LogEventType::QueryEvent, 100),
            mock_event(LogEventType::TableMapEvent, 3000),
            mock_event(LogEventType::XidEvent, 10),
        ];
        let compressed = compress(&events, CompressionType::Zstd);

        for budget in 0..32 {
            let live = Arc::new(AtomicUsize::new(0));
            let remaining = Arc::new(AtomicUsize::new(budget));
            let inner = MemoryResource::default();
            let inner2 = inner.clone();
            let live_a = live.clone();
            let live_d = live.clone();
            let resource = MemoryResource::new(
                move |size| {
                    if remaining
                        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
                        .is_err()
                    {
                        return std::ptr::null_mut();
                    }
                    live_a.fetch_add(1, Ordering::Relaxed);
                    match inner.allocate(size) {
                        Some(p) => p.as_ptr(),
                        None => std::ptr::null_mut(),
                    }
                },
                move |ptr, size| {
                    live_d.fetch_sub(1, Ordering::Relaxed);
                    if let Some(p) = std::ptr::NonNull::new(ptr) {
                        inner2.deallocate(p, size)
                    }
                },
            );

            {
                let mut stream = PayloadEventBufferIstream::with_options(
                    Bytes::copy_from_slice(&compressed),
                    CompressionType::Zstd.into(),
                    0,
                    resource,
                );
                let mut read = 0;
                let mut failure = None;
                for item in &mut stream {
                    match item {
                        Ok(event) => {
                            assert_eq!(event.to_vec(), events[read], "budget {budget}");
                            read += 1;
                        }
                        Err(error) => {
                            failure = Some(error.status);
                            break;
                        }
                    }
                }
                match failure {
                    None => {
                        assert_eq!(read, events.len(), "budget {budget}");
                        assert_eq!(stream.get_status(), DecompressStatus::End);
                    }
                    Some(status) => {
                        assert!(
                            matches!(
                                status,
                                DecompressStatus::OutOfMemory | DecompressStatus::Corrupted
                            ),
                            "budget {budget}: {status}"
                        );
                    }
                }
            }
            // Every allocation the stream made has been released.
            assert_eq!(live.load(Ordering::Relaxed), 0, "budget {budget}");
        }
    }

    /// One event above the size ceiling: the first offending read
    /// reports `exceeds_max_size`, and so do all subsequent reads.
    #[test]
    fn test_event_size_ceiling() {
        let events = vec![
            mock_event(LogEventType::QueryEvent, 10),
            mock_event(LogEventType::WriteRowsEventV2, 9000),
        ];
        let compressed = compress(&events, CompressionType::Zstd);
        let mut stream = PayloadEventBufferIstream::new(
            Bytes::from(compressed),
            CompressionType::Zstd.into(),
        );
        let mut calculator = GrowCalculator::default();
        calculator.set_max_size(4096);
        stream.set_grow_calculator(calculator);
        assert!(stream.next().unwrap().is_ok());
        let error = stream.next().unwrap().unwrap_err();
        assert_eq!(error.status, DecompressStatus::ExceedsMaxSize);
        assert!(stream.next().is_none());
        assert_eq!(stream.get_status(), DecompressStatus::ExceedsMaxSize);
    }
}
