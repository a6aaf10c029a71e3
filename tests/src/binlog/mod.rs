pub mod payload_stream_test;
pub mod transaction_compression_test;
