use bytes::{BufMut, Bytes, BytesMut};

use common::codec::{read_packed_u64, write_packed_u64, Encode};
use common::err::{CodecError, Needed};

use crate::compression::CompressionType;

/// Field type codes of the payload data header.  Each field except the
/// end mark is a triple (type, length, value); every element is a packed
/// integer.
pub const OTW_PAYLOAD_HEADER_END_MARK: u64 = 0;
pub const OTW_PAYLOAD_SIZE_FIELD: u64 = 1;
pub const OTW_PAYLOAD_COMPRESSION_TYPE_FIELD: u64 = 2;
pub const OTW_PAYLOAD_UNCOMPRESSED_SIZE_FIELD: u64 = 3;

/// An event whose body carries a compressed stream of inner events.
///
/// The body starts with a payload data header: up to three
/// (type, length, value) fields followed by an end mark, all elements in
/// packed-integer form.  The compressed payload follows directly after
/// the end mark.
///
/// The payload is held as [`Bytes`], so slicing it out of a larger
/// event buffer and handing it to the stream reader are both zero-copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPayloadEvent {
    payload: Bytes,
    compression_type: u8,
    payload_size: u64,
    uncompressed_size: u64,
}

impl TransactionPayloadEvent {
    pub fn new(payload: Bytes, compression_type: CompressionType, uncompressed_size: u64) -> Self {
        let payload_size = payload.len() as u64;
        TransactionPayloadEvent {
            payload,
            compression_type: compression_type.into(),
            payload_size,
            uncompressed_size,
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// The compression type wire code; may be a code this library does
    /// not implement when the event was decoded from foreign bytes.
    pub fn compression_type_code(&self) -> u8 {
        self.compression_type
    }

    pub fn payload_size(&self) -> u64 {
        self.payload_size
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Decode the payload data header and payload from an event body
    /// (the bytes following the 19-byte common header).
    pub fn decode(body: &Bytes) -> Result<Self, CodecError> {
        let mut compression_type: u64 = CompressionType::None as u8 as u64;
        let mut payload_size: Option<u64> = None;
        let mut uncompressed_size: u64 = 0;
        let mut at = 0usize;
        loop {
            let (field_type, n) = read_packed_u64(&body[at..])?;
            at += n;
            if field_type == OTW_PAYLOAD_HEADER_END_MARK {
                break;
            }
            let (field_length, n) = read_packed_u64(&body[at..])?;
            at += n;
            let field_length = usize::try_from(field_length)
                .map_err(|_| CodecError::invalid("field length out of range"))?;
            let end = at
                .checked_add(field_length)
                .ok_or_else(|| CodecError::invalid("field length out of range"))?;
            let field = body
                .get(at..end)
                .ok_or(CodecError::Incomplete(Needed::Bytes(field_length)))?;
            match field_type {
                OTW_PAYLOAD_SIZE_FIELD => payload_size = Some(read_packed_u64(field)?.0),
                OTW_PAYLOAD_COMPRESSION_TYPE_FIELD => {
                    compression_type = read_packed_u64(field)?.0
                }
                OTW_PAYLOAD_UNCOMPRESSED_SIZE_FIELD => {
                    uncompressed_size = read_packed_u64(field)?.0
                }
                // Unknown optional fields are skipped by their length.
                _ => {}
            }
            at = end;
        }

        let payload_size =
            payload_size.ok_or_else(|| CodecError::invalid("payload size field is missing"))?;
        let payload_len = usize::try_from(payload_size)
            .map_err(|_| CodecError::invalid("payload size out of range"))?;
        let end = at
            .checked_add(payload_len)
            .ok_or_else(|| CodecError::invalid("payload size out of range"))?;
        let payload = body
            .get(at..end)
            .ok_or(CodecError::Incomplete(Needed::Bytes(payload_len)))?;
        // Zero-copy slice of the input.
        let payload = body.slice_ref(payload);

        Ok(TransactionPayloadEvent {
            payload,
            compression_type: u8::try_from(compression_type)
                .map_err(|_| CodecError::invalid("compression type code out of range"))?,
            payload_size,
            uncompressed_size,
        })
    }

    fn encode_field(buf: &mut BytesMut, field_type: u64, value: u64) {
        let mut value_buf = BytesMut::with_capacity(9);
        write_packed_u64(&mut value_buf, value);
        write_packed_u64(buf, field_type);
        write_packed_u64(buf, value_buf.len() as u64);
        buf.put(value_buf);
    }
}

impl Encode for TransactionPayloadEvent {
    /// Encode the payload data header followed by the payload bytes.
    fn encode(&self, buf: &mut BytesMut) {
        Self::encode_field(buf, OTW_PAYLOAD_COMPRESSION_TYPE_FIELD, self.compression_type as u64);
        Self::encode_field(buf, OTW_PAYLOAD_SIZE_FIELD, self.payload_size);
        Self::encode_field(buf, OTW_PAYLOAD_UNCOMPRESSED_SIZE_FIELD, self.uncompressed_size);
        write_packed_u64(buf, OTW_PAYLOAD_HEADER_END_MARK);
        buf.put_slice(&self.payload);
    }
}
