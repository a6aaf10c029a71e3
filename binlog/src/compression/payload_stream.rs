use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use thiserror::Error;
use tracing::trace;

use memory::{GrowCalculator, ManagedBuffer, MemoryResource};

use crate::events::event_header::{EVENT_LEN_OFFSET, EVENT_TYPE_OFFSET, LOG_EVENT_HEADER_LEN};
use crate::events::event_type::LogEventType;
use crate::events::payload_event::TransactionPayloadEvent;

use super::factory::build_decompressor;
use super::{CompressionType, DecompressStatus, Decompressor};

/// Hard ceiling on the size of one decompressed event.
pub const MAX_LOG_EVENT_SIZE: usize = 1 << 30;

/// Bytes needed to see the header fields through the length field.
const HEADER_READ_LEN: usize = EVENT_LEN_OFFSET + 4;

/// Terminal error of a payload stream: the decompression status plus a
/// human-readable description of the offending event.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct PayloadStreamError {
    pub status: DecompressStatus,
    pub message: String,
}

/// One decompressed event, shared between the stream and the caller.
///
/// The stream reuses its internal buffer for the next event only once
/// the caller has dropped every `EventBuffer` referring to it, so the
/// bytes stay valid for as long as the caller keeps the handle.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    buffer: Rc<RefCell<ManagedBuffer>>,
}

impl EventBuffer {
    /// The raw event bytes (common header included).
    pub fn bytes(&self) -> Ref<'_, [u8]> {
        Ref::map(self.buffer.borrow(), |buffer| buffer.read_slice())
    }

    pub fn len(&self) -> usize {
        self.buffer.borrow().position()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }
}

/// Stream of decompressed event buffers extracted from the payload of a
/// transaction payload event.
///
/// Iteration yields one event's raw bytes at a time:
///
/// ```ignore
/// let mut stream = PayloadEventBufferIstream::new(payload, compression_type);
/// for event in &mut stream {
///     let event = event?;
///     // handle event.bytes()
/// }
/// assert_eq!(stream.get_status(), DecompressStatus::End);
/// ```
///
/// Errors are terminal: after yielding an `Err` the iterator is
/// exhausted, and [`get_status`] keeps reporting the failure.
///
/// In debug builds, dropping a stream that ended without any status
/// check is reported as a programming error (an `Err` delivered by the
/// iterator counts as checked): after a read loop, always distinguish
/// end-of-stream from failure.
///
/// [`get_status`]: Self::get_status
pub struct PayloadEventBufferIstream {
    decompressor: Option<Box<dyn Decompressor>>,
    managed_buffer: Option<Rc<RefCell<ManagedBuffer>>>,
    grow_calculator: GrowCalculator,
    default_buffer_size: usize,
    resource: MemoryResource,
    status: DecompressStatus,
    error_str: String,
    /// True once a terminal error has been yielded by the iterator.
    error_reported: bool,
    status_checked: Cell<bool>,
}

impl PayloadEventBufferIstream {
    /// Read events from `compressed` using the algorithm given by the
    /// compression type wire code.  An unknown code puts the stream
    /// into the `Corrupted` state immediately.
    pub fn new(compressed: Bytes, compression_type_code: u8) -> Self {
        Self::with_options(compressed, compression_type_code, 0, MemoryResource::default())
    }

    /// As [`new`], with a default event-buffer size (bigger buffers
    /// mean fewer allocations across small events, smaller buffers mean
    /// a smaller footprint) and a memory resource for every allocation
    /// the stream makes.
    ///
    /// [`new`]: Self::new
    pub fn with_options(
        compressed: Bytes,
        compression_type_code: u8,
        default_buffer_size: usize,
        resource: MemoryResource,
    ) -> Self {
        let mut grow_calculator = GrowCalculator::default();
        grow_calculator.set_max_size(MAX_LOG_EVENT_SIZE);
        let mut stream = PayloadEventBufferIstream {
            decompressor: None,
            managed_buffer: None,
            grow_calculator,
            default_buffer_size,
            resource,
            status: DecompressStatus::Success,
            error_str: String::new(),
            error_reported: false,
            status_checked: Cell::new(true),
        };
        stream.initialize(compressed, compression_type_code);
        stream
    }

    /// Read the events contained in a transaction payload event.  The
    /// payload bytes are shared, not copied.
    pub fn from_payload_event(event: &TransactionPayloadEvent) -> Self {
        Self::new(event.payload().clone(), event.compression_type_code())
    }

    fn initialize(&mut self, compressed: Bytes, compression_type_code: u8) {
        match CompressionType::try_from(compression_type_code) {
            Ok(compression_type) => {
                let mut decompressor = build_decompressor(compression_type);
                decompressor.feed(compressed);
                self.decompressor = Some(decompressor);
            }
            Err(_) => {
                self.set_error_str(format!(
                    "Unknown compression algorithm in Payload_log_event: {}.",
                    compression_type_code
                ));
                self.set_status(DecompressStatus::Corrupted);
            }
        }
    }

    /// The stream status: `Success` while reads keep succeeding, `End`
    /// at a clean end of stream, or the terminal error.
    pub fn get_status(&self) -> DecompressStatus {
        self.status_checked.set(true);
        self.status
    }

    /// True when the stream ended for any reason other than a clean
    /// end of stream.
    pub fn has_error(&self) -> bool {
        self.status_checked.set(true);
        !matches!(self.status, DecompressStatus::Success | DecompressStatus::End)
    }

    /// Description of the failure, or an empty string.
    pub fn get_error_str(&self) -> &str {
        self.status_checked.set(true);
        &self.error_str
    }

    pub fn grow_calculator(&self) -> &GrowCalculator {
        &self.grow_calculator
    }

    /// Replace the grow policy used for event buffers.  Its `max_size`
    /// is the event size ceiling.
    pub fn set_grow_calculator(&mut self, grow_calculator: GrowCalculator) {
        self.grow_calculator = grow_calculator;
    }

    fn set_error_str(&mut self, message: String) {
        trace!(%message, "payload stream error");
        self.error_str = message;
    }

    fn set_status(&mut self, status: DecompressStatus) {
        if status != DecompressStatus::Success {
            self.status_checked.set(false);
        }
        self.status = status;
    }

    /// Prepare the output buffer: reuse the previous one when the
    /// caller no longer holds it, otherwise allocate a fresh one.  The
    /// buffer's grow policy is the user policy tightened by the
    /// decompressor's hint.
    fn update_buffer(&mut self) {
        let reusable = matches!(&self.managed_buffer, Some(rc) if Rc::strong_count(rc) == 1);
        if !reusable {
            let buffer =
                ManagedBuffer::with_default_capacity(self.default_buffer_size, self.resource.clone());
            self.managed_buffer = Some(Rc::new(RefCell::new(buffer)));
        }
        let hint = self
            .decompressor
            .as_ref()
            .expect("status is success, so the decompressor was built")
            .grow_constraint_hint();
        let grow_calculator = self.grow_calculator.combine_with(&hint);
        let buffer = self.managed_buffer.as_ref().expect("installed above");
        let mut buffer = buffer.borrow_mut();
        buffer.set_position(0);
        buffer.set_grow_calculator(grow_calculator);
    }

    /// Decompress the next event into the prepared buffer: first the
    /// common header through the length field, then the declared
    /// remainder.
    fn read_event(&mut self) {
        let rc = Rc::clone(self.managed_buffer.as_ref().expect("prepared by update_buffer"));
        let mut buffer = rc.borrow_mut();
        let decompressor = self
            .decompressor
            .as_mut()
            .expect("status is success, so the decompressor was built");

        let mut declared_length = 0usize;
        let mut status = decompressor.decompress(&mut buffer, HEADER_READ_LEN);
        if status == DecompressStatus::Success {
            let header = buffer.read_slice();
            let event_type = header[EVENT_TYPE_OFFSET];
            // A valid payload event cannot contain another payload
            // event.  A maliciously crafted "quine" would otherwise
            // send recursive API clients into unbounded recursion.
            if event_type == u8::from(LogEventType::TransactionPayloadEvent) {
                drop(buffer);
                self.set_error_str(
                    "Payload_log_event corrupted: contains an embedded Payload_log_event"
                        .to_string(),
                );
                self.set_status(DecompressStatus::Corrupted);
                return;
            }
            declared_length = LittleEndian::read_u32(&header[EVENT_LEN_OFFSET..]) as usize;
            if declared_length < LOG_EVENT_HEADER_LEN {
                drop(buffer);
                self.set_error_str(format!(
                    "Length field of embedded event in Payload_log_event is only {} bytes, but {} are required.",
                    declared_length, LOG_EVENT_HEADER_LEN
                ));
                self.set_status(DecompressStatus::Corrupted);
                return;
            }
            status = decompressor.decompress(&mut buffer, declared_length - HEADER_READ_LEN);
            if status == DecompressStatus::End {
                // The stream ended after a partial header: the event as
                // a whole was truncated.
                status = DecompressStatus::Truncated;
            }
        }

        let max_size = buffer.grow_calculator().max_size();
        drop(buffer);
        match status {
            DecompressStatus::Success => {}
            DecompressStatus::End => self.set_status(status),
            DecompressStatus::Truncated => {
                self.set_error_str(
                    "Payload_log_event corrupted: the compressed payload has been truncated."
                        .to_string(),
                );
                self.set_status(DecompressStatus::Corrupted);
            }
            DecompressStatus::Corrupted => {
                self.set_error_str(
                    "Payload_log_event corrupted: compression stream is corrupted.".to_string(),
                );
                self.set_status(status);
            }
            DecompressStatus::ExceedsMaxSize => {
                self.set_error_str(format!(
                    "Length field of embedded event in Payload_log_event is {} bytes, exceeding the maximum of {} bytes.",
                    declared_length, max_size
                ));
                self.set_status(status);
            }
            DecompressStatus::OutOfMemory => {
                self.set_error_str(
                    "Out of memory while decompressing event embedded in Payload_log_event."
                        .to_string(),
                );
                self.set_status(status);
            }
        }
    }

    /// Produce the next event in the internal buffer.
    ///
    /// A stream that failed once stays failed: a read may already have
    /// consumed half an event header, so there is no way to resume.
    fn advance(&mut self) {
        if self.status != DecompressStatus::Success {
            return;
        }
        self.update_buffer();
        self.read_event();
        trace!(status = %self.status, "payload stream advanced");
    }
}

impl Iterator for PayloadEventBufferIstream {
    type Item = Result<EventBuffer, PayloadStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.status == DecompressStatus::Success {
            self.advance();
        }
        match self.status {
            DecompressStatus::Success => Some(Ok(EventBuffer {
                buffer: Rc::clone(self.managed_buffer.as_ref().expect("read succeeded")),
            })),
            DecompressStatus::End => None,
            _ if self.error_reported => None,
            status => {
                // The error is delivered in-band exactly once; that
                // counts as having checked the status.
                self.error_reported = true;
                self.status_checked.set(true);
                Some(Err(PayloadStreamError {
                    status,
                    message: self.error_str.clone(),
                }))
            }
        }
    }
}

impl Drop for PayloadEventBufferIstream {
    fn drop(&mut self) {
        // A stream that ended must have its status looked at before it
        // is dropped; otherwise the caller cannot have distinguished
        // end-of-stream from failure.
        debug_assert!(
            self.status_checked.get(),
            "payload stream dropped without checking get_status/has_error after it ended"
        );
    }
}

impl fmt::Debug for PayloadEventBufferIstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadEventBufferIstream")
            .field("status", &self.status)
            .field("error_str", &self.error_str)
            .field("default_buffer_size", &self.default_buffer_size)
            .finish()
    }
}
