pub mod event_header;
pub mod event_type;
pub mod payload_event;

pub use event_header::{
    Header, EVENT_LEN_OFFSET, EVENT_TYPE_OFFSET, FLAGS_OFFSET, LOG_EVENT_HEADER_LEN,
    LOG_POS_OFFSET, SERVER_ID_OFFSET,
};
pub use event_type::LogEventType;
pub use payload_event::TransactionPayloadEvent;
