use bytes::{BufMut, BytesMut};
use nom::{
    number::complete::{le_u16, le_u32, le_u8},
    IResult,
};
use serde::Serialize;

use common::codec::Encode;

/// Offset of the event type code within the common header.
pub const EVENT_TYPE_OFFSET: usize = 4;
/// Offset of the server id.
pub const SERVER_ID_OFFSET: usize = 5;
/// Offset of the total event length.
pub const EVENT_LEN_OFFSET: usize = 9;
/// Offset of the next-event log position.
pub const LOG_POS_OFFSET: usize = 13;
/// Offset of the flags field.
pub const FLAGS_OFFSET: usize = 17;
/// Size of the common header.
pub const LOG_EVENT_HEADER_LEN: usize = 19;

/////////////////////////////////////
///  Event Header
///
/// 每个event都有一个19个字节的 Binlog Event Header，采用小端序列。
///
///                      [startPos : Len]
/// +=====================================+
/// | event  | timestamp         0 : 4    |
/// | header +----------------------------+
/// |        | event_type        4 : 1    |
/// |        +----------------------------+
/// |        | server_id         5 : 4    |
/// |        +----------------------------+
/// |        | event_length      9 : 4    | >= 19
/// |        +----------------------------+
/// |        | next_position    13 : 4    |
/// |        +----------------------------+
/// |        | flags            17 : 2    |
/// +=====================================+
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct Header {
    /// Creation time in seconds from Unix epoch.
    pub when: u32,

    /// Type of the binlog event.
    pub event_type: u8,

    /// 该id表明binlog的源server是哪个，用来在循环复制中过滤。
    pub server_id: u32,

    /// Total event length (header + data), >= 19.
    pub event_length: u32,

    /// File position of the next event.
    pub log_pos: u32,

    /// Event flags.
    pub flags: u16,
}

impl Header {
    pub fn new(
        when: u32,
        event_type: u8,
        server_id: u32,
        event_length: u32,
        log_pos: u32,
        flags: u16,
    ) -> Self {
        Header {
            when,
            event_type,
            server_id,
            event_length,
            log_pos,
            flags,
        }
    }

    /// 解析 header
    pub fn parse_v4_header(input: &[u8]) -> IResult<&[u8], Header> {
        let (i, when) = le_u32(input)?;
        let (i, event_type) = le_u8(i)?;
        let (i, server_id) = le_u32(i)?;
        let (i, event_length) = le_u32(i)?;
        let (i, log_pos) = le_u32(i)?;
        let (i, flags) = le_u16(i)?;

        Ok((
            i,
            Header::new(when, event_type, server_id, event_length, log_pos, flags),
        ))
    }
}

impl Encode for Header {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.when);
        buf.put_u8(self.event_type);
        buf.put_u32_le(self.server_id);
        buf.put_u32_le(self.event_length);
        buf.put_u32_le(self.log_pos);
        buf.put_u16_le(self.flags);
    }
}
