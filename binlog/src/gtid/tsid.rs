use std::fmt;

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use uuid::Uuid;

use super::tag::Tag;
use super::{GtidFormat, GTID_SEPARATOR, GTID_SET_SEPARATOR};

/// Length of a UUID in text form (8-4-4-4-12 with hyphens).
pub const UUID_TEXT_LENGTH: usize = 36;

/// Length of a UUID in binary form.
pub const UUID_BYTE_LENGTH: usize = 16;

/// A transaction source identifier: UUID plus optional tag.
///
/// Ordered by UUID (lexicographic over the 16 bytes), then by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Tsid {
    uuid: Uuid,
    tag: Tag,
}

impl Tsid {
    pub fn new(uuid: Uuid, tag: Tag) -> Self {
        Tsid { uuid, tag }
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Tsid {
            uuid,
            tag: Tag::default(),
        }
    }

    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn is_tagged(&self) -> bool {
        self.tag.is_defined()
    }

    /// Parse `uuid[:tag]` from the start of `text`, replacing this
    /// tsid.
    ///
    /// Returns the number of bytes consumed, or 0 when no valid parse
    /// exists.  When the text continues with `:<number>` rather than a
    /// tag, the cursor stops after the UUID so the caller can parse the
    /// intervals.
    pub fn from_text(&mut self, text: &str) -> usize {
        let bytes = text.as_bytes();
        let Some(uuid_text) = text.get(..UUID_TEXT_LENGTH) else {
            return 0;
        };
        let Ok(uuid) = Uuid::try_parse(uuid_text) else {
            return 0;
        };
        self.uuid = uuid;
        self.tag = Tag::default();
        let mut consumed = UUID_TEXT_LENGTH;
        while consumed < bytes.len() && bytes[consumed].is_ascii_whitespace() {
            consumed += 1;
        }
        if consumed == bytes.len() || bytes[consumed] == GTID_SET_SEPARATOR as u8 {
            return consumed;
        }
        if bytes[consumed] != GTID_SEPARATOR as u8 {
            return 0;
        }
        let mut after_separator = 1;
        while consumed + after_separator < bytes.len()
            && bytes[consumed + after_separator].is_ascii_whitespace()
        {
            after_separator += 1;
        }
        let tag_consumed = self.tag.from_text(&text[consumed + after_separator..]);
        if self.tag.is_empty() {
            return consumed;
        }
        consumed + after_separator + tag_consumed
    }

    /// Append the binary form: 16 UUID bytes, then the tag in the given
    /// format.
    pub fn encode(&self, buf: &mut BytesMut, format: GtidFormat) {
        buf.put_slice(self.uuid.as_bytes());
        self.tag.encode(buf, format);
    }

    /// Decode the binary form, replacing this tsid.  Returns the number
    /// of bytes read, or 0 when the input is invalid.
    pub fn decode(&mut self, buf: &[u8], format: GtidFormat) -> usize {
        let Some(raw) = buf.get(..UUID_BYTE_LENGTH) else {
            return 0;
        };
        self.uuid = Uuid::from_slice(raw).expect("16 bytes");
        let mut read = UUID_BYTE_LENGTH;
        let tag_read = self.tag.decode(&buf[read..], format);
        if format == GtidFormat::Tagged && tag_read == 0 {
            return 0;
        }
        read += tag_read;
        read
    }
}

impl fmt::Display for Tsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid)?;
        if self.is_tagged() {
            write!(f, "{}{}", GTID_SEPARATOR, self.tag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use bytes::BytesMut;

    use super::*;

    const UUID_1: &str = "3E11FA47-71CA-11E1-9E33-C80AA9429562";

    #[test]
    fn test_parse_untagged() {
        let mut tsid = Tsid::default();
        let text = format!("{}:1-5", UUID_1);
        let consumed = tsid.from_text(&text);
        assert_eq!(consumed, UUID_TEXT_LENGTH);
        assert!(!tsid.is_tagged());
        assert_eq!(tsid.uuid().to_string(), UUID_1.to_lowercase());
    }

    #[test]
    fn test_parse_tagged() {
        let mut tsid = Tsid::default();
        let text = format!("{}:Tag_1:1-5", UUID_1);
        let consumed = tsid.from_text(&text);
        assert_eq!(consumed, UUID_TEXT_LENGTH + 1 + 5);
        assert_eq!(tsid.tag().as_str(), "tag_1");
        assert_eq!(tsid.to_string(), format!("{}:tag_1", UUID_1.to_lowercase()));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let mut tsid = Tsid::default();
        assert_eq!(tsid.from_text("not-a-uuid"), 0);
        assert_eq!(tsid.from_text(&format!("{}+x", UUID_1)), 0);
    }

    #[test]
    fn test_parse_stops_at_set_separator() {
        let mut tsid = Tsid::default();
        let text = format!("{},", UUID_1);
        assert_eq!(tsid.from_text(&text), UUID_TEXT_LENGTH);
    }

    #[test]
    fn test_binary_round_trip_tagged_and_untagged() {
        let uuid: Uuid = UUID_1.to_lowercase().parse().unwrap();
        for (tag, format, expected_len) in [
            (Tag::default(), GtidFormat::Untagged, UUID_BYTE_LENGTH),
            (Tag::new("alpha"), GtidFormat::Tagged, UUID_BYTE_LENGTH + 6),
        ] {
            let tsid = Tsid::new(uuid, tag);
            let mut buf = BytesMut::new();
            tsid.encode(&mut buf, format);
            assert_eq!(buf.len(), expected_len);
            let mut decoded = Tsid::default();
            assert_eq!(decoded.decode(&buf, format), expected_len);
            assert_eq!(decoded, tsid);
        }
    }

    #[test]
    fn test_ordering_is_uuid_then_tag() {
        let a: Uuid = "00000000-0000-0000-0000-000000000001".parse().unwrap();
        let b: Uuid = "00000000-0000-0000-0000-000000000002".parse().unwrap();
        assert!(Tsid::new(a, Tag::new("zz")) < Tsid::new(b, Tag::default()));
        assert!(Tsid::new(a, Tag::default()) < Tsid::new(a, Tag::new("aa")));
    }
}
