use std::fmt;

use bytes::{BufMut, BytesMut};
use serde::Serialize;

use super::{GtidFormat, TAG_MAX_LENGTH};

/// A tag distinguishing logical streams from one source: up to 32
/// characters matching `[a-z_][a-z0-9_]*`, case-folded to lower case on
/// input.  The empty tag is legal and means "untagged".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Tag {
    data: String,
}

impl Tag {
    /// Parse a tag from the start of `text`; an unparsable text yields
    /// the empty tag.
    pub fn new(text: &str) -> Self {
        let mut tag = Tag::default();
        let _ = tag.from_text(text);
        tag
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_defined(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    fn is_character_valid(c: u8, pos: usize) -> bool {
        c.is_ascii_alphabetic() || c == b'_' || (c.is_ascii_digit() && pos > 0)
    }

    fn is_valid_end_char(c: u8) -> bool {
        c == b':' || c == b','
    }

    /// Parse a tag from the start of `text`, replacing this tag.
    ///
    /// Skips leading whitespace, consumes valid tag characters up to
    /// the length limit, then skips trailing whitespace.  The next
    /// character must be `:`, `,` or the end of the text; anything else
    /// invalidates the parse.
    ///
    /// Returns the number of bytes consumed, with the cursor positioned
    /// after the trailing whitespace; 0 when the parse failed (the tag
    /// is then empty).
    pub fn from_text(&mut self, text: &str) -> usize {
        self.data.clear();
        let bytes = text.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let start = pos;
        let mut length = 0;
        while pos < bytes.len()
            && length < TAG_MAX_LENGTH
            && Self::is_character_valid(bytes[pos], length)
        {
            pos += 1;
            length += 1;
        }
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos < bytes.len() && !Self::is_valid_end_char(bytes[pos]) {
            return 0;
        }
        self.data = text[start..start + length].to_ascii_lowercase();
        pos
    }

    /// Append the binary form: nothing for the untagged format, one
    /// length byte followed by the raw characters for the tagged
    /// format.
    pub fn encode(&self, buf: &mut BytesMut, format: GtidFormat) {
        match format {
            GtidFormat::Untagged => {
                debug_assert!(self.is_empty());
            }
            GtidFormat::Tagged => {
                buf.put_u8(self.data.len() as u8);
                buf.put_slice(self.data.as_bytes());
            }
        }
    }

    /// Decode the binary form, replacing this tag.
    ///
    /// Returns the number of bytes read; for the tagged format, 0 means
    /// the encoding was invalid (bad length or bad characters).
    pub fn decode(&mut self, buf: &[u8], format: GtidFormat) -> usize {
        self.data.clear();
        if format == GtidFormat::Untagged {
            return 0;
        }
        let Some(&length) = buf.first() else {
            return 0;
        };
        let length = length as usize;
        if length > TAG_MAX_LENGTH {
            return 0;
        }
        let Some(raw) = buf.get(1..1 + length) else {
            return 0;
        };
        for (pos, &c) in raw.iter().enumerate() {
            if !Self::is_character_valid(c, pos) {
                return 0;
            }
        }
        // Characters are ASCII by construction.
        self.data = String::from_utf8_lossy(raw).to_ascii_lowercase();
        1 + length
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}
