use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};
use serde::Serialize;

use common::err::CodecError;

use super::tsid::Tsid;
use super::{Gno, GtidFormat, GTID_SEPARATOR, MAX_GNO, MIN_GNO};

/// A global transaction identifier: `(tsid, gno)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Gtid {
    tsid: Tsid,
    gno: Gno,
}

impl Gtid {
    pub fn new(tsid: Tsid, gno: Gno) -> Self {
        Gtid { tsid, gno }
    }

    pub fn tsid(&self) -> &Tsid {
        &self.tsid
    }

    pub fn uuid(&self) -> &super::Uuid {
        self.tsid.uuid()
    }

    pub fn tag(&self) -> &super::tag::Tag {
        self.tsid.tag()
    }

    pub fn gno(&self) -> Gno {
        self.gno
    }

    pub fn is_valid(&self) -> bool {
        (MIN_GNO..=MAX_GNO).contains(&self.gno)
    }

    /// Append the binary form: the tsid followed by the 8-byte
    /// little-endian gno.
    pub fn encode(&self, buf: &mut BytesMut, format: GtidFormat) {
        self.tsid.encode(buf, format);
        buf.put_i64_le(self.gno);
    }

    /// Decode the binary form.  Returns the identifier and the number
    /// of bytes read, or `None` when the input is invalid.
    pub fn decode(buf: &[u8], format: GtidFormat) -> Option<(Gtid, usize)> {
        let mut tsid = Tsid::default();
        let tsid_read = tsid.decode(buf, format);
        if tsid_read == 0 {
            return None;
        }
        let raw = buf.get(tsid_read..tsid_read + 8)?;
        let gno = i64::from_le_bytes(raw.try_into().expect("8 bytes"));
        let gtid = Gtid::new(tsid, gno);
        if !gtid.is_valid() {
            return None;
        }
        Some((gtid, tsid_read + 8))
    }
}

impl fmt::Display for Gtid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.tsid, GTID_SEPARATOR, self.gno)
    }
}

impl FromStr for Gtid {
    type Err = CodecError;

    /// Parse `uuid[:tag]:gno`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut tsid = Tsid::default();
        let consumed = tsid.from_text(text);
        if consumed == 0 {
            return Err(CodecError::invalid(format!("invalid GTID: {}", text)));
        }
        let rest = &text[consumed..];
        let rest = rest
            .strip_prefix(GTID_SEPARATOR)
            .ok_or_else(|| CodecError::invalid(format!("missing GNO in GTID: {}", text)))?;
        let gno: Gno = rest.trim().parse()?;
        if !(MIN_GNO..=MAX_GNO).contains(&gno) {
            return Err(CodecError::invalid(format!("GNO out of range: {}", gno)));
        }
        Ok(Gtid::new(tsid, gno))
    }
}
