use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use common::err::CodecError;

use super::gno_interval::GnoInterval;
use super::gtid::Gtid;
use super::tag::Tag;
use super::tsid::{Tsid, UUID_TEXT_LENGTH};
use super::{Gno, GtidFormat, GTID_SEPARATOR, GTID_SET_SEPARATOR, MAX_GNO, MIN_GNO};

/// Sorted intervals of one `(uuid, tag)` bucket.
pub type IntervalSet = BTreeSet<GnoInterval>;

/// Intervals per tag of one UUID.
pub type TagIntervalMap = BTreeMap<Tag, IntervalSet>;

/// A set of transaction identifiers, kept as sorted non-overlapping,
/// non-contiguous GNO intervals per `(uuid, tag)`.
///
/// Insertion restores the canonical form: every existing interval that
/// intersects or is contiguous with the inserted one is merged into it.
/// Empty buckets are never retained.
///
/// Text form (also accepted by [`FromStr`]):
///
/// ```text
/// gtid_set: uuid_set [, uuid_set]*
/// uuid_set: uuid (: tag_group)+
/// tag_group: [tag :] interval (: interval)*
/// interval: gno | gno-gno
/// ```
///
/// The empty set renders as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GtidSet {
    gtid_set: BTreeMap<Uuid, TagIntervalMap>,
}

impl GtidSet {
    pub fn new() -> Self {
        GtidSet::default()
    }

    /// The underlying two-level map.
    pub fn as_map(&self) -> &BTreeMap<Uuid, TagIntervalMap> {
        &self.gtid_set
    }

    /// Add one transaction identifier.
    pub fn add_gtid(&mut self, gtid: &Gtid) {
        self.add_interval(gtid.tsid(), GnoInterval::new(gtid.gno(), gtid.gno()));
    }

    /// Add an interval of transactions from one source.
    ///
    /// The interval must be valid (`start >= 1`, non-empty); invalid
    /// intervals are ignored in release builds and asserted in debug
    /// builds.
    pub fn add_interval(&mut self, tsid: &Tsid, interval: GnoInterval) {
        debug_assert!(interval.is_valid());
        if !interval.is_valid() {
            return;
        }
        self.do_add(*tsid.uuid(), tsid.tag().clone(), interval);
    }

    /// Add every identifier of `other` to this set.
    ///
    /// All-or-nothing: intervals held by a set are valid by
    /// construction, so no inner add can fail part way through.
    pub fn add_gtid_set(&mut self, other: &GtidSet) {
        for (uuid, tag_map) in &other.gtid_set {
            for (tag, intervals) in tag_map {
                for interval in intervals {
                    self.do_add(*uuid, tag.clone(), *interval);
                }
            }
        }
    }

    fn do_add(&mut self, uuid: Uuid, tag: Tag, interval: GnoInterval) {
        let intervals = self
            .gtid_set
            .entry(uuid)
            .or_default()
            .entry(tag)
            .or_default();
        // Sweep out everything the new interval touches, widening it to
        // the union as we go; one inserted interval may swallow many
        // existing ones.
        let mut merged = interval;
        intervals.retain(|existing| {
            if existing.intersects_or_contiguous(&merged) {
                let added = merged.add(existing);
                debug_assert!(added);
                false
            } else {
                true
            }
        });
        intervals.insert(merged);
    }

    /// True when the set contains the identifier.
    pub fn contains_gtid(&self, gtid: &Gtid) -> bool {
        let Some(tag_map) = self.gtid_set.get(gtid.uuid()) else {
            return false;
        };
        let Some(intervals) = tag_map.get(gtid.tag()) else {
            return false;
        };
        intervals.iter().any(|interval| interval.contains(gtid.gno()))
    }

    /// Total number of transaction identifiers in the set.
    pub fn count(&self) -> u64 {
        self.gtid_set
            .values()
            .flat_map(|tag_map| tag_map.values())
            .flat_map(|intervals| intervals.iter())
            .map(|interval| interval.count())
            .sum()
    }

    /// Number of distinct `(uuid, tag)` pairs.
    pub fn get_num_tsids(&self) -> usize {
        self.gtid_set.values().map(|tag_map| tag_map.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.gtid_set.is_empty()
    }

    /// Remove every identifier.
    pub fn reset(&mut self) {
        self.gtid_set.clear();
    }

    /// The binary format needed to represent this set: tagged as soon
    /// as any non-empty tag is present.
    pub fn get_gtid_set_format(&self) -> GtidFormat {
        let tagged = self
            .gtid_set
            .values()
            .flat_map(|tag_map| tag_map.keys())
            .any(|tag| tag.is_defined());
        if tagged {
            GtidFormat::Tagged
        } else {
            GtidFormat::Untagged
        }
    }
}

impl fmt::Display for GtidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first_uuid = true;
        for (uuid, tag_map) in &self.gtid_set {
            if !first_uuid {
                write!(f, "{}", GTID_SET_SEPARATOR)?;
            }
            first_uuid = false;
            write!(f, "{}", uuid)?;
            for (tag, intervals) in tag_map {
                if tag.is_defined() {
                    write!(f, "{}{}", GTID_SEPARATOR, tag)?;
                }
                for interval in intervals {
                    write!(f, "{}{}", GTID_SEPARATOR, interval)?;
                }
            }
        }
        Ok(())
    }
}

impl FromStr for GtidSet {
    type Err = CodecError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut set = GtidSet::new();
        if text.trim().is_empty() {
            return Ok(set);
        }
        // 存在多个GTID时会有回车符
        let text = text.replace('\n', "");
        for uuid_set_text in text.split(GTID_SET_SEPARATOR) {
            set.parse_uuid_set(uuid_set_text)?;
        }
        Ok(set)
    }
}

impl GtidSet {
    fn parse_uuid_set(&mut self, text: &str) -> Result<(), CodecError> {
        let trimmed = text.trim();
        let uuid_text = trimmed
            .get(..UUID_TEXT_LENGTH)
            .ok_or_else(|| CodecError::invalid(format!("invalid UUID set: {}", text)))?;
        let uuid = Uuid::try_parse(uuid_text)
            .map_err(|e| CodecError::invalid(format!("invalid UUID {}: {}", uuid_text, e)))?;
        let rest = &trimmed[UUID_TEXT_LENGTH..];
        let mut groups = rest.split(GTID_SEPARATOR);
        match groups.next() {
            Some(prefix) if prefix.trim().is_empty() => {}
            _ => {
                return Err(CodecError::invalid(format!(
                    "expected '{}' after UUID: {}",
                    GTID_SEPARATOR, text
                )))
            }
        }
        let mut current_tag = Tag::default();
        let mut seen_interval_or_tag = false;
        for token in groups {
            let token = token.trim();
            if token.is_empty() {
                return Err(CodecError::invalid(format!("empty element in: {}", text)));
            }
            if token.as_bytes()[0].is_ascii_digit() {
                let interval = Self::parse_interval(token)?;
                self.do_add(uuid, current_tag.clone(), interval);
            } else {
                let mut tag = Tag::default();
                if tag.from_text(token) == 0 || tag.is_empty() {
                    return Err(CodecError::invalid(format!("invalid tag: {}", token)));
                }
                current_tag = tag;
            }
            seen_interval_or_tag = true;
        }
        if !seen_interval_or_tag {
            return Err(CodecError::invalid(format!(
                "UUID without intervals: {}",
                text
            )));
        }
        Ok(())
    }

    fn parse_interval(token: &str) -> Result<GnoInterval, CodecError> {
        let (start_text, end_text) = match token.split_once('-') {
            Some((start, end)) => (start, end),
            None => (token, token),
        };
        let start: Gno = start_text.trim().parse()?;
        let end: Gno = end_text.trim().parse()?;
        if start < MIN_GNO || end > MAX_GNO || end < start {
            return Err(CodecError::invalid(format!("invalid interval: {}", token)));
        }
        Ok(GnoInterval::new(start, end))
    }
}
