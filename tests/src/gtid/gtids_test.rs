#[cfg(test)]
mod test {
    use bytes::BytesMut;
    use uuid::Uuid;

    use binlog::gtid::{GnoInterval, Gtid, GtidFormat, GtidSet, Tag, Tsid};

    const UUID_1: &str = "3e11fa47-71ca-11e1-9e33-c80aa9429562";
    const UUID_2: &str = "8c27b3c2-71ca-11e1-9e33-c80aa9429562";

    fn uuid(text: &str) -> Uuid {
        text.parse().unwrap()
    }

    fn gtid(uuid_text: &str, tag: &str, gno: i64) -> Gtid {
        Gtid::new(Tsid::new(uuid(uuid_text), Tag::new(tag)), gno)
    }

    #[test]
    fn test_basic_scenario() {
        let mut set = GtidSet::new();
        set.add_gtid(&gtid(UUID_1, "", 1));
        set.add_gtid(&gtid(UUID_1, "", 2));
        set.add_gtid(&gtid(UUID_2, "", 1));

        assert_eq!(set.count(), 3);
        assert!(set.contains_gtid(&gtid(UUID_1, "", 1)));
        assert!(set.contains_gtid(&gtid(UUID_1, "", 2)));
        assert!(set.contains_gtid(&gtid(UUID_2, "", 1)));
        assert!(!set.contains_gtid(&gtid(UUID_2, "", 2)));
        assert_eq!(set.to_string(), format!("{}:1-2,{}:1", UUID_1, UUID_2));

        let copy = set.clone();
        assert_eq!(copy, set);
        set.reset();
        assert!(set.is_empty());
        assert_eq!(copy.count(), 3);
    }

    /// A set survives rendering to text and parsing back, including
    /// tagged streams and multi-interval buckets.
    #[test]
    fn test_text_round_trip() {
        let mut set = GtidSet::new();
        for gno in [1, 2, 3, 7, 9, 10, 11] {
            set.add_gtid(&gtid(UUID_1, "", gno));
        }
        for gno in [4, 6] {
            set.add_gtid(&gtid(UUID_1, "payments", gno));
        }
        set.add_interval(
            &Tsid::new(uuid(UUID_2), Tag::default()),
            GnoInterval::new(100, 200),
        );

        let text = set.to_string();
        assert_eq!(
            text,
            format!("{}:1-3:7:9-11:payments:4:6,{}:100-200", UUID_1, UUID_2)
        );
        let parsed: GtidSet = text.parse().unwrap();
        assert_eq!(parsed, set);
        assert_eq!(parsed.to_string(), text);
    }

    /// Unions merge interval structures across sets.
    #[test]
    fn test_set_union() {
        let mut a: GtidSet = format!("{}:1-10:20-30", UUID_1).parse().unwrap();
        let b: GtidSet = format!("{}:5-25,{}:1", UUID_1, UUID_2).parse().unwrap();
        a.add_gtid_set(&b);
        assert_eq!(a.to_string(), format!("{}:1-30,{}:1", UUID_1, UUID_2));
        assert_eq!(a.count(), 31);
        assert_eq!(a.get_num_tsids(), 2);
    }

    /// Single-GTID binary codec, tagged and untagged flavors.
    #[test]
    fn test_gtid_binary_codec() {
        let tagged = gtid(UUID_1, "europe", 77);
        let untagged = gtid(UUID_1, "", 77);

        let mut buf = BytesMut::new();
        tagged.encode(&mut buf, GtidFormat::Tagged);
        assert_eq!(buf.len(), 16 + 1 + "europe".len() + 8);
        let (decoded, read) = Gtid::decode(&buf, GtidFormat::Tagged).unwrap();
        assert_eq!(read, buf.len());
        assert_eq!(decoded, tagged);

        let mut buf = BytesMut::new();
        untagged.encode(&mut buf, GtidFormat::Untagged);
        assert_eq!(buf.len(), 16 + 8);
        let (decoded, read) = Gtid::decode(&buf, GtidFormat::Untagged).unwrap();
        assert_eq!(read, buf.len());
        assert_eq!(decoded, untagged);

        // The format flag is out of band: tagged bytes read with the
        // untagged flag decode to a different identifier, not an error.
        let mut buf = BytesMut::new();
        tagged.encode(&mut buf, GtidFormat::Tagged);
        let (decoded, _) = Gtid::decode(&buf, GtidFormat::Untagged).unwrap_or_else(|| {
            // Or fail to decode entirely, depending on the gno bytes.
            (untagged.clone(), 0)
        });
        assert_ne!(decoded, tagged);
    }

    #[test]
    fn test_format_selection_follows_tags() {
        let mut set: GtidSet = format!("{}:1-5", UUID_1).parse().unwrap();
        assert_eq!(set.get_gtid_set_format(), GtidFormat::Untagged);
        set.add_gtid(&gtid(UUID_2, "analytics", 1));
        assert_eq!(set.get_gtid_set_format(), GtidFormat::Tagged);
    }

    #[test]
    fn test_uuid_order_in_rendering_is_bytewise() {
        // UUID_2 > UUID_1 bytewise; insertion order must not matter.
        let mut set = GtidSet::new();
        set.add_gtid(&gtid(UUID_2, "", 5));
        set.add_gtid(&gtid(UUID_1, "", 5));
        assert_eq!(set.to_string(), format!("{}:5,{}:5", UUID_1, UUID_2));
    }
}
