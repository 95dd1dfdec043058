//! Property-based tests for field-set dispatch.
//!
//! Dispatch must be total (never panic, never error) and must honor the
//! priority order of the table for every combination of present tags.

use perron_proto::{
    DISPATCH_TABLE, FieldSet, InboundMessage, MessageKind, Tag, Value, classify,
};
use proptest::prelude::*;

fn arbitrary_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::Int),
        any::<u32>().prop_map(Value::UInt),
        "[ -~]{0,40}".prop_map(Value::Str),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
    ]
}

fn arbitrary_tag() -> impl Strategy<Value = Tag> {
    prop::sample::select(Tag::ALL.to_vec())
}

/// Field sets built from known tags plus a few unknown raw keys.
fn arbitrary_field_set() -> impl Strategy<Value = FieldSet> {
    (
        prop::collection::vec((arbitrary_tag(), arbitrary_value()), 0..12),
        prop::collection::vec((41u32..1000, arbitrary_value()), 0..3),
    )
        .prop_map(|(known, unknown)| {
            let mut set: FieldSet = known.into_iter().collect();
            for (key, value) in unknown {
                set.insert_raw(key, value);
            }
            set
        })
}

/// Reference classifier written independently of the table.
fn expected_kind(set: &FieldSet) -> Option<MessageKind> {
    if set.contains(Tag::RequestFavorites) {
        Some(MessageKind::FavoritesRequested)
    } else if set.contains_all(&[Tag::StationName, Tag::StationId, Tag::StationDistance]) {
        Some(MessageKind::StationFound)
    } else if set.contains(Tag::NumFavorites) {
        Some(MessageKind::FavoritesCountAnnounced)
    } else if set.contains_all(&[Tag::FavoriteId, Tag::FavoriteName, Tag::FavoriteLabel]) {
        Some(MessageKind::FavoriteItemReceived)
    } else if set.contains_all(&[Tag::ConnectionData, Tag::DepartureTime, Tag::ArrivalTime]) {
        Some(MessageKind::ConnectionDataReceived)
    } else if set.contains(Tag::ErrorMessage) {
        Some(MessageKind::ErrorReported)
    } else {
        None
    }
}

proptest! {
    #[test]
    fn prop_classify_follows_priority(set in arbitrary_field_set()) {
        prop_assert_eq!(classify(&set), expected_kind(&set));
    }

    #[test]
    fn prop_parse_agrees_with_classify(set in arbitrary_field_set()) {
        let parsed = InboundMessage::parse(&set).map(|m| m.kind());
        prop_assert_eq!(parsed, classify(&set));
    }

    #[test]
    fn prop_favorites_request_always_wins(set in arbitrary_field_set()) {
        let set = set.with(Tag::RequestFavorites, 1u8);
        prop_assert_eq!(classify(&set), Some(MessageKind::FavoritesRequested));
    }

    #[test]
    fn prop_codec_preserves_dispatch(set in arbitrary_field_set()) {
        let bytes = set.encode().unwrap();
        let decoded = FieldSet::decode(&bytes).unwrap();
        prop_assert_eq!(classify(&decoded), classify(&set));
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(set) = FieldSet::decode(&bytes) {
            let _ = InboundMessage::parse(&set);
        }
    }
}

#[test]
fn table_rows_have_required_tags() {
    for rule in DISPATCH_TABLE {
        assert!(!rule.required.is_empty(), "{:?} has no required tags", rule.kind);
    }
}

#[test]
fn only_train_type_is_dropped() {
    let set = FieldSet::new().with(Tag::TrainType, "IR 2534");
    assert_eq!(classify(&set), None);
    assert_eq!(InboundMessage::parse(&set), None);
}
