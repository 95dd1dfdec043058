//! Fuzz target for inbound decoding and dispatch
//!
//! # Strategy
//!
//! - Raw bytes: arbitrary CBOR straight from the host inbox
//! - Structured: arbitrary tag/value pairs, including unknown tags and
//!   mistyped values, built into a field set
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - `parse` succeeds exactly when `classify` finds a rule
//! - A parsed message keeps its kind through `to_field_set`
//! - A decoded field set survives an encode/decode round trip unchanged

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use perron_proto::{FieldSet, InboundMessage, Value, classify};

#[derive(Debug, Arbitrary)]
enum Input {
    Raw(Vec<u8>),
    Fields(Vec<(u8, FuzzValue)>),
}

#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Int(i32),
    UInt(u32),
    Str(String),
    Bytes(Vec<u8>),
}

impl From<FuzzValue> for Value {
    fn from(value: FuzzValue) -> Self {
        match value {
            FuzzValue::Int(v) => Value::Int(v),
            FuzzValue::UInt(v) => Value::UInt(v),
            FuzzValue::Str(s) => Value::Str(s),
            FuzzValue::Bytes(b) => Value::Bytes(b),
        }
    }
}

fuzz_target!(|input: Input| {
    let fields = match input {
        Input::Raw(bytes) => match FieldSet::decode(&bytes) {
            Ok(fields) => fields,
            Err(_) => return,
        },
        Input::Fields(pairs) => {
            let mut fields = FieldSet::new();
            for (key, value) in pairs {
                fields.insert_raw(u32::from(key % 48), value);
            }
            fields
        },
    };

    let kind = classify(&fields);
    let parsed = InboundMessage::parse(&fields);
    assert_eq!(kind.is_some(), parsed.is_some());

    if let Some(message) = parsed {
        assert_eq!(Some(message.kind()), kind);
        assert_eq!(classify(&message.to_field_set()), kind);
    }

    if let Ok(bytes) = fields.encode() {
        let decoded = FieldSet::decode(&bytes).expect("re-encoded field set must decode");
        assert_eq!(decoded, fields);
    }
});
