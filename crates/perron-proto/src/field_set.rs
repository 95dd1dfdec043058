//! Tag-keyed field sets and their CBOR encoding.
//!
//! A [`FieldSet`] is the unit of exchange with the companion: an unordered
//! map from numeric tag to typed value. Keys outside the known tag space are
//! preserved on decode so that newer companions can add fields without
//! breaking older clients.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{
    Tag, Value,
    errors::{ProtocolError, Result},
};

/// Map from numeric tag to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet {
    fields: BTreeMap<u32, Value>,
}

impl FieldSet {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, tag: Tag, value: impl Into<Value>) -> Self {
        self.insert(tag, value);
        self
    }

    /// Insert or replace the value for `tag`.
    pub fn insert(&mut self, tag: Tag, value: impl Into<Value>) {
        self.fields.insert(tag.to_u32(), value.into());
    }

    /// Insert a value under a raw key, including keys outside the tag space.
    pub fn insert_raw(&mut self, key: u32, value: impl Into<Value>) {
        self.fields.insert(key, value.into());
    }

    /// Whether `tag` is present.
    pub fn contains(&self, tag: Tag) -> bool {
        self.fields.contains_key(&tag.to_u32())
    }

    /// Whether every tag in `tags` is present.
    pub fn contains_all(&self, tags: &[Tag]) -> bool {
        tags.iter().all(|tag| self.contains(*tag))
    }

    /// Value for `tag`. `None` if absent.
    pub fn get(&self, tag: Tag) -> Option<&Value> {
        self.fields.get(&tag.to_u32())
    }

    /// Lenient text for `tag`. Empty if absent.
    pub fn text(&self, tag: Tag) -> String {
        self.get(tag).map(Value::to_text).unwrap_or_default()
    }

    /// Lenient integer for `tag`. Zero if absent or unparsable.
    pub fn int(&self, tag: Tag) -> i32 {
        self.get(tag).map_or(0, Value::to_i32_lossy)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the set holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(raw key, value)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Encode as CBOR.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(64);
        ciborium::into_writer(self, &mut buf).map_err(|e| ProtocolError::Encode(e.to_string()))?;
        Ok(Bytes::from(buf))
    }

    /// Encode as CBOR, rejecting output larger than `capacity` bytes.
    pub fn encode_bounded(&self, capacity: usize) -> Result<Bytes> {
        let bytes = self.encode()?;
        if bytes.len() > capacity {
            return Err(ProtocolError::MessageTooLarge { size: bytes.len(), capacity });
        }
        Ok(bytes)
    }

    /// Decode from CBOR.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

impl FromIterator<(Tag, Value)> for FieldSet {
    fn from_iter<T: IntoIterator<Item = (Tag, Value)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (tag, value) in iter {
            set.insert(tag, value);
        }
        set
    }
}
