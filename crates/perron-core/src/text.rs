//! Fixed-capacity text.
//!
//! Record fields model NUL-terminated buffers of `CAP` bytes, so at most
//! `CAP - 1` bytes of text fit. Overlong input is truncated at the last
//! character boundary that fits. Truncation is silent: it is a property of
//! the record model, not an error.

use std::{fmt, ops::Deref};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Text holding at most `CAP - 1` bytes of UTF-8.
///
/// # Invariants
///
/// - `self.len() < CAP` for every value, including deserialized ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedStr<const CAP: usize> {
    text: String,
}

/// Station identifier, 16-byte buffer.
pub type StationId = FixedStr<16>;
/// Station display name, 32-byte buffer.
pub type StationName = FixedStr<32>;
/// Short favorite label such as "Home", 16-byte buffer.
pub type FavoriteLabel = FixedStr<16>;
/// Departure platform, 8-byte buffer.
pub type Platform = FixedStr<8>;
/// Train category and number, 16-byte buffer.
pub type TrainType = FixedStr<16>;

impl<const CAP: usize> FixedStr<CAP> {
    /// Maximum number of bytes a value can hold.
    pub const MAX_LEN: usize = CAP.saturating_sub(1);

    /// Create from `text`, truncating to [`Self::MAX_LEN`] bytes.
    pub fn new(text: &str) -> Self {
        Self { text: truncated(text, Self::MAX_LEN).to_string() }
    }

    /// Text content.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Longest prefix of `text` that fits in `max_len` bytes without splitting a
/// character.
fn truncated(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

impl<const CAP: usize> Deref for FixedStr<CAP> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl<const CAP: usize> AsRef<str> for FixedStr<CAP> {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl<const CAP: usize> fmt::Display for FixedStr<CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl<const CAP: usize> From<&str> for FixedStr<CAP> {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl<const CAP: usize> From<String> for FixedStr<CAP> {
    fn from(mut text: String) -> Self {
        let keep = truncated(&text, Self::MAX_LEN).len();
        text.truncate(keep);
        Self { text }
    }
}

impl<const CAP: usize> PartialEq<str> for FixedStr<CAP> {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl<const CAP: usize> PartialEq<&str> for FixedStr<CAP> {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl<const CAP: usize> Serialize for FixedStr<CAP> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de, const CAP: usize> Deserialize<'de> for FixedStr<CAP> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}
