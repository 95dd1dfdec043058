//! Typed field values.

use serde::{Deserialize, Serialize};

/// A single typed value carried in a [`crate::FieldSet`].
///
/// Mirrors the value kinds the host transport supports: signed and unsigned
/// integers, NUL-free text and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Signed 32-bit integer.
    Int(i32),
    /// Unsigned 32-bit integer.
    UInt(u32),
    /// UTF-8 text.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// Text content. `None` unless the value is [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content. `None` for non-integers or unsigned values above
    /// `i32::MAX`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i32::try_from(*v).ok(),
            Self::Str(_) | Self::Bytes(_) => None,
        }
    }

    /// Lenient text conversion.
    ///
    /// Integers render as decimal, bytes decode as lossy UTF-8. Never fails.
    pub fn to_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(v) => v.to_string(),
            Self::UInt(v) => v.to_string(),
            Self::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Lenient integer conversion.
    ///
    /// Text is parsed after trimming; anything unparsable or out of range
    /// yields 0. Never fails.
    pub fn to_i32_lossy(&self) -> i32 {
        match self {
            Self::Str(s) => s.trim().parse().unwrap_or(0),
            Self::Bytes(_) => 0,
            other => other.as_i32().unwrap_or(0),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::UInt(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Self::UInt(u32::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}
