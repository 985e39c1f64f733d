//! Wire format for timestamps.
//!
//! The API encodes every timestamp as `dd/MM/yyyy hh:mm a`, e.g.
//! `09/01/2024 03:30 PM`, in the user's local wall-clock time.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serializer};

/// chrono pattern for the API timestamp format.
pub const WIRE_FORMAT: &str = "%d/%m/%Y %I:%M %p";

/// Format a timestamp for the wire.
pub fn format(value: &NaiveDateTime) -> String {
    value.format(WIRE_FORMAT).to_string()
}

/// Parse a wire timestamp.
pub fn parse(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text.trim(), WIRE_FORMAT)
}

/// serde adapter for required timestamps.
pub mod wire {
    use super::*;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }
}

/// serde adapter for optional timestamps. Empty strings read as `None`.
pub mod wire_opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&format(v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.trim().is_empty() => {
                parse(&text).map(Some).map_err(serde::de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}
