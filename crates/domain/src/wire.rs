//! Lenient decoding of scalar wire values.
//!
//! Popup payloads and page data carry identifiers and flags either as JSON
//! strings or as JSON numbers; both decode to the same canonical text.

use serde::{Deserialize, Deserializer};

/// A scalar as it may appear in a popup payload or page data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireScalar {
    /// String value.
    Text(String),
    /// Integral numeric value.
    Integer(i64),
    /// Fractional numeric value.
    Float(f64),
    /// Boolean value, canonicalized to `1`/`0`.
    Flag(bool),
}

impl WireScalar {
    /// Returns the canonical text form of the scalar.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Flag(true) => "1".to_owned(),
            Self::Flag(false) => "0".to_owned(),
        }
    }
}

/// Deserializes a string or number into its text form.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    WireScalar::deserialize(deserializer).map(WireScalar::into_text)
}

/// Deserializes an optional string or number; `null` maps to `None`.
pub fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<WireScalar>::deserialize(deserializer).map(|value| value.map(WireScalar::into_text))
}

/// Deserializes a non-negative count given as string or number.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    trimmed
        .parse::<u32>()
        .map_err(|error| serde::de::Error::custom(format!("invalid count '{text}': {error}")))
}

/// Deserializes a flag given as boolean, number, or `0`/`1` text.
pub fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer).map(|text| parse_flag(text.as_str()))
}

/// Parses a `0`/`1` style flag.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "on")
}

/// Formats a flag in its `0`/`1` wire form.
#[must_use]
pub fn format_flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
