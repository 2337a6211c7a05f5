//! Server-side request body ceiling
//!
//! The ceiling is configured as a shorthand byte string such as `"8m"`:
//! a leading number followed by an optional `k`, `m` or `g` suffix
//! (case-insensitive, binary multiples). Each suffix implies every smaller
//! unit as well, so `g` multiplies by 1024 three times.

use serde::{Deserialize, Deserializer};

/// Maximum accepted total request body size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostSizeLimit(Option<u64>);

impl PostSizeLimit {
    /// No ceiling enforced
    pub const UNLIMITED: Self = Self(None);

    /// Ceiling of exactly `bytes`; zero means unlimited
    pub fn bytes(bytes: u64) -> Self {
        if bytes == 0 {
            Self::UNLIMITED
        } else {
            Self(Some(bytes))
        }
    }

    /// Parse a shorthand string; empty or unparsable input means unlimited
    pub fn parse(value: &str) -> Self {
        parse_shorthand_bytes(value).map_or(Self::UNLIMITED, Self::bytes)
    }

    /// Configured ceiling, if any
    pub fn get(&self) -> Option<u64> {
        self.0
    }

    /// Whether a request declaring `content_length` bytes is over the ceiling
    pub fn is_exceeded_by(&self, content_length: Option<u64>) -> bool {
        match (self.0, content_length) {
            (Some(limit), Some(length)) => length > limit,
            _ => false,
        }
    }
}

impl<'de> Deserialize<'de> for PostSizeLimit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bytes(u64),
            Fractional(f64),
            Shorthand(String),
            Other(serde::de::IgnoredAny),
        }

        // Null, negative or otherwise unusable values leave the ceiling unset
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bytes(bytes) => Self::bytes(bytes),
            Raw::Fractional(value) if value.is_finite() && value > 0.0 => {
                Self::bytes(value as u64)
            }
            Raw::Fractional(_) | Raw::Other(_) => Self::UNLIMITED,
            Raw::Shorthand(value) => Self::parse(&value),
        })
    }
}

/// Parse `"<number>[k|m|g]"` into a byte count
///
/// The number is the leading run of digits, optionally with a fractional
/// part (`"1.5g"`); anything between it and the final character is ignored.
/// Fractional results are truncated to whole bytes. Returns `None` when there
/// are no leading digits. Results that overflow saturate at `u64::MAX`.
pub fn parse_shorthand_bytes(value: &str) -> Option<u64> {
    let value = value.trim();
    let last = value.chars().last()?.to_ascii_lowercase();

    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let digits = &value[..digits_end];
    if digits.is_empty() {
        return None;
    }

    let fraction = value[digits_end..]
        .strip_prefix('.')
        .map(|rest| {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..end]
        })
        .filter(|f| f.chars().any(|c| c != '0'));

    let exponent = match last {
        'g' => 3,
        'm' => 2,
        'k' => 1,
        _ => 0,
    };
    let multiplier = 1024u64.saturating_pow(exponent);

    match fraction {
        None => {
            let number: u64 = digits.parse().unwrap_or(u64::MAX);
            Some(number.saturating_mul(multiplier))
        }
        Some(fraction) => {
            let number: f64 = format!("{}.{}", digits, fraction).parse().ok()?;
            // `as` saturates at u64::MAX
            Some((number * multiplier as f64) as u64)
        }
    }
}
