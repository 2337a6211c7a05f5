//! Accept pattern for declared file names
//!
//! Accepts either a bare regular expression (`\.png$`) or a delimited one with
//! trailing flags (`/\.png$/i`).

use lazy_static::lazy_static;
use regex_lite::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer};
use std::fmt;
use thiserror::Error;

/// Pattern matching everything except the empty name
pub const MATCH_ANY: &str = ".+";

lazy_static! {
    static ref ANY_NAME: Regex = Regex::new(MATCH_ANY).unwrap();
}

/// Accept pattern errors
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Invalid accept pattern '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex_lite::Error,
    },

    #[error("Unsupported flag '{flag}' in accept pattern '{pattern}'")]
    UnsupportedFlag { pattern: String, flag: char },
}

/// Compiled file-name rule
#[derive(Clone)]
pub struct AcceptPattern {
    source: String,
    regex: Regex,
}

impl AcceptPattern {
    /// Compile a bare or `/delimited/flags` pattern
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let (body, flags) = split_delimited(pattern).unwrap_or((pattern, ""));

        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                'u' => &mut builder,
                other => {
                    return Err(PatternError::UnsupportedFlag {
                        pattern: pattern.to_string(),
                        flag: other,
                    })
                }
            };
        }

        let regex = builder.build().map_err(|source| PatternError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Pattern that accepts any non-empty name
    pub fn any() -> Self {
        Self {
            source: MATCH_ANY.to_string(),
            regex: ANY_NAME.clone(),
        }
    }

    /// Whether `name` is acceptable
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Pattern as it was configured
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for AcceptPattern {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Debug for AcceptPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AcceptPattern").field(&self.source).finish()
    }
}

impl PartialEq for AcceptPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl std::str::FromStr for AcceptPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for AcceptPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// Split `/body/flags` into its parts; `None` for a bare pattern
fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
    let rest = pattern.strip_prefix('/')?;
    let end = rest.rfind('/')?;
    let flags = &rest[end + 1..];
    if !flags.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((&rest[..end], flags))
}
