//! Public identifier of an attendance record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::{Error, ErrorCode, ErrorMessage};

/// Pair of store-assigned id and random control token, written `<id>-<control>`.
///
/// # Examples
/// ```
/// use frequencia::domain::ControlNumber;
///
/// let number: ControlNumber = " 42-7 ".parse().expect("valid control number");
/// assert_eq!(number.id(), 42);
/// assert_eq!(number.control(), 7);
/// assert_eq!(number.to_string(), "42-7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlNumber {
    id: i64,
    control: i64,
}

impl ControlNumber {
    pub const fn new(id: i64, control: i64) -> Self {
        Self { id, control }
    }

    pub const fn id(&self) -> i64 {
        self.id
    }

    pub const fn control(&self) -> i64 {
        self.control
    }

    /// Parse the textual form.
    ///
    /// Surrounding whitespace is ignored. Both halves must be non-empty runs
    /// of ASCII digits that fit an `i64`, separated by a single `-`.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let trimmed = input.trim();
        let invalid = || {
            Error::from_message(
                ErrorMessage::new(ErrorCode::ControlNumberFormat)
                    .with_field("numeroControle")
                    .with_value(trimmed),
            )
        };

        let (id, control) = trimmed.split_once('-').ok_or_else(invalid)?;
        let id = parse_half(id).ok_or_else(invalid)?;
        let control = parse_half(control).ok_or_else(invalid)?;
        Ok(Self { id, control })
    }
}

fn parse_half(half: &str) -> Option<i64> {
    if half.is_empty() || !half.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    half.parse().ok()
}

impl fmt::Display for ControlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.id, self.control)
    }
}

impl FromStr for ControlNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ControlNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ControlNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
