//! Scalar formats accepted in the settings document.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use image::Rgba;
use serde::{Deserialize, Deserializer};

/// `#RRGGBB` or `#RRGGBBAA` colour.
///
/// # Examples
/// ```
/// use frequencia::settings::Colour;
///
/// let colour: Colour = "#2E7D32".parse().expect("valid colour");
/// assert_eq!(colour.rgba().0, [0x2E, 0x7D, 0x32, 0xFF]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Colour(Rgba<u8>);

impl Colour {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(Rgba([r, g, b, 0xFF]))
    }

    pub const fn rgba(self) -> Rgba<u8> {
        self.0
    }
}

impl FromStr for Colour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || format!("expected #RRGGBB or #RRGGBBAA, got {trimmed:?}");
        let hex = trimmed.strip_prefix('#').ok_or_else(invalid)?;
        if !matches!(hex.len(), 6 | 8) || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |index: usize| {
            hex.get(index..index + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(invalid)
        };
        let alpha = if hex.len() == 8 { channel(6)? } else { 0xFF };
        Ok(Self(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha])))
    }
}

impl TryFrom<String> for Colour {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0.0;
        write!(f, "#{r:02X}{g:02X}{b:02X}{a:02X}")
    }
}

/// Human-readable duration such as `30m`, `12h` or `90s`.
pub fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::opaque("#FFFFFF", [0xFF, 0xFF, 0xFF, 0xFF])]
    #[case::lowercase("#2e7d32", [0x2E, 0x7D, 0x32, 0xFF])]
    #[case::alpha("#00000080", [0, 0, 0, 0x80])]
    #[case::padded(" #E0E0E0 ", [0xE0, 0xE0, 0xE0, 0xFF])]
    fn colours_parse(#[case] raw: &str, #[case] expected: [u8; 4]) {
        let colour: Colour = raw.parse().expect("valid colour");
        assert_eq!(colour.rgba(), Rgba(expected));
    }

    #[rstest]
    #[case::no_hash("FFFFFF")]
    #[case::short("#FFF")]
    #[case::not_hex("#GGGGGG")]
    #[case::odd("#FFFFFFF")]
    fn malformed_colours_are_rejected(#[case] raw: &str) {
        assert!(raw.parse::<Colour>().is_err());
    }

    #[rstest]
    fn colours_display_with_alpha() {
        assert_eq!(Colour::new(0x2E, 0x7D, 0x32).to_string(), "#2E7D32FF");
    }
}
