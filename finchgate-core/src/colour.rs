use serde::{Deserialize, Serialize};
use std::fmt;

/// A colour as it is named in the trial catalog.
///
/// Names are kept verbatim so catalog validation can compare them exactly;
/// trial selection compares them ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Colour(String);

impl Colour {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn eq_ignore_case(&self, other: &Colour) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Resolves the name to an RGB triple.
    ///
    /// `dark`/`black` and `light`/`white` are the experimental brightness
    /// levels, `orchid2`/`cyan2` are the pause colours, and anything of the
    /// form `#rrggbb` is taken literally. Unknown names yield `None`.
    pub fn rgb(&self) -> Option<[u8; 3]> {
        match self.0.to_ascii_lowercase().as_str() {
            "dark" | "black" => Some([0x00, 0x00, 0x00]),
            "light" | "white" => Some([0xff, 0xff, 0xff]),
            "orchid2" => Some([0xee, 0x7a, 0xe9]),
            "cyan2" => Some([0x00, 0xee, 0xee]),
            hex => parse_hex(hex),
        }
    }
}

fn parse_hex(s: &str) -> Option<[u8; 3]> {
    let digits = s.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Colour {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Left/right pair of colours painted on the two halves of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueColours {
    pub left: Colour,
    pub right: Colour,
}

impl CueColours {
    pub fn new(left: impl Into<Colour>, right: impl Into<Colour>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Shown while the rig is paused. Trial catalogs may not use either
    /// colour as a background.
    pub fn pause() -> Self {
        Self::new("orchid2", "cyan2")
    }
}

impl fmt::Display for CueColours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.left, self.right)
    }
}
