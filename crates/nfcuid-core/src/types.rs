use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character inserted between UID bytes or appended after the UID.
///
/// Only this fixed set is accepted; anything else is rejected while the
/// command line is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharFlag {
    #[default]
    None,
    Space,
    Comma,
    Colon,
    Hyphen,
    Tab,
    NewLine,
}

impl CharFlag {
    /// All accepted flags, in the order they are listed in help output.
    pub const ALL: [CharFlag; 7] = [
        CharFlag::None,
        CharFlag::Space,
        CharFlag::Comma,
        CharFlag::Colon,
        CharFlag::Hyphen,
        CharFlag::Tab,
        CharFlag::NewLine,
    ];

    /// Text rendered into the formatted UID.
    #[must_use]
    pub fn output(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Space => " ",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Hyphen => "-",
            Self::Tab => "\t",
            Self::NewLine => "\n",
        }
    }

    /// Name accepted on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Space => "space",
            Self::Comma => "comma",
            Self::Colon => "colon",
            Self::Hyphen => "hyphen",
            Self::Tab => "tab",
            Self::NewLine => "newline",
        }
    }

    /// Comma separated list of accepted names, for usage messages.
    #[must_use]
    pub fn options() -> String {
        Self::ALL
            .iter()
            .map(CharFlag::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for CharFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CharFlag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "space" => Ok(Self::Space),
            "comma" => Ok(Self::Comma),
            "colon" => Ok(Self::Colon),
            "hyphen" | "dash" => Ok(Self::Hyphen),
            "tab" => Ok(Self::Tab),
            "newline" | "new-line" | "enter" => Ok(Self::NewLine),
            _ => Err(Error::UnknownCharFlag {
                value: s.to_string(),
                options: Self::options(),
            }),
        }
    }
}

/// Options controlling how a UID is rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Appended after the last byte.
    pub end_char: CharFlag,

    /// Inserted between bytes.
    pub in_char: CharFlag,

    /// Upper case hex digits.
    pub caps_lock: bool,

    /// Render each byte as a three digit decimal instead of hex.
    pub decimal: bool,

    /// Reverse byte order before rendering.
    pub reverse: bool,

    /// Render the whole UID as one zero-padded decimal integer.
    pub get_as_decimal: bool,
}

impl FormatOptions {
    pub fn with_end_char(mut self, end_char: CharFlag) -> Self {
        self.end_char = end_char;
        self
    }

    pub fn with_in_char(mut self, in_char: CharFlag) -> Self {
        self.in_char = in_char;
        self
    }

    pub fn with_caps_lock(mut self, caps_lock: bool) -> Self {
        self.caps_lock = caps_lock;
        self
    }

    pub fn with_decimal(mut self, decimal: bool) -> Self {
        self.decimal = decimal;
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_get_as_decimal(mut self, get_as_decimal: bool) -> Self {
        self.get_as_decimal = get_as_decimal;
        self
    }
}
