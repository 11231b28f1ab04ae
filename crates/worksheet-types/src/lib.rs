//! Validated primitive types shared by the worksheet crates.
//!
//! - [`NonEmptyText`]: trimmed text guaranteed to contain at least one non-whitespace character.
//! - [`HexColour`]: a CSS-style hex colour (`#rgb` or `#rrggbb`), stored lowercase.

use std::fmt;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
}

/// Errors that can occur when parsing a [`HexColour`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColourError {
    #[error("colour must start with '#', got '{0}'")]
    MissingHash(String),

    #[error("colour must have 3 or 6 hex digits, got '{0}'")]
    InvalidLength(String),

    #[error("colour contains non-hex characters: '{0}'")]
    InvalidDigit(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so labels
/// such as `"  Mood  "` are stored as `"Mood"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A hex colour such as `#64748b`.
///
/// Parsing accepts upper or lower case digits and stores the canonical lowercase form, so two
/// colours compare equal regardless of how they were authored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HexColour(String);

impl HexColour {
    /// Parses a `#rgb` or `#rrggbb` colour.
    ///
    /// # Errors
    ///
    /// Returns a [`ColourError`] describing the first problem found.
    pub fn parse(raw: &str) -> Result<Self, ColourError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColourError::MissingHash(raw.to_string()))?;

        if digits.len() != 3 && digits.len() != 6 {
            return Err(ColourError::InvalidLength(raw.to_string()));
        }

        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColourError::InvalidDigit(raw.to_string()));
        }

        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for HexColour {
    type Err = ColourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for HexColour {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for HexColour {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        HexColour::parse(&s).map_err(serde::de::Error::custom)
    }
}
