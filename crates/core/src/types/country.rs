//! Destination country type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CountryCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum CountryCodeError {
    /// The input string is empty.
    #[error("country code cannot be empty")]
    Empty,
    /// The input is not two characters long.
    #[error("country code must be exactly 2 characters")]
    WrongLength,
    /// The input contains non-alphabetic characters.
    #[error("country code must contain only ASCII letters")]
    InvalidCharacter,
}

/// An ISO 3166-1 alpha-2 country code.
///
/// Shipping destinations are identified by two-letter country codes. The
/// code is normalized to uppercase on parse; no allowlist of serviceable
/// countries is kept client-side - the backend decides serviceability per
/// quote request.
///
/// ## Examples
///
/// ```
/// use opaline_core::CountryCode;
///
/// let us: CountryCode = "us".parse().unwrap();
/// assert_eq!(us.as_str(), "US");
///
/// assert!("".parse::<CountryCode>().is_err());    // empty
/// assert!("USA".parse::<CountryCode>().is_err()); // alpha-3
/// assert!("U1".parse::<CountryCode>().is_err());  // digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parse a `CountryCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not two characters, or
    /// contains non-alphabetic characters.
    pub fn parse(s: &str) -> Result<Self, CountryCodeError> {
        if s.is_empty() {
            return Err(CountryCodeError::Empty);
        }

        if s.chars().count() != 2 {
            return Err(CountryCodeError::WrongLength);
        }

        if !s.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CountryCodeError::InvalidCharacter);
        }

        Ok(Self(s.to_ascii_uppercase()))
    }

    /// Returns the country code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for CountryCode {
    type Err = CountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}
