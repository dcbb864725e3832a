//! Mobile number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MobileNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileError {
    /// The input string is empty.
    #[error("mobile number cannot be empty")]
    Empty,
    /// The input contains something other than digits and separators.
    #[error("mobile number may only contain digits, spaces, dashes and a leading +")]
    InvalidCharacter,
    /// The subscriber number does not have ten digits.
    #[error("mobile number must have 10 digits, got {len}")]
    WrongLength {
        /// Digits found after stripping the country code.
        len: usize,
    },
    /// Indian mobile numbers start with 6, 7, 8 or 9.
    #[error("mobile number must start with 6, 7, 8 or 9")]
    InvalidPrefix,
}

/// A ten-digit Indian mobile number.
///
/// Parsing accepts common input forms (`+91 98765 43210`, `098765-43210`)
/// and stores the bare ten digits.
///
/// ## Examples
///
/// ```
/// use lorry_desk_core::MobileNumber;
///
/// assert_eq!(MobileNumber::parse("+91 98765 43210").unwrap().as_str(), "9876543210");
/// assert!(MobileNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct MobileNumber(String);

impl MobileNumber {
    /// Number of digits in a subscriber number.
    pub const DIGITS: usize = 10;

    /// Parse a `MobileNumber` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Contains characters other than digits, spaces, dashes or a leading `+`
    /// - Does not reduce to ten digits after removing a `91`/`0` prefix
    /// - Does not start with 6-9
    pub fn parse(s: &str) -> Result<Self, MobileError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MobileError::Empty);
        }

        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if !body
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        {
            return Err(MobileError::InvalidCharacter);
        }

        let digits: String = body.chars().filter(char::is_ascii_digit).collect();
        let subscriber = match digits.len() {
            12 => digits.strip_prefix("91").unwrap_or(digits.as_str()),
            11 => digits.strip_prefix('0').unwrap_or(digits.as_str()),
            _ => digits.as_str(),
        };

        if subscriber.len() != Self::DIGITS {
            return Err(MobileError::WrongLength {
                len: subscriber.len(),
            });
        }

        if !subscriber.starts_with(['6', '7', '8', '9']) {
            return Err(MobileError::InvalidPrefix);
        }

        Ok(Self(subscriber.to_owned()))
    }

    /// Returns the ten digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `MobileNumber` and returns its digits.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Number in international format, e.g. `+919876543210`.
    #[must_use]
    pub fn international(&self) -> String {
        format!("+91{}", self.0)
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for MobileNumber {
    type Err = MobileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MobileNumber {
    type Error = MobileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MobileNumber> for String {
    fn from(value: MobileNumber) -> Self {
        value.0
    }
}

impl AsRef<str> for MobileNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
