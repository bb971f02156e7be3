use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;
use serde::{Deserialize, Serialize};

/// A validated code segment containing only `[A-Z0-9_]`.
///
/// Segments are the building blocks of a document code (company, scope,
/// department, sub-department, type and language). Input is trimmed and
/// normalised to upper case, so `qms` and `QMS` are the same segment. The code
/// delimiter `-` can never appear inside a segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SegmentCode(NonEmptyString);

impl SegmentCode {
    /// Creates a new `SegmentCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSegmentError::Empty`] if the string is blank, or
    /// [`InvalidSegmentError::Malformed`] if it contains characters other than
    /// ASCII letters, digits or `_`.
    pub fn new(s: &str) -> Result<Self, InvalidSegmentError> {
        let normalised = s.trim().to_ascii_uppercase();

        if !normalised
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(InvalidSegmentError::Malformed(s.to_string()));
        }

        NonEmptyString::new(normalised)
            .map(Self)
            .map_err(|_| InvalidSegmentError::Empty)
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for SegmentCode {
    type Error = InvalidSegmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl TryFrom<&str> for SegmentCode {
    type Error = InvalidSegmentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SegmentCode> for String {
    fn from(value: SegmentCode) -> Self {
        value.as_str().to_owned()
    }
}

impl AsRef<str> for SegmentCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for SegmentCode {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for SegmentCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SegmentCode {
    type Err = InvalidSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Error returned when a string is not a valid code segment.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum InvalidSegmentError {
    /// The segment is empty or blank.
    #[error("segment must not be empty")]
    Empty,

    /// The segment contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid segment '{0}': only letters, digits and '_' are allowed")]
    Malformed(String),
}
