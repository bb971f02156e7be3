use std::{io, ops::RangeInclusive, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::code::DEFAULT_DIGITS;

/// Process configuration for code issuance.
///
/// Loaded once at startup and handed to the generator and the reference
/// builder; nothing reads it from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Settings {
    /// Base URL under which public references are published.
    ///
    /// When unset, [`crate::domain::reference::DEFAULT_BASE_URL`] is used.
    public_base_url: Option<String>,

    /// The minimum number of digits of the sequence segment.
    ///
    /// Sequence numbers are padded to this width with leading zeros. Wider
    /// numbers are printed in full. Always within [`DIGITS_RANGE`].
    digits: usize,
}

/// Accepted widths of the sequence segment. Twenty digits hold `u64::MAX`.
pub const DIGITS_RANGE: RangeInclusive<usize> = 1..=20;

/// Error returned for a sequence width outside [`DIGITS_RANGE`].
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
#[error("sequence width must be between 1 and 20 digits, got {0}")]
pub struct InvalidDigitsError(pub usize);

impl Default for Settings {
    fn default() -> Self {
        Self {
            public_base_url: None,
            digits: default_digits(),
        }
    }
}

/// Errors raised while reading or writing a settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("failed to read settings file: {0}")]
    Read(#[source] io::Error),

    /// The file is not valid settings TOML.
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings could not be serialised.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file could not be written.
    #[error("failed to write settings file: {0}")]
    Write(#[source] io::Error),
}

impl Settings {
    /// Loads the settings from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(SettingsError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the settings to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or the file
    /// cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(SettingsError::Write)
    }

    /// Returns the configured public base URL, if any.
    #[must_use]
    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url.as_deref()
    }

    /// Sets or clears the public base URL.
    pub fn set_public_base_url(&mut self, url: Option<String>) {
        self.public_base_url = url;
    }

    /// Returns the minimum width of the sequence segment.
    #[must_use]
    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Sets the minimum width of the sequence segment.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDigitsError`] if `digits` is outside
    /// [`DIGITS_RANGE`]; the width is left unchanged.
    pub fn set_digits(&mut self, digits: usize) -> Result<(), InvalidDigitsError> {
        self.digits = checked_digits(digits)?;
        Ok(())
    }
}

const fn default_digits() -> usize {
    DEFAULT_DIGITS
}

fn checked_digits(digits: usize) -> Result<usize, InvalidDigitsError> {
    if DIGITS_RANGE.contains(&digits) {
        Ok(digits)
    } else {
        Err(InvalidDigitsError(digits))
    }
}

/// The serialized versions of the settings.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        public_base_url: Option<String>,

        #[serde(default = "default_digits")]
        digits: usize,
    },
}

impl TryFrom<Versions> for Settings {
    type Error = InvalidDigitsError;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                public_base_url,
                digits,
            } => Ok(Self {
                public_base_url,
                digits: checked_digits(digits)?,
            }),
        }
    }
}

impl From<Settings> for Versions {
    fn from(settings: Settings) -> Self {
        Self::V1 {
            public_base_url: settings.public_base_url,
            digits: settings.digits,
        }
    }
}
