//! Public, scannable references to entities.
//!
//! A reference is the URL encoded in an entity's QR code. It depends only on
//! the configured base URL, the entity kind and the entity id, never on the
//! structured document code, so it stays valid when an entity is recodified.

use url::Url;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Error returned for a base URL that cannot prefix references.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReferenceError {
    /// The base URL does not parse.
    #[error("invalid public base URL '{url}': {source}")]
    Parse {
        /// The configured value.
        url: String,
        /// The parser error.
        source: url::ParseError,
    },

    /// The URL parses but cannot have path segments appended (e.g. `mailto:`).
    #[error("public base URL '{0}' cannot be used as a base")]
    NotABase(String),
}

/// Builds public references under a fixed base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicReference {
    base: Url,
}

impl PublicReference {
    /// Creates a builder for the given base URL, falling back to
    /// [`DEFAULT_BASE_URL`] when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError`] if the configured URL is unusable.
    pub fn new(base_url: Option<&str>) -> Result<Self, ReferenceError> {
        let raw = base_url
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);

        let base = Url::parse(raw).map_err(|source| ReferenceError::Parse {
            url: raw.to_string(),
            source,
        })?;
        if base.cannot_be_a_base() {
            return Err(ReferenceError::NotABase(raw.to_string()));
        }

        Ok(Self { base })
    }

    /// The base URL references are built under.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Returns the public URL of an entity.
    ///
    /// The entity kind is lower-cased; both kind and id are percent-encoded as
    /// single path segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use doccode::PublicReference;
    ///
    /// let references = PublicReference::new(Some("https://docs.example.tn/")).unwrap();
    /// assert_eq!(
    ///     references.reference("Document", "abc-123").as_str(),
    ///     "https://docs.example.tn/document/abc-123"
    /// );
    /// ```
    #[must_use]
    pub fn reference(&self, entity_kind: &str, entity_id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&entity_kind.trim().to_lowercase())
                .push(entity_id.trim());
        }
        url
    }
}
