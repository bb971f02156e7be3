//! Issuing document codes.
//!
//! The [`CodeGenerator`] validates a [`CodificationRequest`], advances exactly
//! one counter in the store and formats the resulting [`DocumentCode`].
//! Validation always completes before the counter is touched, so a rejected
//! request never consumes a number. A number consumed by a request whose
//! entity is later discarded is not given back: numbering may have gaps but
//! never duplicates.

use tracing::instrument;

use crate::{
    domain::{
        code::DEFAULT_DIGITS, taxonomy::ensure_listed, Codification, CodificationError,
        CodificationRequest, DocumentCode, GeneratedCode, Settings,
    },
    storage::{SequenceStore, StoreError, TaxonomyStore},
};

/// Errors returned when issuing a code.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// A required dimension is missing, malformed or not in the taxonomy.
    #[error("invalid codification: {0}")]
    InvalidCodification(#[from] CodificationError),

    /// The store could not issue a sequence number.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

/// Outcome of re-running codification for an existing entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recodification {
    /// The codification fields did not change; the entity keeps its code.
    Unchanged,
    /// The fields changed and a new code was issued. The previous code and
    /// its number are abandoned.
    Reissued(GeneratedCode),
}

/// Issues document codes against a store.
#[derive(Debug)]
pub struct CodeGenerator<'a, S> {
    store: &'a S,
    digits: usize,
}

impl<'a, S> CodeGenerator<'a, S>
where
    S: SequenceStore + TaxonomyStore,
{
    /// Creates a generator using the default sequence width.
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
            digits: DEFAULT_DIGITS,
        }
    }

    /// Creates a generator configured from `settings`.
    pub const fn with_settings(store: &'a S, settings: &Settings) -> Self {
        Self {
            store,
            digits: settings.digits(),
        }
    }

    /// Validates a request against syntax rules and the taxonomy, without
    /// consuming a sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCodification`] if any dimension is missing,
    /// malformed or unknown, and [`Error::StoreUnavailable`] if the taxonomy
    /// cannot be read.
    pub fn resolve(&self, request: &CodificationRequest) -> Result<Codification, Error> {
        let codification = Codification::from_request(request)?;
        self.check_taxonomy(&codification)?;
        Ok(codification)
    }

    fn check_taxonomy(&self, codification: &Codification) -> Result<(), Error> {
        for (field, code) in codification.dimensions() {
            if let Some(category) = field.category(codification.kind()) {
                let components = self.store.list_components(category)?;
                ensure_listed(&components, field, code)?;
            }
        }
        Ok(())
    }

    /// Issues a new code for a request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCodification`] if the request is rejected; no
    /// counter moves in that case. Returns [`Error::StoreUnavailable`] if no
    /// sequence number could be obtained.
    #[instrument(skip(self))]
    pub fn generate_code(&self, request: &CodificationRequest) -> Result<GeneratedCode, Error> {
        let codification = self.resolve(request)?;
        self.issue(&codification)
    }

    /// Re-runs codification for an entity whose fields may have changed.
    ///
    /// If the request has the same dimensions as `previous`, nothing is
    /// issued and the taxonomy is not consulted: components removed since the
    /// code was issued do not invalidate it. Otherwise a new code is generated
    /// exactly as for a new entity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCodification`] if the request is malformed, or
    /// if it changed and no longer passes taxonomy validation. Store failures
    /// are reported as for [`Self::generate_code`].
    #[instrument(skip(self, previous), fields(previous = %previous))]
    pub fn recodify(
        &self,
        previous: &DocumentCode,
        request: &CodificationRequest,
    ) -> Result<Recodification, Error> {
        let codification = Codification::from_request(request)?;

        if previous.matches(&codification) {
            tracing::debug!("Codification unchanged, keeping {previous}");
            return Ok(Recodification::Unchanged);
        }

        self.check_taxonomy(&codification)?;
        self.issue(&codification).map(Recodification::Reissued)
    }

    fn issue(&self, codification: &Codification) -> Result<GeneratedCode, Error> {
        let key = codification.sequence_key();
        let sequence = self.store.next_sequence(&key).inspect_err(|e| {
            tracing::error!("No sequence number issued for {key}: {e}");
        })?;

        let code = DocumentCode::new(codification, sequence)
            .display(self.digits)
            .to_string();
        tracing::info!("Issued {code}");

        Ok(GeneratedCode {
            code,
            sequence_number: sequence,
        })
    }
}
