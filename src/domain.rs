//! Domain models for document codification.
//!
//! This module contains the core domain types: code segments, codification
//! requests, the taxonomy, formatted document codes, public references and
//! settings.

/// Validated code segments.
pub mod segment;
pub use segment::{InvalidSegmentError, SegmentCode};

pub mod codification;
pub use codification::{
    Codification, CodificationError, CodificationRequest, Direction, EntityKind, Field,
    RequestedKind, SequenceKey,
};

/// Document codes and their formatting.
pub mod code;
pub use code::{DocumentCode, GeneratedCode, ParseError};

pub mod taxonomy;
pub use taxonomy::{Category, Component, Taxonomy, TaxonomyError};

pub mod reference;
pub use reference::{PublicReference, ReferenceError};

mod settings;
pub use settings::{DIGITS_RANGE, InvalidDigitsError, Settings, SettingsError};
