//! Document code and sequence generation
//!
//! Documents, correspondence and meeting minutes receive a structured code such
//! as `TAVTUN-NBE-QMS-PV-001-FR`. The numeric part is drawn from a counter per
//! combination of company, scope, department, sub-department, type and
//! language, and is never issued twice.

pub mod domain;
pub use domain::{
    Category, CodificationError, CodificationRequest, Component, Direction, DocumentCode,
    EntityKind, GeneratedCode, PublicReference, RequestedKind, Settings, Taxonomy,
};

/// Issuing codes against a store.
pub mod generator;
pub use generator::{CodeGenerator, Error, Recodification};

/// Persistence of the taxonomy and sequence counters.
pub mod storage;
pub use storage::{FileStore, MemoryStore, SequenceStore, StoreError, TaxonomyStore};
