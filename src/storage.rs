//! Persistence of the codification record.
//!
//! The record holds the taxonomy and the sequence counters. A [`Registry`]
//! owns one record behind a lock and writes it through a [`Backend`] on every
//! mutation.

use std::num::NonZeroU64;

use crate::domain::{Category, Component, SequenceKey};

mod file;
mod memory;
mod record;
mod registry;

pub use file::{FileLock, TomlFile};
pub use memory::Memory;
pub use record::Record;
pub use registry::Registry;

/// A registry kept only in memory.
pub type MemoryStore = Registry<Memory>;

/// A registry persisted to a TOML file.
pub type FileStore = Registry<TomlFile>;

/// Errors raised by the codification store.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    /// The backing persistence cannot be read or written.
    #[error("codification store unavailable: {0}")]
    Unavailable(String),

    /// A counter has reached the largest representable value.
    #[error("sequence counter '{0}' is exhausted")]
    CounterOverflow(String),
}

/// Issues sequence numbers.
pub trait SequenceStore {
    /// Advances the counter for `key` by one and returns the new value.
    ///
    /// An absent key counts as zero, so the first value issued is 1.
    /// Concurrent callers for the same key always receive distinct values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the advanced counter cannot be persisted; in
    /// that case the counter is left unchanged.
    fn next_sequence(&self, key: &SequenceKey) -> Result<NonZeroU64, StoreError>;

    /// Returns the last value issued for `key`, or 0 if none has been.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn current_sequence(&self, key: &SequenceKey) -> Result<u64, StoreError>;
}

/// Read access to the taxonomy vocabularies.
pub trait TaxonomyStore {
    /// Returns the components of a category, in order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn list_components(&self, category: Category) -> Result<Vec<Component>, StoreError>;
}

/// Where a [`Registry`] loads its record from and writes it to.
///
/// Other handles (in this process or another) may share the persisted state.
/// A registry therefore holds [`Backend::lock`] for the whole of every
/// mutation and calls [`Backend::refresh`] under it before changing anything.
pub trait Backend {
    /// Exclusive access to the persisted record, released on drop.
    type Guard;

    /// Blocks until no other handle is mutating the persisted record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock cannot be taken.
    fn lock(&self) -> Result<Self::Guard, StoreError>;

    /// Loads the persisted record, or an empty one if nothing is persisted
    /// yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if existing state cannot be read.
    fn load(&self) -> Result<Record, StoreError>;

    /// Replaces `record` with the latest persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if existing state cannot be read;
    /// `record` is left as it was.
    fn refresh(&self, record: &mut Record) -> Result<(), StoreError> {
        *record = self.load()?;
        Ok(())
    }

    /// Durably replaces the persisted record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the record cannot be written.
    fn persist(&self, record: &Record) -> Result<(), StoreError>;
}
