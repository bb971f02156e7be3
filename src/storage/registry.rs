//! The process-wide codification store.
//!
//! A [`Registry`] caches the single [`Record`] behind a mutex. Every issuance
//! takes the mutex and the [`Backend`] lock, reloads the record, advances one
//! counter, writes the record back and only then releases both locks. Load,
//! increment and store are therefore indivisible for every caller, including
//! other registries over the same file in this or another process. One lock
//! covers all keys.

use std::{
    num::NonZeroU64,
    sync::{Mutex, MutexGuard},
};

use tracing::instrument;

use crate::{
    domain::{Category, Component, SequenceKey, Taxonomy, TaxonomyError},
    storage::{
        Backend, FileStore, Memory, MemoryStore, Record, SequenceStore, StoreError,
        TaxonomyStore, TomlFile,
    },
};

/// The codification store: taxonomy and sequence counters in one record.
///
/// Create one at startup and pass it by reference to the generator.
#[derive(Debug)]
pub struct Registry<B> {
    backend: B,
    record: Mutex<Record>,
}

impl<B: Backend> Registry<B> {
    /// Opens a registry, loading its record from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if existing state cannot be read.
    pub fn open(backend: B) -> Result<Self, StoreError> {
        let record = backend.load()?;
        Ok(Self {
            backend,
            record: Mutex::new(record),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Record>, StoreError> {
        self.record
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }

    /// The record as last persisted by any handle.
    fn read(&self) -> Result<MutexGuard<'_, Record>, StoreError> {
        let mut record = self.lock()?;
        self.backend.refresh(&mut record)?;
        Ok(record)
    }

    /// The latest record, locked against every other writer until both guards
    /// are dropped.
    fn write(&self) -> Result<(MutexGuard<'_, Record>, B::Guard), StoreError> {
        let mut record = self.lock()?;
        let guard = self.backend.lock()?;
        self.backend.refresh(&mut record)?;
        Ok((record, guard))
    }

    /// Returns a copy of the taxonomy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn taxonomy(&self) -> Result<Taxonomy, StoreError> {
        Ok(self.read()?.taxonomy.clone())
    }

    /// Returns a snapshot of every counter, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    pub fn counters(&self) -> Result<Vec<(String, u64)>, StoreError> {
        Ok(self
            .read()?
            .counters()
            .map(|(key, value)| (key.to_owned(), value))
            .collect())
    }

    /// Applies an administrative edit to the taxonomy and persists it.
    ///
    /// The edit is rolled back if it cannot be persisted.
    fn edit_taxonomy<T>(
        &self,
        edit: impl FnOnce(&mut Taxonomy) -> Result<T, TaxonomyError>,
    ) -> Result<T, TaxonomyError> {
        let (mut record, _guard) = self.write()?;
        let before = record.taxonomy.clone();
        let output = edit(&mut record.taxonomy)?;

        if let Err(e) = self.backend.persist(&record) {
            record.taxonomy = before;
            tracing::warn!("Taxonomy edit not persisted: {e}");
            return Err(e.into());
        }
        Ok(output)
    }

    /// Adds a component to a category.
    ///
    /// # Errors
    ///
    /// Fails if the code already exists in the category or the edit cannot be
    /// persisted.
    #[instrument(skip(self))]
    pub fn add_component(
        &self,
        category: Category,
        component: Component,
    ) -> Result<(), TaxonomyError> {
        let code = component.code.clone();
        self.edit_taxonomy(|taxonomy| taxonomy.add(category, component))?;
        tracing::info!("Added {code} to {category}");
        Ok(())
    }

    /// Removes a component from a category.
    ///
    /// Previously issued codes are plain strings and are not affected.
    ///
    /// # Errors
    ///
    /// Fails if the component does not exist or the edit cannot be persisted.
    #[instrument(skip(self))]
    pub fn remove_component(
        &self,
        category: Category,
        code: &str,
    ) -> Result<Component, TaxonomyError> {
        let removed = self.edit_taxonomy(|taxonomy| taxonomy.remove(category, code))?;
        tracing::info!("Removed {} from {category}", removed.code);
        Ok(removed)
    }

    /// Replaces the label and description of a component.
    ///
    /// # Errors
    ///
    /// Fails if the component does not exist or the edit cannot be persisted.
    #[instrument(skip(self))]
    pub fn relabel_component(
        &self,
        category: Category,
        code: &str,
        label: String,
        description: Option<String>,
    ) -> Result<(), TaxonomyError> {
        self.edit_taxonomy(|taxonomy| taxonomy.relabel(category, code, label, description))
    }
}

impl MemoryStore {
    /// Creates an empty in-memory registry.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_record(Memory, Record::default())
    }

    /// Creates an in-memory registry seeded with a taxonomy.
    #[must_use]
    pub fn with_taxonomy(taxonomy: Taxonomy) -> Self {
        Self::with_record(Memory, Record::with_taxonomy(taxonomy))
    }
}

impl FileStore {
    /// Opens the registry stored in the TOML file at `path`.
    ///
    /// A missing file is an empty registry; it is created on the first
    /// issuance or taxonomy edit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if an existing file cannot be read
    /// or parsed.
    pub fn open_file(path: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        Self::open(TomlFile::new(path.into()))
    }
}

impl<B> Registry<B> {
    /// Creates a registry around an already loaded record.
    pub const fn with_record(backend: B, record: Record) -> Self {
        Self {
            backend,
            record: Mutex::new(record),
        }
    }
}

impl<B: Backend> SequenceStore for Registry<B> {
    fn next_sequence(&self, key: &SequenceKey) -> Result<NonZeroU64, StoreError> {
        let (mut record, _guard) = self.write()?;
        let previous = record.current(key);
        let next = record.advance(key)?;

        if let Err(e) = self.backend.persist(&record) {
            record.restore(key, previous);
            tracing::warn!("Counter {key} not advanced: {e}");
            return Err(e);
        }

        tracing::debug!("Counter {key} advanced to {next}");
        Ok(next)
    }

    fn current_sequence(&self, key: &SequenceKey) -> Result<u64, StoreError> {
        Ok(self.read()?.current(key))
    }
}

impl<B: Backend> TaxonomyStore for Registry<B> {
    fn list_components(&self, category: Category) -> Result<Vec<Component>, StoreError> {
        Ok(self.read()?.taxonomy.components(category).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeSet,
        sync::atomic::{AtomicBool, Ordering},
    };

    use rayon::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::domain::{Codification, CodificationRequest, RequestedKind, SegmentCode};

    fn key(department: &str) -> SequenceKey {
        let request = CodificationRequest::new(
            "TAVTUN",
            "NBE",
            department,
            RequestedKind::ProcesVerbal,
            "FR",
        );
        Codification::from_request(&request)
            .unwrap()
            .sequence_key()
    }

    /// A backend whose writes can be switched off.
    #[derive(Debug, Default)]
    struct Flaky {
        failing: AtomicBool,
    }

    impl Backend for Flaky {
        type Guard = ();

        fn lock(&self) -> Result<Self::Guard, StoreError> {
            Ok(())
        }

        fn refresh(&self, _record: &mut Record) -> Result<(), StoreError> {
            Ok(())
        }

        fn load(&self) -> Result<Record, StoreError> {
            Ok(Record::default())
        }

        fn persist(&self, _record: &Record) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable("disk on fire".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn sequences_increase_per_key() {
        let store = MemoryStore::in_memory();
        assert_eq!(store.next_sequence(&key("QMS")).unwrap().get(), 1);
        assert_eq!(store.next_sequence(&key("QMS")).unwrap().get(), 2);
        assert_eq!(store.next_sequence(&key("OPS")).unwrap().get(), 1);
        assert_eq!(store.current_sequence(&key("QMS")).unwrap(), 2);
        assert_eq!(store.current_sequence(&key("HR")).unwrap(), 0);
    }

    #[test]
    fn concurrent_callers_never_share_a_number() {
        let store = MemoryStore::in_memory();
        let key = key("QMS");

        let issued: Vec<u64> = (0..500)
            .into_par_iter()
            .map(|_| store.next_sequence(&key).unwrap().get())
            .collect();

        let distinct: BTreeSet<u64> = issued.iter().copied().collect();
        assert_eq!(distinct.len(), 500);
        assert_eq!(distinct, (1..=500).collect::<BTreeSet<u64>>());
    }

    #[test]
    fn failed_write_does_not_advance() {
        let store = Registry::open(Flaky::default()).unwrap();
        store.next_sequence(&key("QMS")).unwrap();

        store.backend.failing.store(true, Ordering::SeqCst);
        assert!(matches!(
            store.next_sequence(&key("QMS")),
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.next_sequence(&key("OPS")).is_err());

        store.backend.failing.store(false, Ordering::SeqCst);
        assert_eq!(store.next_sequence(&key("QMS")).unwrap().get(), 2);
        assert_eq!(store.next_sequence(&key("OPS")).unwrap().get(), 1);
    }

    #[test]
    fn failed_taxonomy_edit_is_rolled_back() {
        let store = Registry::open(Flaky::default()).unwrap();
        store.backend.failing.store(true, Ordering::SeqCst);

        let component = Component::new(SegmentCode::new("QMS").unwrap(), "Quality");
        assert!(matches!(
            store.add_component(Category::Departments, component),
            Err(TaxonomyError::Store(_))
        ));
        assert!(
            store
                .list_components(Category::Departments)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn file_store_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.toml");

        {
            let store = FileStore::open_file(&path).unwrap();
            store
                .add_component(
                    Category::Departments,
                    Component::new(SegmentCode::new("QMS").unwrap(), "Quality"),
                )
                .unwrap();
            store.next_sequence(&key("QMS")).unwrap();
            store.next_sequence(&key("QMS")).unwrap();
        }

        let reopened = FileStore::open_file(&path).unwrap();
        assert_eq!(reopened.current_sequence(&key("QMS")).unwrap(), 2);
        assert_eq!(reopened.next_sequence(&key("QMS")).unwrap().get(), 3);
        assert_eq!(
            reopened.list_components(Category::Departments).unwrap()[0]
                .code
                .as_str(),
            "QMS"
        );
    }

    #[test]
    fn handles_on_one_file_share_counters() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.toml");

        let first = FileStore::open_file(&path).unwrap();
        let second = FileStore::open_file(&path).unwrap();

        assert_eq!(first.next_sequence(&key("QMS")).unwrap().get(), 1);
        assert_eq!(second.next_sequence(&key("QMS")).unwrap().get(), 2);
        assert_eq!(first.next_sequence(&key("QMS")).unwrap().get(), 3);
        assert_eq!(
            FileStore::open_file(&path)
                .unwrap()
                .current_sequence(&key("QMS"))
                .unwrap(),
            3
        );
    }

    #[test]
    fn concurrent_handles_on_one_file_never_share_a_number() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.toml");
        let key = key("QMS");

        let issued: Vec<u64> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        let store = FileStore::open_file(&path).unwrap();
                        (0..25)
                            .map(|_| store.next_sequence(&key).unwrap().get())
                            .collect::<Vec<u64>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| worker.join().unwrap())
                .collect()
        });

        let distinct: BTreeSet<u64> = issued.into_iter().collect();
        assert_eq!(distinct, (1..=100).collect::<BTreeSet<u64>>());
        assert_eq!(
            FileStore::open_file(&path)
                .unwrap()
                .current_sequence(&key)
                .unwrap(),
            100
        );
    }

    #[test]
    fn taxonomy_edits_from_another_handle_are_visible() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.toml");

        let reader = FileStore::open_file(&path).unwrap();
        let admin = FileStore::open_file(&path).unwrap();
        admin
            .add_component(
                Category::Departments,
                Component::new(SegmentCode::new("QMS").unwrap(), "Quality"),
            )
            .unwrap();

        assert_eq!(reader.list_components(Category::Departments).unwrap().len(), 1);
    }

    #[test]
    fn file_store_is_created_lazily() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.toml");

        let store = FileStore::open_file(&path).unwrap();
        assert!(!path.exists());
        assert!(store.counters().unwrap().is_empty());

        store.next_sequence(&key("QMS")).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn counters_snapshot_is_ordered() {
        let store = MemoryStore::in_memory();
        store.next_sequence(&key("QMS")).unwrap();
        store.next_sequence(&key("HR")).unwrap();
        store.next_sequence(&key("QMS")).unwrap();

        assert_eq!(
            store.counters().unwrap(),
            vec![
                ("TAVTUN-NBE-HR-NA-PV-FR".to_string(), 1),
                ("TAVTUN-NBE-QMS-NA-PV-FR".to_string(), 2),
            ]
        );
    }
}
