use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use fs2::FileExt;

use crate::storage::{Backend, Record, StoreError};

/// A backend persisting the record as a TOML file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// store file, so a crash mid-write never leaves a truncated record behind.
/// The file is created on the first write; parent directories must exist.
///
/// Mutations are serialised across handles and processes by an exclusive OS
/// lock on a sibling `.lock` file. Readers need no lock: the rename makes
/// every write appear at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TomlFile {
    path: PathBuf,
}

impl TomlFile {
    /// Creates a backend for the file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The path of the store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temporary_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

/// An exclusive lock on a store file, held until dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn unavailable(action: &str, path: &Path, error: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("failed to {action} {}: {error}", path.display()))
}

impl Backend for TomlFile {
    type Guard = FileLock;

    fn lock(&self) -> Result<Self::Guard, StoreError> {
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| unavailable("open", &path, e))?;

        FileExt::lock_exclusive(&file).map_err(|e| unavailable("lock", &path, e))?;
        tracing::trace!("Locked {}", path.display());

        Ok(FileLock { file })
    }

    fn load(&self) -> Result<Record, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(
                    "No store file at {}, starting from an empty record",
                    self.path.display()
                );
                return Ok(Record::default());
            }
            Err(e) => return Err(unavailable("read", &self.path, e)),
        };

        toml::from_str(&content).map_err(|e| unavailable("parse", &self.path, e))
    }

    fn persist(&self, record: &Record) -> Result<(), StoreError> {
        let content =
            toml::to_string_pretty(record).map_err(|e| unavailable("serialize", &self.path, e))?;

        let temporary = self.temporary_path();
        fs::write(&temporary, content).map_err(|e| unavailable("write", &temporary, e))?;
        fs::rename(&temporary, &self.path).map_err(|e| unavailable("replace", &self.path, e))?;

        tracing::trace!("Persisted store record to {}", self.path.display());
        Ok(())
    }
}
