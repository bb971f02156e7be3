use std::{collections::BTreeMap, num::NonZeroU64};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{SequenceKey, Taxonomy},
    storage::StoreError,
};

/// The single codification record: taxonomy plus sequence counters.
///
/// Counters map a [`SequenceKey`] to the last value issued for it. Absent keys
/// are implicitly zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Record {
    /// The taxonomy vocabularies.
    pub taxonomy: Taxonomy,
    counters: BTreeMap<String, u64>,
}

impl Record {
    /// Creates an empty record with the given taxonomy.
    #[must_use]
    pub const fn with_taxonomy(taxonomy: Taxonomy) -> Self {
        Self {
            taxonomy,
            counters: BTreeMap::new(),
        }
    }

    /// The last value issued for `key`, or 0.
    #[must_use]
    pub fn current(&self, key: &SequenceKey) -> u64 {
        self.counters.get(key.as_str()).copied().unwrap_or_default()
    }

    /// Advances the counter for `key` by exactly one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CounterOverflow`] if the counter is at
    /// `u64::MAX`; the counter is not modified.
    pub fn advance(&mut self, key: &SequenceKey) -> Result<NonZeroU64, StoreError> {
        let next = self
            .current(key)
            .checked_add(1)
            .and_then(NonZeroU64::new)
            .ok_or_else(|| StoreError::CounterOverflow(key.to_string()))?;
        self.counters.insert(key.as_str().to_owned(), next.get());
        Ok(next)
    }

    /// Puts a counter back to `value` after a failed write.
    pub(crate) fn restore(&mut self, key: &SequenceKey, value: u64) {
        if value == 0 {
            self.counters.remove(key.as_str());
        } else {
            self.counters.insert(key.as_str().to_owned(), value);
        }
    }

    /// All counters, ordered by key.
    pub fn counters(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters
            .iter()
            .map(|(key, value)| (key.as_str(), *value))
    }
}

/// The serialized versions of the record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        taxonomy: Taxonomy,

        #[serde(default)]
        counters: BTreeMap<String, u64>,
    },
}

impl From<Versions> for Record {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 { taxonomy, counters } => Self { taxonomy, counters },
        }
    }
}

impl From<Record> for Versions {
    fn from(record: Record) -> Self {
        Self::V1 {
            taxonomy: record.taxonomy,
            counters: record.counters,
        }
    }
}
