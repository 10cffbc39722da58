use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::kit::Kit;
use crate::sequencing::{SequencerPattern, SongArrangement};

/// Something a `Store` can hold, addressed by a string id.
pub trait Record: Clone {
    fn record_id(&self) -> &str;
}

impl Record for Kit {
    fn record_id(&self) -> &str {
        self.name()
    }
}

impl Record for SequencerPattern {
    fn record_id(&self) -> &str {
        self.id()
    }
}

impl Record for SongArrangement {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Key-value persistence for kits, patterns and arrangements.
///
/// The format is the implementor's business; the core only lists, fetches,
/// writes and deletes whole records.
pub trait Store<T: Record> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn list(&self) -> Result<Vec<T>, Self::Error>;

    fn get(&self, id: &str) -> Result<Option<T>, Self::Error>;

    /// Insert or replace by `record_id`.
    fn put(&mut self, record: T) -> Result<(), Self::Error>;

    /// Returns whether a record was removed.
    fn delete(&mut self, id: &str) -> Result<bool, Self::Error>;
}

/// In-process store, ordered by id.
#[derive(Debug, Clone)]
pub struct MemoryStore<T> {
    records: BTreeMap<String, T>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Record> Store<T> for MemoryStore<T> {
    type Error = Infallible;

    fn list(&self) -> Result<Vec<T>, Self::Error> {
        Ok(self.records.values().cloned().collect())
    }

    fn get(&self, id: &str) -> Result<Option<T>, Self::Error> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, record: T) -> Result<(), Self::Error> {
        self.records.insert(record.record_id().to_string(), record);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool, Self::Error> {
        Ok(self.records.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::factory_kit;

    #[test]
    fn put_replaces_by_id() {
        let mut store = MemoryStore::new();
        let first = SequencerPattern::new("p1", "First", 100).unwrap();
        let second = SequencerPattern::new("p1", "Second", 110).unwrap();
        store.put(first).unwrap();
        store.put(second).unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get("p1").unwrap().unwrap();
        assert_eq!(stored.name(), "Second");
    }

    #[test]
    fn delete_reports_presence() {
        let mut store = MemoryStore::new();
        store.put(factory_kit()).unwrap();
        let name = factory_kit().name().to_string();

        assert!(store.delete(&name).unwrap());
        assert!(!store.delete(&name).unwrap());
        assert!(store.list().unwrap().is_empty());
    }
}
