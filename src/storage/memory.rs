//! In-memory preflabel store

use super::traits::{PreflabelRecord, PreflabelStore, StorageResult};
use crate::group::ConceptGroup;
use chrono::Utc;
use dashmap::DashMap;

/// Preflabel store held in a sharded concurrent map.
///
/// Each upsert runs under the entry lock of its key, so concurrent batches
/// touching the same key serialize while different keys proceed in parallel.
#[derive(Debug, Default)]
pub struct MemoryPreflabelStore {
    records: DashMap<String, PreflabelRecord>,
}

impl MemoryPreflabelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreflabelStore for MemoryPreflabelStore {
    fn lookup(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.records.get(key).map(|r| r.preflabel.clone()))
    }

    fn upsert(&self, group: &ConceptGroup) -> StorageResult<String> {
        let entry = self
            .records
            .entry(group.key.clone())
            .and_modify(|r| r.total += group.total as u64)
            .or_insert_with(|| PreflabelRecord {
                key: group.key.clone(),
                preflabel: group.preflabel.clone(),
                total: group.total as u64,
                created_at: Utc::now(),
            });
        Ok(entry.preflabel.clone())
    }

    fn record(&self, key: &str) -> StorageResult<Option<PreflabelRecord>> {
        Ok(self.records.get(key).map(|r| r.clone()))
    }

    fn count(&self) -> StorageResult<usize> {
        Ok(self.records.len())
    }

    fn reset(&self) -> StorageResult<()> {
        self.records.clear();
        Ok(())
    }
}
