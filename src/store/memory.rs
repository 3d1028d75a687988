// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::store::RecordStore;
use crate::store::degrade;
use crate::types::performance::PerformanceRecord;
use crate::types::performance::RecordKey;
use crate::types::session_summary::SessionSummary;
use crate::types::set::Set;
use crate::types::set::SetId;

/// A store that lives only as long as the process. Used for free study,
/// where nothing should be persisted, and in tests.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    online: AtomicBool,
}

#[derive(Default)]
struct Inner {
    sets: BTreeMap<SetId, Set>,
    records: HashMap<RecordKey, PerformanceRecord>,
    sessions: Vec<SessionSummary>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            online: AtomicBool::new(true),
        }
    }

    pub fn with_sets(sets: Vec<Set>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            for set in sets {
                inner.sets.insert(set.id.clone(), set);
            }
        }
        store
    }

    /// Simulate the backend going away (or coming back). While offline,
    /// reads come back empty and writes fail.
    #[cfg(test)]
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Inner>> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(ErrorReport::with_kind(
                ErrorKind::StorageUnavailable,
                "memory store is offline.",
            ));
        }
        self.inner.lock().map_err(|_| {
            ErrorReport::with_kind(ErrorKind::StorageUnavailable, "memory store is poisoned.")
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_set(&self, set_id: &SetId) -> Option<Set> {
        let result = self
            .acquire()
            .map(|inner| inner.sets.get(set_id).cloned());
        degrade("set", result)
    }

    async fn list_sets(&self) -> Vec<Set> {
        let result = self.acquire().map(|inner| {
            let mut sets: Vec<Set> = inner.sets.values().cloned().collect();
            sets.sort_by(|a, b| a.name.cmp(&b.name));
            sets
        });
        degrade("sets", result)
    }

    async fn put_set(&self, set: &Set) -> Fallible<()> {
        let mut inner = self.acquire()?;
        inner.sets.insert(set.id.clone(), set.clone());
        Ok(())
    }

    async fn replace_sets(&self, sets: &[Set]) -> Fallible<()> {
        let mut inner = self.acquire()?;
        let keep: HashSet<&SetId> = sets.iter().map(|s| &s.id).collect();
        inner.records.retain(|key, _| keep.contains(&key.set_id));
        inner.sessions.retain(|s| keep.contains(&s.set_id));
        inner.sets.clear();
        for set in sets {
            inner.sets.insert(set.id.clone(), set.clone());
        }
        Ok(())
    }

    async fn delete_set(&self, set_id: &SetId) -> Fallible<()> {
        let mut inner = self.acquire()?;
        inner.sets.remove(set_id);
        inner.records.retain(|key, _| &key.set_id != set_id);
        inner.sessions.retain(|s| &s.set_id != set_id);
        Ok(())
    }

    async fn records_for_set(&self, set_id: &SetId) -> Vec<PerformanceRecord> {
        let result = self.acquire().map(|inner| {
            let mut records: Vec<PerformanceRecord> = inner
                .records
                .values()
                .filter(|r| &r.set_id == set_id)
                .cloned()
                .collect();
            records.sort_by_key(|r| r.card_index);
            records
        });
        degrade("performance records", result)
    }

    async fn put_record(&self, record: &PerformanceRecord) -> Fallible<()> {
        let mut inner = self.acquire()?;
        inner.records.insert(record.key(), record.clone());
        Ok(())
    }

    async fn delete_record(&self, key: &RecordKey) -> Fallible<()> {
        let mut inner = self.acquire()?;
        inner.records.remove(key);
        Ok(())
    }

    async fn sessions_for_set(&self, set_id: &SetId) -> Vec<SessionSummary> {
        let result = self.acquire().map(|inner| {
            inner
                .sessions
                .iter()
                .filter(|s| &s.set_id == set_id)
                .cloned()
                .collect()
        });
        degrade("sessions", result)
    }

    async fn append_session(&self, summary: &SessionSummary) -> Fallible<()> {
        let mut inner = self.acquire()?;
        inner.sessions.push(summary.clone());
        Ok(())
    }

    async fn reset_stats(&self, set_id: &SetId) -> Fallible<()> {
        let mut inner = self.acquire()?;
        inner.records.retain(|key, _| &key.set_id != set_id);
        inner.sessions.retain(|s| &s.set_id != set_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::sample_set;
    use crate::helper::sample_record;

    #[tokio::test]
    async fn test_set_roundtrip() -> Fallible<()> {
        let store = MemoryStore::new();
        let set = sample_set("Capitals", 3)?;
        store.put_set(&set).await?;
        assert_eq!(store.get_set(&set.id).await, Some(set.clone()));
        assert_eq!(store.list_sets().await, vec![set]);
        Ok(())
    }

    #[tokio::test]
    async fn test_records_are_ordered_by_index() -> Fallible<()> {
        let set = sample_set("Capitals", 3)?;
        let store = MemoryStore::with_sets(vec![set.clone()]);
        store.put_record(&sample_record(&set.id, 2, 4.0)?).await?;
        store.put_record(&sample_record(&set.id, 0, 1.0)?).await?;
        let indices: Vec<usize> = store
            .records_for_set(&set.id)
            .await
            .iter()
            .map(|r| r.card_index)
            .collect();
        assert_eq!(indices, vec![0, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn test_offline_reads_degrade_and_writes_fail() -> Fallible<()> {
        let set = sample_set("Capitals", 3)?;
        let store = MemoryStore::with_sets(vec![set.clone()]);
        store.put_record(&sample_record(&set.id, 0, 1.0)?).await?;
        store.set_online(false);
        assert_eq!(store.get_set(&set.id).await, None);
        assert!(store.records_for_set(&set.id).await.is_empty());
        let err = store
            .put_record(&sample_record(&set.id, 1, 1.0)?)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        store.set_online(true);
        assert_eq!(store.records_for_set(&set.id).await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_sets_cascades_removed_sets() -> Fallible<()> {
        let a = sample_set("A", 2)?;
        let b = sample_set("B", 2)?;
        let store = MemoryStore::with_sets(vec![a.clone(), b.clone()]);
        store.put_record(&sample_record(&a.id, 0, 3.0)?).await?;
        store.put_record(&sample_record(&b.id, 0, 3.0)?).await?;
        store.replace_sets(std::slice::from_ref(&a)).await?;
        assert_eq!(store.list_sets().await, vec![a.clone()]);
        assert_eq!(store.records_for_set(&a.id).await.len(), 1);
        assert!(store.records_for_set(&b.id).await.is_empty());
        Ok(())
    }
}
