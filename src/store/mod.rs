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

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Fallible;
use crate::types::performance::PerformanceRecord;
use crate::types::performance::RecordKey;
use crate::types::session_summary::SessionSummary;
use crate::types::set::Set;
use crate::types::set::SetId;

/// Persistence for sets, per-card performance records, and session
/// summaries.
///
/// Reads never fail: if the backend is unavailable they log the problem and
/// return an empty result. Writes report failure to the caller. Every write
/// is all-or-nothing.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_set(&self, set_id: &SetId) -> Option<Set>;

    /// All sets, ordered by name.
    async fn list_sets(&self) -> Vec<Set>;

    /// Insert or update a set.
    async fn put_set(&self, set: &Set) -> Fallible<()>;

    /// Replace the whole set collection. Sets missing from `sets` are
    /// deleted along with their records and sessions; the rest are upserted.
    async fn replace_sets(&self, sets: &[Set]) -> Fallible<()>;

    /// Delete a set along with its records and sessions.
    async fn delete_set(&self, set_id: &SetId) -> Fallible<()>;

    /// The performance records of a set, ordered by card index.
    async fn records_for_set(&self, set_id: &SetId) -> Vec<PerformanceRecord>;

    async fn put_record(&self, record: &PerformanceRecord) -> Fallible<()>;

    async fn delete_record(&self, key: &RecordKey) -> Fallible<()>;

    /// The session summaries of a set, in insertion order.
    async fn sessions_for_set(&self, set_id: &SetId) -> Vec<SessionSummary>;

    async fn append_session(&self, summary: &SessionSummary) -> Fallible<()>;

    /// Delete every record and session of a set. The set itself is kept.
    async fn reset_stats(&self, set_id: &SetId) -> Fallible<()>;
}

/// Turn a failed read into an empty result.
pub(crate) fn degrade<T: Default>(what: &str, result: Fallible<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::error!("Failed to read {what}, using an empty result: {e}");
            T::default()
        }
    }
}
