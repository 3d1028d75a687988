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

use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::store::RecordStore;
use crate::types::performance::PerformanceRecord;
use crate::types::session_summary::SessionSummary;
use crate::types::set::Set;

pub async fn export_collection(directory: Option<String>) -> Fallible<()> {
    let coll: Collection = Collection::new(directory)?;
    let export: Export = get_export(&coll.store).await;
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    sets: Vec<SetExport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetExport {
    #[serde(flatten)]
    set: Set,
    records: Vec<PerformanceRecord>,
    sessions: Vec<SessionSummary>,
}

async fn get_export(store: &dyn RecordStore) -> Export {
    let mut sets = Vec::new();
    for set in store.list_sets().await {
        let records = store.records_for_set(&set.id).await;
        let sessions = store.sessions_for_set(&set.id).await;
        sets.push(SetExport {
            set,
            records,
            sessions,
        });
    }
    Export { sets }
}
