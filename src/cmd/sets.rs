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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::stats::set_overview;
use crate::store::RecordStore;

pub async fn list_sets(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let lines = set_listing(&coll.store).await;
    if lines.is_empty() {
        println!("No sets. Run `flashprep import` first.");
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// One line per set: id, name, and how many of its cards have been reviewed.
async fn set_listing(store: &dyn RecordStore) -> Vec<String> {
    let mut lines = Vec::new();
    for set in store.list_sets().await {
        let records = store.records_for_set(&set.id).await;
        let overview = set_overview(&set, &records);
        lines.push(format!(
            "{}\t{}\t{} / {} reviewed",
            set.id, set.name, overview.reviewed, overview.total
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::sample_record;
    use crate::helper::sample_set;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn test_listing() -> Fallible<()> {
        let a = sample_set("Alpha", 3)?;
        let b = sample_set("Beta", 2)?;
        let store = MemoryStore::with_sets(vec![b.clone(), a.clone()]);
        store.put_record(&sample_record(&a.id, 2, 1.0)?).await?;
        let lines = set_listing(&store).await;
        assert_eq!(
            lines,
            vec![
                format!("{}\tAlpha\t1 / 3 reviewed", a.id),
                format!("{}\tBeta\t0 / 2 reviewed", b.id),
            ]
        );
        Ok(())
    }
}
