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
use crate::parser::parse_collection;
use crate::store::RecordStore;

/// Load the collection's set files into its store. With `replace`, sets
/// whose files are gone are deleted along with their history.
pub async fn import_sets(directory: Option<String>, replace: bool) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let sets = parse_collection(&coll.directory)?;
    if replace {
        coll.store.replace_sets(&sets).await?;
    } else {
        for set in &sets {
            coll.store.put_set(set).await?;
        }
    }
    for set in &sets {
        println!("{}\t{} ({} cards)", set.id, set.name, set.len());
    }
    println!("Imported {} sets.", sets.len());
    Ok(())
}
