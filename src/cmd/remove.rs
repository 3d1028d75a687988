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
use crate::store::RecordStore;

/// Delete a set from the store, with its records and session history. The
/// set file is left alone, so a later import brings the set back fresh.
pub async fn remove_set(directory: Option<String>, query: String) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let set = coll.find_set(&query).await?;
    coll.store.delete_set(&set.id).await?;
    println!("Removed {}.", set.name);
    Ok(())
}
