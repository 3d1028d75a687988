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

use std::sync::Arc;

use crate::collection::Collection;
use crate::collection::select_set;
use crate::drill::server::ServerOptions;
use crate::drill::server::start_server;
use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::parser::parse_collection;
use crate::session::filter::Filter;
use crate::store::RecordStore;
use crate::store::memory::MemoryStore;

pub struct DrillArgs {
    pub directory: Option<String>,
    pub set: String,
    pub filter: Filter,
    pub free: bool,
    pub port: Option<u16>,
    pub no_open: bool,
}

/// Serve a session over one set. Command-line flags take precedence over
/// the collection's configuration.
pub async fn drill(args: DrillArgs) -> Fallible<()> {
    let coll = Collection::new(args.directory)?;
    let options = ServerOptions {
        port: args.port.unwrap_or(coll.config.drill.port),
        open_browser: coll.config.drill.open_browser && !args.no_open,
    };
    let (store, set_id) = if args.free {
        // Free study reads the set file directly and records nothing.
        let set = match select_set(parse_collection(&coll.directory)?, &args.set) {
            Some(set) => set,
            None => {
                return fail_with(
                    ErrorKind::NotFound,
                    format!("no set file for {:?}.", args.set),
                );
            }
        };
        let set_id = set.id.clone();
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::with_sets(vec![set]));
        (store, set_id)
    } else {
        let set = coll.find_set(&args.set).await?;
        let store: Arc<dyn RecordStore> = Arc::new(coll.store.clone());
        (store, set.id)
    };
    start_server(store, set_id, args.filter, options).await
}
