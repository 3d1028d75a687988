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

use std::env::current_dir;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail;
use crate::error::fail_with;
use crate::store::RecordStore;
use crate::store::sqlite::SqliteStore;
use crate::types::set::Set;

/// Name of the database file in a collection's root directory.
pub const DATABASE_FILE: &str = "flashprep.db";

/// The canonical path of the given directory, or of the working directory.
pub fn resolve_directory(directory: Option<String>) -> Fallible<PathBuf> {
    let directory: PathBuf = match directory {
        Some(dir) => PathBuf::from(dir),
        None => current_dir()?,
    };
    if directory.exists() {
        Ok(directory.canonicalize()?)
    } else {
        fail_with(ErrorKind::NotFound, "directory does not exist.")
    }
}

/// An opened collection directory: its configuration and its store.
pub struct Collection {
    pub directory: PathBuf,
    pub config: Config,
    pub store: SqliteStore,
}

impl Collection {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory = resolve_directory(directory)?;
        let config = Config::load(&directory)?;

        let db_path: PathBuf = directory.join(DATABASE_FILE);
        let store = match db_path.to_str() {
            Some(db_path) => SqliteStore::new(db_path)?,
            None => return fail("invalid database path."),
        };

        Ok(Self {
            directory,
            config,
            store,
        })
    }

    /// Find an imported set by id, or failing that by exact name.
    pub async fn find_set(&self, query: &str) -> Fallible<Set> {
        match select_set(self.store.list_sets().await, query) {
            Some(set) => Ok(set),
            None => fail_with(
                ErrorKind::NotFound,
                format!("no set named or with id {query:?}. Did you run `flashprep import`?"),
            ),
        }
    }
}

/// The set whose id is `query`, or else the first whose name is.
pub fn select_set(sets: Vec<Set>, query: &str) -> Option<Set> {
    let query = query.trim();
    match sets.iter().position(|set| set.id.as_str() == query) {
        Some(idx) => sets.into_iter().nth(idx),
        None => sets.into_iter().find(|set| set.name == query),
    }
}
