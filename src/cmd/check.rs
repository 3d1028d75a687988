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

use crate::collection::resolve_directory;
use crate::error::Fallible;
use crate::parser::parse_collection;

pub fn check_collection(directory: Option<String>) -> Fallible<()> {
    let directory = resolve_directory(directory)?;
    let sets = parse_collection(&directory)?;
    let cards: usize = sets.iter().map(|set| set.len()).sum();
    log::debug!("{} sets, {cards} cards.", sets.len());
    println!("ok");
    Ok(())
}
