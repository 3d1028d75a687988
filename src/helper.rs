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

use std::fs::create_dir_all;
use std::fs::write;
use std::path::PathBuf;

use tempfile::TempDir;
use tempfile::tempdir;

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::performance::PerformanceRecord;
use crate::types::performance::RecordKey;
use crate::types::rating::Rating;
use crate::types::set::Set;
use crate::types::set::SetId;
use crate::types::timestamp::Timestamp;

/// A set named `name` with `n` cards, `front 0`/`back 0` and so on.
pub fn sample_set(name: &str, n: usize) -> Fallible<Set> {
    let cards = (0..n)
        .map(|i| Card::basic(format!("front {i}"), format!("back {i}")))
        .collect::<Fallible<Vec<_>>>()?;
    Ok(Set::new(SetId::from_name(name), name, cards))
}

/// A record for a card reviewed once with the given rating.
pub fn sample_record(set_id: &SetId, card_index: usize, rating: f64) -> Fallible<PerformanceRecord> {
    let key = RecordKey {
        set_id: set_id.clone(),
        card_index,
    };
    Ok(PerformanceRecord::reviewed(
        None,
        &key,
        Rating::new(rating)?,
        Timestamp::now(),
    ))
}

pub const CAPITALS_TOML: &str = r#"
name = "Capitals"

[[cards]]
front = "France"
back = "Paris"

[[cards]]
front = "Peru"
back = "Lima"
"#;

pub const VERBS_TOML: &str = r#"
name = "Spanish verbs"
id = "verbs"

[[cards]]
front = "hablar"
back = "to speak"

[[cards]]
front = "comer"
back = "to eat"
back_image = "https://example.com/eat.png"

[[cards]]
front = "vivir"
back = "to live"
"#;

/// A scratch collection directory holding two set files, one of them in a
/// subdirectory.
pub fn create_tmp_collection() -> Fallible<(TempDir, PathBuf)> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    write(root.join("capitals.toml"), CAPITALS_TOML)?;
    create_dir_all(root.join("languages"))?;
    write(root.join("languages").join("verbs.toml"), VERBS_TOML)?;
    Ok((dir, root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tmp_collection() -> Fallible<()> {
        let (_dir, root) = create_tmp_collection()?;
        assert!(root.join("capitals.toml").exists());
        assert!(root.join("languages/verbs.toml").exists());
        Ok(())
    }
}
