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

use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use walkdir::WalkDir;

use crate::config::CONFIG_FILE;
use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::types::card::Card;
use crate::types::set::Set;
use crate::types::set::SetId;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SetFile {
    name: String,
    id: Option<String>,
    #[serde(default)]
    cards: Vec<CardEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CardEntry {
    #[serde(default)]
    front: String,
    front_image: Option<String>,
    #[serde(default)]
    back: String,
    back_image: Option<String>,
}

/// Parse the contents of a single set file. `file` is only used in error
/// messages.
pub fn parse_set(text: &str, file: &Path) -> Fallible<Set> {
    let parsed: SetFile = toml::from_str(text).map_err(|e| {
        ErrorReport::with_kind(
            ErrorKind::InvalidInput,
            format!("{}: {}", file.display(), e.message()),
        )
    })?;
    let name = parsed.name.trim();
    if name.is_empty() {
        return fail_with(
            ErrorKind::InvalidInput,
            format!("{}: set name is empty.", file.display()),
        );
    }
    let id = match parsed.id {
        Some(id) => SetId::new(id)?,
        None => SetId::from_name(name),
    };
    let mut cards = Vec::with_capacity(parsed.cards.len());
    for (idx, entry) in parsed.cards.into_iter().enumerate() {
        let card = Card::new(entry.front, entry.front_image, entry.back, entry.back_image)
            .map_err(|_| {
                ErrorReport::with_kind(
                    ErrorKind::InvalidInput,
                    format!("{}: card {} has no content.", file.display(), idx + 1),
                )
            })?;
        cards.push(card);
    }
    Ok(Set::new(id, name, cards))
}

/// Parse every set file under `directory`, in path order.
pub fn parse_collection(directory: &Path) -> Fallible<Vec<Set>> {
    let mut sets = Vec::new();
    let mut seen: HashMap<SetId, PathBuf> = HashMap::new();
    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "toml") {
            continue;
        }
        if entry.depth() == 1 && entry.file_name() == CONFIG_FILE {
            continue;
        }
        let text = read_to_string(path)?;
        let set = parse_set(&text, path)?;
        if let Some(other) = seen.get(&set.id) {
            return fail_with(
                ErrorKind::InvalidInput,
                format!(
                    "duplicate set id {} in {} and {}.",
                    set.id,
                    other.display(),
                    path.display()
                ),
            );
        }
        if set.is_empty() {
            log::warn!("{} has no cards.", path.display());
        }
        log::debug!("Parsed {} ({} cards)", path.display(), set.len());
        seen.insert(set.id.clone(), path.to_path_buf());
        sets.push(set);
    }
    Ok(sets)
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use super::*;
    use crate::helper::CAPITALS_TOML;
    use crate::helper::VERBS_TOML;
    use crate::helper::create_tmp_collection;

    #[test]
    fn test_parse_set() -> Fallible<()> {
        let set = parse_set(VERBS_TOML, Path::new("verbs.toml"))?;
        assert_eq!(set.id.as_str(), "verbs");
        assert_eq!(set.name, "Spanish verbs");
        assert_eq!(set.len(), 3);
        assert_eq!(set.cards[1].back_image(), Some("https://example.com/eat.png"));
        assert_eq!(set.cards[0].front_image(), None);
        Ok(())
    }

    #[test]
    fn test_derived_id() -> Fallible<()> {
        let set = parse_set(CAPITALS_TOML, Path::new("capitals.toml"))?;
        assert_eq!(set.id, SetId::from_name("Capitals"));
        Ok(())
    }

    #[test]
    fn test_image_only_card() -> Fallible<()> {
        let text = "name = \"Flags\"\n[[cards]]\nfront_image = \"fr.png\"\n";
        let set = parse_set(text, Path::new("flags.toml"))?;
        assert_eq!(set.cards[0].front(), "");
        assert_eq!(set.cards[0].front_image(), Some("fr.png"));
        Ok(())
    }

    #[test]
    fn test_blank_card_is_rejected() {
        let text = "name = \"Blank\"\n[[cards]]\nfront = \"a\"\n[[cards]]\nfront = \"  \"\n";
        let err = parse_set(text, Path::new("blank.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "error: blank.toml: card 2 has no content.");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let err = parse_set("name = \" \"", Path::new("x.toml")).unwrap_err();
        assert_eq!(err.to_string(), "error: x.toml: set name is empty.");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let text = "name = \"A\"\n[[cards]]\nquestion = \"q\"\n";
        let err = parse_set(text, Path::new("a.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_parse_collection() -> Fallible<()> {
        let (_dir, root) = create_tmp_collection()?;
        write(root.join(CONFIG_FILE), "[drill]\nport = 9000\n")?;
        write(root.join("notes.md"), "not a set")?;
        let sets = parse_collection(&root)?;
        let names: Vec<&str> = sets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Capitals", "Spanish verbs"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_ids_are_rejected() -> Fallible<()> {
        let (_dir, root) = create_tmp_collection()?;
        write(root.join("copy.toml"), CAPITALS_TOML)?;
        let err = parse_collection(&root).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("duplicate set id"));
        Ok(())
    }
}
