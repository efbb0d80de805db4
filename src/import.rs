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

//! Importing decks from TOML files.
//!
//! A deck file looks like this:
//!
//! ```toml
//! name = "Spanish"
//! description = "Everyday nouns."
//!
//! [[cards]]
//! front = "house"
//! back = "casa"
//! example = "Mi casa es tu casa."
//! ```

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use walkdir::WalkDir;

use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::card::NewCard;
use crate::types::timestamp::Timestamp;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct DeckFile {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub cards: Vec<CardEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct CardEntry {
    pub front: String,
    pub back: String,
    pub example: Option<String>,
    pub phonetic: Option<String>,
}

/// What one deck file contributed.
#[derive(Debug, PartialEq, Eq)]
pub struct ImportSummary {
    pub deck_name: String,
    pub added: usize,
    pub skipped: usize,
}

pub fn parse_deck_file(text: &str) -> Fallible<DeckFile> {
    let file: DeckFile = toml::from_str(text)?;
    if file.name.trim().is_empty() {
        return fail("deck name is empty.");
    }
    Ok(file)
}

/// Import a deck file, or every `.toml` file under a directory.
pub fn import_path(db: &Database, path: &Path, now: Timestamp) -> Fallible<Vec<ImportSummary>> {
    if !path.exists() {
        return fail(format!("{} does not exist.", path.display()));
    }
    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };
    let mut summaries = Vec::new();
    for file in files {
        log::debug!("Importing {}", file.display());
        let text = std::fs::read_to_string(&file)?;
        let deck = parse_deck_file(&text)
            .map_err(|e| ErrorReport::new(format!("{}: {}", file.display(), e.message())))?;
        summaries.push(import_deck(db, deck, now)?);
    }
    Ok(summaries)
}

/// Add a parsed deck to the database. A deck with the same name is reused,
/// and cards it already has are skipped.
pub fn import_deck(db: &Database, file: DeckFile, now: Timestamp) -> Fallible<ImportSummary> {
    let deck = match db.find_deck_by_name(&file.name)? {
        Some(deck) => deck,
        None => db.create_deck(&file.name, file.description.as_deref(), now)?,
    };
    let mut added = 0;
    let mut skipped = 0;
    for entry in file.cards {
        let card = NewCard::new(entry.front, entry.back)
            .with_example(entry.example)
            .with_phonetic(entry.phonetic);
        match db.add_card(deck.id, card, now)? {
            Some(_) => added += 1,
            None => skipped += 1,
        }
    }
    Ok(ImportSummary {
        deck_name: deck.name,
        added,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use std::fs::create_dir;
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;
    use crate::store::CardStore;

    const SPANISH: &str = r#"
name = "Spanish"
description = "Everyday nouns."

[[cards]]
front = "house"
back = "casa"
example = "Mi casa es tu casa."

[[cards]]
front = "dog"
back = "perro"
phonetic = "ˈpero"
"#;

    #[test]
    fn test_parse_deck_file() -> Fallible<()> {
        let deck = parse_deck_file(SPANISH)?;
        assert_eq!(deck.name, "Spanish");
        assert_eq!(deck.cards.len(), 2);
        assert_eq!(deck.cards[1].phonetic.as_deref(), Some("ˈpero"));
        Ok(())
    }

    #[test]
    fn test_parse_rejects_bad_files() {
        assert!(parse_deck_file("name = \"\"").is_err());
        assert!(parse_deck_file("[[cards]]\nfront = \"a\"\nback = \"b\"").is_err());
        assert!(parse_deck_file("name = \"x\"\ncolour = \"red\"").is_err());
    }

    #[test]
    fn test_reimport_is_idempotent() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        let now = Timestamp::now();
        let first = import_deck(&db, parse_deck_file(SPANISH)?, now)?;
        assert_eq!((first.added, first.skipped), (2, 0));
        let second = import_deck(&db, parse_deck_file(SPANISH)?, now)?;
        assert_eq!((second.added, second.skipped), (0, 2));
        assert_eq!(db.list_decks()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_import_directory() -> Fallible<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("nested");
        create_dir(&nested)?;
        write(dir.path().join("spanish.toml"), SPANISH)?;
        write(
            nested.join("french.toml"),
            "name = \"French\"\n[[cards]]\nfront = \"cat\"\nback = \"chat\"\n",
        )?;
        write(dir.path().join("notes.txt"), "not a deck")?;

        let db = Database::new(":memory:")?;
        let summaries = import_path(&db, dir.path(), Timestamp::now())?;
        assert_eq!(summaries.len(), 2);
        let french = db
            .find_deck_by_name("French")?
            .ok_or_else(|| ErrorReport::new("missing deck"))?;
        assert_eq!(db.get_card_count(french.id)?, 1);
        Ok(())
    }

    #[test]
    fn test_import_missing_path() -> Fallible<()> {
        let db = Database::new(":memory:")?;
        assert!(import_path(&db, Path::new("./derpherp"), Timestamp::now()).is_err());
        Ok(())
    }
}
