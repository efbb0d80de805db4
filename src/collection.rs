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

use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::deck::Deck;
use crate::types::ids::DeckId;

/// The file name of the database inside a collection directory.
pub const DATABASE_FILE: &str = "flashdeck.db";

/// A directory holding a flashdeck database.
pub struct Collection {
    pub directory: PathBuf,
    pub db: Database,
}

impl Collection {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let db_path: PathBuf = directory.join(DATABASE_FILE);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        log::debug!("Opening database at {db_path}.");
        let db: Database = Database::new(db_path)?;

        Ok(Self { directory, db })
    }

    /// Find a deck by its numeric ID or, failing that, by its name.
    pub fn resolve_deck(&self, deck: &str) -> Fallible<Deck> {
        let deck = deck.trim();
        if let Ok(id) = deck.parse::<i64>() {
            if let Some(found) = self.db.get_deck(DeckId::new(id))? {
                return Ok(found);
            }
        }
        match self.db.find_deck_by_name(deck)? {
            Some(found) => Ok(found),
            None => fail(format!("no deck named '{deck}'.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::types::timestamp::Timestamp;

    #[test]
    fn test_missing_directory() {
        let result = Collection::new(Some("./derpherp".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_deck_by_id_or_name() -> Fallible<()> {
        let dir = tempdir()?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        assert!(coll.directory.join(DATABASE_FILE).exists());
        let deck = coll.db.create_deck("Spanish", None, Timestamp::now())?;
        assert_eq!(coll.resolve_deck(&deck.id.to_string())?, deck);
        assert_eq!(coll.resolve_deck("Spanish")?, deck);
        assert!(coll.resolve_deck("French").is_err());
        Ok(())
    }
}
