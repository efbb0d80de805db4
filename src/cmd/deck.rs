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
use crate::error::fail;
use crate::types::deck::Deck;
use crate::types::timestamp::Timestamp;

pub fn create_deck(
    directory: Option<String>,
    name: String,
    description: Option<String>,
) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let deck: Deck = coll
        .db
        .create_deck(&name, description.as_deref(), Timestamp::now())?;
    println!("Created deck {}: {}", deck.id, deck.name);
    Ok(())
}

pub fn list_decks(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let now = Timestamp::now();
    let decks = coll.db.list_decks()?;
    if decks.is_empty() {
        println!("No decks.");
        return Ok(());
    }
    for deck in decks {
        let stats = coll.db.deck_stats(deck.id, now)?;
        println!(
            "{}\t{}\t{} cards, {} due",
            deck.id, deck.name, stats.total_cards, stats.due_cards
        );
        if let Some(description) = &deck.description {
            println!("\t{description}");
        }
    }
    Ok(())
}

pub fn delete_deck(directory: Option<String>, deck: String) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let deck = coll.resolve_deck(&deck)?;
    if !coll.db.delete_deck(deck.id)? {
        return fail(format!("no deck with ID {}.", deck.id));
    }
    println!("Deleted deck {}: {}", deck.id, deck.name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_non_existent_directory() {
        assert!(list_decks(Some("./derpherp".to_string())).is_err());
    }

    #[test]
    fn test_create_list_delete() -> Fallible<()> {
        let dir = tempdir()?;
        let directory = dir.path().display().to_string();
        create_deck(Some(directory.clone()), "Verbs".to_string(), None)?;
        assert!(create_deck(Some(directory.clone()), "Verbs".to_string(), None).is_err());
        list_decks(Some(directory.clone()))?;
        delete_deck(Some(directory.clone()), "Verbs".to_string())?;
        assert!(delete_deck(Some(directory.clone()), "Verbs".to_string()).is_err());
        let coll = Collection::new(Some(directory))?;
        assert!(coll.db.list_decks()?.is_empty());
        Ok(())
    }
}
