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

use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::deck::Deck;
use crate::types::history::SessionRecord;
use crate::types::review_state::ReviewState;

pub fn export_collection(directory: Option<String>) -> Fallible<()> {
    let coll: Collection = Collection::new(directory)?;
    let export: Export = get_export(&coll)?;
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    decks: Vec<DeckExport>,
    sessions: Vec<SessionRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeckExport {
    #[serde(flatten)]
    deck: Deck,
    cards: Vec<CardExport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardExport {
    #[serde(flatten)]
    card: Card,
    review_state: ReviewState,
}

fn get_export(coll: &Collection) -> Fallible<Export> {
    let mut decks = Vec::new();
    for deck in coll.db.list_decks()? {
        let cards = coll
            .db
            .list_cards(deck.id)?
            .into_iter()
            .map(|(card, review_state)| CardExport { card, review_state })
            .collect();
        decks.push(DeckExport { deck, cards });
    }
    let sessions = coll.db.list_sessions()?;
    Ok(Export { decks, sessions })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::types::card::NewCard;
    use crate::types::timestamp::Timestamp;

    #[test]
    fn test_export_shape() -> Fallible<()> {
        let dir = tempdir()?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        let deck = coll.db.create_deck("Verbs", None, Timestamp::now())?;
        coll.db
            .add_card(deck.id, NewCard::new("to eat", "comer"), Timestamp::now())?;

        let export = get_export(&coll)?;
        let value = serde_json::to_value(&export)?;
        assert_eq!(value["decks"][0]["name"], "Verbs");
        assert_eq!(value["decks"][0]["cards"][0]["front"], "to eat");
        assert_eq!(value["decks"][0]["cards"][0]["reviewState"]["status"], "new");
        assert_eq!(value["sessions"], serde_json::json!([]));
        Ok(())
    }
}
