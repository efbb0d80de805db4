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
use crate::types::card::NewCard;
use crate::types::ids::CardId;
use crate::types::timestamp::Timestamp;

pub struct CardArgs {
    pub front: String,
    pub back: String,
    pub example: Option<String>,
    pub phonetic: Option<String>,
    pub vocab_id: Option<i64>,
}

pub fn add_card(directory: Option<String>, deck: String, args: CardArgs) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let deck = coll.resolve_deck(&deck)?;
    let card = NewCard::new(args.front, args.back)
        .with_example(args.example)
        .with_phonetic(args.phonetic)
        .with_vocab_id(args.vocab_id);
    match coll.db.add_card(deck.id, card, Timestamp::now())? {
        Some(card) => println!("Added card {} to {}.", card.id, deck.name),
        None => println!("{} already has this card.", deck.name),
    }
    Ok(())
}

pub fn list_cards(directory: Option<String>, deck: String) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let deck = coll.resolve_deck(&deck)?;
    let cards = coll.db.list_cards(deck.id)?;
    if cards.is_empty() {
        println!("{} has no cards.", deck.name);
        return Ok(());
    }
    for (card, state) in cards {
        let phonetic = match &card.phonetic {
            Some(p) => format!(" [{p}]"),
            None => String::new(),
        };
        println!(
            "{}\t{}{} = {}\t{}, due {}",
            card.id, card.front, phonetic, card.back, state.status, state.next_review_date
        );
    }
    Ok(())
}

pub fn delete_card(directory: Option<String>, card_id: i64) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let card_id = CardId::new(card_id);
    if !coll.db.delete_card(card_id)? {
        return fail(format!("no card with ID {card_id}."));
    }
    println!("Deleted card {card_id}.");
    Ok(())
}
