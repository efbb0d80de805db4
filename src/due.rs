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

use crate::error::Fallible;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::ids::DeckId;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// A card that is due, together with its current review state.
#[derive(Clone, PartialEq, Debug)]
pub struct DueCard {
    pub card: Card,
    pub state: ReviewState,
}

/// Find the cards in a deck that are due at `now`, oldest-due first. Cards
/// due at the same instant are ordered by ID.
pub fn due_cards<S: CardStore + ?Sized>(
    store: &S,
    deck_id: DeckId,
    now: Timestamp,
) -> Fallible<Vec<DueCard>> {
    let mut due: Vec<DueCard> = store
        .get_cards_due_before(deck_id, now)?
        .into_iter()
        .filter(|(card, state)| card.deck_id == deck_id && state.is_due(now))
        .map(|(card, state)| DueCard { card, state })
        .collect();
    due.sort_by(|a, b| {
        a.state
            .next_review_date
            .cmp(&b.state.next_review_date)
            .then(a.card.id.cmp(&b.card.id))
    });
    log::debug!("{} cards due in deck {deck_id}.", due.len());
    Ok(due)
}
