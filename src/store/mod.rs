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

//! The interface between the scheduling core and whatever persists cards.

pub mod memory;

use std::sync::Arc;

use crate::error::Fallible;
use crate::types::card::Card;
use crate::types::card_status::CardStatus;
use crate::types::history::SessionRecord;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// Owns card content and persisted review state.
///
/// Writes replace the stored review state wholesale, so retrying a failed
/// `put_review_state` is always safe.
pub trait CardStore {
    /// Returns `None` if the card has no review state.
    fn get_review_state(&self, card_id: CardId) -> Fallible<Option<ReviewState>>;

    /// Overwrite the review state of `state.card_id`.
    fn put_review_state(&self, state: &ReviewState) -> Fallible<()>;

    /// The cards in a deck whose next review date is at or before `now`. An
    /// unknown deck has no cards.
    fn get_cards_due_before(
        &self,
        deck_id: DeckId,
        now: Timestamp,
    ) -> Fallible<Vec<(Card, ReviewState)>>;

    fn get_card_count(&self, deck_id: DeckId) -> Fallible<usize>;

    fn get_card_count_by_status(&self, deck_id: DeckId, status: CardStatus) -> Fallible<usize>;

    /// Append a finished session to the review history.
    fn save_session(&self, session: &SessionRecord) -> Fallible<()>;
}

impl<T: CardStore + ?Sized> CardStore for &T {
    fn get_review_state(&self, card_id: CardId) -> Fallible<Option<ReviewState>> {
        (**self).get_review_state(card_id)
    }

    fn put_review_state(&self, state: &ReviewState) -> Fallible<()> {
        (**self).put_review_state(state)
    }

    fn get_cards_due_before(
        &self,
        deck_id: DeckId,
        now: Timestamp,
    ) -> Fallible<Vec<(Card, ReviewState)>> {
        (**self).get_cards_due_before(deck_id, now)
    }

    fn get_card_count(&self, deck_id: DeckId) -> Fallible<usize> {
        (**self).get_card_count(deck_id)
    }

    fn get_card_count_by_status(&self, deck_id: DeckId, status: CardStatus) -> Fallible<usize> {
        (**self).get_card_count_by_status(deck_id, status)
    }

    fn save_session(&self, session: &SessionRecord) -> Fallible<()> {
        (**self).save_session(session)
    }
}

impl<T: CardStore + ?Sized> CardStore for Arc<T> {
    fn get_review_state(&self, card_id: CardId) -> Fallible<Option<ReviewState>> {
        (**self).get_review_state(card_id)
    }

    fn put_review_state(&self, state: &ReviewState) -> Fallible<()> {
        (**self).put_review_state(state)
    }

    fn get_cards_due_before(
        &self,
        deck_id: DeckId,
        now: Timestamp,
    ) -> Fallible<Vec<(Card, ReviewState)>> {
        (**self).get_cards_due_before(deck_id, now)
    }

    fn get_card_count(&self, deck_id: DeckId) -> Fallible<usize> {
        (**self).get_card_count(deck_id)
    }

    fn get_card_count_by_status(&self, deck_id: DeckId, status: CardStatus) -> Fallible<usize> {
        (**self).get_card_count_by_status(deck_id, status)
    }

    fn save_session(&self, session: &SessionRecord) -> Fallible<()> {
        (**self).save_session(session)
    }
}
