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

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card_status::CardStatus;
use crate::types::history::SessionRecord;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// A card store that lives entirely in memory. Nothing survives the process.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    cards: BTreeMap<CardId, (Card, ReviewState)>,
    sessions: Vec<SessionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Insert a card with its review state. If a card with the same ID is
    /// already present, returns an error.
    pub fn insert(&self, card: Card, state: ReviewState) -> Fallible<()> {
        if card.id != state.card_id {
            return fail("review state belongs to a different card.");
        }
        let mut inner = self.acquire()?;
        if inner.cards.contains_key(&card.id) {
            return fail(format!("card {} already exists.", card.id));
        }
        inner.cards.insert(card.id, (card, state));
        Ok(())
    }

    /// Every session saved so far, oldest first.
    pub fn sessions(&self) -> Fallible<Vec<SessionRecord>> {
        Ok(self.acquire()?.sessions.clone())
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| ErrorReport::new("memory store lock poisoned."))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CardStore for MemoryStore {
    fn get_review_state(&self, card_id: CardId) -> Fallible<Option<ReviewState>> {
        let inner = self.acquire()?;
        Ok(inner.cards.get(&card_id).map(|(_, state)| state.clone()))
    }

    fn put_review_state(&self, state: &ReviewState) -> Fallible<()> {
        let mut inner = self.acquire()?;
        match inner.cards.get_mut(&state.card_id) {
            Some((_, stored)) => {
                *stored = state.clone();
                Ok(())
            }
            None => fail(format!("no card with ID {}.", state.card_id)),
        }
    }

    fn get_cards_due_before(
        &self,
        deck_id: DeckId,
        now: Timestamp,
    ) -> Fallible<Vec<(Card, ReviewState)>> {
        let inner = self.acquire()?;
        let due = inner
            .cards
            .values()
            .filter(|(card, state)| card.deck_id == deck_id && state.is_due(now))
            .cloned()
            .collect();
        Ok(due)
    }

    fn get_card_count(&self, deck_id: DeckId) -> Fallible<usize> {
        let inner = self.acquire()?;
        Ok(inner
            .cards
            .values()
            .filter(|(card, _)| card.deck_id == deck_id)
            .count())
    }

    fn get_card_count_by_status(&self, deck_id: DeckId, status: CardStatus) -> Fallible<usize> {
        let inner = self.acquire()?;
        Ok(inner
            .cards
            .values()
            .filter(|(card, state)| card.deck_id == deck_id && state.status == status)
            .count())
    }

    fn save_session(&self, session: &SessionRecord) -> Fallible<()> {
        self.acquire()?.sessions.push(session.clone());
        Ok(())
    }
}
