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

//! Reviews where one answer covers several cards, as in a matching question.

use crate::error::Fallible;
use crate::scheduler::advance;
use crate::scheduler::initialize;
use crate::session::stats::SessionStats;
use crate::store::CardStore;
use crate::types::ids::CardId;
use crate::types::rating::Rating;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

pub struct CompoundOutcome {
    /// The new state of every card, in the order they were answered.
    pub states: Vec<ReviewState>,
    /// States that could not be written. Writing them again is safe.
    pub unsaved: Vec<ReviewState>,
}

/// Schedule every card covered by one compound answer, and count the answer
/// as a single studied card.
///
/// A card without a stored review state is treated as new.
pub fn review_compound<S: CardStore + ?Sized>(
    store: &S,
    stats: &mut SessionStats,
    answers: &[(CardId, Rating)],
    now: Timestamp,
) -> Fallible<CompoundOutcome> {
    let mut states = Vec::with_capacity(answers.len());
    for (card_id, rating) in answers {
        let current = match store.get_review_state(*card_id)? {
            Some(state) => state,
            None => initialize(*card_id, now),
        };
        states.push(advance(&current, *rating, now));
    }
    let ratings: Vec<Rating> = answers.iter().map(|(_, rating)| *rating).collect();
    stats.record_compound(&ratings);

    let mut unsaved = Vec::new();
    for state in &states {
        if let Err(e) = store.put_review_state(state) {
            log::warn!("Failed to save review state for card {}: {e}", state.card_id);
            unsaved.push(state.clone());
        }
    }
    Ok(CompoundOutcome { states, unsaved })
}
