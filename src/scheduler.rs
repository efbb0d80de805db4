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

//! The SM-2 review scheduler.

use crate::types::card_status::CardStatus;
use crate::types::ids::CardId;
use crate::types::rating::Rating;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// The easiness factor of a card that has never been reviewed.
pub const INITIAL_EASINESS: f64 = 2.5;

/// The easiness factor never drops below this.
pub const MIN_EASINESS: f64 = 1.3;

/// Reviews with a quality below this are failures.
const PASSING_QUALITY: u8 = 3;

/// The interval after a failure, and after the first success.
const FIRST_INTERVAL: u32 = 1;

/// The interval after the second consecutive success.
const SECOND_INTERVAL: u32 = 6;

/// Cards with this many consecutive successes are in review.
const REVIEW_REPETITIONS: u32 = 3;

/// No interval is longer than a hundred years.
pub const MAX_INTERVAL: u32 = 36_500;

/// The review state of a card that was just added: new, and due at `now`.
pub fn initialize(card_id: CardId, now: Timestamp) -> ReviewState {
    ReviewState {
        card_id,
        easiness_factor: INITIAL_EASINESS,
        interval: 0,
        repetitions: 0,
        next_review_date: now,
        last_review_date: None,
        status: CardStatus::New,
    }
}

/// Compute a card's review state after it is rated at `now`.
pub fn advance(state: &ReviewState, rating: Rating, now: Timestamp) -> ReviewState {
    let quality = rating.quality();
    let easiness_factor = next_easiness(state.easiness_factor, quality);
    let (interval, repetitions) = if quality < PASSING_QUALITY {
        (FIRST_INTERVAL, 0)
    } else {
        match state.repetitions {
            0 => (FIRST_INTERVAL, 1),
            1 => (SECOND_INTERVAL, 2),
            n => {
                let interval = (f64::from(state.interval) * easiness_factor).round();
                let interval = interval.min(f64::from(MAX_INTERVAL)) as u32;
                (interval, n.saturating_add(1))
            }
        }
    };
    ReviewState {
        card_id: state.card_id,
        easiness_factor,
        interval,
        repetitions,
        next_review_date: now.plus_days(interval),
        last_review_date: Some(now),
        status: status_for(repetitions),
    }
}

/// The SM-2 easiness update, clamped to [`MIN_EASINESS`].
pub fn next_easiness(easiness_factor: f64, quality: u8) -> f64 {
    let distance = f64::from(5 - quality.min(5));
    let delta = 0.1 - distance * (0.08 + distance * 0.02);
    (easiness_factor + delta).max(MIN_EASINESS)
}

/// A reviewed card never goes back to `New`, even after a failure.
fn status_for(repetitions: u32) -> CardStatus {
    if repetitions >= REVIEW_REPETITIONS {
        CardStatus::Review
    } else {
        CardStatus::Learning
    }
}
