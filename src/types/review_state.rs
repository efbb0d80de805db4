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

use crate::types::card_status::CardStatus;
use crate::types::ids::CardId;
use crate::types::timestamp::Timestamp;

/// Scheduling information for a card. There is exactly one per card, and
/// only the scheduler produces new values of it.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub card_id: CardId,
    /// Governs how fast the interval grows. Never below 1.3.
    pub easiness_factor: f64,
    /// Days until the card is next due.
    pub interval: u32,
    /// The number of consecutive successful reviews.
    pub repetitions: u32,
    /// The card is due once the current time reaches this instant.
    pub next_review_date: Timestamp,
    /// When the card was last reviewed, if ever.
    pub last_review_date: Option<Timestamp>,
    pub status: CardStatus,
}

impl ReviewState {
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review_date <= now
    }
}
