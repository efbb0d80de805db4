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

use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::rating::Rating;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// A single rating given during a session, with the state it produced.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub card_id: CardId,
    pub reviewed_at: Timestamp,
    pub rating: Rating,
    pub state: ReviewState,
}

/// A completed study session.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub deck_id: DeckId,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub reviews: Vec<ReviewRecord>,
}
