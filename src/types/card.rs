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

use crate::types::content_hash::ContentHash;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::timestamp::Timestamp;

/// A card's content, as stored. The scheduler never touches it.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    /// The deck this card belongs to.
    pub deck_id: DeckId,
    /// The vocabulary entry this card was made from, if any.
    pub vocab_id: Option<i64>,
    pub front: String,
    pub back: String,
    /// An example sentence.
    pub example: Option<String>,
    /// The phonetic transcription of the front.
    pub phonetic: Option<String>,
    pub created_at: Timestamp,
}

/// The content of a card that has not been stored yet.
#[derive(Clone, PartialEq, Debug)]
pub struct NewCard {
    pub vocab_id: Option<i64>,
    pub front: String,
    pub back: String,
    pub example: Option<String>,
    pub phonetic: Option<String>,
}

impl NewCard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            vocab_id: None,
            front: front.into().trim().to_string(),
            back: back.into().trim().to_string(),
            example: None,
            phonetic: None,
        }
    }

    pub fn with_example(mut self, example: Option<String>) -> Self {
        self.example = non_blank(example);
        self
    }

    pub fn with_phonetic(mut self, phonetic: Option<String>) -> Self {
        self.phonetic = non_blank(phonetic);
        self
    }

    pub fn with_vocab_id(mut self, vocab_id: Option<i64>) -> Self {
        self.vocab_id = vocab_id;
        self
    }

    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of_card(&self.front, &self.back)
    }

    /// Attach the identifiers assigned by the store.
    pub fn into_card(self, id: CardId, deck_id: DeckId, created_at: Timestamp) -> Card {
        Card {
            id,
            deck_id,
            vocab_id: self.vocab_id,
            front: self.front,
            back: self.back,
            example: self.example,
            phonetic: self.phonetic,
            created_at,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
