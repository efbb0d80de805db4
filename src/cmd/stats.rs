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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::types::deck::Deck;
use crate::types::deck::DeckStats;
use crate::types::timestamp::Timestamp;

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum StatsFormat {
    /// Plain text output.
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    deck_id: i64,
    deck_name: String,
    #[serde(flatten)]
    counts: DeckStats,
}

pub fn print_deck_stats(directory: Option<String>, deck: String, format: StatsFormat) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let deck: Deck = coll.resolve_deck(&deck)?;
    let counts = coll.db.deck_stats(deck.id, Timestamp::now())?;
    println!("{}", render(&deck, counts, format)?);
    Ok(())
}

fn render(deck: &Deck, counts: DeckStats, format: StatsFormat) -> Fallible<String> {
    match format {
        StatsFormat::Text => Ok([
            deck.name.clone(),
            format!("  Total:    {}", counts.total_cards),
            format!("  New:      {}", counts.new_cards),
            format!("  Learning: {}", counts.learning_cards),
            format!("  Review:   {}", counts.review_cards),
            format!("  Due now:  {}", counts.due_cards),
        ]
        .join("\n")),
        StatsFormat::Json => {
            let stats = Stats {
                deck_id: deck.id.into_inner(),
                deck_name: deck.name.clone(),
                counts,
            };
            Ok(serde_json::to_string_pretty(&stats)?)
        }
    }
}
