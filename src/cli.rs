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

use clap::Parser;
use clap::Subcommand;

use crate::cmd::card::CardArgs;
use crate::cmd::card::add_card;
use crate::cmd::card::delete_card;
use crate::cmd::card::list_cards;
use crate::cmd::deck::create_deck;
use crate::cmd::deck::delete_deck;
use crate::cmd::deck::list_decks;
use crate::cmd::drill::drill;
use crate::cmd::export::export_collection;
use crate::cmd::import::import_decks;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_deck_stats;
use crate::error::Fallible;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the collection directory. By default, the current working directory is used.
    #[arg(long, global = true)]
    directory: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage decks.
    Deck {
        #[command(subcommand)]
        command: DeckCommand,
    },
    /// Manage cards.
    Card {
        #[command(subcommand)]
        command: CardCommand,
    },
    /// Import decks from a TOML file, or from every TOML file in a directory.
    Import { path: String },
    /// Study the cards that are due in a deck.
    Drill {
        /// Deck ID or name.
        deck: String,
    },
    /// Print statistics about a deck.
    Stats {
        /// Deck ID or name.
        deck: String,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Text)]
        format: StatsFormat,
    },
    /// Export the collection as JSON.
    Export,
}

#[derive(Subcommand)]
enum DeckCommand {
    /// Create an empty deck.
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List decks, newest first.
    List,
    /// Delete a deck with all of its cards and history.
    Delete {
        /// Deck ID or name.
        deck: String,
    },
}

#[derive(Subcommand)]
enum CardCommand {
    /// Add a card to a deck.
    Add {
        /// Deck ID or name.
        deck: String,
        front: String,
        back: String,
        #[arg(long)]
        example: Option<String>,
        #[arg(long)]
        phonetic: Option<String>,
        /// ID of the vocabulary entry this card was made from.
        #[arg(long)]
        vocab_id: Option<i64>,
    },
    /// List the cards in a deck.
    List {
        /// Deck ID or name.
        deck: String,
    },
    /// Delete a card.
    Delete { id: i64 },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let directory = cli.directory;
    match cli.command {
        Command::Deck { command } => match command {
            DeckCommand::Create { name, description } => {
                create_deck(directory, name, description)
            }
            DeckCommand::List => list_decks(directory),
            DeckCommand::Delete { deck } => delete_deck(directory, deck),
        },
        Command::Card { command } => match command {
            CardCommand::Add {
                deck,
                front,
                back,
                example,
                phonetic,
                vocab_id,
            } => {
                let args = CardArgs {
                    front,
                    back,
                    example,
                    phonetic,
                    vocab_id,
                };
                add_card(directory, deck, args)
            }
            CardCommand::List { deck } => list_cards(directory, deck),
            CardCommand::Delete { id } => delete_card(directory, id),
        },
        Command::Import { path } => import_decks(directory, path),
        Command::Drill { deck } => drill(directory, deck).await,
        Command::Stats { deck, format } => print_deck_stats(directory, deck, format),
        Command::Export => export_collection(directory),
    }
}
