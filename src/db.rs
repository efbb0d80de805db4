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
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::initialize;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::card::NewCard;
use crate::types::card_status::CardStatus;
use crate::types::deck::Deck;
use crate::types::deck::DeckStats;
use crate::types::history::ReviewRecord;
use crate::types::history::SessionRecord;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

const CARD_COLUMNS: &str =
    "c.card_id, c.deck_id, c.vocab_id, c.front, c.back, c.example, c.phonetic, c.created_at";

const STATE_COLUMNS: &str = "s.card_id, s.easiness_factor, s.interval_days, s.repetitions, s.next_review_at, s.last_review_at, s.status";

/// The SQLite card store.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Create a new, empty deck. Deck names are unique.
    pub fn create_deck(
        &self,
        name: &str,
        description: Option<&str>,
        now: Timestamp,
    ) -> Fallible<Deck> {
        let name = name.trim();
        if name.is_empty() {
            return fail("deck name is empty.");
        }
        if self.find_deck_by_name(name)?.is_some() {
            return fail(format!("a deck named '{name}' already exists."));
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());
        let conn = self.acquire()?;
        let sql = "insert into decks (name, description, created_at) values (?, ?, ?) returning deck_id;";
        let id: DeckId = conn.query_row(sql, (name, description, now), |row| row.get(0))?;
        log::debug!("Created deck {id}: {name}");
        Ok(Deck {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
        })
    }

    pub fn get_deck(&self, deck_id: DeckId) -> Fallible<Option<Deck>> {
        let conn = self.acquire()?;
        let sql = "select deck_id, name, description, created_at from decks where deck_id = ?;";
        let deck = conn.query_row(sql, [deck_id], read_deck).optional()?;
        Ok(deck)
    }

    pub fn find_deck_by_name(&self, name: &str) -> Fallible<Option<Deck>> {
        let conn = self.acquire()?;
        let sql = "select deck_id, name, description, created_at from decks where name = ?;";
        let deck = conn.query_row(sql, [name.trim()], read_deck).optional()?;
        Ok(deck)
    }

    /// All decks, newest first.
    pub fn list_decks(&self) -> Fallible<Vec<Deck>> {
        let conn = self.acquire()?;
        let sql = "select deck_id, name, description, created_at from decks order by created_at desc, deck_id desc;";
        let mut stmt = conn.prepare(sql)?;
        let decks = stmt
            .query_map([], read_deck)?
            .collect::<rusqlite::Result<Vec<Deck>>>()?;
        Ok(decks)
    }

    /// Delete a deck and, with it, its cards and their history. Returns
    /// whether the deck existed.
    pub fn delete_deck(&self, deck_id: DeckId) -> Fallible<bool> {
        let conn = self.acquire()?;
        let count = conn.execute("delete from decks where deck_id = ?;", [deck_id])?;
        Ok(count > 0)
    }

    /// Add a card to a deck, with a fresh review state that is due at `now`.
    ///
    /// Returns `None` if the deck already has a card with the same content.
    pub fn add_card(
        &self,
        deck_id: DeckId,
        card: NewCard,
        now: Timestamp,
    ) -> Fallible<Option<Card>> {
        if card.front.is_empty() || card.back.is_empty() {
            return fail("a card needs both a front and a back.");
        }
        let hash = card.content_hash();
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        if !deck_exists(&tx, deck_id)? {
            return fail(format!("no deck with ID {deck_id}."));
        }
        let duplicate: bool = tx.query_row(
            "select exists (select 1 from cards where deck_id = ? and content_hash = ?);",
            (deck_id, hash),
            |row| row.get(0),
        )?;
        if duplicate {
            log::debug!("Skipping duplicate card: {}", card.front);
            return Ok(None);
        }
        let sql = "insert into cards (deck_id, vocab_id, front, back, example, phonetic, content_hash, created_at) values (?, ?, ?, ?, ?, ?, ?, ?) returning card_id;";
        let card_id: CardId = tx.query_row(
            sql,
            (
                deck_id,
                card.vocab_id,
                &card.front,
                &card.back,
                &card.example,
                &card.phonetic,
                hash,
                now,
            ),
            |row| row.get(0),
        )?;
        upsert_state(&tx, &initialize(card_id, now))?;
        tx.commit()?;
        log::debug!("Added card {card_id} to deck {deck_id}.");
        Ok(Some(card.into_card(card_id, deck_id, now)))
    }

    pub fn get_card(&self, card_id: CardId) -> Fallible<Option<Card>> {
        let conn = self.acquire()?;
        let sql = format!("select {CARD_COLUMNS} from cards c where c.card_id = ?;");
        let card = conn
            .query_row(&sql, [card_id], |row| read_card(row, 0))
            .optional()?;
        Ok(card)
    }

    /// Every card in a deck with its review state, in the order added.
    pub fn list_cards(&self, deck_id: DeckId) -> Fallible<Vec<(Card, ReviewState)>> {
        let conn = self.acquire()?;
        let sql = format!(
            "select {CARD_COLUMNS}, {STATE_COLUMNS} from cards c join review_states s on s.card_id = c.card_id where c.deck_id = ? order by c.card_id;"
        );
        let mut stmt = conn.prepare(&sql)?;
        let cards = stmt
            .query_map([deck_id], read_card_and_state)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    /// Returns whether the card existed.
    pub fn delete_card(&self, card_id: CardId) -> Fallible<bool> {
        let conn = self.acquire()?;
        let count = conn.execute("delete from cards where card_id = ?;", [card_id])?;
        Ok(count > 0)
    }

    pub fn deck_stats(&self, deck_id: DeckId, now: Timestamp) -> Fallible<DeckStats> {
        let due_cards = {
            let conn = self.acquire()?;
            let sql = "select count(*) from cards c join review_states s on s.card_id = c.card_id where c.deck_id = ? and s.next_review_at <= ?;";
            let count: i64 = conn.query_row(sql, (deck_id, now), |row| row.get(0))?;
            to_count(count)
        };
        Ok(DeckStats {
            total_cards: self.get_card_count(deck_id)?,
            new_cards: self.get_card_count_by_status(deck_id, CardStatus::New)?,
            learning_cards: self.get_card_count_by_status(deck_id, CardStatus::Learning)?,
            review_cards: self.get_card_count_by_status(deck_id, CardStatus::Review)?,
            due_cards,
        })
    }

    /// Every saved session with its reviews, oldest first.
    pub fn list_sessions(&self) -> Fallible<Vec<SessionRecord>> {
        let conn = self.acquire()?;
        let mut sessions: BTreeMap<i64, SessionRecord> = BTreeMap::new();
        {
            let sql = "select session_id, deck_id, started_at, ended_at from sessions;";
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let session_id: i64 = row.get(0)?;
                sessions.insert(
                    session_id,
                    SessionRecord {
                        deck_id: row.get(1)?,
                        started_at: row.get(2)?,
                        ended_at: row.get(3)?,
                        reviews: Vec::new(),
                    },
                );
            }
        }
        let sql = "select session_id, card_id, reviewed_at, rating, easiness_factor, interval_days, repetitions, next_review_at, status from reviews order by review_id;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let session_id: i64 = row.get(0)?;
            let card_id: CardId = row.get(1)?;
            let reviewed_at: Timestamp = row.get(2)?;
            let review = ReviewRecord {
                card_id,
                reviewed_at,
                rating: row.get(3)?,
                state: ReviewState {
                    card_id,
                    easiness_factor: row.get(4)?,
                    interval: row.get(5)?,
                    repetitions: row.get(6)?,
                    next_review_date: row.get(7)?,
                    last_review_date: Some(reviewed_at),
                    status: row.get(8)?,
                },
            };
            if let Some(session) = sessions.get_mut(&session_id) {
                session.reviews.push(review);
            }
        }
        Ok(sessions.into_values().collect())
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErrorReport::new("database lock poisoned."))
    }
}

impl CardStore for Database {
    fn get_review_state(&self, card_id: CardId) -> Fallible<Option<ReviewState>> {
        let conn = self.acquire()?;
        let sql = format!("select {STATE_COLUMNS} from review_states s where s.card_id = ?;");
        let state = conn
            .query_row(&sql, [card_id], |row| read_state(row, 0))
            .optional()?;
        Ok(state)
    }

    fn put_review_state(&self, state: &ReviewState) -> Fallible<()> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let exists: bool = tx.query_row(
            "select exists (select 1 from cards where card_id = ?);",
            [state.card_id],
            |row| row.get(0),
        )?;
        if !exists {
            return fail(format!("no card with ID {}.", state.card_id));
        }
        upsert_state(&tx, state)?;
        tx.commit()?;
        Ok(())
    }

    fn get_cards_due_before(
        &self,
        deck_id: DeckId,
        now: Timestamp,
    ) -> Fallible<Vec<(Card, ReviewState)>> {
        let conn = self.acquire()?;
        let sql = format!(
            "select {CARD_COLUMNS}, {STATE_COLUMNS} from cards c join review_states s on s.card_id = c.card_id where c.deck_id = ? and s.next_review_at <= ? order by s.next_review_at, c.card_id;"
        );
        let mut stmt = conn.prepare(&sql)?;
        let due = stmt
            .query_map((deck_id, now), read_card_and_state)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(due)
    }

    fn get_card_count(&self, deck_id: DeckId) -> Fallible<usize> {
        let conn = self.acquire()?;
        let sql = "select count(*) from cards where deck_id = ?;";
        let count: i64 = conn.query_row(sql, [deck_id], |row| row.get(0))?;
        Ok(to_count(count))
    }

    fn get_card_count_by_status(&self, deck_id: DeckId, status: CardStatus) -> Fallible<usize> {
        let conn = self.acquire()?;
        let sql = "select count(*) from cards c join review_states s on s.card_id = c.card_id where c.deck_id = ? and s.status = ?;";
        let count: i64 = conn.query_row(sql, (deck_id, status), |row| row.get(0))?;
        Ok(to_count(count))
    }

    fn save_session(&self, session: &SessionRecord) -> Fallible<()> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        let session_id = insert_session(&tx, session)?;
        for review in &session.reviews {
            insert_review(&tx, session_id, review)?;
        }
        tx.commit()?;
        log::debug!(
            "Saved session {session_id} with {} reviews.",
            session.reviews.len()
        );
        Ok(())
    }
}

fn read_deck(row: &Row) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn read_card(row: &Row, start: usize) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(start)?,
        deck_id: row.get(start + 1)?,
        vocab_id: row.get(start + 2)?,
        front: row.get(start + 3)?,
        back: row.get(start + 4)?,
        example: row.get(start + 5)?,
        phonetic: row.get(start + 6)?,
        created_at: row.get(start + 7)?,
    })
}

fn read_state(row: &Row, start: usize) -> rusqlite::Result<ReviewState> {
    Ok(ReviewState {
        card_id: row.get(start)?,
        easiness_factor: row.get(start + 1)?,
        interval: row.get(start + 2)?,
        repetitions: row.get(start + 3)?,
        next_review_date: row.get(start + 4)?,
        last_review_date: row.get(start + 5)?,
        status: row.get(start + 6)?,
    })
}

fn read_card_and_state(row: &Row) -> rusqlite::Result<(Card, ReviewState)> {
    Ok((read_card(row, 0)?, read_state(row, 8)?))
}

fn upsert_state(tx: &Transaction, state: &ReviewState) -> Fallible<()> {
    let sql = "insert into review_states (card_id, easiness_factor, interval_days, repetitions, next_review_at, last_review_at, status) values (?, ?, ?, ?, ?, ?, ?) on conflict (card_id) do update set easiness_factor = excluded.easiness_factor, interval_days = excluded.interval_days, repetitions = excluded.repetitions, next_review_at = excluded.next_review_at, last_review_at = excluded.last_review_at, status = excluded.status;";
    tx.execute(
        sql,
        (
            state.card_id,
            state.easiness_factor,
            state.interval,
            state.repetitions,
            state.next_review_date,
            state.last_review_date,
            state.status,
        ),
    )?;
    Ok(())
}

type SessionId = i64;

fn insert_session(tx: &Transaction, session: &SessionRecord) -> Fallible<SessionId> {
    let sql = "insert into sessions (deck_id, started_at, ended_at) values (?, ?, ?) returning session_id;";
    let session_id: SessionId = tx.query_row(
        sql,
        (session.deck_id, session.started_at, session.ended_at),
        |row| row.get(0),
    )?;
    Ok(session_id)
}

fn insert_review(tx: &Transaction, session_id: SessionId, review: &ReviewRecord) -> Fallible<()> {
    let sql = "insert into reviews (session_id, card_id, reviewed_at, rating, easiness_factor, interval_days, repetitions, next_review_at, status) values (?, ?, ?, ?, ?, ?, ?, ?, ?);";
    tx.execute(
        sql,
        (
            session_id,
            review.card_id,
            review.reviewed_at,
            review.rating,
            review.state.easiness_factor,
            review.state.interval,
            review.state.repetitions,
            review.state.next_review_date,
            review.state.status,
        ),
    )?;
    Ok(())
}

fn deck_exists(tx: &Transaction, deck_id: DeckId) -> Fallible<bool> {
    let sql = "select exists (select 1 from decks where deck_id = ?);";
    let exists: bool = tx.query_row(sql, [deck_id], |row| row.get(0))?;
    Ok(exists)
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}

fn to_count(count: i64) -> usize {
    usize::try_from(count).unwrap_or(0)
}
