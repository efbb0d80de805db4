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

use chrono::TimeDelta;
use tokio::sync::watch;

use crate::due::DueCard;
use crate::due::due_cards;
use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::advance;
use crate::session::stats::SessionStats;
use crate::store::CardStore;
use crate::types::card::Card;
use crate::types::history::ReviewRecord;
use crate::types::history::SessionRecord;
use crate::types::ids::DeckId;
use crate::types::rating::Rating;
use crate::types::review_state::ReviewState;
use crate::types::timestamp::Timestamp;

/// The externally visible state of a study session.
#[derive(Clone, PartialEq, Debug)]
pub enum SessionState {
    /// Not started, or reset.
    Idle,
    /// Started, but no cards were due.
    Empty,
    /// Waiting for a rating of `card`, the card at `position` (counting
    /// from zero) out of `total`.
    Active {
        position: usize,
        total: usize,
        card: Card,
        review_state: ReviewState,
    },
    /// Every card was rated.
    Finished {
        stats: SessionStats,
        duration: TimeDelta,
    },
    /// The due cards could not be loaded. Starting again retries.
    Error { message: String },
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Empty => "empty",
            SessionState::Active { .. } => "active",
            SessionState::Finished { .. } => "finished",
            SessionState::Error { .. } => "error",
        }
    }
}

/// Everything the engine holds while a session is active.
struct SessionSnapshot {
    deck_id: DeckId,
    cards: Vec<DueCard>,
    position: usize,
    stats: SessionStats,
    started_at: Timestamp,
    reviews: Vec<ReviewRecord>,
}

impl SessionSnapshot {
    fn active_state(&self) -> Option<SessionState> {
        self.cards.get(self.position).map(|due| SessionState::Active {
            position: self.position,
            total: self.cards.len(),
            card: due.card.clone(),
            review_state: due.state.clone(),
        })
    }
}

/// Drives one learner through the cards due in a deck.
///
/// The in-memory transition always happens before the store is written to.
/// Writes that fail are logged and kept, and retried on the next submit,
/// when the session finishes or resets, and on [`StudySession::flush`].
pub struct StudySession<S> {
    store: S,
    snapshot: Option<SessionSnapshot>,
    state: watch::Sender<SessionState>,
    pending: Vec<ReviewState>,
}

impl<S: CardStore> StudySession<S> {
    pub fn new(store: S) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            store,
            snapshot: None,
            state,
            pending: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch the session state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The running statistics, while a session is active.
    pub fn stats(&self) -> Option<&SessionStats> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.stats)
    }

    /// The number of review states waiting to be written to the store.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Load the cards due in `deck_id` and begin reviewing them.
    pub fn start(&mut self, deck_id: DeckId, now: Timestamp) -> Fallible<()> {
        {
            let current = self.state.borrow();
            match &*current {
                SessionState::Idle | SessionState::Error { .. } => {}
                SessionState::Active { .. } => return fail("a study session is already active."),
                other => {
                    return fail(format!(
                        "the study session is {}; reset it before starting again.",
                        other.name()
                    ));
                }
            }
        }
        let cards = match due_cards(&self.store, deck_id, now) {
            Ok(cards) => cards,
            Err(e) => {
                log::error!("Failed to load due cards for deck {deck_id}: {e}");
                self.snapshot = None;
                self.publish(SessionState::Error {
                    message: e.message().to_string(),
                });
                return Err(e);
            }
        };
        if cards.is_empty() {
            log::debug!("No cards due in deck {deck_id}.");
            self.snapshot = None;
            self.publish(SessionState::Empty);
            return Ok(());
        }
        log::debug!("Starting session with {} cards.", cards.len());
        let snapshot = SessionSnapshot {
            deck_id,
            cards,
            position: 0,
            stats: SessionStats::default(),
            started_at: now,
            reviews: Vec::new(),
        };
        if let Some(state) = snapshot.active_state() {
            self.publish(state);
        }
        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Rate the current card and move on to the next one.
    pub fn submit(&mut self, rating: Rating, now: Timestamp) -> Fallible<()> {
        let Some(mut snapshot) = self.snapshot.take() else {
            let current = self.state.borrow().name();
            return fail(format!(
                "cannot rate a card: the study session is {current}."
            ));
        };
        if snapshot.position >= snapshot.cards.len() {
            self.snapshot = Some(snapshot);
            return fail("the study session has no current card.");
        }
        let current = &snapshot.cards[snapshot.position];
        let card_id = current.card.id;
        let next = advance(&current.state, rating, now);
        log::debug!(
            "card {card_id} {rating} EF={:.2} I={}d R={} due={}",
            next.easiness_factor,
            next.interval,
            next.repetitions,
            next.next_review_date
        );
        snapshot.stats.record(rating);
        snapshot.reviews.push(ReviewRecord {
            card_id,
            reviewed_at: now,
            rating,
            state: next.clone(),
        });
        snapshot.position += 1;

        match snapshot.active_state() {
            Some(state) => {
                self.snapshot = Some(snapshot);
                self.publish(state);
                self.persist(next);
            }
            None => {
                log::debug!("Session completed");
                self.publish(SessionState::Finished {
                    stats: snapshot.stats,
                    duration: now.since(snapshot.started_at),
                });
                self.persist(next);
                let record = SessionRecord {
                    deck_id: snapshot.deck_id,
                    started_at: snapshot.started_at,
                    ended_at: now,
                    reviews: snapshot.reviews,
                };
                if let Err(e) = self.store.save_session(&record) {
                    log::warn!("Failed to save session history: {e}");
                }
            }
        }
        Ok(())
    }

    /// Abandon the session, if any, and return to the idle state.
    pub fn reset(&mut self) {
        self.retry_pending();
        if self.snapshot.take().is_some() {
            log::debug!("Session aborted.");
        }
        self.publish(SessionState::Idle);
    }

    /// Retry every queued write. Fails if any are still outstanding.
    pub fn flush(&mut self) -> Fallible<()> {
        self.retry_pending();
        match self.pending.len() {
            0 => Ok(()),
            n => fail(format!("{n} review states could not be saved.")),
        }
    }

    fn publish(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    fn persist(&mut self, state: ReviewState) {
        // A newer state for the same card supersedes a queued one.
        self.pending.retain(|queued| queued.card_id != state.card_id);
        self.retry_pending();
        if let Err(e) = self.store.put_review_state(&state) {
            log::warn!(
                "Failed to save review state for card {}: {e}",
                state.card_id
            );
            self.pending.push(state);
        }
    }

    fn retry_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        for state in pending {
            if let Err(e) = self.store.put_review_state(&state) {
                log::warn!("Retry failed for card {}: {e}", state.card_id);
                self.pending.push(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::error::ErrorReport;
    use crate::scheduler::initialize;
    use crate::store::memory::MemoryStore;
    use crate::types::card::NewCard;
    use crate::types::card_status::CardStatus;
    use crate::types::history::SessionRecord;
    use crate::types::ids::CardId;

    /// A memory store whose reads and writes can be made to fail.
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl FlakyStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
            }
        }
    }

    impl CardStore for FlakyStore {
        fn get_review_state(&self, card_id: CardId) -> Fallible<Option<ReviewState>> {
            self.inner.get_review_state(card_id)
        }

        fn put_review_state(&self, state: &ReviewState) -> Fallible<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(ErrorReport::new("disk full"));
            }
            self.inner.put_review_state(state)
        }

        fn get_cards_due_before(
            &self,
            deck_id: DeckId,
            now: Timestamp,
        ) -> Fallible<Vec<(Card, ReviewState)>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(ErrorReport::new("storage unavailable"));
            }
            self.inner.get_cards_due_before(deck_id, now)
        }

        fn get_card_count(&self, deck_id: DeckId) -> Fallible<usize> {
            self.inner.get_card_count(deck_id)
        }

        fn get_card_count_by_status(
            &self,
            deck_id: DeckId,
            status: CardStatus,
        ) -> Fallible<usize> {
            self.inner.get_card_count_by_status(deck_id, status)
        }

        fn save_session(&self, session: &SessionRecord) -> Fallible<()> {
            self.inner.save_session(session)
        }
    }

    const DECK: DeckId = DeckId::new(1);

    fn t0() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 4, 2, 18, 0, 0).unwrap())
    }

    fn store_with(n: i64) -> Fallible<MemoryStore> {
        let store = MemoryStore::new();
        for id in 1..=n {
            let card = NewCard::new(format!("word {id}"), format!("meaning {id}"))
                .into_card(CardId::new(id), DECK, t0());
            let state = initialize(card.id, t0());
            store.insert(card, state)?;
        }
        Ok(store)
    }

    fn position(session: &StudySession<impl CardStore>) -> Option<(usize, i64)> {
        match session.state() {
            SessionState::Active { position, card, .. } => Some((position, card.id.into_inner())),
            _ => None,
        }
    }

    #[test]
    fn test_start_with_no_due_cards() -> Fallible<()> {
        let mut session = StudySession::new(MemoryStore::new());
        session.start(DECK, t0())?;
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.submit(Rating::Good, t0()).is_err());
        Ok(())
    }

    #[test]
    fn test_session_walks_cards_in_order() -> Fallible<()> {
        let mut session = StudySession::new(store_with(3)?);
        assert_eq!(session.state(), SessionState::Idle);
        session.start(DECK, t0())?;
        assert_eq!(position(&session), Some((0, 1)));
        session.submit(Rating::Good, t0())?;
        assert_eq!(position(&session), Some((1, 2)));
        session.submit(Rating::Again, t0())?;
        assert_eq!(position(&session), Some((2, 3)));
        assert_eq!(session.stats().map(|s| s.cards_studied), Some(2));
        Ok(())
    }

    #[test]
    fn test_n_submits_finish_n_cards() -> Fallible<()> {
        for n in 1..=5 {
            let mut session = StudySession::new(store_with(n)?);
            session.start(DECK, t0())?;
            for i in 0..n {
                assert!(matches!(session.state(), SessionState::Active { .. }));
                let now = Timestamp::new(t0().into_inner() + TimeDelta::seconds(10 * (i + 1)));
                session.submit(Rating::Easy, now)?;
            }
            match session.state() {
                SessionState::Finished { stats, duration } => {
                    assert_eq!(stats.cards_studied, n as usize);
                    assert_eq!(stats.easy, n as usize);
                    assert_eq!(duration, TimeDelta::seconds(10 * n));
                }
                other => panic!("expected a finished session, got {other:?}"),
            }
            assert!(session.submit(Rating::Good, t0()).is_err());
        }
        Ok(())
    }

    #[test]
    fn test_submit_persists_new_state() -> Fallible<()> {
        let mut session = StudySession::new(store_with(2)?);
        session.start(DECK, t0())?;
        session.submit(Rating::Good, t0())?;
        let stored = session.store().get_review_state(CardId::new(1))?;
        let stored = stored.ok_or_else(|| ErrorReport::new("missing state"))?;
        assert_eq!(stored.repetitions, 1);
        assert_eq!(stored.status, CardStatus::Learning);
        assert_eq!(stored.next_review_date, t0().plus_days(1));
        Ok(())
    }

    #[test]
    fn test_finished_session_is_recorded() -> Fallible<()> {
        let store = store_with(2)?;
        let mut session = StudySession::new(&store);
        session.start(DECK, t0())?;
        session.submit(Rating::Hard, t0())?;
        session.submit(Rating::Good, t0().plus_days(0))?;
        let sessions = store.sessions()?;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].deck_id, DECK);
        assert_eq!(sessions[0].reviews.len(), 2);
        assert_eq!(sessions[0].reviews[0].rating, Rating::Hard);
        assert_eq!(sessions[0].reviews[1].state.repetitions, 1);
        Ok(())
    }

    #[test]
    fn test_misuse_is_rejected() -> Fallible<()> {
        let mut session = StudySession::new(store_with(1)?);
        let err = session.submit(Rating::Good, t0()).err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some("error: cannot rate a card: the study session is idle.".to_string())
        );
        session.start(DECK, t0())?;
        let before = session.state();
        let err = session.start(DECK, t0()).err();
        assert_eq!(
            err.map(|e| e.to_string()),
            Some("error: a study session is already active.".to_string())
        );
        assert_eq!(session.state(), before);
        session.submit(Rating::Good, t0())?;
        assert!(session.start(DECK, t0()).is_err());
        Ok(())
    }

    #[test]
    fn test_reset_and_restart() -> Fallible<()> {
        let mut session = StudySession::new(store_with(3)?);
        session.start(DECK, t0())?;
        session.submit(Rating::Good, t0())?;
        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.stats().is_none());
        // The card rated before the reset is no longer due.
        session.start(DECK, t0())?;
        assert_eq!(position(&session), Some((0, 2)));
        match session.state() {
            SessionState::Active { total, .. } => assert_eq!(total, 2),
            other => panic!("expected an active session, got {other:?}"),
        }
        assert_eq!(session.stats().map(|s| s.cards_studied), Some(0));
        Ok(())
    }

    #[test]
    fn test_due_set_failure_is_retryable() -> Fallible<()> {
        let store = FlakyStore::new(store_with(1)?);
        store.fail_reads.store(true, Ordering::SeqCst);
        let mut session = StudySession::new(&store);
        assert!(session.start(DECK, t0()).is_err());
        assert_eq!(
            session.state(),
            SessionState::Error {
                message: "storage unavailable".to_string()
            }
        );
        store.fail_reads.store(false, Ordering::SeqCst);
        session.start(DECK, t0())?;
        assert_eq!(position(&session), Some((0, 1)));
        Ok(())
    }

    #[test]
    fn test_failed_write_does_not_block_and_is_retried() -> Fallible<()> {
        let store = FlakyStore::new(store_with(3)?);
        let mut session = StudySession::new(&store);
        session.start(DECK, t0())?;
        store.fail_writes.store(true, Ordering::SeqCst);
        session.submit(Rating::Good, t0())?;
        assert_eq!(position(&session), Some((1, 2)));
        assert_eq!(session.pending_writes(), 1);
        assert!(session.flush().is_err());

        store.fail_writes.store(false, Ordering::SeqCst);
        session.submit(Rating::Good, t0())?;
        assert_eq!(session.pending_writes(), 0);
        let first = store.get_review_state(CardId::new(1))?;
        assert_eq!(first.map(|s| s.repetitions), Some(1));
        Ok(())
    }

    #[test]
    fn test_pending_write_survives_reset() -> Fallible<()> {
        let store = FlakyStore::new(store_with(2)?);
        let mut session = StudySession::new(&store);
        session.start(DECK, t0())?;
        store.fail_writes.store(true, Ordering::SeqCst);
        session.submit(Rating::Easy, t0())?;
        session.reset();
        assert_eq!(session.pending_writes(), 1);
        store.fail_writes.store(false, Ordering::SeqCst);
        session.flush()?;
        assert_eq!(session.pending_writes(), 0);
        let first = store.get_review_state(CardId::new(1))?;
        assert_eq!(first.map(|s| s.status), Some(CardStatus::Learning));
        Ok(())
    }

    #[test]
    fn test_subscribers_see_transitions() -> Fallible<()> {
        let mut session = StudySession::new(store_with(1)?);
        let mut rx = session.subscribe();
        assert_eq!(*rx.borrow_and_update(), SessionState::Idle);
        session.start(DECK, t0())?;
        assert!(rx.has_changed().unwrap_or(false));
        assert!(matches!(
            *rx.borrow_and_update(),
            SessionState::Active { position: 0, total: 1, .. }
        ));
        session.submit(Rating::Good, t0())?;
        assert!(matches!(*rx.borrow(), SessionState::Finished { .. }));
        Ok(())
    }
}
