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
use chrono::TimeZone;
use chrono::Utc;
use tempfile::tempdir;

use flashdeck::collection::Collection;
use flashdeck::error::ErrorReport;
use flashdeck::error::Fallible;
use flashdeck::session::engine::SessionState;
use flashdeck::session::engine::StudySession;
use flashdeck::store::CardStore;
use flashdeck::types::card::NewCard;
use flashdeck::types::card_status::CardStatus;
use flashdeck::types::rating::Rating;
use flashdeck::types::review_state::ReviewState;
use flashdeck::types::timestamp::Timestamp;

fn day(n: i64) -> Timestamp {
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
    Timestamp::new(t0 + TimeDelta::days(n))
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_good_good_easy_against_sqlite() -> Fallible<()> {
    let dir = tempdir()?;
    let coll = Collection::new(Some(dir.path().display().to_string()))?;
    let db = &coll.db;
    let deck = db.create_deck("Spanish", None, day(0))?;
    let card = db
        .add_card(deck.id, NewCard::new("house", "casa"), day(0))?
        .ok_or_else(|| ErrorReport::new("card was not added"))?;

    let expected: [(i64, Rating, f64, u32, u32, CardStatus); 3] = [
        (0, Rating::Good, 2.36, 1, 1, CardStatus::Learning),
        (1, Rating::Good, 2.22, 6, 2, CardStatus::Learning),
        (7, Rating::Easy, 2.22, 13, 3, CardStatus::Review),
    ];
    for (offset, rating, easiness, interval, repetitions, status) in expected {
        let now = day(offset);
        let mut session = StudySession::new(db);
        session.start(deck.id, now)?;
        match session.state() {
            SessionState::Active { total, card: shown, .. } => {
                assert_eq!(total, 1);
                assert_eq!(shown.id, card.id);
            }
            other => panic!("expected an active session on day {offset}, got {other:?}"),
        }
        session.submit(rating, now)?;
        match session.state() {
            SessionState::Finished { stats, .. } => assert_eq!(stats.cards_studied, 1),
            other => panic!("expected a finished session, got {other:?}"),
        }
        session.flush()?;

        let state: ReviewState = db
            .get_review_state(card.id)?
            .ok_or_else(|| ErrorReport::new("review state missing"))?;
        assert_close(state.easiness_factor, easiness);
        assert_eq!(state.interval, interval);
        assert_eq!(state.repetitions, repetitions);
        assert_eq!(state.status, status);
        assert_eq!(state.next_review_date, now.plus_days(interval));
        assert_eq!(state.last_review_date, Some(now));
    }

    // Not due again until day 20.
    let mut session = StudySession::new(db);
    session.start(deck.id, day(19))?;
    assert_eq!(session.state(), SessionState::Empty);

    let stats = db.deck_stats(deck.id, day(20))?;
    assert_eq!(stats.total_cards, 1);
    assert_eq!(stats.review_cards, 1);
    assert_eq!(stats.due_cards, 1);

    let sessions = db.list_sessions()?;
    assert_eq!(sessions.len(), 3);
    let ratings: Vec<Rating> = sessions
        .iter()
        .flat_map(|s| s.reviews.iter().map(|r| r.rating))
        .collect();
    assert_eq!(ratings, vec![Rating::Good, Rating::Good, Rating::Easy]);
    Ok(())
}

#[test]
fn test_progress_survives_reopening() -> Fallible<()> {
    let dir = tempdir()?;
    let directory = dir.path().display().to_string();
    let deck_id = {
        let coll = Collection::new(Some(directory.clone()))?;
        let deck = coll.db.create_deck("Verbs", None, day(0))?;
        for (front, back) in [("to eat", "comer"), ("to drink", "beber")] {
            coll.db.add_card(deck.id, NewCard::new(front, back), day(0))?;
        }
        let mut session = StudySession::new(&coll.db);
        session.start(deck.id, day(0))?;
        session.submit(Rating::Good, day(0))?;
        session.reset();
        session.flush()?;
        deck.id
    };
    let coll = Collection::new(Some(directory))?;
    let mut session = StudySession::new(&coll.db);
    session.start(deck_id, day(0))?;
    match session.state() {
        SessionState::Active { total, card, .. } => {
            assert_eq!(total, 1);
            assert_eq!(card.front, "to drink");
        }
        other => panic!("expected an active session, got {other:?}"),
    }
    Ok(())
}
