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

//! A study session owned by a background task, for hosts that share it
//! between threads.

use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tokio::sync::watch;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::session::engine::SessionState;
use crate::session::engine::StudySession;
use crate::store::CardStore;
use crate::types::ids::DeckId;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

enum Command {
    Start {
        deck_id: DeckId,
        now: Timestamp,
        reply: oneshot::Sender<Fallible<()>>,
    },
    Submit {
        rating: Rating,
        now: Timestamp,
        reply: oneshot::Sender<Fallible<()>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Flush {
        reply: oneshot::Sender<Fallible<()>>,
    },
}

/// A cloneable handle to a study session running on a blocking task.
/// Commands are applied one at a time, in the order they are received.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// Must be called from within a tokio runtime. The task stops once every
    /// handle is dropped.
    pub fn spawn<S: CardStore + Send + 'static>(store: S) -> Self {
        let session = StudySession::new(store);
        let state = session.subscribe();
        let (commands, rx) = mpsc::channel(16);
        tokio::task::spawn_blocking(move || run(session, rx));
        Self { commands, state }
    }

    pub async fn start(&self, deck_id: DeckId, now: Timestamp) -> Fallible<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start {
            deck_id,
            now,
            reply,
        })
        .await?;
        rx.await?
    }

    pub async fn submit(&self, rating: Rating, now: Timestamp) -> Fallible<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit { rating, now, reply }).await?;
        rx.await?
    }

    pub async fn reset(&self) -> Fallible<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Reset { reply }).await?;
        rx.await?;
        Ok(())
    }

    pub async fn flush(&self) -> Fallible<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Flush { reply }).await?;
        rx.await?
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    async fn send(&self, command: Command) -> Fallible<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ErrorReport::new("study session has shut down."))
    }
}

fn run<S: CardStore>(mut session: StudySession<S>, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.blocking_recv() {
        // A dropped reply receiver means the caller stopped waiting.
        match command {
            Command::Start {
                deck_id,
                now,
                reply,
            } => {
                let _ = reply.send(session.start(deck_id, now));
            }
            Command::Submit { rating, now, reply } => {
                let _ = reply.send(session.submit(rating, now));
            }
            Command::Reset { reply } => {
                session.reset();
                let _ = reply.send(());
            }
            Command::Flush { reply } => {
                let _ = reply.send(session.flush());
            }
        }
    }
    if let Err(e) = session.flush() {
        log::error!("Study session stopped with unsaved reviews: {e}");
    }
    log::debug!("Study session task stopped.");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::scheduler::initialize;
    use crate::store::memory::MemoryStore;
    use crate::types::card::NewCard;
    use crate::types::ids::CardId;

    fn store(n: i64, now: Timestamp) -> Fallible<Arc<MemoryStore>> {
        let store = MemoryStore::new();
        for id in 1..=n {
            let card = NewCard::new(format!("w{id}"), "m").into_card(
                CardId::new(id),
                DeckId::new(1),
                now,
            );
            store.insert(card, initialize(CardId::new(id), now))?;
        }
        Ok(Arc::new(store))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drive_session_through_handle() -> Fallible<()> {
        let now = Timestamp::now();
        let store = store(2, now)?;
        let handle = SessionHandle::spawn(store.clone());
        assert_eq!(handle.state(), SessionState::Idle);

        handle.start(DeckId::new(1), now).await?;
        assert!(matches!(
            handle.state(),
            SessionState::Active { position: 0, .. }
        ));
        assert!(handle.start(DeckId::new(1), now).await.is_err());

        handle.submit(Rating::Good, now).await?;
        handle.submit(Rating::Again, now).await?;
        match handle.state() {
            SessionState::Finished { stats, .. } => {
                assert_eq!(stats.cards_studied, 2);
                assert_eq!(stats.accuracy(), 0.5);
            }
            other => panic!("expected a finished session, got {other:?}"),
        }
        handle.flush().await?;
        assert_eq!(store.sessions()?.len(), 1);

        handle.reset().await?;
        assert_eq!(handle.state(), SessionState::Idle);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_submits_are_serialized() -> Fallible<()> {
        let now = Timestamp::now();
        let handle = SessionHandle::spawn(store(8, now)?);
        handle.start(DeckId::new(1), now).await?;
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle.submit(Rating::Good, now).await
            }));
        }
        for task in tasks {
            task.await??;
        }
        match handle.state() {
            SessionState::Finished { stats, .. } => assert_eq!(stats.cards_studied, 8),
            other => panic!("expected a finished session, got {other:?}"),
        }
        Ok(())
    }
}
