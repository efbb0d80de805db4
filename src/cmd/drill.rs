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

use crate::collection::Collection;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::session::actor::SessionHandle;
use crate::session::engine::SessionState;
use crate::session::stats::SessionStats;
use crate::session::stats::format_duration;
use crate::types::card::Card;
use crate::types::rating::Rating;
use crate::types::timestamp::Timestamp;

enum Input {
    Line(String),
    Quit,
}

pub async fn drill(directory: Option<String>, deck: String) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let deck = coll.resolve_deck(&deck)?;
    let handle = SessionHandle::spawn(coll.db.clone());
    if let Err(e) = handle.start(deck.id, Timestamp::now()).await {
        println!("No cards available, retry.");
        return Err(e);
    }
    loop {
        match handle.state() {
            SessionState::Empty => {
                println!("No cards due in {}.", deck.name);
                break;
            }
            SessionState::Active {
                position,
                total,
                card,
                ..
            } => {
                if !ask(&handle, position, total, &card).await? {
                    handle.reset().await?;
                    println!("Session aborted.");
                    break;
                }
            }
            SessionState::Finished { stats, duration } => {
                for line in summary(&stats, duration) {
                    println!("{line}");
                }
                break;
            }
            SessionState::Idle => return fail("the study session did not start."),
            SessionState::Error { message } => return fail(message),
        }
    }
    handle.flush().await
}

/// Show one card and submit its rating. Returns false if the user quit.
async fn ask(
    handle: &SessionHandle,
    position: usize,
    total: usize,
    card: &Card,
) -> Fallible<bool> {
    println!();
    match &card.phonetic {
        Some(phonetic) => println!(
            "[{}/{}] {} /{}/",
            position + 1,
            total,
            card.front,
            phonetic
        ),
        None => println!("[{}/{}] {}", position + 1, total, card.front),
    }
    println!("[press enter to reveal, q to quit]");
    if let Input::Quit = read_input().await? {
        return Ok(false);
    }
    println!("{}", card.back);
    if let Some(example) = &card.example {
        println!("  {example}");
    }
    loop {
        println!("Rating: (1 = Again, 2 = Hard, 3 = Good, 4 = Easy)");
        let line = match read_input().await? {
            Input::Line(line) => line,
            Input::Quit => return Ok(false),
        };
        match Rating::from_key(&line) {
            Some(rating) => {
                handle.submit(rating, Timestamp::now()).await?;
                return Ok(true);
            }
            None => println!("Invalid input. Please enter a number between 1 and 4."),
        }
    }
}

async fn read_input() -> Fallible<Input> {
    let input = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        let read = std::io::stdin().read_line(&mut line)?;
        Ok::<_, ErrorReport>((read, line))
    })
    .await??;
    let (read, line) = input;
    let line = line.trim();
    if read == 0 || line.eq_ignore_ascii_case("q") {
        Ok(Input::Quit)
    } else {
        Ok(Input::Line(line.to_string()))
    }
}

fn summary(stats: &SessionStats, duration: TimeDelta) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        "Session complete.".to_string(),
        format!("Accuracy: {:.0}%", stats.accuracy() * 100.0),
        format!("Cards studied: {}", stats.cards_studied),
        format!("Duration: {}", format_duration(duration)),
    ];
    for rating in Rating::ALL {
        lines.push(format!("  {rating}: {}", stats.count(rating)));
    }
    lines
}
