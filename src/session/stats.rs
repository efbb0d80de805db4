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
use serde::Serialize;

use crate::types::rating::Rating;

/// Running totals for a study session.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Questions answered. A compound question counts once.
    pub cards_studied: usize,
    pub again: usize,
    pub hard: usize,
    pub good: usize,
    pub easy: usize,
}

impl SessionStats {
    /// Count a single card rated `rating`.
    pub fn record(&mut self, rating: Rating) {
        self.count_rating(rating);
        self.cards_studied += 1;
    }

    /// Count one compound question whose underlying cards got `ratings`.
    pub fn record_compound(&mut self, ratings: &[Rating]) {
        if ratings.is_empty() {
            return;
        }
        for rating in ratings {
            self.count_rating(*rating);
        }
        self.cards_studied += 1;
    }

    pub fn count(&self, rating: Rating) -> usize {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }

    pub fn total_reviews(&self) -> usize {
        self.again + self.hard + self.good + self.easy
    }

    /// The fraction of reviews rated `Good` or `Easy`, between 0 and 1.
    pub fn accuracy(&self) -> f64 {
        let total = self.total_reviews();
        if total == 0 {
            0.0
        } else {
            (self.good + self.easy) as f64 / total as f64
        }
    }

    fn count_rating(&mut self, rating: Rating) {
        match rating {
            Rating::Again => self.again += 1,
            Rating::Hard => self.hard += 1,
            Rating::Good => self.good += 1,
            Rating::Easy => self.easy += 1,
        }
    }
}

/// Render a duration as `1h 02m 03s`, `2m 05s`, or `7s`.
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_accuracy_is_zero() {
        let stats = SessionStats::default();
        assert_eq!(stats.accuracy(), 0.0);
        assert_eq!(stats.total_reviews(), 0);
    }

    #[test]
    fn test_record() {
        let mut stats = SessionStats::default();
        for rating in [Rating::Again, Rating::Good, Rating::Easy, Rating::Good] {
            stats.record(rating);
        }
        assert_eq!(stats.cards_studied, 4);
        assert_eq!(stats.count(Rating::Again), 1);
        assert_eq!(stats.count(Rating::Hard), 0);
        assert_eq!(stats.count(Rating::Good), 2);
        assert_eq!(stats.count(Rating::Easy), 1);
        assert_eq!(stats.accuracy(), 0.75);
    }

    #[test]
    fn test_record_compound_counts_one_card() {
        let mut stats = SessionStats::default();
        stats.record_compound(&[Rating::Good, Rating::Again, Rating::Good]);
        stats.record_compound(&[]);
        assert_eq!(stats.cards_studied, 1);
        assert_eq!(stats.total_reviews(), 3);
        assert_eq!(stats.good, 2);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::seconds(7)), "7s");
        assert_eq!(format_duration(TimeDelta::seconds(125)), "2m 05s");
        assert_eq!(format_duration(TimeDelta::seconds(3723)), "1h 02m 03s");
        assert_eq!(format_duration(TimeDelta::seconds(-3)), "0s");
    }
}
