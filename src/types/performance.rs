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

use serde::Serialize;

use crate::types::rating::Rating;
use crate::types::set::SetId;
use crate::types::timestamp::Timestamp;

/// Ratings at or above this many half points extend the streak.
const STREAK_MIN_HALVES: u8 = 9;

/// Identifies the performance record of one card: `{set_id}_{card_index}`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RecordKey {
    pub set_id: SetId,
    pub card_index: usize,
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}_{}", self.set_id, self.card_index)
    }
}

/// How well the learner knows one card.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub set_id: SetId,
    pub card_index: usize,
    /// The most recent rating. Not an average.
    pub rating: Rating,
    pub total_reviews: usize,
    pub rating_sum: f64,
    pub last_reviewed: Timestamp,
    /// Number of consecutive reviews rated 4.5 or higher.
    pub streak: usize,
}

impl PerformanceRecord {
    /// Apply one review to a card's record, creating the record if this is
    /// the card's first review.
    pub fn reviewed(
        previous: Option<&PerformanceRecord>,
        key: &RecordKey,
        rating: Rating,
        now: Timestamp,
    ) -> Self {
        let (total_reviews, rating_sum, streak) = match previous {
            Some(prev) => (prev.total_reviews, prev.rating_sum, prev.streak),
            None => (0, 0.0, 0),
        };
        let streak = if rating.halves() >= STREAK_MIN_HALVES {
            streak + 1
        } else {
            0
        };
        Self {
            set_id: key.set_id.clone(),
            card_index: key.card_index,
            rating,
            total_reviews: total_reviews + 1,
            rating_sum: rating_sum + rating.value(),
            last_reviewed: now,
            streak,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            set_id: self.set_id.clone(),
            card_index: self.card_index,
        }
    }

    /// Mean of every rating this card has ever received.
    pub fn lifetime_average(&self) -> f64 {
        self.rating_sum / self.total_reviews as f64
    }
}
