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

use crate::types::rating::Rating;
use crate::types::set::SetId;
use crate::types::timestamp::Timestamp;

/// Upper bound (inclusive, in half points) of the low band: 2.5.
const LOW_MAX_HALVES: u8 = 5;

/// Lower bound (inclusive, in half points) of the high band: 4.
const HIGH_MIN_HALVES: u8 = 8;

/// How many of a session's ratings fell in each band.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct RatingBands {
    /// Ratings of 2.5 or lower.
    pub low: usize,
    /// Ratings above 2.5 and below 4.
    pub mid: usize,
    /// Ratings of 4 or higher.
    pub high: usize,
}

impl RatingBands {
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut bands = Self::default();
        for rating in ratings {
            let halves = rating.halves();
            if halves <= LOW_MAX_HALVES {
                bands.low += 1;
            } else if halves < HIGH_MIN_HALVES {
                bands.mid += 1;
            } else {
                bands.high += 1;
            }
        }
        bands
    }
}

/// The outcome of one completed practice session. Immutable once created.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub set_id: SetId,
    pub completed_at: Timestamp,
    pub total_cards: usize,
    /// Mean rating, rounded to one decimal.
    pub avg_rating: f64,
    pub ratings: RatingBands,
    /// The rounded average as a 0-100 score.
    pub score: u8,
}

impl SessionSummary {
    /// Summarize a session's rating log. Returns `None` if nothing was rated.
    pub fn from_ratings(
        set_id: SetId,
        completed_at: Timestamp,
        ratings: &[Rating],
    ) -> Option<Self> {
        if ratings.is_empty() {
            return None;
        }
        let n = ratings.len();
        let sum_halves: usize = ratings.iter().map(|r| r.halves() as usize).sum();
        // mean = sum_halves / 2n; in tenths that is sum_halves * 5 / n.
        let tenths = (sum_halves as f64 * 5.0 / n as f64).round() as u32;
        let avg_rating = tenths as f64 / 10.0;
        // avg / 5 * 100 == tenths * 2.
        let score = (tenths * 2).min(100) as u8;
        Some(Self {
            set_id,
            completed_at,
            total_cards: n,
            avg_rating,
            ratings: RatingBands::from_ratings(ratings),
            score,
        })
    }
}
