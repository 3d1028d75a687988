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

use std::collections::HashMap;
use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;

use crate::types::card::Card;
use crate::types::performance::PerformanceRecord;
use crate::types::set::Set;

/// Ratings at or below this many half points (2.5) count as weak.
const WEAK_MAX_HALVES: u8 = 5;

/// Which cards of a set a session draws from.
#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Filter {
    /// Every card.
    #[default]
    All,
    /// Reviewed cards currently rated 2.5 or lower.
    Weak,
    /// Cards that have never been reviewed.
    Unreviewed,
}

impl Filter {
    pub fn matches(self, record: Option<&PerformanceRecord>) -> bool {
        match self {
            Filter::All => true,
            Filter::Weak => record.is_some_and(|r| r.rating.halves() <= WEAK_MAX_HALVES),
            Filter::Unreviewed => record.is_none(),
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Weak => write!(f, "weak"),
            Filter::Unreviewed => write!(f, "unreviewed"),
        }
    }
}

/// A card considered for a session, with its record if it has one.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub card_index: usize,
    pub card: Card,
    pub record: Option<PerformanceRecord>,
}

/// Join a set's cards with their records and keep the ones `filter` admits,
/// in card order.
pub fn build_pool(set: &Set, records: Vec<PerformanceRecord>, filter: Filter) -> Vec<Candidate> {
    let mut by_index: HashMap<usize, PerformanceRecord> = records
        .into_iter()
        .map(|record| (record.card_index, record))
        .collect();
    set.cards
        .iter()
        .enumerate()
        .map(|(card_index, card)| Candidate {
            card_index,
            card: card.clone(),
            record: by_index.remove(&card_index),
        })
        .filter(|candidate| filter.matches(candidate.record.as_ref()))
        .collect()
}
