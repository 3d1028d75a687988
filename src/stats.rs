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

//! Read-side statistics derived from stored records and session summaries.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::store::RecordStore;
use crate::types::card::Card;
use crate::types::performance::PerformanceRecord;
use crate::types::session_summary::SessionSummary;
use crate::types::set::Set;
use crate::types::set::SetId;
use crate::types::timestamp::Timestamp;

/// Lower bound (inclusive, in half points) of the strong bucket: 4.
const STRONG_MIN_HALVES: u8 = 8;

/// Lower bound (inclusive, in half points) of the okay bucket: 2.5.
const OKAY_MIN_HALVES: u8 = 5;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct SetOverview {
    pub total: usize,
    pub reviewed: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Mastery {
    /// Mean rating of the reviewed cards as a percentage of 5.
    pub percent: u8,
    pub strong: usize,
    pub okay: usize,
    pub weak: usize,
    pub unreviewed: usize,
}

/// One past session, as shown in a set's history.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub completed_at: Timestamp,
    pub date: String,
    pub total_cards: usize,
    pub avg_rating: f64,
    pub score: u8,
    /// Share of the session's ratings in each band, 0 to 1.
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetail {
    pub card_index: usize,
    pub card: Card,
    pub record: Option<PerformanceRecord>,
}

/// Records keyed by card index. Records pointing past the end of the card
/// list are dropped.
fn index_records<'a>(set: &Set, records: &'a [PerformanceRecord]) -> HashMap<usize, &'a PerformanceRecord> {
    records
        .iter()
        .filter(|r| r.card_index < set.len())
        .map(|r| (r.card_index, r))
        .collect()
}

pub fn set_overview(set: &Set, records: &[PerformanceRecord]) -> SetOverview {
    SetOverview {
        total: set.len(),
        reviewed: index_records(set, records).len(),
    }
}

pub fn mastery(set: &Set, records: &[PerformanceRecord]) -> Mastery {
    let by_index = index_records(set, records);
    let mut m = Mastery {
        percent: 0,
        strong: 0,
        okay: 0,
        weak: 0,
        unreviewed: 0,
    };
    let mut sum_halves: usize = 0;
    for card_index in 0..set.len() {
        match by_index.get(&card_index) {
            None => m.unreviewed += 1,
            Some(record) => {
                let halves = record.rating.halves();
                sum_halves += halves as usize;
                if halves >= STRONG_MIN_HALVES {
                    m.strong += 1;
                } else if halves >= OKAY_MIN_HALVES {
                    m.okay += 1;
                } else {
                    m.weak += 1;
                }
            }
        }
    }
    let reviewed = by_index.len();
    if reviewed > 0 {
        // mean / 5 * 100 == sum_halves / 2 / reviewed * 20.
        m.percent = (sum_halves as f64 * 10.0 / reviewed as f64).round() as u8;
    }
    m
}

/// Past sessions, most recent first.
pub fn session_history(mut sessions: Vec<SessionSummary>) -> Vec<HistoryRow> {
    sessions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    sessions
        .into_iter()
        .map(|s| {
            let share = |count: usize| {
                if s.total_cards == 0 {
                    0.0
                } else {
                    count as f64 / s.total_cards as f64
                }
            };
            HistoryRow {
                completed_at: s.completed_at,
                date: s.completed_at.local_date_string(),
                total_cards: s.total_cards,
                avg_rating: s.avg_rating,
                score: s.score,
                low: share(s.ratings.low),
                mid: share(s.ratings.mid),
                high: share(s.ratings.high),
            }
        })
        .collect()
}

/// Every card with its record, weakest first. Unreviewed cards rank as if
/// rated 0; ties keep card order.
pub fn card_details(set: &Set, records: &[PerformanceRecord]) -> Vec<CardDetail> {
    let by_index = index_records(set, records);
    let mut details: Vec<CardDetail> = set
        .cards
        .iter()
        .enumerate()
        .map(|(card_index, card)| CardDetail {
            card_index,
            card: card.clone(),
            record: by_index.get(&card_index).map(|r| (*r).clone()),
        })
        .collect();
    details.sort_by_key(|d| d.record.as_ref().map_or(0, |r| r.rating.halves()));
    details
}

async fn load_set(store: &dyn RecordStore, set_id: &SetId) -> Fallible<Set> {
    match store.get_set(set_id).await {
        Some(set) => Ok(set),
        None => fail_with(ErrorKind::NotFound, format!("no set with id {set_id}.")),
    }
}

pub async fn get_set_overview(store: &dyn RecordStore, set_id: &SetId) -> Fallible<SetOverview> {
    let set = load_set(store, set_id).await?;
    let records = store.records_for_set(set_id).await;
    Ok(set_overview(&set, &records))
}

pub async fn get_mastery(store: &dyn RecordStore, set_id: &SetId) -> Fallible<Mastery> {
    let set = load_set(store, set_id).await?;
    let records = store.records_for_set(set_id).await;
    Ok(mastery(&set, &records))
}

pub async fn get_session_history(store: &dyn RecordStore, set_id: &SetId) -> Vec<HistoryRow> {
    session_history(store.sessions_for_set(set_id).await)
}

pub async fn get_card_details(store: &dyn RecordStore, set_id: &SetId) -> Fallible<Vec<CardDetail>> {
    let set = load_set(store, set_id).await?;
    let records = store.records_for_set(set_id).await;
    Ok(card_details(&set, &records))
}

/// Forget every record and session of a set. Irreversible.
pub async fn reset_stats(store: &dyn RecordStore, set_id: &SetId) -> Fallible<()> {
    load_set(store, set_id).await?;
    log::debug!("Resetting stats for {set_id}");
    store.reset_stats(set_id).await
}
