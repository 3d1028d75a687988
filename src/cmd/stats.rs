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

use clap::ValueEnum;
use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::stats::CardDetail;
use crate::stats::HistoryRow;
use crate::stats::Mastery;
use crate::stats::SetOverview;
use crate::stats::get_card_details;
use crate::stats::get_mastery;
use crate::stats::get_session_history;
use crate::stats::get_set_overview;
use crate::store::RecordStore;
use crate::types::set::SetId;

/// How many of the weakest cards the text report lists.
const WEAKEST_SHOWN: usize = 10;

#[derive(ValueEnum, Clone, Copy, Default)]
pub enum StatsFormat {
    /// Human-readable output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

impl Display for StatsFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsFormat::Text => write!(f, "text"),
            StatsFormat::Json => write!(f, "json"),
        }
    }
}

pub async fn print_set_stats(
    directory: Option<String>,
    query: String,
    format: StatsFormat,
) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    let set = coll.find_set(&query).await?;
    let stats = get_stats(&coll.store, &set.id, set.name).await?;
    match format {
        StatsFormat::Text => print!("{stats}"),
        StatsFormat::Json => {
            let stats_json = serde_json::to_string_pretty(&stats)?;
            println!("{}", stats_json);
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    set_id: SetId,
    name: String,
    overview: SetOverview,
    mastery: Mastery,
    history: Vec<HistoryRow>,
    cards: Vec<CardDetail>,
}

async fn get_stats(store: &dyn RecordStore, set_id: &SetId, name: String) -> Fallible<Stats> {
    Ok(Stats {
        set_id: set_id.clone(),
        name,
        overview: get_set_overview(store, set_id).await?,
        mastery: get_mastery(store, set_id).await?,
        history: get_session_history(store, set_id).await,
        cards: get_card_details(store, set_id).await?,
    })
}

fn percent(share: f64) -> String {
    format!("{:.0}%", share * 100.0)
}

/// The human-readable report.
impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let m = &self.mastery;
        writeln!(f, "{} ({})", self.name, self.set_id)?;
        writeln!(
            f,
            "Reviewed: {} / {}",
            self.overview.reviewed, self.overview.total
        )?;
        writeln!(f, "Mastery: {}%", m.percent)?;
        writeln!(
            f,
            "Strong: {}  Okay: {}  Weak: {}  Unreviewed: {}",
            m.strong, m.okay, m.weak, m.unreviewed
        )?;
        writeln!(f)?;
        if self.history.is_empty() {
            writeln!(f, "No sessions yet.")?;
        } else {
            writeln!(f, "Sessions:")?;
            for row in &self.history {
                writeln!(
                    f,
                    "  {}  {} cards  avg {:.1}  score {}  low {} mid {} high {}",
                    row.date,
                    row.total_cards,
                    row.avg_rating,
                    row.score,
                    percent(row.low),
                    percent(row.mid),
                    percent(row.high)
                )?;
            }
        }
        let weakest: Vec<&CardDetail> = self
            .cards
            .iter()
            .filter(|d| d.record.is_some())
            .take(WEAKEST_SHOWN)
            .collect();
        if !weakest.is_empty() {
            writeln!(f)?;
            writeln!(f, "Weakest cards:")?;
            for detail in weakest {
                if let Some(record) = &detail.record {
                    writeln!(
                        f,
                        "  {:>3}  {}  rated {} ({} reviews, avg {:.1}, streak {})",
                        detail.card_index + 1,
                        detail.card.front(),
                        record.rating,
                        record.total_reviews,
                        record.lifetime_average(),
                        record.streak
                    )?;
                }
            }
        }
        Ok(())
    }
}
