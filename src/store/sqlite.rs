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

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::store::RecordStore;
use crate::store::degrade;
use crate::types::card::Card;
use crate::types::performance::PerformanceRecord;
use crate::types::performance::RecordKey;
use crate::types::session_summary::RatingBands;
use crate::types::session_summary::SessionSummary;
use crate::types::set::Set;
use crate::types::set::SetId;

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema in {database_path}");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Run a blocking database operation off the async executor.
    async fn run<T, F>(&self, f: F) -> Fallible<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Fallible<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| {
                ErrorReport::with_kind(ErrorKind::StorageUnavailable, "database lock poisoned.")
            })?;
            f(&mut *conn)
        })
        .await?
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get_set(&self, set_id: &SetId) -> Option<Set> {
        let set_id = set_id.clone();
        let result = self.run(move |conn| select_set(conn, &set_id)).await;
        degrade("set", result)
    }

    async fn list_sets(&self) -> Vec<Set> {
        let result = self.run(|conn| select_sets(conn)).await;
        degrade("sets", result)
    }

    async fn put_set(&self, set: &Set) -> Fallible<()> {
        let set = set.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            upsert_set(&tx, &set)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn replace_sets(&self, sets: &[Set]) -> Fallible<()> {
        let sets = sets.to_vec();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let keep: HashSet<&SetId> = sets.iter().map(|s| &s.id).collect();
            for existing in select_set_ids(&tx)? {
                if !keep.contains(&existing) {
                    log::debug!("Removing set {existing}");
                    tx.execute("delete from sets where set_id = ?;", [&existing])?;
                }
            }
            for set in &sets {
                upsert_set(&tx, set)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete_set(&self, set_id: &SetId) -> Fallible<()> {
        let set_id = set_id.clone();
        self.run(move |conn| {
            // Records and sessions go with it via `on delete cascade`.
            let tx = conn.transaction()?;
            tx.execute("delete from sets where set_id = ?;", [&set_id])?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn records_for_set(&self, set_id: &SetId) -> Vec<PerformanceRecord> {
        let set_id = set_id.clone();
        let result = self.run(move |conn| select_records(conn, &set_id)).await;
        degrade("performance records", result)
    }

    async fn put_record(&self, record: &PerformanceRecord) -> Fallible<()> {
        let record = record.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            upsert_record(&tx, &record)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete_record(&self, key: &RecordKey) -> Fallible<()> {
        let key = key.to_string();
        self.run(move |conn| {
            conn.execute("delete from records where record_key = ?;", [&key])?;
            Ok(())
        })
        .await
    }

    async fn sessions_for_set(&self, set_id: &SetId) -> Vec<SessionSummary> {
        let set_id = set_id.clone();
        let result = self.run(move |conn| select_sessions(conn, &set_id)).await;
        degrade("sessions", result)
    }

    async fn append_session(&self, summary: &SessionSummary) -> Fallible<()> {
        let summary = summary.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let session_id = insert_session(&tx, &summary)?;
            tx.commit()?;
            log::debug!("Saved session {session_id} for set {}", summary.set_id);
            Ok(())
        })
        .await
    }

    async fn reset_stats(&self, set_id: &SetId) -> Fallible<()> {
        let set_id = set_id.clone();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("delete from records where set_id = ?;", [&set_id])?;
            tx.execute("delete from sessions where set_id = ?;", [&set_id])?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

fn select_set(conn: &Connection, set_id: &SetId) -> Fallible<Option<Set>> {
    let sql = "select name, cards from sets where set_id = ?;";
    let row: Option<(String, String)> = conn
        .query_row(sql, [set_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()?;
    match row {
        Some((name, cards)) => {
            let cards = decode_cards(&cards)?;
            Ok(Some(Set::new(set_id.clone(), name, cards)))
        }
        None => Ok(None),
    }
}

fn select_sets(conn: &Connection) -> Fallible<Vec<Set>> {
    let mut sets = Vec::new();
    let mut stmt = conn.prepare("select set_id, name, cards from sets order by name;")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let set_id: SetId = row.get(0)?;
        let name: String = row.get(1)?;
        let cards: String = row.get(2)?;
        let cards = decode_cards(&cards)?;
        sets.push(Set::new(set_id, name, cards));
    }
    Ok(sets)
}

fn decode_cards(json: &str) -> Fallible<Vec<Card>> {
    let cards: Vec<Card> = serde_json::from_str(json)?;
    if let Some(idx) = cards.iter().position(Card::is_blank) {
        return fail_with(
            ErrorKind::StorageUnavailable,
            format!("stored card {idx} has no content."),
        );
    }
    Ok(cards)
}

fn select_set_ids(tx: &Transaction) -> Fallible<Vec<SetId>> {
    let mut ids = Vec::new();
    let mut stmt = tx.prepare("select set_id from sets;")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn upsert_set(tx: &Transaction, set: &Set) -> Fallible<()> {
    let sql = "insert into sets (set_id, name, cards) values (?, ?, ?) on conflict (set_id) do update set name = excluded.name, cards = excluded.cards;";
    let cards: String = serde_json::to_string(&set.cards)?;
    tx.execute(sql, (&set.id, &set.name, &cards))?;
    Ok(())
}

fn select_records(conn: &Connection, set_id: &SetId) -> Fallible<Vec<PerformanceRecord>> {
    let mut records = Vec::new();
    let sql = "select card_index, rating, total_reviews, rating_sum, last_reviewed, streak from records where set_id = ? order by card_index;";
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([set_id])?;
    while let Some(row) = rows.next()? {
        records.push(PerformanceRecord {
            set_id: set_id.clone(),
            card_index: from_sql_count(row.get(0)?)?,
            rating: row.get(1)?,
            total_reviews: from_sql_count(row.get(2)?)?,
            rating_sum: row.get(3)?,
            last_reviewed: row.get(4)?,
            streak: from_sql_count(row.get(5)?)?,
        });
    }
    Ok(records)
}

fn upsert_record(tx: &Transaction, record: &PerformanceRecord) -> Fallible<()> {
    let sql = "insert into records (record_key, set_id, card_index, rating, total_reviews, rating_sum, last_reviewed, streak) values (?, ?, ?, ?, ?, ?, ?, ?) on conflict (record_key) do update set rating = excluded.rating, total_reviews = excluded.total_reviews, rating_sum = excluded.rating_sum, last_reviewed = excluded.last_reviewed, streak = excluded.streak;";
    tx.execute(
        sql,
        (
            record.key().to_string(),
            &record.set_id,
            to_sql_count(record.card_index)?,
            record.rating,
            to_sql_count(record.total_reviews)?,
            record.rating_sum,
            record.last_reviewed,
            to_sql_count(record.streak)?,
        ),
    )?;
    Ok(())
}

fn select_sessions(conn: &Connection, set_id: &SetId) -> Fallible<Vec<SessionSummary>> {
    let mut sessions = Vec::new();
    let sql = "select completed_at, total_cards, avg_rating, low_count, mid_count, high_count, score from sessions where set_id = ? order by session_id;";
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([set_id])?;
    while let Some(row) = rows.next()? {
        sessions.push(SessionSummary {
            set_id: set_id.clone(),
            completed_at: row.get(0)?,
            total_cards: from_sql_count(row.get(1)?)?,
            avg_rating: row.get(2)?,
            ratings: RatingBands {
                low: from_sql_count(row.get(3)?)?,
                mid: from_sql_count(row.get(4)?)?,
                high: from_sql_count(row.get(5)?)?,
            },
            score: row.get(6)?,
        });
    }
    Ok(sessions)
}

type SessionId = i64;

fn insert_session(tx: &Transaction, summary: &SessionSummary) -> Fallible<SessionId> {
    let sql = "insert into sessions (set_id, completed_at, total_cards, avg_rating, low_count, mid_count, high_count, score) values (?, ?, ?, ?, ?, ?, ?, ?) returning session_id;";
    let session_id: SessionId = tx.query_row(
        sql,
        (
            &summary.set_id,
            summary.completed_at,
            to_sql_count(summary.total_cards)?,
            summary.avg_rating,
            to_sql_count(summary.ratings.low)?,
            to_sql_count(summary.ratings.mid)?,
            to_sql_count(summary.ratings.high)?,
            summary.score,
        ),
        |row| row.get(0),
    )?;
    Ok(session_id)
}

/// Counts and indices are `usize` in memory and `integer` in SQLite.
fn to_sql_count(value: usize) -> Fallible<i64> {
    i64::try_from(value).map_err(|_| {
        ErrorReport::with_kind(
            ErrorKind::StorageUnavailable,
            format!("count out of range for the database: {value}."),
        )
    })
}

fn from_sql_count(value: i64) -> Fallible<usize> {
    usize::try_from(value).map_err(|_| {
        ErrorReport::with_kind(
            ErrorKind::StorageUnavailable,
            format!("invalid count in the database: {value}."),
        )
    })
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["sets"], |row| row.get(0))?;
    Ok(count > 0)
}
