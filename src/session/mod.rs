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

pub mod filter;

use rand::Rng;

use crate::error::ErrorKind;
use crate::error::Fallible;
use crate::error::fail_with;
use crate::sampler::review_weight;
use crate::sampler::weighted_order;
use crate::session::filter::Candidate;
use crate::session::filter::Filter;
use crate::session::filter::build_pool;
use crate::store::RecordStore;
use crate::types::performance::PerformanceRecord;
use crate::types::performance::RecordKey;
use crate::types::rating::Rating;
use crate::types::session_summary::SessionSummary;
use crate::types::set::SetId;
use crate::types::timestamp::Timestamp;

/// Where a session is in its card loop. A session that has not been started
/// does not exist, and rating is instantaneous, so neither has a variant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    /// The front of the current card is showing.
    Presenting,
    /// Both sides of the current card are showing.
    Revealed,
    /// Terminal.
    Finished,
}

/// Position within the session: `current` is 1-based.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// What a rating step did.
#[derive(Clone, Debug)]
pub struct RateOutcome {
    /// The card's updated record.
    pub record: PerformanceRecord,
    /// False if any write in this step failed. The failed writes are queued
    /// on the session; see [`ReviewSession::retry_pending`].
    pub persisted: bool,
    /// Present if this was the last card.
    pub summary: Option<SessionSummary>,
}

/// A write the store rejected, kept for retry.
#[derive(Clone, Debug)]
enum PendingWrite {
    Record(PerformanceRecord),
    DeleteRecord(RecordKey),
    Summary(SessionSummary),
}

impl PendingWrite {
    fn touches(&self, key: &RecordKey) -> bool {
        match self {
            PendingWrite::Record(record) => &record.key() == key,
            PendingWrite::DeleteRecord(k) => k == key,
            PendingWrite::Summary(_) => false,
        }
    }

    async fn apply(&self, store: &dyn RecordStore) -> Fallible<()> {
        match self {
            PendingWrite::Record(record) => store.put_record(record).await,
            PendingWrite::DeleteRecord(key) => store.delete_record(key).await,
            PendingWrite::Summary(summary) => store.append_session(summary).await,
        }
    }
}

/// Enough to take back one rating.
struct Step {
    position: usize,
    previous: Option<PerformanceRecord>,
}

/// One practice run over a set.
pub struct ReviewSession {
    set_id: SetId,
    set_name: String,
    filter: Filter,
    candidates: Vec<Candidate>,
    position: usize,
    phase: Phase,
    ratings: Vec<Rating>,
    steps: Vec<Step>,
    pending: Vec<PendingWrite>,
    summary: Option<SessionSummary>,
}

impl ReviewSession {
    /// Begin a session over the cards of `set_id` that `filter` admits,
    /// ordered so that weak cards tend to come first.
    pub async fn start<R>(
        store: &dyn RecordStore,
        set_id: &SetId,
        filter: Filter,
        rng: &mut R,
    ) -> Fallible<Self>
    where
        R: Rng + ?Sized + Send,
    {
        let set = match store.get_set(set_id).await {
            Some(set) => set,
            None => return fail_with(ErrorKind::NotFound, format!("no set with id {set_id}.")),
        };
        let records = store.records_for_set(set_id).await;
        let pool = build_pool(&set, records, filter);
        if pool.is_empty() {
            return fail_with(
                ErrorKind::EmptyPool,
                format!("no cards in \"{}\" match the filter `{filter}`.", set.name),
            );
        }
        let candidates = weighted_order(
            pool,
            |c| review_weight(c.record.as_ref().map(|r| r.rating)),
            rng,
        );
        log::debug!(
            "Starting session on {} ({filter}) with {} cards",
            set.id,
            candidates.len()
        );
        Ok(Self {
            set_id: set.id,
            set_name: set.name,
            filter,
            candidates,
            position: 0,
            phase: Phase::Presenting,
            ratings: Vec::new(),
            steps: Vec::new(),
            pending: Vec::new(),
            summary: None,
        })
    }

    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// The card being shown, or `None` once the session is finished.
    pub fn current(&self) -> Option<&Candidate> {
        if self.is_finished() {
            None
        } else {
            self.candidates.get(self.position)
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            current: self.position + 1,
            total: self.candidates.len(),
        }
    }

    /// Ratings given so far, in order.
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        !self.is_finished() && !self.steps.is_empty()
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    pub fn reveal(&mut self) -> Fallible<()> {
        if self.phase != Phase::Presenting {
            return fail_with(
                ErrorKind::InvalidTransition,
                format!("cannot reveal a card while {:?}.", self.phase),
            );
        }
        self.phase = Phase::Revealed;
        Ok(())
    }

    /// Rate the revealed card and move on.
    ///
    /// The in-memory record is updated even if the store rejects the write;
    /// in that case the outcome reports `persisted == false` and the write is
    /// queued.
    pub async fn rate(&mut self, store: &dyn RecordStore, value: f64) -> Fallible<RateOutcome> {
        if self.phase != Phase::Revealed {
            return fail_with(
                ErrorKind::InvalidTransition,
                format!("cannot rate a card while {:?}.", self.phase),
            );
        }
        let rating = Rating::new(value)?;
        self.ratings.push(rating);

        let candidate = &mut self.candidates[self.position];
        let key = RecordKey {
            set_id: self.set_id.clone(),
            card_index: candidate.card_index,
        };
        let previous = candidate.record.take();
        let record = PerformanceRecord::reviewed(previous.as_ref(), &key, rating, Timestamp::now());
        candidate.record = Some(record.clone());
        self.steps.push(Step {
            position: self.position,
            previous,
        });

        let mut persisted = true;
        if let Err(e) = store.put_record(&record).await {
            log::warn!("Failed to save the record for {key}: {e}");
            self.pending.push(PendingWrite::Record(record.clone()));
            persisted = false;
        }

        let summary = if self.position + 1 < self.candidates.len() {
            self.position += 1;
            self.phase = Phase::Presenting;
            None
        } else {
            persisted &= self.finish(store).await;
            self.summary.clone()
        };
        Ok(RateOutcome {
            record,
            persisted,
            summary,
        })
    }

    /// Take back the last rating: restore the card's previous record and
    /// present it again. Returns whether the store accepted the restore.
    pub async fn undo(&mut self, store: &dyn RecordStore) -> Fallible<bool> {
        if self.is_finished() {
            return fail_with(ErrorKind::InvalidTransition, "session is finished.");
        }
        let step = match self.steps.pop() {
            Some(step) => step,
            None => return fail_with(ErrorKind::InvalidTransition, "nothing to undo."),
        };
        self.ratings.pop();
        let candidate = &mut self.candidates[step.position];
        let key = RecordKey {
            set_id: self.set_id.clone(),
            card_index: candidate.card_index,
        };
        candidate.record = step.previous.clone();
        self.position = step.position;
        self.phase = Phase::Presenting;

        // A queued write for this card is superseded by the restore.
        self.pending.retain(|w| !w.touches(&key));
        let restore = match step.previous {
            Some(record) => PendingWrite::Record(record),
            None => PendingWrite::DeleteRecord(key.clone()),
        };
        match restore.apply(store).await {
            Ok(()) => Ok(true),
            Err(e) => {
                log::warn!("Failed to restore the record for {key}: {e}");
                self.pending.push(restore);
                Ok(false)
            }
        }
    }

    /// Finish early. The summary covers the cards rated so far; if none
    /// were, no summary is recorded.
    pub async fn end(&mut self, store: &dyn RecordStore) -> Fallible<Option<SessionSummary>> {
        if self.is_finished() {
            return fail_with(ErrorKind::InvalidTransition, "session is already finished.");
        }
        self.finish(store).await;
        Ok(self.summary.clone())
    }

    /// Re-attempt queued writes in order, stopping at the first failure.
    /// Returns how many are still queued.
    pub async fn retry_pending(&mut self, store: &dyn RecordStore) -> usize {
        let mut remaining = Vec::new();
        let mut failed = false;
        for write in self.pending.drain(..) {
            if failed {
                remaining.push(write);
                continue;
            }
            if let Err(e) = write.apply(store).await {
                log::warn!("Retry failed: {e}");
                failed = true;
                remaining.push(write);
            }
        }
        self.pending = remaining;
        self.pending.len()
    }

    /// Enter the terminal phase and record the summary. Returns whether the
    /// summary was saved (trivially true if there is none).
    async fn finish(&mut self, store: &dyn RecordStore) -> bool {
        self.phase = Phase::Finished;
        self.summary =
            SessionSummary::from_ratings(self.set_id.clone(), Timestamp::now(), &self.ratings);
        let summary = match &self.summary {
            Some(summary) => summary.clone(),
            None => {
                log::debug!("Session on {} ended with no ratings", self.set_id);
                return true;
            }
        };
        log::debug!(
            "Session on {} completed: {} cards, average {}",
            self.set_id,
            summary.total_cards,
            summary.avg_rating
        );
        match store.append_session(&summary).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save the session summary: {e}");
                self.pending.push(PendingWrite::Summary(summary));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::helper::sample_record;
    use crate::helper::sample_set;
    use crate::store::memory::MemoryStore;
    use crate::store::sqlite::SqliteStore;
    use crate::types::session_summary::RatingBands;
    use crate::types::set::Set;

    async fn store_with(set: &Set, records: &[PerformanceRecord]) -> Fallible<MemoryStore> {
        let store = MemoryStore::with_sets(vec![set.clone()]);
        for record in records {
            store.put_record(record).await?;
        }
        Ok(store)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1234)
    }

    #[tokio::test]
    async fn test_unreviewed_scenario() -> Fallible<()> {
        let set = sample_set("Four", 4)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::Unreviewed, &mut rng()).await?;
        assert_eq!(session.progress(), Progress { current: 1, total: 4 });
        let mut order = Vec::new();
        let mut last = None;
        for (i, value) in [0.5, 5.0, 3.0, 4.0].into_iter().enumerate() {
            assert_eq!(session.progress().current, i + 1);
            order.push(session.current().expect("card").card_index);
            session.reveal()?;
            let outcome = session.rate(&store, value).await?;
            assert!(outcome.persisted);
            last = Some(outcome);
        }
        let summary = last.and_then(|o| o.summary).expect("summary");
        assert_eq!(summary.total_cards, 4);
        assert_eq!(summary.avg_rating, 3.1);
        assert_eq!(
            summary.ratings,
            RatingBands {
                low: 1,
                mid: 1,
                high: 2
            }
        );
        assert_eq!(summary.score, 62);
        assert!(session.is_finished());
        assert!(session.current().is_none());
        assert_eq!(store.sessions_for_set(&set.id).await, vec![summary]);

        order.sort();
        assert_eq!(order, vec![0, 1, 2, 3]);
        let records = store.records_for_set(&set.id).await;
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.total_reviews == 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_rate_requires_reveal() -> Fallible<()> {
        let set = sample_set("Two", 2)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        let err = session.rate(&store, 3.0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert!(session.ratings().is_empty());
        assert!(store.records_for_set(&set.id).await.is_empty());
        assert_eq!(session.phase(), Phase::Presenting);
        Ok(())
    }

    #[tokio::test]
    async fn test_reveal_twice_fails() -> Fallible<()> {
        let set = sample_set("Two", 2)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        session.reveal()?;
        let err = session.reveal().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(session.phase(), Phase::Revealed);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_rating_is_rejected() -> Fallible<()> {
        let set = sample_set("Two", 2)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        session.reveal()?;
        let err = session.rate(&store, 3.2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRating);
        assert!(session.ratings().is_empty());
        assert!(store.records_for_set(&set.id).await.is_empty());
        assert_eq!(session.phase(), Phase::Revealed);
        Ok(())
    }

    #[tokio::test]
    async fn test_weak_filter_with_no_weak_cards() -> Fallible<()> {
        let set = sample_set("Two", 2)?;
        let records = [
            sample_record(&set.id, 0, 3.0)?,
            sample_record(&set.id, 1, 5.0)?,
        ];
        let store = store_with(&set, &records).await?;
        let result = ReviewSession::start(&store, &set.id, Filter::Weak, &mut rng()).await;
        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::EmptyPool));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_set() -> Fallible<()> {
        let store = MemoryStore::new();
        let result =
            ReviewSession::start(&store, &SetId::new("missing")?, Filter::All, &mut rng()).await;
        assert_eq!(result.err().map(|e| e.kind()), Some(ErrorKind::NotFound));
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_record_is_updated() -> Fallible<()> {
        let set = sample_set("One", 1)?;
        let mut record = sample_record(&set.id, 0, 4.5)?;
        record.streak = 3;
        let store = store_with(&set, &[record]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        session.reveal()?;
        let outcome = session.rate(&store, 5.0).await?;
        assert_eq!(outcome.record.total_reviews, 2);
        assert_eq!(outcome.record.rating_sum, 9.5);
        assert_eq!(outcome.record.streak, 4);
        assert_eq!(store.records_for_set(&set.id).await, vec![outcome.record]);
        Ok(())
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_and_retried() -> Fallible<()> {
        let set = sample_set("Two", 2)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        store.set_online(false);
        session.reveal()?;
        let outcome = session.rate(&store, 2.0).await?;
        assert!(!outcome.persisted);
        // The session still advanced and kept the rating in memory.
        assert_eq!(session.progress().current, 2);
        assert_eq!(session.pending_writes(), 1);
        assert_eq!(session.retry_pending(&store).await, 1);

        store.set_online(true);
        assert_eq!(session.retry_pending(&store).await, 0);
        assert_eq!(store.records_for_set(&set.id).await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_final_rating_offline_queues_summary() -> Fallible<()> {
        let set = sample_set("One", 1)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        store.set_online(false);
        session.reveal()?;
        let outcome = session.rate(&store, 3.0).await?;
        assert!(!outcome.persisted);
        assert!(outcome.summary.is_some());
        assert!(session.is_finished());
        assert_eq!(session.pending_writes(), 2);
        assert!(matches!(session.pending[0], PendingWrite::Record(_)));
        assert!(matches!(session.pending[1], PendingWrite::Summary(_)));

        let err = session.rate(&store, 4.0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        let err = session.undo(&store).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        store.set_online(true);
        assert_eq!(session.retry_pending(&store).await, 0);
        assert_eq!(store.records_for_set(&set.id).await.len(), 1);
        assert_eq!(store.sessions_for_set(&set.id).await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_retry_stops_at_first_failure() -> Fallible<()> {
        let set = sample_set("Three", 3)?;
        let store = SqliteStore::new(":memory:")?;
        store.put_set(&set).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        // A record for a set the database does not know violates its
        // foreign key, so that write keeps failing.
        let ghost = SetId::new("ghost")?;
        session.pending = vec![
            PendingWrite::Record(sample_record(&set.id, 0, 2.0)?),
            PendingWrite::Record(sample_record(&ghost, 0, 2.0)?),
            PendingWrite::Record(sample_record(&set.id, 1, 2.0)?),
        ];
        assert_eq!(session.retry_pending(&store).await, 2);
        let records = store.records_for_set(&set.id).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].card_index, 0);
        assert!(matches!(&session.pending[0], PendingWrite::Record(r) if r.set_id == ghost));
        assert!(
            matches!(&session.pending[1], PendingWrite::Record(r) if r.set_id == set.id && r.card_index == 1)
        );

        session.pending.remove(0);
        assert_eq!(session.retry_pending(&store).await, 0);
        assert_eq!(store.records_for_set(&set.id).await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_undo_offline_supersedes_queued_record() -> Fallible<()> {
        let set = sample_set("Two", 2)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        let first = session.current().expect("card").card_index;
        store.set_online(false);
        session.reveal()?;
        assert!(!session.rate(&store, 2.0).await?.persisted);
        assert_eq!(session.pending_writes(), 1);

        assert!(!session.undo(&store).await?);
        assert_eq!(session.pending_writes(), 1);
        assert!(
            matches!(&session.pending[0], PendingWrite::DeleteRecord(key) if key.card_index == first)
        );

        store.set_online(true);
        assert_eq!(session.retry_pending(&store).await, 0);
        assert!(store.records_for_set(&set.id).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_undo_restores_previous_record() -> Fallible<()> {
        let set = sample_set("Two", 2)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        let first = session.current().expect("card").card_index;
        assert!(!session.can_undo());
        session.reveal()?;
        session.rate(&store, 1.0).await?;
        assert_eq!(store.records_for_set(&set.id).await.len(), 1);

        assert!(session.undo(&store).await?);
        assert_eq!(session.current().expect("card").card_index, first);
        assert_eq!(session.phase(), Phase::Presenting);
        assert!(session.ratings().is_empty());
        assert!(store.records_for_set(&set.id).await.is_empty());
        assert!(session.undo(&store).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_end_early() -> Fallible<()> {
        let set = sample_set("Three", 3)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        session.reveal()?;
        session.rate(&store, 4.0).await?;
        let summary = session.end(&store).await?.expect("summary");
        assert_eq!(summary.total_cards, 1);
        assert_eq!(summary.score, 80);
        assert!(session.is_finished());
        assert!(session.end(&store).await.is_err());
        assert!(session.reveal().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_end_without_ratings_records_nothing() -> Fallible<()> {
        let set = sample_set("Three", 3)?;
        let store = store_with(&set, &[]).await?;
        let mut session = ReviewSession::start(&store, &set.id, Filter::All, &mut rng()).await?;
        assert!(session.end(&store).await?.is_none());
        assert!(store.sessions_for_set(&set.id).await.is_empty());
        Ok(())
    }
}
