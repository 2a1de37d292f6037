use crate::category::Category;
use crate::stats::CumulativeStats;
use crate::store::StatsStore;
use std::io;

#[derive(Clone, Debug, Copy, PartialEq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Accumulates one quiz session without touching the persisted stats.
///
/// Session accounting is merge-at-session-end: answers collect here and
/// the stats store is only written by [`SessionRecorder::finalize`], so an
/// abandoned session contributes nothing and a session can never be
/// counted twice. Finalization latches; the latch is set only after the
/// save succeeds, so a failed save can be retried.
#[derive(Debug)]
pub struct SessionRecorder {
    question_count: usize,
    stats: CumulativeStats,
    finalized: bool,
}

impl SessionRecorder {
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            stats: CumulativeStats::default(),
            finalized: false,
        }
    }

    /// Judge and count one answer. A finalized session is closed: the
    /// answer is still judged but no longer counted.
    pub fn record_answer(&mut self, guess: Category, actual: Category) -> Outcome {
        if self.finalized {
            return if guess == actual {
                Outcome::Correct
            } else {
                Outcome::Incorrect
            };
        }
        if self.stats.record(guess, actual) {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn answered(&self) -> u32 {
        self.stats.total_attempted
    }

    pub fn correct(&self) -> u32 {
        self.stats.total_correct
    }

    pub fn stats(&self) -> &CumulativeStats {
        &self.stats
    }

    /// All questions of the session answered.
    pub fn is_complete(&self) -> bool {
        self.stats.total_attempted as usize >= self.question_count
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Merge this session into the cumulative stats, exactly once.
    /// Returns `Ok(false)` when the session was already folded in; the
    /// store is not touched again in that case.
    pub fn finalize(&mut self, store: &dyn StatsStore) -> io::Result<bool> {
        if self.finalized {
            return Ok(false);
        }
        let mut cumulative = store.load();
        cumulative.merge(&self.stats);
        store.save(&cumulative)?;
        self.finalized = true;
        Ok(true)
    }
}
