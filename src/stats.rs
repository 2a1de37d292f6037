use crate::category::Category;
use crate::matrix::ConfusionMatrix;
use crate::util::accuracy_pct;
use serde::{Deserialize, Serialize};

/// Totals plus the full guess×actual breakdown. Doubles as the persisted
/// slot shape (`{totalCorrect, totalAttempted, cumulativeMatrix}`) and as
/// the session-scoped accumulator inside the recorder.
///
/// Invariants: `total_attempted` equals the sum of all matrix cells and
/// `total_correct` the sum of the diagonal. Mutation goes through
/// [`CumulativeStats::record`] and [`CumulativeStats::merge`] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeStats {
    pub total_correct: u32,
    pub total_attempted: u32,
    #[serde(rename = "cumulativeMatrix")]
    pub matrix: ConfusionMatrix,
}

impl CumulativeStats {
    /// Count one answered question. Returns whether the guess was right.
    pub fn record(&mut self, guess: Category, actual: Category) -> bool {
        let correct = guess == actual;
        self.total_attempted += 1;
        if correct {
            self.total_correct += 1;
        }
        self.matrix.increment(guess, actual);
        correct
    }

    /// Fold another accumulation (typically a finished session) into this
    /// one. Order does not matter.
    pub fn merge(&mut self, other: &CumulativeStats) {
        self.total_correct += other.total_correct;
        self.total_attempted += other.total_attempted;
        self.matrix.merge(&other.matrix);
    }

    /// Percent correct; `None` before the first attempt.
    pub fn accuracy_pct(&self) -> Option<f64> {
        accuracy_pct(self.total_correct, self.total_attempted)
    }

    /// Whether the totals agree with the matrix. A persisted value that
    /// fails this is treated as corrupt and replaced with zeroes.
    pub fn is_consistent(&self) -> bool {
        self.total_attempted == self.matrix.total() && self.total_correct == self.matrix.diagonal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category::{Hard, Neutral, Soft};

    #[test]
    fn record_keeps_totals_and_matrix_in_step() {
        let mut stats = CumulativeStats::default();
        assert!(stats.record(Neutral, Neutral));
        assert!(!stats.record(Soft, Hard));
        assert!(stats.record(Hard, Hard));

        assert_eq!(stats.total_attempted, 3);
        assert_eq!(stats.total_correct, 2);
        assert_eq!(stats.matrix.get(Soft, Hard), 1);
        assert!(stats.is_consistent());
    }

    #[test]
    fn merge_adds_totals_and_cells() {
        let mut a = CumulativeStats::default();
        a.record(Neutral, Neutral);
        a.record(Soft, Soft);

        let mut b = CumulativeStats::default();
        b.record(Hard, Neutral);

        a.merge(&b);
        assert_eq!(a.total_attempted, 3);
        assert_eq!(a.total_correct, 2);
        assert_eq!(a.matrix.get(Hard, Neutral), 1);
        assert!(a.is_consistent());
    }

    #[test]
    fn accuracy_is_none_before_first_attempt() {
        let mut stats = CumulativeStats::default();
        assert_eq!(stats.accuracy_pct(), None);
        stats.record(Soft, Soft);
        stats.record(Soft, Hard);
        assert_eq!(stats.accuracy_pct(), Some(50.0));
    }

    #[test]
    fn serializes_with_slot_field_names() {
        let mut stats = CumulativeStats::default();
        stats.record(Soft, Hard);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalCorrect"], 0);
        assert_eq!(json["totalAttempted"], 1);
        assert_eq!(json["cumulativeMatrix"]["Soft"]["Hard"], 1);
    }

    #[test]
    fn roundtrips_through_json() {
        let mut stats = CumulativeStats::default();
        stats.record(Neutral, Soft);
        stats.record(Hard, Hard);
        let json = serde_json::to_string(&stats).unwrap();
        let back: CumulativeStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, back);
    }

    #[test]
    fn inconsistent_totals_are_detected() {
        let mut stats = CumulativeStats::default();
        stats.record(Neutral, Neutral);
        stats.total_correct = 5;
        assert!(!stats.is_consistent());
    }
}
