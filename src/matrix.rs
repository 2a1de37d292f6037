use crate::category::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialized shape: `{Category: {Category: count}}`, guess first.
type MatrixRepr = BTreeMap<Category, BTreeMap<Category, u32>>;

/// Guess × actual counters for the three categories. Rows are what the
/// user answered, columns what the image actually was, so the diagonal
/// holds the correct calls. Cells only ever grow; the sole way back to
/// zero is replacing the whole matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "MatrixRepr", into = "MatrixRepr")]
pub struct ConfusionMatrix {
    cells: [[u32; Category::COUNT]; Category::COUNT],
}

impl ConfusionMatrix {
    /// All nine cells at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, guess: Category, actual: Category) -> u32 {
        self.cells[guess.index()][actual.index()]
    }

    pub fn increment(&mut self, guess: Category, actual: Category) {
        self.cells[guess.index()][actual.index()] += 1;
    }

    /// Cell-wise sum. Commutative and associative, so sessions can be
    /// folded into cumulative stats in any order.
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        for guess in 0..Category::COUNT {
            for actual in 0..Category::COUNT {
                self.cells[guess][actual] += other.cells[guess][actual];
            }
        }
    }

    /// Largest cell value, floored at 1 so display scales never divide
    /// by zero.
    pub fn max_cell(&self) -> u32 {
        self.cells
            .iter()
            .flatten()
            .copied()
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// Sum of all nine cells.
    pub fn total(&self) -> u32 {
        self.cells.iter().flatten().sum()
    }

    /// Sum of the diagonal (guess == actual).
    pub fn diagonal(&self) -> u32 {
        (0..Category::COUNT).map(|i| self.cells[i][i]).sum()
    }
}

impl From<MatrixRepr> for ConfusionMatrix {
    fn from(repr: MatrixRepr) -> Self {
        // Missing rows or cells read as zero so a truncated persisted
        // value still parses.
        let mut matrix = ConfusionMatrix::zero();
        for (guess, row) in repr {
            for (actual, count) in row {
                matrix.cells[guess.index()][actual.index()] = count;
            }
        }
        matrix
    }
}

impl From<ConfusionMatrix> for MatrixRepr {
    fn from(matrix: ConfusionMatrix) -> Self {
        Category::ALL
            .iter()
            .map(|&guess| {
                let row = Category::ALL
                    .iter()
                    .map(|&actual| (actual, matrix.get(guess, actual)))
                    .collect();
                (guess, row)
            })
            .collect()
    }
}
