//! Totals derived from scoring state and ledger history.

use crate::state::scoring::Grid;

/// Sum of every set cell; unset cells count as zero.
pub fn sum_grid(grid: &Grid) -> u32 {
    grid.cells().map(|cell| u32::from(cell.unwrap_or(0))).sum()
}

/// Best grand total and the rounded mean over a player's finalized results.
///
/// Both are `None` when `scores` is empty. The mean rounds half up.
pub fn best_and_average(scores: &[u32]) -> (Option<u32>, Option<u32>) {
    let Some(best) = scores.iter().copied().max() else {
        return (None, None);
    };

    let count = scores.len() as u64;
    let sum: u64 = scores.iter().map(|&score| u64::from(score)).sum();
    let average = (sum * 2 + count) / (count * 2);

    (Some(best), Some(average as u32))
}
