// Majority vote over the labels of one frame

use crate::error::{EmotionPipelineError, Result};
use std::collections::HashMap;
use std::hash::Hash;

/// Returns the most frequent label; equal counts go to the label seen first.
pub fn majority<L>(labels: &[L]) -> Result<L>
where
    L: Eq + Hash + Clone,
{
    // label -> (count, rank of first appearance)
    let mut tally: HashMap<&L, (usize, usize)> = HashMap::new();
    let mut winner: Option<(&L, usize, usize)> = None;

    for label in labels {
        let next_rank = tally.len();
        let entry = tally.entry(label).or_insert((0, next_rank));
        entry.0 += 1;
        let (count, rank) = *entry;

        winner = match winner {
            Some((_, best_count, best_rank))
                if count < best_count || (count == best_count && rank > best_rank) =>
            {
                winner
            }
            _ => Some((label, count, rank)),
        };
    }

    winner
        .map(|(label, _, _)| label.clone())
        .ok_or(EmotionPipelineError::EmptyInput)
}
