//! Cost-based ranking for overload resolution.
//!
//! The lowest finite cost wins. Unlike host-language overloading there is no
//! tie-breaker: two candidates at the same minimum cost are ambiguous.

use scriptbind_core::Cost;

/// A candidate that accepted the argument count, with its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scored {
    /// Position in the overload set.
    pub index: usize,
    pub cost: Cost,
}

/// Outcome of ranking scored candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ranking {
    /// Exactly one candidate has the minimum cost.
    Unique(usize),
    /// Several candidates share the minimum cost, in set order.
    Ambiguous(Vec<usize>),
    /// No candidate has a finite cost.
    NoMatch,
}

/// Rank scored candidates.
pub fn rank(scored: &[Scored]) -> Ranking {
    let Some(best) = scored
        .iter()
        .map(|s| s.cost)
        .filter(|c| c.is_possible())
        .min()
    else {
        return Ranking::NoMatch;
    };

    let tied: Vec<usize> = scored
        .iter()
        .filter(|s| s.cost == best)
        .map(|s| s.index)
        .collect();
    match tied.as_slice() {
        [only] => Ranking::Unique(*only),
        _ => Ranking::Ambiguous(tied),
    }
}
