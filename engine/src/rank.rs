//! Conversions between finishing ranks and utilities.
//!
//! Utilities live on a linear scale in [-1.0, 1.0]: rank 1 maps to 1.0 and
//! the worst rank maps to -1.0. A player without an assigned rank has
//! utility 0.0.

pub fn rank_to_util(rank: f64, num_players: usize) -> f64 {
    if num_players < 2 {
        return 0.0;
    }

    1.0 - ((rank - 1.0) * 2.0 / (num_players as f64 - 1.0))
}

/// Per-player utilities for a (possibly partial) ranking. Index 0 is unused.
pub fn utilities(ranking: &[f64], num_players: usize) -> Vec<f64> {
    let mut utils = vec![0.0; num_players + 1];

    for player in 1..=num_players {
        let rank = ranking[player];
        if rank > 0.0 {
            utils[player] = rank_to_util(rank, num_players);
        }
    }

    utils
}
