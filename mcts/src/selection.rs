use generational_arena::{Arena, Index};
use rand::Rng;

use crate::node::PnsNode;
use crate::options::{PnsMctsOptions, PnsSelectionVariant};
use crate::proof::{PnsNodeKind, ProofState};

/// Picks the child to descend into: UCB1 plus a proof-number term, ties
/// broken uniformly at random.
pub fn select_child<S, A, V, R: Rng>(
    arena: &mut Arena<PnsNode<S, A, V>>,
    index: Index,
    options: &PnsMctsOptions,
    rng: &mut R,
) -> usize {
    if arena[index].pns_terms_dirty() {
        let terms = compute_pns_terms(arena, index, options.pns_variant);
        arena[index].set_pns_terms(terms);
    }

    let node = &arena[index];
    debug_assert!(!node.is_terminal());

    let mover = node.mover_agent();
    let parent_visits = node.visits().max(1) as f64;
    let parent_pess = node.proof().as_score_bounds().map(|sb| sb.pess[mover]);

    let mut best_score = f64::NEG_INFINITY;
    let mut best_index = 0;
    let mut num_ties = 0usize;

    for (edge_index, edge) in node.edges().iter().enumerate() {
        let (exploitation, exploration) = match edge.node_index() {
            Some(child_index) => {
                let child = &arena[child_index];
                let mut exploitation = child.expected_score(mover);

                // Soft prune: overridden, not removed, so the child comes
                // back if the parent's guarantee ever drops below its
                // ceiling again.
                if let Some(child_sb) = child.proof().as_score_bounds() {
                    if child_sb.is_pruned()
                        && parent_pess.map_or(false, |pess| pess >= child_sb.opt[mover])
                    {
                        exploitation = options.pruned_score_sentinel;
                    }
                }

                let child_visits = (child.visits() + child.virtual_visits()).max(1) as f64;
                (exploitation, (parent_visits.ln() / child_visits).sqrt())
            }
            None => (options.fpu, parent_visits.ln().sqrt()),
        };

        let score = exploitation
            + options.exploration_constant * exploration
            + options.pn_constant * node.pns_terms()[edge_index];

        if score > best_score {
            best_score = score;
            best_index = edge_index;
            num_ties = 1;
        } else if score == best_score {
            num_ties += 1;
            if rng.gen_range(0..num_ties) == 0 {
                best_index = edge_index;
            }
        }
    }

    best_index
}

/// The proof numbers children are compared by, from the parent's
/// perspective. For the two-valued payload an OR parent wants a small proof
/// number and an AND parent a small disproof number; the per-player
/// payloads always use the mover's proof number.
fn selection_numbers<S, A, V>(
    arena: &Arena<PnsNode<S, A, V>>,
    index: Index,
) -> Vec<Option<f64>> {
    let node = &arena[index];
    let mover = node.mover_agent();

    node.edges()
        .iter()
        .map(|edge| {
            edge.node_index().map(|child_index| {
                let child = &arena[child_index];
                match (node.proof(), child.proof()) {
                    (ProofState::TwoValued(parent), ProofState::TwoValued(child)) => {
                        match parent.kind() {
                            PnsNodeKind::Or => child.proof_number(),
                            PnsNodeKind::And => child.disproof_number(),
                        }
                    }
                    _ => child.proof().proof_number(mover),
                }
            })
        })
        .collect()
}

pub fn compute_pns_terms<S, A, V>(
    arena: &Arena<PnsNode<S, A, V>>,
    index: Index,
    variant: PnsSelectionVariant,
) -> Vec<f64> {
    let numbers: Vec<f64> = selection_numbers(arena, index)
        .into_iter()
        .map(|n| n.unwrap_or(1.0))
        .collect();

    match variant {
        PnsSelectionVariant::Rank => rank_terms(&numbers),
        PnsSelectionVariant::Sum => sum_terms(&numbers),
        PnsSelectionVariant::Max => max_terms(&numbers),
    }
}

/// Ascending rank per child, tied children sharing the lowest rank among
/// them. `{1, 3, 3, inf}` ranks as `{1, 2, 2, 4}`.
fn rank_terms(numbers: &[f64]) -> Vec<f64> {
    let num_moves = numbers.len() as f64;

    numbers
        .iter()
        .map(|&n| {
            let rank = 1 + numbers.iter().filter(|&&other| other < n).count();
            1.0 - rank as f64 / num_moves
        })
        .collect()
}

fn sum_terms(numbers: &[f64]) -> Vec<f64> {
    let sum: f64 = numbers.iter().filter(|n| n.is_finite()).sum();

    numbers
        .iter()
        .map(|&n| {
            if n.is_finite() && sum > 0.0 {
                1.0 - n / sum
            } else {
                0.0
            }
        })
        .collect()
}

fn max_terms(numbers: &[f64]) -> Vec<f64> {
    let mut max = numbers
        .iter()
        .filter(|n| n.is_finite())
        .fold(0.0_f64, |acc, &n| acc.max(n));

    // Disproved children must stay strictly worse than the worst finite
    // child, which would otherwise score 0 as well.
    if numbers.iter().any(|n| !n.is_finite()) {
        max += 1.0;
    }

    numbers
        .iter()
        .map(|&n| {
            if n.is_finite() && max > 0.0 {
                1.0 - n / max
            } else {
                0.0
            }
        })
        .collect()
}
