use std::cmp::Ordering;

use generational_arena::{Arena, Index};
use rand::Rng;

use crate::node::PnsNode;
use crate::proof::{ProofState, ProofValue};

/// Robust-child final move selection. The most-visited child wins by
/// default, with expected score and then prior policy weight as
/// tie-breaks, but any child whose value is exactly proven for the mover
/// supersedes every unproven child regardless of visit counts. Among fully
/// tied candidates one is returned uniformly at random.
pub fn select_robust_child<S, A, V, R: Rng>(
    arena: &Arena<PnsNode<S, A, V>>,
    root: Index,
    rng: &mut R,
) -> usize {
    let node = &arena[root];
    debug_assert!(!node.is_terminal());

    let mover = node.mover_agent();

    let mut candidates: Vec<usize> = Vec::new();
    let mut best_proven: Option<f64> = None;
    let mut best_key = (0usize, f64::NEG_INFINITY, f64::NEG_INFINITY);

    for (edge_index, edge) in node.edges().iter().enumerate() {
        let (visits, value, proven) = match edge.node_index() {
            Some(child_index) => {
                let child = &arena[child_index];
                (
                    child.visits(),
                    child.expected_score(mover),
                    proven_score(child, mover),
                )
            }
            None => (0, f64::NEG_INFINITY, None),
        };

        if let Some(proven_value) = proven {
            match best_proven {
                Some(best) if proven_value < best => {}
                Some(best) if proven_value == best => candidates.push(edge_index),
                _ => {
                    best_proven = Some(proven_value);
                    candidates = vec![edge_index];
                }
            }
        } else if best_proven.is_none() {
            let key = (visits, value, edge.policy_score() as f64);
            match compare_keys(key, best_key) {
                Ordering::Greater => {
                    best_key = key;
                    candidates = vec![edge_index];
                }
                Ordering::Equal if !candidates.is_empty() => candidates.push(edge_index),
                Ordering::Equal => {
                    best_key = key;
                    candidates = vec![edge_index];
                }
                Ordering::Less => {}
            }
        }
    }

    candidates[rng.gen_range(0..candidates.len())]
}

/// The child's exact value for the agent, when known. A multiplayer child
/// that is merely disproven is not exact knowledge of its value, only of
/// who will not win it, so it does not override the visit-count rule.
fn proven_score<S, A, V>(node: &PnsNode<S, A, V>, agent: usize) -> Option<f64> {
    match node.proof() {
        ProofState::TwoValued(tv) => match tv.value() {
            ProofValue::Proven => Some(1.0),
            ProofValue::Disproven => Some(-1.0),
            ProofValue::Unknown => None,
        },
        ProofState::Multiplayer(mp) => (mp.value(agent) == ProofValue::Proven).then_some(1.0),
        ProofState::ScoreBounds(sb) => {
            (sb.pess_bound(agent) == sb.opt_bound(agent)).then(|| sb.pess_bound(agent))
        }
    }
}

fn compare_keys(lhs: (usize, f64, f64), rhs: (usize, f64, f64)) -> Ordering {
    lhs.0
        .cmp(&rhs.0)
        .then(lhs.1.partial_cmp(&rhs.1).unwrap_or(Ordering::Equal))
        .then(lhs.2.partial_cmp(&rhs.2).unwrap_or(Ordering::Equal))
}
