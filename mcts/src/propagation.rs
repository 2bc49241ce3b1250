use generational_arena::{Arena, Index};
use log::error;

use crate::node::PnsNode;
use crate::proof::{PnsNodeKind, ProofState, ProofValue};

/// How an unexpanded child's placeholder of 1.0 enters a `min` aggregation.
/// `Assign` overwrites the accumulator, `Clamp` takes the minimum with it.
/// Sum aggregations always add 1.0 regardless.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnexpandedChildPolicy {
    Assign,
    Clamp,
}

const UNEXPANDED_PLACEHOLDER: f64 = 1.0;

fn aggregate(
    kind: PnsNodeKind,
    children: impl Iterator<Item = Option<f64>>,
    policy: UnexpandedChildPolicy,
) -> f64 {
    match kind {
        PnsNodeKind::Or => {
            let mut min = f64::INFINITY;
            for child in children {
                match child {
                    Some(n) => min = min.min(n),
                    None => match policy {
                        UnexpandedChildPolicy::Assign => min = UNEXPANDED_PLACEHOLDER,
                        UnexpandedChildPolicy::Clamp => min = min.min(UNEXPANDED_PLACEHOLDER),
                    },
                }
            }
            min
        }
        PnsNodeKind::And => children
            .map(|child| child.unwrap_or(UNEXPANDED_PLACEHOLDER))
            .sum(),
    }
}

/// Recomputes a node's proof numbers from its children's, returning whether
/// anything changed. Numbers are a pure function of the children, so a
/// `false` result means every ancestor would also be unchanged and the
/// bottom-up walk may stop.
///
/// Terminal nodes have their numbers fixed at construction and always
/// report unchanged.
pub fn set_proof_and_disproof_numbers<S, A, V>(
    arena: &mut Arena<PnsNode<S, A, V>>,
    index: Index,
    policy: UnexpandedChildPolicy,
) -> bool {
    let node = &arena[index];

    if node.is_terminal() {
        let unevaluated = match node.proof() {
            ProofState::TwoValued(tv) => tv.value() == ProofValue::Unknown,
            ProofState::Multiplayer(mp) => mp
                .values
                .iter()
                .skip(1)
                .all(|&value| value == ProofValue::Unknown),
            ProofState::ScoreBounds(sb) => sb
                .proof
                .iter()
                .skip(1)
                .any(|&proof| proof != 0.0 && proof != f64::INFINITY),
        };
        if unevaluated {
            debug_assert!(false, "terminal node left unevaluated");
            error!("Terminal node has an unknown proof value");
        }
        return false;
    }

    match node.proof().mode() {
        crate::proof::ProofMode::TwoValued => set_two_valued_numbers(arena, index, policy),
        _ => set_per_player_numbers(arena, index, policy),
    }
}

fn set_two_valued_numbers<S, A, V>(
    arena: &mut Arena<PnsNode<S, A, V>>,
    index: Index,
    policy: UnexpandedChildPolicy,
) -> bool {
    let (kind, children): (PnsNodeKind, Vec<Option<(f64, f64)>>) = {
        let node = &arena[index];
        let tv = node
            .proof()
            .as_two_valued()
            .expect("mode checked by caller");

        let children = node
            .edges()
            .iter()
            .map(|edge| {
                edge.node_index().map(|child_index| {
                    let child = arena[child_index]
                        .proof()
                        .as_two_valued()
                        .expect("child proof payload does not match parent's");
                    (child.proof_number(), child.disproof_number())
                })
            })
            .collect();

        (tv.kind(), children)
    };

    let proofs = children.iter().map(|c| c.map(|(p, _)| p));
    let disproofs = children.iter().map(|c| c.map(|(_, d)| d));

    // A child that is good for this node's mover appears through the
    // opposite number from the child's own perspective, which is exactly
    // what swapping the aggregation kinds accomplishes.
    let (proof, disproof) = match kind {
        PnsNodeKind::Or => (
            aggregate(PnsNodeKind::Or, proofs, policy),
            aggregate(PnsNodeKind::And, disproofs, policy),
        ),
        PnsNodeKind::And => (
            aggregate(PnsNodeKind::And, proofs, policy),
            aggregate(PnsNodeKind::Or, disproofs, policy),
        ),
    };

    let value = if proof == 0.0 {
        ProofValue::Proven
    } else if disproof == 0.0 {
        ProofValue::Disproven
    } else {
        ProofValue::Unknown
    };

    let node = &mut arena[index];
    let tv = match node.proof_mut() {
        ProofState::TwoValued(tv) => tv,
        _ => unreachable!(),
    };

    if tv.value != ProofValue::Unknown && value != tv.value {
        error!(
            "Proof value regressed from {:?} to {:?}; proof {} disproof {}",
            tv.value, value, proof, disproof
        );
    }

    let changed = tv.proof != proof || tv.disproof != disproof || tv.value != value;
    tv.proof = proof;
    tv.disproof = disproof;
    tv.value = value;
    changed
}

/// Shared by the multiplayer and score-bounds payloads: one proof number
/// per player, each aggregated from that player's own OR/AND perspective.
fn set_per_player_numbers<S, A, V>(
    arena: &mut Arena<PnsNode<S, A, V>>,
    index: Index,
    policy: UnexpandedChildPolicy,
) -> bool {
    let (mover_agent, num_players, children): (usize, usize, Vec<Option<Vec<f64>>>) = {
        let node = &arena[index];
        let num_players = match node.proof() {
            ProofState::Multiplayer(mp) => mp.proof.len() - 1,
            ProofState::ScoreBounds(sb) => sb.proof.len() - 1,
            ProofState::TwoValued(_) => unreachable!(),
        };

        let children = node
            .edges()
            .iter()
            .map(|edge| {
                edge.node_index().map(|child_index| match arena[child_index].proof() {
                    ProofState::Multiplayer(mp) => mp.proof.clone(),
                    ProofState::ScoreBounds(sb) => sb.proof.clone(),
                    ProofState::TwoValued(_) => {
                        panic!("child proof payload does not match parent's")
                    }
                })
            })
            .collect();

        (node.mover_agent(), num_players, children)
    };

    let mut proof = vec![0.0; num_players + 1];
    for player in 1..=num_players {
        let kind = if player == mover_agent {
            PnsNodeKind::Or
        } else {
            PnsNodeKind::And
        };
        proof[player] = aggregate(
            kind,
            children.iter().map(|c| c.as_ref().map(|p| p[player])),
            policy,
        );
    }

    // Only one player can claim the rank being played for, so a proven
    // player disproves every other.
    if let Some(winner) = (1..=num_players).find(|&p| proof[p] == 0.0) {
        for (player, proof) in proof.iter_mut().enumerate().skip(1) {
            if player != winner {
                *proof = f64::INFINITY;
            }
        }
    }

    let node = &mut arena[index];
    match node.proof_mut() {
        ProofState::Multiplayer(mp) => {
            let changed = mp.proof != proof;
            for player in 1..=num_players {
                let value = derived_value(proof[player]);
                if mp.values[player] != ProofValue::Unknown && value != mp.values[player] {
                    error!(
                        "Proof value for player {} regressed from {:?} to {:?}",
                        player, mp.values[player], value
                    );
                }
                mp.values[player] = value;
            }
            mp.proof = proof;
            changed
        }
        ProofState::ScoreBounds(sb) => {
            let changed = sb.proof != proof;
            sb.proof = proof;
            changed
        }
        ProofState::TwoValued(_) => unreachable!(),
    }
}

fn derived_value(proof: f64) -> ProofValue {
    if proof == 0.0 {
        ProofValue::Proven
    } else if proof == f64::INFINITY {
        ProofValue::Disproven
    } else {
        ProofValue::Unknown
    }
}

/// Raises the node's pessimistic bound for an agent to `bound` if possible,
/// then continues at the parent with whatever value this node can now
/// guarantee. The walk stops at the first node whose bound does not move.
///
/// At a node where the agent moves, the bound is adopted directly since the
/// agent will pick the guaranteeing child, and any sibling whose optimistic
/// bound falls at or under the new guarantee is marked pruned. Elsewhere
/// only the minimum over all children can be guaranteed, and nothing can be
/// concluded while any child is unexpanded.
pub fn update_pess_bounds<S, A, V>(
    arena: &mut Arena<PnsNode<S, A, V>>,
    index: Index,
    agent: usize,
    bound: f64,
) {
    let mut current = index;
    let mut bound = bound;

    loop {
        let (parent, to_prune, new_pess) = {
            let node = &arena[current];
            let sb = match node.proof().as_score_bounds() {
                Some(sb) => sb,
                None => {
                    debug_assert!(false, "pessimistic bound update on a non-score-bounds node");
                    return;
                }
            };

            let old_pess = sb.pess[agent];
            if bound <= old_pess {
                return;
            }

            let is_mover = agent == node.mover_agent();
            let new_pess = if is_mover {
                Some(bound)
            } else {
                let mut min = f64::INFINITY;
                let mut all_expanded = true;
                for edge in node.edges() {
                    match edge.node_index() {
                        Some(child_index) => {
                            if let Some(child_sb) = arena[child_index].proof().as_score_bounds() {
                                min = min.min(child_sb.pess[agent]);
                            }
                        }
                        None => all_expanded = false,
                    }
                }

                if !all_expanded {
                    None
                } else if min < old_pess {
                    error!(
                        "Pessimistic bound would decrease for agent {}: {} -> {}",
                        agent, old_pess, min
                    );
                    None
                } else if min == old_pess {
                    None
                } else {
                    Some(min)
                }
            };

            let to_prune: Vec<Index> = if let (true, Some(new_pess)) = (is_mover, new_pess) {
                node.edges()
                    .iter()
                    .filter_map(|edge| edge.node_index())
                    .filter(|&child_index| {
                        arena[child_index]
                            .proof()
                            .as_score_bounds()
                            .map_or(false, |child_sb| child_sb.opt[agent] <= new_pess)
                    })
                    .collect()
            } else {
                Vec::new()
            };

            (node.parent(), to_prune, new_pess)
        };

        let new_pess = match new_pess {
            Some(new_pess) => new_pess,
            None => return,
        };

        for child_index in to_prune {
            if let Some(child_sb) = arena[child_index].proof_mut().as_score_bounds_mut() {
                child_sb.mark_pruned();
            }
        }

        if let Some(sb) = arena[current].proof_mut().as_score_bounds_mut() {
            sb.pess[agent] = new_pess;
        }

        match parent {
            Some((parent_index, _)) => {
                current = parent_index;
                bound = new_pess;
            }
            None => return,
        }
    }
}

/// Lowers the node's optimistic bound for an agent after a child's dropped
/// to `bound`. The node's own bound is the maximum over all children no
/// matter who moves, since some future chooser could still steer there, and
/// it can only be adopted once every child is expanded.
///
/// When the agent moves here and the child's new ceiling no longer beats
/// this node's guarantee, that child is marked pruned.
pub fn update_opt_bounds<S, A, V>(
    arena: &mut Arena<PnsNode<S, A, V>>,
    index: Index,
    agent: usize,
    bound: f64,
    from_child: Index,
) {
    let mut current = index;
    let mut bound = bound;
    let mut from_child = from_child;

    loop {
        let (parent, prune_child, new_opt) = {
            let node = &arena[current];
            let sb = match node.proof().as_score_bounds() {
                Some(sb) => sb,
                None => {
                    debug_assert!(false, "optimistic bound update on a non-score-bounds node");
                    return;
                }
            };

            let old_opt = sb.opt[agent];

            // Pruning is decided on the incoming bound alone, before knowing
            // whether this node's own bound moves.
            let prune_child = agent == node.mover_agent() && bound <= sb.pess[agent];

            let new_opt = if bound >= old_opt {
                None
            } else {
                let mut max = f64::NEG_INFINITY;
                let mut all_expanded = true;
                for edge in node.edges() {
                    match edge.node_index() {
                        Some(child_index) => {
                            if let Some(child_sb) = arena[child_index].proof().as_score_bounds() {
                                max = max.max(child_sb.opt[agent]);
                            }
                        }
                        None => all_expanded = false,
                    }
                }

                if !all_expanded {
                    None
                } else if max > old_opt {
                    error!(
                        "Optimistic bound would increase for agent {}: {} -> {}",
                        agent, old_opt, max
                    );
                    None
                } else if max == old_opt {
                    None
                } else {
                    Some(max)
                }
            };

            (node.parent(), prune_child, new_opt)
        };

        if prune_child {
            if let Some(child_sb) = arena[from_child].proof_mut().as_score_bounds_mut() {
                child_sb.mark_pruned();
            }
        }

        let new_opt = match new_opt {
            Some(new_opt) => new_opt,
            None => return,
        };

        if let Some(sb) = arena[current].proof_mut().as_score_bounds_mut() {
            sb.opt[agent] = new_opt;
        }

        match parent {
            Some((parent_index, _)) => {
                from_child = current;
                current = parent_index;
                bound = new_opt;
            }
            None => return,
        }
    }
}
