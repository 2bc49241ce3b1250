use engine::value::Value;
use generational_arena::{Arena, Index};

use crate::node::PnsNode;
use crate::options::PnsMctsOptions;
use crate::proof::ProofMode;
use crate::propagation::{
    set_proof_and_disproof_numbers, update_opt_bounds, update_pess_bounds,
};

pub const PROOF_DISPROOF_NUMBERS: u32 = 0x1;
pub const MULTIPLAYER_PNS: u32 = 0x2;
pub const SCORE_BOUNDS: u32 = 0x4;

/// Declares which propagations must run after each playout. Exposed as
/// composable flags so a strategy can request several at once.
pub trait BackpropagationHook {
    fn backpropagation_flags(&self) -> u32;
}

/// The canonical hook: a plain flag set chosen at construction.
#[derive(Clone, Copy, Debug)]
pub struct PnsBackpropagationStrategy {
    flags: u32,
}

impl PnsBackpropagationStrategy {
    pub fn new(flags: u32) -> Self {
        Self { flags }
    }

    pub fn two_valued() -> Self {
        Self::new(PROOF_DISPROOF_NUMBERS)
    }

    pub fn multiplayer() -> Self {
        Self::new(MULTIPLAYER_PNS)
    }

    pub fn score_bounds() -> Self {
        Self::new(MULTIPLAYER_PNS | SCORE_BOUNDS)
    }
}

impl BackpropagationHook for PnsBackpropagationStrategy {
    fn backpropagation_flags(&self) -> u32 {
        self.flags
    }
}

/// The proof payload every node carries, derived from the requested
/// propagations. Score bounds subsume the multiplayer numbers.
pub fn proof_mode_for_flags(flags: u32) -> ProofMode {
    if flags & SCORE_BOUNDS != 0 {
        ProofMode::ScoreBounds
    } else if flags & MULTIPLAYER_PNS != 0 {
        ProofMode::Multiplayer
    } else {
        ProofMode::TwoValued
    }
}

/// Settles one finished traversal: visit and score accounting along the
/// whole path, then the requested proof propagations bottom-up from the
/// evaluated leaf.
///
/// The proof-number walk starts at the leaf's parent, since the leaf's own
/// numbers were fixed at construction or by its children already, and stops
/// at the first unchanged node: numbers are a monotone pure function of
/// children, so nothing above can change either.
pub fn backpropagate<S, A, V>(
    arena: &mut Arena<PnsNode<S, A, V>>,
    path: &[Index],
    options: &PnsMctsOptions,
    flags: u32,
) where
    V: Value,
{
    let leaf_index = *path.last().expect("path is never empty");
    let num_players = arena[leaf_index].num_players();
    let scores = arena[leaf_index].evaluation_scores(num_players);

    for &index in path {
        let node = &mut arena[index];
        node.increment_visits();
        node.add_scores(&scores);
        node.decrement_virtual_visits();
    }

    if flags & (PROOF_DISPROOF_NUMBERS | MULTIPLAYER_PNS | SCORE_BOUNDS) != 0 {
        let mut child_changed = true;
        for &index in path.iter().rev().skip(1) {
            if child_changed {
                arena[index].mark_pns_terms_dirty();
            }
            child_changed =
                set_proof_and_disproof_numbers(arena, index, options.unexpanded_child_policy);
            if !child_changed {
                break;
            }
        }
    }

    if flags & SCORE_BOUNDS != 0 {
        if let Some((parent_index, _)) = arena[leaf_index].parent() {
            let bounds = arena[leaf_index].proof().as_score_bounds().map(|sb| {
                (1..=num_players)
                    .map(|agent| (sb.pess_bound(agent), sb.opt_bound(agent)))
                    .collect::<Vec<_>>()
            });

            if let Some(bounds) = bounds {
                for (agent, (pess, opt)) in (1..=num_players).zip(bounds) {
                    update_pess_bounds(arena, parent_index, agent, pess);
                    update_opt_bounds(arena, parent_index, agent, opt, leaf_index);
                }
            }
        }
    }
}
