use crate::propagation::UnexpandedChildPolicy;

/// How the proof-number selection term aggregates a node's children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PnsSelectionVariant {
    /// Children are ranked ascending by (dis)proof number, ties sharing the
    /// lowest rank. Term is `1 - rank / num_moves`.
    Rank,
    /// Term is `1 - n / sum_of_finite_numbers`.
    Sum,
    /// Term is `1 - n / max_of_finite_numbers`, the max bumped by one when
    /// any child is disproved so disproved children never tie the worst
    /// finite child.
    Max,
}

#[derive(Clone, Debug)]
pub struct PnsMctsOptions {
    /// UCB1 exploration constant.
    pub exploration_constant: f64,
    /// Weight of the proof-number selection term.
    pub pn_constant: f64,
    pub pns_variant: PnsSelectionVariant,
    pub unexpanded_child_policy: UnexpandedChildPolicy,
    /// Exploitation estimate for a child that has never been visited.
    pub fpu: f64,
    /// Exploitation score of a pruned child while its parent's pessimistic
    /// bound covers it. Large and negative so an unpruned sibling always
    /// wins selection, but finite so the child stays selectable if every
    /// sibling is pruned too.
    pub pruned_score_sentinel: f64,
    /// Number of traversals kept in flight concurrently.
    pub parallelism: usize,
}

impl Default for PnsMctsOptions {
    fn default() -> Self {
        Self {
            exploration_constant: std::f64::consts::SQRT_2,
            pn_constant: 1.0,
            pns_variant: PnsSelectionVariant::Rank,
            unexpanded_child_policy: UnexpandedChildPolicy::Clamp,
            fpu: 0.0,
            pruned_score_sentinel: -10_000.0,
            parallelism: 1,
        }
    }
}
