use engine::value::Value;
use generational_arena::Index;
use model::ActionWithPolicy;

use crate::edge::PnsEdge;
use crate::proof::{ProofState, ProofValue};

/// One visited game position. Created when its parent first expands the
/// corresponding legal move, then mutated in place for the rest of the
/// search: visit accounting, proof numbers, score bounds.
#[derive(Debug)]
pub struct PnsNode<S, A, V> {
    game_state: S,
    parent: Option<(Index, usize)>,
    player_to_move: usize,
    mover_agent: usize,
    root_player: usize,
    visits: usize,
    virtual_visits: usize,
    value_score: V,
    score_sums: Vec<f64>,
    edges: Vec<PnsEdge<A>>,
    proof: ProofState,
    pns_terms: Vec<f64>,
    pns_terms_dirty: bool,
}

impl<S, A, V> PnsNode<S, A, V> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        game_state: S,
        parent: Option<(Index, usize)>,
        player_to_move: usize,
        mover_agent: usize,
        root_player: usize,
        num_players: usize,
        value_score: V,
        policy_scores: Vec<ActionWithPolicy<A>>,
        proof: ProofState,
    ) -> Self {
        let edges: Vec<PnsEdge<A>> = policy_scores.into_iter().map(|p| p.into()).collect();
        let num_edges = edges.len();

        Self {
            game_state,
            parent,
            player_to_move,
            mover_agent,
            root_player,
            visits: 0,
            virtual_visits: 0,
            value_score,
            score_sums: vec![0.0; num_players + 1],
            edges,
            proof,
            pns_terms: vec![0.0; num_edges],
            pns_terms_dirty: true,
        }
    }

    pub fn game_state(&self) -> &S {
        &self.game_state
    }

    pub fn parent(&self) -> Option<(Index, usize)> {
        self.parent
    }

    pub fn player_to_move(&self) -> usize {
        self.player_to_move
    }

    /// Agent index of the player to move, for reading per-agent statistics
    /// and bounds. Differs from `player_to_move` only in games that swap
    /// seats mid-match.
    pub fn mover_agent(&self) -> usize {
        self.mover_agent
    }

    pub fn root_player(&self) -> usize {
        self.root_player
    }

    pub fn num_players(&self) -> usize {
        self.score_sums.len() - 1
    }

    pub fn is_terminal(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn num_legal_moves(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[PnsEdge<A>] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> &PnsEdge<A> {
        &self.edges[index]
    }

    pub fn edge_mut(&mut self, index: usize) -> &mut PnsEdge<A> {
        &mut self.edges[index]
    }

    pub fn visits(&self) -> usize {
        self.visits
    }

    pub fn virtual_visits(&self) -> usize {
        self.virtual_visits
    }

    pub fn increment_visits(&mut self) {
        self.visits += 1;
    }

    pub fn increment_virtual_visits(&mut self) {
        self.virtual_visits += 1;
    }

    pub fn decrement_virtual_visits(&mut self) {
        debug_assert!(self.virtual_visits > 0);
        self.virtual_visits = self.virtual_visits.saturating_sub(1);
    }

    pub fn value_score(&self) -> &V {
        &self.value_score
    }

    pub fn add_scores(&mut self, scores: &[f64]) {
        for (sum, score) in self.score_sums.iter_mut().zip(scores) {
            *sum += score;
        }
    }

    pub fn proof(&self) -> &ProofState {
        &self.proof
    }

    pub fn proof_mut(&mut self) -> &mut ProofState {
        &mut self.proof
    }

    pub fn is_value_proven(&self, agent: usize) -> bool {
        self.proof.is_value_proven(agent)
    }

    /// Mean playout score for the agent, overridden by exact knowledge where
    /// available: a proven-best-rank multiplayer node reports 1.0 for the
    /// root player, and the score-bounds variant clips the mean into
    /// [pess, opt] (collapsing to the exact value once the bounds meet).
    pub fn expected_score(&self, agent: usize) -> f64 {
        match &self.proof {
            ProofState::TwoValued(_) => self.mean_score(agent),
            ProofState::Multiplayer(mp) => {
                if agent == self.root_player && mp.values[agent] == ProofValue::Proven {
                    1.0
                } else {
                    self.mean_score(agent)
                }
            }
            ProofState::ScoreBounds(sb) => {
                if sb.pess[agent] == sb.opt[agent] {
                    sb.pess[agent]
                } else {
                    self.mean_score(agent).clamp(sb.pess[agent], sb.opt[agent])
                }
            }
        }
    }

    pub fn mean_score(&self, agent: usize) -> f64 {
        common::div_or_zero(self.score_sums[agent], self.visits as f64)
    }

    pub fn pess_bound(&self, agent: usize) -> Option<f64> {
        self.proof.as_score_bounds().map(|sb| sb.pess[agent])
    }

    pub fn opt_bound(&self, agent: usize) -> Option<f64> {
        self.proof.as_score_bounds().map(|sb| sb.opt[agent])
    }

    pub fn pns_terms(&self) -> &[f64] {
        &self.pns_terms
    }

    pub fn pns_terms_dirty(&self) -> bool {
        self.pns_terms_dirty
    }

    pub fn set_pns_terms(&mut self, terms: Vec<f64>) {
        debug_assert_eq!(terms.len(), self.edges.len());
        self.pns_terms = terms;
        self.pns_terms_dirty = false;
    }

    pub fn mark_pns_terms_dirty(&mut self) {
        self.pns_terms_dirty = true;
    }
}

impl<S, A, V> PnsNode<S, A, V>
where
    V: Value,
{
    /// Per-agent scores of this node's stored evaluation, used when the
    /// search bottoms out at this node again.
    pub fn evaluation_scores(&self, num_players: usize) -> Vec<f64> {
        let mut scores = vec![0.0; num_players + 1];
        for (player, score) in scores.iter_mut().enumerate().skip(1) {
            *score = self.value_score.get_value_for_player(player) as f64;
        }
        scores
    }
}
