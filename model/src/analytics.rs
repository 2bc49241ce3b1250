use std::future::Future;

use engine::value::Value;
use half::f16;

/// The evaluation seam between the search and whatever estimates positions:
/// a learned model, a playout policy, or a fixed heuristic.
pub trait GameAnalyzer {
    type Future: Future<Output = GameStateAnalysis<Self::Action, Self::Value>>;
    type Action;
    type State;
    type Value: Value;

    fn get_state_analysis(&self, game_state: &Self::State) -> Self::Future;
}

#[derive(Clone, Debug)]
pub struct GameStateAnalysis<A, V> {
    pub policy_scores: Vec<ActionWithPolicy<A>>,
    pub value_score: V,
}

impl<A, V> GameStateAnalysis<A, V> {
    pub fn new(value_score: V, policy_scores: Vec<ActionWithPolicy<A>>) -> Self {
        GameStateAnalysis {
            policy_scores,
            value_score,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ActionWithPolicy<A> {
    pub action: A,
    pub policy_score: f16,
}

impl<A> ActionWithPolicy<A> {
    pub fn new(action: A, policy_score: f32) -> Self {
        ActionWithPolicy {
            action,
            policy_score: f16::from_f32(policy_score),
        }
    }

    pub fn policy_score(&self) -> f32 {
        self.policy_score.to_f32()
    }
}
