use std::cell::RefCell;
use std::future::{ready, Ready};

use engine::engine::GameEngine;
use engine::rank;
use engine::value::Value;
use model::{ActionWithPolicy, GameAnalyzer, GameStateAnalysis};
use rand::Rng;

/// Per-player utilities in [-1.0, 1.0], index 0 unused.
#[derive(Clone, Debug)]
pub struct Utilities(Vec<f32>);

impl Utilities {
    pub fn new(utilities: Vec<f32>) -> Self {
        Self(utilities)
    }

    pub fn from_ranking(ranking: &[f64], num_players: usize) -> Self {
        Self(
            rank::utilities(ranking, num_players)
                .into_iter()
                .map(|u| u as f32)
                .collect(),
        )
    }
}

impl Value for Utilities {
    fn get_value_for_player(&self, player: usize) -> f32 {
        self.0.get(player).copied().unwrap_or(0.0)
    }
}

/// Evaluates positions by a single uniform-random playout to the end of the
/// game, with a flat prior over legal moves. The baseline evaluator when no
/// learned model is involved.
pub struct RandomPlayoutAnalyzer<'a, E, R> {
    game_engine: &'a E,
    rng: RefCell<R>,
}

impl<'a, E, R> RandomPlayoutAnalyzer<'a, E, R> {
    pub fn new(game_engine: &'a E, rng: R) -> Self {
        Self {
            game_engine,
            rng: RefCell::new(rng),
        }
    }
}

impl<'a, E, R> RandomPlayoutAnalyzer<'a, E, R>
where
    E: GameEngine,
    E::State: Clone,
    R: Rng,
{
    fn playout(&self, game_state: &E::State) -> Utilities {
        let engine = self.game_engine;
        let mut rng = self.rng.borrow_mut();
        let mut game_state = game_state.clone();

        while !engine.is_terminal(&game_state) {
            let actions = engine.legal_actions(&game_state);
            let action = &actions[rng.gen_range(0..actions.len())];
            game_state = engine.take_action(&game_state, action);
        }

        Utilities::from_ranking(&engine.ranking(&game_state), engine.num_players())
    }
}

impl<'a, E, R> GameAnalyzer for RandomPlayoutAnalyzer<'a, E, R>
where
    E: GameEngine,
    E::State: Clone,
    R: Rng,
{
    type Future = Ready<GameStateAnalysis<Self::Action, Self::Value>>;
    type Action = E::Action;
    type State = E::State;
    type Value = Utilities;

    fn get_state_analysis(&self, game_state: &Self::State) -> Self::Future {
        let engine = self.game_engine;

        let analysis = if engine.is_terminal(game_state) {
            GameStateAnalysis::new(
                Utilities::from_ranking(&engine.ranking(game_state), engine.num_players()),
                Vec::new(),
            )
        } else {
            let actions = engine.legal_actions(game_state);
            let uniform_prior = 1.0 / actions.len() as f32;
            let policy_scores = actions
                .into_iter()
                .map(|action| ActionWithPolicy::new(action, uniform_prior))
                .collect();

            GameStateAnalysis::new(self.playout(game_state), policy_scores)
        };

        ready(analysis)
    }
}
