use engine::engine::GameEngine;
use engine::game_state::GameState;
use futures::future;
use model::{ActionWithPolicy, GameAnalyzer, GameStateAnalysis};

/// Two players pull a shared counter toward opposite ends. Player 1 wins at
/// 10, player 2 wins at 0. Small enough that a modest search proves the
/// outcome outright.
#[derive(Hash, PartialEq, Eq, Clone, Debug)]
pub struct CountingGameState {
    pub p1_turn: bool,
    pub count: usize,
}

impl CountingGameState {
    pub fn from_count(count: usize, p1_turn: bool) -> Self {
        Self { p1_turn, count }
    }

    fn p1_won(&self) -> bool {
        self.count == 10
    }

    fn p2_won(&self) -> bool {
        self.count == 0
    }
}

impl GameState for CountingGameState {
    fn initial() -> Self {
        Self {
            p1_turn: true,
            count: 5,
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum CountingAction {
    Increment,
    Decrement,
}

pub struct CountingGameEngine {}

impl CountingGameEngine {
    pub fn new() -> Self {
        Self {}
    }
}

impl GameEngine for CountingGameEngine {
    type Action = CountingAction;
    type State = CountingGameState;

    fn take_action(&self, game_state: &Self::State, action: &Self::Action) -> Self::State {
        let count = match action {
            CountingAction::Increment => game_state.count + 1,
            CountingAction::Decrement => game_state.count - 1,
        };

        Self::State {
            p1_turn: !game_state.p1_turn,
            count,
        }
    }

    fn player_to_move(&self, game_state: &Self::State) -> usize {
        if game_state.p1_turn {
            1
        } else {
            2
        }
    }

    fn num_players(&self) -> usize {
        2
    }

    fn legal_actions(&self, game_state: &Self::State) -> Vec<Self::Action> {
        if self.is_terminal(game_state) {
            Vec::new()
        } else {
            vec![CountingAction::Increment, CountingAction::Decrement]
        }
    }

    fn is_terminal(&self, game_state: &Self::State) -> bool {
        game_state.p1_won() || game_state.p2_won()
    }

    fn ranking(&self, game_state: &Self::State) -> Vec<f64> {
        if game_state.p1_won() {
            vec![0.0, 1.0, 2.0]
        } else if game_state.p2_won() {
            vec![0.0, 2.0, 1.0]
        } else {
            vec![0.0, 0.0, 0.0]
        }
    }

    fn next_win_rank(&self, _game_state: &Self::State) -> f64 {
        1.0
    }

    fn next_loss_rank(&self, _game_state: &Self::State) -> f64 {
        2.0
    }
}

#[derive(Clone)]
pub struct CountingValue(pub [f32; 2]);

impl engine::value::Value for CountingValue {
    fn get_value_for_player(&self, player: usize) -> f32 {
        self.0[player - 1]
    }
}

pub struct CountingAnalyzer {}

impl CountingAnalyzer {
    pub fn new() -> Self {
        Self {}
    }
}

impl GameAnalyzer for CountingAnalyzer {
    type Future = future::Ready<GameStateAnalysis<Self::Action, Self::Value>>;
    type Action = CountingAction;
    type State = CountingGameState;
    type Value = CountingValue;

    fn get_state_analysis(&self, game_state: &Self::State) -> Self::Future {
        if game_state.p1_won() {
            return future::ready(GameStateAnalysis::new(CountingValue([1.0, -1.0]), Vec::new()));
        }
        if game_state.p2_won() {
            return future::ready(GameStateAnalysis::new(CountingValue([-1.0, 1.0]), Vec::new()));
        }

        let p1_value = (game_state.count as f32 - 5.0) / 5.0;
        let value_score = CountingValue([p1_value, -p1_value]);
        let policy_scores = vec![
            ActionWithPolicy::new(CountingAction::Increment, 0.5),
            ActionWithPolicy::new(CountingAction::Decrement, 0.5),
        ];

        future::ready(GameStateAnalysis::new(value_score, policy_scores))
    }
}
