use engine::engine::GameEngine;

pub const NUM_PLAYERS: usize = 3;
pub const GOAL: usize = 4;

/// Three players race to a goal square, moving one or two steps on their
/// turn. A player reaching the goal claims the best unclaimed rank and
/// leaves the game; when only one racer remains they take the last rank and
/// the game ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaceGameState {
    pub positions: Vec<usize>,
    pub ranks: Vec<usize>,
    pub turn: usize,
}

impl RaceGameState {
    pub fn initial() -> Self {
        Self::with_positions([0, 0, 0], 1)
    }

    pub fn with_positions(positions: [usize; NUM_PLAYERS], turn: usize) -> Self {
        let mut all_positions = vec![0; NUM_PLAYERS + 1];
        all_positions[1..].copy_from_slice(&positions);

        Self {
            positions: all_positions,
            ranks: vec![0; NUM_PLAYERS + 1],
            turn,
        }
    }

    fn num_ranked(&self) -> usize {
        self.ranks.iter().skip(1).filter(|&&r| r > 0).count()
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum RaceAction {
    Step1,
    Step2,
}

pub struct RaceGameEngine {}

impl RaceGameEngine {
    pub fn new() -> Self {
        Self {}
    }
}

impl GameEngine for RaceGameEngine {
    type Action = RaceAction;
    type State = RaceGameState;

    fn take_action(&self, game_state: &Self::State, action: &Self::Action) -> Self::State {
        let mut game_state = game_state.clone();
        let player = game_state.turn;

        game_state.positions[player] += match action {
            RaceAction::Step1 => 1,
            RaceAction::Step2 => 2,
        };

        if game_state.positions[player] >= GOAL {
            game_state.ranks[player] = game_state.num_ranked() + 1;

            let remaining: Vec<usize> = (1..=NUM_PLAYERS)
                .filter(|&p| game_state.ranks[p] == 0)
                .collect();
            if let [last] = remaining[..] {
                game_state.ranks[last] = NUM_PLAYERS;
            }
        }

        if (1..=NUM_PLAYERS).any(|p| game_state.ranks[p] == 0) {
            let mut next = player % NUM_PLAYERS + 1;
            while game_state.ranks[next] != 0 {
                next = next % NUM_PLAYERS + 1;
            }
            game_state.turn = next;
        }

        game_state
    }

    fn player_to_move(&self, game_state: &Self::State) -> usize {
        game_state.turn
    }

    fn num_players(&self) -> usize {
        NUM_PLAYERS
    }

    fn legal_actions(&self, game_state: &Self::State) -> Vec<Self::Action> {
        if self.is_terminal(game_state) {
            Vec::new()
        } else {
            vec![RaceAction::Step1, RaceAction::Step2]
        }
    }

    fn is_terminal(&self, game_state: &Self::State) -> bool {
        game_state.num_ranked() == NUM_PLAYERS
    }

    fn ranking(&self, game_state: &Self::State) -> Vec<f64> {
        game_state.ranks.iter().map(|&r| r as f64).collect()
    }

    fn is_player_active(&self, game_state: &Self::State, player: usize) -> bool {
        game_state.ranks[player] == 0
    }

    fn next_win_rank(&self, game_state: &Self::State) -> f64 {
        (game_state.num_ranked() + 1) as f64
    }

    fn next_loss_rank(&self, _game_state: &Self::State) -> f64 {
        NUM_PLAYERS as f64
    }
}
