/// The game collaborator consumed by the search.
///
/// Players are numbered starting at 1; index 0 is unused throughout.
/// Rankings are 1.0 for the best finishing position up to `num_players()`
/// for the worst, with 0.0 meaning "not yet assigned".
pub trait GameEngine {
    type Action;
    type State;

    fn take_action(&self, game_state: &Self::State, action: &Self::Action) -> Self::State;

    fn player_to_move(&self, game_state: &Self::State) -> usize;

    fn num_players(&self) -> usize;

    fn legal_actions(&self, game_state: &Self::State) -> Vec<Self::Action>;

    fn is_terminal(&self, game_state: &Self::State) -> bool;

    /// Ranks claimed so far, indexed by player. Players that are still
    /// active in the game hold rank 0.0.
    fn ranking(&self, game_state: &Self::State) -> Vec<f64>;

    /// A player that has finished (claimed a rank) is no longer active,
    /// even if the game as a whole continues.
    fn is_player_active(&self, game_state: &Self::State, player: usize) -> bool {
        !self.is_terminal(game_state)
    }

    /// Best rank still claimable by a player finishing now.
    fn next_win_rank(&self, game_state: &Self::State) -> f64;

    /// Worst rank still claimable by a player finishing now.
    fn next_loss_rank(&self, game_state: &Self::State) -> f64;

    /// Maps a player number to its agent index. Identity unless the game
    /// swaps seats mid-match.
    fn player_to_agent(&self, _game_state: &Self::State, player: usize) -> usize {
        player
    }
}
