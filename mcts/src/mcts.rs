use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};
use futures::stream::{FuturesOrdered, StreamExt};
use futures_intrusive::sync::LocalManualResetEvent;
use generational_arena::{Arena, Index};
use rand::Rng;

use engine::engine::GameEngine;
use engine::rank;
use engine::value::Value;
use model::GameAnalyzer;

use crate::backpropagation::{backpropagate, proof_mode_for_flags, BackpropagationHook};
use crate::final_move::select_robust_child;
use crate::node::PnsNode;
use crate::options::PnsMctsOptions;
use crate::proof::{
    MultiplayerProof, PnsNodeKind, ProofMode, ProofState, ScoreBoundsContext, ScoreBoundsProof,
    TwoValuedProof,
};
use crate::selection::select_child;

/// The search driver: owns the tree arena and runs traversals against the
/// configured game engine and analyzer. Traversals are interleaved up to
/// `options.parallelism` at a time, suspending only at the analyzer seam
/// and when waiting on a sibling traversal's in-flight expansion.
pub struct PnsMcts<'a, S, A, E, M, V, R>
where
    V: Value,
{
    options: PnsMctsOptions,
    backpropagation_flags: u32,
    proof_mode: ProofMode,
    game_engine: &'a E,
    analyzer: &'a M,
    starting_game_state: Option<S>,
    root: Option<Index>,
    arena: RefCell<Arena<PnsNode<S, A, V>>>,
    rng: RefCell<R>,
}

impl<'a, S, A, E, M, V, R> PnsMcts<'a, S, A, E, M, V, R>
where
    A: Clone + Eq + Debug,
    V: Value,
    E: 'a + GameEngine<State = S, Action = A>,
    M: 'a + GameAnalyzer<State = S, Action = A, Value = V>,
    R: Rng,
{
    pub fn new(
        game_state: S,
        game_engine: &'a E,
        analyzer: &'a M,
        strategy: &impl BackpropagationHook,
        options: PnsMctsOptions,
        rng: R,
    ) -> Self {
        Self::with_capacity(game_state, game_engine, analyzer, strategy, options, rng, 0)
    }

    pub fn with_capacity(
        game_state: S,
        game_engine: &'a E,
        analyzer: &'a M,
        strategy: &impl BackpropagationHook,
        options: PnsMctsOptions,
        rng: R,
        capacity: usize,
    ) -> Self {
        let backpropagation_flags = strategy.backpropagation_flags();

        Self {
            options,
            backpropagation_flags,
            proof_mode: proof_mode_for_flags(backpropagation_flags),
            game_engine,
            analyzer,
            starting_game_state: Some(game_state),
            root: None,
            arena: RefCell::new(Arena::with_capacity(capacity)),
            rng: RefCell::new(rng),
        }
    }

    pub async fn search_time(&mut self, duration: Duration) -> Result<usize> {
        let deadline = Instant::now() + duration;
        self.search(|_| Instant::now() < deadline).await
    }

    pub async fn search_visits(&mut self, visits: usize) -> Result<usize> {
        let mut searches = 0;

        self.search(|initial_visits| {
            let prev_searches = searches;
            searches += 1;
            initial_visits + prev_searches < visits
        })
        .await
    }

    /// Runs traversals while `alive` keeps returning true, feeding it the
    /// root's visit count at search start. Returns the maximum depth seen.
    pub async fn search<F: FnMut(usize) -> bool>(&mut self, mut alive: F) -> Result<usize> {
        let root_index = self.get_or_create_root_node().await;

        let game_engine = self.game_engine;
        let analyzer = self.analyzer;
        let options = &self.options;
        let flags = self.backpropagation_flags;
        let mode = self.proof_mode;
        let arena = &self.arena;
        let rng = &self.rng;

        let initial_visits = arena.borrow()[root_index].visits();
        let mut max_depth: usize = 0;
        let mut alive_flag = true;

        let mut traversals = FuturesOrdered::new();

        for _ in 0..options.parallelism {
            if alive_flag && alive(initial_visits) {
                traversals.push_back(traverse_and_expand(
                    root_index,
                    arena,
                    game_engine,
                    analyzer,
                    options,
                    flags,
                    mode,
                    rng,
                ));
            } else {
                alive_flag = false;
            }
        }

        while let Some(depth) = traversals.next().await {
            if alive_flag && alive(initial_visits) {
                traversals.push_back(traverse_and_expand(
                    root_index,
                    arena,
                    game_engine,
                    analyzer,
                    options,
                    flags,
                    mode,
                    rng,
                ));
            } else {
                alive_flag = false;
            }

            max_depth = max_depth.max(depth?);
        }

        Ok(max_depth)
    }

    /// Robust-child choice at the root. Run a search first.
    pub fn select_action(&self) -> Result<A> {
        let root_index = self
            .root
            .ok_or_else(|| anyhow!("Root node does not exist. Run search first."))?;

        let arena = self.arena.borrow();
        if arena[root_index].is_terminal() {
            bail!("The game has already ended");
        }

        let edge_index = select_robust_child(&arena, root_index, &mut *self.rng.borrow_mut());
        Ok(arena[root_index].edge(edge_index).action().clone())
    }

    /// Plays an action from the current root position. Proof numbers are
    /// relative to the player to move at the root, so the subtree is not
    /// reusable; the tree is rebuilt from the new position on the next
    /// search.
    pub fn advance_to_action(&mut self, action: A) -> Result<()> {
        let new_game_state = if let Some(root_index) = self.root {
            let arena = self.arena.borrow();
            let root = &arena[root_index];
            if !root.edges().iter().any(|edge| edge.action() == &action) {
                bail!("Action {:?} is not valid from the current position", action);
            }
            self.game_engine.take_action(root.game_state(), &action)
        } else {
            let game_state = self
                .starting_game_state
                .take()
                .ok_or_else(|| anyhow!("Starting game state was already consumed"))?;
            if !self.game_engine.legal_actions(&game_state).contains(&action) {
                self.starting_game_state = Some(game_state);
                bail!("Action {:?} is not valid from the current position", action);
            }
            self.game_engine.take_action(&game_state, &action)
        };

        self.arena.borrow_mut().clear();
        self.root = None;
        self.starting_game_state = Some(new_game_state);

        Ok(())
    }

    pub fn root_index(&self) -> Option<Index> {
        self.root
    }

    pub fn arena(&self) -> &RefCell<Arena<PnsNode<S, A, V>>> {
        &self.arena
    }

    async fn get_or_create_root_node(&mut self) -> Index {
        if let Some(root_index) = self.root {
            return root_index;
        }

        let game_state = self
            .starting_game_state
            .take()
            .expect("Tried to use the same starting game state twice");

        let root_node = analyse_and_create_node(
            game_state,
            None,
            &self.arena,
            self.game_engine,
            self.analyzer,
            self.proof_mode,
        )
        .await;

        let root_index = self.arena.borrow_mut().insert(root_node);
        self.root = Some(root_index);
        root_index
    }
}

enum Traversal {
    Descend(Index),
    Expand,
    Wait(Rc<LocalManualResetEvent>),
}

#[allow(clippy::too_many_arguments)]
async fn traverse_and_expand<S, A, E, M, V, R>(
    root_index: Index,
    arena: &RefCell<Arena<PnsNode<S, A, V>>>,
    game_engine: &E,
    analyzer: &M,
    options: &PnsMctsOptions,
    flags: u32,
    mode: ProofMode,
    rng: &RefCell<R>,
) -> Result<usize>
where
    A: Clone + Eq + Debug,
    V: Value,
    E: GameEngine<State = S, Action = A>,
    M: GameAnalyzer<State = S, Action = A, Value = V>,
    R: Rng,
{
    let mut path: Vec<Index> = Vec::new();
    let mut latest_index = root_index;

    {
        let mut arena_mut = arena.borrow_mut();
        arena_mut[latest_index].increment_virtual_visits();
    }
    path.push(latest_index);

    loop {
        if arena.borrow()[latest_index].is_terminal() {
            break;
        }

        let edge_index = {
            let arena_mut = &mut *arena.borrow_mut();
            select_child(arena_mut, latest_index, options, &mut *rng.borrow_mut())
        };

        let next = {
            let mut arena_mut = arena.borrow_mut();
            let edge = arena_mut[latest_index].edge_mut(edge_index);

            if let Some(child_index) = edge.node_index() {
                Traversal::Descend(child_index)
            } else if edge.is_unexpanded() {
                edge.mark_as_expanding();
                Traversal::Expand
            } else {
                Traversal::Wait(edge.get_waiter())
            }
        };

        match next {
            Traversal::Descend(child_index) => {
                latest_index = child_index;
                arena.borrow_mut()[latest_index].increment_virtual_visits();
                path.push(latest_index);
            }
            Traversal::Expand => {
                let game_state = {
                    let arena_borrow = arena.borrow();
                    let node = &arena_borrow[latest_index];
                    game_engine.take_action(node.game_state(), node.edge(edge_index).action())
                };

                let child = analyse_and_create_node(
                    game_state,
                    Some((latest_index, edge_index)),
                    arena,
                    game_engine,
                    analyzer,
                    mode,
                )
                .await;

                let mut arena_mut = arena.borrow_mut();
                let child_index = arena_mut.insert(child);
                arena_mut[latest_index]
                    .edge_mut(edge_index)
                    .set_expanded(child_index);
                arena_mut[child_index].increment_virtual_visits();
                drop(arena_mut);

                path.push(child_index);
                break;
            }
            Traversal::Wait(waiter) => {
                waiter.wait().await;
            }
        }
    }

    backpropagate(&mut arena.borrow_mut(), &path, options, flags);

    Ok(path.len())
}

async fn analyse_and_create_node<S, A, E, M, V>(
    game_state: S,
    parent: Option<(Index, usize)>,
    arena: &RefCell<Arena<PnsNode<S, A, V>>>,
    game_engine: &E,
    analyzer: &M,
    mode: ProofMode,
) -> PnsNode<S, A, V>
where
    V: Value,
    E: GameEngine<State = S, Action = A>,
    M: GameAnalyzer<State = S, Action = A, Value = V>,
{
    let num_players = game_engine.num_players();
    let player_to_move = game_engine.player_to_move(&game_state);
    let mover_agent = game_engine.player_to_agent(&game_state, player_to_move);
    let is_terminal = game_engine.is_terminal(&game_state);

    let (root_player, parent_best_available_rank) = match parent {
        Some((parent_index, _)) => {
            let arena_borrow = arena.borrow();
            let parent_node = &arena_borrow[parent_index];
            let parent_rank = parent_node
                .proof()
                .as_score_bounds()
                .map(|sb| sb.best_available_rank());
            (parent_node.root_player(), parent_rank)
        }
        None => (player_to_move, None),
    };

    let analysis = analyzer.get_state_analysis(&game_state).await;
    let policy_scores = if is_terminal {
        Vec::new()
    } else {
        analysis.policy_scores
    };

    let ranking = game_engine.ranking(&game_state);
    let terminal_utilities =
        is_terminal.then(|| rank::utilities(&ranking, num_players));

    let proof = match mode {
        ProofMode::TwoValued => {
            let kind = if player_to_move == root_player {
                PnsNodeKind::Or
            } else {
                PnsNodeKind::And
            };
            ProofState::TwoValued(TwoValuedProof::new(
                kind,
                terminal_utilities.as_deref(),
                root_player,
            ))
        }
        ProofMode::Multiplayer => ProofState::Multiplayer(MultiplayerProof::new(
            num_players,
            terminal_utilities.as_deref(),
        )),
        ProofMode::ScoreBounds => {
            let active: Vec<bool> = (0..=num_players)
                .map(|player| player >= 1 && game_engine.is_player_active(&game_state, player))
                .collect();

            ProofState::ScoreBounds(ScoreBoundsProof::new(&ScoreBoundsContext {
                num_players,
                best_available_rank: game_engine.next_win_rank(&game_state),
                parent_best_available_rank,
                ranking: &ranking,
                active: &active,
                next_win_rank: game_engine.next_win_rank(&game_state),
                next_loss_rank: game_engine.next_loss_rank(&game_state),
            }))
        }
    };

    PnsNode::new(
        game_state,
        parent,
        player_to_move,
        mover_agent,
        root_player,
        num_players,
        analysis.value_score,
        policy_scores,
        proof,
    )
}
