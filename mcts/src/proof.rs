use engine::rank;

/// Proof-state of a position for a player. Transitions are one-directional:
/// `Unknown` may become `Proven` or `Disproven`, never the reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofValue {
    Proven,
    Disproven,
    Unknown,
}

/// A node is OR for a player if that player moves there, AND otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PnsNodeKind {
    Or,
    And,
}

/// Which proof payload the tree carries. Derived from the backpropagation
/// flags of the configured strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofMode {
    TwoValued,
    Multiplayer,
    ScoreBounds,
}

/// Classical PNS payload: a single proof/disproof pair from the point of
/// view of the player to move at the root.
#[derive(Debug)]
pub struct TwoValuedProof {
    pub(crate) kind: PnsNodeKind,
    pub(crate) proof: f64,
    pub(crate) disproof: f64,
    pub(crate) value: ProofValue,
}

impl TwoValuedProof {
    /// `terminal_utilities` is `Some` for terminal positions; proof numbers
    /// are initialized directly from the outcome in that case.
    pub fn new(kind: PnsNodeKind, terminal_utilities: Option<&[f64]>, root_player: usize) -> Self {
        let (proof, disproof, value) = match terminal_utilities {
            Some(utilities) if utilities[root_player] == 1.0 => {
                (0.0, f64::INFINITY, ProofValue::Proven)
            }
            Some(_) => (f64::INFINITY, 0.0, ProofValue::Disproven),
            None => (1.0, 1.0, ProofValue::Unknown),
        };

        Self {
            kind,
            proof,
            disproof,
            value,
        }
    }

    pub fn kind(&self) -> PnsNodeKind {
        self.kind
    }

    pub fn proof_number(&self) -> f64 {
        self.proof
    }

    pub fn disproof_number(&self) -> f64 {
        self.disproof
    }

    pub fn value(&self) -> ProofValue {
        self.value
    }
}

/// One proof number per player, each aggregated from that player's own
/// OR/AND perspective. Only proof numbers are tracked; a disproven player is
/// a proof number of infinity.
#[derive(Debug)]
pub struct MultiplayerProof {
    pub(crate) proof: Vec<f64>,
    pub(crate) values: Vec<ProofValue>,
}

impl MultiplayerProof {
    pub fn new(num_players: usize, terminal_utilities: Option<&[f64]>) -> Self {
        let mut proof = vec![1.0; num_players + 1];
        let mut values = vec![ProofValue::Unknown; num_players + 1];

        if let Some(utilities) = terminal_utilities {
            for player in 1..=num_players {
                if utilities[player] == 1.0 {
                    values[player] = ProofValue::Proven;
                    proof[player] = 0.0;
                } else {
                    values[player] = ProofValue::Disproven;
                    proof[player] = f64::INFINITY;
                }
            }
        }

        Self { proof, values }
    }

    pub fn proof_number(&self, player: usize) -> f64 {
        self.proof[player]
    }

    pub fn value(&self, player: usize) -> ProofValue {
        self.values[player]
    }
}

/// Multiplayer proof numbers keyed to "achieves the best still-unclaimed
/// rank", plus per-agent pessimistic/optimistic utility bounds.
#[derive(Debug)]
pub struct ScoreBoundsProof {
    pub(crate) proof: Vec<f64>,
    pub(crate) pess: Vec<f64>,
    pub(crate) opt: Vec<f64>,
    /// Target rank for proving our children: the best rank that was still
    /// unclaimed when this node was created.
    pub(crate) best_available_rank: f64,
    pub(crate) pruned: bool,
}

pub struct ScoreBoundsContext<'a> {
    pub num_players: usize,
    pub best_available_rank: f64,
    /// Best available rank at the parent, `None` at the root.
    pub parent_best_available_rank: Option<f64>,
    pub ranking: &'a [f64],
    pub active: &'a [bool],
    pub next_win_rank: f64,
    pub next_loss_rank: f64,
}

impl ScoreBoundsProof {
    pub fn new(ctx: &ScoreBoundsContext) -> Self {
        let num_players = ctx.num_players;
        let mut proof = vec![1.0; num_players + 1];

        // A player that already finished is resolved immediately: proven if
        // it claimed the rank its parent was still playing for, disproven
        // for any other rank. Proving one player disproves all others.
        if let Some(parent_rank) = ctx.parent_best_available_rank {
            for player in 1..=num_players {
                if !ctx.active[player] {
                    if ctx.ranking[player] == parent_rank {
                        for p in 1..=num_players {
                            proof[p] = f64::INFINITY;
                        }
                        proof[player] = 0.0;
                        break;
                    } else {
                        proof[player] = f64::INFINITY;
                    }
                }
            }
        }

        let current_utils = rank::utilities(ctx.ranking, num_players);
        let next_worst_score = rank::rank_to_util(ctx.next_loss_rank, num_players);
        let next_best_score = rank::rank_to_util(ctx.next_win_rank, num_players);

        let mut pess = vec![0.0; num_players + 1];
        let mut opt = vec![0.0; num_players + 1];

        for player in 1..=num_players {
            if !ctx.active[player] {
                pess[player] = current_utils[player];
                opt[player] = current_utils[player];
            } else {
                pess[player] = next_worst_score;
                opt[player] = next_best_score;
            }
        }

        Self {
            proof,
            pess,
            opt,
            best_available_rank: ctx.best_available_rank,
            pruned: false,
        }
    }

    pub fn proof_number(&self, player: usize) -> f64 {
        self.proof[player]
    }

    pub fn pess_bound(&self, agent: usize) -> f64 {
        self.pess[agent]
    }

    pub fn opt_bound(&self, agent: usize) -> f64 {
        self.opt[agent]
    }

    pub fn best_available_rank(&self) -> f64 {
        self.best_available_rank
    }

    pub fn is_pruned(&self) -> bool {
        self.pruned
    }

    pub fn mark_pruned(&mut self) {
        self.pruned = true;
    }
}

#[derive(Debug)]
pub enum ProofState {
    TwoValued(TwoValuedProof),
    Multiplayer(MultiplayerProof),
    ScoreBounds(ScoreBoundsProof),
}

impl ProofState {
    pub fn mode(&self) -> ProofMode {
        match self {
            Self::TwoValued(_) => ProofMode::TwoValued,
            Self::Multiplayer(_) => ProofMode::Multiplayer,
            Self::ScoreBounds(_) => ProofMode::ScoreBounds,
        }
    }

    /// Proof number from the given player's perspective. The two-valued
    /// payload tracks only the root player and ignores the argument.
    pub fn proof_number(&self, player: usize) -> f64 {
        match self {
            Self::TwoValued(tv) => tv.proof,
            Self::Multiplayer(mp) => mp.proof[player],
            Self::ScoreBounds(sb) => sb.proof[player],
        }
    }

    pub fn is_value_proven(&self, agent: usize) -> bool {
        match self {
            Self::TwoValued(tv) => tv.value != ProofValue::Unknown,
            Self::Multiplayer(mp) => mp.values[agent] != ProofValue::Unknown,
            Self::ScoreBounds(sb) => sb.pess[agent] == sb.opt[agent],
        }
    }

    pub fn as_two_valued(&self) -> Option<&TwoValuedProof> {
        if let Self::TwoValued(tv) = self {
            Some(tv)
        } else {
            None
        }
    }

    pub fn as_score_bounds(&self) -> Option<&ScoreBoundsProof> {
        if let Self::ScoreBounds(sb) = self {
            Some(sb)
        } else {
            None
        }
    }

    pub fn as_score_bounds_mut(&mut self) -> Option<&mut ScoreBoundsProof> {
        if let Self::ScoreBounds(sb) = self {
            Some(sb)
        } else {
            None
        }
    }
}
