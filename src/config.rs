//! Search configuration shared by both engines.

use std::time::Duration;

/// Which playout policy drives simulations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyKind {
    /// Uniformly random legal moves.
    Random,
    /// 3x3 pattern moves near the last two moves, then random.
    #[value(name = "rulebased")]
    RuleBased,
    /// Feature-weighted sampling; requires a weight table.
    Probabilistic,
}

/// How the flat bandit spends its budget and picks its answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum MoveSelect {
    /// Round-robin pulls, answer the arm with the most wins.
    Simple,
    /// UCB1 pulls, answer the most-pulled arm.
    Ucb,
}

/// Tunables for playouts and search, with sensible small-board defaults.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Simulation budget per move decision.
    pub simulations: usize,
    /// Maximum playout moves before the position is scored as it stands.
    pub playout_limit: usize,
    /// Compensation added to White's area score.
    pub komi: f32,
    /// Scale of the exploration term in UCB formulas.
    pub exploration: f64,
    pub policy: PolicyKind,
    /// Have the rule-based policy veto self-atari pattern moves.
    pub check_selfatari: bool,
    /// Answer selection for the flat bandit engine.
    pub move_select: MoveSelect,
    /// Wall-clock budget per move decision; unlimited when `None`.
    pub time_limit: Option<Duration>,
    /// Fixed RNG seed for reproducible searches.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            simulations: 300,
            playout_limit: 100,
            komi: 0.5,
            exploration: 0.4,
            policy: PolicyKind::Random,
            check_selfatari: false,
            move_select: MoveSelect::Simple,
            time_limit: None,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn new() -> SearchConfig {
        SearchConfig::default()
    }

    pub fn with_simulations(mut self, simulations: usize) -> Self {
        self.simulations = simulations;
        self
    }

    pub fn with_playout_limit(mut self, playout_limit: usize) -> Self {
        self.playout_limit = playout_limit;
        self
    }

    pub fn with_komi(mut self, komi: f32) -> Self {
        self.komi = komi;
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_check_selfatari(mut self, check_selfatari: bool) -> Self {
        self.check_selfatari = check_selfatari;
        self
    }

    pub fn with_move_select(mut self, move_select: MoveSelect) -> Self {
        self.move_select = move_select;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
