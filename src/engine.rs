//! Playing engines built on the searchers.
//!
//! [`BanditSearch`] treats genmove as a flat bandit problem: every
//! legal non-eye move is an arm, each playout a pull. [`TreeSearch`]
//! wraps the UCT tree and keeps it alive between moves. Both hide
//! behind [`SearchEngine`] so the GTP layer stays engine-agnostic.

use std::sync::Arc;
use std::time::Instant;

use crate::ConfigError;
use crate::board::{Color, Point, str_coord};
use crate::config::{MoveSelect, SearchConfig};
use crate::features::WeightTable;
use crate::mcts::Uct;
use crate::patterns::PatternTable;
use crate::playout::playout;
use crate::policy::Policy;
use crate::position::Position;
use crate::ucb;

fn build_policy(
    config: &SearchConfig,
    table: &Arc<PatternTable>,
    weights: Option<&Arc<WeightTable>>,
) -> Result<Policy, ConfigError> {
    let rng = config
        .seed
        .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
    Policy::build(config.policy, table, weights, config.check_selfatari, rng)
}

/// Flat UCB1 move chooser. Holds no state between moves beyond the
/// playout tally.
pub struct BanditSearch {
    config: SearchConfig,
    policy: Policy,
    total_simulations: u64,
}

impl BanditSearch {
    pub fn new(
        config: SearchConfig,
        table: Arc<PatternTable>,
        weights: Option<Arc<WeightTable>>,
    ) -> Result<BanditSearch, ConfigError> {
        if config.simulations == 0 {
            return Err(ConfigError::ZeroSimulations);
        }
        let policy = build_policy(&config, &table, weights.as_ref())?;
        Ok(BanditSearch {
            config,
            policy,
            total_simulations: 0,
        })
    }

    /// Pick a move for the side to move in `pos`.
    ///
    /// Every legal stone move is an arm, eye fills included; the
    /// playouts are what talk the bandit out of them. Passes outright
    /// when no legal stone move exists, or when the time limit expired
    /// before a single playout finished.
    pub fn genmove(&mut self, pos: &Position) -> Option<Point> {
        let color = pos.side_to_move();
        let stones = pos.clone().legal_moves(color);
        if stones.is_empty() {
            return None;
        }
        let mut arms: Vec<Option<Point>> = stones.into_iter().map(Some).collect();
        arms.push(None);

        let mut stats = vec![(0u32, 0u32); arms.len()];
        let deadline = self.config.time_limit.map(|limit| Instant::now() + limit);
        for n in 0..self.config.simulations {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }
            let i = match self.config.move_select {
                MoveSelect::Simple => n % arms.len(),
                MoveSelect::Ucb => ucb::select_arm(&stats, n, self.config.exploration),
            };
            let won = self.simulate(pos, arms[i], color);
            stats[i].1 += 1;
            if won {
                stats[i].0 += 1;
            }
            self.total_simulations += 1;
        }
        if stats.iter().all(|&(_, pulls)| pulls == 0) {
            return None;
        }
        if log::log_enabled!(log::Level::Trace) {
            for (arm, &(wins, pulls)) in arms.iter().zip(&stats) {
                log::trace!("arm {}: {wins}/{pulls}", str_coord(*arm, pos.size()));
            }
        }

        let best = match self.config.move_select {
            MoveSelect::Simple => ucb::most_wins(&stats),
            MoveSelect::Ucb => ucb::most_pulled(&stats),
        };
        log::debug!(
            "bandit picked {} with {}/{} over {} arms",
            str_coord(arms[best], pos.size()),
            stats[best].0,
            stats[best].1,
            arms.len()
        );
        arms[best]
    }

    /// One playout: play the arm, then let the policy finish the game.
    /// Returns whether the mover won.
    fn simulate(&mut self, pos: &Position, mv: Option<Point>, color: Color) -> bool {
        let mut sim = pos.clone();
        let legal = sim.play(mv, color);
        debug_assert!(legal, "bandit arm was illegal");
        let winner = playout(
            &mut sim,
            color.opponent(),
            self.config.komi,
            self.config.playout_limit,
            &mut self.policy,
        );
        winner == Some(color)
    }
}

/// UCT move chooser. The tree persists between moves and is re-rooted
/// through [`SearchEngine::advance`].
pub struct TreeSearch {
    config: SearchConfig,
    policy: Policy,
    uct: Uct,
}

impl TreeSearch {
    pub fn new(
        config: SearchConfig,
        table: Arc<PatternTable>,
        weights: Option<Arc<WeightTable>>,
    ) -> Result<TreeSearch, ConfigError> {
        if config.simulations == 0 {
            return Err(ConfigError::ZeroSimulations);
        }
        let policy = build_policy(&config, &table, weights.as_ref())?;
        Ok(TreeSearch {
            config,
            policy,
            uct: Uct::new(Color::Black),
        })
    }

    pub fn genmove(&mut self, pos: &Position) -> Option<Point> {
        let mv = self.uct.search(pos, &self.config, &mut self.policy);
        let root = self.uct.root();
        log::debug!(
            "uct picked {} after {} visits ({} for {})",
            str_coord(mv, pos.size()),
            root.visits,
            root.wins_for(pos.side_to_move()),
            pos.side_to_move()
        );
        mv
    }
}

/// The engine the GTP layer drives.
pub enum SearchEngine {
    Bandit(BanditSearch),
    Tree(TreeSearch),
}

impl SearchEngine {
    pub fn genmove(&mut self, pos: &Position) -> Option<Point> {
        match self {
            SearchEngine::Bandit(e) => e.genmove(pos),
            SearchEngine::Tree(e) => e.genmove(pos),
        }
    }

    /// Tell the engine a move was actually played.
    pub fn advance(&mut self, mv: Option<Point>) {
        if let SearchEngine::Tree(e) = self {
            e.uct.advance(mv);
        }
    }

    /// Forget everything position-bound; `side` moves first in the new
    /// game.
    pub fn reset(&mut self, side: Color) {
        if let SearchEngine::Tree(e) = self {
            e.uct.reset(side);
        }
    }

    pub fn config(&self) -> &SearchConfig {
        match self {
            SearchEngine::Bandit(e) => &e.config,
            SearchEngine::Tree(e) => &e.config,
        }
    }

    fn config_mut(&mut self) -> &mut SearchConfig {
        match self {
            SearchEngine::Bandit(e) => &mut e.config,
            SearchEngine::Tree(e) => &mut e.config,
        }
    }

    pub fn set_komi(&mut self, komi: f32) {
        self.config_mut().komi = komi;
    }

    pub fn set_simulations(&mut self, simulations: usize) -> Result<(), ConfigError> {
        if simulations == 0 {
            return Err(ConfigError::ZeroSimulations);
        }
        self.config_mut().simulations = simulations;
        Ok(())
    }

    pub fn set_check_selfatari(&mut self, on: bool) {
        self.config_mut().check_selfatari = on;
        match self {
            SearchEngine::Bandit(e) => e.policy.set_check_selfatari(on),
            SearchEngine::Tree(e) => e.policy.set_check_selfatari(on),
        }
    }

    /// Playouts run since the engine was built.
    pub fn total_simulations(&self) -> u64 {
        match self {
            SearchEngine::Bandit(e) => e.total_simulations,
            SearchEngine::Tree(e) => e.uct.simulations(),
        }
    }

    /// The live search tree, when there is one.
    pub fn tree(&self) -> Option<&Uct> {
        match self {
            SearchEngine::Bandit(_) => None,
            SearchEngine::Tree(e) => Some(&e.uct),
        }
    }
}
