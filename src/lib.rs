//! Sente: a small Go engine.
//!
//! The crate pairs an exact rules engine (padded 1-D board, capture and
//! ko handling, area scoring, reversible moves) with two Monte Carlo
//! searchers sharing one set of playout policies.
//!
//! ## Modules
//!
//! - [`board`] - Points, colors and GTP coordinates
//! - [`position`] - Game state: legality, captures, ko, scoring, undo
//! - [`patterns`] - 3x3 playout patterns with stable class numbers
//! - [`features`] - Simple move features and trained weight tables
//! - [`policy`] - Playout policies: random, rule-based, probabilistic
//! - [`playout`] - Running a position out to a scored result
//! - [`ucb`] - Flat UCB1 arm selection
//! - [`mcts`] - UCT tree search
//! - [`engine`] - The playing engines behind GTP
//! - [`gtp`] - Go Text Protocol front end
//! - [`config`] - Shared search configuration
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use sente::board::Color;
//! use sente::config::SearchConfig;
//! use sente::engine::TreeSearch;
//! use sente::patterns::PatternTable;
//! use sente::position::Position;
//!
//! let mut pos = Position::new(9)?;
//! assert!(pos.play(Some(pos.point(3, 3)), Color::Black));
//!
//! let table = Arc::new(PatternTable::new());
//! let config = SearchConfig::new().with_simulations(50).with_seed(7);
//! let mut engine = TreeSearch::new(config, table, None)?;
//! let reply = engine.genmove(&pos);
//! assert!(pos.play(reply, Color::White));
//! # Ok::<(), sente::ConfigError>(())
//! ```

use thiserror::Error;

pub mod board;
pub mod config;
pub mod engine;
pub mod features;
pub mod gtp;
pub mod mcts;
pub mod patterns;
pub mod playout;
pub mod policy;
pub mod position;
pub mod ucb;

/// Configuration and setup failures surfaced to callers.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Board side outside the supported range.
    #[error("board size {0} is outside 2..=25")]
    BoardSize(usize),
    #[error("simulation budget must be positive")]
    ZeroSimulations,
    #[error("probabilistic policy needs a weight table")]
    MissingWeights,
    #[error("weight table holds {got} weights, need at least {need}")]
    WeightTableTooSmall { need: usize, got: usize },
    #[error("weight file line {line}: {reason}")]
    WeightFormat { line: usize, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
