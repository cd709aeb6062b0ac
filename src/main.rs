//! Sente: a small Go engine.
//!
//! ## Usage
//!
//! - `sente` - Self-play demo on the default board
//! - `sente gtp` - Serve GTP on stdin/stdout for GUI front ends
//! - `sente demo` - Self-play demo
//!
//! Engine, policy and budget are chosen with flags; see `sente --help`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use sente::board::{Color, str_coord};
use sente::config::{MoveSelect, PolicyKind, SearchConfig};
use sente::engine::{BanditSearch, SearchEngine, TreeSearch};
use sente::features::WeightTable;
use sente::gtp::GtpEngine;
use sente::patterns::PatternTable;
use sente::position::Position;

/// Sente: a small Go engine
#[derive(Parser)]
#[command(name = "sente")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Board side length
    #[arg(long, default_value_t = 9)]
    size: usize,

    /// Which searcher picks the moves
    #[arg(long, value_enum, default_value_t = EngineKind::Mcts)]
    engine: EngineKind,

    /// Playout policy
    #[arg(long, value_enum, default_value_t = PolicyKind::Random)]
    policy: PolicyKind,

    /// Playouts per move decision
    #[arg(long, default_value_t = 300)]
    simulations: usize,

    /// Longest playout before the position is scored as it stands
    #[arg(long, default_value_t = 100)]
    limit: usize,

    /// Komi added to White's area score
    #[arg(long, default_value_t = 0.5)]
    komi: f32,

    /// Scale of the exploration term
    #[arg(long, default_value_t = 0.4)]
    exploration: f64,

    /// Answer selection for the flat engine
    #[arg(long = "moveselect", value_enum, default_value_t = MoveSelect::Simple)]
    move_select: MoveSelect,

    /// Have the rule-based policy skip self-atari moves
    #[arg(long = "movefilter")]
    move_filter: bool,

    /// Weight file for the probabilistic policy
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Wall-clock budget per move, in milliseconds
    #[arg(long = "time-limit-ms")]
    time_limit_ms: Option<u64>,

    /// Fix the RNG seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GTP on stdin/stdout for GUI front ends
    Gtp,
    /// Play the engine against itself and print the result
    Demo,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum EngineKind {
    /// Flat UCB over the root moves
    Flat,
    /// UCT tree search
    Mcts,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = SearchConfig::new()
        .with_simulations(cli.simulations)
        .with_playout_limit(cli.limit)
        .with_komi(cli.komi)
        .with_exploration(cli.exploration)
        .with_policy(cli.policy)
        .with_check_selfatari(cli.move_filter)
        .with_move_select(cli.move_select)
        .with_time_limit(cli.time_limit_ms.map(Duration::from_millis));
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let table = Arc::new(PatternTable::new());
    let weights = match &cli.weights {
        Some(path) => {
            let loaded = WeightTable::load(path)
                .with_context(|| format!("loading weights from {}", path.display()))?;
            Some(Arc::new(loaded))
        }
        None => None,
    };

    let komi = config.komi;
    let engine = match cli.engine {
        EngineKind::Flat => {
            SearchEngine::Bandit(BanditSearch::new(config, table.clone(), weights)?)
        }
        EngineKind::Mcts => SearchEngine::Tree(TreeSearch::new(config, table.clone(), weights)?),
    };

    match cli.command {
        Some(Commands::Gtp) => {
            let mut gtp = GtpEngine::new(engine, table, cli.size)?;
            gtp.run()?;
        }
        Some(Commands::Demo) | None => run_demo(engine, cli.size, komi)?,
    }
    Ok(())
}

/// Let the engine play itself to two passes and report the result.
fn run_demo(mut engine: SearchEngine, size: usize, komi: f32) -> Result<()> {
    println!("sente self-play on a {size}x{size} board\n");
    let mut pos = Position::new(size)?;
    let max_moves = size * size * 4;
    while !pos.is_end_of_game() && pos.moves_count() < max_moves {
        let color = pos.side_to_move();
        let mv = engine.genmove(&pos);
        if !pos.play(mv, color) {
            bail!("engine produced an illegal move");
        }
        engine.advance(mv);
        println!("{} plays {}", color, str_coord(mv, size));
    }
    println!("\n{pos}");
    let (winner, margin) = pos.score(komi);
    match winner {
        Some(Color::Black) => println!("result: B+{margin}"),
        Some(Color::White) => println!("result: W+{margin}"),
        None => println!("result: 0"),
    }
    println!("playouts: {}", engine.total_simulations());
    Ok(())
}
