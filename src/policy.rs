//! Rollout move generators.
//!
//! A [`MoveGenerator`] proposes one move at a time for the side to move;
//! this single capability is all the playout loop and the searchers
//! depend on. Three implementations are provided:
//!
//! - [`RandomGenerator`]: uniformly random legal move that does not fill
//!   one of the mover's own eyes.
//! - [`RuleBasedGenerator`]: prefers moves near the last two moves whose
//!   3x3 neighborhood matches a playout pattern, with optional
//!   self-atari filtering; falls back to random.
//! - [`ProbabilisticGenerator`]: samples legal non-eye moves in
//!   proportion to their feature gamma under a trained weight table.

use std::sync::Arc;

use crate::ConfigError;
use crate::board::{Cell, Color, Point};
use crate::config::PolicyKind;
use crate::features::{NUM_SIMPLE_FEATURES, WeightTable, move_probabilities};
use crate::patterns::PatternTable;
use crate::position::Position;

/// The one capability search needs from a playout policy.
pub trait MoveGenerator {
    /// Propose a move for the side to move; `None` proposes a pass.
    /// Proposed stone moves are always legal in `pos`.
    fn propose(&mut self, pos: &mut Position) -> Option<Point>;
}

/// Uniformly random moves, skipping the mover's own true eyes.
pub struct RandomGenerator {
    rng: fastrand::Rng,
}

impl RandomGenerator {
    pub fn new(rng: fastrand::Rng) -> RandomGenerator {
        RandomGenerator { rng }
    }
}

impl MoveGenerator for RandomGenerator {
    fn propose(&mut self, pos: &mut Position) -> Option<Point> {
        random_move(pos, &mut self.rng)
    }
}

fn random_move(pos: &mut Position, rng: &mut fastrand::Rng) -> Option<Point> {
    let mut moves = pos.empty_points().to_vec();
    rng.shuffle(&mut moves);
    let color = pos.side_to_move();
    moves
        .into_iter()
        .find(|&mv| !pos.is_eye(mv, color) && pos.check_legal(Some(mv), color))
}

/// Pattern moves near the last two moves, falling back to random.
pub struct RuleBasedGenerator {
    table: Arc<PatternTable>,
    pub check_selfatari: bool,
    rng: fastrand::Rng,
}

impl RuleBasedGenerator {
    pub fn new(table: Arc<PatternTable>, check_selfatari: bool, rng: fastrand::Rng) -> Self {
        RuleBasedGenerator {
            table,
            check_selfatari,
            rng,
        }
    }
}

impl MoveGenerator for RuleBasedGenerator {
    fn propose(&mut self, pos: &mut Position) -> Option<Point> {
        let color = pos.side_to_move();
        let mut candidates = pos.last_moves_empty_neighbors();
        candidates.retain(|&mv| self.table.matches(&pos.neighborhood33(mv)));
        // Probe the candidates in random order, dropping the filtered
        // ones, so a bad pattern move never shadows a good one.
        while !candidates.is_empty() {
            let i = self.rng.usize(..candidates.len());
            let mv = candidates.swap_remove(i);
            if keep_move(pos, mv, color, self.check_selfatari) {
                return Some(mv);
            }
        }
        random_move(pos, &mut self.rng)
    }
}

/// Gamma-weighted sampling over all legal non-eye moves.
pub struct ProbabilisticGenerator {
    table: Arc<PatternTable>,
    weights: Arc<WeightTable>,
    rng: fastrand::Rng,
}

impl ProbabilisticGenerator {
    /// Fails when the weight table is too small to cover the simple
    /// features plus every pattern class.
    pub fn new(
        table: Arc<PatternTable>,
        weights: Arc<WeightTable>,
        rng: fastrand::Rng,
    ) -> Result<Self, ConfigError> {
        let need = NUM_SIMPLE_FEATURES + table.num_classes();
        if weights.len() < need {
            return Err(ConfigError::WeightTableTooSmall {
                need,
                got: weights.len(),
            });
        }
        Ok(ProbabilisticGenerator {
            table,
            weights,
            rng,
        })
    }
}

impl MoveGenerator for ProbabilisticGenerator {
    fn propose(&mut self, pos: &mut Position) -> Option<Point> {
        let (moves, probs) = move_probabilities(pos, &self.table, &self.weights);
        if moves.is_empty() {
            return None;
        }
        let mut r = self.rng.f64();
        for (&mv, &p) in moves.iter().zip(&probs) {
            if r < p {
                return Some(mv);
            }
            r -= p;
        }
        // Rounding can leave a sliver of probability unassigned.
        moves.last().copied()
    }
}

/// A configured playout policy. Tagged rather than boxed so engines can
/// reach policy-specific knobs; search code only sees [`MoveGenerator`].
pub enum Policy {
    Random(RandomGenerator),
    RuleBased(RuleBasedGenerator),
    Probabilistic(ProbabilisticGenerator),
}

impl Policy {
    pub fn build(
        kind: PolicyKind,
        table: &Arc<PatternTable>,
        weights: Option<&Arc<WeightTable>>,
        check_selfatari: bool,
        rng: fastrand::Rng,
    ) -> Result<Policy, ConfigError> {
        match kind {
            PolicyKind::Random => Ok(Policy::Random(RandomGenerator::new(rng))),
            PolicyKind::RuleBased => Ok(Policy::RuleBased(RuleBasedGenerator::new(
                table.clone(),
                check_selfatari,
                rng,
            ))),
            PolicyKind::Probabilistic => {
                let weights = weights.ok_or(ConfigError::MissingWeights)?;
                Ok(Policy::Probabilistic(ProbabilisticGenerator::new(
                    table.clone(),
                    weights.clone(),
                    rng,
                )?))
            }
        }
    }

    pub fn set_check_selfatari(&mut self, on: bool) {
        if let Policy::RuleBased(g) = self {
            g.check_selfatari = on;
        }
    }
}

impl MoveGenerator for Policy {
    fn propose(&mut self, pos: &mut Position) -> Option<Point> {
        match self {
            Policy::Random(g) => g.propose(pos),
            Policy::RuleBased(g) => g.propose(pos),
            Policy::Probabilistic(g) => g.propose(pos),
        }
    }
}

/// True when the move survives the playout filters: not an own-eye
/// fill, legal, and (when asked) not a self-atari.
fn keep_move(pos: &mut Position, mv: Point, color: Color, check_selfatari: bool) -> bool {
    !pos.is_eye(mv, color)
        && pos.check_legal(Some(mv), color)
        && !(check_selfatari && is_selfatari(pos, mv, color))
}

/// Does playing `mv` leave the mover's own block with a single liberty?
///
/// Blocks already holding more than two liberties cannot end in atari by
/// this move, which skips the trial play. Otherwise the move is played
/// and taken back again, leaving the position exactly as it was.
pub fn is_selfatari(pos: &mut Position, mv: Point, color: Color) -> bool {
    if blocks_max_liberty(pos, mv, color, 2) > 2 {
        return false;
    }
    if !pos.play(Some(mv), color) {
        return false;
    }
    let libs = pos.block_liberties(mv);
    pos.undo();
    libs == 1
}

/// Largest liberty count among the mover's blocks adjacent to `pt`,
/// or -1 when there are none. Returns early once a block exceeds
/// `limit`.
fn blocks_max_liberty(pos: &Position, pt: Point, color: Color, limit: i32) -> i32 {
    debug_assert_eq!(pos.cell(pt), Cell::Empty);
    let own = Cell::stone(color);
    let mut max_lib = -1;
    for n in pos.neighbors(pt) {
        if pos.cell(n) == own {
            let libs = pos.block_liberties(n) as i32;
            if libs > limit {
                return libs;
            }
            max_lib = max_lib.max(libs);
        }
    }
    max_lib
}

/// The moves the rule-based policy would consider, with a label for
/// reporting: the filtered pattern candidates when any survive, else
/// all legal non-eye moves.
pub fn all_policy_moves(
    pos: &mut Position,
    table: &PatternTable,
    check_selfatari: bool,
) -> (Vec<Point>, &'static str) {
    let color = pos.side_to_move();
    let mut candidates = pos.last_moves_empty_neighbors();
    candidates.retain(|&mv| table.matches(&pos.neighborhood33(mv)));
    candidates.retain(|&mv| keep_move(pos, mv, color, check_selfatari));
    if !candidates.is_empty() {
        return (candidates, "Pattern");
    }
    (all_random_moves(pos), "Random")
}

/// All legal moves that do not fill the mover's own eyes.
pub fn all_random_moves(pos: &mut Position) -> Vec<Point> {
    let color = pos.side_to_move();
    let empties: Vec<Point> = pos.empty_points().to_vec();
    empties
        .into_iter()
        .filter(|&mv| !pos.is_eye(mv, color) && pos.check_legal(Some(mv), color))
        .collect()
}
