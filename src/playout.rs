//! Monte Carlo playouts.
//!
//! A playout hands the position to a policy one move at a time until
//! the game ends with two consecutive passes, then area-scores whatever
//! is on the board. A move cap keeps degenerate simulations from
//! running away; a capped game is scored as it stands.

use crate::board::Color;
use crate::policy::MoveGenerator;
use crate::position::Position;

/// Play `pos` out with `generator` and score the result.
///
/// Returns the winner under area scoring with `komi`, or `None` for a
/// dead-even position. `to_move` must agree with the position's own
/// record of whose turn it is. At most `limit` moves are made, passes
/// included.
pub fn playout<G: MoveGenerator>(
    pos: &mut Position,
    to_move: Color,
    komi: f32,
    limit: usize,
    generator: &mut G,
) -> Option<Color> {
    debug_assert_eq!(
        pos.side_to_move(),
        to_move,
        "caller and position disagree on the mover"
    );
    for _ in 0..limit {
        if pos.is_end_of_game() {
            break;
        }
        let color = pos.side_to_move();
        let mv = generator.propose(pos);
        let legal = pos.play(mv, color);
        assert!(legal, "policy proposed an illegal move");
    }
    pos.score(komi).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RandomGenerator;

    #[test]
    fn test_playout_is_deterministic_under_a_seed() {
        let run = || {
            let mut pos = Position::new(4).unwrap();
            let mut generator = RandomGenerator::new(fastrand::Rng::with_seed(123));
            let winner = playout(&mut pos, Color::Black, 0.5, 400, &mut generator);
            (winner, pos.moves_count())
        };
        let first = run();
        let second = run();
        assert!(first.1 > 0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_playout_result_matches_final_score() {
        let mut pos = Position::new(4).unwrap();
        let mut generator = RandomGenerator::new(fastrand::Rng::with_seed(8));
        let winner = playout(&mut pos, Color::Black, 0.5, 400, &mut generator);
        assert_eq!(winner, pos.score(0.5).0);
    }

    #[test]
    fn test_playout_leaves_finished_game_alone() {
        let mut pos = Position::new(4).unwrap();
        assert!(pos.play(None, Color::Black));
        assert!(pos.play(None, Color::White));
        assert!(pos.is_end_of_game());
        let moves = pos.moves_count();
        // Empty finished board: White ahead by komi.
        let winner = playout(&mut pos, Color::Black, 0.5, 400, &mut gen_random());
        assert_eq!(winner, Some(Color::White));
        assert_eq!(pos.moves_count(), moves);
    }

    #[test]
    fn test_zero_limit_scores_in_place() {
        let mut pos = Position::new(5).unwrap();
        let winner = playout(&mut pos, Color::Black, 7.5, 0, &mut gen_random());
        assert_eq!(winner, Some(Color::White));
        assert_eq!(pos.moves_count(), 0);
    }

    fn gen_random() -> RandomGenerator {
        RandomGenerator::new(fastrand::Rng::with_seed(0))
    }
}
