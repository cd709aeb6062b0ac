//! Rules engine regression suite.
//!
//! Exercises the position through its public surface the way a GTP
//! session would: alternating moves, legality probes, captures, ko,
//! undo, scoring and the safety solver. The fingerprint helper pins the
//! whole observable state so restore bugs cannot hide.

use sente::board::{Cell, Color, Point, parse_coord};
use sente::position::Position;

// =============================================================================
// Helper functions
// =============================================================================

/// Play out a sequence of coords with alternating colors, Black first.
/// "pass" passes.
fn setpos(size: usize, moves: &[&str]) -> Position {
    let mut pos = Position::new(size).unwrap();
    for mv in moves {
        let parsed = if mv.eq_ignore_ascii_case("pass") {
            None
        } else {
            Some(parse_coord(mv, size).unwrap_or_else(|| panic!("bad coord {mv} in setpos")))
        };
        let color = pos.side_to_move();
        assert!(pos.play(parsed, color), "illegal move {mv} in setpos");
    }
    pos
}

fn pt(pos: &Position, s: &str) -> Point {
    parse_coord(s, pos.size()).unwrap()
}

/// Everything observable about a position. Two equal fingerprints mean
/// play/undo and legality probes left no trace anywhere.
#[derive(Debug, PartialEq)]
struct Fingerprint {
    cells: Vec<u8>,
    hints: Vec<Option<Point>>,
    side: Color,
    ko: Option<Point>,
    passes: u32,
    empties: Vec<Point>,
    last: (Option<Point>, Option<Point>),
    moves: usize,
    captures: (u32, u32),
}

fn fingerprint(pos: &Position) -> Fingerprint {
    let cells = (0..pos.max_point())
        .map(|p| match pos.cell(p) {
            Cell::Empty => b'.',
            Cell::Black => b'X',
            Cell::White => b'O',
            Cell::Border => b'#',
        })
        .collect();
    // A hint whose cell has since been filled is ignored by the next
    // liberty search, so it fingerprints the same as no hint.
    let hints = (0..pos.max_point())
        .map(|p| pos.liberty_hint(p).filter(|&h| pos.cell(h) == Cell::Empty))
        .collect();
    let mut empties = pos.empty_points().to_vec();
    empties.sort_unstable();
    Fingerprint {
        cells,
        hints,
        side: pos.side_to_move(),
        ko: pos.ko_point(),
        passes: pos.num_pass(),
        empties,
        last: (pos.last_move(), pos.last2_move()),
        moves: pos.moves_count(),
        captures: (pos.captures(Color::Black), pos.captures(Color::White)),
    }
}

/// A position holding a live ko: Black just took at c3, White may not
/// retake at c2 immediately.
///
/// ```text
/// 5  . . . . X
/// 4  . . O . .
/// 3  . O X O .
/// 2  . X . X .   (c2 just captured)
/// 1  . . X . .
/// ```
fn ko_position() -> Position {
    let pos = setpos(5, &["b2", "b3", "c1", "c4", "d2", "d3", "e5", "c2", "c3"]);
    assert_eq!(pos.ko_point(), Some(parse_coord("c2", 5).unwrap()));
    pos
}

// =============================================================================
// Legality probes leave no trace
// =============================================================================

#[test]
fn test_check_legal_leaves_no_trace() {
    let mut pos = ko_position();
    let before = fingerprint(&pos);

    let c2 = pt(&pos, "c2");
    let a1 = pt(&pos, "a1");
    let b2 = pt(&pos, "b2");
    assert!(!pos.check_legal(Some(c2), Color::White), "ko retake");
    assert!(pos.check_legal(Some(a1), Color::White));
    assert!(!pos.check_legal(Some(b2), Color::White), "occupied");
    assert!(pos.check_legal(None, Color::White), "pass is always legal");

    assert_eq!(fingerprint(&pos), before);
}

#[test]
fn test_check_legal_probes_captures_without_capturing() {
    // White b1 has one liberty at a1; Black a1 would capture it and is
    // legal even though a1 alone has no liberty of its own.
    let mut pos = setpos(5, &["b2", "b1", "a2", "pass", "c1", "pass"]);
    let before = fingerprint(&pos);
    let a1 = pt(&pos, "a1");
    assert!(pos.check_legal(Some(a1), Color::Black));
    // Joining the doomed block does not rescue it: a1 is suicide for
    // White.
    assert!(!pos.check_legal(Some(a1), Color::White));
    assert_eq!(fingerprint(&pos), before);
}

// =============================================================================
// Play and undo are exact inverses
// =============================================================================

#[test]
fn test_play_undo_roundtrip_simple() {
    let mut pos = Position::new(5).unwrap();
    let initial = fingerprint(&pos);
    assert!(pos.play(Some(pt(&pos, "c3")), Color::Black));
    pos.undo();
    assert_eq!(fingerprint(&pos), initial);
}

#[test]
fn test_play_undo_roundtrip_with_capture() {
    // Black captures the two-stone White column b1-b2.
    let mut pos = setpos(5, &["a1", "b1", "a2", "b2", "c1", "pass", "c2", "pass"]);
    let before = fingerprint(&pos);
    let b3 = pt(&pos, "b3");
    assert!(pos.play(Some(b3), Color::Black));
    assert_eq!(pos.cell(pt(&pos, "b1")), Cell::Empty);
    assert_eq!(pos.cell(pt(&pos, "b2")), Cell::Empty);
    assert_eq!(pos.captures(Color::Black), 2);
    pos.undo();
    assert_eq!(fingerprint(&pos), before);
}

#[test]
fn test_play_undo_roundtrip_through_ko() {
    let mut pos = ko_position();
    let before = fingerprint(&pos);
    // White answers the ko elsewhere; the ban lifts.
    assert!(pos.play(Some(pt(&pos, "a5")), Color::White));
    assert_eq!(pos.ko_point(), None);
    pos.undo();
    assert_eq!(fingerprint(&pos), before);
}

#[test]
fn test_undo_restores_passes_and_game_end() {
    let mut pos = setpos(5, &["c3", "pass", "pass"]);
    assert!(pos.is_end_of_game());
    pos.undo();
    assert!(!pos.is_end_of_game());
    assert_eq!(pos.num_pass(), 1);
    assert_eq!(pos.side_to_move(), Color::Black);
    pos.undo();
    assert_eq!(pos.num_pass(), 0);
    assert_eq!(pos.side_to_move(), Color::White);
    assert_eq!(pos.last_move(), Some(pt(&pos, "c3")));
}

#[test]
fn test_long_game_fully_unwinds() {
    // Unfiltered random legal moves: fills eyes, forces captures, the
    // works. Unwinding all of it must restore the pristine board.
    let mut pos = Position::new(5).unwrap();
    let initial = fingerprint(&pos);
    let mut rng = fastrand::Rng::with_seed(42);
    let total = 60;
    for _ in 0..total {
        let color = pos.side_to_move();
        let mut empties = pos.empty_points().to_vec();
        rng.shuffle(&mut empties);
        let mv = empties
            .into_iter()
            .find(|&p| pos.check_legal(Some(p), color));
        assert!(pos.play(mv, color));
    }
    for _ in 0..total {
        pos.undo();
    }
    assert_eq!(fingerprint(&pos), initial);
}

// =============================================================================
// Ko lifecycle
// =============================================================================

#[test]
fn test_ko_forbids_immediate_retake_only() {
    let mut pos = ko_position();
    let c2 = pt(&pos, "c2");
    let c3 = pt(&pos, "c3");

    assert!(!pos.play(Some(c2), Color::White), "immediate retake");
    // The failed attempt must not have touched anything, the ko
    // included.
    assert_eq!(pos.ko_point(), Some(c2));
    assert_eq!(pos.side_to_move(), Color::White);

    // White plays a ko threat elsewhere, Black ignores it.
    assert!(pos.play(Some(pt(&pos, "a1")), Color::White));
    assert_eq!(pos.ko_point(), None);
    assert!(pos.play(Some(pt(&pos, "e1")), Color::Black));

    // Now the retake is fine and flips the ko the other way.
    assert!(pos.play(Some(c2), Color::White));
    assert_eq!(pos.cell(c3), Cell::Empty);
    assert_eq!(pos.ko_point(), Some(c3));
}

#[test]
fn test_pass_leaves_ko_in_place() {
    let mut pos = ko_position();
    let c2 = pt(&pos, "c2");
    assert!(pos.play(None, Color::White));
    assert_eq!(pos.ko_point(), Some(c2));
}

#[test]
fn test_multi_stone_capture_sets_no_ko() {
    // Capturing two stones never opens a ko.
    let mut pos = setpos(5, &["a1", "b1", "a2", "b2", "c1", "pass", "c2", "pass"]);
    assert!(pos.play(Some(pt(&pos, "b3")), Color::Black));
    assert_eq!(pos.ko_point(), None);
}

// =============================================================================
// Suicide
// =============================================================================

#[test]
fn test_suicide_rejected_and_board_intact() {
    let mut pos = setpos(5, &["b1", "pass", "a2", "pass"]);
    let before = fingerprint(&pos);
    let a1 = pt(&pos, "a1");
    assert!(!pos.play(Some(a1), Color::White));
    assert_eq!(fingerprint(&pos), before);
}

#[test]
fn test_suicide_allowed_when_rule_disabled() {
    let mut pos = setpos(5, &["b1", "pass", "a2", "pass"]);
    pos.check_suicide = false;
    let a1 = pt(&pos, "a1");
    assert!(pos.play(Some(a1), Color::White));
    // The stone stays, breathless, until something around it changes.
    assert_eq!(pos.cell(a1), Cell::White);
    assert_eq!(pos.block_liberties(a1), 0);
}

// =============================================================================
// Scoring
// =============================================================================

#[test]
fn test_score_empty_board_goes_to_komi() {
    let pos = Position::new(5).unwrap();
    assert_eq!(pos.score(0.5), (Some(Color::White), 0.5));
    assert_eq!(pos.score(0.0), (None, 0.0));
}

#[test]
fn test_score_single_color_wall_owns_everything() {
    // A black column through c1..c5; both sides are black territory.
    let pos = setpos(5, &["c1", "pass", "c2", "pass", "c3", "pass", "c4", "pass", "c5", "pass"]);
    let (winner, margin) = pos.score(0.5);
    assert_eq!(winner, Some(Color::Black));
    assert_eq!(margin, 24.5);
}

#[test]
fn test_score_contested_region_counts_for_neither() {
    // The black wall again, but a white stone at e3 poisons the right
    // side: black keeps 5 stones + 10 points left, white has 1 stone.
    let pos = setpos(
        5,
        &["c1", "e3", "c2", "pass", "c3", "pass", "c4", "pass", "c5", "pass"],
    );
    let (winner, margin) = pos.score(0.5);
    assert_eq!(winner, Some(Color::Black));
    assert_eq!(margin, 13.5);
}

// =============================================================================
// Benson-style safety
// =============================================================================

#[test]
fn test_two_eye_group_is_safe() {
    // Black holds all of the 3x3 board except its eyes at a1 and c3.
    let pos = setpos(
        3,
        &[
            "b1", "pass", "c1", "pass", "a2", "pass", "b2", "pass", "c2", "pass", "a3", "pass",
            "b3", "pass",
        ],
    );
    let mut safe = pos.find_safety(Color::Black);
    safe.sort_unstable();
    // Seven stones plus the two eye points.
    assert_eq!(safe.len(), 9);
    for coord in ["a1", "c3", "b1", "b2", "a3"] {
        assert!(safe.contains(&pt(&pos, coord)), "{coord} should be safe");
    }
    assert!(pos.find_safety(Color::White).is_empty());
}

#[test]
fn test_one_eye_group_is_not_safe() {
    // One real eye at a1 is not enough.
    let pos = setpos(3, &["b1", "pass", "a2", "pass", "b2", "pass"]);
    assert!(pos.is_eye(parse_coord("a1", 3).unwrap(), Color::Black));
    assert!(pos.find_safety(Color::Black).is_empty());
}

#[test]
fn test_false_eye_does_not_support_safety() {
    // b1 and a2 make a1 eyeish for Black, but with White on b2 the
    // diagonal is hostile: a1 is a false eye on the edge.
    let pos = setpos(5, &["b1", "b2", "a2", "pass"]);
    assert!(pos.is_eyeish(pt(&pos, "a1")) == Some(Color::Black));
    assert!(!pos.is_eye(pt(&pos, "a1"), Color::Black));
    assert!(pos.find_safety(Color::Black).is_empty());
}

// =============================================================================
// Game end bookkeeping
// =============================================================================

#[test]
fn test_two_passes_end_the_game_and_a_stone_reopens_it() {
    let mut pos = setpos(5, &["c3", "pass", "pass"]);
    assert!(pos.is_end_of_game());
    // Area rules let play continue after two passes.
    assert!(pos.play(Some(pt(&pos, "d4")), Color::Black));
    assert!(!pos.is_end_of_game());
    assert_eq!(pos.num_pass(), 0);
}

#[test]
fn test_empty_point_accounting_through_captures() {
    let mut pos = setpos(5, &["a1", "b1", "a2", "b2", "c1", "pass", "c2", "pass"]);
    assert_eq!(pos.empty_points().len(), 25 - 6);
    assert!(pos.play(Some(pt(&pos, "b3")), Color::Black));
    // Two captured points reopen; one filled.
    assert_eq!(pos.empty_points().len(), 25 - 7 + 2);
}
