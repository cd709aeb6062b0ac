//! The position engine: an exact Go board with incremental play and undo.
//!
//! A position of side `size` is stored in a padded one-dimensional array
//! of `size * size + 3 * (size + 1)` cells. Row stride is `size + 1`; the
//! single border column between rows serves as both the right border of
//! one row and the left border of the next, and an extra row of padding
//! sits below and above the playable area. For `size == 3`:
//!
//! ```text
//! 16 17 18 19 20      top border
//! 12 13 14 15         border, then row 3
//!  8  9 10 11         border, then row 2
//!  4  5  6  7         border, then row 1
//!  0  1  2  3         bottom border
//! ```
//!
//! where points 13..=15, 9..=11 and 5..=7 are playable and everything
//! else is [`Cell::Border`].
//!
//! Moves go through [`Position::play`] and are reverted exactly by
//! [`Position::undo`]: every applied move pushes a history frame holding
//! the captured stones and the pre-move ko point and pass count, so a
//! search can explore a line and rewind it without copying the board.
//!
//! Two supporting structures keep the hot paths cheap:
//!
//! - `empty_points` is an unordered list of the empty points with an
//!   index table, so candidate generation never scans the whole array
//!   and stone placement is an O(1) swap-remove.
//! - `liberty_hint` remembers, per played point, one liberty its block
//!   was last seen to have. Liberty searches check the hint before
//!   flooding; a stale hint (the hinted cell is no longer empty) falls
//!   through to the flood.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ConfigError;
use crate::board::{Cell, Color, MAX_SIZE, MIN_SIZE, Point, column_letter};

/// Marker for "no entry" in the empty-point index table.
const NO_INDEX: usize = usize::MAX;

/// One applied move, with everything needed to take it back.
#[derive(Clone, Debug)]
struct HistoryEntry {
    mv: Option<Point>,
    color: Color,
    ko_before: Option<Point>,
    captured: Vec<Point>,
    passes_before: u32,
}

/// Outcome of a short-circuit liberty search.
enum LibertyFlood {
    /// The block is alive; carries the liberty that proved it.
    Alive(Point),
    /// The block has no liberties; carries the full block membership.
    Dead(Vec<Point>),
}

/// A Go position with exact incremental state.
#[derive(Clone)]
pub struct Position {
    size: usize,
    /// Row stride, `size + 1`.
    ns: usize,
    /// Length of the padded cell array.
    max_point: usize,
    cells: Vec<Cell>,
    side_to_move: Color,
    ko_point: Option<Point>,
    num_pass: u32,
    black_captures: u32,
    white_captures: u32,
    /// When false, the suicide test in [`Position::play`] and
    /// [`Position::check_legal`] is skipped.
    pub check_suicide: bool,
    empty_points: Vec<Point>,
    empty_index: Vec<usize>,
    liberty_hint: Vec<Option<Point>>,
    last_move: Option<Point>,
    last2_move: Option<Point>,
    history: Vec<HistoryEntry>,
}

impl Position {
    /// Create an empty position. Sizes outside
    /// [`MIN_SIZE`]`..=`[`MAX_SIZE`] are rejected.
    pub fn new(size: usize) -> Result<Position, ConfigError> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
            return Err(ConfigError::BoardSize(size));
        }
        let ns = size + 1;
        let max_point = size * size + 3 * ns;
        let mut cells = vec![Cell::Border; max_point];
        let mut empty_points = Vec::with_capacity(size * size);
        let mut empty_index = vec![NO_INDEX; max_point];
        for row in 1..=size {
            for col in 1..=size {
                let pt = row * ns + col;
                cells[pt] = Cell::Empty;
                empty_index[pt] = empty_points.len();
                empty_points.push(pt);
            }
        }
        Ok(Position {
            size,
            ns,
            max_point,
            cells,
            side_to_move: Color::Black,
            ko_point: None,
            num_pass: 0,
            black_captures: 0,
            white_captures: 0,
            check_suicide: true,
            empty_points,
            empty_index,
            liberty_hint: vec![None; max_point],
            last_move: None,
            last2_move: None,
            history: Vec::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Length of the padded cell array; all points are below this.
    pub fn max_point(&self) -> usize {
        self.max_point
    }

    pub fn cell(&self, pt: Point) -> Cell {
        self.cells[pt]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Force the side to move, e.g. when a GTP controller asks a color
    /// to move out of turn.
    pub fn set_to_play(&mut self, color: Color) {
        self.side_to_move = color;
    }

    pub fn ko_point(&self) -> Option<Point> {
        self.ko_point
    }

    pub fn num_pass(&self) -> u32 {
        self.num_pass
    }

    /// Two consecutive passes end the game.
    pub fn is_end_of_game(&self) -> bool {
        self.num_pass >= 2
    }

    /// Stones captured so far by `color`.
    pub fn captures(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black_captures,
            Color::White => self.white_captures,
        }
    }

    /// The empty points, in no particular order.
    pub fn empty_points(&self) -> &[Point] {
        &self.empty_points
    }

    pub fn last_move(&self) -> Option<Point> {
        self.last_move
    }

    pub fn last2_move(&self) -> Option<Point> {
        self.last2_move
    }

    /// Number of moves played so far, passes included.
    pub fn moves_count(&self) -> usize {
        self.history.len()
    }

    /// The cached known liberty for the block at `pt`, if any.
    pub fn liberty_hint(&self, pt: Point) -> Option<Point> {
        self.liberty_hint[pt]
    }

    /// Point index for 1-based `(row, col)`.
    pub fn point(&self, row: usize, col: usize) -> Point {
        debug_assert!((1..=self.size).contains(&row) && (1..=self.size).contains(&col));
        row * self.ns + col
    }

    /// 1-based `(row, col)` of a playable point.
    pub fn coord(&self, pt: Point) -> (usize, usize) {
        (pt / self.ns, pt % self.ns)
    }

    /// The four orthogonal neighbors. Thanks to the border padding these
    /// are always in range for playable points.
    pub fn neighbors(&self, pt: Point) -> [Point; 4] {
        [pt - 1, pt + 1, pt - self.ns, pt + self.ns]
    }

    /// The four diagonal neighbors.
    pub fn diag_neighbors(&self, pt: Point) -> [Point; 4] {
        [
            pt - self.ns - 1,
            pt - self.ns + 1,
            pt + self.ns - 1,
            pt + self.ns + 1,
        ]
    }

    /// The 3x3 neighborhood around `pt` as pattern-matcher input, row by
    /// row in ascending address order (the row below `pt` first): `X`
    /// for the side to move, `x` for the opponent, `.` for empty, space
    /// for border. The pattern set is closed under flips, so the
    /// orientation is immaterial to matching.
    pub fn neighborhood33(&self, pt: Point) -> [u8; 9] {
        let me = Cell::stone(self.side_to_move);
        let positions = [
            pt - self.ns - 1,
            pt - self.ns,
            pt - self.ns + 1,
            pt - 1,
            pt,
            pt + 1,
            pt + self.ns - 1,
            pt + self.ns,
            pt + self.ns + 1,
        ];
        positions.map(|p| match self.cells[p] {
            c if c == me => b'X',
            Cell::Empty => b'.',
            Cell::Border => b' ',
            _ => b'x',
        })
    }

    // -------------------------------------------------------------------
    // Liberties and blocks
    // -------------------------------------------------------------------

    /// Search the block at `start` for a liberty, stopping at the first
    /// one found. The per-point hint is consulted before flooding.
    fn liberty_flood(&self, start: Point) -> LibertyFlood {
        if let Some(hint) = self.liberty_hint[start]
            && self.cells[hint] == Cell::Empty
        {
            return LibertyFlood::Alive(hint);
        }
        let own = self.cells[start];
        let mut visited = vec![false; self.max_point];
        let mut stones = vec![start];
        let mut stack = vec![start];
        visited[start] = true;
        while let Some(pt) = stack.pop() {
            for n in self.neighbors(pt) {
                if self.cells[n] == Cell::Empty {
                    return LibertyFlood::Alive(n);
                }
                if self.cells[n] == own && !visited[n] {
                    visited[n] = true;
                    stones.push(n);
                    stack.push(n);
                }
            }
        }
        LibertyFlood::Dead(stones)
    }

    /// Count the liberties of the block at `pt`. Unlike the hint-assisted
    /// search this always visits the whole block.
    pub fn block_liberties(&self, pt: Point) -> u32 {
        debug_assert!(self.cells[pt].is_stone());
        let own = self.cells[pt];
        let mut visited = vec![false; self.max_point];
        let mut stack = vec![pt];
        visited[pt] = true;
        let mut liberties = 0;
        while let Some(p) = stack.pop() {
            for n in self.neighbors(p) {
                if self.cells[n] == Cell::Empty && !visited[n] {
                    visited[n] = true;
                    liberties += 1;
                } else if self.cells[n] == own && !visited[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }
        liberties
    }

    /// All stones of the block at `pt`.
    pub fn block_stones(&self, pt: Point) -> Vec<Point> {
        debug_assert!(self.cells[pt].is_stone());
        let own = self.cells[pt];
        let mut visited = vec![false; self.max_point];
        let mut stones = vec![pt];
        let mut stack = vec![pt];
        visited[pt] = true;
        while let Some(p) = stack.pop() {
            for n in self.neighbors(p) {
                if self.cells[n] == own && !visited[n] {
                    visited[n] = true;
                    stones.push(n);
                    stack.push(n);
                }
            }
        }
        stones
    }

    // -------------------------------------------------------------------
    // Eyes
    // -------------------------------------------------------------------

    /// If `pt` is empty and every non-border neighbor holds the same
    /// color, that color; otherwise `None`.
    pub fn is_eyeish(&self, pt: Point) -> Option<Color> {
        if self.cells[pt] != Cell::Empty {
            return None;
        }
        let mut eye_color = None;
        for n in self.neighbors(pt) {
            match self.cells[n] {
                Cell::Border => {}
                Cell::Empty => return None,
                cell => match eye_color {
                    None => eye_color = cell.color(),
                    Some(c) if Cell::stone(c) == cell => {}
                    Some(_) => return None,
                },
            }
        }
        eye_color
    }

    /// True if `pt` is a real eye for `color`: eyeish for that color and
    /// not a false eye. A diagonal occupied by the opponent counts as a
    /// falsifying condition and touching the border adds one more; two
    /// or more falsify the eye.
    pub fn is_eye(&self, pt: Point, color: Color) -> bool {
        match self.is_eyeish(pt) {
            Some(c) if c == color => {}
            _ => return false,
        }
        let false_cell = Cell::stone(color.opponent());
        let mut false_count = 0;
        let mut at_edge = false;
        for d in self.diag_neighbors(pt) {
            if self.cells[d] == Cell::Border {
                at_edge = true;
            } else if self.cells[d] == false_cell {
                false_count += 1;
            }
        }
        if at_edge {
            false_count += 1;
        }
        false_count < 2
    }

    // -------------------------------------------------------------------
    // Legality
    // -------------------------------------------------------------------

    /// Would `mv` by `color` be accepted by [`Position::play`]?
    ///
    /// The stone is placed tentatively for the liberty searches and
    /// removed again before returning, so the position is unchanged
    /// either way. Pass is always legal.
    pub fn check_legal(&mut self, mv: Option<Point>, color: Color) -> bool {
        let Some(pt) = mv else {
            return true;
        };
        if self.cells[pt] != Cell::Empty || self.ko_point == Some(pt) {
            return false;
        }
        let enemy = Cell::stone(color.opponent());
        self.cells[pt] = Cell::stone(color);
        let mut legal = false;
        for n in self.neighbors(pt) {
            if self.cells[n] == enemy && matches!(self.liberty_flood(n), LibertyFlood::Dead(_)) {
                legal = true;
                break;
            }
        }
        if !legal {
            legal =
                !self.check_suicide || matches!(self.liberty_flood(pt), LibertyFlood::Alive(_));
        }
        self.cells[pt] = Cell::Empty;
        legal
    }

    /// Legal stone moves for `color`, in ascending point order. Pass is
    /// not included.
    pub fn legal_moves(&mut self, color: Color) -> Vec<Point> {
        let mut moves = self.empty_points.clone();
        moves.sort_unstable();
        moves.retain(|&pt| self.check_legal(Some(pt), color));
        moves
    }

    // -------------------------------------------------------------------
    // Play and undo
    // -------------------------------------------------------------------

    /// Apply `mv` for `color`; `None` passes. Returns false and leaves
    /// the position untouched when the move is illegal (occupied point,
    /// ko retake, or suicide while `check_suicide` is set).
    ///
    /// A capture sets the ko point when the move landed in an opposing
    /// one-point eye and exactly one stone came off; any other committed
    /// stone move clears it. Passing leaves the ko point as it is.
    pub fn play(&mut self, mv: Option<Point>, color: Color) -> bool {
        let ko_before = self.ko_point;
        let Some(pt) = mv else {
            self.history.push(HistoryEntry {
                mv: None,
                color,
                ko_before,
                captured: Vec::new(),
                passes_before: self.num_pass,
            });
            self.num_pass += 1;
            self.last2_move = self.last_move;
            self.last_move = None;
            self.side_to_move = color.opponent();
            return true;
        };
        if self.cells[pt] != Cell::Empty || self.ko_point == Some(pt) {
            return false;
        }
        let opponent = color.opponent();
        let in_enemy_eye = self.is_eyeish(pt) == Some(opponent);

        self.cells[pt] = Cell::stone(color);
        let enemy = Cell::stone(opponent);
        let mut captured: Vec<Point> = Vec::new();
        for n in self.neighbors(pt) {
            if self.cells[n] == enemy
                && let LibertyFlood::Dead(stones) = self.liberty_flood(n)
            {
                for &s in &stones {
                    self.cells[s] = Cell::Empty;
                    self.liberty_hint[s] = None;
                }
                captured.extend(stones);
            }
        }
        if self.check_suicide {
            match self.liberty_flood(pt) {
                LibertyFlood::Alive(lib) => self.liberty_hint[pt] = Some(lib),
                LibertyFlood::Dead(_) => {
                    debug_assert!(captured.is_empty());
                    self.cells[pt] = Cell::Empty;
                    return false;
                }
            }
        }

        // The move is committed from here on.
        self.ko_point = if in_enemy_eye && captured.len() == 1 {
            Some(captured[0])
        } else {
            None
        };
        match color {
            Color::Black => self.black_captures += captured.len() as u32,
            Color::White => self.white_captures += captured.len() as u32,
        }
        self.remove_empty(pt);
        for &c in &captured {
            self.add_empty(c);
        }
        self.history.push(HistoryEntry {
            mv: Some(pt),
            color,
            ko_before,
            captured,
            passes_before: self.num_pass,
        });
        self.num_pass = 0;
        self.last2_move = self.last_move;
        self.last_move = Some(pt);
        self.side_to_move = opponent;
        true
    }

    /// Take back the most recent move. Restores the cells, captured
    /// stones, capture counters, ko point, pass count and last-move
    /// markers; the mover is to move again. Calling this with no moves
    /// played is a programming error and aborts.
    pub fn undo(&mut self) {
        let Some(entry) = self.history.pop() else {
            panic!("undo with no moves played");
        };
        if let Some(pt) = entry.mv {
            self.cells[pt] = Cell::Empty;
            self.liberty_hint[pt] = None;
            self.add_empty(pt);
            let enemy = Cell::stone(entry.color.opponent());
            for &s in &entry.captured {
                self.cells[s] = enemy;
                self.remove_empty(s);
            }
            match entry.color {
                Color::Black => self.black_captures -= entry.captured.len() as u32,
                Color::White => self.white_captures -= entry.captured.len() as u32,
            }
        }
        self.ko_point = entry.ko_before;
        self.num_pass = entry.passes_before;
        self.side_to_move = entry.color;
        let depth = self.history.len();
        self.last_move = if depth >= 1 { self.history[depth - 1].mv } else { None };
        self.last2_move = if depth >= 2 { self.history[depth - 2].mv } else { None };
    }

    fn add_empty(&mut self, pt: Point) {
        debug_assert_eq!(self.empty_index[pt], NO_INDEX);
        self.empty_index[pt] = self.empty_points.len();
        self.empty_points.push(pt);
    }

    fn remove_empty(&mut self, pt: Point) {
        let idx = self.empty_index[pt];
        debug_assert_ne!(idx, NO_INDEX);
        self.empty_points.swap_remove(idx);
        if let Some(&moved) = self.empty_points.get(idx) {
            self.empty_index[moved] = idx;
        }
        self.empty_index[pt] = NO_INDEX;
    }

    // -------------------------------------------------------------------
    // Scoring and safety
    // -------------------------------------------------------------------

    /// Area score: stones on the board plus empty regions bordered by a
    /// single color; regions touching both colors count for neither.
    /// White starts with `komi`. Returns the winner (`None` for a tie)
    /// and the absolute margin.
    pub fn score(&self, komi: f32) -> (Option<Color>, f32) {
        let mut black = 0.0f32;
        let mut white = komi;
        let mut counted = vec![false; self.max_point];
        for row in 1..=self.size {
            for col in 1..=self.size {
                let pt = row * self.ns + col;
                if counted[pt] {
                    continue;
                }
                match self.cells[pt] {
                    Cell::Black => black += 1.0,
                    Cell::White => white += 1.0,
                    Cell::Empty => {
                        let mut region = 1usize;
                        let mut stack = vec![pt];
                        counted[pt] = true;
                        let mut touches_black = false;
                        let mut touches_white = false;
                        while let Some(p) = stack.pop() {
                            for n in self.neighbors(p) {
                                match self.cells[n] {
                                    Cell::Empty if !counted[n] => {
                                        counted[n] = true;
                                        region += 1;
                                        stack.push(n);
                                    }
                                    Cell::Black => touches_black = true,
                                    Cell::White => touches_white = true,
                                    _ => {}
                                }
                            }
                        }
                        if touches_black && !touches_white {
                            black += region as f32;
                        } else if touches_white && !touches_black {
                            white += region as f32;
                        }
                    }
                    Cell::Border => unreachable!("border cell inside the playable area"),
                }
            }
        }
        if black > white {
            (Some(Color::Black), black - white)
        } else if white > black {
            (Some(Color::White), white - black)
        } else {
            (None, 0.0)
        }
    }

    /// Unconditionally safe points for `color` under a simplified Benson
    /// test: only one-point eyes are considered, and blocks are removed
    /// until every survivor borders at least two surviving eyes. Returns
    /// the stones of the safe blocks together with their eye points.
    pub fn find_safety(&self, color: Color) -> Vec<Point> {
        // eye point -> anchors of the blocks adjacent to it
        let mut eyes: BTreeMap<Point, BTreeSet<Point>> = BTreeMap::new();
        for row in 1..=self.size {
            for col in 1..=self.size {
                let pt = row * self.ns + col;
                if self.cells[pt] == Cell::Empty && self.is_eye(pt, color) {
                    eyes.insert(pt, BTreeSet::new());
                }
            }
        }
        // anchor (lowest point of the block) -> stones, and -> its eyes
        let mut blocks: BTreeMap<Point, Vec<Point>> = BTreeMap::new();
        let mut block_eyes: BTreeMap<Point, BTreeSet<Point>> = BTreeMap::new();
        let own = Cell::stone(color);
        let mut seen = vec![false; self.max_point];
        for row in 1..=self.size {
            for col in 1..=self.size {
                let start = row * self.ns + col;
                if self.cells[start] != own || seen[start] {
                    continue;
                }
                let mut stones = vec![start];
                let mut stack = vec![start];
                seen[start] = true;
                let mut anchor = start;
                let mut adjacent_eyes = BTreeSet::new();
                while let Some(p) = stack.pop() {
                    for n in self.neighbors(p) {
                        if self.cells[n] == own && !seen[n] {
                            seen[n] = true;
                            anchor = anchor.min(n);
                            stones.push(n);
                            stack.push(n);
                        } else if eyes.contains_key(&n) {
                            adjacent_eyes.insert(n);
                        }
                    }
                }
                for &e in &adjacent_eyes {
                    if let Some(owners) = eyes.get_mut(&e) {
                        owners.insert(anchor);
                    }
                }
                block_eyes.insert(anchor, adjacent_eyes);
                blocks.insert(anchor, stones);
            }
        }
        // Remove blocks with fewer than two eyes. The eyes of a removed
        // block stop supporting their other neighbors, so iterate until
        // nothing changes.
        loop {
            let weak = block_eyes
                .iter()
                .find(|(_, es)| es.len() < 2)
                .map(|(&a, _)| a);
            let Some(anchor) = weak else {
                break;
            };
            blocks.remove(&anchor);
            if let Some(es) = block_eyes.remove(&anchor) {
                for e in es {
                    if let Some(owners) = eyes.remove(&e) {
                        for other in owners {
                            if other != anchor
                                && let Some(oes) = block_eyes.get_mut(&other)
                            {
                                oes.remove(&e);
                            }
                        }
                    }
                }
            }
        }
        let mut safe: Vec<Point> = blocks.into_values().flatten().collect();
        safe.extend(eyes.into_keys());
        safe
    }

    // -------------------------------------------------------------------
    // Candidate neighborhoods
    // -------------------------------------------------------------------

    /// Empty points around the last two moves (orthogonal and diagonal),
    /// deduplicated, in discovery order.
    pub fn last_moves_empty_neighbors(&self) -> Vec<Point> {
        let mut out = Vec::new();
        for mv in [self.last_move, self.last2_move] {
            let Some(center) = mv else {
                continue;
            };
            for n in self
                .neighbors(center)
                .into_iter()
                .chain(self.diag_neighbors(center))
            {
                if self.cells[n] == Cell::Empty && !out.contains(&n) {
                    out.push(n);
                }
            }
        }
        out
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (1..=self.size).rev() {
            write!(f, "{row:2}")?;
            for col in 1..=self.size {
                let ch = match self.cells[row * self.ns + col] {
                    Cell::Empty => '.',
                    Cell::Black => 'X',
                    Cell::White => 'O',
                    Cell::Border => '#',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        write!(f, "  ")?;
        for col in 1..=self.size {
            write!(f, " {}", column_letter(col))?;
        }
        writeln!(f)
    }
}
