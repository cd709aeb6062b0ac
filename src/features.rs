//! Move features and feature weights for the probabilistic policy.
//!
//! Every legal move of a position (plus the pass move) gets a small list
//! of feature ids. Ids below [`NUM_SIMPLE_FEATURES`] are the tactical
//! and positional features defined here; ids from
//! [`NUM_SIMPLE_FEATURES`] upward are 3x3 pattern classes, offset by the
//! class index from [`PatternTable`]. A move's strength is the product
//! of the weights of its features (its gamma), with weights trained
//! offline and loaded from a text file.
//!
//! [`PatternTable`]: crate::patterns::PatternTable

use std::collections::HashMap;
use std::path::Path;

use crate::ConfigError;
use crate::board::{Cell, Point};
use crate::patterns::PatternTable;
use crate::position::Position;

/// Number of non-pattern feature ids; pattern classes start here.
pub const NUM_SIMPLE_FEATURES: usize = 26;

/// Pass when the previous move was not a pass (or the game just began).
pub const FE_PASS_NEW: usize = 0;
/// Pass right after another pass.
pub const FE_PASS_CONSECUTIVE: usize = 1;
/// Capturing move: the liberty of an opponent block in atari.
pub const FE_CAPTURE: usize = 2;
/// Atari move while a ko is on the board.
pub const FE_ATARI_KO: usize = 3;
/// Any other atari move.
pub const FE_ATARI_OTHER: usize = 4;
/// Move that puts the mover's own block in atari. Defined for weight
/// files but not produced by the extractor.
pub const FE_SELF_ATARI: usize = 5;
pub const FE_LINE_1: usize = 6;
pub const FE_LINE_2: usize = 7;
pub const FE_LINE_3: usize = 8;
/// Distance 2 to the previous move; 3..=9 follow consecutively.
pub const FE_DIST_PREV_2: usize = 9;
pub const FE_DIST_PREV_9: usize = 16;
/// Replay at the point of one's own previous move after it was captured.
pub const FE_DIST_PREV_OWN_0: usize = 17;
/// Distance 2 to one's own previous move; 3..=9 follow consecutively.
pub const FE_DIST_PREV_OWN_2: usize = 18;
pub const FE_DIST_PREV_OWN_9: usize = 25;

/// Feature lists for every legal move of one position.
pub struct FeatureSet {
    pass: Vec<usize>,
    moves: HashMap<Point, Vec<usize>>,
}

impl FeatureSet {
    /// Features of the pass move.
    pub fn pass_features(&self) -> &[usize] {
        &self.pass
    }

    /// Features of a legal stone move, `None` if the move is illegal.
    pub fn move_features(&self, pt: Point) -> Option<&[usize]> {
        self.moves.get(&pt).map(|v| v.as_slice())
    }

    fn add(&mut self, pt: Point, feature: usize) {
        // Features land only on legal moves; captures and ataris can
        // name liberties the mover is not allowed to play.
        if let Some(list) = self.moves.get_mut(&pt)
            && !list.contains(&feature)
        {
            list.push(feature);
        }
    }

    fn add_pass(&mut self, feature: usize) {
        if !self.pass.contains(&feature) {
            self.pass.push(feature);
        }
    }
}

/// Feature weights, indexed by feature id.
///
/// The on-disk format is one row per feature, `<id> <weight>`, in
/// ascending id order; the weight is taken from the second column.
pub struct WeightTable {
    weights: Vec<f64>,
}

impl WeightTable {
    pub fn from_weights(weights: Vec<f64>) -> WeightTable {
        WeightTable { weights }
    }

    pub fn load(path: &Path) -> Result<WeightTable, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut weights = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let _id = fields.next();
            let Some(weight) = fields.next() else {
                return Err(ConfigError::WeightFormat {
                    line: i + 1,
                    reason: "expected `<id> <weight>`".to_string(),
                });
            };
            let weight: f64 = weight.parse().map_err(|_| ConfigError::WeightFormat {
                line: i + 1,
                reason: format!("bad weight `{weight}`"),
            })?;
            weights.push(weight);
        }
        Ok(WeightTable { weights })
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Product of the weights of `features`.
    pub fn gamma(&self, features: &[usize]) -> f64 {
        features.iter().map(|&f| self.weights[f]).product()
    }
}

/// The move distance used by the proximity features:
/// `dx + dy + max(dx, dy)`. Adjacent points are at distance 2; only a
/// point and itself are closer.
pub fn distance(pos: &Position, p1: Point, p2: Point) -> usize {
    let (row1, col1) = pos.coord(p1);
    let (row2, col2) = pos.coord(p2);
    let dx = col1.abs_diff(col2);
    let dy = row1.abs_diff(row2);
    dx + dy + dx.max(dy)
}

/// 1-based distance to the closest board edge.
pub fn distance_to_line(pos: &Position, pt: Point) -> usize {
    let size = pos.size();
    let (row, col) = pos.coord(pt);
    let line_row = if 2 * row > size + 1 { size + 1 - row } else { row };
    let line_col = if 2 * col > size + 1 { size + 1 - col } else { col };
    line_row.min(line_col)
}

/// Blocks of either color with at most `limit` liberties.
///
/// Returns the anchors (lowest point of each block) in row-major
/// discovery order and each anchor's liberty points. Floods abort as
/// soon as a block proves to have more than `limit` liberties.
pub fn find_block_anchors(
    pos: &Position,
    limit: usize,
) -> (Vec<Point>, HashMap<Point, Vec<Point>>) {
    let mut anchors = Vec::new();
    let mut liberties: HashMap<Point, Vec<Point>> = HashMap::new();
    let mut claimed = vec![false; pos.max_point()];
    for row in 1..=pos.size() {
        for col in 1..=pos.size() {
            let start = pos.point(row, col);
            if claimed[start] || !pos.cell(start).is_stone() {
                continue;
            }
            let own = pos.cell(start);
            let mut block = vec![start];
            let mut stack = vec![start];
            let mut libs: Vec<Point> = Vec::new();
            let mut anchor = start;
            while let Some(p) = stack.pop() {
                for n in pos.neighbors(p) {
                    if pos.cell(n) == own && !block.contains(&n) {
                        anchor = anchor.min(n);
                        block.push(n);
                        stack.push(n);
                    } else if pos.cell(n) == Cell::Empty && !libs.contains(&n) {
                        libs.push(n);
                    }
                }
                if libs.len() > limit {
                    break;
                }
            }
            // Partially flooded blocks stay partially claimed; a later
            // rescan from an unclaimed stone aborts again.
            for &p in &block {
                claimed[p] = true;
            }
            if libs.len() <= limit {
                anchors.push(anchor);
                liberties.insert(anchor, libs);
            }
        }
    }
    (anchors, liberties)
}

/// Extract the features of every legal move (and of pass) for the side
/// to move.
pub fn find_all_features(pos: &mut Position, table: &PatternTable) -> FeatureSet {
    let color = pos.side_to_move();
    let legal_moves = pos.legal_moves(color);
    let mut set = FeatureSet {
        pass: Vec::new(),
        moves: legal_moves.iter().map(|&m| (m, Vec::new())).collect(),
    };
    find_pass_features(&mut set, pos);
    find_full_board_features(&mut set, pos);
    find_dist_prev_features(&mut set, pos, &legal_moves);
    find_line_features(&mut set, pos, &legal_moves);
    for &mv in &legal_moves {
        find_pattern_feature(&mut set, pos, table, mv);
    }
    set
}

fn find_pass_features(set: &mut FeatureSet, pos: &Position) {
    if pos.moves_count() == 0 || pos.last_move().is_some() {
        set.add_pass(FE_PASS_NEW);
    } else {
        set.add_pass(FE_PASS_CONSECUTIVE);
    }
}

fn find_full_board_features(set: &mut FeatureSet, pos: &Position) {
    let (anchors, liberties) = find_block_anchors(pos, 2);
    let opponent = Cell::stone(pos.side_to_move().opponent());
    for anchor in anchors {
        if pos.cell(anchor) != opponent {
            continue;
        }
        let Some(libs) = liberties.get(&anchor) else {
            continue;
        };
        match libs.as_slice() {
            [lib] => set.add(*lib, FE_CAPTURE),
            [_, _] => {
                let feature = if pos.ko_point().is_some() {
                    FE_ATARI_KO
                } else {
                    FE_ATARI_OTHER
                };
                for &lib in libs {
                    set.add(lib, feature);
                }
            }
            _ => {}
        }
    }
}

fn find_dist_prev_features(set: &mut FeatureSet, pos: &Position, legal_moves: &[Point]) {
    if let Some(last) = pos.last_move() {
        for &mv in legal_moves {
            let d = distance(pos, mv, last);
            debug_assert!(d >= 2);
            if d <= 9 {
                set.add(mv, FE_DIST_PREV_2 + d - 2);
            }
        }
    }
    if let Some(last2) = pos.last2_move() {
        for &mv in legal_moves {
            let d = distance(pos, mv, last2);
            if d == 0 {
                set.add(mv, FE_DIST_PREV_OWN_0);
            } else if d <= 9 {
                debug_assert!(d >= 2);
                set.add(mv, FE_DIST_PREV_OWN_2 + d - 2);
            }
        }
    }
}

fn find_line_features(set: &mut FeatureSet, pos: &Position, legal_moves: &[Point]) {
    for &mv in legal_moves {
        let line = distance_to_line(pos, mv).min(3);
        set.add(mv, FE_LINE_1 + line - 1);
    }
}

fn find_pattern_feature(set: &mut FeatureSet, pos: &Position, table: &PatternTable, mv: Point) {
    if let Some(class) = table.class_of(&pos.neighborhood33(mv)) {
        set.add(mv, NUM_SIMPLE_FEATURES + class);
    }
}

/// Legal non-eye moves with their normalized gamma weights, as parallel
/// vectors. Both are empty when the side to move has nothing but eye
/// fills left.
pub fn move_probabilities(
    pos: &mut Position,
    table: &PatternTable,
    weights: &WeightTable,
) -> (Vec<Point>, Vec<f64>) {
    let color = pos.side_to_move();
    let features = find_all_features(pos, table);
    let mut moves = Vec::new();
    let mut probs = Vec::new();
    let mut gamma_sum = 0.0;
    let empties: Vec<Point> = pos.empty_points().to_vec();
    for mv in empties {
        if pos.check_legal(Some(mv), color) && !pos.is_eye(mv, color) {
            // Legal by construction, so the feature list exists.
            let gamma = features
                .move_features(mv)
                .map(|fs| weights.gamma(fs))
                .unwrap_or(1.0);
            moves.push(mv);
            probs.push(gamma);
            gamma_sum += gamma;
        }
    }
    if gamma_sum > 0.0 {
        for p in &mut probs {
            *p /= gamma_sum;
        }
    }
    (moves, probs)
}
