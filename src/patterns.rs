//! 3x3 playout patterns and their symmetry classes.
//!
//! The pattern language describes the eight neighbors of a candidate
//! move plus the (empty) candidate point itself, row by row:
//!
//! - `X`: stone of the side to move
//! - `O`: opponent stone
//! - `x`: anything but `X` (empty, opponent, or border)
//! - `o`: anything but `O`
//! - `?`: anything
//! - space: off the board
//!
//! At startup every source pattern is expanded into all concrete
//! neighborhoods it covers: the sixteen symmetry variants (rotations,
//! both flips, color swap) each have their wildcards substituted out.
//! Matching a position's [`neighborhood33`] is then a single set lookup.
//!
//! Each concrete neighborhood also gets a class index shared by all of
//! its symmetry-equivalent shapes. The probabilistic move generator uses
//! the class index as a feature id, so the numbering must be stable: it
//! follows the expansion order of the source list below.
//!
//! [`neighborhood33`]: crate::position::Position::neighborhood33

use std::collections::HashMap;

/// 3x3 playout pattern sources, taken from the michi project.
const PAT3_SRC: [[u8; 9]; 13] = [
    // hane pattern - enclosing hane
    *b"XOX...???",
    // hane pattern - non-cutting hane
    *b"XO....?.?",
    // hane pattern - magari
    *b"XO?X..x.?",
    // generic pattern - katatsuke or diagonal attachment; similar to magari
    *b".O.X.....",
    // cut1 pattern (kiri) - unprotected cut
    *b"XO?O.o?o?",
    // cut1 pattern (kiri) - peeped cut
    *b"XO?O.X???",
    // cut2 pattern (de)
    *b"?X?O.Oooo",
    // cut keima
    *b"OX?o.O???",
    // side pattern - chase
    *b"X.?O.?   ",
    // side pattern - block side cut
    *b"OX?X.O   ",
    // side pattern - block side connection
    *b"?X?x.O   ",
    // side pattern - sagari
    *b"?XOx.x   ",
    // side pattern - cut
    *b"?OXX.O   ",
];

// Index permutations for the seven non-identity symmetries of a 3x3
// grid: quarter turns, flips and transpositions.
const ROT90: [usize; 9] = [6, 3, 0, 7, 4, 1, 8, 5, 2];
const ROT180: [usize; 9] = [8, 7, 6, 5, 4, 3, 2, 1, 0];
const ROT270: [usize; 9] = [2, 5, 8, 1, 4, 7, 0, 3, 6];
const FLIP_VERT: [usize; 9] = [6, 7, 8, 3, 4, 5, 0, 1, 2];
const FLIP_HORIZ: [usize; 9] = [2, 1, 0, 5, 4, 3, 8, 7, 6];
const TRANSPOSE: [usize; 9] = [0, 3, 6, 1, 4, 7, 2, 5, 8];
const ANTI_TRANSPOSE: [usize; 9] = [8, 5, 2, 7, 4, 1, 6, 3, 0];

const SYMMETRIES: [[usize; 9]; 7] = [
    ROT90,
    ROT180,
    ROT270,
    FLIP_VERT,
    FLIP_HORIZ,
    TRANSPOSE,
    ANTI_TRANSPOSE,
];

fn permute(p: [u8; 9], idx: [usize; 9]) -> [u8; 9] {
    std::array::from_fn(|i| p[idx[i]])
}

/// Swap the colors of a wildcard pattern: `X` with `O` and `x` with `o`.
fn swap_colors(p: [u8; 9]) -> [u8; 9] {
    p.map(|c| match c {
        b'X' => b'O',
        b'O' => b'X',
        b'x' => b'o',
        b'o' => b'x',
        other => other,
    })
}

/// Swap the colors of a concrete neighborhood, where the opponent is
/// spelled `x`.
fn switch_color(p: [u8; 9]) -> [u8; 9] {
    p.map(|c| match c {
        b'X' => b'x',
        b'x' => b'X',
        other => other,
    })
}

/// Substitute the first occurrence of `wild` with each character of
/// `subs` in turn, recursing until none remain. The substitution order
/// determines the order of the output list.
fn expand_wildcard(p: [u8; 9], wild: u8, subs: &[u8], out: &mut Vec<[u8; 9]>) {
    match p.iter().position(|&c| c == wild) {
        None => out.push(p),
        Some(i) => {
            for &s in subs {
                let mut q = p;
                q[i] = s;
                expand_wildcard(q, wild, subs, out);
            }
        }
    }
}

/// All concrete neighborhoods covered by one source pattern, in a fixed
/// order: symmetry variants outermost, then `?`, `x` and `o` wildcards.
fn expand_pattern(src: [u8; 9], out: &mut Vec<[u8; 9]>) {
    for base in [src, permute(src, ROT90)] {
        for v in [base, permute(base, FLIP_VERT)] {
            for h in [v, permute(v, FLIP_HORIZ)] {
                for s in [h, swap_colors(h)] {
                    let mut pass1 = Vec::new();
                    expand_wildcard(s, b'?', b".XO ", &mut pass1);
                    let mut pass2 = Vec::new();
                    for q in pass1 {
                        expand_wildcard(q, b'x', b".O ", &mut pass2);
                    }
                    for q in pass2 {
                        expand_wildcard(q, b'o', b".X ", out);
                    }
                }
            }
        }
    }
}

/// The expanded 3x3 pattern set with symmetry-class indices.
///
/// Built once at startup and passed by reference (or cheaply shared) to
/// whatever needs it; there is no global instance.
pub struct PatternTable {
    classes: HashMap<[u8; 9], usize>,
    num_classes: usize,
}

impl PatternTable {
    pub fn new() -> PatternTable {
        let mut list = Vec::new();
        for src in PAT3_SRC {
            expand_pattern(src, &mut list);
        }
        // Concrete neighborhoods spell the opponent as `x`, never `O`.
        for p in &mut list {
            *p = p.map(|c| if c == b'O' { b'x' } else { c });
        }
        let mut classes: HashMap<[u8; 9], usize> = HashMap::new();
        let mut num_classes = 0;
        for &p in &list {
            if classes.contains_key(&p) {
                continue;
            }
            let mut orbit = vec![p];
            for sym in SYMMETRIES {
                orbit.push(permute(p, sym));
            }
            for i in 0..8 {
                orbit.push(switch_color(orbit[i]));
            }
            for q in orbit {
                classes.insert(q, num_classes);
            }
            num_classes += 1;
        }
        PatternTable {
            classes,
            num_classes,
        }
    }

    /// Does this neighborhood match any pattern?
    pub fn matches(&self, neighborhood: &[u8; 9]) -> bool {
        self.classes.contains_key(neighborhood)
    }

    /// The symmetry-class index of a matching neighborhood.
    pub fn class_of(&self, neighborhood: &[u8; 9]) -> Option<usize> {
        self.classes.get(neighborhood).copied()
    }

    /// Number of distinct symmetry classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Number of concrete neighborhoods in the table.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::new()
    }
}
