//! Board primitives: colors, cell states and coordinate conversions.
//!
//! Points are indices into a padded one-dimensional array. A board of
//! side `size` uses a row stride of `size + 1`, so the playable point at
//! `(row, col)` (both 1-based, row 1 at the bottom) lives at index
//! `row * (size + 1) + col`. The surrounding indices hold [`Cell::Border`]
//! sentinels, which lets neighbor walks skip explicit bounds checks.

/// Index of a point in the padded board array.
pub type Point = usize;

/// Smallest supported board side.
pub const MIN_SIZE: usize = 2;
/// Largest supported board side (letters a..z minus i give 25 columns).
pub const MAX_SIZE: usize = 25;

/// Column letters in GTP coordinates. The letter `i` is skipped.
const COLUMN_LETTERS: &str = "abcdefghjklmnopqrstuvwxyz";

/// The GTP letter for a 1-based column.
pub(crate) fn column_letter(col: usize) -> char {
    COLUMN_LETTERS.as_bytes()[col - 1] as char
}

/// A stone color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Parse a GTP color argument: `b`, `black`, `w` or `white`.
    pub fn from_gtp(s: &str) -> Option<Color> {
        match s.to_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Black => write!(f, "b"),
            Color::White => write!(f, "w"),
        }
    }
}

/// Contents of one point of the padded board array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Black,
    White,
    Border,
}

impl Cell {
    /// The cell holding a stone of `color`.
    pub const fn stone(color: Color) -> Cell {
        match color {
            Color::Black => Cell::Black,
            Color::White => Cell::White,
        }
    }

    pub fn is_stone(self) -> bool {
        matches!(self, Cell::Black | Cell::White)
    }

    /// The stone color stored here, if any.
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Black => Some(Color::Black),
            Cell::White => Some(Color::White),
            _ => None,
        }
    }
}

impl From<Color> for Cell {
    fn from(color: Color) -> Cell {
        Cell::stone(color)
    }
}

/// Parse a GTP vertex like `a1` or `j10` into a padded-array point.
///
/// Returns `None` for anything malformed or off the board. `pass` is not
/// a point and is handled by callers.
pub fn parse_coord(s: &str, size: usize) -> Option<Point> {
    let s = s.to_lowercase();
    let mut chars = s.chars();
    let letter = chars.next()?;
    if !letter.is_ascii_alphabetic() || letter == 'i' {
        return None;
    }
    let mut col = letter as usize - 'a' as usize;
    if letter < 'i' {
        col += 1;
    }
    let row: usize = chars.as_str().parse().ok()?;
    if row < 1 || row > size || col < 1 || col > size {
        return None;
    }
    Some(row * (size + 1) + col)
}

/// Format a move as a GTP vertex, `pass` for no point.
pub fn str_coord(mv: Option<Point>, size: usize) -> String {
    match mv {
        None => "pass".to_string(),
        Some(pt) => {
            let row = pt / (size + 1);
            let col = pt % (size + 1);
            format!("{}{row}", column_letter(col))
        }
    }
}

/// Format a set of points as sorted space-separated GTP vertices.
pub fn sorted_point_string(points: &[Point], size: usize) -> String {
    let mut coords: Vec<String> = points.iter().map(|&p| str_coord(Some(p), size)).collect();
    coords.sort();
    coords.join(" ")
}
