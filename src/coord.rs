//! Board coordinates, SGF point encoding and rectangular board windows.
//!
//! SGF encodes a point as two lowercase letters, `'a' + x` then `'a' + y`,
//! with the origin in the top-left corner. The human notation accepted by
//! the CLI uses letters A-T (skipping I) for columns and 1-19 for rows
//! counted from the bottom edge, as on a printed board.

use std::fmt;

use crate::constants::{MAX_BOARD_SIZE, SGF_COORD_BASE};
use crate::error::SgfError;

/// A point on the board, `0 <= x, y < size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vertex {
    pub x: usize,
    pub y: usize,
}

impl Vertex {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Decode a two-letter SGF point such as `"dd"`.
    pub fn from_sgf(s: &str) -> Result<Self, SgfError> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_lowercase) {
            return Err(SgfError::InvalidCoordinate(s.to_string()));
        }
        Ok(Self::new(
            (bytes[0] - SGF_COORD_BASE) as usize,
            (bytes[1] - SGF_COORD_BASE) as usize,
        ))
    }

    /// Encode as a two-letter SGF point.
    ///
    /// Callers keep `x` and `y` below [`MAX_BOARD_SIZE`].
    pub fn to_sgf(self) -> String {
        debug_assert!(self.x < MAX_BOARD_SIZE && self.y < MAX_BOARD_SIZE);
        let mut s = String::with_capacity(2);
        s.push((SGF_COORD_BASE + self.x as u8) as char);
        s.push((SGF_COORD_BASE + self.y as u8) as char);
        s
    }

    #[inline]
    pub fn in_bounds(self, size: usize) -> bool {
        self.x < size && self.y < size
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Expand one SGF point-list value: a single point (`"dd"`) or a compressed
/// rectangle (`"aa:cc"`).
pub fn expand_point_list(value: &str) -> Result<Vec<Vertex>, SgfError> {
    match value.split_once(':') {
        None => Ok(vec![Vertex::from_sgf(value)?]),
        Some((a, b)) => {
            let range = BoardRange::spanning(Vertex::from_sgf(a)?, Vertex::from_sgf(b)?);
            Ok((range.start_y..=range.end_y)
                .flat_map(|y| (range.start_x..=range.end_x).map(move |x| Vertex::new(x, y)))
                .collect())
        }
    }
}

/// Parse either an SGF point (`"pd"`) or a human coordinate (`"Q16"`).
///
/// Returns `None` for malformed input or points outside the board.
pub fn parse_vertex(s: &str, size: usize) -> Option<Vertex> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let vertex = if bytes.len() == 2 && bytes.iter().all(u8::is_ascii_lowercase) {
        Vertex::from_sgf(s).ok()?
    } else {
        parse_human(s, size)?
    };
    vertex.in_bounds(size).then_some(vertex)
}

fn parse_human(s: &str, size: usize) -> Option<Vertex> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let col_char = bytes[0].to_ascii_uppercase();
    if !col_char.is_ascii_uppercase() || col_char == b'I' {
        return None;
    }
    let mut x = (col_char - b'A') as usize;
    // 'I' is not used as a column letter
    if col_char > b'I' {
        x -= 1;
    }
    let row: usize = s[1..].parse().ok()?;
    if row == 0 || row > size {
        return None;
    }
    Some(Vertex::new(x, size - row))
}

/// Format a vertex in human notation, e.g. `(3, 15)` on 19x19 is `"D4"`.
pub fn human_coord(v: Vertex, size: usize) -> String {
    let mut c = b'A' + v.x as u8;
    if c >= b'I' {
        c += 1;
    }
    format!("{}{}", c as char, size - v.y)
}

/// An inclusive rectangle of board points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardRange {
    pub start_x: usize,
    pub start_y: usize,
    pub end_x: usize,
    pub end_y: usize,
}

impl BoardRange {
    pub const fn new(start_x: usize, start_y: usize, end_x: usize, end_y: usize) -> Self {
        Self {
            start_x,
            start_y,
            end_x,
            end_y,
        }
    }

    /// The whole board.
    pub const fn full(size: usize) -> Self {
        Self::new(0, 0, size - 1, size - 1)
    }

    /// The smallest range containing both corners, whatever their order.
    pub fn spanning(a: Vertex, b: Vertex) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    /// Bounding box of `vertices` grown by `margin` and clamped to the board.
    ///
    /// Falls back to the full board when there is nothing to fit.
    pub fn fit(vertices: impl IntoIterator<Item = Vertex>, margin: usize, size: usize) -> Self {
        let mut iter = vertices.into_iter().filter(|v| v.in_bounds(size));
        let Some(first) = iter.next() else {
            return Self::full(size);
        };
        let bbox = iter.fold(Self::spanning(first, first), |acc, v| {
            Self::new(
                acc.start_x.min(v.x),
                acc.start_y.min(v.y),
                acc.end_x.max(v.x),
                acc.end_y.max(v.y),
            )
        });
        Self::new(
            bbox.start_x.saturating_sub(margin),
            bbox.start_y.saturating_sub(margin),
            (bbox.end_x + margin).min(size - 1),
            (bbox.end_y + margin).min(size - 1),
        )
    }

    pub fn start(&self) -> Vertex {
        Vertex::new(self.start_x, self.start_y)
    }

    pub fn end(&self) -> Vertex {
        Vertex::new(self.end_x, self.end_y)
    }

    pub fn width(&self) -> usize {
        self.end_x - self.start_x + 1
    }

    pub fn height(&self) -> usize {
        self.end_y - self.start_y + 1
    }

    pub fn contains(&self, v: Vertex) -> bool {
        (self.start_x..=self.end_x).contains(&v.x) && (self.start_y..=self.end_y).contains(&v.y)
    }

    /// This range grown so each of `vertices` sits inside it with `margin`
    /// points around it.
    pub fn cover(&self, vertices: impl IntoIterator<Item = Vertex>, margin: usize, size: usize) -> Self {
        vertices
            .into_iter()
            .filter(|v| v.in_bounds(size))
            .fold(*self, |acc, v| {
                if acc.contains(v) {
                    return acc;
                }
                let pad = Self::fit([v], margin, size);
                Self::new(
                    acc.start_x.min(pad.start_x),
                    acc.start_y.min(pad.start_y),
                    acc.end_x.max(pad.end_x),
                    acc.end_y.max(pad.end_y),
                )
            })
    }

    /// Restrict the range to a board of `size`.
    pub fn clamp(&self, size: usize) -> Self {
        let max = size.saturating_sub(1);
        Self::spanning(
            Vertex::new(self.start_x.min(max), self.start_y.min(max)),
            Vertex::new(self.end_x.min(max), self.end_y.min(max)),
        )
    }

    /// Whether the range is well-formed and lies on a board of `size`.
    pub fn is_within(&self, size: usize) -> bool {
        self.start_x <= self.end_x && self.start_y <= self.end_y && self.end_x < size && self.end_y < size
    }
}

/// Named windows on a 19x19 board.
pub mod presets {
    use super::BoardRange;

    pub const FULL: BoardRange = BoardRange::new(0, 0, 18, 18);
    pub const TOP_RIGHT: BoardRange = BoardRange::new(9, 0, 18, 9);
    pub const TOP_LEFT: BoardRange = BoardRange::new(0, 0, 9, 9);
    pub const BOTTOM_LEFT: BoardRange = BoardRange::new(0, 9, 9, 18);
    pub const BOTTOM_RIGHT: BoardRange = BoardRange::new(9, 9, 18, 18);
    pub const RIGHT: BoardRange = BoardRange::new(8, 0, 18, 18);
    pub const LEFT: BoardRange = BoardRange::new(0, 0, 10, 18);
    pub const TOP: BoardRange = BoardRange::new(0, 0, 18, 10);
    pub const BOTTOM: BoardRange = BoardRange::new(0, 9, 18, 18);
}
