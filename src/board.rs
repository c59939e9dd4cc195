//! Go rules engine: stone placement, captures and move legality.
//!
//! The puzzle layers above only talk to the [`GoBoard`] trait, so a
//! different rules implementation can be plugged in. [`Board`] is the one
//! shipped with the crate: an immutable 2D grid where every accepted move
//! yields a fresh board value.

use std::fmt;

use crate::coord::Vertex;

/// Occupancy of a board point.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Sign {
    Black = 1,
    White = -1,
    #[default]
    Empty = 0,
}

impl Sign {
    /// Swap Black and White; Empty stays Empty.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Sign::Black => Sign::White,
            Sign::White => Sign::Black,
            Sign::Empty => Sign::Empty,
        }
    }

    /// The other player. Same as [`Sign::invert`], named for turn logic.
    #[inline]
    pub fn opponent(self) -> Self {
        self.invert()
    }

    pub fn is_stone(self) -> bool {
        self != Sign::Empty
    }

    pub fn as_i8(self) -> i8 {
        self as i8
    }

    pub fn from_i8(value: i8) -> Self {
        match value.signum() {
            1 => Sign::Black,
            -1 => Sign::White,
            _ => Sign::Empty,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Sign::Black => "Black",
            Sign::White => "White",
            Sign::Empty => "Empty",
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of checking a move without committing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveAnalysis {
    /// The move would be rejected; the board is unchanged.
    pub pass: bool,
    /// Number of opponent stones the move would remove.
    pub captures: usize,
    pub suicide: bool,
    pub ko: bool,
    pub occupied: bool,
    pub out_of_bounds: bool,
}

/// Interface the puzzle session expects from a rules engine.
pub trait GoBoard: Clone + Sized {
    /// An empty `size` x `size` board.
    fn from_dimensions(size: usize) -> Self;

    fn size(&self) -> usize;

    /// Occupancy of `vertex`; points off the board read as empty.
    fn get(&self, vertex: Vertex) -> Sign;

    /// Play `sign` at `vertex`, returning the resulting board or `None` if
    /// the move is illegal.
    fn make_move(&self, sign: Sign, vertex: Vertex) -> Option<Self>;

    /// Check a move without playing it.
    fn analyze_move(&self, sign: Sign, vertex: Vertex) -> MoveAnalysis;

    /// Place a stone with no legality checks, as SGF setup properties do.
    fn set_stone(&self, sign: Sign, vertex: Vertex) -> Self;
}

/// Immutable square Go board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Sign>,
    /// Point where the given side may not immediately recapture.
    ko: Option<(Vertex, Sign)>,
    /// Stones captured by Black and by White.
    captures: [usize; 2],
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Sign::Empty; size * size],
            ko: None,
            captures: [0, 0],
        }
    }

    fn idx(&self, v: Vertex) -> usize {
        v.y * self.size + v.x
    }

    /// Stones captured so far by `sign`.
    pub fn captures(&self, sign: Sign) -> usize {
        match sign {
            Sign::Black => self.captures[0],
            Sign::White => self.captures[1],
            Sign::Empty => 0,
        }
    }

    pub fn ko(&self) -> Option<Vertex> {
        self.ko.map(|(v, _)| v)
    }

    /// Side barred from playing at [`Board::ko`].
    pub fn ko_side(&self) -> Option<Sign> {
        self.ko.map(|(_, s)| s)
    }

    /// Every occupied point with its stone.
    pub fn stones(&self) -> impl Iterator<Item = (Vertex, Sign)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, &s)| {
            s.is_stone()
                .then(|| (Vertex::new(i % self.size, i / self.size), s))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|s| !s.is_stone())
    }

    fn neighbors(&self, v: Vertex) -> impl Iterator<Item = Vertex> {
        let s = self.size;
        let mut out = Vec::with_capacity(4);
        if v.x > 0 {
            out.push(Vertex::new(v.x - 1, v.y));
        }
        if v.x + 1 < s {
            out.push(Vertex::new(v.x + 1, v.y));
        }
        if v.y > 0 {
            out.push(Vertex::new(v.x, v.y - 1));
        }
        if v.y + 1 < s {
            out.push(Vertex::new(v.x, v.y + 1));
        }
        out.into_iter()
    }

    /// Play the move on a scratch copy and report what happened.
    fn try_play(&self, sign: Sign, vertex: Vertex) -> (MoveAnalysis, Option<Board>) {
        let mut analysis = MoveAnalysis::default();
        if !sign.is_stone() || !vertex.in_bounds(self.size) {
            analysis.pass = true;
            analysis.out_of_bounds = !vertex.in_bounds(self.size);
            return (analysis, None);
        }
        if self.get(vertex).is_stone() {
            analysis.pass = true;
            analysis.occupied = true;
            return (analysis, None);
        }
        if self.ko == Some((vertex, sign)) {
            analysis.pass = true;
            analysis.ko = true;
            return (analysis, None);
        }

        let mut next = self.clone();
        let idx = next.idx(vertex);
        next.cells[idx] = sign;

        let opp = sign.opponent();
        let mut to_remove: Vec<Vertex> = Vec::new();
        for n in self.neighbors(vertex) {
            if next.get(n) == opp && !to_remove.contains(&n) && next.group_liberties(n) == 0 {
                next.collect_group(n, &mut to_remove);
            }
        }
        for r in &to_remove {
            let i = next.idx(*r);
            next.cells[i] = Sign::Empty;
        }
        analysis.captures = to_remove.len();

        if analysis.captures == 0 && next.group_liberties(vertex) == 0 {
            analysis.pass = true;
            analysis.suicide = true;
            return (analysis, None);
        }

        // A lone stone that captured exactly one stone and now has a single
        // liberty may not be retaken at once.
        let mut own_group = Vec::new();
        next.collect_group(vertex, &mut own_group);
        next.ko = if analysis.captures == 1 && own_group.len() == 1 && next.group_liberties(vertex) == 1 {
            Some((to_remove[0], opp))
        } else {
            None
        };

        match sign {
            Sign::Black => next.captures[0] += analysis.captures,
            Sign::White => next.captures[1] += analysis.captures,
            Sign::Empty => {}
        }
        (analysis, Some(next))
    }

    fn collect_group(&self, start: Vertex, out: &mut Vec<Vertex>) -> usize {
        let color = self.get(start);
        let mut stack = vec![start];
        let mut visited = vec![false; self.size * self.size];
        let mut count = 0;
        while let Some(v) = stack.pop() {
            let i = self.idx(v);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            if self.get(v) == color {
                out.push(v);
                count += 1;
                for n in self.neighbors(v) {
                    if !visited[self.idx(n)] && self.get(n) == color {
                        stack.push(n);
                    }
                }
            }
        }
        count
    }

    fn group_liberties(&self, start: Vertex) -> usize {
        let color = self.get(start);
        if !color.is_stone() {
            return 0;
        }
        let mut stack = vec![start];
        let mut visited = vec![false; self.size * self.size];
        let mut liberty_seen = vec![false; self.size * self.size];
        let mut liberties = 0;
        while let Some(v) = stack.pop() {
            let i = self.idx(v);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            for n in self.neighbors(v) {
                let ni = self.idx(n);
                match self.get(n) {
                    Sign::Empty if !liberty_seen[ni] => {
                        liberty_seen[ni] = true;
                        liberties += 1;
                    }
                    c if c == color && !visited[ni] => stack.push(n),
                    _ => {}
                }
            }
        }
        liberties
    }
}

impl GoBoard for Board {
    fn from_dimensions(size: usize) -> Self {
        Self::new(size)
    }

    fn size(&self) -> usize {
        self.size
    }

    fn get(&self, vertex: Vertex) -> Sign {
        if !vertex.in_bounds(self.size) {
            return Sign::Empty;
        }
        self.cells[self.idx(vertex)]
    }

    fn make_move(&self, sign: Sign, vertex: Vertex) -> Option<Self> {
        self.try_play(sign, vertex).1
    }

    fn analyze_move(&self, sign: Sign, vertex: Vertex) -> MoveAnalysis {
        self.try_play(sign, vertex).0
    }

    fn set_stone(&self, sign: Sign, vertex: Vertex) -> Self {
        let mut next = self.clone();
        if vertex.in_bounds(self.size) {
            let i = next.idx(vertex);
            next.cells[i] = sign;
        }
        next.ko = None;
        next
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size {
            for x in 0..self.size {
                let ch = match self.get(Vertex::new(x, y)) {
                    Sign::Black => 'X',
                    Sign::White => 'O',
                    Sign::Empty => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: usize, y: usize) -> Vertex {
        Vertex::new(x, y)
    }

    #[test]
    fn test_sign_invert_involution() {
        for s in [Sign::Black, Sign::White, Sign::Empty] {
            assert_eq!(s.invert().invert(), s);
        }
        assert_eq!(Sign::Black.invert(), Sign::White);
        assert_eq!(Sign::Empty.invert(), Sign::Empty);
        assert_eq!(Sign::from_i8(-3), Sign::White);
        assert_eq!(Sign::White.as_i8(), -1);
    }

    #[test]
    fn test_make_move_is_persistent() {
        let empty = Board::new(9);
        let after = empty.make_move(Sign::Black, v(4, 4)).unwrap();
        assert_eq!(empty.get(v(4, 4)), Sign::Empty);
        assert_eq!(after.get(v(4, 4)), Sign::Black);
    }

    #[test]
    fn test_occupied_rejected() {
        let b = Board::new(9).make_move(Sign::Black, v(2, 2)).unwrap();
        assert!(b.make_move(Sign::White, v(2, 2)).is_none());
        assert!(b.analyze_move(Sign::White, v(2, 2)).occupied);
    }

    #[test]
    fn test_corner_capture() {
        let b = Board::new(9)
            .make_move(Sign::White, v(0, 0))
            .and_then(|b| b.make_move(Sign::Black, v(1, 0)))
            .unwrap();
        let analysis = b.analyze_move(Sign::Black, v(0, 1));
        assert!(!analysis.pass);
        assert_eq!(analysis.captures, 1);
        let b = b.make_move(Sign::Black, v(0, 1)).unwrap();
        assert_eq!(b.get(v(0, 0)), Sign::Empty);
        assert_eq!(b.captures(Sign::Black), 1);
    }

    #[test]
    fn test_suicide_rejected() {
        let b = Board::new(9)
            .make_move(Sign::Black, v(1, 0))
            .and_then(|b| b.make_move(Sign::Black, v(0, 1)))
            .unwrap();
        let analysis = b.analyze_move(Sign::White, v(0, 0));
        assert!(analysis.pass);
        assert!(analysis.suicide);
        assert!(b.make_move(Sign::White, v(0, 0)).is_none());
    }

    #[test]
    fn test_ko_retake_rejected() {
        // . X O .
        // X O . O
        // . X O .
        let mut b = Board::new(9);
        for (s, x, y) in [
            (Sign::Black, 1, 0),
            (Sign::Black, 0, 1),
            (Sign::Black, 1, 2),
            (Sign::White, 2, 0),
            (Sign::White, 3, 1),
            (Sign::White, 2, 2),
            (Sign::White, 1, 1),
        ] {
            b = b.set_stone(s, v(x, y));
        }
        let b = b.make_move(Sign::Black, v(2, 1)).unwrap();
        assert_eq!(b.get(v(1, 1)), Sign::Empty);
        assert_eq!(b.ko(), Some(v(1, 1)));
        assert!(b.analyze_move(Sign::White, v(1, 1)).ko);
        assert_eq!(b.ko_side(), Some(Sign::White));
        // Playing elsewhere clears the ko.
        let b = b.make_move(Sign::White, v(7, 7)).unwrap();
        assert!(b.ko().is_none());
    }

    #[test]
    fn test_ko_capturer_may_fill() {
        let mut b = Board::new(9);
        for (s, x, y) in [
            (Sign::Black, 1, 0),
            (Sign::Black, 0, 1),
            (Sign::Black, 1, 2),
            (Sign::White, 2, 0),
            (Sign::White, 3, 1),
            (Sign::White, 2, 2),
            (Sign::White, 1, 1),
        ] {
            b = b.set_stone(s, v(x, y));
        }
        let b = b.make_move(Sign::Black, v(2, 1)).unwrap();
        assert!(!b.analyze_move(Sign::Black, v(1, 1)).ko);
        let filled = b.make_move(Sign::Black, v(1, 1)).unwrap();
        assert_eq!(filled.get(v(1, 1)), Sign::Black);
        assert!(filled.ko().is_none());
    }

    #[test]
    fn test_display() {
        let b = Board::new(3).set_stone(Sign::Black, v(0, 0)).set_stone(Sign::White, v(2, 2));
        assert_eq!(b.to_string(), "X . . \n. . . \n. . O \n");
    }
}
