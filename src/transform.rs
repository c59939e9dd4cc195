//! Board symmetries: rotation, reflection and color inversion.
//!
//! A [`BoardTransformation`] maps the stored ("original") puzzle onto the
//! presented ("display") board. The forward map rotates clockwise first and
//! then reflects; [`BoardTransformation::invert_vertex`] undoes the reflection
//! and then rotates counter-clockwise, so the two are exact inverses for all
//! 32 combinations. Stored tree data never sees display coordinates.

use std::fmt;
use std::str::FromStr;

use crate::board::{GoBoard, Sign};
use crate::coord::{BoardRange, Vertex};
use crate::error::TransformError;

/// Clockwise rotation in 90 degree steps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270];

    pub fn degrees(self) -> u16 {
        self.steps() as u16 * 90
    }

    /// Number of clockwise quarter turns.
    pub fn steps(self) -> usize {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    fn from_steps(steps: usize) -> Self {
        Self::ALL[steps % 4]
    }

    /// Rotation by `360 - self` degrees.
    pub fn inverse(self) -> Self {
        Self::from_steps(4 - self.steps())
    }

    pub fn turned(self, direction: RotateDirection) -> Self {
        match direction {
            RotateDirection::Clockwise => Self::from_steps(self.steps() + 1),
            RotateDirection::CounterClockwise => Self::from_steps(self.steps() + 3),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = TransformError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(TransformError::InvalidRotation(other)),
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// Mirror applied after rotation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Reflection {
    #[default]
    None,
    /// Flips top and bottom: `y -> n-1-y`.
    Horizontal,
    /// Flips left and right: `x -> n-1-x`.
    Vertical,
    /// Transpose: `(x, y) -> (y, x)`.
    Diagonal,
}

impl Reflection {
    pub const ALL: [Reflection; 4] = [
        Reflection::None,
        Reflection::Horizontal,
        Reflection::Vertical,
        Reflection::Diagonal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Reflection::None => "none",
            Reflection::Horizontal => "horizontal",
            Reflection::Vertical => "vertical",
            Reflection::Diagonal => "diagonal",
        }
    }

    /// Every reflection is its own inverse.
    #[inline]
    fn apply(self, v: Vertex, size: usize) -> Vertex {
        match self {
            Reflection::None => v,
            Reflection::Horizontal => Vertex::new(v.x, size - 1 - v.y),
            Reflection::Vertical => Vertex::new(size - 1 - v.x, v.y),
            Reflection::Diagonal => Vertex::new(v.y, v.x),
        }
    }
}

impl FromStr for Reflection {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Reflection::None),
            "horizontal" | "h" => Ok(Reflection::Horizontal),
            "vertical" | "v" => Ok(Reflection::Vertical),
            "diagonal" | "d" => Ok(Reflection::Diagonal),
            _ => Err(TransformError::InvalidReflection(s.to_string())),
        }
    }
}

impl fmt::Display for Reflection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RotateDirection {
    Clockwise,
    CounterClockwise,
}

impl FromStr for RotateDirection {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cw" | "clockwise" => Ok(RotateDirection::Clockwise),
            "ccw" | "counterclockwise" => Ok(RotateDirection::CounterClockwise),
            _ => Err(TransformError::InvalidDirection(s.to_string())),
        }
    }
}

/// One 90 degree clockwise step.
#[inline]
fn rotate_step(v: Vertex, size: usize) -> Vertex {
    Vertex::new(v.y, size - 1 - v.x)
}

fn rotate(v: Vertex, rotation: Rotation, size: usize) -> Vertex {
    match rotation {
        Rotation::Deg0 => v,
        Rotation::Deg90 => rotate_step(v, size),
        Rotation::Deg180 => Vertex::new(size - 1 - v.x, size - 1 - v.y),
        Rotation::Deg270 => Vertex::new(size - 1 - v.y, v.x),
    }
}

const COLOR_WORDS: [(&str, &str); 4] = [
    ("Black", "White"),
    ("black", "white"),
    ("White", "Black"),
    ("white", "black"),
];

/// A combined rotation, reflection and color inversion.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BoardTransformation {
    pub rotation: Rotation,
    pub reflection: Reflection,
    pub invert_colors: bool,
}

impl BoardTransformation {
    pub const IDENTITY: Self = Self {
        rotation: Rotation::Deg0,
        reflection: Reflection::None,
        invert_colors: false,
    };

    pub fn new(rotation: Rotation, reflection: Reflection, invert_colors: bool) -> Self {
        Self {
            rotation,
            reflection,
            invert_colors,
        }
    }

    /// Build from raw degrees and a reflection name.
    pub fn parse(degrees: i32, reflection: &str, invert_colors: bool) -> Result<Self, TransformError> {
        Ok(Self::new(Rotation::try_from(degrees)?, reflection.parse()?, invert_colors))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Every rotation/reflection/inversion combination.
    pub fn all() -> impl Iterator<Item = Self> {
        Rotation::ALL.into_iter().flat_map(|rotation| {
            Reflection::ALL.into_iter().flat_map(move |reflection| {
                [false, true]
                    .into_iter()
                    .map(move |invert_colors| Self::new(rotation, reflection, invert_colors))
            })
        })
    }

    /// Uniformly random transformation.
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::new(
            Rotation::ALL[rng.usize(..Rotation::ALL.len())],
            Reflection::ALL[rng.usize(..Reflection::ALL.len())],
            rng.bool(),
        )
    }

    /// Original-space vertex to display space.
    pub fn transform_vertex(&self, v: Vertex, size: usize) -> Vertex {
        self.reflection.apply(rotate(v, self.rotation, size), size)
    }

    /// Display-space vertex back to original space.
    pub fn invert_vertex(&self, v: Vertex, size: usize) -> Vertex {
        let mut p = self.reflection.apply(v, size);
        for _ in 0..self.rotation.inverse().steps() {
            p = rotate_step(p, size);
        }
        p
    }

    /// The transformation whose forward map is this one's inverse.
    ///
    /// A rotation followed by any reflection is itself a reflection of the
    /// square and therefore self-inverse; a pure rotation inverts to the
    /// counter-rotation.
    pub fn inverse(&self) -> Self {
        let rotation = match self.reflection {
            Reflection::None => self.rotation.inverse(),
            _ => self.rotation,
        };
        Self::new(rotation, self.reflection, self.invert_colors)
    }

    #[inline]
    pub fn transform_sign(&self, sign: Sign) -> Sign {
        if self.invert_colors { sign.invert() } else { sign }
    }

    /// Map a rectangle by transforming both corners and re-normalizing.
    pub fn transform_range(&self, range: BoardRange, size: usize) -> BoardRange {
        BoardRange::spanning(
            self.transform_vertex(range.start(), size),
            self.transform_vertex(range.end(), size),
        )
    }

    /// Map a display-space rectangle back to original space.
    pub fn invert_range(&self, range: BoardRange, size: usize) -> BoardRange {
        BoardRange::spanning(self.invert_vertex(range.start(), size), self.invert_vertex(range.end(), size))
    }

    /// Swap the words Black/black and White/white when colors are inverted.
    pub fn transform_comment(&self, comment: &str) -> String {
        if !self.invert_colors {
            return comment.to_string();
        }
        let mut out = String::with_capacity(comment.len());
        let mut rest = comment;
        while !rest.is_empty() {
            if let Some((from, to)) = COLOR_WORDS.iter().find(|(from, _)| rest.starts_with(from)) {
                out.push_str(to);
                rest = &rest[from.len()..];
                continue;
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
        out
    }

    /// Re-project a whole position through the transformation.
    pub fn transform_board<B: GoBoard>(&self, board: &B) -> B {
        let size = board.size();
        let mut out = B::from_dimensions(size);
        for y in 0..size {
            for x in 0..size {
                let v = Vertex::new(x, y);
                let stone = board.get(v);
                if stone.is_stone() {
                    out = out.set_stone(self.transform_sign(stone), self.transform_vertex(v, size));
                }
            }
        }
        out
    }

    pub fn rotate(&mut self, direction: RotateDirection) {
        self.rotation = self.rotation.turned(direction);
    }

    /// Select `kind`, or clear the reflection if `kind` is already active.
    pub fn reflect(&mut self, kind: Reflection) {
        self.reflection = if self.reflection == kind { Reflection::None } else { kind };
    }

    pub fn toggle_color_inversion(&mut self) {
        self.invert_colors = !self.invert_colors;
    }
}

impl fmt::Display for BoardTransformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rotation {} reflection {} colors {}",
            self.rotation,
            self.reflection,
            if self.invert_colors { "inverted" } else { "normal" }
        )
    }
}
