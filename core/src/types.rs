use serde::{Deserialize, Serialize};

/// Single coordinate axis used for grid width, height, and positions.
pub type Coord = u16;

/// Count type used for chunk and prize counts.
pub type ChunkCount = u32;

/// Two-dimensional grid coordinates `(x, y)`.
pub type Position = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Position {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> ChunkCount {
    let a = a as ChunkCount;
    let b = b as ChunkCount;
    a.saturating_mul(b)
}

/// Pixel dimensions, fractional so that chunk sizes divide the field exactly.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn is_positive(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Pixel offset of a chunk's top-left corner on the field.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub left: f32,
    pub top: f32,
}

impl Offset {
    pub const fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }
}

/// Opaque prize identity chosen by whoever configures the bank.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Prize {
    pub id: u32,
}

impl Prize {
    pub const fn new(id: u32) -> Self {
        Self { id }
    }
}

/// A submitter's request to reveal the chunk at `position`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    /// Submitter identity, caller defined
    pub id: u32,
    pub position: Position,
}

impl Step {
    pub const fn new(id: u32, position: Position) -> Self {
        Self { id, position }
    }
}
