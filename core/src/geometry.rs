//! Pixel layout of the chunk grid inside the field.
//!
//! The field is surrounded by a `frame` margin on every side and chunks are
//! separated by a `gap`. All chunks share one size.

use serde::{Deserialize, Serialize};

use crate::*;

/// Everything needed to place chunks on the field.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldLayout {
    /// Field size in pixels
    pub field: Size,
    pub frame: f32,
    pub gap: f32,
    /// Number of chunks along each axis
    pub grid: Position,
}

impl FieldLayout {
    pub fn chunk_size(&self) -> Size {
        chunk_pixel_size(self.field, self.frame, self.gap, self.grid)
    }

    pub fn chunk_infos(&self) -> Vec<ChunkInfo> {
        build_chunk_infos(self.field, self.frame, self.gap, self.grid)
    }

    pub const fn total_chunks(&self) -> ChunkCount {
        mult(self.grid.0, self.grid.1)
    }
}

/// Size of every chunk for a field of `field` pixels split into `counts` chunks.
///
/// Callers validate the result; a zero or negative size means the frame and gaps
/// do not fit into the field.
pub fn chunk_pixel_size(field: Size, frame: f32, gap: f32, counts: Position) -> Size {
    let axis = |field: f32, count: Coord| {
        let count = f32::from(count.max(1));
        let gaps = gap * (count - 1.0);
        (field - 2.0 * frame - gaps) / count
    };

    Size {
        width: axis(field.width, counts.0),
        height: axis(field.height, counts.1),
    }
}

pub fn chunk_pixel_offset(position: Position, chunk_size: Size, frame: f32, gap: f32) -> Offset {
    let (x, y) = position;
    Offset {
        left: frame + f32::from(x) * (chunk_size.width + gap),
        top: frame + f32::from(y) * (chunk_size.height + gap),
    }
}

/// Layout of every chunk, column-major (outer loop on `x`, inner on `y`).
pub fn build_chunk_infos(field: Size, frame: f32, gap: f32, counts: Position) -> Vec<ChunkInfo> {
    let size = chunk_pixel_size(field, frame, gap, counts);
    let (x_end, y_end) = counts;

    let mut infos = Vec::with_capacity(mult(x_end, y_end) as usize);
    for x in 0..x_end {
        for y in 0..y_end {
            let position = (x, y);
            infos.push(ChunkInfo {
                position,
                size,
                offset: chunk_pixel_offset(position, size, frame, gap),
            });
        }
    }
    infos
}
