use serde::{Deserialize, Serialize};

use crate::*;

/// Fixed layout of a chunk, computed once when the field is generated.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkInfo {
    pub position: Position,
    pub size: Size,
    pub offset: Offset,
}

/// Reveal state of a chunk.
///
/// Both flags flip together on the step that claims the chunk and never revert.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStatus {
    pub checked: bool,
    pub available: bool,
}

impl ChunkStatus {
    pub const OPEN: Self = Self {
        checked: false,
        available: true,
    };

    pub const REVEALED: Self = Self {
        checked: true,
        available: false,
    };

    /// Whether a step may still land here
    pub const fn is_open(self) -> bool {
        self.available && !self.checked
    }
}

impl Default for ChunkStatus {
    fn default() -> Self {
        Self::OPEN
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameChunk {
    pub info: ChunkInfo,
    pub status: ChunkStatus,
    pub prize: Option<Prize>,
    pub step: Option<Step>,
}

impl GameChunk {
    pub const fn new(info: ChunkInfo) -> Self {
        Self {
            info,
            status: ChunkStatus::OPEN,
            prize: None,
            step: None,
        }
    }

    pub const fn position(&self) -> Position {
        self.info.position
    }

    pub const fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Claims the chunk for `step`. Returns `false` without touching anything if
    /// the chunk was already taken.
    pub(crate) fn reveal(&mut self, step: Step) -> bool {
        if !self.is_open() {
            return false;
        }
        self.status = ChunkStatus::REVEALED;
        self.step = Some(step);
        true
    }

    pub(crate) fn award(&mut self, prize: Prize) {
        debug_assert!(self.prize.is_none(), "chunk at {:?} awarded twice", self.info.position);
        self.prize.get_or_insert(prize);
    }
}
