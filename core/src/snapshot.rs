use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Full grid at one instant, indexed `[x, y]`.
pub type GameSnapshot = Array2<GameChunk>;

/// Frozen contest state after one submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Position in the contest history, `0` is the initial field
    pub sequence: usize,
    pub created_at: DateTime<Utc>,
    pub chunks: GameSnapshot,
    /// Steps resolved by the submission that produced this snapshot
    pub last_steps: Vec<Step>,
}

impl Snapshot {
    /// Takes ownership of already-copied chunks and steps.
    pub fn capture(sequence: usize, chunks: GameSnapshot, last_steps: Vec<Step>) -> Self {
        Self {
            sequence,
            created_at: Utc::now(),
            chunks,
            last_steps,
        }
    }

    pub fn grid_size(&self) -> Position {
        let (x, y) = self.chunks.dim();
        (x as Coord, y as Coord)
    }

    pub fn chunk_at(&self, position: Position) -> Option<&GameChunk> {
        self.chunks.get(position.to_nd_index())
    }

    pub fn revealed(&self) -> impl Iterator<Item = &GameChunk> {
        self.chunks.iter().filter(|chunk| chunk.status.checked)
    }

    pub fn prizes_won(&self) -> impl Iterator<Item = (Position, Prize)> + '_ {
        self.chunks
            .iter()
            .filter_map(|chunk| chunk.prize.map(|prize| (chunk.position(), prize)))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Append-only list of snapshots; index equals [`Snapshot::sequence`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, chunks: GameSnapshot, last_steps: Vec<Step>) -> &Snapshot {
        let snapshot = Snapshot::capture(self.snapshots.len(), chunks, last_steps);
        log::debug!(
            "Recorded snapshot #{} with {} resolved steps",
            snapshot.sequence,
            snapshot.last_steps.len()
        );
        self.snapshots.push(snapshot);
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn get(&self, sequence: usize) -> Option<&Snapshot> {
        self.snapshots.get(sequence)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    pub fn as_slice(&self) -> &[Snapshot] {
        &self.snapshots
    }
}
