use std::collections::BTreeSet;

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    #[default]
    Active,
    Finished,
}

impl EngineState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Which chunks [`RevealEngine::sample_positions`] draws from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PositionFilter {
    /// Only chunks a step could still claim
    Open,
    /// The whole field
    Any,
}

/// Result of a single step; `updated` is `None` when the step was rejected.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub step: Step,
    pub updated: Option<GameChunk>,
}

impl StepOutcome {
    const fn rejected(step: Step) -> Self {
        Self {
            step,
            updated: None,
        }
    }

    pub const fn is_resolved(&self) -> bool {
        self.updated.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepBatch {
    pub resolved: Vec<StepOutcome>,
    pub rejected: Vec<Step>,
    /// Set on the one batch that moved the engine into [`EngineState::Finished`]
    pub finished_now: bool,
}

impl StepBatch {
    pub fn resolved_steps(&self) -> Vec<Step> {
        self.resolved.iter().map(|outcome| outcome.step).collect()
    }
}

/// Live state of a contest: the chunk grid and the prize bank.
///
/// Chunks only ever move from open to revealed. The grid is indexed `[x, y]`,
/// so iteration order is column-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealEngine {
    grid: Array2<GameChunk>,
    bank: PrizeBank,
    state: EngineState,
}

impl RevealEngine {
    /// Lays out the field and draws the prize bank over it.
    pub fn generate<R>(
        layout: &FieldLayout,
        definitions: &[PrizeDefinition],
        rng: &mut R,
    ) -> Result<Self, ConfigError>
    where
        R: Rng + ?Sized,
    {
        let (width, height) = layout.grid;
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid);
        }

        let chunks: Vec<GameChunk> =
            layout.chunk_infos().into_iter().map(GameChunk::new).collect();
        let grid = Array2::from_shape_vec(layout.grid.to_nd_index(), chunks)
            .map_err(|_| ConfigError::EmptyGrid)?;
        let bank = PrizeBank::generate(definitions, grid.iter(), rng);
        log::debug!(
            "Generated {}x{} field with {} prize positions",
            width,
            height,
            bank.total_assigned()
        );

        Ok(Self {
            grid,
            bank,
            state: EngineState::Active,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether no chunk is left open, recomputed from the grid every call.
    pub fn is_finished(&self) -> bool {
        !self.grid.iter().any(GameChunk::is_open)
    }

    pub fn grid_size(&self) -> Position {
        let (x, y) = self.grid.dim();
        // built from `Coord` dimensions
        (x as Coord, y as Coord)
    }

    pub fn bank(&self) -> &PrizeBank {
        &self.bank
    }

    pub fn chunk_at(&self, position: Position) -> Option<&GameChunk> {
        self.grid.get(position.to_nd_index())
    }

    /// Owned copy of the grid, unaffected by later steps.
    pub fn capture(&self) -> GameSnapshot {
        self.grid.clone()
    }

    /// All chunks in column-major order.
    pub fn chunks(&self) -> impl Iterator<Item = &GameChunk> {
        self.grid.iter()
    }

    pub fn open_count(&self) -> usize {
        self.grid.iter().filter(|chunk| chunk.is_open()).count()
    }

    pub fn revealed_count(&self) -> usize {
        self.grid.len() - self.open_count()
    }

    /// Tries to claim the chunk under `step`.
    ///
    /// Unknown positions and chunks that are no longer open reject the step
    /// and leave everything untouched.
    pub fn apply_step(&mut self, step: Step) -> StepOutcome {
        if self.state.is_finished() {
            log::trace!("Rejected {:?}: contest already finished", step);
            return StepOutcome::rejected(step);
        }

        let Some(chunk) = self.grid.get_mut(step.position.to_nd_index()) else {
            log::trace!("Rejected {:?}: no chunk at position", step);
            return StepOutcome::rejected(step);
        };

        if !chunk.reveal(step) {
            log::trace!("Rejected {:?}: chunk already revealed", step);
            return StepOutcome::rejected(step);
        }

        if let Some(prize) = self.bank.claim(step) {
            log::debug!("Step {:?} won prize {}", step, prize.id);
            chunk.award(prize);
        }
        let updated = *chunk;

        if self.is_finished() {
            self.mark_finished();
        }

        StepOutcome {
            step,
            updated: Some(updated),
        }
    }

    /// Applies `steps` in order. Same-position steps in one batch are not
    /// merged: the first claims the chunk and the rest are rejected.
    pub fn apply_steps(&mut self, steps: impl IntoIterator<Item = Step>) -> StepBatch {
        let was_finished = self.state.is_finished();
        let mut batch = StepBatch::default();

        for step in steps {
            let outcome = self.apply_step(step);
            if outcome.is_resolved() {
                batch.resolved.push(outcome);
            } else {
                batch.rejected.push(step);
            }
        }

        batch.finished_now = !was_finished && self.state.is_finished();
        batch
    }

    /// Picks up to `count` distinct random positions.
    ///
    /// The count is clamped to the number of chunks matching `filter`.
    pub fn sample_positions<R>(
        &self,
        count: usize,
        filter: PositionFilter,
        rng: &mut R,
    ) -> Vec<Position>
    where
        R: Rng + ?Sized,
    {
        let pool: Vec<Position> = self
            .grid
            .iter()
            .filter(|chunk| match filter {
                PositionFilter::Open => chunk.is_open(),
                PositionFilter::Any => true,
            })
            .map(GameChunk::position)
            .collect();

        crate::bank::sample_distinct_indices(rng, pool.len(), count.min(pool.len()))
            .into_iter()
            .map(|i| pool[i])
            .collect()
    }

    fn mark_finished(&mut self) {
        if self.state.is_finished() {
            return;
        }
        log::debug!("All {} chunks revealed, contest finished", self.grid.len());
        self.state = EngineState::Finished;
    }
}

/// Keeps the first step of every submitter, preserving order.
///
/// The engine accepts several steps per submitter; hosts that allow one step
/// per player per round filter with this before submitting.
pub fn first_step_per_submitter(steps: impl IntoIterator<Item = Step>) -> Vec<Step> {
    let mut seen = BTreeSet::new();
    steps.into_iter().filter(|step| seen.insert(step.id)).collect()
}
