use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// One line of the bank configuration: how many chunks award `prize`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeDefinition {
    pub prize: Prize,
    pub count: ChunkCount,
}

impl PrizeDefinition {
    pub const fn new(prize: Prize, count: ChunkCount) -> Self {
        Self { prize, count }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrizeBankEntry {
    pub prize: Prize,
    /// Fixed when the bank is generated
    pub assigned: BTreeSet<Position>,
    /// Steps that landed on an assigned position, in application order
    pub claimed: Vec<Step>,
}

impl PrizeBankEntry {
    pub fn remaining(&self) -> usize {
        self.assigned.len() - self.claimed.len()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeStats {
    pub prize: Prize,
    pub assigned: usize,
    pub claimed: usize,
    pub remaining: usize,
}

/// Hidden prize placement for one contest.
///
/// Positions of different entries never overlap: every draw excludes positions
/// handed to earlier entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PrizeBank {
    entries: Vec<PrizeBankEntry>,
}

impl PrizeBank {
    /// Draws positions for each definition, in order, from the open chunks.
    ///
    /// A definition asking for more positions than are left gets clamped to
    /// what remains.
    pub fn generate<'a, R>(
        definitions: &[PrizeDefinition],
        chunks: impl IntoIterator<Item = &'a GameChunk>,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let candidates: Vec<Position> = chunks
            .into_iter()
            .filter(|chunk| chunk.is_open())
            .map(GameChunk::position)
            .collect();
        let mut taken = BTreeSet::new();

        let entries = definitions
            .iter()
            .map(|definition| {
                let pool: Vec<Position> = candidates
                    .iter()
                    .copied()
                    .filter(|position| !taken.contains(position))
                    .collect();

                let count = usize::try_from(definition.count).unwrap_or(usize::MAX);
                let count = if count > pool.len() {
                    log::warn!(
                        "Prize {} requested {} positions but only {} are free, clamping",
                        definition.prize.id,
                        definition.count,
                        pool.len()
                    );
                    pool.len()
                } else {
                    count
                };

                let assigned: BTreeSet<Position> =
                    sample_distinct_indices(&mut *rng, pool.len(), count)
                        .into_iter()
                        .map(|i| pool[i])
                        .collect();
                taken.extend(assigned.iter().copied());
                log::trace!("Prize {} assigned to {:?}", definition.prize.id, assigned);

                PrizeBankEntry {
                    prize: definition.prize,
                    assigned,
                    claimed: Vec::new(),
                }
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[PrizeBankEntry] {
        &self.entries
    }

    pub fn find(&self, prize_id: u32) -> Option<&PrizeBankEntry> {
        self.entries.iter().find(|entry| entry.prize.id == prize_id)
    }

    pub fn entries_at(&self, position: Position) -> impl Iterator<Item = &PrizeBankEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.assigned.contains(&position))
    }

    /// Records `step` against every entry assigned to its position and returns
    /// the prize it won, if any.
    pub(crate) fn claim(&mut self, step: Step) -> Option<Prize> {
        let mut won = None;
        for entry in &mut self.entries {
            if entry.assigned.contains(&step.position) {
                entry.claimed.push(step);
                won.get_or_insert(entry.prize);
            }
        }
        won
    }

    pub fn total_assigned(&self) -> usize {
        self.entries.iter().map(|entry| entry.assigned.len()).sum()
    }

    pub fn stats(&self) -> Vec<PrizeStats> {
        self.entries
            .iter()
            .map(|entry| PrizeStats {
                prize: entry.prize,
                assigned: entry.assigned.len(),
                claimed: entry.claimed.len(),
                remaining: entry.remaining(),
            })
            .collect()
    }
}

/// Rejection-samples `count` distinct indices below `len`; `count` must not exceed `len`.
pub(crate) fn sample_distinct_indices<R>(rng: &mut R, len: usize, count: usize) -> BTreeSet<usize>
where
    R: Rng + ?Sized,
{
    debug_assert!(count <= len);
    let mut picked = BTreeSet::new();
    while picked.len() < count {
        picked.insert(rng.random_range(0..len));
    }
    picked
}
