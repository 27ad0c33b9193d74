#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Disease system that kills connected groves of trees in waves.
//!
//! An outbreak strikes its origin, waits until every struck tree has finished
//! dying, then strikes the alive neighbours of the whole wave at once. The
//! outbreak is contained when a wave finds nothing left to strike. Any number
//! of outbreaks may be in flight, each advancing independently.

use std::collections::BTreeSet;

use forest_core::{CellCoord, CellState, Command, Event, ForestView};

/// Identifier assigned to an outbreak when it starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutbreakId(u32);

impl OutbreakId {
    /// Creates a new outbreak identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Outcome of an outbreak that ran out of trees to strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutbreakSummary {
    /// Identifier assigned when the outbreak started.
    pub id: OutbreakId,
    /// Cell the outbreak started from.
    pub origin: CellCoord,
    /// Number of waves that struck at least one tree.
    pub waves: u32,
    /// Total number of trees struck.
    pub kills: u32,
}

#[derive(Debug)]
struct Outbreak {
    id: OutbreakId,
    origin: CellCoord,
    wave: Vec<CellCoord>,
    waves: u32,
    kills: u32,
}

impl Outbreak {
    /// Strikes every alive cell of the frontier as a single wave.
    ///
    /// Cells already in `claimed` were struck by another outbreak against the
    /// same snapshot and are skipped.
    fn strike<I>(
        &mut self,
        frontier: I,
        view: &ForestView<'_>,
        claimed: &mut BTreeSet<CellCoord>,
        out: &mut Vec<Command>,
    ) where
        I: IntoIterator<Item = CellCoord>,
    {
        self.wave.clear();
        for cell in frontier {
            if !view.is_alive(cell) || !claimed.insert(cell) {
                continue;
            }
            out.push(Command::KillTree { cell });
            self.wave.push(cell);
        }

        if self.wave.is_empty() {
            return;
        }
        self.waves += 1;
        self.kills += self.wave.len() as u32;
        tracing::debug!(
            outbreak = self.id.get(),
            wave = self.waves,
            struck = self.wave.len(),
            "disease wave struck"
        );
    }

    /// A wave settles once none of its trees is still alive or dying.
    fn wave_settled(&self, view: &ForestView<'_>) -> bool {
        self.wave
            .iter()
            .all(|cell| !matches!(view.state(*cell), CellState::Alive | CellState::Dying))
    }

    /// Alive neighbours of the settled wave, deduplicated.
    fn next_frontier(&self, view: &ForestView<'_>) -> BTreeSet<CellCoord> {
        self.wave
            .iter()
            .flat_map(|cell| view.alive_neighbors(*cell))
            .collect()
    }

    fn is_contained(&self) -> bool {
        self.wave.is_empty()
    }

    fn summary(&self) -> OutbreakSummary {
        OutbreakSummary {
            id: self.id,
            origin: self.origin,
            waves: self.waves,
            kills: self.kills,
        }
    }
}

/// Tracks in-flight outbreaks and emits the kill commands of each wave.
#[derive(Debug, Default)]
pub struct Disease {
    outbreaks: Vec<Outbreak>,
    contained: Vec<OutbreakSummary>,
    next_id: u32,
}

impl Disease {
    /// Creates a disease system with no outbreaks in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an outbreak at `origin`, striking it immediately if alive.
    ///
    /// An origin that is not alive yields an outbreak contained on the spot
    /// with zero kills.
    pub fn spread(
        &mut self,
        origin: CellCoord,
        view: &ForestView<'_>,
        out: &mut Vec<Command>,
    ) -> OutbreakId {
        let id = OutbreakId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let mut outbreak = Outbreak {
            id,
            origin,
            wave: Vec::new(),
            waves: 0,
            kills: 0,
        };
        outbreak.strike([origin], view, &mut BTreeSet::new(), out);

        if outbreak.is_contained() {
            self.contained.push(outbreak.summary());
        } else {
            self.outbreaks.push(outbreak);
        }
        id
    }

    /// Advances every outbreak whose current wave has finished dying.
    pub fn handle(&mut self, events: &[Event], view: &ForestView<'_>, out: &mut Vec<Command>) {
        if events
            .iter()
            .any(|event| matches!(event, Event::Configured { .. }))
        {
            self.reset();
            return;
        }

        let mut claimed = BTreeSet::new();
        self.outbreaks.retain_mut(|outbreak| {
            if !outbreak.wave_settled(view) {
                return true;
            }

            let frontier = outbreak.next_frontier(view);
            outbreak.strike(frontier, view, &mut claimed, out);
            if outbreak.is_contained() {
                self.contained.push(outbreak.summary());
                return false;
            }
            true
        });
    }

    /// Number of outbreaks still spreading.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.outbreaks.len()
    }

    /// Reports whether no outbreak is spreading.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.outbreaks.is_empty()
    }

    /// Hands over the summaries of outbreaks contained since the last call.
    pub fn drain_contained(&mut self) -> impl Iterator<Item = OutbreakSummary> + '_ {
        self.contained.drain(..)
    }

    /// Forgets every outbreak, in flight or contained.
    pub fn reset(&mut self) {
        self.outbreaks.clear();
        self.contained.clear();
    }
}
