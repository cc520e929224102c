//! Deferred work processed on the next flush.

use std::collections::{HashSet, VecDeque};

use serde_json::Value;

use crate::events::GridRef;
use crate::host::HostHandle;
use crate::path::{RowId, RowPath};

/// Work a host can schedule for the next tick.
///
/// Commands are validated against the tree when they run; a command whose
/// grid or row is gone by then is discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum GridCommand {
    Expand { path: RowPath, row: RowId },
    Collapse { path: RowPath, row: RowId },
    Toggle { path: RowPath, row: RowId },
    SetData { path: RowPath, rows: Vec<Value> },
    ScrollTo { path: RowPath, start: usize },
    Relayout(RowPath),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tick {
    Command(GridCommand),
    /// Render a pending child grid.
    Finalize(RowPath),
    /// Release a collapsed child grid's host handle.
    Release { grid: GridRef, handle: HostHandle },
    /// Recompute sizes of a level, its children and its ancestors.
    Relayout(RowPath),
}

impl Tick {
    /// Identity of ticks that are redundant while one is queued.
    fn marker(&self) -> Option<Marker> {
        match self {
            Tick::Finalize(path) => Some(Marker::Finalize(path.clone())),
            Tick::Relayout(path) => Some(Marker::Relayout(path.clone())),
            Tick::Command(_) | Tick::Release { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Marker {
    Finalize(RowPath),
    Relayout(RowPath),
}

/// Outcome of a flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub applied: usize,
    /// Work dropped because its target went stale.
    pub discarded: usize,
}

/// FIFO of pending ticks.
#[derive(Debug, Default)]
pub(crate) struct TickQueue {
    queue: VecDeque<Tick>,
    /// Markers of the finalize and relayout ticks in `queue`.
    queued: HashSet<Marker>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a tick. Finalize and relayout ticks already queued for the same
    /// path are not queued twice.
    pub fn push(&mut self, tick: Tick) {
        if let Some(marker) = tick.marker()
            && !self.queued.insert(marker)
        {
            return;
        }
        self.queue.push_back(tick);
    }

    pub fn pop(&mut self) -> Option<Tick> {
        let tick = self.queue.pop_front()?;
        if let Some(marker) = tick.marker() {
            self.queued.remove(&marker);
        }
        Some(tick)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether a release is queued for a child of `row` on the level at
    /// `path`.
    pub fn releasing(&self, path: &RowPath, row: &RowId) -> bool {
        self.queue.iter().any(|tick| match tick {
            Tick::Release { grid, .. } => {
                path.is_parent_of(&grid.path)
                    && grid.path.last().is_some_and(|segment| &segment.row_id == row)
            }
            _ => false,
        })
    }

    /// Remove and return every queued release.
    pub fn take_releases(&mut self) -> Vec<(GridRef, HostHandle)> {
        let mut releases = Vec::new();
        self.queue.retain(|tick| match tick {
            Tick::Release { grid, handle } => {
                releases.push((grid.clone(), *handle));
                false
            }
            _ => true,
        });
        releases
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.queued.clear();
    }
}
