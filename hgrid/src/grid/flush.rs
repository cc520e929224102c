//! Tick processing.

use log::{debug, trace};

use super::HierarchicalGrid;
use crate::cache::EntryStatus;
use crate::events::{GridEvent, GridRef};
use crate::host::{HostHandle, RenderHost};
use crate::path::RowPath;
use crate::tick::{FlushStats, GridCommand, Tick};

impl<H: RenderHost> HierarchicalGrid<H> {
    /// Queue a command for the next flush.
    pub fn schedule(&mut self, command: GridCommand) {
        if self.destroyed {
            debug!("Ignoring {:?} on destroyed grid", command);
            return;
        }
        self.queue.push(Tick::Command(command));
    }

    /// Whether work is waiting for the next flush.
    pub fn is_dirty(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Process every queued tick, including ticks queued while flushing.
    pub fn flush(&mut self) -> FlushStats {
        let mut stats = FlushStats::default();
        if self.destroyed {
            return stats;
        }
        while let Some(tick) = self.queue.pop() {
            if self.apply(tick) {
                stats.applied += 1;
            } else {
                stats.discarded += 1;
            }
        }
        if stats.applied + stats.discarded > 0 {
            trace!(
                "Flushed {} tick(s), {} discarded",
                stats.applied + stats.discarded,
                stats.discarded
            );
        }
        stats
    }

    fn apply(&mut self, tick: Tick) -> bool {
        match tick {
            Tick::Command(command) => self.run_command(command),
            Tick::Finalize(path) => self.finalize(&path),
            Tick::Release { grid, handle } => {
                self.release(grid, handle);
                true
            }
            Tick::Relayout(path) => self.relayout_from(&path),
        }
    }

    fn run_command(&mut self, command: GridCommand) -> bool {
        match command {
            GridCommand::Expand { path, row } => self.expand(&path, &row),
            GridCommand::Collapse { path, row } => self.collapse(&path, &row),
            GridCommand::Toggle { path, row } => self.toggle(&path, &row),
            GridCommand::SetData { path, rows } => {
                if self.controller(&path).is_none() {
                    return false;
                }
                self.set_data(&path, rows);
                true
            }
            GridCommand::ScrollTo { path, start } => self.scroll_to(&path, start).is_some(),
            GridCommand::Relayout(path) => self.relayout_from(&path),
        }
    }

    /// Render a pending child grid, unless it went stale since it was
    /// created.
    fn finalize(&mut self, path: &RowPath) -> bool {
        let Some(entry) = self.cache.get(path) else {
            trace!("Finalize of {} skipped, entry gone", path);
            return false;
        };
        if entry.status != EntryStatus::Pending {
            return true;
        }
        if !self.still_wanted(path) {
            debug!("Discarding stale child grid {}", path);
            self.destroy_child(path);
            return false;
        }

        // Size the child itself now; the parent's extent is refreshed once
        // for all children finalized in this flush.
        self.layout_subtree(path);
        if let Some(parent) = path.parent() {
            self.queue.push(Tick::Relayout(parent));
        }

        let Some(entry) = self.cache.get_mut(path) else {
            return false;
        };
        let handle = self.host.render(&entry.controller.render_request());
        entry.status = EntryStatus::Live(handle);
        let grid = entry.controller.grid_ref();
        self.events.emit(GridEvent::GridCreated(grid));
        true
    }

    /// A child grid is wanted while its parent exists, its row is present and
    /// expanded, and its island is still registered under the parent's.
    fn still_wanted(&self, path: &RowPath) -> bool {
        let (Some(parent), Some(segment)) = (path.parent(), path.last()) else {
            return false;
        };
        let Some(level) = self.controller(&parent) else {
            return false;
        };
        let Some(entry) = self.cache.get(path) else {
            return false;
        };
        level.is_expanded(&segment.row_id)
            && self.islands.find_child(level.island(), &segment.island_key)
                == entry.controller.island()
    }

    fn release(&mut self, grid: GridRef, handle: HostHandle) {
        debug!("Releasing child grid {} at {}", grid.grid, grid.path);
        self.host.destroy(handle);
        self.events.emit(GridEvent::GridDestroyed(grid));
    }
}
