//! Per-level data, columns and options.

use log::debug;
use serde_json::Value;

use super::HierarchicalGrid;
use crate::column::Column;
use crate::config::DisplayDensity;
use crate::events::GridEvent;
use crate::geometry::SizeSpec;
use crate::host::RenderHost;
use crate::path::RowPath;
use crate::selection::SelectionMode;
use crate::tick::Tick;

impl<H: RenderHost> HierarchicalGrid<H> {
    /// Bind rows to the level at `path`.
    ///
    /// Child grids of rows that persist keep their state and get their data
    /// reattached; those of vanished rows are destroyed. Returns false if the
    /// level is unknown or the data is unchanged.
    pub fn set_data(&mut self, path: &RowPath, rows: Vec<Value>) -> bool {
        self.apply_data(path, Some(rows))
    }

    /// Unbind the level's data.
    pub fn clear_data(&mut self, path: &RowPath) -> bool {
        self.apply_data(path, None)
    }

    pub(crate) fn apply_data(&mut self, path: &RowPath, rows: Option<Vec<Value>>) -> bool {
        let Some(level) = self.level_mut(path, "set_data") else {
            return false;
        };
        let update = level.set_data(rows);
        let changed = update.changed;
        self.data_changed(path, update);
        changed
    }

    /// Change the field identifying rows of the level.
    ///
    /// Expansion and selection of rows whose identity changed are dropped.
    pub fn set_primary_key(&mut self, path: &RowPath, key: Option<String>) -> bool {
        let Some(level) = self.level_mut(path, "set_primary_key") else {
            return false;
        };
        let update = level.set_primary_key(key);
        let changed = update.changed;
        self.data_changed(path, update);
        changed
    }

    /// Declare the level's columns. An empty list re-enables auto-generation.
    pub fn set_columns(&mut self, path: &RowPath, columns: Vec<Column>) -> bool {
        let Some(level) = self.level_mut(path, "set_columns") else {
            return false;
        };
        level.set_declared_columns(columns);
        self.refresh_level_columns(path);
        true
    }

    /// Re-derive the level's columns. Any difference, including a changed
    /// header, width or order, is announced and pushed to the host.
    pub(crate) fn refresh_level_columns(&mut self, path: &RowPath) {
        let Some(level) = self.controller_mut(path) else {
            return;
        };
        let diff = level.refresh_columns();
        if diff.is_empty() {
            return;
        }
        let grid = level.grid_ref();
        self.events.emit(GridEvent::ColumnsChanged { grid, diff });
        self.update_host(path);
    }

    pub fn set_height(&mut self, path: &RowPath, height: SizeSpec) -> bool {
        let Some(level) = self.level_mut(path, "set_height") else {
            return false;
        };
        level.set_height(height);
        self.queue.push(Tick::Relayout(path.clone()));
        true
    }

    pub fn set_width(&mut self, path: &RowPath, width: SizeSpec) -> bool {
        let Some(level) = self.level_mut(path, "set_width") else {
            return false;
        };
        level.set_width(width);
        self.queue.push(Tick::Relayout(path.clone()));
        true
    }

    /// Change the level's selection mode. Switching to `None` clears the
    /// selection.
    pub fn set_selection_mode(&mut self, path: &RowPath, mode: SelectionMode) -> bool {
        let Some(level) = self.level_mut(path, "set_selection_mode") else {
            return false;
        };
        let change = level.set_selection_mode(mode);
        let grid = level.grid_ref();
        self.emit_selection(grid, change);
        true
    }

    pub fn density(&self) -> DisplayDensity {
        self.root.density()
    }

    /// Change the row density of the root and every child grid.
    pub fn set_density(&mut self, density: DisplayDensity) {
        if self.root.density() == density {
            return;
        }
        debug!("Display density -> {:?}", density);
        self.config.density = density;
        self.root.set_density(density);
        let paths: Vec<RowPath> = self
            .cache
            .iter()
            .map(|entry| entry.path().clone())
            .collect();
        for path in paths {
            if let Some(level) = self.controller_mut(&path) {
                level.set_density(density);
            }
        }
        self.queue.push(Tick::Relayout(RowPath::root()));
    }
}
