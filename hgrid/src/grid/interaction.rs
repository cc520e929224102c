//! Row selection and forwarded cell events.

use log::debug;
use serde_json::Value;

use super::HierarchicalGrid;
use crate::events::{GridEvent, GridRef};
use crate::host::RenderHost;
use crate::path::{RowId, RowPath};
use crate::selection::{Selection, SelectionChange};

impl<H: RenderHost> HierarchicalGrid<H> {
    /// Select a single row of the level, replacing its selection.
    ///
    /// Returns false if selection is disabled on the level or the row is
    /// unknown.
    pub fn select_row(&mut self, path: &RowPath, row: &RowId) -> bool {
        self.change_selection(path, row, "select_row", |selection, _| selection.select(row))
    }

    /// Toggle a row. In single mode this selects it or clears the selection.
    pub fn toggle_row_selection(&mut self, path: &RowPath, row: &RowId) -> bool {
        self.change_selection(path, row, "toggle_row_selection", |selection, _| {
            selection.toggle(row)
        })
    }

    /// Select the rows between the anchor and `row`. Multiple mode only.
    pub fn select_range(&mut self, path: &RowPath, row: &RowId, extend: bool) -> bool {
        self.change_selection(path, row, "select_range", |selection, order| {
            selection.select_range(row, order, extend)
        })
    }

    pub fn deselect_all(&mut self, path: &RowPath) -> bool {
        let Some(level) = self.level_mut(path, "deselect_all") else {
            return false;
        };
        let change = level.selection_mut().clear();
        let grid = level.grid_ref();
        self.emit_selection(grid, change);
        true
    }

    /// Selected rows of the level, sorted by ID.
    pub fn selected_rows(&self, path: &RowPath) -> Vec<RowId> {
        self.controller(path)
            .map(|level| level.selection().selected())
            .unwrap_or_default()
    }

    /// Forward a cell click on the level to listeners.
    pub fn cell_click(&mut self, path: &RowPath, row: &RowId, field: &str) -> bool {
        let Some(level) = self.level(path, "cell_click") else {
            return false;
        };
        let Some(record) = level.row(row) else {
            debug!("cell_click: row {} not in {}", row, path);
            return false;
        };
        let value = record.get(field).cloned().unwrap_or(Value::Null);
        let grid = level.grid_ref();
        self.events.emit(GridEvent::CellClick {
            grid,
            row: row.clone(),
            field: field.to_string(),
            value,
        });
        true
    }

    fn change_selection(
        &mut self,
        path: &RowPath,
        row: &RowId,
        operation: &str,
        apply: impl FnOnce(&mut Selection, &[RowId]) -> Option<SelectionChange>,
    ) -> bool {
        let Some(level) = self.level_mut(path, operation) else {
            return false;
        };
        if !level.contains_row(row) {
            debug!("{}: row {} not in {}", operation, row, path);
            return false;
        }
        let (selection, order) = level.selection_and_rows();
        let Some(change) = apply(selection, order) else {
            return false;
        };
        let grid = level.grid_ref();
        self.emit_selection(grid, change);
        true
    }

    pub(crate) fn emit_selection(&mut self, grid: GridRef, change: SelectionChange) {
        if change.is_empty() {
            return;
        }
        self.events.emit(GridEvent::RowSelectionChanged {
            grid,
            added: change.added,
            removed: change.removed,
        });
    }
}
