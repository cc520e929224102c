//! Row expansion and child grid reconciliation.

use std::collections::{BTreeMap, HashSet};

use log::{debug, trace};

use super::HierarchicalGrid;
use crate::cache::{CacheOutcome, EntryStatus};
use crate::controller::{DataUpdate, GridController, RowExpansion};
use crate::events::GridEvent;
use crate::host::RenderHost;
use crate::island::IslandId;
use crate::path::{RowId, RowPath};
use crate::tick::Tick;

impl<H: RenderHost> HierarchicalGrid<H> {
    /// Expand a row of the level at `path`.
    ///
    /// Returns false if the level or row is unknown or the row is already
    /// expanded.
    pub fn expand(&mut self, path: &RowPath, row: &RowId) -> bool {
        self.set_row_expanded(path, row, true)
    }

    /// Collapse a row of the level at `path`.
    pub fn collapse(&mut self, path: &RowPath, row: &RowId) -> bool {
        self.set_row_expanded(path, row, false)
    }

    /// Flip a row's expansion. Returns false if the level or row is unknown.
    pub fn toggle(&mut self, path: &RowPath, row: &RowId) -> bool {
        let Some(level) = self.level(path, "toggle") else {
            return false;
        };
        let expanded = level.is_expanded(row);
        self.set_row_expanded(path, row, !expanded)
    }

    fn set_row_expanded(&mut self, path: &RowPath, row: &RowId, expanded: bool) -> bool {
        let Some(level) = self.level_mut(path, "set_row_expanded") else {
            return false;
        };
        if !level.contains_row(row) {
            debug!("{}: row {} not in data", path, row);
            return false;
        }
        if !level.expansion_mut().set_expanded(row.clone(), expanded) {
            trace!("{}: row {} already {}", path, row, state_name(expanded));
            return false;
        }
        let grid = level.grid_ref();
        debug!("{}: row {} {}", path, row, state_name(expanded));

        self.events.emit(GridEvent::RowToggled {
            grid,
            row: row.clone(),
            expanded,
        });
        self.reconcile_row(path, row);
        true
    }

    /// Expand every row of the level.
    pub fn expand_all(&mut self, path: &RowPath) -> bool {
        let Some(level) = self.level_mut(path, "expand_all") else {
            return false;
        };
        let ids = level.row_ids().to_vec();
        level.expansion_mut().expand_all(ids);
        self.reconcile(path);
        true
    }

    /// Collapse every row of the level.
    pub fn collapse_all(&mut self, path: &RowPath) -> bool {
        let Some(level) = self.level_mut(path, "collapse_all") else {
            return false;
        };
        let ids = level.row_ids().to_vec();
        level.expansion_mut().collapse_all(ids);
        self.reconcile(path);
        true
    }

    /// Drop every explicit expansion of the level; rows fall back to the
    /// `expand_children` default.
    pub fn clear_expansion(&mut self, path: &RowPath) -> bool {
        let Some(level) = self.level_mut(path, "clear_expansion") else {
            return false;
        };
        level.expansion_mut().clear();
        self.reconcile(path);
        true
    }

    /// Replace the explicit expansion states of the level.
    pub fn set_expansion_states(&mut self, path: &RowPath, states: BTreeMap<RowId, bool>) -> bool {
        let Some(level) = self.level_mut(path, "set_expansion_states") else {
            return false;
        };
        level.expansion_mut().replace(states);
        self.reconcile(path);
        true
    }

    /// Explicit expansion states of the level.
    pub fn expansion_states(&self, path: &RowPath) -> Option<BTreeMap<RowId, bool>> {
        Some(self.controller(path)?.expansion().states())
    }

    /// Effective expansion of a row. False for unknown levels and rows.
    pub fn is_expanded(&self, path: &RowPath, row: &RowId) -> bool {
        self.controller(path).is_some_and(|level| level.is_expanded(row))
    }

    /// Change the default expansion of the level's rows.
    pub fn set_expand_children(&mut self, path: &RowPath, expand: bool) -> bool {
        let Some(level) = self.level_mut(path, "set_expand_children") else {
            return false;
        };
        level.set_expand_children(expand);
        self.reconcile(path);
        true
    }

    /// Lifecycle state of a row's child grids.
    ///
    /// A row on a level without child islands is always `Collapsed`, whatever
    /// its expansion entry says.
    pub fn row_state(&self, path: &RowPath, row: &RowId) -> Option<RowExpansion> {
        let level = self.controller(path)?;
        if !level.contains_row(row) {
            return None;
        }
        let keys = self.islands.child_keys(level.island());
        // an expanded row on a level without child islands shows nothing
        if keys.is_empty() || !level.expansion().is_expanded(row) {
            return Some(if self.queue.releasing(path, row) {
                RowExpansion::Collapsing
            } else {
                RowExpansion::Collapsed
            });
        }

        let all_live = keys.into_iter().all(|key| {
            self.cache
                .get(&path.child(row.clone(), key))
                .is_some_and(|entry| entry.is_live())
        });
        Some(if all_live {
            RowExpansion::Expanded
        } else {
            RowExpansion::Expanding
        })
    }

    /// Whether rows of the level can own child grids (the expander shows).
    pub fn row_has_children(&self, path: &RowPath) -> bool {
        self.controller(path)
            .is_some_and(|level| !self.islands.children_of(level.island()).is_empty())
    }

    /// Whether any row of the level is expanded (header expander state).
    pub fn has_expanded_rows(&self, path: &RowPath) -> bool {
        self.controller(path).is_some_and(|level| {
            level
                .row_ids()
                .iter()
                .any(|id| level.expansion().is_expanded(id))
        })
    }

    // -------------------------------------------------------------------------
    // Reconciliation
    // -------------------------------------------------------------------------

    /// Bring the level's cached child grids in line with its expanded rows:
    /// drop children of collapsed or vanished rows and islands, create or
    /// reattach children of expanded rows.
    pub(crate) fn reconcile(&mut self, path: &RowPath) {
        let Some(level) = self.controller(path) else {
            return;
        };
        if self.destroyed {
            return;
        }
        let islands = self.child_islands(level);
        let mut desired = Vec::new();
        for row in level.expanded_rows() {
            for (island, key) in &islands {
                desired.push((path.child(row.clone(), key.as_str()), *island, row.clone()));
            }
        }

        let wanted: HashSet<&RowPath> = desired.iter().map(|(p, _, _)| p).collect();
        let stale: Vec<RowPath> = self
            .cache
            .child_paths(path)
            .into_iter()
            .filter(|p| !wanted.contains(p))
            .collect();

        let mut removed = false;
        for child in &stale {
            removed |= self.destroy_child(child);
        }
        for (child, island, row) in desired {
            self.ensure_child(path, child, island, &row);
        }
        if removed {
            self.queue.push(Tick::Relayout(path.clone()));
        }
    }

    /// Reconcile the children of a single row.
    pub(crate) fn reconcile_row(&mut self, path: &RowPath, row: &RowId) {
        let Some(level) = self.controller(path) else {
            return;
        };
        let expanded = level.is_expanded(row);
        let islands = self.child_islands(level);

        let mut removed = false;
        for (island, key) in islands {
            let child = path.child(row.clone(), key);
            if expanded {
                self.ensure_child(path, child, island, row);
            } else {
                removed |= self.destroy_child(&child);
            }
        }
        if removed {
            self.queue.push(Tick::Relayout(path.clone()));
        }
    }

    fn child_islands(&self, level: &GridController) -> Vec<(IslandId, String)> {
        self.islands
            .children_of(level.island())
            .iter()
            .filter_map(|id| self.islands.get(*id))
            .map(|island| (island.id(), island.key().to_string()))
            .collect()
    }

    /// Get or create the child grid of `row` for `island` and bind its data.
    fn ensure_child(&mut self, parent: &RowPath, child: RowPath, island_id: IslandId, row: &RowId) {
        if self.destroyed {
            return;
        }
        let Some(island) = self.islands.get(island_id) else {
            return;
        };
        let options = island.options.clone();
        let key = island.key().to_string();
        let island_keys = self.islands.child_keys(Some(island_id));
        let Some(data) = self.controller(parent).map(|level| level.child_data(row, &key)) else {
            return;
        };
        let density = self.root.density();

        let make = || {
            GridController::new(child.clone(), Some(island_id), options, density)
                .with_island_keys(island_keys)
        };
        let (entry, outcome) = self.cache.get_or_create(child.clone(), data, make);
        match outcome {
            CacheOutcome::Created => {
                entry.controller.refresh_columns();
                self.islands.register(island_id, child.clone());
                self.queue.push(Tick::Finalize(child.clone()));
                self.reconcile(&child);
            }
            CacheOutcome::Reused(update) => {
                if entry.status == EntryStatus::Pending {
                    self.queue.push(Tick::Finalize(child.clone()));
                }
                self.data_changed(&child, update);
            }
        }
    }

    /// Follow-up of a data replacement on a level: column refresh, events,
    /// child reconciliation and relayout.
    pub(crate) fn data_changed(&mut self, path: &RowPath, update: DataUpdate) {
        if !update.changed {
            return;
        }
        let Some(level) = self.controller(path) else {
            return;
        };
        if !update.deselected.is_empty() {
            self.events.emit(GridEvent::RowSelectionChanged {
                grid: level.grid_ref(),
                added: Vec::new(),
                removed: update.deselected,
            });
        }
        self.refresh_level_columns(path);
        self.reconcile(path);
        self.queue.push(Tick::Relayout(path.clone()));
    }
}

fn state_name(expanded: bool) -> &'static str {
    if expanded { "expanded" } else { "collapsed" }
}
