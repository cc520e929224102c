//! Runtime composition of row islands and option propagation.

use log::{debug, warn};

use super::HierarchicalGrid;
use crate::column::Column;
use crate::error::GridError;
use crate::geometry::SizeSpec;
use crate::host::RenderHost;
use crate::island::{IslandId, RowIsland, RowIslandDef};
use crate::path::RowPath;
use crate::selection::SelectionMode;
use crate::tick::Tick;

impl<H: RenderHost> HierarchicalGrid<H> {
    /// Add a row island under `parent` (`None` = the root grid).
    ///
    /// Every existing instance of the parent level gets child grids for its
    /// expanded rows.
    pub fn add_island(
        &mut self,
        parent: Option<IslandId>,
        def: RowIslandDef,
    ) -> Result<IslandId, GridError> {
        let id = self.islands.insert(parent, def).inspect_err(|err| {
            warn!("Cannot add row island: {}", err);
        })?;
        for level in self.parent_levels(parent) {
            self.sync_island_keys(&level);
            self.refresh_level_columns(&level);
            self.reconcile(&level);
        }
        Ok(id)
    }

    /// Remove a row island and its nested islands.
    ///
    /// Every child grid created from them is destroyed and their listeners
    /// are dropped.
    pub fn remove_island(&mut self, id: IslandId) -> Result<(), GridError> {
        let parent = self.islands.get(id).map(|island| island.parent());
        let removed = self.islands.remove(id).inspect_err(|err| {
            warn!("Cannot remove row island: {}", err);
        })?;
        debug!("Removed {} row island(s) starting at {}", removed.len(), id);

        for island in &removed {
            for path in island.instances() {
                self.destroy_child(path);
            }
        }
        for level in self.parent_levels(parent.flatten()) {
            self.sync_island_keys(&level);
            self.refresh_level_columns(&level);
            self.reconcile(&level);
            self.queue.push(Tick::Relayout(level));
        }

        let ids: Vec<IslandId> = removed.iter().map(RowIsland::id).collect();
        self.events.remove_island_listeners(&ids);
        Ok(())
    }

    /// Paths of the levels whose rows own children of islands under
    /// `parent`.
    fn parent_levels(&self, parent: Option<IslandId>) -> Vec<RowPath> {
        match parent {
            None => vec![RowPath::root()],
            Some(id) => self
                .islands
                .get(id)
                .map(|island| island.instances().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Tell the level which fields hold child rows. Rows identified by
    /// content may change ID; their children move with the next
    /// reconciliation.
    fn sync_island_keys(&mut self, path: &RowPath) {
        let keys = match self.controller(path) {
            Some(level) => self.islands.child_keys(level.island()),
            None => return,
        };
        if let Some(level) = self.controller_mut(path)
            && level.set_island_keys(keys).changed
        {
            debug!("{}: row identities follow the new island keys", path);
        }
    }

    pub fn island(&self, id: IslandId) -> Option<&RowIsland> {
        self.islands.get(id)
    }

    /// Child island of `parent` with the given key.
    pub fn find_island(&self, parent: Option<IslandId>, key: &str) -> Option<IslandId> {
        self.islands.find_child(parent, key)
    }

    /// Island the grid at `path` was created from.
    pub fn resolve_island(&self, path: &RowPath) -> Option<IslandId> {
        self.islands.resolve(path)
    }

    fn instances_of(&self, id: IslandId) -> Result<Vec<RowPath>, GridError> {
        self.islands
            .get(id)
            .map(|island| island.instances().cloned().collect())
            .ok_or(GridError::UnknownIsland(id))
    }

    // -------------------------------------------------------------------------
    // Option propagation
    // -------------------------------------------------------------------------

    /// Declare the island's columns and apply them to every instance.
    pub fn set_island_columns(&mut self, id: IslandId, columns: Vec<Column>) -> Result<(), GridError> {
        let instances = self.instances_of(id)?;
        if let Some(island) = self.islands.get_mut(id) {
            island.options.columns = columns.clone();
        }
        for path in instances {
            if let Some(level) = self.controller_mut(&path) {
                level.set_declared_columns(columns.clone());
            }
            self.refresh_level_columns(&path);
        }
        Ok(())
    }

    /// Change the island's height. Instances are resized on the next flush,
    /// not recreated.
    pub fn set_island_height(&mut self, id: IslandId, height: SizeSpec) -> Result<(), GridError> {
        let instances = self.instances_of(id)?;
        if let Some(island) = self.islands.get_mut(id) {
            island.options.height = height;
        }
        for path in instances {
            if let Some(level) = self.controller_mut(&path) {
                level.set_height(height);
                self.queue.push(Tick::Relayout(path));
            }
        }
        Ok(())
    }

    pub fn set_island_width(&mut self, id: IslandId, width: SizeSpec) -> Result<(), GridError> {
        let instances = self.instances_of(id)?;
        if let Some(island) = self.islands.get_mut(id) {
            island.options.width = width;
        }
        for path in instances {
            if let Some(level) = self.controller_mut(&path) {
                level.set_width(width);
                self.queue.push(Tick::Relayout(path));
            }
        }
        Ok(())
    }

    pub fn set_island_selection_mode(
        &mut self,
        id: IslandId,
        mode: SelectionMode,
    ) -> Result<(), GridError> {
        let instances = self.instances_of(id)?;
        if let Some(island) = self.islands.get_mut(id) {
            island.options.selection_mode = mode;
        }
        for path in instances {
            self.set_selection_mode(&path, mode);
        }
        Ok(())
    }

    pub fn set_island_expand_children(&mut self, id: IslandId, expand: bool) -> Result<(), GridError> {
        let instances = self.instances_of(id)?;
        if let Some(island) = self.islands.get_mut(id) {
            island.options.expand_children = expand;
        }
        for path in instances {
            self.set_expand_children(&path, expand);
        }
        Ok(())
    }
}
