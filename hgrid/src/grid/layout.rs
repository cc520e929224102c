//! Size resolution across levels and the virtual window.

use log::trace;

use super::HierarchicalGrid;
use crate::cache::EntryStatus;
use crate::config::DisplayDensity;
use crate::geometry::{Geometry, ParentSize};
use crate::host::RenderHost;
use crate::path::{RowId, RowPath};

impl<H: RenderHost> HierarchicalGrid<H> {
    /// Resolved geometry of the level at `path`.
    pub fn geometry(&self, path: &RowPath) -> Option<Geometry> {
        self.controller(path).map(|level| level.geometry())
    }

    /// Re-resolve every size after the host container changed.
    pub fn notify_resize(&mut self) {
        self.relayout_all();
    }

    /// Move the level's virtual window. Returns the clamped start row.
    ///
    /// Expansion states and cached child grids are unaffected.
    pub fn scroll_to(&mut self, path: &RowPath, start: usize) -> Option<usize> {
        let level = self.level_mut(path, "scroll_to")?;
        Some(level.scroll_to(start))
    }

    /// Rows inside the level's virtual window.
    pub fn visible_rows(&self, path: &RowPath) -> Vec<RowId> {
        self.controller(path)
            .map(|level| level.visible_rows().to_vec())
            .unwrap_or_default()
    }

    pub(crate) fn row_height_for(&self, density: DisplayDensity) -> u32 {
        self.host
            .row_height(density)
            .unwrap_or_else(|| self.config.row_height_for(density))
    }

    /// Size the level at `path` is resolved against.
    fn parent_size_of(&self, path: &RowPath) -> ParentSize {
        match path.parent() {
            None => self
                .host
                .container_extent()
                .map(|extent| ParentSize {
                    width: Some(extent.width),
                    height: Some(extent.height),
                })
                .unwrap_or_default(),
            Some(parent) => self
                .controller(&parent)
                .map(|level| {
                    let geometry = level.geometry();
                    ParentSize {
                        width: geometry.calc_width,
                        height: geometry.calc_height,
                    }
                })
                .unwrap_or_default(),
        }
    }

    pub(crate) fn relayout_all(&mut self) {
        let parent = self.parent_size_of(&RowPath::root());
        self.layout_level(&RowPath::root(), parent);
    }

    /// Lay out the level at `path` and its descendants, then refresh the
    /// extents of its ancestors. Returns false if the level is gone.
    pub(crate) fn relayout_from(&mut self, path: &RowPath) -> bool {
        if !self.layout_subtree(path) {
            return false;
        }
        self.refresh_ancestors(path);
        true
    }

    /// Lay out the level at `path` and its descendants against the parent's
    /// current size. Ancestors are left alone.
    pub(crate) fn layout_subtree(&mut self, path: &RowPath) -> bool {
        let parent = self.parent_size_of(path);
        self.layout_level(path, parent).is_some()
    }

    fn refresh_ancestors(&mut self, path: &RowPath) {
        let mut current = path.parent();
        while let Some(ancestor) = current {
            self.recompute_extent(&ancestor);
            current = ancestor.parent();
        }
    }

    /// Resolve the level's geometry against `parent`, recursing into its
    /// cached children so their outer heights count toward its extent.
    fn layout_level(&mut self, path: &RowPath, parent: ParentSize) -> Option<Geometry> {
        let level = self.controller(path)?;
        let options = level.options();
        let row_height = self.row_height_for(level.density());
        let mut geometry = self.calculator.compute(
            options.height,
            options.width,
            level.row_count(),
            row_height,
            parent,
            !path.is_root(),
        );

        let own = ParentSize {
            width: geometry.calc_width,
            height: geometry.calc_height,
        };
        for child in self.cache.child_paths(path) {
            if let Some(child_geometry) = self.layout_level(&child, own) {
                geometry.total_extent += child_geometry.outer_height();
            }
        }
        self.store_geometry(path, geometry);
        Some(geometry)
    }

    /// Recompute the level's extent from its rows and its children's stored
    /// geometry.
    fn recompute_extent(&mut self, path: &RowPath) {
        let Some(level) = self.controller(path) else {
            return;
        };
        let mut geometry = level.geometry();
        let rows = level.row_count().unwrap_or(0) as u64;
        geometry.total_extent = rows * u64::from(geometry.row_height);
        for child in self.cache.get_all(path, false) {
            geometry.total_extent += child.controller.geometry().outer_height();
        }
        self.store_geometry(path, geometry);
    }

    fn store_geometry(&mut self, path: &RowPath, geometry: Geometry) {
        let Some(level) = self.controller_mut(path) else {
            return;
        };
        if level.set_geometry(geometry) {
            trace!("{} geometry {:?}", path, geometry);
            self.update_host(path);
        }
    }

    /// Push the current state of a rendered child grid to the host.
    pub(crate) fn update_host(&mut self, path: &RowPath) {
        let Some(entry) = self.cache.get(path) else {
            return;
        };
        if let EntryStatus::Live(handle) = entry.status {
            self.host.update(handle, &entry.controller.render_request());
        }
    }
}
