//! The hierarchical grid: root level, child grid cache and row islands.
//!
//! Every level is addressed by its [`RowPath`]; the root grid's path is
//! [`RowPath::root`]. Mutations update state and the child cache right away
//! and queue their follow-up work (rendering new child grids, releasing
//! collapsed ones, recomputing sizes) for the next [`flush`].
//!
//! [`flush`]: HierarchicalGrid::flush

mod data;
mod expand;
mod flush;
mod interaction;
mod islands;
mod layout;

use log::{debug, info};

use crate::cache::{CacheEntry, ChildGridCache, EntryStatus};
use crate::config::GridConfig;
use crate::controller::GridController;
use crate::events::{EventBus, GridEvent, Listener, ListenerId, ListenerScope};
use crate::geometry::GeometryCalculator;
use crate::host::{HeadlessHost, RenderHost};
use crate::island::IslandRegistry;
use crate::options::GridOptions;
use crate::path::RowPath;
use crate::tick::{Tick, TickQueue};

/// A hierarchical data grid.
///
/// # Example
///
/// ```
/// use hgrid::{GridConfig, GridOptions, HierarchicalGrid, RowId, RowIslandDef, RowPath};
/// use serde_json::json;
///
/// let options = GridOptions::default().with_primary_key("ID");
/// let mut grid = HierarchicalGrid::new(GridConfig::default(), options);
/// grid.add_island(None, RowIslandDef::new("childData")).unwrap();
/// grid.set_data(&RowPath::root(), vec![json!({"ID": 1, "childData": [{"ID": 10}]})]);
///
/// grid.expand(&RowPath::root(), &RowId::from(1));
/// grid.flush();
/// assert_eq!(grid.child_grids(&RowPath::root(), false).len(), 1);
/// ```
pub struct HierarchicalGrid<H: RenderHost = HeadlessHost> {
    config: GridConfig,
    calculator: GeometryCalculator,
    root: GridController,
    islands: IslandRegistry,
    cache: ChildGridCache,
    events: EventBus,
    queue: TickQueue,
    host: H,
    destroyed: bool,
}

impl HierarchicalGrid<HeadlessHost> {
    /// Create a grid rendered by a [`HeadlessHost`].
    pub fn new(config: GridConfig, options: GridOptions) -> Self {
        Self::with_host(config, options, HeadlessHost::new())
    }
}

impl<H: RenderHost> HierarchicalGrid<H> {
    pub fn with_host(config: GridConfig, options: GridOptions, host: H) -> Self {
        let root = GridController::new(RowPath::root(), None, options, config.density);
        info!("Created hierarchical grid {}", root.id());
        let mut grid = Self {
            calculator: GeometryCalculator::new(&config),
            config,
            root,
            islands: IslandRegistry::new(),
            cache: ChildGridCache::new(),
            events: EventBus::new(),
            queue: TickQueue::new(),
            host,
            destroyed: false,
        };
        grid.relayout_all();
        grid
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn islands(&self) -> &IslandRegistry {
        &self.islands
    }

    pub fn cache(&self) -> &ChildGridCache {
        &self.cache
    }

    pub fn root(&self) -> &GridController {
        &self.root
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The level at `path`: the root grid or a cached child grid.
    pub fn controller(&self, path: &RowPath) -> Option<&GridController> {
        if path.is_root() {
            Some(&self.root)
        } else {
            self.cache.get(path).map(|entry| &entry.controller)
        }
    }

    pub(crate) fn controller_mut(&mut self, path: &RowPath) -> Option<&mut GridController> {
        if path.is_root() {
            Some(&mut self.root)
        } else {
            self.cache.get_mut(path).map(|entry| &mut entry.controller)
        }
    }

    /// Like [`controller`](Self::controller), logging misses.
    fn level(&self, path: &RowPath, operation: &str) -> Option<&GridController> {
        let level = self.controller(path);
        if level.is_none() {
            debug!("{}: no grid at {}", operation, path);
        }
        level
    }

    fn level_mut(&mut self, path: &RowPath, operation: &str) -> Option<&mut GridController> {
        if self.destroyed {
            debug!("{}: grid destroyed", operation);
            return None;
        }
        let found = self.controller(path).is_some();
        if !found {
            debug!("{}: no grid at {}", operation, path);
            return None;
        }
        self.controller_mut(path)
    }

    /// The cached child grid at `path`.
    pub fn child_grid(&self, path: &RowPath) -> Option<&CacheEntry> {
        self.cache.get(path)
    }

    /// Child grids of the level at `path`, direct or all descendants, in
    /// creation order.
    pub fn child_grids(&self, path: &RowPath, recursive: bool) -> Vec<&CacheEntry> {
        self.cache.get_all(path, recursive)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    pub fn subscribe(&mut self, scope: ListenerScope, listener: Listener) -> ListenerId {
        self.events.subscribe(scope, listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Take every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        self.events.drain()
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Release every child grid immediately and stop processing work.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        info!("Destroying hierarchical grid {}", self.root.id());

        for (grid, handle) in self.queue.take_releases() {
            self.host.destroy(handle);
            self.events.emit(GridEvent::GridDestroyed(grid));
        }
        self.queue.clear();

        for entry in self.cache.destroy_all() {
            if let Some(island) = entry.controller.island() {
                self.islands.deregister(island, entry.path());
            }
            if let EntryStatus::Live(handle) = entry.status {
                self.host.destroy(handle);
                self.events
                    .emit(GridEvent::GridDestroyed(entry.controller.grid_ref()));
            }
        }
        self.destroyed = true;
    }

    /// Remove the child grid at `path` and its descendants from the cache.
    ///
    /// Rendered grids are released on the next flush. The grid comes back on
    /// the next reconciliation of its level if its row is still expanded.
    /// Returns true if anything was removed.
    pub fn destroy_child(&mut self, path: &RowPath) -> bool {
        let removed = self.cache.destroy(path);
        let any = !removed.is_empty();
        for entry in removed {
            if let Some(island) = entry.controller.island() {
                self.islands.deregister(island, entry.path());
            }
            match entry.status {
                EntryStatus::Live(handle) => self.queue.push(Tick::Release {
                    grid: entry.controller.grid_ref(),
                    handle,
                }),
                EntryStatus::Pending => {
                    debug!("Dropping pending child grid {} before render", entry.path())
                }
            }
        }
        any
    }
}

impl<H: RenderHost> Drop for HierarchicalGrid<H> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<H: RenderHost> std::fmt::Debug for HierarchicalGrid<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchicalGrid")
            .field("root", &self.root.id())
            .field("islands", &self.islands.len())
            .field("children", &self.cache.len())
            .field("queued", &self.queue.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
