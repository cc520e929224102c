//! The rendering host seam.
//!
//! The engine never draws anything itself. Whenever a child grid is ready to
//! appear, it asks the [`RenderHost`] to render it and keeps the returned
//! handle until the grid goes away.

use std::collections::BTreeMap;

use log::debug;

use crate::column::GridColumn;
use crate::config::DisplayDensity;
use crate::controller::GridId;
use crate::geometry::Geometry;
use crate::island::IslandId;
use crate::path::RowPath;

/// Opaque handle of a rendered child grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHandle(pub u64);

/// Size of the container hosting the root grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Everything a host needs to draw one child grid.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub grid: GridId,
    pub path: &'a RowPath,
    pub island: Option<IslandId>,
    pub geometry: Geometry,
    pub columns: &'a [GridColumn],
    /// Rows bound to the grid (0 while data is unset).
    pub row_count: usize,
    pub density: DisplayDensity,
}

/// Rendering backend.
pub trait RenderHost {
    /// Draw a child grid and return its handle.
    fn render(&mut self, request: &RenderRequest<'_>) -> HostHandle;

    /// Tear down a rendered child grid.
    fn destroy(&mut self, handle: HostHandle);

    /// Geometry or columns of a rendered grid changed.
    fn update(&mut self, _handle: HostHandle, _request: &RenderRequest<'_>) {}

    /// Measured row height for a density, overriding the built-in one.
    fn row_height(&self, _density: DisplayDensity) -> Option<u32> {
        None
    }

    /// Size of the root container, used to resolve root percentages.
    fn container_extent(&self) -> Option<Extent> {
        None
    }
}

/// A rendered grid as seen by [`HeadlessHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct HostedGrid {
    pub path: RowPath,
    pub geometry: Geometry,
    /// Column fields in display order
    pub columns: Vec<String>,
    pub headers: Vec<String>,
    pub updates: usize,
}

/// Host that renders nothing and records what it was asked to do.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    next_handle: u64,
    live: BTreeMap<HostHandle, HostedGrid>,
    rendered: usize,
    destroyed: usize,
    extent: Option<Extent>,
    row_height: Option<u32>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Change the container size. Call `notify_resize` on the grid afterwards.
    pub fn set_extent(&mut self, extent: Option<Extent>) {
        self.extent = extent;
    }

    /// Report a measured row height for every density.
    pub fn set_row_height(&mut self, height: Option<u32>) {
        self.row_height = height;
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn rendered_count(&self) -> usize {
        self.rendered
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    pub fn get(&self, handle: HostHandle) -> Option<&HostedGrid> {
        self.live.get(&handle)
    }

    /// The live grid rendered for `path`.
    pub fn find(&self, path: &RowPath) -> Option<(HostHandle, &HostedGrid)> {
        self.live
            .iter()
            .find(|(_, grid)| &grid.path == path)
            .map(|(handle, grid)| (*handle, grid))
    }
}

impl RenderHost for HeadlessHost {
    fn render(&mut self, request: &RenderRequest<'_>) -> HostHandle {
        let handle = HostHandle(self.next_handle);
        self.next_handle += 1;
        self.rendered += 1;
        debug!("Rendering {} at {} as {:?}", request.grid, request.path, handle);
        self.live.insert(
            handle,
            HostedGrid {
                path: request.path.clone(),
                geometry: request.geometry,
                columns: request.columns.iter().map(|c| c.field().to_string()).collect(),
                headers: request.columns.iter().map(|c| c.column.header.clone()).collect(),
                updates: 0,
            },
        );
        handle
    }

    fn destroy(&mut self, handle: HostHandle) {
        if self.live.remove(&handle).is_some() {
            self.destroyed += 1;
        } else {
            debug!("Destroy of unknown handle {:?}", handle);
        }
    }

    fn update(&mut self, handle: HostHandle, request: &RenderRequest<'_>) {
        if let Some(grid) = self.live.get_mut(&handle) {
            grid.geometry = request.geometry;
            grid.columns = request.columns.iter().map(|c| c.field().to_string()).collect();
            grid.headers = request.columns.iter().map(|c| c.column.header.clone()).collect();
            grid.updates += 1;
        }
    }

    fn row_height(&self, _density: DisplayDensity) -> Option<u32> {
        self.row_height
    }

    fn container_extent(&self) -> Option<Extent> {
        self.extent
    }
}
