//! Headless engine for hierarchical data grids.
//!
//! A hierarchical grid is a grid whose rows can own nested grids. The nested
//! levels are described by row islands ([`RowIslandDef`]); every expanded
//! row gets one child grid per island of its level, cached by the path of
//! row IDs leading to it ([`RowPath`]).
//!
//! Rendering is delegated to a [`RenderHost`]. State changes apply right
//! away, while rendering, releasing and resizing happen when the grid is
//! flushed, once per host tick.

pub mod cache;
pub mod column;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod expansion;
pub mod geometry;
pub mod grid;
pub mod host;
pub mod island;
pub mod options;
pub mod path;
pub mod selection;
pub mod tick;

pub use cache::{CacheEntry, CacheOutcome, ChildGridCache, EntryStatus};
pub use column::{Alignment, Column, ColumnDiff, GridColumn, SortDirection};
pub use config::{DisplayDensity, GridConfig};
pub use controller::{DataUpdate, GridController, GridId, RowExpansion};
pub use error::GridError;
pub use events::{GridEvent, GridRef, Listener, ListenerId, ListenerScope};
pub use expansion::ExpansionStateStore;
pub use geometry::{Geometry, GeometryCalculator, ParentSize, SizeSpec};
pub use grid::HierarchicalGrid;
pub use host::{Extent, HeadlessHost, HostHandle, HostedGrid, RenderHost, RenderRequest};
pub use island::{IslandId, IslandRegistry, RowIsland, RowIslandDef};
pub use options::GridOptions;
pub use path::{PathSegment, RowId, RowPath};
pub use selection::{Selection, SelectionChange, SelectionMode};
pub use tick::{FlushStats, GridCommand};
