//! State of a single grid level.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{trace, warn};
use serde_json::Value;

use crate::column::{Column, ColumnDiff, GridColumn, reconcile_columns};
use crate::config::DisplayDensity;
use crate::events::GridRef;
use crate::expansion::ExpansionStateStore;
use crate::geometry::{Geometry, SizeSpec};
use crate::host::RenderRequest;
use crate::island::IslandId;
use crate::options::GridOptions;
use crate::path::{RowId, RowPath};
use crate::selection::{Selection, SelectionChange, SelectionMode};

/// Unique identifier for a grid instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridId(usize);

impl GridId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__hgrid_{}", self.0)
    }
}

/// Lifecycle of a row's child grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowExpansion {
    Collapsed,
    /// Expanded; child grids are waiting for the next flush to render.
    Expanding,
    Expanded,
    /// Collapsed; rendered child grids are released on the next flush.
    Collapsing,
}

/// What a data replacement changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataUpdate {
    pub changed: bool,
    /// Selected rows dropped because they vanished.
    pub deselected: Vec<RowId>,
}

/// One level of a hierarchical grid: the root grid or a child grid.
#[derive(Debug)]
pub struct GridController {
    id: GridId,
    path: RowPath,
    island: Option<IslandId>,
    options: GridOptions,
    /// Bound rows (`None` = unset).
    data: Option<Vec<Value>>,
    row_ids: Vec<RowId>,
    row_index: HashMap<RowId, usize>,
    /// Keys of the child islands; their fields hold child rows, not row
    /// content.
    island_keys: Vec<String>,
    columns: Vec<GridColumn>,
    expansion: ExpansionStateStore,
    selection: Selection,
    density: DisplayDensity,
    geometry: Geometry,
    /// First row of the virtual window.
    scroll_start: usize,
}

impl GridController {
    pub fn new(
        path: RowPath,
        island: Option<IslandId>,
        options: GridOptions,
        density: DisplayDensity,
    ) -> Self {
        Self {
            id: GridId::next(),
            path,
            island,
            expansion: ExpansionStateStore::new(options.expand_children),
            selection: Selection::new(options.selection_mode),
            options,
            data: None,
            row_ids: Vec::new(),
            row_index: HashMap::new(),
            island_keys: Vec::new(),
            columns: Vec::new(),
            density,
            geometry: Geometry::default(),
            scroll_start: 0,
        }
    }

    /// Set the child island keys before any data is bound.
    pub fn with_island_keys(mut self, keys: Vec<String>) -> Self {
        self.island_keys = keys;
        self
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn path(&self) -> &RowPath {
        &self.path
    }

    pub fn island(&self) -> Option<IslandId> {
        self.island
    }

    pub fn grid_ref(&self) -> GridRef {
        GridRef {
            grid: self.id,
            path: self.path.clone(),
            island: self.island,
        }
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    pub fn data(&self) -> Option<&[Value]> {
        self.data.as_deref()
    }

    /// Number of bound rows, `None` while data is unset.
    pub fn row_count(&self) -> Option<usize> {
        self.data.as_ref().map(Vec::len)
    }

    /// Row IDs in data order.
    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    pub fn contains_row(&self, id: &RowId) -> bool {
        self.row_index.contains_key(id)
    }

    pub fn row(&self, id: &RowId) -> Option<&Value> {
        let index = *self.row_index.get(id)?;
        self.data.as_ref()?.get(index)
    }

    /// Replace the bound rows.
    ///
    /// Expansion entries and selection of rows that no longer exist are
    /// pruned.
    pub fn set_data(&mut self, data: Option<Vec<Value>>) -> DataUpdate {
        if self.data == data {
            return DataUpdate::default();
        }
        self.data = data;
        self.rebuild_row_ids();
        let deselected = self.prune_vanished();
        self.clamp_scroll();
        trace!(
            "{} bound {:?} rows",
            self.path,
            self.data.as_ref().map(Vec::len)
        );
        DataUpdate {
            changed: true,
            deselected,
        }
    }

    /// Change the primary key and recompute row identities.
    pub fn set_primary_key(&mut self, key: Option<String>) -> DataUpdate {
        if self.options.primary_key == key {
            return DataUpdate::default();
        }
        self.options.primary_key = key;
        self.rebuild_row_ids();
        DataUpdate {
            changed: true,
            deselected: self.prune_vanished(),
        }
    }

    pub fn island_keys(&self) -> &[String] {
        &self.island_keys
    }

    /// Change the child island keys.
    ///
    /// Rows identified by content get new IDs; their expansion and selection
    /// follow them.
    pub fn set_island_keys(&mut self, keys: Vec<String>) -> DataUpdate {
        if self.island_keys == keys {
            return DataUpdate::default();
        }
        self.island_keys = keys;
        if self.options.primary_key.is_some() || self.data.is_none() {
            return DataUpdate::default();
        }

        let previous = std::mem::take(&mut self.row_ids);
        self.rebuild_row_ids();
        let renamed: HashMap<RowId, RowId> = previous
            .into_iter()
            .zip(self.row_ids.iter().cloned())
            .filter(|(old, new)| old != new)
            .collect();
        if renamed.is_empty() {
            return DataUpdate::default();
        }
        trace!("{}: {} row(s) renamed", self.path, renamed.len());
        self.expansion.rename(&renamed);
        self.selection.rename(&renamed);
        DataUpdate {
            changed: true,
            deselected: Vec::new(),
        }
    }

    fn rebuild_row_ids(&mut self) {
        self.row_ids = match &self.data {
            Some(rows) => compute_row_ids(
                rows,
                self.options.primary_key.as_deref(),
                &self.island_keys,
            ),
            None => Vec::new(),
        };
        self.row_index = self
            .row_ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index))
            .collect();
    }

    fn prune_vanished(&mut self) -> Vec<RowId> {
        let index = &self.row_index;
        self.expansion.retain(|id| index.contains_key(id));
        self.selection.prune(|id| index.contains_key(id))
    }

    /// Child data of a row for an island key.
    ///
    /// Arrays become the child's rows; a missing or null field leaves the
    /// child unset.
    pub fn child_data(&self, row: &RowId, key: &str) -> Option<Vec<Value>> {
        match self.row(row)?.get(key) {
            Some(Value::Array(rows)) => Some(rows.clone()),
            None | Some(Value::Null) => None,
            Some(other) => {
                warn!(
                    "{}: field '{}' of row {} is not an array ({}), treating as unset",
                    self.path,
                    key,
                    row,
                    type_name(other)
                );
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    pub fn columns(&self) -> &[GridColumn] {
        &self.columns
    }

    pub fn set_declared_columns(&mut self, columns: Vec<Column>) {
        self.options.columns = columns;
    }

    /// Bring columns in line with the declaration, or with the data shape
    /// (minus the child island fields) when nothing is declared.
    pub fn refresh_columns(&mut self) -> ColumnDiff {
        if !self.options.columns.is_empty() {
            return reconcile_columns(&mut self.columns, &self.options.columns, false);
        }
        let generated = match (&self.data, self.options.auto_generate) {
            (Some(rows), true) => {
                let exclude: Vec<&str> = self.island_keys.iter().map(String::as_str).collect();
                Column::auto_generate(rows, &exclude)
            }
            _ => Vec::new(),
        };
        reconcile_columns(&mut self.columns, &generated, true)
    }

    // -------------------------------------------------------------------------
    // Expansion
    // -------------------------------------------------------------------------

    pub fn expansion(&self) -> &ExpansionStateStore {
        &self.expansion
    }

    pub(crate) fn expansion_mut(&mut self) -> &mut ExpansionStateStore {
        &mut self.expansion
    }

    pub fn is_expanded(&self, row: &RowId) -> bool {
        self.contains_row(row) && self.expansion.is_expanded(row)
    }

    /// Expanded rows in data order.
    pub fn expanded_rows(&self) -> Vec<RowId> {
        self.row_ids
            .iter()
            .filter(|id| self.expansion.is_expanded(id))
            .cloned()
            .collect()
    }

    pub fn set_expand_children(&mut self, expand: bool) {
        self.options.expand_children = expand;
        self.expansion.set_default(expand);
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub(crate) fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// The selection together with the row order ranges are taken from.
    pub(crate) fn selection_and_rows(&mut self) -> (&mut Selection, &[RowId]) {
        (&mut self.selection, &self.row_ids)
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// Change the selection mode, dropping rows the new mode cannot hold.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> SelectionChange {
        self.options.selection_mode = mode;
        self.selection.set_mode(mode)
    }

    // -------------------------------------------------------------------------
    // Layout
    // -------------------------------------------------------------------------

    pub fn density(&self) -> DisplayDensity {
        self.density
    }

    pub fn set_density(&mut self, density: DisplayDensity) {
        self.density = density;
    }

    pub fn set_height(&mut self, height: SizeSpec) {
        self.options.height = height;
    }

    pub fn set_width(&mut self, width: SizeSpec) {
        self.options.width = width;
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Store a new geometry. Returns true if it differs from the previous one.
    pub(crate) fn set_geometry(&mut self, geometry: Geometry) -> bool {
        let changed = self.geometry != geometry;
        self.geometry = geometry;
        self.clamp_scroll();
        changed
    }

    pub fn scroll_start(&self) -> usize {
        self.scroll_start
    }

    /// Move the virtual window. Returns the clamped start row.
    pub fn scroll_to(&mut self, start: usize) -> usize {
        self.scroll_start = start;
        self.clamp_scroll();
        self.scroll_start
    }

    fn clamp_scroll(&mut self) {
        let max_start = self.row_ids.len().saturating_sub(self.geometry.chunk_size);
        self.scroll_start = self.scroll_start.min(max_start);
    }

    /// Rows inside the virtual window.
    pub fn visible_rows(&self) -> &[RowId] {
        let start = self.scroll_start.min(self.row_ids.len());
        let end = (start + self.geometry.chunk_size).min(self.row_ids.len());
        &self.row_ids[start..end]
    }

    pub fn render_request(&self) -> RenderRequest<'_> {
        RenderRequest {
            grid: self.id,
            path: &self.path,
            island: self.island,
            geometry: self.geometry,
            columns: &self.columns,
            row_count: self.row_ids.len(),
            density: self.density,
        }
    }
}

/// Row identities for a data set.
///
/// With a primary key the key value is used; otherwise a hash of the row's
/// fields, leaving out `island_keys` so replacing a row's child rows keeps its
/// identity. Duplicates get a `~n` suffix so IDs stay unique within the
/// level.
pub fn compute_row_ids(
    rows: &[Value],
    primary_key: Option<&str>,
    island_keys: &[String],
) -> Vec<RowId> {
    let mut seen: HashSet<RowId> = HashSet::with_capacity(rows.len());
    let mut duplicates: HashMap<RowId, usize> = HashMap::new();
    let mut ids = Vec::with_capacity(rows.len());

    for row in rows {
        let base = match primary_key.and_then(|key| row.get(key)) {
            Some(value) if !value.is_null() => RowId::from_value(value),
            _ => content_id(row, island_keys),
        };
        let mut id = base.clone();
        while seen.contains(&id) {
            let n = duplicates.entry(base.clone()).or_insert(0);
            *n += 1;
            id = RowId::new(format!("{}~{}", base, n));
        }
        if id != base && primary_key.is_some() {
            warn!("Duplicate primary key '{}', using '{}'", base, id);
        }
        seen.insert(id.clone());
        ids.push(id);
    }
    ids
}

fn content_id(row: &Value, island_keys: &[String]) -> RowId {
    let mut hasher = DefaultHasher::new();
    match row {
        Value::Object(fields) => {
            for (key, value) in fields {
                if !island_keys.contains(key) {
                    key.hash(&mut hasher);
                    value.to_string().hash(&mut hasher);
                }
            }
        }
        other => other.to_string().hash(&mut hasher),
    }
    RowId::new(format!("#{:016x}", hasher.finish()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn controller(primary_key: Option<&str>) -> GridController {
        let mut options = GridOptions::default();
        options.primary_key = primary_key.map(String::from);
        GridController::new(RowPath::root(), None, options, DisplayDensity::default())
    }

    #[test]
    fn test_primary_key_ids() {
        let ids = compute_row_ids(&[json!({"ID": 1}), json!({"ID": "x"})], Some("ID"), &[]);
        assert_eq!(ids, vec![RowId::from(1), RowId::from("x")]);
    }

    #[test]
    fn test_content_ids_are_stable_and_unique() {
        let rows = vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 1})];
        let first = compute_row_ids(&rows, None, &[]);
        let second = compute_row_ids(&rows, None, &[]);
        assert_eq!(first, second);
        assert!(first[0].as_str().starts_with('#'));
        assert_eq!(first[2].as_str(), format!("{}~1", first[0]));
        assert_ne!(first[0], first[1]);
    }

    #[test]
    fn test_set_data_prunes_state() {
        let mut grid = controller(Some("ID"));
        grid.set_data(Some(vec![json!({"ID": 1}), json!({"ID": 2})]));
        grid.expansion_mut().set_expanded(RowId::from(2), true);
        grid.set_selection_mode(SelectionMode::Multiple);
        grid.selection_mut().toggle(&RowId::from(2));

        let update = grid.set_data(Some(vec![json!({"ID": 1})]));
        assert!(update.changed);
        assert_eq!(update.deselected, vec![RowId::from(2)]);
        assert!(grid.expansion().is_empty());
        assert!(!grid.contains_row(&RowId::from(2)));
    }

    #[test]
    fn test_set_same_data_is_noop() {
        let mut grid = controller(None);
        let rows = vec![json!({"a": 1})];
        assert!(grid.set_data(Some(rows.clone())).changed);
        assert!(!grid.set_data(Some(rows)).changed);
    }

    #[test]
    fn test_child_data_shapes() {
        let mut grid = controller(Some("ID"));
        grid.set_data(Some(vec![
            json!({"ID": 1, "childData": [{"ID": 10}]}),
            json!({"ID": 2, "childData": null}),
            json!({"ID": 3, "childData": 5}),
        ]));
        assert_eq!(grid.child_data(&RowId::from(1), "childData").map(|d| d.len()), Some(1));
        assert_eq!(grid.child_data(&RowId::from(2), "childData"), None);
        assert_eq!(grid.child_data(&RowId::from(3), "childData"), None);
        assert_eq!(grid.child_data(&RowId::from(9), "childData"), None);
    }

    #[test]
    fn test_visible_window() {
        let mut grid = controller(Some("ID"));
        grid.set_data(Some((0..20).map(|i| json!({"ID": i})).collect()));
        grid.set_geometry(Geometry {
            chunk_size: 5,
            ..Geometry::default()
        });
        assert_eq!(grid.scroll_to(3), 3);
        assert_eq!(grid.visible_rows().first(), Some(&RowId::from(3)));
        assert_eq!(grid.visible_rows().len(), 5);
        assert_eq!(grid.scroll_to(100), 15);
    }

    #[test]
    fn test_single_mode_trims_selection() {
        let mut grid = controller(Some("ID"));
        grid.set_data(Some((0..3).map(|i| json!({"ID": i})).collect()));
        grid.set_selection_mode(SelectionMode::Multiple);
        grid.selection_mut().toggle(&RowId::from(0));
        grid.selection_mut().toggle(&RowId::from(1));
        let change = grid.set_selection_mode(SelectionMode::Single);
        assert_eq!(change.removed, vec![RowId::from(0)]);
        assert_eq!(grid.selection().selected(), vec![RowId::from(1)]);
        let change = grid.set_selection_mode(SelectionMode::None);
        assert_eq!(change.removed, vec![RowId::from(1)]);
    }

    #[test]
    fn test_content_ids_ignore_island_fields() {
        let keys = vec!["childData".to_string()];
        let before = vec![json!({"a": 1, "childData": [{"K": 1}]})];
        let after = vec![json!({"a": 1, "childData": [{"K": 9}]})];
        assert_eq!(
            compute_row_ids(&before, None, &keys),
            compute_row_ids(&after, None, &keys)
        );
        assert_ne!(
            compute_row_ids(&before, None, &[]),
            compute_row_ids(&after, None, &[])
        );
    }

    #[test]
    fn test_island_keys_rename_rows() {
        let mut grid = controller(None);
        grid.set_data(Some(vec![json!({"a": 1, "kids": [1]}), json!({"a": 2})]));
        let old = grid.row_ids()[0].clone();
        grid.expansion_mut().set_expanded(old.clone(), true);

        let update = grid.set_island_keys(vec!["kids".to_string()]);
        assert!(update.changed);
        let new = grid.row_ids()[0].clone();
        assert_ne!(old, new);
        assert!(grid.is_expanded(&new));
        assert!(!grid.set_island_keys(vec!["kids".to_string()]).changed);
    }
}
