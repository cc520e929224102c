//! Row islands: the templates for nested grid levels.
//!
//! Islands form a tree. Root-level islands describe the children of the root
//! grid's rows; nested islands describe the children of those children, and
//! so on. Every child grid created from an island registers its path with
//! it, so option changes on the island can reach every live instance.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::GridError;
use crate::geometry::SizeSpec;
use crate::options::GridOptions;
use crate::path::RowPath;
use crate::selection::SelectionMode;

/// Unique identifier for a row island.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IslandId(usize);

impl IslandId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for IslandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__island_{}", self.0)
    }
}

/// Declarative island definition, possibly with nested islands.
///
/// # Example
///
/// ```
/// use hgrid::{RowIslandDef, SizeSpec};
///
/// let orders = RowIslandDef::new("orders")
///     .with_height(SizeSpec::Px(200))
///     .with_island(RowIslandDef::new("lines"));
/// assert_eq!(orders.children.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIslandDef {
    /// Field of the parent row holding this level's data.
    pub key: String,
    #[serde(default)]
    pub options: GridOptions,
    /// Nested islands.
    #[serde(default, rename = "islands")]
    pub children: Vec<RowIslandDef>,
}

impl RowIslandDef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            options: GridOptions::default(),
            children: Vec::new(),
        }
    }

    /// Parse a definition tree from JSON.
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_options(mut self, options: GridOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.options.columns = columns;
        self
    }

    pub fn with_height(mut self, height: SizeSpec) -> Self {
        self.options.height = height;
        self
    }

    pub fn with_width(mut self, width: SizeSpec) -> Self {
        self.options.width = width;
        self
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.options.selection_mode = mode;
        self
    }

    pub fn with_expand_children(mut self, expand: bool) -> Self {
        self.options.expand_children = expand;
        self
    }

    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.options.primary_key = Some(key.into());
        self
    }

    /// Add a nested island.
    pub fn with_island(mut self, child: RowIslandDef) -> Self {
        self.children.push(child);
        self
    }

    fn validate(&self) -> Result<(), GridError> {
        let mut seen = HashSet::new();
        for child in &self.children {
            if !seen.insert(child.key.as_str()) {
                return Err(GridError::DuplicateIslandKey {
                    key: child.key.clone(),
                });
            }
            child.validate()?;
        }
        Ok(())
    }
}

/// A registered row island.
#[derive(Debug, Clone)]
pub struct RowIsland {
    id: IslandId,
    key: String,
    parent: Option<IslandId>,
    /// Template applied to every child grid created from this island.
    pub options: GridOptions,
    children: Vec<IslandId>,
    instances: BTreeSet<RowPath>,
}

impl RowIsland {
    pub fn id(&self) -> IslandId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Parent island (`None` for islands of the root grid).
    pub fn parent(&self) -> Option<IslandId> {
        self.parent
    }

    pub fn children(&self) -> &[IslandId] {
        &self.children
    }

    /// Paths of the child grids currently created from this island.
    pub fn instances(&self) -> impl Iterator<Item = &RowPath> {
        self.instances.iter()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// Tree of registered row islands.
#[derive(Debug, Default)]
pub struct IslandRegistry {
    islands: HashMap<IslandId, RowIsland>,
    /// Islands of the root grid, in insertion order.
    roots: Vec<IslandId>,
}

impl IslandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition tree under `parent` (`None` = root grid).
    ///
    /// The whole tree is validated before anything is inserted.
    pub fn insert(
        &mut self,
        parent: Option<IslandId>,
        def: RowIslandDef,
    ) -> Result<IslandId, GridError> {
        if let Some(parent_id) = parent
            && !self.islands.contains_key(&parent_id)
        {
            return Err(GridError::UnknownIsland(parent_id));
        }
        if self.find_child(parent, &def.key).is_some() {
            return Err(GridError::DuplicateIslandKey { key: def.key });
        }
        def.validate()?;
        Ok(self.insert_unchecked(parent, def))
    }

    fn insert_unchecked(&mut self, parent: Option<IslandId>, def: RowIslandDef) -> IslandId {
        let id = IslandId::new();
        let RowIslandDef {
            key,
            options,
            children,
        } = def;
        debug!("Registering row island {} ({}) under {:?}", id, key, parent);

        self.islands.insert(
            id,
            RowIsland {
                id,
                key,
                parent,
                options,
                children: Vec::new(),
                instances: BTreeSet::new(),
            },
        );
        match parent.and_then(|p| self.islands.get_mut(&p)) {
            Some(parent_island) => parent_island.children.push(id),
            None => self.roots.push(id),
        }

        for child in children {
            self.insert_unchecked(Some(id), child);
        }
        id
    }

    /// Remove an island and its whole subtree.
    ///
    /// Returns the removed islands, the given one first.
    pub fn remove(&mut self, id: IslandId) -> Result<Vec<RowIsland>, GridError> {
        let Some(island) = self.islands.get(&id) else {
            return Err(GridError::UnknownIsland(id));
        };
        match island.parent {
            Some(parent) => {
                if let Some(parent_island) = self.islands.get_mut(&parent) {
                    parent_island.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|c| *c != id),
        }

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(island) = self.islands.remove(&next) {
                stack.extend(island.children.iter().rev().copied());
                removed.push(island);
            }
        }
        Ok(removed)
    }

    pub fn get(&self, id: IslandId) -> Option<&RowIsland> {
        self.islands.get(&id)
    }

    pub fn get_mut(&mut self, id: IslandId) -> Option<&mut RowIsland> {
        self.islands.get_mut(&id)
    }

    pub fn contains(&self, id: IslandId) -> bool {
        self.islands.contains_key(&id)
    }

    /// Child islands of `parent` (`None` = root grid). Empty for unknown
    /// islands.
    pub fn children_of(&self, parent: Option<IslandId>) -> &[IslandId] {
        match parent {
            None => &self.roots,
            Some(id) => self
                .islands
                .get(&id)
                .map(|island| island.children.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Keys of the child islands of `parent`.
    pub fn child_keys(&self, parent: Option<IslandId>) -> Vec<String> {
        self.children_of(parent)
            .iter()
            .filter_map(|id| self.islands.get(id))
            .map(|island| island.key.clone())
            .collect()
    }

    /// Child island of `parent` with the given key.
    pub fn find_child(&self, parent: Option<IslandId>, key: &str) -> Option<IslandId> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|id| self.islands.get(id).is_some_and(|island| island.key == key))
    }

    /// Island a grid at `path` belongs to, following the island keys of the
    /// path. `None` for the root path or when a key has no island.
    pub fn resolve(&self, path: &RowPath) -> Option<IslandId> {
        let mut current = None;
        for segment in path.segments() {
            current = Some(self.find_child(current, &segment.island_key)?);
        }
        current
    }

    /// Record a live instance of an island.
    pub fn register(&mut self, id: IslandId, path: RowPath) {
        match self.islands.get_mut(&id) {
            Some(island) => {
                island.instances.insert(path);
            }
            None => warn!("Cannot register {} with unknown island {}", path, id),
        }
    }

    /// Forget an instance. Unknown islands are ignored (they may have been
    /// removed already).
    pub fn deregister(&mut self, id: IslandId, path: &RowPath) {
        if let Some(island) = self.islands.get_mut(&id) {
            island.instances.remove(path);
        }
    }

    /// Every registered island.
    pub fn iter(&self) -> impl Iterator<Item = &RowIsland> {
        self.islands.values()
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }
}
