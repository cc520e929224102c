//! Cache of child grid instances.
//!
//! Every child grid lives in one arena keyed by its [`RowPath`]. Because
//! paths order lexicographically, a grid and all of its descendants occupy
//! one contiguous key range, so cascading destroys are range scans. A second
//! index lists the direct children of each level in creation order, so
//! walking one level never touches the grandchildren.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use log::{debug, trace};
use serde_json::Value;

use crate::controller::{DataUpdate, GridController};
use crate::host::HostHandle;
use crate::path::RowPath;

/// Render status of a cached child grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Created, waiting for the next flush to render.
    Pending,
    /// Rendered by the host.
    Live(HostHandle),
}

/// A cached child grid.
#[derive(Debug)]
pub struct CacheEntry {
    pub controller: GridController,
    pub status: EntryStatus,
    seq: u64,
}

impl CacheEntry {
    pub fn path(&self) -> &RowPath {
        self.controller.path()
    }

    pub fn is_live(&self) -> bool {
        matches!(self.status, EntryStatus::Live(_))
    }

    pub fn handle(&self) -> Option<HostHandle> {
        match self.status {
            EntryStatus::Live(handle) => Some(handle),
            EntryStatus::Pending => None,
        }
    }

    /// Creation order within the cache.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Whether [`ChildGridCache::get_or_create`] built a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    Created,
    /// An existing entry was reused; its data was reattached.
    Reused(DataUpdate),
}

/// Arena of child grids keyed by path.
#[derive(Debug, Default)]
pub struct ChildGridCache {
    entries: BTreeMap<RowPath, CacheEntry>,
    /// Parent path -> creation seq -> child path
    children: HashMap<RowPath, BTreeMap<u64, RowPath>>,
    next_seq: u64,
}

impl ChildGridCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry at `path`, creating it with `create` if missing.
    ///
    /// A reused entry gets `data` reattached, a created one is bound to it.
    pub fn get_or_create(
        &mut self,
        path: RowPath,
        data: Option<Vec<Value>>,
        create: impl FnOnce() -> GridController,
    ) -> (&mut CacheEntry, CacheOutcome) {
        use std::collections::btree_map::Entry;

        match self.entries.entry(path) {
            Entry::Occupied(occupied) => {
                let entry = occupied.into_mut();
                let update = entry.controller.set_data(data);
                trace!("Reusing child grid {}", entry.controller.path());
                (entry, CacheOutcome::Reused(update))
            }
            Entry::Vacant(vacant) => {
                let mut controller = create();
                controller.set_data(data);
                debug!("Creating child grid {} at {}", controller.id(), vacant.key());
                let seq = self.next_seq;
                self.next_seq += 1;
                if let Some(parent) = vacant.key().parent() {
                    self.children
                        .entry(parent)
                        .or_default()
                        .insert(seq, vacant.key().clone());
                }
                let entry = vacant.insert(CacheEntry {
                    controller,
                    status: EntryStatus::Pending,
                    seq,
                });
                (entry, CacheOutcome::Created)
            }
        }
    }

    pub fn get(&self, path: &RowPath) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &RowPath) -> Option<&mut CacheEntry> {
        self.entries.get_mut(path)
    }

    pub fn contains(&self, path: &RowPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Paths strictly below `parent`, in key order.
    fn descendant_paths<'a>(&'a self, parent: &'a RowPath) -> impl Iterator<Item = &'a RowPath> + 'a {
        self.entries
            .range((Bound::Excluded(parent), Bound::Unbounded))
            .map(|(path, _)| path)
            .take_while(move |path| parent.is_prefix_of(path))
    }

    /// Children of the grid at `parent`: direct ones, or every descendant
    /// when `recursive`. Ordered by creation.
    pub fn get_all(&self, parent: &RowPath, recursive: bool) -> Vec<&CacheEntry> {
        if !recursive {
            return self
                .direct_children(parent)
                .filter_map(|path| self.entries.get(path))
                .collect();
        }
        let mut found: Vec<&CacheEntry> = self
            .descendant_paths(parent)
            .filter_map(|path| self.entries.get(path))
            .collect();
        found.sort_by_key(|entry| entry.seq);
        found
    }

    /// Paths of the direct children of `parent`, ordered by creation.
    pub fn child_paths(&self, parent: &RowPath) -> Vec<RowPath> {
        self.direct_children(parent).cloned().collect()
    }

    fn direct_children<'a>(&'a self, parent: &RowPath) -> impl Iterator<Item = &'a RowPath> + 'a {
        self.children
            .get(parent)
            .into_iter()
            .flat_map(|children| children.values())
    }

    /// Remove the entry at `path` and everything below it.
    ///
    /// Returns the removed entries, deepest first. Unknown paths remove
    /// nothing.
    pub fn destroy(&mut self, path: &RowPath) -> Vec<CacheEntry> {
        let mut doomed: Vec<RowPath> = self.descendant_paths(path).cloned().collect();
        if self.entries.contains_key(path) {
            doomed.push(path.clone());
        }
        self.remove_deepest_first(doomed)
    }

    /// Remove every entry, deepest first.
    pub fn destroy_all(&mut self) -> Vec<CacheEntry> {
        let doomed: Vec<RowPath> = self.entries.keys().cloned().collect();
        self.remove_deepest_first(doomed)
    }

    fn remove_deepest_first(&mut self, mut doomed: Vec<RowPath>) -> Vec<CacheEntry> {
        doomed.sort_by_key(|path| std::cmp::Reverse(path.depth()));
        let removed: Vec<CacheEntry> = doomed
            .iter()
            .filter_map(|path| self.entries.remove(path))
            .collect();
        for entry in &removed {
            self.unindex(entry);
        }
        removed
    }

    fn unindex(&mut self, entry: &CacheEntry) {
        let Some(parent) = entry.path().parent() else {
            return;
        };
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.remove(&entry.seq);
            if siblings.is_empty() {
                self.children.remove(&parent);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayDensity;
    use crate::options::GridOptions;
    use serde_json::json;

    fn add(cache: &mut ChildGridCache, path: &RowPath) -> CacheOutcome {
        let make = || {
            GridController::new(path.clone(), None, GridOptions::default(), DisplayDensity::default())
        };
        cache.get_or_create(path.clone(), None, make).1
    }

    #[test]
    fn test_get_or_create_reuses() {
        let mut cache = ChildGridCache::new();
        let path = RowPath::root().join(1, "a");
        assert_eq!(add(&mut cache, &path), CacheOutcome::Created);
        assert_eq!(add(&mut cache, &path), CacheOutcome::Reused(DataUpdate::default()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reuse_reattaches_data() {
        let mut cache = ChildGridCache::new();
        let path = RowPath::root().join(1, "a");
        add(&mut cache, &path);
        let (entry, outcome) = cache.get_or_create(path, Some(vec![json!({"x": 1})]), || {
            unreachable!("entry exists")
        });
        assert!(matches!(outcome, CacheOutcome::Reused(DataUpdate { changed: true, .. })));
        assert_eq!(entry.controller.row_count(), Some(1));
    }

    #[test]
    fn test_get_all_in_creation_order() {
        let mut cache = ChildGridCache::new();
        let root = RowPath::root();
        let b = root.child(2, "a");
        let a = root.child(1, "a");
        add(&mut cache, &b);
        add(&mut cache, &a);
        add(&mut cache, &a.child(0, "n"));

        let direct: Vec<_> = cache.get_all(&root, false).iter().map(|e| e.path().clone()).collect();
        assert_eq!(direct, vec![b.clone(), a.clone()]);
        assert_eq!(cache.get_all(&root, true).len(), 3);
        assert_eq!(cache.get_all(&a, false).len(), 1);
        assert!(cache.get_all(&b, true).is_empty());
    }

    #[test]
    fn test_destroy_removes_subtree_deepest_first() {
        let mut cache = ChildGridCache::new();
        let a = RowPath::root().child(1, "a");
        let nested = a.child(0, "n");
        let sibling = RowPath::root().child(10, "a");
        add(&mut cache, &a);
        add(&mut cache, &nested);
        add(&mut cache, &nested.child(5, "m"));
        add(&mut cache, &sibling);

        let removed = cache.destroy(&a);
        let depths: Vec<_> = removed.iter().map(|e| e.path().depth()).collect();
        assert_eq!(depths, vec![3, 2, 1]);
        assert!(cache.iter().all(|e| !a.is_prefix_of(e.path())));
        assert!(cache.contains(&sibling));
        assert!(cache.destroy(&a).is_empty());
    }

    #[test]
    fn test_destroy_all() {
        let mut cache = ChildGridCache::new();
        add(&mut cache, &RowPath::root().child(1, "a"));
        add(&mut cache, &RowPath::root().child(1, "a").child(2, "b"));
        assert_eq!(cache.destroy_all().len(), 2);
        assert!(cache.is_empty());
        assert!(cache.children.is_empty());
    }

    #[test]
    fn test_child_index_follows_destroy_and_recreate() {
        let mut cache = ChildGridCache::new();
        let root = RowPath::root();
        let a = root.child(1, "a");
        let b = root.child(2, "a");
        add(&mut cache, &a);
        add(&mut cache, &a.child(0, "n"));
        add(&mut cache, &b);

        cache.destroy(&a);
        assert_eq!(cache.child_paths(&root), vec![b.clone()]);
        assert!(cache.child_paths(&a).is_empty());

        add(&mut cache, &a);
        assert_eq!(cache.child_paths(&root), vec![b, a]);
    }
}
