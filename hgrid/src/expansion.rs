//! Per-grid row expansion state.

use std::collections::{BTreeMap, HashMap};

use crate::path::RowId;

/// Expansion state of the rows of one grid level.
///
/// Rows without an explicit entry use the grid's `expand_children` default.
/// An explicit entry is kept even when it equals the default, so the user's
/// choice survives later changes of the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionStateStore {
    states: BTreeMap<RowId, bool>,
    default_expanded: bool,
}

impl ExpansionStateStore {
    /// Create an empty store with the given default.
    pub fn new(default_expanded: bool) -> Self {
        Self {
            states: BTreeMap::new(),
            default_expanded,
        }
    }

    /// Effective expansion of a row.
    pub fn is_expanded(&self, id: &RowId) -> bool {
        self.states.get(id).copied().unwrap_or(self.default_expanded)
    }

    /// Explicit entry for a row, if any.
    pub fn explicit(&self, id: &RowId) -> Option<bool> {
        self.states.get(id).copied()
    }

    /// Set a row's expansion explicitly.
    ///
    /// Returns true if the effective state changed.
    pub fn set_expanded(&mut self, id: RowId, expanded: bool) -> bool {
        let before = self.is_expanded(&id);
        self.states.insert(id, expanded);
        before != expanded
    }

    /// Mark every given row as expanded.
    pub fn expand_all(&mut self, ids: impl IntoIterator<Item = RowId>) {
        for id in ids {
            self.states.insert(id, true);
        }
    }

    /// Mark every given row as collapsed.
    pub fn collapse_all(&mut self, ids: impl IntoIterator<Item = RowId>) {
        for id in ids {
            self.states.insert(id, false);
        }
    }

    /// Remove every explicit entry; all rows fall back to the default.
    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Replace all explicit entries at once.
    pub fn replace(&mut self, states: impl IntoIterator<Item = (RowId, bool)>) {
        self.states = states.into_iter().collect();
    }

    /// Forget the explicit entries of rows for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&RowId) -> bool) {
        self.states.retain(|id, _| keep(id));
    }

    /// Move explicit entries of renamed rows to their new IDs.
    pub fn rename(&mut self, renamed: &HashMap<RowId, RowId>) {
        self.states = std::mem::take(&mut self.states)
            .into_iter()
            .map(|(id, expanded)| (renamed.get(&id).cloned().unwrap_or(id), expanded))
            .collect();
    }

    pub fn default_expanded(&self) -> bool {
        self.default_expanded
    }

    pub fn set_default(&mut self, expanded: bool) {
        self.default_expanded = expanded;
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Explicit entries in row ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&RowId, bool)> {
        self.states.iter().map(|(id, expanded)| (id, *expanded))
    }

    /// Snapshot of the explicit entries.
    pub fn states(&self) -> BTreeMap<RowId, bool> {
        self.states.clone()
    }
}
