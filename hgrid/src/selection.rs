//! Row selection of a grid level.
//!
//! A [`Selection`] owns its [`SelectionMode`] and refuses operations the mode
//! does not allow, so callers never have to re-check it. Rows are tracked by
//! [`RowId`], which survives data replacement as long as the row keeps its
//! identity.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::path::RowId;

/// Selection mode of a grid level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    None,
    Single,
    Multiple,
}

/// Rows that entered and left a selection in one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub added: Vec<RowId>,
    pub removed: Vec<RowId>,
}

impl SelectionChange {
    fn removed(removed: Vec<RowId>) -> Self {
        Self {
            added: Vec::new(),
            removed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Selected rows of one level.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    mode: SelectionMode,
    rows: BTreeSet<RowId>,
    /// Row the last single or toggle selection hit; ranges start here.
    anchor: Option<RowId>,
}

impl Selection {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switch mode, dropping what the new mode cannot hold: everything for
    /// `None`, all but the anchor for `Single`.
    pub fn set_mode(&mut self, mode: SelectionMode) -> SelectionChange {
        self.mode = mode;
        match mode {
            SelectionMode::None => self.clear(),
            SelectionMode::Single if self.rows.len() > 1 => {
                let keep = self
                    .anchor
                    .clone()
                    .filter(|anchor| self.rows.contains(anchor))
                    .or_else(|| self.rows.iter().next().cloned());
                let removed = self.take_where(|id| Some(id) != keep.as_ref());
                self.anchor = keep;
                SelectionChange::removed(removed)
            }
            _ => SelectionChange::default(),
        }
    }

    /// Selected rows in ID order.
    pub fn selected(&self) -> Vec<RowId> {
        self.rows.iter().cloned().collect()
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.rows.contains(id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn anchor(&self) -> Option<&RowId> {
        self.anchor.as_ref()
    }

    pub fn clear(&mut self) -> SelectionChange {
        self.anchor = None;
        SelectionChange::removed(std::mem::take(&mut self.rows).into_iter().collect())
    }

    /// Make `id` the only selected row. `None` when selection is disabled.
    pub fn select(&mut self, id: &RowId) -> Option<SelectionChange> {
        if self.mode == SelectionMode::None {
            return None;
        }
        let removed = self.take_where(|row| row != id);
        let added = if self.rows.insert(id.clone()) {
            vec![id.clone()]
        } else {
            Vec::new()
        };
        self.anchor = Some(id.clone());
        Some(SelectionChange { added, removed })
    }

    /// Flip `id`. In single mode a selected row is cleared and any other row
    /// replaces the selection.
    pub fn toggle(&mut self, id: &RowId) -> Option<SelectionChange> {
        match self.mode {
            SelectionMode::None => None,
            SelectionMode::Single if self.rows.contains(id) => Some(self.clear()),
            SelectionMode::Single => self.select(id),
            SelectionMode::Multiple => {
                self.anchor = Some(id.clone());
                Some(if self.rows.remove(id) {
                    SelectionChange::removed(vec![id.clone()])
                } else {
                    self.rows.insert(id.clone());
                    SelectionChange {
                        added: vec![id.clone()],
                        removed: Vec::new(),
                    }
                })
            }
        }
    }

    /// Select every row of `order` between the anchor and `target`.
    ///
    /// Multiple mode only. Without `extend`, rows outside the span are
    /// dropped. The anchor stays where it was so the span can be adjusted.
    pub fn select_range(
        &mut self,
        target: &RowId,
        order: &[RowId],
        extend: bool,
    ) -> Option<SelectionChange> {
        if self.mode != SelectionMode::Multiple {
            return None;
        }
        let target_at = order.iter().position(|id| id == target)?;
        let anchor_at = self
            .anchor
            .as_ref()
            .and_then(|anchor| order.iter().position(|id| id == anchor))
            .unwrap_or(target_at);
        let span = &order[anchor_at.min(target_at)..=anchor_at.max(target_at)];

        let removed = if extend {
            Vec::new()
        } else {
            let inside: BTreeSet<&RowId> = span.iter().collect();
            self.take_where(|id| !inside.contains(id))
        };
        let added = span
            .iter()
            .filter(|id| self.rows.insert((*id).clone()))
            .cloned()
            .collect();
        self.anchor = Some(order[anchor_at].clone());
        Some(SelectionChange { added, removed })
    }

    /// Drop rows for which `exists` is false. Returns the dropped rows.
    pub fn prune(&mut self, exists: impl Fn(&RowId) -> bool) -> Vec<RowId> {
        if self.anchor.as_ref().is_some_and(|anchor| !exists(anchor)) {
            self.anchor = None;
        }
        self.take_where(|id| !exists(id))
    }

    /// Carry the selection over to renamed rows.
    pub fn rename(&mut self, renamed: &HashMap<RowId, RowId>) {
        let moved = |id: RowId| renamed.get(&id).cloned().unwrap_or(id);
        self.rows = std::mem::take(&mut self.rows).into_iter().map(&moved).collect();
        self.anchor = self.anchor.take().map(&moved);
    }

    fn take_where(&mut self, doomed: impl Fn(&RowId) -> bool) -> Vec<RowId> {
        let (dropped, kept): (BTreeSet<RowId>, BTreeSet<RowId>) = std::mem::take(&mut self.rows)
            .into_iter()
            .partition(|id| doomed(id));
        self.rows = kept;
        dropped.into_iter().collect()
    }
}
