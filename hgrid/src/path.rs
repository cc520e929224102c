//! Row identifiers and paths addressing grid instances in the hierarchy.
//!
//! A [`RowPath`] is the chain of `(row id, island key)` pairs leading from the
//! root grid to a child grid. The empty path addresses the root grid itself.
//! Paths compare structurally, so the same logical child grid is found again
//! across ticks no matter how the path value was built.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identifier of a row within one grid level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Create a row ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build a row ID from a primary key value.
    ///
    /// Strings are used verbatim, every other JSON value in its JSON text form
    /// (so the number `0` becomes `"0"`).
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self(s.clone()),
            other => Self(other.to_string()),
        }
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i32> for RowId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for RowId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// One step of a [`RowPath`]: the parent row and the island it expands into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathSegment {
    /// Row of the parent grid owning the child.
    pub row_id: RowId,
    /// Key of the row island the child grid belongs to.
    pub island_key: String,
}

impl PathSegment {
    pub fn new(row_id: impl Into<RowId>, island_key: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            island_key: island_key.into(),
        }
    }
}

/// Address of a grid instance anywhere in the hierarchy.
///
/// Ordering is lexicographic over segments, which places every extension of
/// a path in one contiguous run right after it. The child cache relies on
/// this for prefix range scans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowPath(Vec<PathSegment>);

impl RowPath {
    /// The path of the root grid.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Whether this is the root grid's path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Nesting depth (0 = root).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Path of the grid owning this one (`None` for the root).
    pub fn parent(&self) -> Option<RowPath> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Path of the child grid of `row_id` for the given island.
    pub fn child(&self, row_id: impl Into<RowId>, island_key: impl Into<String>) -> RowPath {
        let mut segments = self.0.clone();
        segments.push(PathSegment::new(row_id, island_key));
        Self(segments)
    }

    /// Builder-style variant of [`child`](Self::child).
    pub fn join(self, row_id: impl Into<RowId>, island_key: impl Into<String>) -> RowPath {
        let mut segments = self.0;
        segments.push(PathSegment::new(row_id, island_key));
        Self(segments)
    }

    /// True if `self` is a prefix of `other` (a path is a prefix of itself).
    pub fn is_prefix_of(&self, other: &RowPath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// True if `self` is a prefix of `other` and shorter than it.
    pub fn is_strict_prefix_of(&self, other: &RowPath) -> bool {
        other.0.len() > self.0.len() && self.is_prefix_of(other)
    }

    /// True if `other` is a direct child of `self`.
    pub fn is_parent_of(&self, other: &RowPath) -> bool {
        other.0.len() == self.0.len() + 1 && self.is_prefix_of(other)
    }
}

impl fmt::Display for RowPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}[{}]", segment.island_key, segment.row_id)?;
        }
        Ok(())
    }
}
