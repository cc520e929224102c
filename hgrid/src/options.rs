//! Per-level grid options.

use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::geometry::SizeSpec;
use crate::selection::SelectionMode;

/// Options of one grid level.
///
/// The root grid is built from one of these; every row island carries one as
/// the template for the child grids it creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    /// Declared columns. Empty means auto-generate (if enabled).
    pub columns: Vec<Column>,
    /// Generate columns from the first record when none are declared.
    pub auto_generate: bool,
    pub height: SizeSpec,
    pub width: SizeSpec,
    pub selection_mode: SelectionMode,
    /// Default expansion for rows without an explicit state.
    pub expand_children: bool,
    /// Field holding the row identity. Without one rows are identified by
    /// content.
    pub primary_key: Option<String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            auto_generate: true,
            height: SizeSpec::Auto,
            width: SizeSpec::Auto,
            selection_mode: SelectionMode::None,
            expand_children: false,
            primary_key: None,
        }
    }
}

impl GridOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_auto_generate(mut self, auto_generate: bool) -> Self {
        self.auto_generate = auto_generate;
        self
    }

    pub fn with_height(mut self, height: SizeSpec) -> Self {
        self.height = height;
        self
    }

    pub fn with_width(mut self, width: SizeSpec) -> Self {
        self.width = width;
        self
    }

    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    pub fn with_expand_children(mut self, expand: bool) -> Self {
        self.expand_children = expand;
        self
    }

    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = Some(key.into());
        self
    }
}
