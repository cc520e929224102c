//! Grid configuration.

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Row density of a grid. Set on the root and inherited by every child level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayDensity {
    #[default]
    Comfortable,
    Cosy,
    Compact,
}

impl DisplayDensity {
    /// Content height of a row in pixels (without the row border).
    pub fn row_height(self) -> u32 {
        match self {
            DisplayDensity::Comfortable => 50,
            DisplayDensity::Cosy => 40,
            DisplayDensity::Compact => 32,
        }
    }
}

/// Configuration shared by every level of a hierarchical grid.
///
/// # Example
///
/// ```
/// use hgrid::{DisplayDensity, GridConfig};
///
/// let config = GridConfig::default()
///     .with_density(DisplayDensity::Cosy)
///     .with_max_visible_rows(8);
/// assert_eq!(config.row_height(), 41);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Row density (root value, propagated to children).
    ///
    /// Default: comfortable
    pub density: DisplayDensity,

    /// Border added below every row, in pixels.
    ///
    /// Default: 1
    pub row_border: u32,

    /// Rows shown by an auto-sized grid once its data no longer renders
    /// naturally.
    ///
    /// Default: 10
    pub max_visible_rows: usize,

    /// Largest row count an auto-sized grid renders without virtualization.
    ///
    /// Default: 50
    pub natural_row_limit: usize,

    /// Horizontal indentation of a child grid inside its parent row, used when
    /// the child's width is auto.
    ///
    /// Default: 30
    pub child_indent: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            density: DisplayDensity::Comfortable,
            row_border: 1,
            max_visible_rows: 10,
            natural_row_limit: 50,
            child_indent: 30,
        }
    }
}

impl GridConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a config from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the display density.
    pub fn with_density(mut self, density: DisplayDensity) -> Self {
        self.density = density;
        self
    }

    /// Sets the row border width.
    pub fn with_row_border(mut self, border: u32) -> Self {
        self.row_border = border;
        self
    }

    /// Sets the number of rows shown by a virtualized auto-sized grid.
    pub fn with_max_visible_rows(mut self, rows: usize) -> Self {
        self.max_visible_rows = rows;
        self
    }

    /// Sets the largest row count rendered without virtualization.
    pub fn with_natural_row_limit(mut self, rows: usize) -> Self {
        self.natural_row_limit = rows;
        self
    }

    /// Sets the child grid indentation.
    pub fn with_child_indent(mut self, indent: u32) -> Self {
        self.child_indent = indent;
        self
    }

    /// Effective row height for the configured density.
    pub fn row_height(&self) -> u32 {
        self.row_height_for(self.density)
    }

    /// Effective row height for a given density.
    pub fn row_height_for(&self, density: DisplayDensity) -> u32 {
        density.row_height() + self.row_border
    }
}
