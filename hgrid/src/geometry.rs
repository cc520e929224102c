//! Size resolution and virtualization parameters.
//!
//! A grid level declares its height and width as a [`SizeSpec`]. The
//! [`GeometryCalculator`] turns that declaration, the current row count and
//! the parent's resolved size into pixel sizes and the virtualization chunk.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::error::GridError;

/// Declared size of a grid dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SizeSpec {
    /// Size from data: natural for small data sets, a fixed viewport for large ones.
    #[default]
    Auto,
    /// Always size to content, never virtualize.
    Natural,
    /// Fixed pixel size.
    Px(u32),
    /// Percentage of the parent's resolved size.
    Percent(f64),
}

impl SizeSpec {
    pub fn px(px: u32) -> Self {
        SizeSpec::Px(px)
    }

    pub fn percent(percent: f64) -> Self {
        SizeSpec::Percent(percent)
    }

    /// Parse a size literal: `"200px"`, `"200"`, `"50%"`, `"auto"` (or empty),
    /// `"null"`/`"none"`.
    pub fn parse(raw: &str) -> Result<Self, GridError> {
        let text = raw.trim();
        let invalid = || GridError::InvalidSize(raw.to_string());

        match text.to_ascii_lowercase().as_str() {
            "" | "auto" => return Ok(SizeSpec::Auto),
            "null" | "none" => return Ok(SizeSpec::Natural),
            _ => {}
        }

        if let Some(number) = text.strip_suffix('%') {
            let value: f64 = number.trim().parse().map_err(|_| invalid())?;
            if !value.is_finite() || value < 0.0 {
                return Err(invalid());
            }
            return Ok(SizeSpec::Percent(value));
        }

        let number = text.strip_suffix("px").unwrap_or(text);
        let value: f64 = number.trim().parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
            return Err(invalid());
        }
        Ok(SizeSpec::Px(value.round() as u32))
    }
}

impl FromStr for SizeSpec {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SizeSpec::parse(s)
    }
}

impl TryFrom<String> for SizeSpec {
    type Error = GridError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SizeSpec::parse(&value)
    }
}

impl From<SizeSpec> for String {
    fn from(value: SizeSpec) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeSpec::Auto => f.write_str("auto"),
            SizeSpec::Natural => f.write_str("null"),
            SizeSpec::Px(px) => write!(f, "{px}px"),
            SizeSpec::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Resolved size of a container, in pixels. `None` means "size to content".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParentSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Resolved geometry of one grid level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    /// Body height in pixels, `None` when the grid sizes to its content.
    pub calc_height: Option<u32>,
    /// Width in pixels, `None` when no width could be resolved.
    pub calc_width: Option<u32>,
    /// Row height used for the calculation.
    pub row_height: u32,
    /// Number of rows rendered at once.
    pub chunk_size: usize,
    /// Total scrollable height: rows plus cached child grids.
    pub total_extent: u64,
}

impl Geometry {
    /// Height this grid occupies inside its parent row.
    pub fn outer_height(&self) -> u64 {
        match self.calc_height {
            Some(height) => u64::from(height),
            None => self.total_extent,
        }
    }
}

/// Derives pixel geometry from declared sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryCalculator {
    max_visible_rows: usize,
    natural_row_limit: usize,
    child_indent: u32,
}

impl GeometryCalculator {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            max_visible_rows: config.max_visible_rows,
            natural_row_limit: config.natural_row_limit,
            child_indent: config.child_indent,
        }
    }

    /// Effective body height.
    ///
    /// `row_count` is `None` while the grid has no data bound.
    pub fn height(
        &self,
        declared: SizeSpec,
        row_count: Option<usize>,
        row_height: u32,
        parent_height: Option<u32>,
    ) -> Option<u32> {
        match declared {
            SizeSpec::Natural => None,
            SizeSpec::Px(px) => Some(px),
            SizeSpec::Percent(pct) => match parent_height {
                Some(parent) => Some(percent_of(parent, pct)),
                None => self.auto_height(row_count, row_height),
            },
            SizeSpec::Auto => self.auto_height(row_count, row_height),
        }
    }

    fn auto_height(&self, row_count: Option<usize>, row_height: u32) -> Option<u32> {
        match row_count {
            None | Some(0) => None,
            Some(rows) if rows <= self.natural_row_limit => None,
            Some(rows) => {
                let visible = rows.min(self.max_visible_rows);
                Some(saturating_u32(visible as u64 * u64::from(row_height)))
            }
        }
    }

    /// Effective width. `is_child` selects the indentation for auto widths.
    pub fn width(&self, declared: SizeSpec, parent_width: Option<u32>, is_child: bool) -> Option<u32> {
        match declared {
            SizeSpec::Px(px) => Some(px),
            SizeSpec::Percent(pct) => parent_width.map(|w| percent_of(w, pct)),
            SizeSpec::Auto | SizeSpec::Natural => {
                let indent = if is_child { self.child_indent } else { 0 };
                parent_width.map(|w| w.saturating_sub(indent))
            }
        }
    }

    /// Rows rendered at once: every row when sizing to content, otherwise what
    /// fits in the body plus one partially visible row.
    pub fn chunk_size(&self, calc_height: Option<u32>, row_count: usize, row_height: u32) -> usize {
        match calc_height {
            None => row_count,
            Some(height) => {
                let fitting = height.div_ceil(row_height.max(1)) as usize + 1;
                fitting.min(row_count)
            }
        }
    }

    /// Full geometry of a level before its children's extents are added.
    pub fn compute(
        &self,
        height: SizeSpec,
        width: SizeSpec,
        row_count: Option<usize>,
        row_height: u32,
        parent: ParentSize,
        is_child: bool,
    ) -> Geometry {
        let calc_height = self.height(height, row_count, row_height, parent.height);
        let calc_width = self.width(width, parent.width, is_child);
        let rows = row_count.unwrap_or(0);
        Geometry {
            calc_height,
            calc_width,
            row_height,
            chunk_size: self.chunk_size(calc_height, rows, row_height),
            total_extent: rows as u64 * u64::from(row_height),
        }
    }
}

fn percent_of(value: u32, pct: f64) -> u32 {
    let scaled = (f64::from(value) * pct / 100.0).round();
    if scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> GeometryCalculator {
        GeometryCalculator::new(&GridConfig::default())
    }

    #[test]
    fn test_parse_sizes() {
        assert_eq!(SizeSpec::parse("200px").unwrap(), SizeSpec::Px(200));
        assert_eq!(SizeSpec::parse(" 120 ").unwrap(), SizeSpec::Px(120));
        assert_eq!(SizeSpec::parse("50%").unwrap(), SizeSpec::Percent(50.0));
        assert_eq!(SizeSpec::parse("").unwrap(), SizeSpec::Auto);
        assert_eq!(SizeSpec::parse("null").unwrap(), SizeSpec::Natural);
        assert!(matches!(SizeSpec::parse("wide"), Err(GridError::InvalidSize(_))));
        assert!(SizeSpec::parse("-5px").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["200px", "50%", "auto", "null"] {
            let spec = SizeSpec::parse(raw).unwrap();
            assert_eq!(spec.to_string(), raw);
        }
    }

    #[test]
    fn test_auto_height_policy() {
        let calc = calculator();
        assert_eq!(calc.height(SizeSpec::Auto, None, 51, None), None);
        assert_eq!(calc.height(SizeSpec::Auto, Some(0), 51, None), None);
        assert_eq!(calc.height(SizeSpec::Auto, Some(15), 51, None), None);
        assert_eq!(calc.height(SizeSpec::Auto, Some(100_000), 51, None), Some(510));
    }

    #[test]
    fn test_percent_height() {
        let calc = calculator();
        assert_eq!(calc.height(SizeSpec::Percent(50.0), Some(3), 51, Some(400)), Some(200));
        // without a sized parent the auto policy applies
        assert_eq!(calc.height(SizeSpec::Percent(50.0), Some(100_000), 51, None), Some(510));
    }

    #[test]
    fn test_natural_ignores_data() {
        let calc = calculator();
        assert_eq!(calc.height(SizeSpec::Natural, Some(100_000), 51, Some(400)), None);
    }

    #[test]
    fn test_width() {
        let calc = calculator();
        assert_eq!(calc.width(SizeSpec::Auto, Some(400), true), Some(370));
        assert_eq!(calc.width(SizeSpec::Auto, Some(400), false), Some(400));
        assert_eq!(calc.width(SizeSpec::Percent(50.0), Some(400), true), Some(200));
        assert_eq!(calc.width(SizeSpec::Px(200), None, true), Some(200));
        assert_eq!(calc.width(SizeSpec::Percent(50.0), None, true), None);
    }

    #[test]
    fn test_chunk_size() {
        let calc = calculator();
        assert_eq!(calc.chunk_size(None, 15, 51), 15);
        assert_eq!(calc.chunk_size(Some(510), 100_000, 51), 11);
        assert_eq!(calc.chunk_size(Some(200), 100_000, 51), 5);
        assert_eq!(calc.chunk_size(Some(200), 2, 51), 2);
        assert_eq!(calc.chunk_size(Some(600), 0, 51), 0);
    }
}
