//! Column definitions and per-level column state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Horizontal alignment for column content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Declared column.
///
/// Columns are identified by their `field`; everything else is presentation.
///
/// # Examples
///
/// ```
/// use hgrid::Column;
///
/// let columns = vec![
///     Column::new("ID").width(80),
///     Column::new("ProductName").header("Product").sortable(),
/// ];
/// assert_eq!(columns[1].header, "Product");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Field of the row record shown in this column
    pub field: String,
    /// Header text (defaults to the field name)
    #[serde(default)]
    pub header: String,
    /// Declared width in pixels (None = size to fit)
    #[serde(default)]
    pub width: Option<u32>,
    /// Horizontal alignment
    #[serde(default)]
    pub align: Alignment,
    /// Whether cells may be edited
    #[serde(default)]
    pub editable: bool,
    /// Whether this column is sortable
    #[serde(default)]
    pub sortable: bool,
}

impl Column {
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            header: field.clone(),
            field,
            width: None,
            align: Alignment::Left,
            editable: false,
            sortable: false,
        }
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn align(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    /// Columns for every key of the first record, skipping `exclude`
    /// (the keys holding child data).
    pub fn auto_generate(rows: &[Value], exclude: &[&str]) -> Vec<Column> {
        let Some(Value::Object(first)) = rows.first() else {
            return Vec::new();
        };
        first
            .keys()
            .filter(|key| !exclude.contains(&key.as_str()))
            .map(Column::new)
            .collect()
    }
}

/// Sort direction applied at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A column as it lives on a grid level: the declaration plus runtime state.
#[derive(Debug, Clone, PartialEq)]
pub struct GridColumn {
    pub column: Column,
    /// Sort applied by the user
    pub sort: Option<SortDirection>,
    /// Width set by the user (resizing), overrides the declared width
    pub width_override: Option<u32>,
    /// Whether the column came from data shape rather than a declaration
    pub auto_generated: bool,
}

impl GridColumn {
    pub fn new(column: Column) -> Self {
        Self {
            column,
            sort: None,
            width_override: None,
            auto_generated: false,
        }
    }

    pub fn generated(column: Column) -> Self {
        Self {
            auto_generated: true,
            ..Self::new(column)
        }
    }

    pub fn field(&self) -> &str {
        &self.column.field
    }

    pub fn width(&self) -> Option<u32> {
        self.width_override.or(self.column.width)
    }
}

/// Result of reconciling a level's columns with a new declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Kept fields whose declaration (header, width, ...) changed
    pub changed: Vec<String>,
    /// Kept fields moved relative to each other
    pub reordered: bool,
}

impl ColumnDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && !self.reordered
    }
}

/// Reconcile `current` against `declared` by field identity.
///
/// The result follows the declared order. Matching columns take the new
/// declaration but keep their sort and width override; missing ones are added
/// and absent ones dropped.
pub fn reconcile_columns(
    current: &mut Vec<GridColumn>,
    declared: &[Column],
    auto_generated: bool,
) -> ColumnDiff {
    let mut diff = ColumnDiff::default();
    let mut previous = std::mem::take(current);
    let order_before: Vec<String> = previous.iter().map(|c| c.column.field.clone()).collect();

    for column in declared {
        match previous.iter().position(|c| c.column.field == column.field) {
            Some(index) => {
                let mut existing = previous.swap_remove(index);
                if existing.column != *column {
                    diff.changed.push(column.field.clone());
                }
                existing.column = column.clone();
                existing.auto_generated = auto_generated;
                current.push(existing);
            }
            None => {
                diff.added.push(column.field.clone());
                let mut fresh = GridColumn::new(column.clone());
                fresh.auto_generated = auto_generated;
                current.push(fresh);
            }
        }
    }

    diff.removed = previous.into_iter().map(|c| c.column.field).collect();
    diff.removed.sort();

    let kept_before = order_before
        .iter()
        .filter(|field| !diff.removed.contains(field) && !diff.added.contains(field));
    let kept_after = current
        .iter()
        .map(GridColumn::field)
        .filter(|field| !diff.added.iter().any(|added| added == field));
    diff.reordered = !kept_before.map(String::as_str).eq(kept_after);
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(columns: &[GridColumn]) -> Vec<&str> {
        columns.iter().map(|c| c.field()).collect()
    }

    #[test]
    fn test_reconcile_keeps_runtime_state() {
        let mut current = vec![
            GridColumn::new(Column::new("ID")),
            GridColumn::new(Column::new("Name")),
        ];
        current[1].sort = Some(SortDirection::Descending);
        current[1].width_override = Some(120);

        let diff = reconcile_columns(
            &mut current,
            &[Column::new("Name").header("Product"), Column::new("Col1")],
            false,
        );

        assert_eq!(fields(&current), vec!["Name", "Col1"]);
        assert_eq!(current[0].sort, Some(SortDirection::Descending));
        assert_eq!(current[0].width(), Some(120));
        assert_eq!(current[0].column.header, "Product");
        assert_eq!(diff.added, vec!["Col1".to_string()]);
        assert_eq!(diff.removed, vec!["ID".to_string()]);
        assert_eq!(diff.changed, vec!["Name".to_string()]);
        assert!(!diff.reordered);
    }

    #[test]
    fn test_reconcile_detects_reorder_and_width() {
        let mut current = vec![
            GridColumn::new(Column::new("ID")),
            GridColumn::new(Column::new("Name")),
        ];
        let swapped = [Column::new("Name"), Column::new("ID")];
        let diff = reconcile_columns(&mut current, &swapped, false);
        assert!(diff.reordered);
        assert!(!diff.is_empty());

        let resized = [Column::new("Name").width(90), Column::new("ID")];
        let diff = reconcile_columns(&mut current, &resized, false);
        assert_eq!(diff.changed, vec!["Name".to_string()]);
        assert!(!diff.reordered);
    }

    #[test]
    fn test_reconcile_noop() {
        let mut current = vec![GridColumn::new(Column::new("ID"))];
        let diff = reconcile_columns(&mut current, &[Column::new("ID")], false);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_auto_generate_skips_child_keys() {
        let rows = vec![json!({"ID": 1, "Name": "a", "childData": []})];
        let columns = Column::auto_generate(&rows, &["childData"]);
        let names: Vec<_> = columns.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(names, vec!["ID", "Name"]);
    }

    #[test]
    fn test_auto_generate_empty() {
        assert!(Column::auto_generate(&[], &[]).is_empty());
    }
}
