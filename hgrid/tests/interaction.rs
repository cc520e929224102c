//! Tests for selection, forwarded events, scheduled commands and teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hgrid::{
    GridCommand, GridConfig, GridEvent, GridOptions, HierarchicalGrid, ListenerScope, RowId,
    RowIslandDef, RowPath, SelectionMode,
};
use serde_json::{Value, json};

fn rows(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "ID": i,
                "ProductName": format!("Product {i}"),
                "childData": [{"ID": 0}, {"ID": 1}],
            })
        })
        .collect()
}

fn setup(mode: SelectionMode) -> HierarchicalGrid {
    let options = GridOptions::default()
        .with_primary_key("ID")
        .with_selection_mode(mode);
    let mut grid = HierarchicalGrid::new(GridConfig::default(), options);
    grid.add_island(None, RowIslandDef::new("childData").with_primary_key("ID"))
        .unwrap();
    grid.set_data(&RowPath::root(), rows(5));
    grid.flush();
    grid.drain_events();
    grid
}

fn root() -> RowPath {
    RowPath::root()
}

fn id(i: i32) -> RowId {
    RowId::from(i)
}

fn ids(raw: &[i32]) -> Vec<RowId> {
    raw.iter().map(|i| RowId::from(*i)).collect()
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_selection_disabled() {
    let mut grid = setup(SelectionMode::None);
    assert!(!grid.select_row(&root(), &id(1)));
    assert!(!grid.toggle_row_selection(&root(), &id(1)));
    assert!(grid.selected_rows(&root()).is_empty());
    assert!(grid.drain_events().is_empty());
}

#[test]
fn test_single_selection() {
    let mut grid = setup(SelectionMode::Single);
    assert!(grid.select_row(&root(), &id(1)));
    assert!(grid.toggle_row_selection(&root(), &id(3)));
    assert_eq!(grid.selected_rows(&root()), ids(&[3]));

    assert!(grid.toggle_row_selection(&root(), &id(3)));
    assert!(grid.selected_rows(&root()).is_empty());
    assert!(!grid.select_range(&root(), &id(4), false));
}

#[test]
fn test_multiple_selection_and_events() {
    let mut grid = setup(SelectionMode::Multiple);
    grid.toggle_row_selection(&root(), &id(0));
    grid.toggle_row_selection(&root(), &id(2));
    assert_eq!(grid.selected_rows(&root()), ids(&[0, 2]));

    let events = grid.drain_events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[1],
        GridEvent::RowSelectionChanged { added, removed, .. } if added == &ids(&[2]) && removed.is_empty()
    ));

    assert!(grid.deselect_all(&root()));
    assert!(grid.selected_rows(&root()).is_empty());
}

#[test]
fn test_range_selection() {
    let mut grid = setup(SelectionMode::Multiple);
    grid.select_row(&root(), &id(1));
    assert!(grid.select_range(&root(), &id(3), false));
    assert_eq!(grid.selected_rows(&root()), ids(&[1, 2, 3]));
    assert!(!grid.select_range(&root(), &id(77), false));
}

#[test]
fn test_vanished_rows_are_deselected() {
    let mut grid = setup(SelectionMode::Multiple);
    grid.toggle_row_selection(&root(), &id(0));
    grid.toggle_row_selection(&root(), &id(4));
    grid.drain_events();

    grid.set_data(&root(), rows(3));
    assert_eq!(grid.selected_rows(&root()), ids(&[0]));
    let events = grid.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GridEvent::RowSelectionChanged { removed, .. } if removed == &ids(&[4])
    )));
}

#[test]
fn test_level_selection_mode_change() {
    let mut grid = setup(SelectionMode::Multiple);
    grid.toggle_row_selection(&root(), &id(0));
    grid.toggle_row_selection(&root(), &id(1));
    assert!(grid.set_selection_mode(&root(), SelectionMode::Single));
    assert_eq!(grid.selected_rows(&root()), ids(&[1]));
}

// =============================================================================
// Cell events
// =============================================================================

#[test]
fn test_cell_click_carries_owner() {
    let mut grid = setup(SelectionMode::None);
    grid.expand(&root(), &id(2));
    grid.drain_events();

    let child = root().join(2, "childData");
    assert!(grid.cell_click(&child, &id(1), "ID"));
    assert!(grid.cell_click(&root(), &id(2), "ProductName"));
    assert!(!grid.cell_click(&root(), &id(99), "ID"));

    let events = grid.drain_events();
    assert_eq!(events.len(), 2);
    match &events[0] {
        GridEvent::CellClick {
            grid: owner,
            row,
            field,
            value,
        } => {
            assert_eq!(owner.path, child);
            assert_eq!(owner.grid, grid.controller(&child).unwrap().id());
            assert_eq!(row, &id(1));
            assert_eq!(field, "ID");
            assert_eq!(value, &json!(1));
        }
        other => panic!("unexpected event {:?}", other),
    }
    match &events[1] {
        GridEvent::CellClick { grid, value, .. } => {
            assert!(grid.path.is_root());
            assert_eq!(grid.island, None);
            assert_eq!(value, &json!("Product 2"));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

// =============================================================================
// Scheduled commands
// =============================================================================

#[test]
fn test_scheduled_commands_run_on_flush() {
    let mut grid = setup(SelectionMode::None);
    grid.schedule(GridCommand::Expand {
        path: root(),
        row: id(1),
    });
    assert!(grid.is_dirty());
    assert!(grid.cache().is_empty());

    let stats = grid.flush();
    assert_eq!(stats.discarded, 0);
    assert!(!grid.is_dirty());
    assert!(grid.child_grid(&root().join(1, "childData")).unwrap().is_live());
}

#[test]
fn test_stale_commands_are_discarded() {
    let mut grid = setup(SelectionMode::None);
    grid.schedule(GridCommand::Toggle {
        path: root().join(4, "childData"),
        row: id(0),
    });
    grid.schedule(GridCommand::SetData {
        path: root().join(9, "childData"),
        rows: Vec::new(),
    });
    grid.schedule(GridCommand::Collapse {
        path: root(),
        row: id(42),
    });
    let stats = grid.flush();
    assert_eq!(stats.discarded, 3);
    assert_eq!(stats.applied, 0);
}

#[test]
fn test_set_data_command_prunes_children() {
    let mut grid = setup(SelectionMode::None);
    grid.expand(&root(), &id(4));
    grid.flush();

    grid.schedule(GridCommand::SetData {
        path: root(),
        rows: rows(2),
    });
    grid.schedule(GridCommand::Relayout(root()));
    grid.flush();
    assert!(grid.cache().is_empty());
    assert_eq!(grid.host().live_count(), 0);
}

#[test]
fn test_removed_row_before_flush_never_renders() {
    let mut grid = setup(SelectionMode::None);
    grid.expand(&root(), &id(4));
    grid.set_data(&root(), rows(2));
    grid.flush();
    assert_eq!(grid.host().rendered_count(), 0);
    assert!(
        grid.drain_events()
            .iter()
            .all(|e| !matches!(e, GridEvent::GridCreated(_)))
    );
}

// =============================================================================
// Teardown
// =============================================================================

#[test]
fn test_destroy_releases_everything_immediately() {
    let mut grid = setup(SelectionMode::None);
    grid.expand_all(&root());
    grid.flush();
    grid.collapse(&root(), &id(0));
    assert_eq!(grid.host().live_count(), 5);

    grid.destroy();
    assert!(grid.is_destroyed());
    assert_eq!(grid.host().live_count(), 0);
    assert!(grid.cache().is_empty());
    let destroyed = grid
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GridEvent::GridDestroyed(_)))
        .count();
    assert_eq!(destroyed, 5);

    assert!(!grid.expand(&root(), &id(0)));
    assert_eq!(grid.flush().applied, 0);
    assert!(grid.cache().is_empty());
}

#[test]
fn test_drop_destroys_children() {
    let destroyed = Arc::new(AtomicUsize::new(0));
    {
        let mut grid = setup(SelectionMode::None);
        let counter = destroyed.clone();
        grid.subscribe(
            ListenerScope::All,
            Arc::new(move |event: &GridEvent| {
                if matches!(event, GridEvent::GridDestroyed(_)) {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            }),
        );
        grid.expand(&root(), &id(0));
        grid.expand(&root(), &id(1));
        grid.flush();
    }
    assert_eq!(destroyed.load(Ordering::SeqCst), 2);
}
