//! Tests for row islands: composition, option propagation and listeners.

use std::sync::{Arc, Mutex};

use hgrid::{
    Column, GridConfig, GridError, GridEvent, GridOptions, HierarchicalGrid, IslandId,
    ListenerScope, RowExpansion, RowId, RowIslandDef, RowPath, SelectionMode,
};
use serde_json::{Value, json};

/// Root rows carrying data for two sibling islands.
fn rows(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "ID": i,
                "ProductName": format!("Product {i}"),
                "childData": [{"ID": 0, "Col1": "a"}, {"ID": 1, "Col1": "b"}],
                "childData2": [{"ID": 0, "Col2": "x"}],
            })
        })
        .collect()
}

fn setup() -> (HierarchicalGrid, IslandId, IslandId) {
    let options = GridOptions::default().with_primary_key("ID");
    let mut grid = HierarchicalGrid::new(GridConfig::default(), options);
    let first = grid
        .add_island(None, RowIslandDef::new("childData").with_primary_key("ID"))
        .unwrap();
    let second = grid
        .add_island(None, RowIslandDef::new("childData2").with_primary_key("ID"))
        .unwrap();
    grid.set_data(&RowPath::root(), rows(3));
    grid.flush();
    grid.drain_events();
    (grid, first, second)
}

fn root() -> RowPath {
    RowPath::root()
}

fn id(i: i32) -> RowId {
    RowId::from(i)
}

fn field_names(grid: &HierarchicalGrid, path: &RowPath) -> Vec<String> {
    grid.controller(path)
        .unwrap()
        .columns()
        .iter()
        .map(|c| c.field().to_string())
        .collect()
}

// =============================================================================
// Sibling islands
// =============================================================================

#[test]
fn test_sibling_islands_create_one_child_each() {
    let (mut grid, first, second) = setup();
    grid.expand(&root(), &id(0));
    grid.flush();

    let children = grid.child_grids(&root(), false);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].controller.island(), Some(first));
    assert_eq!(children[1].controller.island(), Some(second));

    assert_eq!(field_names(&grid, &root().join(0, "childData")), vec!["Col1", "ID"]);
    assert_eq!(field_names(&grid, &root().join(0, "childData2")), vec!["Col2", "ID"]);
    assert_eq!(grid.host().live_count(), 2);
}

#[test]
fn test_island_keys_excluded_from_generated_columns() {
    let (grid, _, _) = setup();
    assert_eq!(field_names(&grid, &root()), vec!["ID", "ProductName"]);
}

#[test]
fn test_duplicate_sibling_key_rejected() {
    let (mut grid, _, _) = setup();
    let err = grid.add_island(None, RowIslandDef::new("childData")).unwrap_err();
    assert_eq!(
        err,
        GridError::DuplicateIslandKey {
            key: "childData".into()
        }
    );
    assert_eq!(grid.islands().len(), 2);
}

#[test]
fn test_find_and_resolve_island() {
    let (mut grid, first, second) = setup();
    assert_eq!(grid.find_island(None, "childData2"), Some(second));
    assert_eq!(grid.find_island(None, "orders"), None);
    assert_eq!(grid.resolve_island(&root().join(5, "childData")), Some(first));

    grid.expand(&root(), &id(0));
    let island = grid.island(first).unwrap();
    assert_eq!(island.instance_count(), 1);
    assert_eq!(island.key(), "childData");
}

// =============================================================================
// Runtime composition
// =============================================================================

#[test]
fn test_remove_island_destroys_instances() {
    let (mut grid, first, second) = setup();
    grid.expand(&root(), &id(0));
    grid.expand(&root(), &id(1));
    grid.flush();
    grid.drain_events();

    grid.remove_island(second).unwrap();
    grid.flush();
    assert_eq!(grid.child_grids(&root(), false).len(), 2);
    assert_eq!(grid.host().live_count(), 2);
    let destroyed = grid
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GridEvent::GridDestroyed(_)))
        .count();
    assert_eq!(destroyed, 2);
    assert!(grid.row_has_children(&root()));

    grid.remove_island(first).unwrap();
    grid.flush();
    assert!(grid.cache().is_empty());
    assert!(!grid.row_has_children(&root()));
    // expansion survives island removal, but there is nothing left to show
    assert!(grid.is_expanded(&root(), &id(0)));
    assert_eq!(grid.row_state(&root(), &id(0)), Some(RowExpansion::Collapsed));
}

#[test]
fn test_remove_unknown_island() {
    let (mut grid, _, second) = setup();
    grid.remove_island(second).unwrap();
    assert_eq!(
        grid.remove_island(second),
        Err(GridError::UnknownIsland(second))
    );
}

#[test]
fn test_re_adding_island_recreates_children() {
    let (mut grid, _, second) = setup();
    grid.expand(&root(), &id(2));
    grid.flush();

    grid.remove_island(second).unwrap();
    grid.flush();
    assert_eq!(grid.child_grids(&root(), false).len(), 1);

    let again = grid
        .add_island(None, RowIslandDef::new("childData2").with_primary_key("ID"))
        .unwrap();
    assert_ne!(again, second);
    grid.flush();

    let child = grid.child_grid(&root().join(2, "childData2")).unwrap();
    assert!(child.is_live());
    assert_eq!(child.controller.island(), Some(again));
    assert_eq!(field_names(&grid, &root()), vec!["ID", "ProductName"]);
}

#[test]
fn test_removing_island_restores_generated_column() {
    let (mut grid, _, second) = setup();
    grid.remove_island(second).unwrap();
    assert_eq!(
        field_names(&grid, &root()),
        vec!["ID", "ProductName", "childData2"]
    );
}

#[test]
fn test_nested_island_added_at_runtime() {
    let (mut grid, first, _) = setup();
    grid.expand(&root(), &id(0));
    grid.flush();

    let mut data = rows(3);
    data[0]["childData"][0]["lines"] = json!([{"ID": 9}]);
    grid.set_data(&root(), data);
    let child = root().join(0, "childData");
    grid.expand(&child, &id(0));
    grid.flush();
    assert!(grid.child_grids(&child, false).is_empty());

    let lines = grid
        .add_island(Some(first), RowIslandDef::new("lines").with_primary_key("ID"))
        .unwrap();
    grid.flush();
    let nested = grid.child_grid(&child.child(0, "lines")).unwrap();
    assert_eq!(nested.controller.island(), Some(lines));
    assert_eq!(nested.controller.row_count(), Some(1));
}

#[test]
fn test_stale_pending_child_discarded() {
    let (mut grid, first, _) = setup();
    grid.expand(&root(), &id(0));
    grid.remove_island(first).unwrap();
    let stats = grid.flush();
    assert!(stats.discarded >= 1);
    assert_eq!(grid.host().rendered_count(), 1);
    assert!(grid.child_grid(&root().join(0, "childData")).is_none());
}

#[test]
fn test_declarative_layout_from_json() {
    let def = RowIslandDef::from_json(
        r#"{
            "key": "childData",
            "options": {"height": "200px", "primary_key": "ID"},
            "islands": [{"key": "childData"}]
        }"#,
    )
    .unwrap();
    assert_eq!(def.children.len(), 1);

    let mut grid = HierarchicalGrid::new(GridConfig::default(), GridOptions::default());
    let id = grid.add_island(None, def).unwrap();
    assert_eq!(grid.islands().len(), 2);
    assert_eq!(grid.islands().children_of(Some(id)).len(), 1);
    assert!(RowIslandDef::from_json(r#"{"key": 5}"#).is_err());
}

// =============================================================================
// Option propagation
// =============================================================================

#[test]
fn test_island_columns_propagate() {
    let (mut grid, first, _) = setup();
    grid.expand(&root(), &id(0));
    grid.expand(&root(), &id(1));
    grid.flush();
    grid.drain_events();

    grid.set_island_columns(first, vec![Column::new("ID"), Column::new("ProductName")])
        .unwrap();
    for i in 0..2 {
        let path = root().join(i, "childData");
        assert_eq!(field_names(&grid, &path), vec!["ID", "ProductName"]);
        let (_, hosted) = grid.host().find(&path).unwrap();
        assert_eq!(hosted.columns, vec!["ID", "ProductName"]);
    }
    let changed = grid
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GridEvent::ColumnsChanged { .. }))
        .count();
    assert_eq!(changed, 2);

    // later instances use the template
    grid.expand(&root(), &id(2));
    assert_eq!(
        field_names(&grid, &root().join(2, "childData")),
        vec!["ID", "ProductName"]
    );
}

#[test]
fn test_island_columns_keep_runtime_state() {
    let (mut grid, first, _) = setup();
    grid.set_island_columns(first, vec![Column::new("ID"), Column::new("Col1")])
        .unwrap();
    grid.expand(&root(), &id(0));

    grid.set_island_columns(first, vec![Column::new("Col1").header("Renamed")])
        .unwrap();
    let child = grid.controller(&root().join(0, "childData")).unwrap();
    assert_eq!(child.columns().len(), 1);
    assert_eq!(child.columns()[0].column.header, "Renamed");
}

#[test]
fn test_column_presentation_changes_reach_host() {
    let (mut grid, first, _) = setup();
    grid.set_island_columns(first, vec![Column::new("ID"), Column::new("Col1")])
        .unwrap();
    grid.expand(&root(), &id(0));
    grid.flush();
    grid.drain_events();
    let child = root().join(0, "childData");
    let updates = grid.host().find(&child).unwrap().1.updates;

    grid.set_island_columns(
        first,
        vec![Column::new("ID"), Column::new("Col1").header("Renamed")],
    )
    .unwrap();
    let (_, hosted) = grid.host().find(&child).unwrap();
    assert_eq!(hosted.headers, vec!["ID", "Renamed"]);
    assert_eq!(hosted.updates, updates + 1);

    assert!(grid.set_columns(
        &child,
        vec![Column::new("Col1").header("Renamed"), Column::new("ID")]
    ));
    let (_, hosted) = grid.host().find(&child).unwrap();
    assert_eq!(hosted.columns, vec!["Col1", "ID"]);

    let events = grid.drain_events();
    assert!(matches!(
        &events[..],
        [
            GridEvent::ColumnsChanged { diff: renamed, .. },
            GridEvent::ColumnsChanged { diff: moved, .. },
        ] if renamed.changed == vec!["Col1".to_string()] && moved.reordered
    ));
}

#[test]
fn test_island_selection_mode_propagates() {
    let (mut grid, first, _) = setup();
    grid.expand(&root(), &id(0));
    let child = root().join(0, "childData");
    assert!(!grid.select_row(&child, &id(1)));

    grid.set_island_selection_mode(first, SelectionMode::Multiple)
        .unwrap();
    assert!(grid.select_row(&child, &id(1)));
    grid.drain_events();

    grid.set_island_selection_mode(first, SelectionMode::None)
        .unwrap();
    assert!(grid.selected_rows(&child).is_empty());
    let events = grid.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GridEvent::RowSelectionChanged { removed, .. } if removed == &vec![id(1)]
    )));
}

#[test]
fn test_island_expand_children_propagates() {
    let options = GridOptions::default().with_primary_key("ID");
    let mut grid = HierarchicalGrid::new(GridConfig::default(), options);
    let outer = grid
        .add_island(
            None,
            RowIslandDef::new("childData")
                .with_primary_key("ID")
                .with_island(RowIslandDef::new("lines")),
        )
        .unwrap();
    let mut data = rows(2);
    data[0]["childData"][0]["lines"] = json!([{"ID": 1}]);
    grid.set_data(&root(), data);
    grid.expand(&root(), &id(0));

    grid.set_island_expand_children(outer, true).unwrap();
    let child = root().join(0, "childData");
    assert!(grid.is_expanded(&child, &id(0)));
    assert_eq!(grid.child_grids(&child, false).len(), 2);
    assert!(grid.island(outer).unwrap().options.expand_children);
}

#[test]
fn test_setters_on_unknown_island() {
    let (mut grid, _, second) = setup();
    grid.remove_island(second).unwrap();
    assert!(grid.set_island_columns(second, Vec::new()).is_err());
    assert!(grid.set_island_expand_children(second, true).is_err());
}

// =============================================================================
// Listeners
// =============================================================================

#[test]
fn test_island_listener_sees_every_instance() {
    let (mut grid, first, _) = setup();
    let seen: Arc<Mutex<Vec<RowPath>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    grid.subscribe(
        ListenerScope::Island(first),
        Arc::new(move |event: &GridEvent| {
            if let GridEvent::CellClick { grid, .. } = event {
                sink.lock().unwrap().push(grid.path.clone());
            }
        }),
    );

    grid.expand(&root(), &id(0));
    grid.expand(&root(), &id(1));
    assert!(grid.cell_click(&root().join(0, "childData"), &id(1), "Col1"));
    assert!(grid.cell_click(&root().join(1, "childData"), &id(0), "Col1"));
    assert!(grid.cell_click(&root().join(1, "childData2"), &id(0), "Col2"));
    assert!(grid.cell_click(&root(), &id(0), "ID"));

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![root().join(0, "childData"), root().join(1, "childData")]
    );
}

#[test]
fn test_island_listener_dropped_with_island() {
    let (mut grid, _, second) = setup();
    let listener = grid.subscribe(ListenerScope::Island(second), Arc::new(|_: &GridEvent| {}));
    let global = grid.subscribe(ListenerScope::All, Arc::new(|_: &GridEvent| {}));
    grid.remove_island(second).unwrap();
    assert!(!grid.unsubscribe(listener));
    assert!(grid.unsubscribe(global));
}
