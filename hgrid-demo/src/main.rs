use std::collections::BTreeMap;
use std::error::Error;
use std::fs::File;

use hgrid::{
    DisplayDensity, Extent, GridCommand, GridConfig, GridOptions, HierarchicalGrid, HostHandle,
    RenderHost, RenderRequest, RowId, RowIslandDef, RowPath, SelectionMode,
};
use log::info;
use serde_json::{Value, json};
use simplelog::{Config, LevelFilter, WriteLogger};

const LAYOUT: &str = r#"{
    "key": "orders",
    "options": {"height": "200px", "primary_key": "OrderID", "selection_mode": "multiple"},
    "islands": [
        {"key": "lines", "options": {"primary_key": "LineID"}}
    ]
}"#;

/// Host printing what it is asked to draw.
struct ConsoleHost {
    next: u64,
    live: BTreeMap<HostHandle, String>,
}

impl ConsoleHost {
    fn new() -> Self {
        Self {
            next: 0,
            live: BTreeMap::new(),
        }
    }
}

impl RenderHost for ConsoleHost {
    fn render(&mut self, request: &RenderRequest<'_>) -> HostHandle {
        let handle = HostHandle(self.next);
        self.next += 1;
        let indent = "  ".repeat(request.path.depth());
        println!(
            "{}+ {} at {} ({} rows, height {:?}, width {:?}, chunk {})",
            indent,
            request.grid,
            request.path,
            request.row_count,
            request.geometry.calc_height,
            request.geometry.calc_width,
            request.geometry.chunk_size,
        );
        self.live.insert(handle, request.path.to_string());
        handle
    }

    fn destroy(&mut self, handle: HostHandle) {
        if let Some(path) = self.live.remove(&handle) {
            println!("- {}", path);
        }
    }

    fn update(&mut self, _handle: HostHandle, request: &RenderRequest<'_>) {
        println!(
            "~ {} extent {} height {:?}",
            request.path, request.geometry.total_extent, request.geometry.calc_height
        );
    }

    fn container_extent(&self) -> Option<Extent> {
        Some(Extent::new(1200, 800))
    }
}

fn customers() -> Vec<Value> {
    (1..=4)
        .map(|c| {
            let orders: Vec<Value> = (1..=3)
                .map(|o| {
                    let lines: Vec<Value> = (1..=2)
                        .map(|l| json!({"LineID": l, "Product": format!("P{c}{o}{l}"), "Qty": l * 2}))
                        .collect();
                    json!({"OrderID": c * 100 + o, "Total": o * 10, "lines": lines})
                })
                .collect();
            json!({"CustomerID": c, "Name": format!("Customer {c}"), "orders": orders})
        })
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    let log_file = File::create("hgrid-demo.log")?;
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)?;

    let config = GridConfig::default().with_density(DisplayDensity::Cosy);
    let options = GridOptions::default()
        .with_primary_key("CustomerID")
        .with_selection_mode(SelectionMode::Single);
    let mut grid = HierarchicalGrid::with_host(config, options, ConsoleHost::new());

    let orders = grid.add_island(None, RowIslandDef::from_json(LAYOUT)?)?;
    let root = RowPath::root();
    grid.set_data(&root, customers());
    grid.flush();

    println!("-- expand customers 1 and 3");
    grid.expand(&root, &RowId::from(1));
    grid.expand(&root, &RowId::from(3));
    grid.flush();

    println!("-- expand order 101, collapse customer 3");
    let customer_one = root.child(1, "orders");
    grid.schedule(GridCommand::Expand {
        path: customer_one.clone(),
        row: RowId::from(101),
    });
    grid.schedule(GridCommand::Collapse {
        path: root.clone(),
        row: RowId::from(3),
    });
    let stats = grid.flush();
    info!("Flush applied {} and discarded {}", stats.applied, stats.discarded);

    println!("-- orders island to 50%");
    grid.set_island_height(orders, "50%".parse()?)?;
    grid.flush();

    grid.select_row(&customer_one, &RowId::from(102));
    grid.cell_click(&customer_one, &RowId::from(102), "Total");
    for event in grid.drain_events() {
        info!("{:?}", event);
    }

    println!(
        "-- {} child grid(s) cached, root extent {}",
        grid.child_grids(&root, true).len(),
        grid.geometry(&root).map(|g| g.total_extent).unwrap_or(0)
    );
    grid.destroy();
    Ok(())
}
