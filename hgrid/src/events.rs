//! Grid events and listener dispatch.
//!
//! Events always carry the grid they originate from, so a listener attached
//! to a row island can tell which of the island's instances fired.

use std::collections::VecDeque;
use std::sync::Arc;

use log::trace;
use serde_json::Value;

use crate::column::ColumnDiff;
use crate::controller::GridId;
use crate::island::IslandId;
use crate::path::{RowId, RowPath};

/// Events kept for [`EventBus::drain`] before the oldest are dropped.
const QUEUE_LIMIT: usize = 4096;

// =============================================================================
// Events
// =============================================================================

/// Reference to the grid an event originates from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRef {
    pub grid: GridId,
    pub path: RowPath,
    /// Island the grid was created from (`None` for the root grid).
    pub island: Option<IslandId>,
}

/// Events emitted by a hierarchical grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// A child grid was rendered by the host.
    GridCreated(GridRef),
    /// A rendered child grid was released by the host.
    GridDestroyed(GridRef),
    /// A row was expanded or collapsed.
    RowToggled {
        grid: GridRef,
        row: RowId,
        expanded: bool,
    },
    /// A cell was clicked.
    CellClick {
        grid: GridRef,
        row: RowId,
        field: String,
        value: Value,
    },
    /// Row selection changed.
    RowSelectionChanged {
        grid: GridRef,
        added: Vec<RowId>,
        removed: Vec<RowId>,
    },
    /// Columns were added or removed.
    ColumnsChanged { grid: GridRef, diff: ColumnDiff },
}

impl GridEvent {
    /// The grid that fired the event.
    pub fn source(&self) -> &GridRef {
        match self {
            GridEvent::GridCreated(grid) | GridEvent::GridDestroyed(grid) => grid,
            GridEvent::RowToggled { grid, .. }
            | GridEvent::CellClick { grid, .. }
            | GridEvent::RowSelectionChanged { grid, .. }
            | GridEvent::ColumnsChanged { grid, .. } => grid,
        }
    }
}

// =============================================================================
// Listeners
// =============================================================================

/// A listener closure.
pub type Listener = Arc<dyn Fn(&GridEvent) + Send + Sync>;

/// Which events a listener receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope {
    /// Every event of every level.
    All,
    /// Events of any instance of one island.
    Island(IslandId),
}

impl ListenerScope {
    fn matches(&self, event: &GridEvent) -> bool {
        match self {
            ListenerScope::All => true,
            ListenerScope::Island(id) => event.source().island == Some(*id),
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

/// Dispatches events to listeners and queues them for polling.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(ListenerId, ListenerScope, Listener)>,
    queue: VecDeque<GridEvent>,
    next_id: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, scope: ListenerScope, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, scope, listener));
        id
    }

    /// Returns false if the listener was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Drop the listeners scoped to any of the given islands.
    pub fn remove_island_listeners(&mut self, islands: &[IslandId]) {
        self.listeners.retain(|(_, scope, _)| match scope {
            ListenerScope::Island(id) => !islands.contains(id),
            ListenerScope::All => true,
        });
    }

    /// Dispatch an event to matching listeners and queue it.
    pub fn emit(&mut self, event: GridEvent) {
        trace!("Event from {}: {:?}", event.source().path, event);
        for (_, scope, listener) in &self.listeners {
            if scope.matches(&event) {
                listener(&event);
            }
        }
        if self.queue.len() == QUEUE_LIMIT {
            self.queue.pop_front();
        }
        self.queue.push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<GridEvent> {
        self.queue.drain(..).collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
