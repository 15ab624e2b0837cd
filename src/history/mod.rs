//! Snapshot-based history for undo/redo.
//!
//! Every recorded edit stores a full snapshot of the graph together with the
//! selection at that moment. Undo and redo move a cursor over the stamps and
//! rebuild the live graph from the stamp under it.

use std::collections::VecDeque;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::constants::history::{DEFAULT_CAPACITY, INITIAL_STAMP_DESCRIPTION};
use crate::error::HistoryError;
use crate::nodes::factory::NodeRegistry;
use crate::nodes::graph::{NodeGraph, Selection};
use crate::nodes::serial::{deserialize, serialize, GraphSnapshot};

/// One recorded history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStamp {
    pub description: String,
    pub snapshot: GraphSnapshot,
    pub selection: Selection,
}

impl HistoryStamp {
    /// Capture the graph's current structure and selection
    pub fn capture(graph: &NodeGraph, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            snapshot: serialize(graph),
            selection: graph.selection().clone(),
        }
    }
}

/// Bounded linear undo stack.
///
/// `current_step` indexes the stamp that matches the live graph. Stamps after
/// it are the redo history and are dropped by the next recorded edit.
#[derive(Debug, Clone)]
pub struct GraphHistory {
    stamps: VecDeque<HistoryStamp>,
    current_step: usize,
    capacity: usize,
    enabled: bool,
}

impl GraphHistory {
    /// Creates an empty history keeping at most `capacity` stamps
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            stamps: VecDeque::with_capacity(capacity),
            current_step: 0,
            capacity,
            enabled: true,
        }
    }

    /// Records the graph's current state.
    ///
    /// No-op while recording is disabled.
    pub fn store(&mut self, graph: &mut NodeGraph, description: impl Into<String>, mark_modified: bool) {
        if !self.enabled {
            debug!("History disabled, not recording");
            return;
        }

        if !self.stamps.is_empty() {
            self.stamps.truncate(self.current_step + 1);
        }
        let stamp = HistoryStamp::capture(graph, description);
        debug!("Recording history stamp '{}'", stamp.description);
        self.stamps.push_back(stamp);
        while self.stamps.len() > self.capacity {
            self.stamps.pop_front();
        }
        self.current_step = self.stamps.len() - 1;

        if mark_modified {
            graph.set_modified(true);
        }
    }

    /// Starts a fresh history whose only stamp is the graph as it is now
    pub fn store_initial(&mut self, graph: &mut NodeGraph) {
        self.clear();
        self.store(graph, INITIAL_STAMP_DESCRIPTION, false);
    }

    /// Steps back one stamp. Returns false when there is nothing to undo.
    pub fn undo(&mut self, graph: &mut NodeGraph, registry: &NodeRegistry) -> Result<bool, HistoryError> {
        if !self.enabled {
            warn!("Cannot undo: history is disabled");
            return Ok(false);
        }
        if !self.can_undo() {
            warn!("Nothing to undo");
            return Ok(false);
        }

        let target = self.current_step - 1;
        let stamp = self.stamps[target].clone();
        self.restore(&stamp, graph, registry)?;
        self.current_step = target;
        debug!("Undid to '{}'", stamp.description);
        Ok(true)
    }

    /// Steps forward one stamp. Returns false when there is nothing to redo.
    pub fn redo(&mut self, graph: &mut NodeGraph, registry: &NodeRegistry) -> Result<bool, HistoryError> {
        if !self.enabled {
            warn!("Cannot redo: history is disabled");
            return Ok(false);
        }
        if !self.can_redo() {
            warn!("Nothing to redo");
            return Ok(false);
        }

        let target = self.current_step + 1;
        let stamp = self.stamps[target].clone();
        self.restore(&stamp, graph, registry)?;
        self.current_step = target;
        debug!("Redid '{}'", stamp.description);
        Ok(true)
    }

    /// Replaces the live graph with the stamp's state.
    ///
    /// Recording is suspended for the duration. On error the live graph is
    /// left as it was.
    pub fn restore(
        &mut self,
        stamp: &HistoryStamp,
        graph: &mut NodeGraph,
        registry: &NodeRegistry,
    ) -> Result<(), HistoryError> {
        let was_enabled = self.enabled;
        self.enabled = false;
        let rebuilt = deserialize(&stamp.snapshot, registry);
        let result = rebuilt.map(|restored| {
            graph.replace_contents(restored);
            graph.set_selection(&stamp.selection);
            graph.set_modified(true);
        });
        self.enabled = was_enabled;
        Ok(result?)
    }

    pub fn can_undo(&self) -> bool {
        !self.stamps.is_empty() && self.current_step > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_step + 1 < self.stamps.len()
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
        self.current_step = 0;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// The stamp matching the live graph
    pub fn current(&self) -> Option<&HistoryStamp> {
        self.stamps.get(self.current_step)
    }

    /// All stamps, oldest first
    pub fn stamps(&self) -> &VecDeque<HistoryStamp> {
        &self.stamps
    }
}

impl Default for GraphHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
