//! Output cache for a single build run
//!
//! Pull evaluation stores every value a node produces here, keyed by the
//! producing output socket, so a producer feeding several consumers is
//! evaluated at most once per run.

use std::collections::{HashMap, HashSet};

use crate::nodes::interface::NodeData;
use crate::nodes::node::NodeId;
use crate::nodes::port::PortId;

/// Identifies one produced output value
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct CacheKey {
    /// The node that produced this cached data
    pub node_id: NodeId,
    /// Output port index
    pub port_index: PortId,
}

impl CacheKey {
    pub fn new(node_id: NodeId, port_index: PortId) -> Self {
        Self { node_id, port_index }
    }
}

/// Statistics about cache usage during a run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStatistics {
    pub total_entries: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl CacheStatistics {
    /// Calculate cache hit ratio
    pub fn hit_ratio(&self) -> f32 {
        let total_accesses = self.cache_hits + self.cache_misses;
        if total_accesses == 0 {
            0.0
        } else {
            self.cache_hits as f32 / total_accesses as f32
        }
    }
}

/// Memo table of output values for one run
#[derive(Debug, Default)]
pub struct RunCache {
    cache: HashMap<CacheKey, NodeData>,
    /// Nodes whose behavior already ran, including those with no outputs
    produced: HashSet<NodeId>,
    stats: CacheStatistics,
}

impl RunCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a node's behavior ran and store all values it produced
    pub fn store_outputs(&mut self, node_id: NodeId, outputs: Vec<(PortId, NodeData)>) {
        self.produced.insert(node_id);
        for (port, data) in outputs {
            if self.cache.insert(CacheKey::new(node_id, port), data).is_none() {
                self.stats.total_entries += 1;
            }
        }
    }

    /// Look up a value, counting hits and misses
    pub fn get(&mut self, key: &CacheKey) -> Option<&NodeData> {
        if self.cache.contains_key(key) {
            self.stats.cache_hits += 1;
        } else {
            self.stats.cache_misses += 1;
        }
        self.cache.get(key)
    }

    /// Look up a value without touching the statistics
    pub fn peek(&self, key: &CacheKey) -> Option<&NodeData> {
        self.cache.get(key)
    }

    /// Whether the node's behavior already ran in this run
    pub fn has_produced(&self, node_id: NodeId) -> bool {
        self.produced.contains(&node_id)
    }

    pub fn get_statistics(&self) -> &CacheStatistics {
        &self.stats
    }
}
