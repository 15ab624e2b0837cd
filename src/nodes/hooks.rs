//! Node execution hooks
//!
//! Observers registered on the engine are told about every node behavior
//! invocation in the order the side effects happen.

use crate::error::ExecutionError;
use crate::nodes::interface::NodeData;
use crate::nodes::node::Node;

/// Trait for execution lifecycle observers
pub trait NodeExecutionHooks {
    /// Called before a node's behavior runs
    fn before_execution(&mut self, _node: &Node) {}

    /// Called after a node's behavior succeeded, with the values it produced
    fn after_execution(&mut self, _node: &Node, _outputs: &[(String, NodeData)]) {}

    /// Called when a run halts at a node
    fn on_failure(&mut self, _node: &Node, _error: &ExecutionError) {}
}

/// Hook that writes lifecycle events to the log
#[derive(Debug, Clone, Default)]
pub struct LoggingHooks;

impl NodeExecutionHooks for LoggingHooks {
    fn before_execution(&mut self, node: &Node) {
        log::debug!("Executing node {} ({})", node.id, node.title);
    }

    fn after_execution(&mut self, node: &Node, outputs: &[(String, NodeData)]) {
        log::debug!("Node {} produced {} output(s)", node.id, outputs.len());
    }

    fn on_failure(&mut self, node: &Node, error: &ExecutionError) {
        log::warn!("Node {} ({}) halted the build: {}", node.id, node.title, error);
    }
}
