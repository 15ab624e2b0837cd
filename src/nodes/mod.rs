//! Node system - core data structures and the builtin node catalogue

// Core node system modules
pub mod cache;
pub mod data_type;
pub mod execution_engine;
pub mod factory;
pub mod graph;
pub mod hooks;
pub mod interface;
pub mod node;
pub mod port;
pub mod serial;

// Builtin node implementations
pub mod data;
pub mod flow;
pub mod math;
pub mod output;

use crate::error::GraphError;

// Re-export core types
pub use data_type::{is_compatible, DataType};
pub use graph::{Connection, GraphId, NodeConfig, NodeGraph, Selection};
pub use interface::NodeData;
pub use node::{Node, NodeId};
pub use port::{Port, PortDirection, PortId, SocketRef};

// Re-export factory types
pub use factory::{NodeBehavior, NodeCategory, NodeFactory, NodeMetadata, NodeRegistry, PortDefinition};

// Re-export execution engine types
pub use execution_engine::{
    CancellationToken, ExecutionReport, ExecutionState, NodeContext, NodeGraphEngine,
};
pub use hooks::{LoggingHooks, NodeExecutionHooks};
pub use serial::{deserialize, serialize, GraphSnapshot};

/// Register the builtin node catalogue, stopping at the first rejected type
pub fn register_builtin_nodes(registry: &mut NodeRegistry) -> Result<(), GraphError> {
    registry.register::<flow::BuildStartNodeFactory>()?;
    registry.register::<flow::BuildEndNodeFactory>()?;
    registry.register::<data::ConstantNumberNodeFactory>()?;
    registry.register::<data::ConstantIntegerNodeFactory>()?;
    registry.register::<data::ConstantStringNodeFactory>()?;
    registry.register::<math::AddNodeFactory>()?;
    registry.register::<output::PrintNodeFactory>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::node_types;

    #[test]
    fn test_builtin_catalogue() {
        let registry = NodeRegistry::with_builtin_nodes().unwrap();
        assert_eq!(registry.node_types().len(), 7);
        assert!(registry.is_entry_point(node_types::BUILD_START));
        assert!(!registry.is_entry_point(node_types::BUILD_END));
        assert_eq!(
            registry.nodes_in_category(&NodeCategory::math()),
            vec![node_types::MATH_ADD]
        );
    }

    #[test]
    fn test_registering_twice_is_an_error() {
        let mut registry = NodeRegistry::with_builtin_nodes().unwrap();
        assert!(matches!(
            register_builtin_nodes(&mut registry),
            Err(GraphError::InvalidNodeDefinition { .. })
        ));
        assert_eq!(registry.node_types().len(), 7);
    }
}
