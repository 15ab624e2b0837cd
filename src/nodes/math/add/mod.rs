//! Addition node implementation
//!
//! - mod.rs: node metadata and factory implementation
//! - functions.rs: core computation logic

mod functions;

pub use functions::*;

use crate::constants::node_types;
use crate::error::NodeError;
use crate::nodes::data_type::DataType;
use crate::nodes::execution_engine::NodeContext;
use crate::nodes::factory::{NodeCategory, NodeFactory, NodeMetadata, PortDefinition};

/// Addition node that takes two numeric inputs and produces their sum
#[derive(Default)]
pub struct AddNodeFactory;

impl NodeFactory for AddNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::new(
            node_types::MATH_ADD,
            "Add",
            NodeCategory::math(),
            "Adds two numeric values together",
        )
        .with_inputs(vec![
            PortDefinition::required("A", DataType::Number),
            PortDefinition::required("B", DataType::Number),
        ])
        .with_outputs(vec![PortDefinition::required("Result", DataType::Number)])
    }

    fn execute(ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        execute_add(ctx)
    }
}
