//! Constant value nodes
//!
//! Each constant publishes its `value` parameter on the `Value` output.

use crate::constants::node_types;
use crate::error::NodeError;
use crate::nodes::data_type::DataType;
use crate::nodes::execution_engine::NodeContext;
use crate::nodes::factory::{NodeCategory, NodeFactory, NodeMetadata, PortDefinition};
use crate::nodes::interface::NodeData;

fn constant_metadata(
    node_type: &'static str,
    display_name: &'static str,
    data_type: DataType,
    default: NodeData,
) -> NodeMetadata {
    NodeMetadata::new(
        node_type,
        display_name,
        NodeCategory::new(&["Data", "Source"]),
        "Outputs the value stored in its parameter",
    )
    .with_outputs(vec![PortDefinition::required("Value", data_type)])
    .with_parameter("value", default)
}

/// Publish the `value` parameter
fn emit_value(ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
    let value = ctx
        .parameter("value")
        .cloned()
        .ok_or_else(|| NodeError::Failed("constant has no 'value' parameter".to_string()))?;
    ctx.set_output("Value", value)
}

#[derive(Default)]
pub struct ConstantNumberNodeFactory;

impl NodeFactory for ConstantNumberNodeFactory {
    fn metadata() -> NodeMetadata {
        constant_metadata(
            node_types::CONSTANT_NUMBER,
            "Number",
            DataType::Number,
            NodeData::Number(0.0),
        )
    }

    fn execute(ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        emit_value(ctx)
    }
}

#[derive(Default)]
pub struct ConstantIntegerNodeFactory;

impl NodeFactory for ConstantIntegerNodeFactory {
    fn metadata() -> NodeMetadata {
        constant_metadata(
            node_types::CONSTANT_INTEGER,
            "Integer",
            DataType::Integer,
            NodeData::Integer(0),
        )
    }

    fn execute(ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        emit_value(ctx)
    }
}

#[derive(Default)]
pub struct ConstantStringNodeFactory;

impl NodeFactory for ConstantStringNodeFactory {
    fn metadata() -> NodeMetadata {
        constant_metadata(
            node_types::CONSTANT_STRING,
            "String",
            DataType::String,
            NodeData::String(String::new()),
        )
    }

    fn execute(ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        emit_value(ctx)
    }
}
