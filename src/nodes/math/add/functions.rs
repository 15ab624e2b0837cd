//! Core computation logic for addition node

use crate::error::NodeError;
use crate::nodes::execution_engine::NodeContext;
use crate::nodes::interface::NodeData;

/// Sum two numbers
pub fn process_add(a: f64, b: f64) -> f64 {
    a + b
}

/// Behavior of the addition node
pub fn execute_add(ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
    let a = ctx.input_number("A")?;
    let b = ctx.input_number("B")?;
    ctx.set_output("Result", NodeData::Number(process_add(a, b)))
}
