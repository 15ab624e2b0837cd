//! Terminal node that reports a finished build to the host

use crate::constants::node_types;
use crate::error::NodeError;
use crate::nodes::execution_engine::NodeContext;
use crate::nodes::factory::{NodeCategory, NodeFactory, NodeMetadata, PortDefinition};
use crate::nodes::interface::NodeData;

#[derive(Default)]
pub struct BuildEndNodeFactory;

impl NodeFactory for BuildEndNodeFactory {
    fn metadata() -> NodeMetadata {
        let mut metadata = NodeMetadata::new(
            node_types::BUILD_END,
            "Build End",
            NodeCategory::flow(),
            "Finishes the build and notifies the scene",
        )
        .with_inputs(vec![PortDefinition::exec()])
        .with_unique(true);
        metadata.is_exec = true;
        metadata
    }

    fn execute(ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        let asset = ctx
            .scene()
            .current_asset()
            .map(|asset| NodeData::String(asset.to_string()));
        let args: Vec<NodeData> = asset.into_iter().collect();
        ctx.scene().execute("build_complete", &args)?;
        Ok(())
    }
}
