//! Entry node of every build graph

use log::info;

use crate::constants::node_types;
use crate::error::NodeError;
use crate::nodes::execution_engine::NodeContext;
use crate::nodes::factory::{NodeCategory, NodeFactory, NodeMetadata};

/// Where the exec chain begins. At most one per graph.
#[derive(Default)]
pub struct BuildStartNodeFactory;

impl NodeFactory for BuildStartNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::entry(
            node_types::BUILD_START,
            "Build Start",
            NodeCategory::flow(),
            "Starts the build; optionally selects the asset being built",
        )
    }

    fn execute(ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        let asset = ctx
            .parameter("asset")
            .and_then(|value| value.as_str())
            .map(str::to_string);
        if let Some(asset) = asset {
            info!("Building asset {}", asset);
            ctx.scene().set_current_asset(Some(asset));
        }
        Ok(())
    }
}
