//! Print node implementation
//!
//! An exec step that sends a message, and optionally a number, to the host
//! scene's `print` command.

mod functions;

pub use functions::*;

use log::info;

use crate::constants::node_types;
use crate::error::NodeError;
use crate::nodes::data_type::DataType;
use crate::nodes::execution_engine::NodeContext;
use crate::nodes::factory::{NodeCategory, NodeFactory, NodeMetadata, PortDefinition};
use crate::nodes::interface::NodeData;

#[derive(Default)]
pub struct PrintNodeFactory;

impl NodeFactory for PrintNodeFactory {
    fn metadata() -> NodeMetadata {
        NodeMetadata::exec_step(
            node_types::OUTPUT_PRINT,
            "Print",
            NodeCategory::output(),
            "Prints a message to the host scene log",
        )
        .with_inputs(vec![
            PortDefinition::required("Message", DataType::String),
            PortDefinition::optional("Value", DataType::Number),
        ])
    }

    fn execute(ctx: &mut NodeContext<'_>) -> Result<(), NodeError> {
        let message = ctx.input_str("Message")?.to_string();
        let value = ctx.input("Value").cloned();
        info!("{}", format_message(&message, value.as_ref()));

        let mut args = vec![NodeData::String(message)];
        args.extend(value);
        ctx.scene().execute("print", &args)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RecordingScene;

    #[test]
    fn test_print_metadata() {
        let metadata = PrintNodeFactory::metadata();
        let names: Vec<_> = metadata.inputs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Exec", "Message", "Value"]);
        assert!(metadata.inputs[2].optional);
        assert!(metadata.validate().is_ok());
    }

    #[test]
    fn test_print_sends_message_and_value() {
        let node = PrintNodeFactory::create(1);
        let variables = Default::default();
        let mut scene = RecordingScene::new();
        let mut ctx = NodeContext::new(
            &node,
            vec![None, Some(NodeData::String("width".into())), Some(NodeData::Number(2.0))],
            &variables,
            &mut scene,
        );
        PrintNodeFactory::execute(&mut ctx).unwrap();

        assert_eq!(scene.count("print"), 1);
        assert_eq!(
            scene.commands()[0].args,
            vec![NodeData::String("width".into()), NodeData::Number(2.0)]
        );
    }

    #[test]
    fn test_print_without_message_fails() {
        let node = PrintNodeFactory::create(1);
        let variables = Default::default();
        let mut scene = RecordingScene::new();
        let mut ctx = NodeContext::new(&node, vec![None, None, None], &variables, &mut scene);
        assert_eq!(
            PrintNodeFactory::execute(&mut ctx),
            Err(NodeError::MissingInput("Message".into()))
        );
    }
}
