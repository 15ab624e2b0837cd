//! Host scene collaborator
//!
//! Node behaviors never reach for global state. Whatever they read from or do
//! to the host application goes through a [`HostScene`] handed to them by the
//! execution engine.

use log::debug;

use crate::error::HostError;
use crate::nodes::interface::NodeData;

/// The external scene a build mutates
pub trait HostScene {
    /// Run a side-effecting command in the host
    fn execute(&mut self, command: &str, args: &[NodeData]) -> Result<Option<NodeData>, HostError>;

    /// The asset the build is working on, if any
    fn current_asset(&self) -> Option<&str>;

    fn set_current_asset(&mut self, asset: Option<String>);
}

/// One command received by a [`RecordingScene`]
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCommand {
    pub command: String,
    pub args: Vec<NodeData>,
}

/// In-memory scene that records every command it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    commands: Vec<SceneCommand>,
    current_asset: Option<String>,
    failing_command: Option<String>,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `command` fail
    pub fn failing_on(mut self, command: impl Into<String>) -> Self {
        self.failing_command = Some(command.into());
        self
    }

    pub fn commands(&self) -> &[SceneCommand] {
        &self.commands
    }

    /// Number of recorded calls to one command
    pub fn count(&self, command: &str) -> usize {
        self.commands.iter().filter(|c| c.command == command).count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl HostScene for RecordingScene {
    fn execute(&mut self, command: &str, args: &[NodeData]) -> Result<Option<NodeData>, HostError> {
        if self.failing_command.as_deref() == Some(command) {
            return Err(HostError::new(command, "command rejected by scene"));
        }
        debug!("Scene command {} {:?}", command, args);
        self.commands.push(SceneCommand {
            command: command.to_string(),
            args: args.to_vec(),
        });
        Ok(None)
    }

    fn current_asset(&self) -> Option<&str> {
        self.current_asset.as_deref()
    }

    fn set_current_asset(&mut self, asset: Option<String>) {
        self.current_asset = asset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_are_recorded_in_order() {
        let mut scene = RecordingScene::new();
        scene.execute("create_joint", &[NodeData::String("hip".into())]).unwrap();
        scene.execute("parent", &[]).unwrap();

        assert_eq!(scene.commands().len(), 2);
        assert_eq!(scene.commands()[0].command, "create_joint");
        assert_eq!(scene.count("parent"), 1);
    }

    #[test]
    fn test_failing_command() {
        let mut scene = RecordingScene::new().failing_on("parent");
        let err = scene.execute("parent", &[]).unwrap_err();
        assert_eq!(err.command, "parent");
        assert!(scene.commands().is_empty());
    }

    #[test]
    fn test_current_asset() {
        let mut scene = RecordingScene::new();
        assert_eq!(scene.current_asset(), None);
        scene.set_current_asset(Some("biped".into()));
        assert_eq!(scene.current_asset(), Some("biped"));
    }
}
