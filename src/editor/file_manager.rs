//! File management for build graphs
//!
//! Handles saving and loading and remembers which file is open. Unsaved
//! changes are tracked by the graph itself. The graph part of a file is a
//! [`GraphSnapshot`], so saving the same graph twice yields the same graph
//! section.

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::constants::file;
use crate::error::FileError;
use crate::nodes::graph::NodeGraph;
use crate::nodes::serial::{serialize, GraphSnapshot};

/// Save file data structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: String,
    pub metadata: SaveMetadata,
    pub graph: GraphSnapshot,
}

/// Metadata for save files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub created: String,  // RFC 3339 timestamp
    pub modified: String, // RFC 3339 timestamp
    pub creator: String,
    pub description: String,
}

/// Manages the file backing the open graph
#[derive(Debug, Default)]
pub struct FileManager {
    /// Current file path (None if unsaved/new file)
    current_file_path: Option<PathBuf>,
    /// Creation time of the open file, kept across saves
    created: Option<String>,
}

impl FileManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_file_path(&self) -> Option<&PathBuf> {
        self.current_file_path.as_ref()
    }

    /// Get display name for the current file, starred when `modified`
    pub fn get_file_display_name(&self, modified: bool) -> String {
        let file_name = match &self.current_file_path {
            Some(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("Unknown")
                .to_string(),
            None => "Untitled".to_string(),
        };
        if modified {
            format!("{}*", file_name)
        } else {
            file_name
        }
    }

    /// Create a new file (reset state)
    pub fn new_file(&mut self) {
        self.current_file_path = None;
        self.created = None;
    }

    /// Save the graph to a file
    pub fn save_to_file(&mut self, file_path: &Path, graph: &NodeGraph) -> Result<(), FileError> {
        let now = chrono::Utc::now().to_rfc3339();
        let created = match (&self.created, &self.current_file_path) {
            (Some(created), Some(path)) if path == file_path => created.clone(),
            _ => now.clone(),
        };
        let save_data = SaveData {
            version: file::FORMAT_VERSION.to_string(),
            metadata: SaveMetadata {
                created: created.clone(),
                modified: now,
                creator: file::CREATOR.to_string(),
                description: "Build graph created with rigflow".to_string(),
            },
            graph: serialize(graph),
        };

        let json_content = serde_json::to_string_pretty(&save_data)?;
        std::fs::write(file_path, json_content)?;
        info!("Saved graph to {}", file_path.display());

        self.current_file_path = Some(file_path.to_path_buf());
        self.created = Some(created);
        Ok(())
    }

    /// Save to the current path
    pub fn save_file(&mut self, graph: &NodeGraph) -> Result<(), FileError> {
        match self.current_file_path.clone() {
            Some(path) => self.save_to_file(&path, graph),
            None => Err(FileError::NoFilePath),
        }
    }

    /// Point the manager at a file that was just read successfully
    pub fn set_opened(&mut self, file_path: &Path, created: String) {
        info!("Opened {}", file_path.display());
        self.current_file_path = Some(file_path.to_path_buf());
        self.created = Some(created);
    }

    /// Parse a save file without touching the manager's state
    pub fn read_save_data(file_path: &Path) -> Result<SaveData, FileError> {
        let file_content = std::fs::read_to_string(file_path)?;
        let save_data: SaveData = serde_json::from_str(&file_content)?;
        if !file::SUPPORTED_VERSIONS.contains(&save_data.version.as_str()) {
            return Err(FileError::UnsupportedVersion(save_data.version));
        }
        Ok(save_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::node_types;
    use crate::nodes::factory::NodeRegistry;
    use crate::nodes::graph::NodeConfig;
    use tempfile::TempDir;

    fn graph() -> NodeGraph {
        let registry = NodeRegistry::with_builtin_nodes().unwrap();
        let mut graph = NodeGraph::new();
        graph
            .add_node(&registry, node_types::BUILD_START, NodeConfig::new())
            .unwrap();
        graph
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rig.json");
        let graph = graph();

        let mut manager = FileManager::new();
        manager.save_to_file(&path, &graph).unwrap();
        assert_eq!(manager.get_file_display_name(false), "rig.json");
        assert_eq!(manager.get_file_display_name(true), "rig.json*");

        let data = FileManager::read_save_data(&path).unwrap();
        assert_eq!(data.graph, serialize(&graph));
        let mut other = FileManager::new();
        other.set_opened(&path, data.metadata.created.clone());
        assert_eq!(other.current_file_path(), Some(&path));
        assert!(chrono::DateTime::parse_from_rfc3339(&data.metadata.created).is_ok());
    }

    #[test]
    fn test_saved_graph_section_is_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rig.json");
        let graph = graph();
        let mut manager = FileManager::new();

        manager.save_to_file(&path, &graph).unwrap();
        let first = FileManager::read_save_data(&path).unwrap();
        manager.save_file(&graph).unwrap();
        let second = FileManager::read_save_data(&path).unwrap();

        assert_eq!(first.graph, second.graph);
        assert_eq!(first.metadata.created, second.metadata.created);
    }

    #[test]
    fn test_unsupported_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rig.json");
        let mut manager = FileManager::new();
        manager.save_to_file(&path, &graph()).unwrap();

        let mut data = FileManager::read_save_data(&path).unwrap();
        data.version = "9.9".into();
        std::fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();

        assert!(matches!(
            FileManager::read_save_data(&path),
            Err(FileError::UnsupportedVersion(v)) if v == "9.9"
        ));
    }

    #[test]
    fn test_save_without_path() {
        let mut manager = FileManager::new();
        assert!(matches!(manager.save_file(&graph()), Err(FileError::NoFilePath)));
        assert_eq!(manager.get_file_display_name(true), "Untitled*");
        manager.new_file();
        assert_eq!(manager.get_file_display_name(false), "Untitled");
    }
}
