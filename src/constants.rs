//! Application-wide constants and default values
//!
//! Centralized location for all hard-coded values to improve maintainability

/// History engine constants
pub mod history {
    /// Number of stamps kept before the oldest one is evicted
    pub const DEFAULT_CAPACITY: usize = 32;

    /// Description of the stamp recorded when a graph is created or loaded
    pub const INITIAL_STAMP_DESCRIPTION: &str = "Graph created";
}

/// Persisted graph file constants
pub mod file {
    /// Version written into every save file
    pub const FORMAT_VERSION: &str = "1.0";

    /// Versions this build can read
    pub const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

    /// Creator string stored in save metadata
    pub const CREATOR: &str = "rigflow 0.1";

    /// Extension used for build graph files
    pub const EXTENSION: &str = "json";
}

/// Configuration file location
pub mod config {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "rigflow";

    /// Config file name
    pub const FILE_NAME: &str = "config.json";

    /// Default log filter when `RUST_LOG` is not set
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

/// Builtin node type identifiers
pub mod node_types {
    pub const BUILD_START: &str = "Build_Start";
    pub const BUILD_END: &str = "Build_End";
    pub const CONSTANT_NUMBER: &str = "Constant_Number";
    pub const CONSTANT_INTEGER: &str = "Constant_Integer";
    pub const CONSTANT_STRING: &str = "Constant_String";
    pub const MATH_ADD: &str = "Math_Add";
    pub const OUTPUT_PRINT: &str = "Output_Print";
}
