//! Graph definition files
//!
//! A graph file declares every permission with its direct prerequisites:
//!
//! ```toml
//! [permissions]
//! view = []
//! edit = ["view"]
//! delete = ["edit"]
//! ```
//!
//! The same table is accepted as JSON (`{"permissions": {"view": [], ...}}`)
//! when the file name ends in `.json`.

use crate::error::{PermissionError, Result};
use crate::graph::DependencyGraph;
use crate::types::PermissionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Declarative prerequisite mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GraphConfig {
    /// Permission -> direct prerequisites
    #[serde(default)]
    pub permissions: BTreeMap<PermissionId, Vec<PermissionId>>,
}

impl GraphConfig {
    /// Load a graph definition, choosing the format from the file extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        debug!(path = %path.display(), json = is_json, "Loading permission graph definition");

        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    /// Parse a TOML graph definition
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| PermissionError::Config(e.to_string()))
    }

    /// Parse a JSON graph definition
    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| PermissionError::Config(e.to_string()))
    }

    /// Build the dependency graph described by this definition
    pub fn build(self) -> Result<DependencyGraph> {
        DependencyGraph::new(self.permissions)
    }
}
