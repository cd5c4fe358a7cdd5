//! Error types for the permission dependency graph

use thiserror::Error;

/// Permission graph errors
#[derive(Debug, Error)]
pub enum PermissionError {
    /// The prerequisite mapping contains a dependency cycle
    #[error("Circular dependency detected at '{permission}': {}", .path.join(" -> "))]
    Cycle {
        /// A permission that lies on the cycle
        permission: String,
        /// The cycle, closed on the first element (`a -> b -> a`)
        path: Vec<String>,
    },

    /// A referenced permission was never declared
    #[error("Unknown permission '{permission}'{}", .required_by.as_ref().map(|r| format!(" (required by '{}')", r)).unwrap_or_default())]
    UnknownPermission {
        permission: String,
        /// Declared permission that references it, when raised during construction
        required_by: Option<String>,
    },

    /// The held set contains a permission whose prerequisite is not held
    #[error("Invalid base permissions: '{permission}' is held without its prerequisite '{missing}'")]
    InvalidBasePermissions { permission: String, missing: String },

    /// Malformed permission identifier
    #[error("Invalid permission: {0}")]
    InvalidPermission(String),

    /// Permission declared more than once in the raw mapping
    #[error("Duplicate permission: {0}")]
    DuplicatePermission(String),

    /// Graph definition could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PermissionError {
    pub(crate) fn unknown(permission: impl Into<String>) -> Self {
        Self::UnknownPermission {
            permission: permission.into(),
            required_by: None,
        }
    }
}

/// Result type for permission graph operations
pub type Result<T> = std::result::Result<T, PermissionError>;
