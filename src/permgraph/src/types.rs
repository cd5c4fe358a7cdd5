//! Core type definitions

use serde::{Deserialize, Serialize};

/// Permission identifier (case-sensitive, non-empty, e.g. "edit", "alter_tags")
pub type PermissionId = String;

/// Outcome of a grant check, with the prerequisites that block it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantCheck {
    /// Permission that was asked for
    pub permission: PermissionId,

    /// Whether the permission can be granted on top of the held set
    pub allowed: bool,

    /// Direct prerequisites of `permission` that are not held (canonical order)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<PermissionId>,
}

/// Outcome of a revoke check, with the held permissions that depend on the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyCheck {
    /// Permission that was asked to be revoked
    pub permission: PermissionId,

    /// Whether revoking leaves every held permission with its prerequisites
    pub allowed: bool,

    /// Held permissions listing `permission` as a direct prerequisite (topological order)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<PermissionId>,
}
