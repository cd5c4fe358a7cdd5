//! # CretoAI Permission Dependency Graph
//!
//! Decides whether a permission may be granted to, or revoked from, a
//! subject given a fixed graph of permission prerequisites (`edit` requires
//! `view`, `delete` requires `edit`, ...). The caller supplies the set of
//! permissions the subject currently holds; nothing is persisted here.
//!
//! ## Features
//!
//! - **Canonical construction**: prerequisite lists are deduplicated and sorted
//! - **Cycle detection**: three-color DFS reporting the offending path
//! - **Deterministic ordering**: stable topological order, cached at construction
//! - **Held-set validation**: rejects sets holding a permission without its prerequisites
//! - **Grant / revoke decisions**: with the blocking permissions attached
//!
//! ## Example
//!
//! ```rust
//! use cretoai_permgraph::DependencyGraphBuilder;
//!
//! # fn main() -> Result<(), cretoai_permgraph::PermissionError> {
//! let graph = DependencyGraphBuilder::new()
//!     .permission("view", Vec::<String>::new())
//!     .permission("edit", ["view"])
//!     .permission("alter_tags", ["edit"])
//!     .build()?;
//!
//! assert!(graph.can_grant(&["view"], "edit")?);
//! assert!(!graph.can_grant(&["view"], "alter_tags")?);
//! assert!(!graph.can_deny(&["view", "edit"], "view")?);
//!
//! let check = graph.check_grant(&["view"], "alter_tags")?;
//! assert_eq!(check.missing, ["edit"]);
//! # Ok(())
//! # }
//! ```

pub mod types;
pub mod graph;
pub mod decision;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use types::{PermissionId, GrantCheck, DenyCheck};
pub use graph::{DependencyGraph, DependencyGraphBuilder};
pub use config::GraphConfig;
pub use error::{PermissionError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
