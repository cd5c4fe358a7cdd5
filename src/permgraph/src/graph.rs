//! Permission dependency graph with DFS topological ordering
//!
//! The graph is built once from a complete prerequisite mapping and never
//! changes afterwards. Construction:
//! 1. Canonicalizes every prerequisite list (deduplicated, lexicographic)
//! 2. Rejects prerequisites that are not declared permissions
//! 3. Runs a three-color depth-first traversal that both detects cycles and
//!    produces the topological order cached for the graph's lifetime

use crate::error::{PermissionError, Result};
use crate::types::PermissionId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// DFS marking; absent from the map means unvisited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path (gray)
    Visiting,
    /// Fully processed, already emitted (black)
    Done,
}

/// Immutable graph of permission prerequisites
///
/// Every prerequisite is itself a declared permission and the graph is
/// acyclic; both are checked at construction. The graph is `Send + Sync`
/// and cheap to clone, so a single instance can back any number of
/// concurrent decision calls.
///
/// # Example
///
/// ```rust
/// use cretoai_permgraph::DependencyGraph;
///
/// let graph = DependencyGraph::new([
///     ("view", vec![]),
///     ("edit", vec!["view"]),
///     ("delete", vec!["edit"]),
/// ])?;
///
/// assert_eq!(graph.topological_order(), ["view", "edit", "delete"]);
/// assert!(graph.can_grant(&["view"], "edit")?);
/// assert!(!graph.can_deny(&["view", "edit"], "view")?);
/// # Ok::<(), cretoai_permgraph::PermissionError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Permission -> sorted, duplicate-free direct prerequisites
    prerequisites: BTreeMap<PermissionId, Vec<PermissionId>>,

    /// Every permission, each after all of its transitive prerequisites
    order: Arc<[PermissionId]>,
}

impl DependencyGraph {
    /// Build a graph from a raw prerequisite mapping
    ///
    /// Accepts anything iterable as `(permission, prerequisites)` pairs, e.g.
    /// a `HashMap<String, Vec<String>>` or an array of `(&str, Vec<&str>)`.
    ///
    /// # Errors
    ///
    /// - `InvalidPermission` if any identifier is empty
    /// - `DuplicatePermission` if a permission is declared twice
    /// - `UnknownPermission` if a prerequisite is not declared
    /// - `Cycle` if a permission transitively requires itself
    pub fn new<I, K, V, P>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PermissionId>,
        V: IntoIterator<Item = P>,
        P: Into<PermissionId>,
    {
        let prerequisites = canonicalize(raw)?;
        check_references(&prerequisites)?;
        let order = topological_sort(&prerequisites)?;

        debug!(
            permissions = prerequisites.len(),
            edges = prerequisites.values().map(Vec::len).sum::<usize>(),
            "Built permission dependency graph"
        );

        Ok(Self {
            prerequisites,
            order: order.into(),
        })
    }

    /// Every permission in dependency order
    ///
    /// Permissions with no ordering constraint between them keep a stable
    /// order: roots are visited lexicographically, prerequisites likewise.
    pub fn topological_order(&self) -> &[PermissionId] {
        &self.order
    }

    /// Reorder an arbitrary subset into topological order
    ///
    /// Returns the subsequence of [`topological_order`](Self::topological_order)
    /// whose elements appear in `subset`. Duplicates collapse and undeclared
    /// permissions are dropped.
    pub fn filter<S: AsRef<str>>(&self, subset: &[S]) -> Vec<PermissionId> {
        let wanted: HashSet<&str> = subset.iter().map(AsRef::as_ref).collect();

        self.order
            .iter()
            .filter(|permission| wanted.contains(permission.as_str()))
            .cloned()
            .collect()
    }

    /// Direct prerequisites of a permission, `None` if it is not declared
    pub fn prerequisites(&self, permission: &str) -> Option<&[PermissionId]> {
        self.prerequisites.get(permission).map(Vec::as_slice)
    }

    /// Declared permissions that list `permission` as a direct prerequisite
    pub fn dependents(&self, permission: &str) -> Vec<&str> {
        self.prerequisites
            .iter()
            .filter(|(_, prereqs)| requires(prereqs, permission))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Whether `permission` is declared in the graph
    pub fn contains(&self, permission: &str) -> bool {
        self.prerequisites.contains_key(permission)
    }

    /// All declared permissions, lexicographically
    pub fn permissions(&self) -> impl Iterator<Item = &str> + '_ {
        self.prerequisites.keys().map(String::as_str)
    }

    /// Number of declared permissions
    pub fn len(&self) -> usize {
        self.prerequisites.len()
    }

    /// Whether the graph declares no permissions
    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_empty()
    }
}

/// Two graphs are equal when they declare the same canonical prerequisites
impl PartialEq for DependencyGraph {
    fn eq(&self, other: &Self) -> bool {
        self.prerequisites == other.prerequisites
    }
}

impl Eq for DependencyGraph {}

/// Whether a canonical (sorted) prerequisite list contains `permission`
fn requires(prerequisites: &[PermissionId], permission: &str) -> bool {
    prerequisites
        .binary_search_by(|p| p.as_str().cmp(permission))
        .is_ok()
}

/// Collect the raw mapping, sorting and deduplicating each prerequisite list
fn canonicalize<I, K, V, P>(raw: I) -> Result<BTreeMap<PermissionId, Vec<PermissionId>>>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<PermissionId>,
    V: IntoIterator<Item = P>,
    P: Into<PermissionId>,
{
    let mut prerequisites = BTreeMap::new();

    for (name, prereqs) in raw {
        let name: PermissionId = name.into();
        if name.is_empty() {
            return Err(PermissionError::InvalidPermission(
                "Permission name cannot be empty".to_string(),
            ));
        }

        let mut prereqs: Vec<PermissionId> = prereqs.into_iter().map(Into::into).collect();
        if prereqs.iter().any(String::is_empty) {
            return Err(PermissionError::InvalidPermission(format!(
                "Permission '{}' has an empty prerequisite",
                name
            )));
        }
        prereqs.sort();
        prereqs.dedup();

        if prerequisites.contains_key(&name) {
            return Err(PermissionError::DuplicatePermission(name));
        }
        prerequisites.insert(name, prereqs);
    }

    Ok(prerequisites)
}

/// Every prerequisite must itself be a declared permission
fn check_references(prerequisites: &BTreeMap<PermissionId, Vec<PermissionId>>) -> Result<()> {
    for (name, prereqs) in prerequisites {
        if let Some(missing) = prereqs.iter().find(|p| !prerequisites.contains_key(*p)) {
            return Err(PermissionError::UnknownPermission {
                permission: missing.clone(),
                required_by: Some(name.clone()),
            });
        }
    }
    Ok(())
}

/// Depth-first topological sort, failing on the first cycle found
fn topological_sort(
    prerequisites: &BTreeMap<PermissionId, Vec<PermissionId>>,
) -> Result<Vec<PermissionId>> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(prerequisites.len());
    let mut path: Vec<&str> = Vec::new();
    let mut order = Vec::with_capacity(prerequisites.len());

    for root in prerequisites.keys() {
        visit(prerequisites, root, &mut marks, &mut path, &mut order)?;
    }

    Ok(order)
}

/// Emit `root` and everything it reaches, each after its prerequisites
///
/// Iterative so that long prerequisite chains never exhaust the call stack.
/// Each stack frame holds a node and the index of its next unvisited child.
fn visit<'a>(
    prerequisites: &'a BTreeMap<PermissionId, Vec<PermissionId>>,
    root: &'a str,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
    order: &mut Vec<PermissionId>,
) -> Result<()> {
    if marks.contains_key(root) {
        return Ok(());
    }

    marks.insert(root, Mark::Visiting);
    path.push(root);
    let mut stack: Vec<(&'a str, usize)> = vec![(root, 0)];

    while let Some((node, next)) = stack.last_mut() {
        let prereqs = prerequisites
            .get(*node)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let Some(child) = prereqs.get(*next) else {
            // All prerequisites emitted
            let node = *node;
            stack.pop();
            path.pop();
            marks.insert(node, Mark::Done);
            order.push(node.to_string());
            continue;
        };
        *next += 1;

        let child = child.as_str();
        match marks.get(child) {
            Some(Mark::Done) => {}
            Some(Mark::Visiting) => return Err(cycle_error(path, child)),
            None => {
                marks.insert(child, Mark::Visiting);
                path.push(child);
                stack.push((child, 0));
            }
        }
    }

    Ok(())
}

/// Gray node reached again: the path from its first occurrence is a cycle
fn cycle_error(path: &[&str], node: &str) -> PermissionError {
    let start = path.iter().position(|n| *n == node).unwrap_or(0);
    let cycle = path[start..]
        .iter()
        .chain(std::iter::once(&node))
        .map(|n| n.to_string())
        .collect();

    PermissionError::Cycle {
        permission: node.to_string(),
        path: cycle,
    }
}

/// Incremental construction of a [`DependencyGraph`]
///
/// Declarations are only checked when [`build`](Self::build) is called.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraphBuilder {
    declarations: Vec<(PermissionId, Vec<PermissionId>)>,
}

impl DependencyGraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a permission and its direct prerequisites
    pub fn permission<P>(mut self, name: impl Into<PermissionId>, prerequisites: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<PermissionId>,
    {
        self.add_permission(name, prerequisites);
        self
    }

    /// Declare a permission in place
    pub fn add_permission<P>(&mut self, name: impl Into<PermissionId>, prerequisites: P) -> &mut Self
    where
        P: IntoIterator,
        P::Item: Into<PermissionId>,
    {
        self.declarations.push((
            name.into(),
            prerequisites.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Validate the declarations and build the graph
    pub fn build(self) -> Result<DependencyGraph> {
        DependencyGraph::new(self.declarations)
    }
}
