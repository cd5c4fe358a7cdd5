//! Grant and revoke decisions over a held permission set
//!
//! Every decision first validates the held set: it is reordered into
//! topological order and each held permission must have all of its direct
//! prerequisites held before it. A corrupt held set is reported, never
//! repaired.

use crate::error::{PermissionError, Result};
use crate::graph::DependencyGraph;
use crate::types::{DenyCheck, GrantCheck, PermissionId};
use std::collections::HashSet;
use tracing::{debug, warn};

impl DependencyGraph {
    /// Validate a held set and return it in canonical order
    ///
    /// The result is the held set in topological order with duplicates
    /// collapsed and undeclared permissions dropped; feeding it back in
    /// yields the same sequence.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBasePermissions` if a held permission's prerequisite
    /// is not held.
    pub fn validate<S: AsRef<str>>(&self, existing: &[S]) -> Result<Vec<PermissionId>> {
        let sorted = self.filter(existing);
        if sorted.len() < existing.len() {
            debug!(
                held = existing.len(),
                declared = sorted.len(),
                "Ignoring duplicate or undeclared held permissions"
            );
        }

        let mut held: HashSet<&str> = HashSet::with_capacity(sorted.len());

        for permission in &sorted {
            let prerequisites = self.prerequisites(permission).unwrap_or_default();

            // Only the prefix before `permission` counts as held
            if let Some(missing) = prerequisites.iter().find(|p| !held.contains(p.as_str())) {
                warn!(
                    permission = permission.as_str(),
                    missing = missing.as_str(),
                    "Held set violates prerequisite ordering"
                );
                return Err(PermissionError::InvalidBasePermissions {
                    permission: permission.clone(),
                    missing: missing.clone(),
                });
            }

            held.insert(permission);
        }

        Ok(sorted)
    }

    /// Whether `target` can be granted on top of `existing`
    pub fn can_grant<S: AsRef<str>>(&self, existing: &[S], target: &str) -> Result<bool> {
        self.check_grant(existing, target).map(|check| check.allowed)
    }

    /// Whether `target` can be revoked without stranding a held permission
    pub fn can_deny<S: AsRef<str>>(&self, existing: &[S], target: &str) -> Result<bool> {
        self.check_deny(existing, target).map(|check| check.allowed)
    }

    /// Grant decision with the direct prerequisites that are still missing
    ///
    /// Only direct prerequisites are checked: validation already guarantees
    /// the held ones bring their own prerequisites along.
    pub fn check_grant<S: AsRef<str>>(&self, existing: &[S], target: &str) -> Result<GrantCheck> {
        let held = self.validate(existing)?;
        let prerequisites = self
            .prerequisites(target)
            .ok_or_else(|| PermissionError::unknown(target))?;

        let held: HashSet<&str> = held.iter().map(String::as_str).collect();
        let missing: Vec<PermissionId> = prerequisites
            .iter()
            .filter(|p| !held.contains(p.as_str()))
            .cloned()
            .collect();

        let check = GrantCheck {
            permission: target.to_string(),
            allowed: missing.is_empty(),
            missing,
        };

        debug!(
            permission = target,
            allowed = check.allowed,
            missing = ?check.missing,
            "Grant decision"
        );

        Ok(check)
    }

    /// Revoke decision with the held permissions that depend on `target`
    ///
    /// Permissions that are not held never block a revoke.
    pub fn check_deny<S: AsRef<str>>(&self, existing: &[S], target: &str) -> Result<DenyCheck> {
        let held = self.validate(existing)?;
        if !self.contains(target) {
            return Err(PermissionError::unknown(target));
        }

        let dependents: HashSet<&str> = self.dependents(target).into_iter().collect();
        let blocked_by: Vec<PermissionId> = held
            .into_iter()
            .filter(|permission| dependents.contains(permission.as_str()))
            .collect();

        let check = DenyCheck {
            permission: target.to_string(),
            allowed: blocked_by.is_empty(),
            blocked_by,
        };

        debug!(
            permission = target,
            allowed = check.allowed,
            blocked_by = ?check.blocked_by,
            "Deny decision"
        );

        Ok(check)
    }
}
