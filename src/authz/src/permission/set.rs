//! Flattened permission collections

use indexmap::IndexSet;
use std::sync::Arc;

use super::types::Permission;

/// De-duplicated permissions in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: IndexSet<Permission>,
}

/// Shared, immutable result of resolving a role
pub type ResolvedPermissionSet = Arc<PermissionSet>;

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            permissions: IndexSet::with_capacity(capacity),
        }
    }

    /// Adds a permission; returns false if it was already present
    pub fn insert(&mut self, permission: Permission) -> bool {
        self.permissions.insert(permission)
    }

    /// Adds every permission of `other`, keeping first-seen order
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().cloned());
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Permission texts in insertion order
    pub fn texts(&self) -> Vec<&str> {
        self.permissions.iter().map(Permission::as_str).collect()
    }

    /// True if any held permission implies `requested`
    ///
    /// Constant requests try a hash lookup before scanning.
    pub fn permits(&self, requested: &Permission) -> bool {
        if requested.is_constant() && self.permissions.contains(requested) {
            return true;
        }
        self.permissions.iter().any(|held| held.implies(requested))
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = indexmap::set::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.iter()
    }
}
