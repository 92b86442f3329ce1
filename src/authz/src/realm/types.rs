//! Principals and authentication/authorization records

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::permission::Permission;

static NEXT_REALM_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one realm instance, unique for the process lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RealmId(u64);

impl RealmId {
    pub fn next() -> Self {
        RealmId(NEXT_REALM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "realm#{}", self.0)
    }
}

/// Authenticated identity plus the realms that vouched for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalCollection {
    pub primary: String,
    pub realm_names: BTreeSet<String>,
}

impl PrincipalCollection {
    pub fn new<I, S>(primary: impl Into<String>, realm_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            primary: primary.into(),
            realm_names: realm_names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Credentials presented for authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationToken {
    pub principal: String,
    pub credentials: String,
}

/// Result of a successful authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationInfo {
    pub principals: PrincipalCollection,
}

impl AuthenticationInfo {
    pub fn new(principals: PrincipalCollection) -> Self {
        Self { principals }
    }
}

/// Roles and direct grants of a principal
///
/// Explicit permissions are realm-native grants that bypass role
/// resolution caching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizationInfo {
    pub roles: BTreeSet<String>,
    pub string_permissions: BTreeSet<String>,
    pub object_permissions: Vec<Permission>,
}

impl AuthorizationInfo {
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn has_explicit_permissions(&self) -> bool {
        !self.string_permissions.is_empty() || !self.object_permissions.is_empty()
    }
}
