//! Security configuration model as read from the configuration store

use std::collections::{BTreeSet, HashMap};

/// A role: privileges plus nested roles
///
/// Role graphs may contain cycles; traversal guards against them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Privilege ids granted directly
    pub privileges: BTreeSet<String>,
    /// Child role ids
    pub roles: BTreeSet<String>,
}

impl Role {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            ..Default::default()
        }
    }

    pub fn with_privilege(mut self, privilege_id: impl Into<String>) -> Self {
        self.privileges.insert(privilege_id.into());
        self
    }

    pub fn with_role(mut self, role_id: impl Into<String>) -> Self {
        self.roles.insert(role_id.into());
        self
    }
}

/// A privilege of some descriptor type with type-specific properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Privilege {
    pub id: String,
    pub name: String,
    /// Selects the privilege descriptor
    pub privilege_type: String,
    pub properties: HashMap<String, String>,
}

impl Privilege {
    pub fn new(id: impl Into<String>, privilege_type: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            privilege_type: privilege_type.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Role reference as reported by a user manager
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoleIdentifier {
    /// Source the role mapping came from
    pub source: String,
    pub role_id: String,
}

impl RoleIdentifier {
    pub fn new(source: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            role_id: role_id.into(),
        }
    }
}

/// A user with its role assignments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub user_id: String,
    pub source: String,
    pub roles: BTreeSet<RoleIdentifier>,
}

impl User {
    pub fn new(user_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            source: source.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role_id: impl Into<String>) -> Self {
        let source = self.source.clone();
        self.roles.insert(RoleIdentifier::new(source, role_id));
        self
    }
}
