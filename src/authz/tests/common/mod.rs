//! Shared fixtures: in-memory configuration store, user manager and realm registry

#![allow(dead_code)]

use artifact_authz::realm::{RealmRegistry, RoleMappingUserManager, UserManager};
use artifact_authz::{
    ConfigError, ConfigurationManager, Privilege, Role, RoleIdentifier, User, UserNotFound,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Configuration store held in memory
///
/// Every mutation bumps the generation, the way a reloaded file would.
#[derive(Default)]
pub struct InMemoryConfig {
    roles: DashMap<String, Role>,
    privileges: DashMap<String, Privilege>,
    generation: AtomicU64,
    pub role_reads: AtomicUsize,
    pub read_sections: AtomicUsize,
}

impl InMemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_role(&self, role: Role) {
        self.roles.insert(role.id.clone(), role);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn delete_role(&self, role_id: &str) {
        self.roles.remove(role_id);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn put_privilege(&self, privilege: Privilege) {
        self.privileges.insert(privilege.id.clone(), privilege);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// `method` privilege granting `{permission}:{method}`
    pub fn put_method_privilege(&self, id: &str, permission: &str, method: &str) {
        self.put_privilege(
            Privilege::new(id, "method")
                .with_property("permission", permission)
                .with_property("method", method),
        );
    }

    pub fn role_reads(&self) -> usize {
        self.role_reads.load(Ordering::SeqCst)
    }
}

impl ConfigurationManager for InMemoryConfig {
    fn read_role(&self, role_id: &str) -> Result<Role, ConfigError> {
        self.role_reads.fetch_add(1, Ordering::SeqCst);
        self.roles
            .get(role_id)
            .map(|role| role.clone())
            .ok_or_else(|| ConfigError::RoleNotFound(role_id.to_string()))
    }

    fn read_privilege(&self, privilege_id: &str) -> Result<Privilege, ConfigError> {
        self.privileges
            .get(privilege_id)
            .map(|privilege| privilege.clone())
            .ok_or_else(|| ConfigError::PrivilegeNotFound(privilege_id.to_string()))
    }

    fn run_read(
        &self,
        read: &mut dyn FnMut() -> Result<(), ConfigError>,
    ) -> Result<(), ConfigError> {
        self.read_sections.fetch_add(1, Ordering::SeqCst);
        read()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Local users plus per-source role mappings
pub struct InMemoryUsers {
    source: String,
    authentication_realm: Option<String>,
    users: DashMap<String, User>,
    mappings: DashMap<(String, String), BTreeSet<RoleIdentifier>>,
    role_mapping: bool,
}

impl InMemoryUsers {
    /// Plain user manager for the `default` source
    pub fn local() -> Self {
        Self {
            source: "default".to_string(),
            authentication_realm: None,
            users: DashMap::new(),
            mappings: DashMap::new(),
            role_mapping: false,
        }
    }

    /// Role-mapping user manager
    pub fn mapping() -> Self {
        Self {
            role_mapping: true,
            ..Self::local()
        }
    }

    /// External user source authenticated by `realm`
    pub fn external(source: &str, realm: &str) -> Self {
        Self {
            source: source.to_string(),
            authentication_realm: Some(realm.to_string()),
            ..Self::local()
        }
    }

    pub fn add_user(&self, user: User) {
        self.users.insert(user.user_id.clone(), user);
    }

    pub fn map_role(&self, user_id: &str, source: &str, role_id: &str) {
        self.mappings
            .entry((user_id.to_string(), source.to_string()))
            .or_default()
            .insert(RoleIdentifier::new(source, role_id));
    }
}

impl UserManager for InMemoryUsers {
    fn source(&self) -> &str {
        &self.source
    }

    fn authentication_realm_name(&self) -> Option<&str> {
        self.authentication_realm.as_deref()
    }

    fn get_user(&self, user_id: &str) -> Result<User, UserNotFound> {
        self.users
            .get(user_id)
            .map(|user| user.clone())
            .ok_or_else(|| UserNotFound::new(user_id, self.source.clone()))
    }

    fn as_role_mapping(&self) -> Option<&dyn RoleMappingUserManager> {
        if self.role_mapping {
            Some(self)
        } else {
            None
        }
    }
}

impl RoleMappingUserManager for InMemoryUsers {
    fn get_users_roles(
        &self,
        user_id: &str,
        source: &str,
    ) -> Result<BTreeSet<RoleIdentifier>, UserNotFound> {
        self.mappings
            .get(&(user_id.to_string(), source.to_string()))
            .map(|roles| roles.clone())
            .ok_or_else(|| UserNotFound::new(user_id, source))
    }
}

/// Mutable set of enabled realm names
#[derive(Default)]
pub struct InMemoryRealms {
    names: RwLock<Vec<String>>,
}

impl InMemoryRealms {
    pub fn with(names: &[&str]) -> Self {
        Self {
            names: RwLock::new(names.iter().map(|n| n.to_string()).collect()),
        }
    }

    pub fn disable(&self, name: &str) {
        self.names.write().retain(|n| n != name);
    }
}

impl RealmRegistry for InMemoryRealms {
    fn active_realm_names(&self) -> Vec<String> {
        self.names.read().clone()
    }
}
