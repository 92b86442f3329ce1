//! Resolver tests

use super::*;
use crate::config::AuthzConfig;
use crate::error::{AuthzError, ConfigError};
use crate::model::{Privilege, Role};
use crate::permission::Permission;
use crate::store::ConfigurationManager;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct MemoryStore {
    roles: DashMap<String, Role>,
    privileges: DashMap<String, Privilege>,
    generation: AtomicU64,
    role_reads: AtomicUsize,
    unavailable: AtomicBool,
    /// Runs once, after the read of the given role or privilege id
    after_read: Mutex<Option<(String, Box<dyn FnOnce() + Send>)>>,
}

impl MemoryStore {
    fn role(&self, role: Role) {
        self.roles.insert(role.id.clone(), role);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn method_privilege(&self, id: &str, permission: &str, method: &str) {
        let privilege = Privilege::new(id, "method")
            .with_property("permission", permission)
            .with_property("method", method);
        self.privileges.insert(id.to_string(), privilege);
    }

    fn on_read(&self, id: &str, hook: impl FnOnce() + Send + 'static) {
        *self.after_read.lock() = Some((id.to_string(), Box::new(hook)));
    }

    fn fire(&self, id: &str) {
        let hook = {
            let mut slot = self.after_read.lock();
            match slot.as_ref() {
                Some((target, _)) if target == id => slot.take(),
                _ => None,
            }
        };
        if let Some((_, hook)) = hook {
            hook();
        }
    }
}

impl ConfigurationManager for MemoryStore {
    fn read_role(&self, role_id: &str) -> Result<Role, ConfigError> {
        self.role_reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ConfigError::Unavailable("store locked".to_string()));
        }
        let role = self
            .roles
            .get(role_id)
            .map(|r| r.clone())
            .ok_or_else(|| ConfigError::RoleNotFound(role_id.to_string()));
        self.fire(role_id);
        role
    }

    fn read_privilege(&self, privilege_id: &str) -> Result<Privilege, ConfigError> {
        let privilege = self
            .privileges
            .get(privilege_id)
            .map(|p| p.clone())
            .ok_or_else(|| ConfigError::PrivilegeNotFound(privilege_id.to_string()));
        self.fire(privilege_id);
        privilege
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

fn resolver(store: &Arc<MemoryStore>) -> RolePermissionResolver {
    RolePermissionResolver::new(store.clone(), &AuthzConfig::default())
}

// ============================================================================
// Traversal
// ============================================================================

#[test]
fn test_nested_roles_are_flattened() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("p1", "nexus:a", "read");
    store.method_privilege("p2", "nexus:b", "read");
    store.role(Role::new("R2").with_privilege("p2"));
    store.role(Role::new("R1").with_privilege("p1").with_role("R2"));

    let resolver = resolver(&store);
    let permissions = resolver.resolve_permissions_in_role("R1").unwrap();

    assert_eq!(permissions.texts(), vec!["nexus:a:read", "nexus:b:read"]);
}

#[test]
fn test_cycle_terminates_with_unique_permissions() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("shared", "nexus:shared", "read");
    store.method_privilege("pa", "nexus:a", "read");
    store.role(Role::new("A").with_privilege("shared").with_privilege("pa").with_role("B"));
    store.role(Role::new("B").with_privilege("shared").with_role("A"));

    let resolver = resolver(&store);
    let permissions = resolver.resolve_permissions_in_role("A").unwrap();

    assert_eq!(permissions.len(), 2);
    assert!(permissions.contains(&Permission::parse("nexus:shared:read").unwrap()));
}

#[test]
fn test_missing_children_and_privileges_are_skipped() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("p1", "nexus:a", "read");
    store.role(
        Role::new("R")
            .with_privilege("p1")
            .with_privilege("gone")
            .with_role("ghost"),
    );

    let resolver = resolver(&store);
    let permissions = resolver.resolve_permissions_in_role("R").unwrap();

    assert_eq!(permissions.texts(), vec!["nexus:a:read"]);
    assert_eq!(resolver.stats().roles_not_found.entries, 1);
}

#[test]
fn test_unknown_descriptor_is_skipped() {
    let store = Arc::new(MemoryStore::default());
    store
        .privileges
        .insert("odd".to_string(), Privilege::new("odd", "application"));
    store.role(Role::new("R").with_privilege("odd"));

    let resolver = resolver(&store);
    assert!(resolver.resolve_permissions_in_role("R").unwrap().is_empty());
}

#[test]
fn test_invalid_permission_text_is_skipped() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("bad", "nexus:,", "read");
    store.method_privilege("good", "nexus:a", "read");
    store.role(Role::new("R").with_privilege("bad").with_privilege("good"));

    let resolver = resolver(&store);
    assert_eq!(
        resolver.resolve_permissions_in_role("R").unwrap().texts(),
        vec!["nexus:a:read"]
    );
}

#[test]
fn test_cached_sub_role_is_merged_without_expansion() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("p1", "nexus:a", "read");
    store.method_privilege("p2", "nexus:b", "read");
    store.role(Role::new("child").with_privilege("p2"));
    store.role(Role::new("parent").with_privilege("p1").with_role("child"));

    let resolver = resolver(&store);
    let child = resolver.resolve_permissions_in_role("child").unwrap();
    let parent = resolver.resolve_permissions_in_role("parent").unwrap();

    for permission in child.iter() {
        assert!(parent.contains(permission));
    }
    assert_eq!(parent.len(), 2);
}

// ============================================================================
// Caching and invalidation
// ============================================================================

#[test]
fn test_unchanged_configuration_returns_same_set() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("p1", "nexus:a", "read");
    store.role(Role::new("R").with_privilege("p1"));

    let resolver = resolver(&store);
    let first = resolver.resolve_permissions_in_role("R").unwrap();
    let reads = store.role_reads.load(Ordering::SeqCst);
    let second = resolver.resolve_permissions_in_role("R").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(store.role_reads.load(Ordering::SeqCst), reads);
    assert_eq!(resolver.stats().role_permissions.hits, 1);
}

#[test]
fn test_invalidation_rederives() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("p1", "nexus:a", "read");
    store.method_privilege("p2", "nexus:b", "read");
    store.role(Role::new("R").with_privilege("p1"));

    let resolver = resolver(&store);
    let before = resolver.resolve_permissions_in_role("R").unwrap();
    assert_eq!(before.len(), 1);

    store.role(Role::new("R").with_privilege("p1").with_privilege("p2"));
    assert_eq!(resolver.resolve_permissions_in_role("R").unwrap().len(), 1);

    resolver.invalidate();
    let after = resolver.resolve_permissions_in_role("R").unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(resolver.last_refresh(), 1);
}

#[test]
fn test_deleted_role_resolves_empty_and_is_memoised() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("p1", "nexus:a", "read");
    store.role(Role::new("R").with_privilege("p1"));

    let resolver = resolver(&store);
    assert_eq!(resolver.resolve_permissions_in_role("R").unwrap().len(), 1);

    store.roles.remove("R");
    resolver.invalidate();

    assert!(resolver.resolve_permissions_in_role("R").unwrap().is_empty());
    let reads = store.role_reads.load(Ordering::SeqCst);
    assert!(resolver.resolve_permissions_in_role("R").unwrap().is_empty());
    assert_eq!(store.role_reads.load(Ordering::SeqCst), reads);
}

#[test]
fn test_dirty_check_detects_generation_change() {
    let store = Arc::new(MemoryStore::default());
    store.role(Role::new("R"));

    let resolver = resolver(&store);
    resolver.resolve_permissions_in_role("R").unwrap();
    assert!(!resolver.check_dirty());

    store.role(Role::new("R2"));
    assert!(resolver.check_dirty());
    assert_eq!(resolver.stats().last_generation, store.generation());
    assert!(!resolver.check_dirty());
}

#[test]
fn test_missing_role_not_memoised_across_invalidation() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("pc", "nexus:c", "read");
    let resolver = Arc::new(resolver(&store));

    // The role appears and the resolver refreshes after the miss was read
    let (hook_store, hook_resolver) = (Arc::clone(&store), Arc::clone(&resolver));
    store.on_read("child", move || {
        hook_store.role(Role::new("child").with_privilege("pc"));
        assert!(hook_resolver.check_dirty());
    });

    assert!(resolver.resolve_permissions_in_role("child").unwrap().is_empty());
    assert_eq!(resolver.stats().roles_not_found.entries, 0);

    assert!(!resolver.check_dirty());
    assert_eq!(
        resolver.resolve_permissions_in_role("child").unwrap().texts(),
        vec!["nexus:c:read"]
    );
}

#[test]
fn test_privilege_not_memoised_across_invalidation() {
    let store = Arc::new(MemoryStore::default());
    store.method_privilege("p", "nexus:old", "read");
    store.role(Role::new("R").with_privilege("p"));
    let resolver = Arc::new(resolver(&store));

    let (hook_store, hook_resolver) = (Arc::clone(&store), Arc::clone(&resolver));
    store.on_read("p", move || {
        hook_store.method_privilege("p", "nexus:new", "read");
        hook_store.generation.fetch_add(1, Ordering::SeqCst);
        hook_resolver.invalidate();
    });

    // This call raced the update and may see the old privilege
    assert_eq!(
        resolver.resolve_permissions_in_role("R").unwrap().texts(),
        vec!["nexus:old:read"]
    );
    assert_eq!(resolver.stats().privilege_permissions.entries, 0);
    assert_eq!(
        resolver.resolve_permissions_in_role("R").unwrap().texts(),
        vec!["nexus:new:read"]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unavailable_store_propagates() {
    let store = Arc::new(MemoryStore::default());
    store.role(Role::new("R"));
    store.unavailable.store(true, Ordering::SeqCst);

    let resolver = resolver(&store);
    let err = resolver.resolve_permissions_in_role("R").unwrap_err();
    assert!(matches!(err, AuthzError::Configuration(ref msg) if msg.contains("store locked")));

    // Nothing was cached for the failed call
    store.unavailable.store(false, Ordering::SeqCst);
    assert!(resolver.resolve_permissions_in_role("R").is_ok());
    assert_eq!(resolver.stats().role_permissions.entries, 1);
}

#[test]
fn test_custom_descriptor() {
    struct Fixed;

    impl PrivilegeDescriptor for Fixed {
        fn privilege_type(&self) -> &str {
            "fixed"
        }

        fn build_permission(&self, privilege: &Privilege) -> Option<String> {
            Some(format!("fixed:{}", privilege.id))
        }
    }

    let store = Arc::new(MemoryStore::default());
    store
        .privileges
        .insert("x".to_string(), Privilege::new("x", "fixed"));
    store.role(Role::new("R").with_privilege("x"));

    let resolver =
        RolePermissionResolver::with_descriptors(store.clone(), vec![Box::new(Fixed)], &AuthzConfig::default());
    assert_eq!(
        resolver.resolve_permissions_in_role("R").unwrap().texts(),
        vec!["fixed:x"]
    );
}
