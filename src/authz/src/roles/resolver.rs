//! Role → permission resolution with caching
//!
//! Roles are flattened breadth-first: a role contributes the permissions of
//! its privileges and of every role reachable through its child role ids.
//! Three caches sit in front of the configuration store:
//!
//! - **role permissions**: seed role id → flattened set, emptied wholesale
//!   once it grows past its size guard
//! - **privilege permissions**: privilege id → permission
//! - **role not found**: ids the store reported missing
//!
//! All three are dropped together by [`RolePermissionResolver::invalidate`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use artifact_authz::roles::RolePermissionResolver;
//! use artifact_authz::{AuthzConfig, ConfigError, ConfigurationManager, Privilege, Role};
//!
//! struct SingleRole;
//!
//! impl ConfigurationManager for SingleRole {
//!     fn read_role(&self, id: &str) -> Result<Role, ConfigError> {
//!         match id {
//!             "viewer" => Ok(Role::new("viewer").with_privilege("read")),
//!             _ => Err(ConfigError::RoleNotFound(id.to_string())),
//!         }
//!     }
//!
//!     fn read_privilege(&self, id: &str) -> Result<Privilege, ConfigError> {
//!         Ok(Privilege::new(id, "method")
//!             .with_property("permission", "nexus:repositories")
//!             .with_property("method", id))
//!     }
//!
//!     fn generation(&self) -> u64 {
//!         0
//!     }
//! }
//!
//! let resolver = RolePermissionResolver::new(Arc::new(SingleRole), &AuthzConfig::default());
//! let permissions = resolver.resolve_permissions_in_role("viewer").unwrap();
//!
//! assert_eq!(permissions.texts(), vec!["nexus:repositories:read"]);
//! ```

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::descriptor::{default_descriptors, PrivilegeDescriptor};
use super::refresh::RefreshTask;
use crate::cache::{BoundedSet, CacheStats, ResetCache};
use crate::config::AuthzConfig;
use crate::error::{ConfigError, Result};
use crate::permission::{Permission, PermissionFactory, PermissionSet, ResolvedPermissionSet};
use crate::store::ConfigurationManager;

/// Snapshot of the resolver's caches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub role_permissions: CacheStats,
    pub privilege_permissions: CacheStats,
    pub roles_not_found: CacheStats,
    /// Invalidations so far
    pub refresh_epoch: u64,
    /// Store generation seen by the last dirty check
    pub last_generation: u64,
}

/// Resolves role ids into flattened permission sets
pub struct RolePermissionResolver {
    config: Arc<dyn ConfigurationManager>,
    descriptors: Vec<Box<dyn PrivilegeDescriptor>>,
    factory: PermissionFactory,
    privilege_permissions: ResetCache<String, Permission>,
    role_permissions: ResetCache<String, ResolvedPermissionSet>,
    roles_not_found: BoundedSet<String>,
    /// Most recently resolved seed role, re-read by the dirty check
    latest_role: Mutex<Option<String>>,
    last_generation: AtomicU64,
    refresh_epoch: AtomicU64,
    pub(super) refresh_interval: Duration,
    pub(super) shutdown_grace: Duration,
    pub(super) refresh_task: Mutex<Option<RefreshTask>>,
}

impl RolePermissionResolver {
    /// Create a resolver using the built-in privilege descriptors
    pub fn new(config: Arc<dyn ConfigurationManager>, settings: &AuthzConfig) -> Self {
        Self::with_descriptors(config, default_descriptors(), settings)
    }

    pub fn with_descriptors(
        config: Arc<dyn ConfigurationManager>,
        descriptors: Vec<Box<dyn PrivilegeDescriptor>>,
        settings: &AuthzConfig,
    ) -> Self {
        let generation = config.generation();

        Self {
            config,
            descriptors,
            factory: PermissionFactory::with_high_water(settings.permission_factory_high_water),
            privilege_permissions: ResetCache::new(
                "privilege-permissions",
                settings.privilege_cache_high_water,
            ),
            role_permissions: ResetCache::new(
                "role-permissions",
                settings.role_permissions_high_water,
            ),
            roles_not_found: BoundedSet::new(
                "roles-not-found",
                settings.role_not_found_cache_size,
                settings.role_not_found_ttl(),
            ),
            latest_role: Mutex::new(None),
            last_generation: AtomicU64::new(generation),
            refresh_epoch: AtomicU64::new(0),
            refresh_interval: settings.refresh_interval(),
            shutdown_grace: settings.shutdown_grace(),
            refresh_task: Mutex::new(None),
        }
    }

    /// Flatten a role into its permissions
    ///
    /// Missing roles and privileges anywhere in the graph are skipped, so an
    /// unknown role id resolves to an empty set. Unchanged configuration
    /// yields the same shared set on every call.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Configuration` if the store cannot be read.
    pub fn resolve_permissions_in_role(&self, role_id: &str) -> Result<ResolvedPermissionSet> {
        if let Some(cached) = self.role_permissions.get(role_id) {
            return Ok(cached);
        }

        let epoch = self.refresh_epoch.load(Ordering::Acquire);
        let mut permissions = PermissionSet::new();
        self.config.run_read(&mut || {
            permissions = PermissionSet::new();
            self.collect_permissions(role_id, epoch, &mut permissions)
        })?;

        debug!(
            role_id,
            permissions = permissions.len(),
            "Resolved role permissions"
        );

        let resolved = Arc::new(permissions);
        // A result computed across an invalidation may be stale
        if self.is_current(epoch) {
            self.role_permissions
                .insert(role_id.to_string(), Arc::clone(&resolved));
        }
        *self.latest_role.lock() = Some(role_id.to_string());

        Ok(resolved)
    }

    fn collect_permissions(
        &self,
        seed: &str,
        epoch: u64,
        permissions: &mut PermissionSet,
    ) -> std::result::Result<(), ConfigError> {
        let mut pending = VecDeque::from([seed.to_string()]);
        let mut processed: HashSet<String> = HashSet::new();

        while let Some(role_id) = pending.pop_front() {
            if !processed.insert(role_id.clone()) {
                continue;
            }

            if self.roles_not_found.contains(role_id.as_str()) {
                trace!(role_id = %role_id, "Role known missing, skipped");
                continue;
            }

            let role = match self.config.read_role(&role_id) {
                Ok(role) => role,
                Err(e) if e.is_not_found() => {
                    trace!(role_id = %role_id, "Ignoring missing role");
                    if self.is_current(epoch) {
                        self.roles_not_found.insert(role_id);
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            // Checked after the read so the store gets a chance to reload
            if let Some(cached) = self.role_permissions.get(role_id.as_str()) {
                permissions.merge(&cached);
                continue;
            }

            pending.extend(
                role.roles
                    .iter()
                    .filter(|child| !processed.contains(*child))
                    .cloned(),
            );

            for privilege_id in &role.privileges {
                if let Some(permission) = self.privilege_permission(privilege_id, epoch)? {
                    permissions.insert(permission);
                }
            }
        }

        Ok(())
    }

    fn privilege_permission(
        &self,
        privilege_id: &str,
        epoch: u64,
    ) -> std::result::Result<Option<Permission>, ConfigError> {
        if let Some(permission) = self.privilege_permissions.get(privilege_id) {
            return Ok(Some(permission));
        }

        let privilege = match self.config.read_privilege(privilege_id) {
            Ok(privilege) => privilege,
            Err(e) if e.is_not_found() => {
                trace!(privilege_id, "Ignoring missing privilege");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(descriptor) = self.descriptor(&privilege.privilege_type) else {
            warn!(
                privilege_type = %privilege.privilege_type,
                "Missing privilege descriptor for type"
            );
            return Ok(None);
        };

        let Some(text) = descriptor.build_permission(&privilege) else {
            return Ok(None);
        };

        match self.factory.create(&text) {
            Ok(permission) => {
                if self.is_current(epoch) {
                    self.privilege_permissions
                        .insert(privilege_id.to_string(), permission.clone());
                }
                Ok(Some(permission))
            }
            Err(e) => {
                warn!(privilege_id, permission = %text, error = %e, "Skipping invalid permission");
                Ok(None)
            }
        }
    }

    fn descriptor(&self, privilege_type: &str) -> Option<&dyn PrivilegeDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.privilege_type() == privilege_type)
            .map(|d| d.as_ref())
    }

    /// True while no invalidation happened since `epoch` was read
    fn is_current(&self, epoch: u64) -> bool {
        self.refresh_epoch.load(Ordering::Acquire) == epoch
    }

    /// Drop every cached role, privilege and missing-role entry
    pub fn invalidate(&self) {
        self.refresh_epoch.fetch_add(1, Ordering::AcqRel);
        self.privilege_permissions.clear();
        self.role_permissions.clear();
        self.roles_not_found.clear();
        trace!("Role permission caches invalidated");
    }

    /// Refresh epoch; changes on every invalidation
    pub fn last_refresh(&self) -> u64 {
        self.refresh_epoch.load(Ordering::Acquire)
    }

    /// Re-read the latest resolved role and invalidate if the store changed
    ///
    /// Returns true if caches were invalidated.
    pub fn check_dirty(&self) -> bool {
        let latest = self.latest_role.lock().clone();
        if let Some(role_id) = latest {
            match self.config.read_role(&role_id) {
                Ok(_) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    debug!(role_id = %role_id, error = %e, "Dirty check could not read role");
                    return false;
                }
            }
        }

        let generation = self.config.generation();
        let previous = self.last_generation.swap(generation, Ordering::AcqRel);
        if generation != previous {
            info!(previous, generation, "Security configuration changed, invalidating");
            self.invalidate();
            true
        } else {
            false
        }
    }

    pub fn factory(&self) -> &PermissionFactory {
        &self.factory
    }

    /// Get resolver statistics
    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            role_permissions: self.role_permissions.stats(),
            privilege_permissions: self.privilege_permissions.stats(),
            roles_not_found: self.roles_not_found.stats(),
            refresh_epoch: self.last_refresh(),
            last_generation: self.last_generation.load(Ordering::Acquire),
        }
    }
}
