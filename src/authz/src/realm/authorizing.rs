//! Authorization-only realm backed by the role resolver

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::types::{
    AuthenticationInfo, AuthenticationToken, AuthorizationInfo, PrincipalCollection, RealmId,
};
use super::users::{RealmRegistry, UserManager};
use crate::cache::{CacheStats, ResetCache};
use crate::config::AuthzConfig;
use crate::error::{AuthzError, Result};
use crate::permission::{Permission, PermissionSet, ResolvedPermissionSet};
use crate::request_cache::RequestScopedCache;
use crate::roles::RolePermissionResolver;

/// Realm name used for users managed by this realm itself
pub const DEFAULT_SOURCE: &str = "default";

/// Sorted role ids with their hash computed once
#[derive(Debug, Clone, PartialEq, Eq)]
struct RoleSetKey {
    roles: Vec<String>,
    hash: u64,
}

impl RoleSetKey {
    fn new(roles: &BTreeSet<String>) -> Self {
        let roles: Vec<String> = roles.iter().cloned().collect();
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        roles.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            roles,
        }
    }
}

impl Hash for RoleSetKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Realm that authorizes principals authenticated elsewhere
///
/// It never authenticates. Role ids come from the user manager and are
/// turned into permissions by the [`RolePermissionResolver`].
pub struct AuthorizingRealm {
    id: RealmId,
    name: String,
    resolver: Arc<RolePermissionResolver>,
    user_manager: Arc<dyn UserManager>,
    /// Every configured user manager, used to map realm names to sources
    user_managers: Vec<Arc<dyn UserManager>>,
    realms: Arc<dyn RealmRegistry>,
    /// Role set → union of role permissions
    role_set_permissions: ResetCache<RoleSetKey, ResolvedPermissionSet>,
    /// Resolver refresh epoch the role-set cache was filled under
    seen_refresh: AtomicU64,
}

impl AuthorizingRealm {
    pub fn new(
        settings: &AuthzConfig,
        resolver: Arc<RolePermissionResolver>,
        user_manager: Arc<dyn UserManager>,
        realms: Arc<dyn RealmRegistry>,
    ) -> Self {
        let seen_refresh = resolver.last_refresh();
        Self {
            id: RealmId::next(),
            name: settings.realm_name.clone(),
            resolver,
            user_managers: vec![Arc::clone(&user_manager)],
            user_manager,
            realms,
            role_set_permissions: ResetCache::new(
                "role-set-permissions",
                settings.role_set_high_water,
            ),
            seen_refresh: AtomicU64::new(seen_refresh),
        }
    }

    /// Replace the user managers consulted for realm-name clean up
    pub fn with_user_managers(mut self, user_managers: Vec<Arc<dyn UserManager>>) -> Self {
        self.user_managers = user_managers;
        self
    }

    pub fn id(&self) -> RealmId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// This realm never authenticates
    pub fn supports(&self, _token: &AuthenticationToken) -> bool {
        false
    }

    pub fn authenticate(&self, token: &AuthenticationToken) -> Result<AuthenticationInfo> {
        Err(AuthzError::Unsupported(format!(
            "{} does not authenticate '{}'",
            self.name, token.principal
        )))
    }

    /// Roles of the principal, memoised per request (failures included)
    pub fn get_authorization_info(
        &self,
        principals: Option<&PrincipalCollection>,
        request_cache: &RequestScopedCache,
    ) -> Result<Arc<AuthorizationInfo>> {
        if let Some(outcome) = request_cache.authorization_info(self.id) {
            trace!(realm = %self.name, "Authorization info served from request cache");
            return outcome;
        }

        let outcome = self.load_authorization_info(principals).map(Arc::new);
        request_cache.record_authorization_info(self.id, outcome.clone());
        outcome
    }

    fn load_authorization_info(
        &self,
        principals: Option<&PrincipalCollection>,
    ) -> Result<AuthorizationInfo> {
        let principals = principals.ok_or_else(|| {
            AuthzError::Authorization("Cannot authorize with no principals".to_string())
        })?;
        let username = principals.primary.as_str();

        if !principals.realm_names.contains(&self.name) {
            let active = self.realms.active_realm_names();
            if !active.iter().any(|name| principals.realm_names.contains(name)) {
                return Err(AuthzError::Authorization(format!(
                    "User for principals: {} belongs to a disabled realm(s): {:?}",
                    username, principals.realm_names
                )));
            }
        }

        let realm_names = self.normalize_realm_names(&principals.realm_names);
        let mut roles = BTreeSet::new();

        if let Some(mapping) = self.user_manager.as_role_mapping() {
            for realm_name in &realm_names {
                match mapping.get_users_roles(username, realm_name) {
                    Ok(identifiers) => {
                        roles.extend(identifiers.into_iter().map(|identifier| identifier.role_id))
                    }
                    Err(_) => trace!(
                        user = username,
                        realm = %realm_name,
                        "No role mappings for user in realm"
                    ),
                }
            }
        } else if realm_names.contains(DEFAULT_SOURCE) {
            let user = self.user_manager.get_user(username).map_err(|e| {
                AuthzError::Authorization(format!(
                    "User for principals: {} could not be found: {}",
                    username, e
                ))
            })?;
            roles.extend(user.roles.into_iter().map(|identifier| identifier.role_id));
        } else {
            return Err(AuthzError::Authorization(format!(
                "User for principals: {} not managed by {}",
                username, self.name
            )));
        }

        debug!(user = username, roles = roles.len(), "Loaded authorization info");
        Ok(AuthorizationInfo {
            roles,
            ..Default::default()
        })
    }

    /// Maps authentication realm names to their user source and this
    /// realm's own name to `default`
    fn normalize_realm_names(&self, realm_names: &BTreeSet<String>) -> BTreeSet<String> {
        let mut normalized = realm_names.clone();

        for manager in &self.user_managers {
            if let Some(auth_realm) = manager.authentication_realm_name() {
                if normalized.remove(auth_realm) {
                    normalized.insert(manager.source().to_string());
                }
            }
        }

        if normalized.remove(&self.name) {
            normalized.insert(DEFAULT_SOURCE.to_string());
        }
        normalized
    }

    /// Permissions granted by `info`
    ///
    /// Explicit permissions are combined with the role permissions without
    /// caching. Role-only infos go through the role-set cache.
    pub fn get_permissions(&self, info: &AuthorizationInfo) -> Result<ResolvedPermissionSet> {
        if info.has_explicit_permissions() {
            return self.explicit_permissions(info).map(Arc::new);
        }

        if info.roles.is_empty() {
            return Ok(Arc::new(PermissionSet::new()));
        }

        let refresh = self.resolver.last_refresh();
        if self.seen_refresh.swap(refresh, Ordering::AcqRel) != refresh {
            self.role_set_permissions.clear();
        }

        let key = RoleSetKey::new(&info.roles);
        if let Some(cached) = self.role_set_permissions.get(&key) {
            return Ok(cached);
        }

        let union = Arc::new(self.role_permissions(&info.roles)?);
        // Skip the insert if the resolver was invalidated while resolving
        if self.resolver.last_refresh() == refresh {
            let weight = key.roles.len();
            self.role_set_permissions
                .insert_weighted(key, Arc::clone(&union), weight);
        }
        Ok(union)
    }

    fn role_permissions(&self, roles: &BTreeSet<String>) -> Result<PermissionSet> {
        let mut union = PermissionSet::new();
        for role_id in roles {
            let resolved = self.resolver.resolve_permissions_in_role(role_id)?;
            union.merge(&resolved);
        }
        Ok(union)
    }

    fn explicit_permissions(&self, info: &AuthorizationInfo) -> Result<PermissionSet> {
        let mut permissions = PermissionSet::new();

        for text in &info.string_permissions {
            match self.resolver.factory().create(text) {
                Ok(permission) => {
                    permissions.insert(permission);
                }
                Err(e) => warn!(permission = %text, error = %e, "Skipping invalid permission"),
            }
        }
        for permission in &info.object_permissions {
            permissions.insert(permission.clone());
        }
        permissions.merge(&self.role_permissions(&info.roles)?);

        Ok(permissions)
    }

    pub fn is_permitted(&self, permission: &Permission, info: &AuthorizationInfo) -> Result<bool> {
        Ok(self.get_permissions(info)?.permits(permission))
    }

    /// One decision per requested permission, in order
    ///
    /// The granted permissions are computed once for the whole batch.
    pub fn is_permitted_all(
        &self,
        permissions: &[Permission],
        info: &AuthorizationInfo,
    ) -> Result<Vec<bool>> {
        if permissions.is_empty() {
            return Ok(Vec::new());
        }

        let granted = self.get_permissions(info)?;
        Ok(permissions.iter().map(|p| granted.permits(p)).collect())
    }

    /// End-to-end check of permission text, memoised per request
    pub fn check(
        &self,
        principals: Option<&PrincipalCollection>,
        permission: &str,
        request_cache: &RequestScopedCache,
    ) -> Result<bool> {
        if let Some(permitted) = request_cache.permission_check(permission) {
            return Ok(permitted);
        }

        let info = self.get_authorization_info(principals, request_cache)?;
        let requested = self.resolver.factory().create(permission)?;
        let permitted = self.is_permitted(&requested, &info)?;

        request_cache.record_permission_check(permission, permitted);
        Ok(permitted)
    }

    /// Statistics of the role-set permission cache
    pub fn stats(&self) -> CacheStats {
        self.role_set_permissions.stats()
    }
}
