//! User and realm collaborators consulted during authorization

use std::collections::BTreeSet;

use crate::error::UserNotFound;
use crate::model::{RoleIdentifier, User};

/// Source of users and their role assignments
pub trait UserManager: Send + Sync {
    /// Source name, such as `default` or `LDAP`
    fn source(&self) -> &str;

    /// Name of the realm that authenticates this manager's users, if any
    fn authentication_realm_name(&self) -> Option<&str>;

    fn get_user(&self, user_id: &str) -> Result<User, UserNotFound>;

    /// Role-mapping view of this manager, if it supports one
    fn as_role_mapping(&self) -> Option<&dyn RoleMappingUserManager> {
        None
    }
}

/// User manager that maps users of any source to roles
pub trait RoleMappingUserManager: UserManager {
    fn get_users_roles(
        &self,
        user_id: &str,
        source: &str,
    ) -> Result<BTreeSet<RoleIdentifier>, UserNotFound>;
}

/// Realms currently enabled in the security manager
pub trait RealmRegistry: Send + Sync {
    fn active_realm_names(&self) -> Vec<String>;
}
