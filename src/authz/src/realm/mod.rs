//! Authorizing realm: principals → roles → permissions
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use artifact_authz::realm::{AuthorizationInfo, AuthorizingRealm};
//! # use artifact_authz::realm::{RealmRegistry, UserManager};
//! # use artifact_authz::{AuthzConfig, ConfigError, ConfigurationManager, Permission, Privilege, Role, User, UserNotFound};
//! # use artifact_authz::roles::RolePermissionResolver;
//! # struct Store;
//! # impl ConfigurationManager for Store {
//! #     fn read_role(&self, id: &str) -> Result<Role, ConfigError> {
//! #         Ok(Role::new(id).with_privilege("read"))
//! #     }
//! #     fn read_privilege(&self, id: &str) -> Result<Privilege, ConfigError> {
//! #         Ok(Privilege::new(id, "method")
//! #             .with_property("permission", "nexus:repositories")
//! #             .with_property("method", id))
//! #     }
//! #     fn generation(&self) -> u64 { 0 }
//! # }
//! # struct Users;
//! # impl UserManager for Users {
//! #     fn source(&self) -> &str { "default" }
//! #     fn authentication_realm_name(&self) -> Option<&str> { None }
//! #     fn get_user(&self, id: &str) -> Result<User, UserNotFound> { Err(UserNotFound::new(id, "default")) }
//! # }
//! # struct Realms;
//! # impl RealmRegistry for Realms {
//! #     fn active_realm_names(&self) -> Vec<String> { Vec::new() }
//! # }
//! let settings = AuthzConfig::default();
//! let resolver = Arc::new(RolePermissionResolver::new(Arc::new(Store), &settings));
//! let realm = AuthorizingRealm::new(&settings, resolver, Arc::new(Users), Arc::new(Realms));
//!
//! let info = AuthorizationInfo::with_roles(["viewer"]);
//! let read = Permission::parse("nexus:repositories:read").unwrap();
//! let write = Permission::parse("nexus:repositories:write").unwrap();
//!
//! assert_eq!(realm.is_permitted_all(&[read, write], &info).unwrap(), vec![true, false]);
//! ```

mod authorizing;
mod types;
mod users;


pub use authorizing::{AuthorizingRealm, DEFAULT_SOURCE};
pub use types::{
    AuthenticationInfo, AuthenticationToken, AuthorizationInfo, PrincipalCollection, RealmId,
};
pub use users::{RealmRegistry, RoleMappingUserManager, UserManager};
