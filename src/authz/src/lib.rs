//! # Artifact Repository Authorization
//!
//! Permission resolution and caching for a repository manager.
//!
//! ## Features
//!
//! - **Wildcard permissions** (`nexus:target:maven,npm:read`) with a cheap
//!   constant fast path
//! - **Repository targets** matching artifact paths by pattern and content class
//! - **Role flattening** over cyclic role graphs with cached results
//! - **Background dirty check** invalidating caches when configuration changes
//! - **Request-scoped memoisation** of authorization lookups and decisions
//!
//! ## Example
//!
//! ```rust
//! use artifact_authz::{Permission, PermissionFactory};
//!
//! let factory = PermissionFactory::new();
//! let granted = factory.create("nexus:repositories:*").unwrap();
//! let requested = factory.create("nexus:repositories:read").unwrap();
//!
//! assert!(granted.implies(&requested));
//! assert!(!requested.implies(&granted));
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod model;
pub mod permission;
pub mod realm;
pub mod request_cache;
pub mod roles;
pub mod store;
pub mod target;

// Re-export commonly used types
pub use cache::CacheStats;
pub use config::AuthzConfig;
pub use error::{AuthzError, ConfigError, Result, UserNotFound};
pub use events::{spawn_event_listener, SecurityEvent};
pub use model::{Privilege, Role, RoleIdentifier, User};
pub use permission::{Permission, PermissionFactory, PermissionSet, ResolvedPermissionSet};
pub use realm::{AuthorizationInfo, AuthorizingRealm, PrincipalCollection};
pub use request_cache::{RequestContext, RequestScopedCache, Subject};
pub use roles::{RolePermissionResolver, ResolverStats};
pub use store::ConfigurationManager;
pub use target::{ContentClass, Target, TargetRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
