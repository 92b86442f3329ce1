//! Permission values and matching
//!
//! Permissions come in two shapes:
//!
//! - **Constant**: plain text without `*` or `,`, compared by string equality
//! - **Wildcard**: part-wise text (`nexus:target:maven,npm:*`) with
//!   superset and wildcard semantics
//!
//! The split is purely a fast path. A constant compared with a wildcard is
//! converted (once) to its wildcard form, so mixed comparisons give the same
//! answer full wildcard parsing would. Both shapes match case-sensitively.
//!
//! # Example
//!
//! ```rust
//! use artifact_authz::permission::{Permission, PermissionFactory};
//!
//! let factory = PermissionFactory::new();
//! let granted = factory.create("nexus:target:maven:*").unwrap();
//! let requested = factory.create("nexus:target:maven:read").unwrap();
//!
//! assert!(requested.is_constant());
//! assert!(granted.implies(&requested));
//! ```

mod factory;
mod set;
mod types;
mod wildcard;


pub use factory::{PermissionFactory, DEFAULT_FACTORY_HIGH_WATER};
pub use set::{PermissionSet, ResolvedPermissionSet};
pub use types::{is_wildcard_text, ConstantPermission, Permission};
pub use wildcard::{WildcardPermission, PART_DIVIDER, SUBPART_DIVIDER, WILDCARD_TOKEN};
