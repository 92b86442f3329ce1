//! Role resolution: flattening role graphs into permission sets
//!
//! The [`RolePermissionResolver`] walks roles breadth-first through a
//! [`ConfigurationManager`](crate::store::ConfigurationManager), turning
//! privileges into permissions via [`PrivilegeDescriptor`]s. Results are
//! cached until the configuration changes, which is detected either through
//! [`SecurityEvent`](crate::events::SecurityEvent)s or by the periodic dirty
//! check started with [`RolePermissionResolver::start_dirty_check`].

mod descriptor;
mod refresh;
mod resolver;

#[cfg(test)]
mod tests;

pub use descriptor::{
    default_descriptors, MethodPrivilegeDescriptor, PrivilegeDescriptor, TargetPrivilegeDescriptor,
};
pub use resolver::{ResolverStats, RolePermissionResolver};
