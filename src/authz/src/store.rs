//! Read access to the security configuration store

use crate::error::ConfigError;
use crate::model::{Privilege, Role};

/// Configuration store consumed by the role resolver
///
/// Reads may be called from many threads at once and are allowed to block.
/// The background dirty check calls them from tokio's blocking pool.
pub trait ConfigurationManager: Send + Sync {
    fn read_role(&self, role_id: &str) -> Result<Role, ConfigError>;

    fn read_privilege(&self, privilege_id: &str) -> Result<Privilege, ConfigError>;

    /// Runs `read` under the store's read lock
    ///
    /// Stores without locking can keep the default.
    fn run_read(
        &self,
        read: &mut dyn FnMut() -> Result<(), ConfigError>,
    ) -> Result<(), ConfigError> {
        read()
    }

    /// Counter bumped on every configuration change
    fn generation(&self) -> u64;
}
