//! Permission construction with memoisation by text

use std::sync::Arc;

use super::types::Permission;
use crate::cache::{CacheStats, ResetCache};
use crate::error::Result;

/// Default size guard for the text → permission cache
pub const DEFAULT_FACTORY_HIGH_WATER: usize = 100_000;

/// Creates permissions, reusing previously built values for the same text
///
/// Reuse means repeated checks of the same permission text share one
/// constant, including its lazily built wildcard view.
pub struct PermissionFactory {
    cache: ResetCache<Arc<str>, Permission>,
}

impl PermissionFactory {
    pub fn new() -> Self {
        Self::with_high_water(DEFAULT_FACTORY_HIGH_WATER)
    }

    pub fn with_high_water(high_water: usize) -> Self {
        Self {
            cache: ResetCache::new("permission-factory", high_water),
        }
    }

    /// Parses `text` or returns the cached permission for it
    pub fn create(&self, text: &str) -> Result<Permission> {
        if let Some(permission) = self.cache.get(text) {
            return Ok(permission);
        }

        let permission = Permission::parse(text)?;
        self.cache.insert(Arc::from(text), permission.clone());
        Ok(permission)
    }

    /// Drop all memoised permissions
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for PermissionFactory {
    fn default() -> Self {
        Self::new()
    }
}
