//! Constant and wildcard permission values

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use super::wildcard::{WildcardPermission, SUBPART_DIVIDER, WILDCARD_TOKEN};
use crate::error::{AuthzError, Result};

/// Returns true if the text needs wildcard parsing
///
/// Anything without `*` or `,` is compared as a plain string, which is much
/// cheaper than the part-wise comparison.
pub fn is_wildcard_text(text: &str) -> bool {
    text.contains(WILDCARD_TOKEN) || text.contains(SUBPART_DIVIDER)
}

fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Exact permission compared by string equality
#[derive(Debug)]
pub struct ConstantPermission {
    text: Box<str>,
    hash: u64,
    /// Wildcard view, built on first mixed comparison
    wildcard: OnceLock<WildcardPermission>,
}

impl ConstantPermission {
    fn new(text: &str) -> Self {
        Self {
            text: Box::from(text),
            hash: hash_of(text),
            wildcard: OnceLock::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Wildcard form of this permission, materialised once
    pub fn as_wildcard(&self) -> &WildcardPermission {
        self.wildcard
            .get_or_init(|| WildcardPermission::from_constant(&self.text))
    }

    /// True if the wildcard view has already been built
    pub fn has_wildcard_view(&self) -> bool {
        self.wildcard.get().is_some()
    }
}

/// A single permission
///
/// Cloning is cheap: both variants are reference counted and the constant's
/// lazily built wildcard view is shared between clones.
#[derive(Debug, Clone)]
pub enum Permission {
    /// Exact permission text
    Constant(Arc<ConstantPermission>),
    /// Parsed wildcard permission with its hash precomputed
    Wildcard(Arc<(WildcardPermission, u64)>),
}

impl Permission {
    /// Parses and classifies permission text
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(AuthzError::InvalidPermission(
                "Permission text cannot be empty".to_string(),
            ));
        }

        if is_wildcard_text(text) {
            let wildcard = WildcardPermission::new(text)?;
            let hash = hash_of(&wildcard);
            Ok(Permission::Wildcard(Arc::new((wildcard, hash))))
        } else {
            Ok(Permission::Constant(Arc::new(ConstantPermission::new(text))))
        }
    }

    /// Returns the permission text
    pub fn as_str(&self) -> &str {
        match self {
            Permission::Constant(constant) => constant.as_str(),
            Permission::Wildcard(wildcard) => wildcard.0.as_str(),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Permission::Constant(_))
    }

    /// True if holding this permission grants `other`
    ///
    /// Constants only imply identical constants. Mixed comparisons go
    /// through the constant's wildcard view.
    pub fn implies(&self, other: &Permission) -> bool {
        match (self, other) {
            (Permission::Constant(a), Permission::Constant(b)) => {
                Arc::ptr_eq(a, b) || (a.hash == b.hash && a.text == b.text)
            }
            (Permission::Constant(a), Permission::Wildcard(b)) => a.as_wildcard().implies(&b.0),
            (Permission::Wildcard(a), Permission::Constant(b)) => a.0.implies(b.as_wildcard()),
            (Permission::Wildcard(a), Permission::Wildcard(b)) => a.0.implies(&b.0),
        }
    }

    fn cached_hash(&self) -> u64 {
        match self {
            Permission::Constant(constant) => constant.hash,
            Permission::Wildcard(wildcard) => wildcard.1,
        }
    }
}

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        if self.cached_hash() != other.cached_hash() {
            return false;
        }
        match (self, other) {
            (Permission::Constant(a), Permission::Constant(b)) => a.text == b.text,
            (Permission::Wildcard(a), Permission::Wildcard(b)) => a.0 == b.0,
            _ => false,
        }
    }
}

impl Eq for Permission {}

impl Hash for Permission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash());
    }
}

impl FromStr for Permission {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
