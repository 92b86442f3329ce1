//! Part-wise wildcard permissions
//!
//! A wildcard permission such as `nexus:target:maven,npm:read` is parsed into
//! ordered parts (split on `:`), each holding a set of sub-parts (split on
//! `,`). The `*` sub-part matches anything.
//!
//! Matching is case-sensitive: `Nexus:*` does not imply `nexus:read`, and
//! the constant fast path compares text byte for byte to agree with it.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{AuthzError, Result};

/// Matches any sub-part
pub const WILDCARD_TOKEN: &str = "*";

/// Separates parts
pub const PART_DIVIDER: char = ':';

/// Separates sub-parts within a part
pub const SUBPART_DIVIDER: char = ',';

/// Parsed wildcard permission
///
/// Equality and hashing look at the parsed parts only, so `a:x,y` equals
/// `a:y,x`.
#[derive(Debug, Clone)]
pub struct WildcardPermission {
    /// Original text
    text: Box<str>,
    /// Ordered parts, each a set of sub-parts
    parts: Vec<BTreeSet<Box<str>>>,
}

impl WildcardPermission {
    /// Parses permission text
    ///
    /// Fails on blank text or on a part consisting only of sub-part
    /// dividers (such as `a:,:b`).
    pub fn new(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AuthzError::InvalidPermission(
                "Wildcard string cannot be empty".to_string(),
            ));
        }

        let mut parts = Vec::new();
        for part in trimmed.split(PART_DIVIDER) {
            let subparts: BTreeSet<Box<str>> = part
                .split(SUBPART_DIVIDER)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Box::from)
                .collect();

            if subparts.is_empty() && part.contains(SUBPART_DIVIDER) {
                return Err(AuthzError::InvalidPermission(format!(
                    "'{}' contains a part with no sub-parts",
                    trimmed
                )));
            }

            // An empty part (as in `a::b`) is kept as the empty sub-part
            let subparts = if subparts.is_empty() {
                BTreeSet::from([Box::<str>::from(part.trim())])
            } else {
                subparts
            };
            parts.push(subparts);
        }

        Ok(Self {
            text: Box::from(trimmed),
            parts,
        })
    }

    /// Builds the wildcard form of text without sub-part dividers or wildcards
    ///
    /// Produces the same parts `new` would, without the failure cases.
    pub(crate) fn from_constant(text: &str) -> Self {
        let trimmed = text.trim();
        let parts = trimmed
            .split(PART_DIVIDER)
            .map(|part| BTreeSet::from([Box::<str>::from(part.trim())]))
            .collect();

        Self {
            text: Box::from(trimmed),
            parts,
        }
    }

    /// Returns the original text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the parsed parts
    pub fn parts(&self) -> &[BTreeSet<Box<str>>] {
        &self.parts
    }

    /// True if this permission grants everything `other` grants
    ///
    /// Missing trailing parts on `self` grant everything; extra trailing
    /// parts on `self` must be wildcards.
    pub fn implies(&self, other: &WildcardPermission) -> bool {
        for (idx, other_part) in other.parts.iter().enumerate() {
            let Some(part) = self.parts.get(idx) else {
                return true;
            };

            if !part.contains(WILDCARD_TOKEN) && !part.is_superset(other_part) {
                return false;
            }
        }

        self.parts
            .iter()
            .skip(other.parts.len())
            .all(|part| part.contains(WILDCARD_TOKEN))
    }
}

impl PartialEq for WildcardPermission {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for WildcardPermission {}

impl Hash for WildcardPermission {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl fmt::Display for WildcardPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(text: &str) -> WildcardPermission {
        WildcardPermission::new(text).unwrap()
    }

    #[test]
    fn test_parsing() {
        let perm = wp("nexus:target:maven, npm:read");
        assert_eq!(perm.parts().len(), 4);
        assert_eq!(perm.parts()[2].len(), 2);
        assert!(perm.parts()[2].contains("npm"));
    }

    #[test]
    fn test_invalid_text() {
        assert!(WildcardPermission::new("").is_err());
        assert!(WildcardPermission::new("   ").is_err());
        assert!(WildcardPermission::new("a:,:b").is_err());
    }

    #[test]
    fn test_empty_part_is_kept() {
        let perm = wp("a::b");
        assert_eq!(perm.parts().len(), 3);
        assert!(perm.parts()[1].contains(""));
    }

    #[test]
    fn test_wildcard_part() {
        assert!(wp("wc:*").implies(&wp("wc:a,b")));
        assert!(wp("*").implies(&wp("anything:at:all")));
        assert!(!wp("wc:a").implies(&wp("wc:a,b")));
    }

    #[test]
    fn test_superset() {
        assert!(wp("neutral:a,b").implies(&wp("neutral:a")));
        assert!(!wp("neutral:a").implies(&wp("neutral:a,b")));
    }

    #[test]
    fn test_fewer_parts_imply_rest() {
        assert!(wp("nexus:target").implies(&wp("nexus:target:maven:read")));
    }

    #[test]
    fn test_extra_parts_must_be_wildcards() {
        assert!(wp("nexus:target:*").implies(&wp("nexus:target")));
        assert!(!wp("nexus:target:maven").implies(&wp("nexus:target")));
    }

    #[test]
    fn test_from_constant_matches_parse() {
        for text in ["nexus:repositories:read", "a::b", "single"] {
            assert_eq!(WildcardPermission::from_constant(text), wp(text));
        }
    }

    #[test]
    fn test_equality_ignores_subpart_order() {
        assert_eq!(wp("a:x,y"), wp("a:y, x"));
        assert_ne!(wp("a:x"), wp("a:x:y"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!wp("Nexus:*").implies(&wp("nexus:read")));
        assert!(!wp("nexus:READ").implies(&wp("nexus:read")));
        assert!(!WildcardPermission::from_constant("nexus:read").implies(&wp("Nexus:read")));
    }
}
