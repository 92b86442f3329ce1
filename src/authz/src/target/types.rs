//! Repository targets and content classes

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use super::matcher::{PathMatcher, MATCH_ALL};
use crate::error::{AuthzError, Result};

/// Classification of repository content (maven2, npm, ...)
///
/// `is_compatible` need not be symmetric, so callers check both directions.
pub trait ContentClass: Send + Sync + fmt::Debug {
    /// Content class identifier
    fn id(&self) -> &str;

    /// True if content of `other` may be served where this class is expected
    fn is_compatible(&self, other: &dyn ContentClass) -> bool;
}

/// Content class with a fixed list of compatible class ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticContentClass {
    id: String,
    compatible_with: HashSet<String>,
}

impl StaticContentClass {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            compatible_with: HashSet::new(),
        }
    }

    /// Declare compatibility with another class id (one direction only)
    pub fn compatible_with(mut self, other: impl Into<String>) -> Self {
        self.compatible_with.insert(other.into());
        self
    }
}

impl ContentClass for StaticContentClass {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_compatible(&self, other: &dyn ContentClass) -> bool {
        self.id == other.id() || self.compatible_with.contains(other.id())
    }
}

/// Named set of path patterns scoped to a content class
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use artifact_authz::target::{StaticContentClass, Target};
///
/// let maven = Arc::new(StaticContentClass::new("maven2"));
/// let target = Target::new("releases", "Releases", maven.clone(), ["/org/acme/.*"]).unwrap();
///
/// assert!(target.is_path_contained(maven.as_ref(), "/org/acme/lib/1.0/lib-1.0.jar"));
/// assert!(!target.is_path_contained(maven.as_ref(), "/com/other/lib.jar"));
/// ```
pub struct Target {
    id: String,
    name: String,
    content_class: Arc<dyn ContentClass>,
    pattern_texts: BTreeSet<String>,
    /// Ordered cheapest first; a single `Any` when a pattern is `.*`
    matchers: Vec<PathMatcher>,
}

impl Target {
    /// Builds a target and compiles its patterns
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidTarget` if a pattern is not a valid regex.
    pub fn new<I, S>(
        id: impl Into<String>,
        name: impl Into<String>,
        content_class: Arc<dyn ContentClass>,
        patterns: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let pattern_texts: BTreeSet<String> = patterns.into_iter().map(Into::into).collect();

        let matchers = if pattern_texts.contains(MATCH_ALL) {
            vec![PathMatcher::Any]
        } else {
            let mut matchers = Vec::with_capacity(pattern_texts.len());
            for pattern in &pattern_texts {
                let matcher = PathMatcher::compile(pattern).map_err(|e| {
                    AuthzError::InvalidTarget(format!(
                        "Target '{}' has invalid pattern '{}': {}",
                        id, pattern, e
                    ))
                })?;
                matchers.push(matcher);
            }
            matchers.sort_by_key(PathMatcher::cost);
            matchers
        };

        Ok(Self {
            id,
            name: name.into(),
            content_class,
            pattern_texts,
            matchers,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_class(&self) -> &dyn ContentClass {
        self.content_class.as_ref()
    }

    pub fn pattern_texts(&self) -> &BTreeSet<String> {
        &self.pattern_texts
    }

    pub fn matchers(&self) -> &[PathMatcher] {
        &self.matchers
    }

    /// True if content classes line up and any pattern matches `path`
    pub fn is_path_contained(&self, content_class: &dyn ContentClass, path: &str) -> bool {
        if !self.accepts_content_class(content_class) {
            return false;
        }
        self.matchers.iter().any(|matcher| matcher.matches(path))
    }

    fn accepts_content_class(&self, other: &dyn ContentClass) -> bool {
        let own = self.content_class.as_ref();
        own.id() == other.id() || own.is_compatible(other) || other.is_compatible(own)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("content_class", &self.content_class.id())
            .field("matchers", &self.matchers)
            .finish()
    }
}
