//! Compiled path matchers
//!
//! Common pattern shapes are turned into plain string operations so the hot
//! path avoids regex evaluation; everything else becomes an anchored regex.
//! Patterns with lookaround go through a backtracking engine.

use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Pattern that matches every path
pub const MATCH_ALL: &str = ".*";

const EXCLUDE_PREFIX: &str = "(?!.*";
const EXCLUDE_SUFFIX: &str = ".*).*";
const LOOKAROUND: &[&str] = &["(?=", "(?!", "(?<=", "(?<!"];
const REGEX_META: &[char] = &['.', '^', '$', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|'];

/// Pattern compilation failure
#[derive(Error, Debug)]
pub enum PatternError {
    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Lookaround(#[from] Box<fancy_regex::Error>),
}

/// A single compiled path pattern
#[derive(Clone)]
pub enum PathMatcher {
    /// `.*`
    Any,
    /// Literal pattern
    Exact(Box<str>),
    /// `LIT.*`
    Prefix(Box<str>),
    /// `.*LIT.*`
    Contains(Box<str>),
    /// `(?!.*LIT.*).*`
    Excludes(Box<str>),
    /// Anything else, matched against the whole path
    Pattern(Regex),
    /// Lookahead or lookbehind patterns
    Lookaround(fancy_regex::Regex),
}

impl PathMatcher {
    /// Compiles a pattern, recognising the cheap shapes first
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern == MATCH_ALL {
            return Ok(PathMatcher::Any);
        }

        if let Some(inner) = pattern
            .strip_prefix(EXCLUDE_PREFIX)
            .and_then(|rest| rest.strip_suffix(EXCLUDE_SUFFIX))
        {
            if let Some(literal) = regex_literal(inner) {
                return Ok(PathMatcher::Excludes(literal.into()));
            }
        }

        if let Some(inner) = pattern
            .strip_prefix(MATCH_ALL)
            .and_then(|rest| rest.strip_suffix(MATCH_ALL))
        {
            if let Some(literal) = regex_literal(inner) {
                return Ok(PathMatcher::Contains(literal.into()));
            }
        }

        if let Some(inner) = pattern.strip_suffix(MATCH_ALL) {
            if let Some(literal) = regex_literal(inner) {
                return Ok(PathMatcher::Prefix(literal.into()));
            }
        }

        if let Some(literal) = regex_literal(pattern) {
            return Ok(PathMatcher::Exact(literal.into()));
        }

        let anchored = format!("^(?:{})$", pattern);
        if LOOKAROUND.iter().any(|token| pattern.contains(token)) {
            return fancy_regex::Regex::new(&anchored)
                .map(PathMatcher::Lookaround)
                .map_err(|e| PatternError::from(Box::new(e)));
        }

        Ok(PathMatcher::Pattern(Regex::new(&anchored)?))
    }

    /// True if the whole path matches
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Any => true,
            PathMatcher::Exact(literal) => path == &**literal,
            PathMatcher::Prefix(prefix) => path.starts_with(&**prefix),
            PathMatcher::Contains(needle) => path.contains(&**needle),
            PathMatcher::Excludes(needle) => !path.contains(&**needle),
            PathMatcher::Pattern(regex) => regex.is_match(path),
            // Backtrack limit exhaustion counts as no match
            PathMatcher::Lookaround(regex) => matches!(regex.is_match(path), Ok(true)),
        }
    }

    /// Evaluation cost rank; cheaper matchers are tried first
    pub(crate) fn cost(&self) -> u8 {
        match self {
            PathMatcher::Any => 0,
            PathMatcher::Exact(_) => 1,
            PathMatcher::Prefix(_) => 2,
            PathMatcher::Contains(_) | PathMatcher::Excludes(_) => 3,
            PathMatcher::Pattern(_) => 10,
            PathMatcher::Lookaround(_) => 20,
        }
    }
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMatcher::Any => write!(f, "Any"),
            PathMatcher::Exact(s) => write!(f, "Exact({:?})", s),
            PathMatcher::Prefix(s) => write!(f, "Prefix({:?})", s),
            PathMatcher::Contains(s) => write!(f, "Contains({:?})", s),
            PathMatcher::Excludes(s) => write!(f, "Excludes({:?})", s),
            PathMatcher::Pattern(regex) => write!(f, "Pattern({:?})", regex.as_str()),
            PathMatcher::Lookaround(regex) => write!(f, "Lookaround({:?})", regex.as_str()),
        }
    }
}

/// Decodes a regex that only matches one literal string
///
/// Returns `None` as soon as an unescaped metacharacter or a class escape
/// such as `\d` shows up.
fn regex_literal(pattern: &str) -> Option<String> {
    let mut literal = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) if escaped.is_ascii_punctuation() => literal.push(escaped),
                _ => return None,
            },
            c if REGEX_META.contains(&c) => return None,
            c => literal.push(c),
        }
    }

    Some(literal)
}
