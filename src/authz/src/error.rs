//! Error types for the authorization engine

use thiserror::Error;

/// Authorization engine errors
///
/// `Clone` so a failed authorization lookup can be remembered for the rest
/// of a request and raised again without recomputing it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// Principal could not be authorized (unknown user, disabled realm, ...)
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Operation not supported by this component
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Configuration store failure surfaced to the caller
    #[error("Configuration store error: {0}")]
    Configuration(String),

    /// Permission text could not be parsed
    #[error("Invalid permission: {0}")]
    InvalidPermission(String),

    /// Target pattern could not be compiled
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// Engine configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Errors reported by the configuration store collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Role id is not defined
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// Privilege id is not defined
    #[error("Privilege not found: {0}")]
    PrivilegeNotFound(String),

    /// Store could not be read (locked, reloading, I/O, ...)
    #[error("Configuration unavailable: {0}")]
    Unavailable(String),
}

impl ConfigError {
    /// True for the "not found" family, which traversal treats as non-fatal
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RoleNotFound(_) | Self::PrivilegeNotFound(_))
    }
}

impl From<ConfigError> for AuthzError {
    fn from(err: ConfigError) -> Self {
        AuthzError::Configuration(err.to_string())
    }
}

/// Raised by user managers when a user (or its mapping in a realm) is unknown
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("User not found: {user_id} (source: {source_name})")]
pub struct UserNotFound {
    pub user_id: String,
    pub source_name: String,
}

impl UserNotFound {
    pub fn new(user_id: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            source_name: source_name.into(),
        }
    }
}
