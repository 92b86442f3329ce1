//! Per-request memoisation of authentication and authorization results
//!
//! One [`RequestScopedCache`] lives for exactly one authenticated request.
//! It is never evicted and never shared across requests, so nothing in it
//! needs invalidating.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};

use crate::error::Result;
use crate::realm::{AuthenticationInfo, AuthorizationInfo, RealmId};

/// Inbound request state
#[derive(Debug, Default)]
pub struct RequestContext {
    cache: OnceLock<Arc<RequestScopedCache>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The request's cache; the first accessor creates it
    pub fn cache(&self) -> Arc<RequestScopedCache> {
        Arc::clone(self.cache.get_or_init(Default::default))
    }
}

/// Caller identity as seen by the cache lookup
#[derive(Debug, Clone, Default)]
pub struct Subject {
    pub authenticated: bool,
    pub request: Option<Arc<RequestContext>>,
}

impl Subject {
    /// Authenticated subject bound to a request
    pub fn authenticated(request: Arc<RequestContext>) -> Self {
        Self {
            authenticated: true,
            request: Some(request),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Memoised results for one request
#[derive(Debug, Default)]
pub struct RequestScopedCache {
    authentication_info: RwLock<Option<Arc<AuthenticationInfo>>>,
    /// Permission text → decision
    permission_checks: DashMap<String, bool>,
    /// Realm instance → authorization outcome, failures included
    authorization_info: DashMap<RealmId, Result<Arc<AuthorizationInfo>>>,
}

impl RequestScopedCache {
    /// Cache for `subject`
    ///
    /// Authenticated subjects with a request share the request's cache.
    /// Everyone else gets a fresh throwaway instance.
    pub fn for_subject(subject: &Subject) -> Arc<Self> {
        match (&subject.request, subject.authenticated) {
            (Some(request), true) => request.cache(),
            _ => Arc::new(Self::default()),
        }
    }

    pub fn authentication_info(&self) -> Option<Arc<AuthenticationInfo>> {
        self.authentication_info.read().clone()
    }

    pub fn set_authentication_info(&self, info: Arc<AuthenticationInfo>) {
        *self.authentication_info.write() = Some(info);
    }

    pub fn permission_check(&self, permission: &str) -> Option<bool> {
        self.permission_checks.get(permission).map(|entry| *entry.value())
    }

    pub fn record_permission_check(&self, permission: &str, permitted: bool) {
        self.permission_checks.insert(permission.to_string(), permitted);
    }

    /// Cached authorization outcome for a realm, success or failure
    pub fn authorization_info(&self, realm: RealmId) -> Option<Result<Arc<AuthorizationInfo>>> {
        self.authorization_info.get(&realm).map(|entry| entry.value().clone())
    }

    pub fn record_authorization_info(&self, realm: RealmId, outcome: Result<Arc<AuthorizationInfo>>) {
        self.authorization_info.insert(realm, outcome);
    }

    pub fn permission_check_count(&self) -> usize {
        self.permission_checks.len()
    }
}
