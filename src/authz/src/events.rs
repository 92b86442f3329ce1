//! Security configuration events

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::roles::RolePermissionResolver;

/// Notifications that affect cached authorization data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    /// Roles or privileges changed
    AuthorizationConfigurationChanged,
    /// Realm or user configuration changed
    SecurityConfigurationChanged,
    /// Application is stopping
    Shutdown,
}

impl RolePermissionResolver {
    /// Apply one event
    pub async fn on_event(&self, event: SecurityEvent) {
        debug!(?event, "Security event received");
        match event {
            SecurityEvent::AuthorizationConfigurationChanged
            | SecurityEvent::SecurityConfigurationChanged => self.invalidate(),
            SecurityEvent::Shutdown => self.shutdown().await,
        }
    }
}

/// Feed broadcast events to the resolver until `Shutdown` or channel close
pub fn spawn_event_listener(
    resolver: Arc<RolePermissionResolver>,
    mut events: broadcast::Receiver<SecurityEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    resolver.on_event(event).await;
                    if event == SecurityEvent::Shutdown {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Missed events may have been changes
                    warn!(skipped, "Security event listener lagged, invalidating");
                    resolver.invalidate();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("Security event listener stopped");
    })
}
