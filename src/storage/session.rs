//! Session record storage across the durable and transient scopes.

use std::sync::Arc;
use tracing::{debug, warn};

use super::{StorageError, StorageScope};
use crate::db::Session;

/// Which scope a session is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Survives application restarts ("remember me")
    Durable,
    /// Cleared when the process ends
    Transient,
}

impl Durability {
    pub fn from_remember(remember: bool) -> Self {
        if remember {
            Durability::Durable
        } else {
            Durability::Transient
        }
    }

    fn other(self) -> Self {
        match self {
            Durability::Durable => Durability::Transient,
            Durability::Transient => Durability::Durable,
        }
    }
}

/// Single read/write path for the session record.
///
/// Saving into one scope removes the record from the other, so at most one
/// copy exists at a time. Reads prefer the durable scope.
pub struct SessionStorage {
    durable: Arc<dyn StorageScope>,
    transient: Arc<dyn StorageScope>,
    key: String,
}

impl SessionStorage {
    pub fn new(
        durable: Arc<dyn StorageScope>,
        transient: Arc<dyn StorageScope>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            durable,
            transient,
            key: key.into(),
        }
    }

    fn scope(&self, durability: Durability) -> &dyn StorageScope {
        match durability {
            Durability::Durable => self.durable.as_ref(),
            Durability::Transient => self.transient.as_ref(),
        }
    }

    pub fn save(&self, session: &Session, durability: Durability) -> Result<(), StorageError> {
        let raw = serde_json::to_string(session)?;
        self.scope(durability).set(&self.key, &raw)?;
        self.scope(durability.other()).remove(&self.key)?;
        debug!(account_id = session.id, ?durability, "Stored session");
        Ok(())
    }

    /// The stored session, if any. The first scope holding a value decides the
    /// result; a value that fails to parse yields `None`.
    pub fn load(&self) -> Option<Session> {
        for durability in [Durability::Durable, Durability::Transient] {
            let raw = match self.scope(durability).get(&self.key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!(?durability, error = %e, "Failed to read session storage");
                    continue;
                }
            };

            return match serde_json::from_str(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(?durability, error = %e, "Discarding malformed session record");
                    None
                }
            };
        }
        None
    }

    /// Remove the record from both scopes. Failures are logged, not returned.
    pub fn clear(&self) {
        for durability in [Durability::Durable, Durability::Transient] {
            if let Err(e) = self.scope(durability).remove(&self.key) {
                warn!(?durability, error = %e, "Failed to clear session storage");
            }
        }
    }
}
