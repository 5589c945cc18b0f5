use super::id::SessionId;
use crate::error::SessionError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Tracks which session ids currently have a live connection
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    active: Arc<Mutex<HashSet<SessionId>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `id` for one connection; released when the claim is dropped
    pub fn claim(&self, id: &SessionId) -> Result<SessionClaim, SessionError> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(id.clone()) {
            return Err(SessionError::AlreadyActive(id.to_string()));
        }

        debug!(session_id = %id, "Session claimed");

        Ok(SessionClaim {
            id: id.clone(),
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, id: &SessionId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Exclusive hold on a session id
#[derive(Debug)]
pub struct SessionClaim {
    id: SessionId,
    active: Arc<Mutex<HashSet<SessionId>>>,
}

impl SessionClaim {
    pub fn id(&self) -> &SessionId {
        &self.id
    }
}

impl Drop for SessionClaim {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
        debug!(session_id = %self.id, "Session released");
    }
}
