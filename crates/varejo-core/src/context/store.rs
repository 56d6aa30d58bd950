//! Storage for the active tenant id.
//!
//! Stores hold one id and nothing else. Whether that id is still valid for
//! the principal is decided by the resolver, never here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::TenantId;

pub trait TenantContextStore: Send + Sync {
    fn get(&self) -> Option<TenantId>;
    fn set(&self, tenant_id: TenantId);
    fn clear(&self);
}

/// Context that lives for a single request.
#[derive(Debug, Default)]
pub struct RequestContextStore {
    slot: Mutex<Option<TenantId>>,
}

impl RequestContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TenantContextStore for RequestContextStore {
    fn get(&self) -> Option<TenantId> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, tenant_id: TenantId) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(tenant_id);
    }

    fn clear(&self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Context kept per session id, shared by every request of that session.
#[derive(Debug, Clone, Default)]
pub struct SessionContextStore {
    sessions: Arc<Mutex<HashMap<String, TenantId>>>,
}

impl SessionContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store view bound to one session.
    pub fn handle(&self, session_id: impl Into<String>) -> SessionContext {
        SessionContext {
            session_id: session_id.into(),
            sessions: Arc::clone(&self.sessions),
        }
    }

    /// Drop everything remembered for a session (logout, expiry).
    pub fn forget(&self, session_id: &str) {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session_id);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    session_id: String,
    sessions: Arc<Mutex<HashMap<String, TenantId>>>,
}

impl SessionContext {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl TenantContextStore for SessionContext {
    fn get(&self) -> Option<TenantId> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&self.session_id)
            .copied()
    }

    fn set(&self, tenant_id: TenantId) {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(self.session_id.clone(), tenant_id);
    }

    fn clear(&self) {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.session_id);
    }
}
