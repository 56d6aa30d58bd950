//! Test helpers: in-memory tenants, rows and per-request resolvers.
//!
//! Run from workspace root: `cargo test -p varejo-core`.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use varejo_core::context::{RequestContextStore, SessionContextStore, TenantContextStore};
use varejo_core::memory::{MemoryEntityStore, MemoryTenantDirectory};
use varejo_core::{Principal, TenantContextResolver, TenantId};

/// Shared backends standing in for the database.
pub struct TestWorld {
    pub directory: Arc<MemoryTenantDirectory>,
    pub store: MemoryEntityStore,
}

impl TestWorld {
    /// World with active tenants 1, 2 and 3.
    pub fn new() -> Self {
        Self {
            directory: Arc::new(MemoryTenantDirectory::with_tenants([1, 2, 3])),
            store: MemoryEntityStore::new(),
        }
    }

    /// Resolver for a regular user of `tenant`, with a fresh request store.
    pub fn user_of(&self, tenant: i64) -> TestRequest {
        self.request(Some(Principal::new(100 + tenant).with_tenant(TenantId(tenant))))
    }

    /// Resolver for a super administrator not bound to any tenant.
    pub fn super_admin(&self) -> TestRequest {
        self.request(Some(Principal::new(1).with_role("super-admin")))
    }

    pub fn anonymous(&self) -> TestRequest {
        self.request(None)
    }

    /// Resolver whose context lives in `session_id` of a shared session store.
    pub fn session_resolver(
        &self,
        sessions: &SessionContextStore,
        session_id: &str,
        principal: Option<Principal>,
    ) -> TenantContextResolver {
        TenantContextResolver::new(
            Arc::new(sessions.handle(session_id)),
            self.directory.clone(),
            principal,
        )
    }

    pub fn request(&self, principal: Option<Principal>) -> TestRequest {
        let context = Arc::new(RequestContextStore::new());
        let resolver = TenantContextResolver::new(context.clone(), self.directory.clone(), principal);
        TestRequest { context, resolver }
    }
}

pub struct TestRequest {
    pub context: Arc<RequestContextStore>,
    pub resolver: TenantContextResolver,
}

impl TestRequest {
    /// Raw value held by the context store, without any validation.
    pub fn stored(&self) -> Option<TenantId> {
        self.context.get()
    }
}
