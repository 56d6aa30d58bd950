//! Resolution of the active tenant for a request.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::policy::{AccessPolicy, RoleExemption};
use super::store::TenantContextStore;
use crate::error::AppError;
use crate::models::{Principal, Tenant, TenantId};
use crate::persistence::TenantDirectory;

/// Produces the current tenant on demand and keeps the context store honest.
///
/// A stored id is only trusted while the tenant still exists and the
/// principal may act as it. Anything else is discarded and re-derived from the
/// principal.
///
/// [`run_as`](Self::run_as) overrides are kept on the resolver itself and
/// never written to the store, so other resolvers sharing a session store do
/// not observe them. While an override is active only its existence is
/// checked.
pub struct TenantContextResolver {
    store: Arc<dyn TenantContextStore>,
    directory: Arc<dyn TenantDirectory>,
    principal: Option<Principal>,
    policy: Arc<dyn AccessPolicy>,
    overrides: Mutex<Vec<(u64, TenantId)>>,
    next_override: AtomicU64,
}

impl TenantContextResolver {
    pub fn new(
        store: Arc<dyn TenantContextStore>,
        directory: Arc<dyn TenantDirectory>,
        principal: Option<Principal>,
    ) -> Self {
        Self {
            store,
            directory,
            principal,
            policy: Arc::new(RoleExemption::default()),
            overrides: Mutex::new(Vec::new()),
            next_override: AtomicU64::new(0),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Derive the context from the principal's own tenant.
    #[tracing::instrument(skip(self), fields(user_id = self.principal.as_ref().map(|p| p.user_id)))]
    pub async fn resolve_from_principal(&self) -> Result<Option<Tenant>, AppError> {
        let Some(tenant_id) = self.principal.as_ref().and_then(|p| p.tenant_id) else {
            self.store.clear();
            return Ok(None);
        };

        match self.directory.find_tenant(tenant_id).await? {
            Some(tenant) => {
                self.store.set(tenant.id);
                tracing::debug!(tenant_id = %tenant.id, "Tenant context bound from principal");
                Ok(Some(tenant))
            }
            None => {
                tracing::warn!(tenant_id = %tenant_id, "Principal references a missing tenant");
                self.store.clear();
                Ok(None)
            }
        }
    }

    pub async fn current(&self) -> Result<Option<Tenant>, AppError> {
        if let Some(tenant_id) = self.active_override() {
            let tenant = self.directory.find_tenant(tenant_id).await?;
            if tenant.is_none() {
                tracing::debug!(tenant_id = %tenant_id, "Tenant of run_as no longer exists");
            }
            return Ok(tenant);
        }

        let Some(stored) = self.store.get() else {
            return self.resolve_from_principal().await;
        };

        match self.directory.find_tenant(stored).await? {
            Some(tenant) if self.is_authorized(tenant.id) => Ok(Some(tenant)),
            Some(_) => {
                tracing::debug!(tenant_id = %stored, "Stored tenant no longer authorized, re-resolving");
                self.store.clear();
                self.resolve_from_principal().await
            }
            None => {
                tracing::debug!(tenant_id = %stored, "Stored tenant no longer exists, re-resolving");
                self.store.clear();
                self.resolve_from_principal().await
            }
        }
    }

    pub async fn current_id(&self) -> Result<Option<TenantId>, AppError> {
        Ok(self.current().await?.map(|tenant| tenant.id))
    }

    /// Force the context to a tenant, bypassing principal derivation.
    ///
    /// The next [`current`](Self::current) still checks authorization, so the
    /// value only sticks for principals allowed to act as that tenant.
    pub fn set_explicit(&self, tenant: &Tenant) {
        tracing::info!(tenant_id = %tenant.id, "Tenant context set explicitly");
        self.store.set(tenant.id);
    }

    /// Load a tenant by id and bind it explicitly ("view as tenant").
    pub async fn set_explicit_id(&self, tenant_id: TenantId) -> Result<Tenant, AppError> {
        let tenant = self
            .directory
            .find_tenant(tenant_id)
            .await?
            .ok_or(AppError::TenantNotFound(tenant_id))?;
        self.set_explicit(&tenant);
        Ok(tenant)
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// A tenant is bound (stored or through `run_as`) and still valid.
    pub async fn has_context(&self) -> Result<bool, AppError> {
        if self.active_override().is_none() && self.store.get().is_none() {
            return Ok(false);
        }
        Ok(self.current().await?.is_some())
    }

    /// Drop whatever is stored and derive the context from the principal again.
    pub async fn refresh(&self) -> Result<Option<Tenant>, AppError> {
        self.store.clear();
        self.resolve_from_principal().await
    }

    /// Run `work` with the context bound to `tenant_id`, then return to the
    /// context that was active before, also when `work` fails or is dropped.
    ///
    /// A missing target fails with [`AppError::TenantNotFound`] before the
    /// context is touched. Nested calls unwind in stack order.
    #[tracing::instrument(skip(self, work))]
    pub async fn run_as<F, Fut, R>(&self, tenant_id: TenantId, work: F) -> Result<R, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, AppError>>,
    {
        let previous = self.current_id().await?;

        let target = self
            .directory
            .find_tenant(tenant_id)
            .await?
            .ok_or(AppError::TenantNotFound(tenant_id))?;

        let _guard = OverrideGuard::push(self, target.id);
        tracing::debug!(previous = ?previous, "Running as tenant");

        work().await
    }

    fn active_override(&self) -> Option<TenantId> {
        let overrides = self.overrides.lock().unwrap_or_else(|e| e.into_inner());
        overrides.last().map(|(_, tenant_id)| *tenant_id)
    }

    fn is_authorized(&self, tenant_id: TenantId) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|principal| self.policy.may_act_as(principal, tenant_id))
    }
}

/// One active `run_as` override; removed again when dropped.
struct OverrideGuard<'a> {
    resolver: &'a TenantContextResolver,
    token: u64,
}

impl<'a> OverrideGuard<'a> {
    fn push(resolver: &'a TenantContextResolver, tenant_id: TenantId) -> Self {
        let token = resolver.next_override.fetch_add(1, Ordering::Relaxed);
        resolver
            .overrides
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((token, tenant_id));
        Self { resolver, token }
    }
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        let mut overrides = self
            .resolver
            .overrides
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        overrides.retain(|(token, _)| *token != self.token);
    }
}
