//! Tenant-aware CRUD helpers.
//!
//! [`TenantAwareRepository`] is the sanctioned entry point for callers that
//! change data on behalf of the current tenant. Reads degrade to empty results
//! without a context; writes fail with [`AppError::NoTenantContext`] or
//! [`AppError::ForeignTenantAccess`] and leave the store untouched.

use std::future::Future;

use crate::context::TenantContextResolver;
use crate::error::AppError;
use crate::models::{Record, TenantId};
use crate::persistence::EntityStore;
use crate::scoping::{
    EntityDescriptor, ScopedQuery, ScopedRepository, ScopingStrategy, TenantFilter,
};

pub struct TenantAwareRepository<'a> {
    resolver: &'a TenantContextResolver,
    store: &'a dyn EntityStore,
}

impl<'a> TenantAwareRepository<'a> {
    pub fn new(resolver: &'a TenantContextResolver, store: &'a dyn EntityStore) -> Self {
        Self { resolver, store }
    }

    pub fn resolver(&self) -> &'a TenantContextResolver {
        self.resolver
    }

    pub fn repository(&self, entity: &'static EntityDescriptor) -> ScopedRepository<'a> {
        ScopedRepository::new(entity, self.resolver, self.store)
    }

    async fn require_tenant(&self) -> Result<TenantId, AppError> {
        self.resolver
            .current_id()
            .await?
            .ok_or(AppError::NoTenantContext)
    }

    /// Create a row owned by the current tenant. The context wins over any
    /// tenant id present in `data`.
    #[tracing::instrument(skip(self, data), fields(entity = entity.name))]
    pub async fn create_for_current_tenant(
        &self,
        entity: &'static EntityDescriptor,
        data: Record,
    ) -> Result<Record, AppError> {
        let tenant_id = self.require_tenant().await?;
        let created = self
            .repository(entity)
            .create_in_tenant(tenant_id, data)
            .await?;
        tracing::info!(tenant_id = %tenant_id, id = ?created.id(), "Created scoped row");
        Ok(created)
    }

    /// Apply `data` to `record` after checking it belongs to the current tenant.
    ///
    /// Ownership is checked against the persisted row, not the caller's copy.
    /// The tenant column is never reassigned; a changed parent reference must
    /// point inside the current tenant.
    #[tracing::instrument(skip(self, record, data), fields(entity = entity.name, id = ?record.id()))]
    pub async fn update_for_current_tenant(
        &self,
        entity: &'static EntityDescriptor,
        record: &Record,
        mut data: Record,
    ) -> Result<bool, AppError> {
        let tenant_id = self.require_tenant().await?;
        let repo = self.repository(entity);
        let Some(id) = self.owned_row_id(&repo, record, tenant_id).await? else {
            return Ok(false);
        };

        data.remove(entity.id_column);
        match entity.scoping {
            ScopingStrategy::DirectColumn { column } => {
                if data.remove(column).is_some() {
                    tracing::debug!(column, "Dropped tenant column from update payload");
                }
            }
            ScopingStrategy::ViaParent { foreign_key, .. } => {
                if data.get(foreign_key).is_some() {
                    repo.ensure_parent_in_tenant(&data, tenant_id).await?;
                }
            }
        }

        Ok(self.store.update(entity, id, data).await?.is_some())
    }

    /// Delete `record` (softly where supported) after the ownership check.
    #[tracing::instrument(skip(self, record), fields(entity = entity.name, id = ?record.id()))]
    pub async fn delete_for_current_tenant(
        &self,
        entity: &'static EntityDescriptor,
        record: &Record,
    ) -> Result<bool, AppError> {
        let tenant_id = self.require_tenant().await?;
        let repo = self.repository(entity);
        let Some(id) = self.owned_row_id(&repo, record, tenant_id).await? else {
            return Ok(false);
        };
        self.store.delete(entity, id).await
    }

    /// Id of the persisted row behind `record` when it belongs to `tenant_id`.
    /// `None` when the row no longer exists.
    async fn owned_row_id(
        &self,
        repo: &ScopedRepository<'a>,
        record: &Record,
        tenant_id: TenantId,
    ) -> Result<Option<i64>, AppError> {
        let entity = repo.entity();
        let id = record
            .id()
            .ok_or_else(|| AppError::InvalidInput(format!("{} record has no id", entity.name)))?;

        let Some(persisted) = self.store.find_by_id(entity, id).await? else {
            return Ok(None);
        };
        if !repo.belongs_to_tenant(&persisted, tenant_id).await? {
            tracing::warn!(entity = entity.name, id, tenant_id = %tenant_id, "Refused foreign tenant write");
            return Err(AppError::foreign(entity.name, id));
        }
        Ok(Some(id))
    }

    /// Row by id within the current tenant; `None` without a context.
    pub async fn find_for_current_tenant(
        &self,
        entity: &'static EntityDescriptor,
        id: i64,
    ) -> Result<Option<Record>, AppError> {
        self.repository(entity).find(id).await
    }

    /// Query for the current tenant, matching nothing without a context.
    pub async fn query_for_current_tenant(
        &self,
        entity: &'static EntityDescriptor,
    ) -> Result<ScopedQuery, AppError> {
        self.repository(entity).for_current_tenant().await
    }

    /// Execute a query built for the current tenant.
    ///
    /// Queries scoped to another tenant, or not scoped at all, return no rows
    /// here; administrative reads go through [`ScopedRepository::fetch`].
    pub async fn fetch(&self, query: &ScopedQuery) -> Result<Vec<Record>, AppError> {
        let entity = query.entity();
        match query.tenant() {
            TenantFilter::Nothing => return Ok(Vec::new()),
            TenantFilter::Tenant(tenant_id) if self.resolver.current_id().await? == Some(tenant_id) => {}
            filter => {
                tracing::warn!(
                    entity = entity.name,
                    filter = ?filter,
                    "Refused query not scoped to the current tenant"
                );
                return Ok(Vec::new());
            }
        }
        self.repository(entity).fetch(query).await
    }

    /// Shorthand for [`TenantContextResolver::run_as`].
    pub async fn run_as<F, Fut, R>(&self, tenant_id: TenantId, work: F) -> Result<R, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, AppError>>,
    {
        self.resolver.run_as(tenant_id, work).await
    }
}
