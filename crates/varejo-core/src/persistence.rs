//! Persistence collaborators of the tenancy core.
//!
//! The core never talks to a database directly. Tenants are read through a
//! [`TenantDirectory`] and scoped rows through an [`EntityStore`]; `varejo-db`
//! provides the PostgreSQL implementations and [`crate::memory`] the in-process
//! ones.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Record, Tenant, TenantId};
use crate::scoping::{EntityDescriptor, ScopedQuery};

#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Load a tenant by id. Soft-deleted tenants are reported as missing.
    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>, AppError>;

    /// Tenants that are active right now, ordered by display name.
    async fn list_active(&self) -> Result<Vec<Tenant>, AppError>;
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Rows matching the query, tenant filter included.
    async fn fetch(&self, query: &ScopedQuery) -> Result<Vec<Record>, AppError>;

    /// Unscoped load by primary key, soft-deleted rows excluded.
    async fn find_by_id(
        &self,
        entity: &'static EntityDescriptor,
        id: i64,
    ) -> Result<Option<Record>, AppError>;

    /// Persist a new row and return it as stored, generated id included.
    async fn insert(
        &self,
        entity: &'static EntityDescriptor,
        values: Record,
    ) -> Result<Record, AppError>;

    /// Apply `changes` to the row; `None` when it does not exist.
    async fn update(
        &self,
        entity: &'static EntityDescriptor,
        id: i64,
        changes: Record,
    ) -> Result<Option<Record>, AppError>;

    /// Delete the row, softly when the entity supports it. Returns whether a
    /// row was affected.
    async fn delete(&self, entity: &'static EntityDescriptor, id: i64) -> Result<bool, AppError>;
}
