//! Per-entity repository that applies tenant scoping to every read and write.

use super::entity::{EntityDescriptor, ScopingStrategy};
use super::query::{ScopedQuery, TenantFilter};
use crate::context::TenantContextResolver;
use crate::error::AppError;
use crate::models::{Record, TenantId};
use crate::persistence::EntityStore;

/// Data access for one entity type, filtered by the resolver's current tenant.
///
/// Directly scoped entities are filtered on their tenant column; entities
/// scoped through a parent are filtered on the parent chain. Without a
/// resolvable tenant every automatic query matches nothing.
pub struct ScopedRepository<'a> {
    entity: &'static EntityDescriptor,
    resolver: &'a TenantContextResolver,
    store: &'a dyn EntityStore,
}

/// One step while walking a row up to its tenant.
enum Step {
    Tenant(Option<TenantId>),
    Parent(&'static EntityDescriptor, Option<i64>),
}

impl Step {
    fn of(entity: &'static EntityDescriptor, row: &Record) -> Self {
        match entity.scoping {
            ScopingStrategy::DirectColumn { column } => Step::Tenant(row.get_i64(column).map(TenantId)),
            ScopingStrategy::ViaParent {
                foreign_key,
                parent,
            } => Step::Parent(parent, row.get_i64(foreign_key)),
        }
    }
}

impl<'a> ScopedRepository<'a> {
    pub fn new(
        entity: &'static EntityDescriptor,
        resolver: &'a TenantContextResolver,
        store: &'a dyn EntityStore,
    ) -> Self {
        Self {
            entity,
            resolver,
            store,
        }
    }

    pub fn entity(&self) -> &'static EntityDescriptor {
        self.entity
    }

    /// Query restricted to the current tenant, or matching nothing without one.
    pub async fn query(&self) -> Result<ScopedQuery, AppError> {
        let tenant_id = self.resolver.current_id().await?;
        if tenant_id.is_none() {
            tracing::debug!(entity = self.entity.name, "No tenant context, query matches nothing");
        }
        Ok(ScopedQuery::new(self.entity, TenantFilter::for_optional(tenant_id)))
    }

    pub async fn for_current_tenant(&self) -> Result<ScopedQuery, AppError> {
        self.query().await
    }

    /// Query restricted to a caller-given tenant, ignoring the context.
    pub fn for_tenant(&self, tenant_id: TenantId) -> ScopedQuery {
        ScopedQuery::new(self.entity, TenantFilter::Tenant(tenant_id))
    }

    /// Administrative bypass of tenant filtering.
    pub fn unscoped(&self) -> ScopedQuery {
        tracing::info!(entity = self.entity.name, "Unscoped query requested");
        ScopedQuery::new(self.entity, TenantFilter::Unscoped)
    }

    #[tracing::instrument(skip(self, query), fields(entity = self.entity.name, tenant = ?query.tenant()))]
    pub async fn fetch(&self, query: &ScopedQuery) -> Result<Vec<Record>, AppError> {
        if !query.entity().is_same(self.entity) {
            return Err(AppError::InvalidInput(format!(
                "query for {} used with the {} repository",
                query.entity().name,
                self.entity.name
            )));
        }
        query.validate()?;

        if query.is_empty_by_construction() {
            return Ok(Vec::new());
        }
        self.store.fetch(query).await
    }

    pub async fn first(&self, query: ScopedQuery) -> Result<Option<Record>, AppError> {
        Ok(self.fetch(&query.limit(1)).await?.into_iter().next())
    }

    /// Row by id within the current tenant.
    pub async fn find(&self, id: i64) -> Result<Option<Record>, AppError> {
        let query = self.query().await?.filter_eq(self.entity.id_column, id);
        self.first(query).await
    }

    /// Persist a new row.
    ///
    /// With a current tenant the row is owned by it, whatever tenant the
    /// payload names. Without a context a directly scoped row is stored as
    /// given, while a row scoped through a parent is refused.
    #[tracing::instrument(skip(self, values), fields(entity = self.entity.name))]
    pub async fn create(&self, values: Record) -> Result<Record, AppError> {
        match self.resolver.current_id().await? {
            Some(tenant_id) => self.create_in_tenant(tenant_id, values).await,
            None if self.entity.parent_link().is_some() => Err(AppError::NoTenantContext),
            None => self.store.insert(self.entity, values).await,
        }
    }

    /// Persist a new row owned by `tenant_id`, overriding any tenant in `values`.
    pub(crate) async fn create_in_tenant(
        &self,
        tenant_id: TenantId,
        mut values: Record,
    ) -> Result<Record, AppError> {
        match self.entity.scoping {
            ScopingStrategy::DirectColumn { column } => {
                if let Some(given) = values.get_i64(column).filter(|given| *given != tenant_id.get()) {
                    tracing::warn!(
                        entity = self.entity.name,
                        given,
                        tenant_id = %tenant_id,
                        "Ignoring tenant id supplied in payload"
                    );
                }
                values.set(column, tenant_id.get());
            }
            ScopingStrategy::ViaParent { .. } => {
                self.ensure_parent_in_tenant(&values, tenant_id).await?;
            }
        }
        self.store.insert(self.entity, values).await
    }

    /// Refuse a write whose parent reference does not lead to `tenant_id`.
    pub(crate) async fn ensure_parent_in_tenant(
        &self,
        values: &Record,
        tenant_id: TenantId,
    ) -> Result<(), AppError> {
        let Some((foreign_key, parent)) = self.entity.parent_link() else {
            return Ok(());
        };
        let parent_id = values.get_i64(foreign_key);
        if self.effective_tenant_id(values).await? == Some(tenant_id) {
            return Ok(());
        }
        tracing::warn!(
            entity = self.entity.name,
            parent = parent.name,
            parent_id = ?parent_id,
            tenant_id = %tenant_id,
            "Parent does not belong to the current tenant"
        );
        Err(AppError::foreign(parent.name, parent_id.unwrap_or_default()))
    }

    /// Tenant the row belongs to, following parent links as needed.
    ///
    /// `None` when any link on the way is null or points at a missing row.
    pub async fn effective_tenant_id(&self, row: &Record) -> Result<Option<TenantId>, AppError> {
        let mut step = Step::of(self.entity, row);
        loop {
            match step {
                Step::Tenant(tenant_id) => return Ok(tenant_id),
                Step::Parent(_, None) => return Ok(None),
                Step::Parent(parent, Some(parent_id)) => {
                    match self.store.find_by_id(parent, parent_id).await? {
                        Some(parent_row) => step = Step::of(parent, &parent_row),
                        None => return Ok(None),
                    }
                }
            }
        }
    }

    pub async fn belongs_to_tenant(&self, row: &Record, tenant_id: TenantId) -> Result<bool, AppError> {
        Ok(self.effective_tenant_id(row).await? == Some(tenant_id))
    }

    /// False when there is no current tenant or the row has no effective one.
    pub async fn belongs_to_current_tenant(&self, row: &Record) -> Result<bool, AppError> {
        match self.resolver.current_id().await? {
            Some(tenant_id) => self.belongs_to_tenant(row, tenant_id).await,
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{RequestContextStore, TenantContextResolver};
    use crate::memory::{MemoryEntityStore, MemoryTenantDirectory};
    use crate::models::Principal;
    use crate::scoping::catalog::{PRODUCT, PRODUCT_VARIANT, STORE};
    use std::sync::Arc;

    fn resolver_for(tenant: Option<i64>) -> TenantContextResolver {
        let directory = Arc::new(MemoryTenantDirectory::with_tenants([1, 2]));
        let principal = tenant.map(|t| Principal::new(10).with_tenant(TenantId(t)));
        TenantContextResolver::new(Arc::new(RequestContextStore::new()), directory, principal)
    }

    #[tokio::test]
    async fn create_owns_row_by_current_tenant() {
        let store = MemoryEntityStore::new();
        let resolver = resolver_for(Some(1));
        let repo = ScopedRepository::new(&STORE, &resolver, &store);

        let stamped = repo.create(Record::new().with("nome", "Centro")).await.unwrap();
        assert_eq!(stamped.get_i64("empresa_id"), Some(1));

        let overridden = repo
            .create(Record::new().with("nome", "Filial").with("empresa_id", 2))
            .await
            .unwrap();
        assert_eq!(overridden.get_i64("empresa_id"), Some(1));
        let persisted = store.raw(&STORE, overridden.id().unwrap()).unwrap();
        assert_eq!(persisted.get_i64("empresa_id"), Some(1));
    }

    #[tokio::test]
    async fn create_without_context_leaves_column_unset() {
        let store = MemoryEntityStore::new();
        let resolver = resolver_for(None);
        let repo = ScopedRepository::new(&STORE, &resolver, &store);

        let row = repo.create(Record::new().with("nome", "Centro")).await.unwrap();
        assert!(row.is_null("empresa_id"));
        assert!(repo.find(row.id().unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transitive_create_checks_parent() {
        let store = MemoryEntityStore::new();
        let own = store.seed(&PRODUCT, Record::new().with("empresa_id", 1).with("nome", "A"));
        let foreign = store.seed(&PRODUCT, Record::new().with("empresa_id", 2).with("nome", "B"));
        let resolver = resolver_for(Some(1));
        let repo = ScopedRepository::new(&PRODUCT_VARIANT, &resolver, &store);

        let ok = repo
            .create(Record::new().with("produto_id", own.id().unwrap()))
            .await
            .unwrap();
        assert!(repo.belongs_to_current_tenant(&ok).await.unwrap());

        let refused = repo
            .create(Record::new().with("produto_id", foreign.id().unwrap()))
            .await;
        assert!(matches!(refused, Err(AppError::ForeignTenantAccess { .. })));

        let orphan = repo.create(Record::new().with("sku_variacao", "X")).await;
        assert!(matches!(orphan, Err(AppError::ForeignTenantAccess { .. })));
        assert_eq!(store.rows(&PRODUCT_VARIANT).len(), 1);
    }

    #[tokio::test]
    async fn effective_tenant_is_none_for_broken_chain() {
        let store = MemoryEntityStore::new();
        let resolver = resolver_for(Some(1));
        let repo = ScopedRepository::new(&PRODUCT_VARIANT, &resolver, &store);

        let dangling = Record::new().with("produto_id", 999);
        assert_eq!(repo.effective_tenant_id(&dangling).await.unwrap(), None);
        assert!(!repo.belongs_to_current_tenant(&dangling).await.unwrap());
    }

    #[tokio::test]
    async fn fetch_rejects_query_for_other_entity() {
        let store = MemoryEntityStore::new();
        let resolver = resolver_for(Some(1));
        let repo = ScopedRepository::new(&STORE, &resolver, &store);

        let query = ScopedQuery::new(&PRODUCT, TenantFilter::Unscoped);
        assert!(matches!(repo.fetch(&query).await, Err(AppError::InvalidInput(_))));
    }
}
