//! In-process implementations of the persistence collaborators.
//!
//! They evaluate [`ScopedQuery`] with the same rules as the PostgreSQL store:
//! rows scoped through a parent match only when every parent on the chain
//! exists and is not soft-deleted, and soft-deleted rows are hidden unless the
//! query asks for them.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Record, Tenant, TenantId};
use crate::persistence::{EntityStore, TenantDirectory};
use crate::scoping::{Condition, EntityDescriptor, ScopedQuery, ScopingStrategy, SortDirection, TenantFilter};

#[derive(Debug, Default)]
pub struct MemoryTenantDirectory {
    tenants: Mutex<BTreeMap<TenantId, Tenant>>,
}

impl MemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding active sample tenants with the given ids.
    pub fn with_tenants<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let directory = Self::new();
        for id in ids {
            directory.insert(sample_tenant(TenantId(id)));
        }
        directory
    }

    pub fn insert(&self, tenant: Tenant) {
        self.tenants
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(tenant.id, tenant);
    }

    pub fn soft_delete(&self, id: TenantId) -> bool {
        let mut tenants = self.tenants.lock().unwrap_or_else(|e| e.into_inner());
        match tenants.get_mut(&id) {
            Some(tenant) if tenant.deleted_at.is_none() => {
                tenant.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }
}

/// Active tenant with placeholder registration data.
pub fn sample_tenant(id: TenantId) -> Tenant {
    let now = Utc::now();
    Tenant {
        id,
        uuid: Uuid::new_v4(),
        legal_name: format!("Empresa {} LTDA", id),
        trade_name: format!("Empresa {}", id),
        tax_id: None,
        email: format!("contato{}@empresa.com.br", id),
        phone: None,
        active: true,
        joined_at: now - Duration::days(1),
        expires_at: None,
        created_at: Some(now),
        updated_at: Some(now),
        deleted_at: None,
    }
}

#[async_trait]
impl TenantDirectory for MemoryTenantDirectory {
    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>, AppError> {
        let tenants = self.tenants.lock().unwrap_or_else(|e| e.into_inner());
        Ok(tenants.get(&id).filter(|t| !t.is_deleted()).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Tenant>, AppError> {
        let now = Utc::now();
        let tenants = self.tenants.lock().unwrap_or_else(|e| e.into_inner());
        let mut active: Vec<Tenant> = tenants
            .values()
            .filter(|t| t.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| a.display_name().cmp(b.display_name()));
        Ok(active)
    }
}

type Table = BTreeMap<i64, Record>;

/// Rows kept per table name.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    tables: Mutex<HashMap<&'static str, Table>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row directly, bypassing any scoping. Returns the stored row.
    pub fn seed(&self, entity: &'static EntityDescriptor, values: Record) -> Record {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        insert_row(tables.entry(entity.table).or_default(), entity, values)
    }

    /// Every stored row of the entity, soft-deleted ones included.
    pub fn rows(&self, entity: &EntityDescriptor) -> Vec<Record> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables
            .get(entity.table)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Stored row by id, soft-deleted or not.
    pub fn raw(&self, entity: &EntityDescriptor, id: i64) -> Option<Record> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.get(entity.table).and_then(|table| table.get(&id)).cloned()
    }
}

fn insert_row(table: &mut Table, entity: &EntityDescriptor, mut values: Record) -> Record {
    let id = match values.get_i64(entity.id_column) {
        Some(id) => id,
        None => table.keys().next_back().map_or(1, |last| last + 1),
    };
    values.set(entity.id_column, id);
    if entity.timestamps {
        let now = Value::String(Utc::now().to_rfc3339());
        if values.is_null("created_at") {
            values.set("created_at", now.clone());
        }
        values.set("updated_at", now);
    }
    table.insert(id, values.clone());
    values
}

fn is_trashed(entity: &EntityDescriptor, row: &Record) -> bool {
    entity.soft_delete && !row.is_null("deleted_at")
}

/// Live row by id, the same view the SQL store gives through `find_by_id`.
fn live_row<'t>(
    tables: &'t HashMap<&'static str, Table>,
    entity: &EntityDescriptor,
    id: i64,
) -> Option<&'t Record> {
    tables
        .get(entity.table)?
        .get(&id)
        .filter(|row| !is_trashed(entity, row))
}

fn effective_tenant(
    tables: &HashMap<&'static str, Table>,
    entity: &EntityDescriptor,
    row: &Record,
) -> Option<TenantId> {
    match entity.scoping {
        ScopingStrategy::DirectColumn { column } => row.get_i64(column).map(TenantId),
        ScopingStrategy::ViaParent {
            foreign_key,
            parent,
        } => {
            let parent_row = live_row(tables, parent, row.get_i64(foreign_key)?)?;
            effective_tenant(tables, parent, parent_row)
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    match (as_number(left), as_number(right)) {
        (Some(l), Some(r)) => l == r,
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.filter(|v| !v.is_null());
    let right = right.filter(|v| !v.is_null());
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(l), Some(r)) => match (as_number(l), as_number(r)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => l.to_string().cmp(&r.to_string()),
        },
    }
}

fn matches_condition(row: &Record, condition: &Condition) -> bool {
    match condition {
        Condition::Eq(column, expected) => row
            .get(column)
            .is_some_and(|actual| values_equal(actual, expected)),
        Condition::IsNull(column) => row.is_null(column),
        Condition::NotNull(column) => !row.is_null(column),
        Condition::In(column, candidates) => row
            .get(column)
            .is_some_and(|actual| candidates.iter().any(|c| values_equal(actual, c))),
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn fetch(&self, query: &ScopedQuery) -> Result<Vec<Record>, AppError> {
        let entity = query.entity();
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let Some(table) = tables.get(entity.table) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<Record> = table
            .values()
            .filter(|row| query.includes_trashed() || !is_trashed(entity, row))
            .filter(|row| match query.tenant() {
                TenantFilter::Unscoped => true,
                TenantFilter::Nothing => false,
                TenantFilter::Tenant(tenant_id) => {
                    effective_tenant(&tables, entity, row) == Some(tenant_id)
                }
            })
            .filter(|row| query.conditions().iter().all(|c| matches_condition(row, c)))
            .cloned()
            .collect();

        for (column, direction) in query.ordering().iter().rev() {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(column), b.get(column));
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let offset = query.offset_value().unwrap_or(0).max(0) as usize;
        let limit = query.limit_value().map_or(usize::MAX, |l| l.max(0) as usize);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn find_by_id(
        &self,
        entity: &'static EntityDescriptor,
        id: i64,
    ) -> Result<Option<Record>, AppError> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        Ok(live_row(&tables, entity, id).cloned())
    }

    async fn insert(
        &self,
        entity: &'static EntityDescriptor,
        values: Record,
    ) -> Result<Record, AppError> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let table = tables.entry(entity.table).or_default();
        if let Some(id) = values.get_i64(entity.id_column) {
            if table.contains_key(&id) {
                return Err(AppError::InvalidInput(format!(
                    "{} {} already exists",
                    entity.name, id
                )));
            }
        }
        Ok(insert_row(table, entity, values))
    }

    async fn update(
        &self,
        entity: &'static EntityDescriptor,
        id: i64,
        mut changes: Record,
    ) -> Result<Option<Record>, AppError> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let Some(row) = tables.get_mut(entity.table).and_then(|t| t.get_mut(&id)) else {
            return Ok(None);
        };
        if is_trashed(entity, row) {
            return Ok(None);
        }

        changes.remove(entity.id_column);
        row.merge(&changes);
        if entity.timestamps {
            row.set("updated_at", Utc::now().to_rfc3339());
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, entity: &'static EntityDescriptor, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let Some(table) = tables.get_mut(entity.table) else {
            return Ok(false);
        };

        if !entity.soft_delete {
            return Ok(table.remove(&id).is_some());
        }
        match table.get_mut(&id) {
            Some(row) if row.is_null("deleted_at") => {
                row.set("deleted_at", Utc::now().to_rfc3339());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoping::catalog::{PRODUCT, PRODUCT_VARIANT, SUPPLIER};
    use serde_json::json;

    #[tokio::test]
    async fn soft_deleted_parent_hides_children() {
        let store = MemoryEntityStore::new();
        let product = store.seed(&PRODUCT, Record::new().with("empresa_id", 1));
        store.seed(
            &PRODUCT_VARIANT,
            Record::new().with("produto_id", product.id().unwrap()),
        );

        let query = ScopedQuery::new(&PRODUCT_VARIANT, TenantFilter::Tenant(TenantId(1)));
        assert_eq!(store.fetch(&query).await.unwrap().len(), 1);

        assert!(store.delete(&PRODUCT, product.id().unwrap()).await.unwrap());
        assert!(store.fetch(&query).await.unwrap().is_empty());
        assert!(!store.delete(&PRODUCT, product.id().unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn hard_delete_removes_row() {
        let store = MemoryEntityStore::new();
        let supplier = store.seed(&SUPPLIER, Record::new().with("empresa_id", 1));
        assert!(store.delete(&SUPPLIER, supplier.id().unwrap()).await.unwrap());
        assert!(store.rows(&SUPPLIER).is_empty());
    }

    #[tokio::test]
    async fn conditions_ordering_and_paging() {
        let store = MemoryEntityStore::new();
        for (name, price) in [("b", 20), ("a", 10), ("c", 30)] {
            store.seed(
                &PRODUCT,
                Record::new()
                    .with("empresa_id", 1)
                    .with("nome", name)
                    .with("preco_venda", price),
            );
        }
        store.seed(&PRODUCT, Record::new().with("empresa_id", 2).with("nome", "z"));

        let query = ScopedQuery::new(&PRODUCT, TenantFilter::Tenant(TenantId(1)))
            .order_by("preco_venda", SortDirection::Desc)
            .offset(1)
            .limit(1);
        let rows = store.fetch(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("nome"), Some(&json!("b")));

        let by_name = ScopedQuery::new(&PRODUCT, TenantFilter::Unscoped).filter_eq("nome", "z");
        assert_eq!(store.fetch(&by_name).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn directory_hides_deleted_and_lists_active_by_name() {
        let directory = MemoryTenantDirectory::with_tenants([2, 1]);
        assert!(directory.soft_delete(TenantId(2)));
        assert!(directory.find_tenant(TenantId(2)).await.unwrap().is_none());

        let active = directory.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, TenantId(1));
    }
}
