//! Tenant-filtered query descriptions.
//!
//! A [`ScopedQuery`] is a plain value: it names the entity, the tenant filter
//! and the caller's extra conditions. Stores translate it into SQL or evaluate
//! it in memory; neither is allowed to drop the tenant filter.

use regex::Regex;
use serde_json::Value;

use super::entity::EntityDescriptor;
use crate::error::AppError;
use crate::models::TenantId;

/// Tenant restriction applied to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantFilter {
    /// No tenant restriction. Only reachable through explicit escape hatches.
    Unscoped,
    /// Rows whose effective tenant is the given one.
    Tenant(TenantId),
    /// Matches no row at all.
    Nothing,
}

impl TenantFilter {
    /// Filter for an optional tenant; absence yields the empty filter.
    pub fn for_optional(tenant_id: Option<TenantId>) -> Self {
        match tenant_id {
            Some(id) => TenantFilter::Tenant(id),
            None => TenantFilter::Nothing,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    IsNull(String),
    NotNull(String),
    In(String, Vec<Value>),
}

impl Condition {
    pub fn column(&self) -> &str {
        match self {
            Condition::Eq(c, _) | Condition::IsNull(c) | Condition::NotNull(c) | Condition::In(c, _) => c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct ScopedQuery {
    entity: &'static EntityDescriptor,
    tenant: TenantFilter,
    conditions: Vec<Condition>,
    order_by: Vec<(String, SortDirection)>,
    limit: Option<i64>,
    offset: Option<i64>,
    with_trashed: bool,
}

impl ScopedQuery {
    pub fn new(entity: &'static EntityDescriptor, tenant: TenantFilter) -> Self {
        Self {
            entity,
            tenant,
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            with_trashed: false,
        }
    }

    /// A query that returns zero rows whatever else is added to it.
    pub fn empty(entity: &'static EntityDescriptor) -> Self {
        Self::new(entity, TenantFilter::Nothing)
    }

    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column.into(), value.into()));
        self
    }

    pub fn filter_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNull(column.into()));
        self
    }

    pub fn filter_not_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::NotNull(column.into()));
        self
    }

    pub fn filter_in(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In(column.into(), values));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Include soft-deleted rows of the queried entity.
    pub fn with_trashed(mut self) -> Self {
        self.with_trashed = true;
        self
    }

    pub fn entity(&self) -> &'static EntityDescriptor {
        self.entity
    }

    pub fn tenant(&self) -> TenantFilter {
        self.tenant
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn ordering(&self) -> &[(String, SortDirection)] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    pub fn includes_trashed(&self) -> bool {
        self.with_trashed
    }

    pub fn is_empty_by_construction(&self) -> bool {
        self.tenant == TenantFilter::Nothing
            || self
                .conditions
                .iter()
                .any(|c| matches!(c, Condition::In(_, values) if values.is_empty()))
    }

    /// Reject column names that are not plain identifiers.
    pub fn validate(&self) -> Result<(), AppError> {
        for condition in &self.conditions {
            validate_identifier(condition.column())?;
        }
        for (column, _) in &self.order_by {
            validate_identifier(column)?;
        }
        if matches!(self.limit, Some(l) if l < 0) || matches!(self.offset, Some(o) if o < 0) {
            return Err(AppError::InvalidInput(
                "limit and offset must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Column names must be lowercase identifiers before they are used in SQL.
pub fn validate_identifier(name: &str) -> Result<(), AppError> {
    let pattern = Regex::new(r"^[a-z_][a-z0-9_]{0,62}$")
        .map_err(|e| AppError::Internal(format!("Failed to compile identifier regex: {}", e)))?;

    if !pattern.is_match(name) {
        return Err(AppError::InvalidInput(format!(
            "'{}' is not a valid column name",
            name
        )));
    }
    Ok(())
}
