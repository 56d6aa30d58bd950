use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryScalar};
use sqlx::{PgPool, Postgres};
use varejo_core::scoping::{EntityDescriptor, ScopedQuery};
use varejo_core::{AppError, EntityStore, Record};

use super::sql::{
    render_delete, render_find_by_id, render_insert, render_select, render_update, SqlParam,
    SqlStatement,
};

fn scalar(statement: &SqlStatement) -> QueryScalar<'_, Postgres, Value, PgArguments> {
    let mut query = sqlx::query_scalar::<Postgres, Value>(&statement.sql);
    for param in &statement.params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Json(v) => query.bind(v.clone()),
        };
    }
    query
}

fn command(statement: &SqlStatement) -> Query<'_, Postgres, PgArguments> {
    let mut query = sqlx::query::<Postgres>(&statement.sql);
    for param in &statement.params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Json(v) => query.bind(v.clone()),
        };
    }
    query
}

/// Scoped rows of any catalog entity, read and written as JSON objects.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    #[tracing::instrument(skip(self, query), fields(db.table = query.entity().table, db.operation = "select"))]
    async fn fetch(&self, query: &ScopedQuery) -> Result<Vec<Record>, AppError> {
        let statement = render_select(query)?;
        let rows = scalar(&statement).fetch_all(&self.pool).await?;
        rows.into_iter().map(Record::from_value).collect()
    }

    #[tracing::instrument(skip(self), fields(db.table = entity.table, db.operation = "select", db.record_id = id))]
    async fn find_by_id(
        &self,
        entity: &'static EntityDescriptor,
        id: i64,
    ) -> Result<Option<Record>, AppError> {
        let statement = render_find_by_id(entity, id)?;
        scalar(&statement)
            .fetch_optional(&self.pool)
            .await?
            .map(Record::from_value)
            .transpose()
    }

    #[tracing::instrument(skip(self, values), fields(db.table = entity.table, db.operation = "insert"))]
    async fn insert(
        &self,
        entity: &'static EntityDescriptor,
        values: Record,
    ) -> Result<Record, AppError> {
        let statement = render_insert(entity, &values)?;
        let row = scalar(&statement).fetch_one(&self.pool).await?;
        Record::from_value(row)
    }

    #[tracing::instrument(skip(self, changes), fields(db.table = entity.table, db.operation = "update", db.record_id = id))]
    async fn update(
        &self,
        entity: &'static EntityDescriptor,
        id: i64,
        changes: Record,
    ) -> Result<Option<Record>, AppError> {
        let Some(statement) = render_update(entity, id, &changes)? else {
            return self.find_by_id(entity, id).await;
        };
        scalar(&statement)
            .fetch_optional(&self.pool)
            .await?
            .map(Record::from_value)
            .transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = entity.table, db.operation = "delete", db.record_id = id))]
    async fn delete(&self, entity: &'static EntityDescriptor, id: i64) -> Result<bool, AppError> {
        let statement = render_delete(entity, id)?;
        let result = command(&statement).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
