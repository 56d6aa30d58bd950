//! SQL rendering for scoped queries and row writes.
//!
//! Rendering is kept free of I/O so the generated statements can be checked
//! directly. Table names come from the static catalog; column names coming
//! from payloads or conditions are validated and quoted before interpolation,
//! and every value travels as a bind parameter.

use serde_json::Value;
use varejo_core::scoping::{
    validate_identifier, Condition, EntityDescriptor, ScopedQuery, ScopingStrategy, SortDirection,
    TenantFilter,
};
use varejo_core::{AppError, Record};

/// Bind parameter of a rendered statement, in `$n` order.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Json(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlStatement {
    fn new() -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Register a parameter and return its placeholder.
    fn param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }
}

fn quote(column: &str) -> Result<String, AppError> {
    validate_identifier(column)?;
    Ok(format!("\"{}\"", column))
}

/// Predicate restricting `alias` rows of `entity` to `tenant_id`.
///
/// Parent-scoped entities become a chain of `EXISTS` subqueries, one per hop,
/// each skipping soft-deleted parents.
fn tenant_predicate(
    entity: &EntityDescriptor,
    alias: &str,
    tenant_param: &str,
    depth: usize,
) -> Result<String, AppError> {
    match entity.scoping {
        ScopingStrategy::DirectColumn { column } => {
            Ok(format!("{}.{} = {}", alias, quote(column)?, tenant_param))
        }
        ScopingStrategy::ViaParent {
            foreign_key,
            parent,
        } => {
            let parent_alias = format!("p{}", depth + 1);
            let mut predicate = format!(
                "EXISTS (SELECT 1 FROM {table} {pa} WHERE {pa}.{id} = {alias}.{fk}",
                table = parent.table,
                pa = parent_alias,
                id = quote(parent.id_column)?,
                alias = alias,
                fk = quote(foreign_key)?,
            );
            if parent.soft_delete {
                predicate.push_str(&format!(" AND {}.deleted_at IS NULL", parent_alias));
            }
            predicate.push_str(" AND ");
            predicate.push_str(&tenant_predicate(parent, &parent_alias, tenant_param, depth + 1)?);
            predicate.push(')');
            Ok(predicate)
        }
    }
}

fn condition_predicate(
    statement: &mut SqlStatement,
    condition: &Condition,
) -> Result<String, AppError> {
    let column = quote(condition.column())?;
    Ok(match condition {
        Condition::Eq(_, value) => {
            let p = statement.param(SqlParam::Json(value.clone()));
            format!("to_jsonb(t.{}) = {}", column, p)
        }
        Condition::IsNull(_) => format!("t.{} IS NULL", column),
        Condition::NotNull(_) => format!("t.{} IS NOT NULL", column),
        Condition::In(_, values) => {
            let p = statement.param(SqlParam::Json(Value::Array(values.clone())));
            format!(
                "to_jsonb(t.{}) IN (SELECT jsonb_array_elements({}))",
                column, p
            )
        }
    })
}

/// `SELECT` returning each matching row as one JSON object.
pub fn render_select(query: &ScopedQuery) -> Result<SqlStatement, AppError> {
    query.validate()?;
    let entity = query.entity();
    let mut statement = SqlStatement::new();
    let mut predicates = Vec::new();

    match query.tenant() {
        TenantFilter::Unscoped => {}
        TenantFilter::Nothing => predicates.push("FALSE".to_string()),
        TenantFilter::Tenant(tenant_id) => {
            let p = statement.param(SqlParam::Int(tenant_id.get()));
            predicates.push(tenant_predicate(entity, "t", &p, 0)?);
        }
    }

    if entity.soft_delete && !query.includes_trashed() {
        predicates.push("t.deleted_at IS NULL".to_string());
    }

    for condition in query.conditions() {
        let predicate = condition_predicate(&mut statement, condition)?;
        predicates.push(predicate);
    }

    let mut sql = format!("SELECT to_jsonb(t) AS data FROM {} t", entity.table);
    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }

    if query.ordering().is_empty() {
        sql.push_str(&format!(" ORDER BY t.{}", quote(entity.id_column)?));
    } else {
        let order: Vec<String> = query
            .ordering()
            .iter()
            .map(|(column, direction)| {
                let dir = match direction {
                    SortDirection::Asc => "ASC",
                    SortDirection::Desc => "DESC",
                };
                Ok(format!("t.{} {}", quote(column)?, dir))
            })
            .collect::<Result<_, AppError>>()?;
        sql.push_str(" ORDER BY ");
        sql.push_str(&order.join(", "));
    }

    if let Some(limit) = query.limit_value() {
        let p = statement.param(SqlParam::Int(limit));
        sql.push_str(&format!(" LIMIT {}", p));
    }
    if let Some(offset) = query.offset_value() {
        let p = statement.param(SqlParam::Int(offset));
        sql.push_str(&format!(" OFFSET {}", p));
    }

    statement.sql = sql;
    Ok(statement)
}

/// Unscoped load by primary key, soft-deleted rows excluded.
pub fn render_find_by_id(entity: &EntityDescriptor, id: i64) -> Result<SqlStatement, AppError> {
    let mut statement = SqlStatement::new();
    let p = statement.param(SqlParam::Int(id));
    let mut sql = format!(
        "SELECT to_jsonb(t) AS data FROM {} t WHERE t.{} = {}",
        entity.table,
        quote(entity.id_column)?,
        p
    );
    if entity.soft_delete {
        sql.push_str(" AND t.deleted_at IS NULL");
    }
    statement.sql = sql;
    Ok(statement)
}

/// `INSERT` of the payload columns, typed by PostgreSQL through
/// `jsonb_populate_record`. Columns absent from the payload keep their defaults.
pub fn render_insert(entity: &EntityDescriptor, values: &Record) -> Result<SqlStatement, AppError> {
    let mut columns = Vec::new();
    let mut selects = Vec::new();
    for column in values.columns() {
        let quoted = quote(column)?;
        selects.push(format!("r.{}", quoted));
        columns.push(quoted);
    }
    if entity.timestamps {
        for stamp in ["created_at", "updated_at"] {
            if values.get(stamp).is_none() {
                columns.push(quote(stamp)?);
                selects.push("now()".to_string());
            }
        }
    }
    if columns.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "cannot insert an empty {} row",
            entity.name
        )));
    }

    let mut statement = SqlStatement::new();
    let p = statement.param(SqlParam::Json(Value::Object(values.fields().clone())));
    statement.sql = format!(
        "INSERT INTO {table} AS t ({columns}) SELECT {selects} FROM jsonb_populate_record(NULL::{table}, {p}) AS r RETURNING to_jsonb(t) AS data",
        table = entity.table,
        columns = columns.join(", "),
        selects = selects.join(", "),
        p = p,
    );
    Ok(statement)
}

/// `UPDATE` of the payload columns on a live row. `None` when there is
/// nothing to set.
pub fn render_update(
    entity: &EntityDescriptor,
    id: i64,
    changes: &Record,
) -> Result<Option<SqlStatement>, AppError> {
    let mut sets = Vec::new();
    for column in changes.columns().filter(|c| *c != entity.id_column) {
        let quoted = quote(column)?;
        sets.push(format!("{} = r.{}", quoted, quoted));
    }
    if entity.timestamps && changes.get("updated_at").is_none() {
        sets.push("\"updated_at\" = now()".to_string());
    }
    if sets.is_empty() {
        return Ok(None);
    }

    let mut statement = SqlStatement::new();
    let payload = statement.param(SqlParam::Json(Value::Object(changes.fields().clone())));
    let id_param = statement.param(SqlParam::Int(id));
    let mut sql = format!(
        "UPDATE {table} AS t SET {sets} FROM jsonb_populate_record(NULL::{table}, {payload}) AS r WHERE t.{id} = {id_param}",
        table = entity.table,
        sets = sets.join(", "),
        payload = payload,
        id = quote(entity.id_column)?,
        id_param = id_param,
    );
    if entity.soft_delete {
        sql.push_str(" AND t.deleted_at IS NULL");
    }
    sql.push_str(" RETURNING to_jsonb(t) AS data");
    statement.sql = sql;
    Ok(Some(statement))
}

/// Soft delete where the entity supports it, hard delete otherwise.
pub fn render_delete(entity: &EntityDescriptor, id: i64) -> Result<SqlStatement, AppError> {
    let mut statement = SqlStatement::new();
    let p = statement.param(SqlParam::Int(id));
    let id_column = quote(entity.id_column)?;
    statement.sql = if entity.soft_delete {
        let stamp = if entity.timestamps {
            "deleted_at = now(), updated_at = now()"
        } else {
            "deleted_at = now()"
        };
        format!(
            "UPDATE {} SET {} WHERE {} = {} AND deleted_at IS NULL",
            entity.table, stamp, id_column, p
        )
    } else {
        format!("DELETE FROM {} WHERE {} = {}", entity.table, id_column, p)
    };
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use varejo_core::TenantId;
    use varejo_core::scoping::catalog::{PRODUCT, PRODUCT_VARIANT, STOCK_MOVEMENT, STORE, SUPPLIER};

    static BARCODE: EntityDescriptor = EntityDescriptor::via_parent(
        "codigo_barras",
        "produtosestoques.codigos_barras",
        "produto_variacao_id",
        &PRODUCT_VARIANT,
    );

    #[test]
    fn direct_select_filters_tenant_and_trash() {
        let query = ScopedQuery::new(&STORE, TenantFilter::Tenant(TenantId(7)));
        let statement = render_select(&query).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT to_jsonb(t) AS data FROM multitenancy.lojas t WHERE t.\"empresa_id\" = $1 AND t.deleted_at IS NULL ORDER BY t.\"id\""
        );
        assert_eq!(statement.params, vec![SqlParam::Int(7)]);
    }

    #[test]
    fn empty_filter_renders_false() {
        let statement = render_select(&ScopedQuery::empty(&SUPPLIER)).unwrap();
        assert!(statement.sql.contains("WHERE FALSE"));
        assert!(statement.params.is_empty());
    }

    #[test]
    fn one_hop_uses_exists_on_parent() {
        let query = ScopedQuery::new(&STOCK_MOVEMENT, TenantFilter::Tenant(TenantId(2)));
        let statement = render_select(&query).unwrap();
        assert!(statement.sql.contains(
            "EXISTS (SELECT 1 FROM multitenancy.lojas p1 WHERE p1.\"id\" = t.\"loja_id\" AND p1.deleted_at IS NULL AND p1.\"empresa_id\" = $1)"
        ));
        assert!(!statement.sql.contains("t.deleted_at"));
    }

    #[test]
    fn two_hops_nest_exists_subqueries() {
        let query = ScopedQuery::new(&BARCODE, TenantFilter::Tenant(TenantId(2)));
        let sql = render_select(&query).unwrap().sql;
        assert!(sql.contains(
            "EXISTS (SELECT 1 FROM produtosestoques.produto_variacoes p1 WHERE p1.\"id\" = t.\"produto_variacao_id\" AND p1.deleted_at IS NULL AND \
             EXISTS (SELECT 1 FROM produtosestoques.produtos p2 WHERE p2.\"id\" = p1.\"produto_id\" AND p2.deleted_at IS NULL AND p2.\"empresa_id\" = $1))"
        ));
    }

    #[test]
    fn conditions_ordering_and_paging_are_bound() {
        let query = ScopedQuery::new(&PRODUCT, TenantFilter::Tenant(TenantId(1)))
            .filter_eq("ativo", true)
            .filter_in("categoria_id", vec![json!(3), json!(4)])
            .order_by("nome", SortDirection::Desc)
            .limit(20)
            .offset(40);
        let statement = render_select(&query).unwrap();

        assert!(statement.sql.contains("to_jsonb(t.\"ativo\") = $2"));
        assert!(statement
            .sql
            .contains("to_jsonb(t.\"categoria_id\") IN (SELECT jsonb_array_elements($3))"));
        assert!(statement.sql.ends_with("ORDER BY t.\"nome\" DESC LIMIT $4 OFFSET $5"));
        assert_eq!(statement.params.len(), 5);
        assert_eq!(statement.params[4], SqlParam::Int(40));
    }

    #[test]
    fn unsafe_column_names_are_rejected() {
        let query = ScopedQuery::new(&PRODUCT, TenantFilter::Unscoped).filter_null("nome); --");
        assert!(render_select(&query).is_err());

        let values = Record::new().with("nome\"", "x");
        assert!(render_insert(&PRODUCT, &values).is_err());
    }

    #[test]
    fn insert_lists_payload_columns_and_timestamps() {
        let values = Record::new().with("empresa_id", 1).with("nome", "Camiseta");
        let statement = render_insert(&PRODUCT, &values).unwrap();
        assert_eq!(
            statement.sql,
            "INSERT INTO produtosestoques.produtos AS t (\"empresa_id\", \"nome\", \"created_at\", \"updated_at\") \
             SELECT r.\"empresa_id\", r.\"nome\", now(), now() \
             FROM jsonb_populate_record(NULL::produtosestoques.produtos, $1) AS r RETURNING to_jsonb(t) AS data"
        );
    }

    #[test]
    fn update_skips_id_and_guards_trash() {
        let changes = Record::new().with("id", 9).with("nome", "Novo");
        let statement = render_update(&STORE, 3, &changes).unwrap().unwrap();
        assert!(statement.sql.starts_with(
            "UPDATE multitenancy.lojas AS t SET \"nome\" = r.\"nome\", \"updated_at\" = now()"
        ));
        assert!(statement.sql.contains("WHERE t.\"id\" = $2 AND t.deleted_at IS NULL"));
        assert_eq!(statement.params[1], SqlParam::Int(3));
    }

    #[test]
    fn delete_is_soft_only_where_supported() {
        let soft = render_delete(&STORE, 1).unwrap();
        assert!(soft.sql.starts_with("UPDATE multitenancy.lojas SET deleted_at = now()"));

        let hard = render_delete(&SUPPLIER, 1).unwrap();
        assert_eq!(hard.sql, "DELETE FROM gestao.fornecedores WHERE \"id\" = $1");
    }
}
