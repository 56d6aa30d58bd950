use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use varejo_core::{AppError, Tenant, TenantDirectory, TenantId};

/// Columns of `multitenancy.empresas` under the names of [`Tenant`].
const TENANT_COLUMNS: &str = "id, uuid, razao_social AS legal_name, nome_fantasia AS trade_name, \
     cnpj AS tax_id, email, telefone AS phone, ativo AS active, data_adesao AS joined_at, \
     data_expiracao AS expires_at, created_at, updated_at, deleted_at::timestamptz AS deleted_at";

/// Tenant (company) lookups over `multitenancy.empresas`.
#[derive(Clone)]
pub struct PgTenantDirectory {
    pool: PgPool,
}

impl PgTenantDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantDirectory for PgTenantDirectory {
    #[tracing::instrument(skip(self), fields(db.table = "multitenancy.empresas", db.operation = "select", db.record_id = %id))]
    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<Postgres, Tenant>(&format!(
            "SELECT {} FROM multitenancy.empresas WHERE id = $1 AND deleted_at IS NULL",
            TENANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    #[tracing::instrument(skip(self), fields(db.table = "multitenancy.empresas", db.operation = "select"))]
    async fn list_active(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<Postgres, Tenant>(&format!(
            r#"
            SELECT {}
            FROM multitenancy.empresas
            WHERE deleted_at IS NULL
              AND ativo
              AND data_adesao <= now()
              AND (data_expiracao IS NULL OR data_expiracao > now())
            ORDER BY COALESCE(NULLIF(TRIM(nome_fantasia), ''), razao_social) ASC
            "#,
            TENANT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }
}
