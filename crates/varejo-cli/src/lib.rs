use serde::Serialize;
use tracing_subscriber::EnvFilter;
use varejo_core::{AppError, ErrorMetadata, LogLevel, Principal, Tenant, TenantId};

/// Initialize tracing for CLI binaries.
///
/// `.env` is loaded first so a `RUST_LOG` set there is honoured.
pub fn init_tracing() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Filter from `RUST_LOG`, `info` when unset or invalid.
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Build the principal a diagnostic command acts for.
pub fn principal_from_args(user_id: i64, tenant_id: Option<i64>, roles: &[String]) -> Principal {
    let mut principal = Principal::new(user_id);
    if let Some(id) = tenant_id {
        principal = principal.with_tenant(TenantId(id));
    }
    for role in roles {
        principal = principal.with_role(role.trim());
    }
    principal
}

/// Outcome of a resolution run, as printed by `varejo resolve`.
#[derive(Debug, Serialize)]
pub struct ResolutionReport {
    pub user_id: i64,
    pub exempt: bool,
    pub requested: Option<TenantId>,
    pub resolved: Option<TenantSummary>,
    pub has_context: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct TenantSummary {
    pub id: TenantId,
    pub name: String,
    pub active: bool,
}

impl From<&Tenant> for TenantSummary {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.display_name().to_string(),
            active: tenant.active,
        }
    }
}

/// Failure as printed to stderr by the binaries.
#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<&'static str>,
}

/// Log `err` at the level its kind asks for and build the report shown to
/// the operator. Errors from outside the core are reported as internal.
pub fn report_failure(err: &anyhow::Error) -> FailureReport {
    let Some(app_err) = err.downcast_ref::<AppError>() else {
        tracing::error!(error = %format!("{:#}", err), "Command failed");
        return FailureReport {
            code: "INTERNAL_ERROR",
            message: format!("{:#}", err),
            suggested_action: None,
        };
    };

    match app_err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %app_err.with_causes(), "Command failed"),
        LogLevel::Warn => tracing::warn!(error = %app_err.with_causes(), "Command failed"),
        LogLevel::Error => tracing::error!(error = %app_err.with_causes(), "Command failed"),
    }
    FailureReport {
        code: app_err.error_code(),
        message: app_err.client_message(),
        suggested_action: app_err.suggested_action(),
    }
}
