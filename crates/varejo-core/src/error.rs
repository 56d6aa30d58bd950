//! Errors of the tenancy core.
//!
//! Read paths never report a missing tenant context as an error; they return
//! nothing. Write paths fail with [`AppError::NoTenantContext`] or
//! [`AppError::ForeignTenantAccess`] so a caller can tell "nothing to show"
//! apart from "not allowed".
//!
//! `Database` wraps a `sqlx::Error` only when the `sqlx` feature is enabled.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

use crate::models::TenantId;

/// Severity an error should be logged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected outcomes: bad input, no company selected, unknown ids
    Debug,
    /// Refused cross-company access
    Warn,
    Error,
}

/// How an error is presented by the surface on top of the core (HTTP handler,
/// CLI, job runner).
pub trait ErrorMetadata {
    fn http_status_code(&self) -> u16;

    /// Stable code for clients, e.g. `NO_TENANT_CONTEXT`.
    fn error_code(&self) -> &'static str;

    /// Retrying the same call may succeed.
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Message safe to show to an end user.
    fn client_message(&self) -> String;

    /// Details must not leave the process in production.
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("No tenant context: no company could be resolved for the current session")]
    NoTenantContext,

    #[error("Foreign tenant access: {entity} {id} does not belong to the current company")]
    ForeignTenantAccess { entity: String, id: i64 },

    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error: {message}")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn foreign(entity: &str, id: i64) -> Self {
        AppError::ForeignTenantAccess {
            entity: entity.to_string(),
            id,
        }
    }

    /// The message followed by its `source()` chain, one cause per line.
    pub fn with_causes(&self) -> String {
        use std::error::Error;

        let mut text = self.to_string();
        let mut cause = self.source();
        while let Some(err) = cause {
            text.push_str("\n  caused by: ");
            text.push_str(&err.to_string());
            cause = err.source();
        }
        text
    }

    fn disposition(&self) -> Disposition {
        match self {
            AppError::Database(_) => Disposition {
                status: 500,
                code: "DATABASE_ERROR",
                recoverable: true,
                action: Some("Retry the operation shortly"),
                sensitive: true,
                level: LogLevel::Error,
            },
            AppError::NoTenantContext => Disposition {
                status: 409,
                code: "NO_TENANT_CONTEXT",
                recoverable: false,
                action: Some("Select or assign a company before changing data"),
                sensitive: false,
                level: LogLevel::Debug,
            },
            AppError::ForeignTenantAccess { .. } => Disposition {
                status: 403,
                code: "FOREIGN_TENANT_ACCESS",
                recoverable: false,
                action: None,
                sensitive: false,
                level: LogLevel::Warn,
            },
            AppError::TenantNotFound(_) => Disposition {
                status: 404,
                code: "TENANT_NOT_FOUND",
                recoverable: false,
                action: Some("Check the company id"),
                sensitive: false,
                level: LogLevel::Debug,
            },
            AppError::NotFound(_) => Disposition {
                status: 404,
                code: "NOT_FOUND",
                recoverable: false,
                action: None,
                sensitive: false,
                level: LogLevel::Debug,
            },
            AppError::InvalidInput(_) => Disposition {
                status: 400,
                code: "INVALID_INPUT",
                recoverable: false,
                action: Some("Fix the request and send it again"),
                sensitive: false,
                level: LogLevel::Debug,
            },
            AppError::Internal(_) | AppError::InternalWithSource { .. } => Disposition {
                status: 500,
                code: "INTERNAL_ERROR",
                recoverable: true,
                action: None,
                sensitive: true,
                level: LogLevel::Error,
            },
        }
    }
}

struct Disposition {
    status: u16,
    code: &'static str,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("I/O failure: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("malformed JSON: {}", err))
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        self.disposition().status
    }

    fn error_code(&self) -> &'static str {
        self.disposition().code
    }

    fn is_recoverable(&self) -> bool {
        self.disposition().recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.disposition().action
    }

    fn is_sensitive(&self) -> bool {
        self.disposition().sensitive
    }

    fn log_level(&self) -> LogLevel {
        self.disposition().level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "The database is unavailable".to_string(),
            AppError::NoTenantContext => "No company selected for this session".to_string(),
            AppError::ForeignTenantAccess { entity, .. } => {
                format!("This {} does not belong to the current company", entity)
            }
            AppError::TenantNotFound(id) => format!("Company {} not found", id),
            AppError::NotFound(msg) | AppError::InvalidInput(msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Something went wrong on our side".to_string()
            }
        }
    }
}
