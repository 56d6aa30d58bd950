//! Varejo Core Library
//!
//! Tenant context and row scoping for the retail platform: which company a
//! request acts for, and how every read and write is restricted to that
//! company's rows. Database backends live in `varejo-db`.

pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod models;
pub mod persistence;
pub mod scoping;
pub mod tenant_aware;

// Re-export commonly used types
pub use config::TenancyConfig;
pub use context::{
    AccessPolicy, RequestContextStore, RoleExemption, SessionContextStore, TenantContextResolver,
    TenantContextStore,
};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Principal, Record, Tenant, TenantId, UserKind};
pub use persistence::{EntityStore, TenantDirectory};
pub use scoping::{EntityDescriptor, ScopedQuery, ScopedRepository, ScopingStrategy, TenantFilter};
pub use tenant_aware::TenantAwareRepository;
