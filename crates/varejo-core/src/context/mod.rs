//! Tenant context: which company the current request acts for.

pub mod policy;
pub mod resolver;
pub mod store;

pub use policy::{AccessPolicy, RoleExemption};
pub use resolver::TenantContextResolver;
pub use store::{RequestContextStore, SessionContext, SessionContextStore, TenantContextStore};
