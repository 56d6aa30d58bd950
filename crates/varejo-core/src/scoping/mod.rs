//! Row scoping: how entities map to tenants and how queries are restricted.

pub mod catalog;
pub mod entity;
pub mod query;
pub mod repository;

pub use entity::{EntityDescriptor, ScopingStrategy, TENANT_COLUMN};
pub use query::{validate_identifier, Condition, ScopedQuery, SortDirection, TenantFilter};
pub use repository::ScopedRepository;
