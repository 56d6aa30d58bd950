//! PostgreSQL implementations of the tenancy collaborators
//!
//! `PgTenantDirectory` reads companies from `multitenancy.empresas`;
//! `PgEntityStore` runs scoped queries and writes for every catalog entity,
//! using the statements rendered in [`sql`].

pub mod connection;
pub mod entity;
pub mod sql;
pub mod tenant;

pub use connection::connect;
pub use entity::PgEntityStore;
pub use tenant::PgTenantDirectory;
