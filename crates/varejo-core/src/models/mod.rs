//! Data models for the tenancy core
//!
//! Tenants and principals drive context resolution; [`Record`] is the
//! persistence-neutral row handed around by the scoped repositories, and the
//! retail models are typed views over records of the catalog entities.

mod principal;
mod record;
mod retail;
mod tenant;

pub use principal::*;
pub use record::*;
pub use retail::*;
pub use tenant::*;
