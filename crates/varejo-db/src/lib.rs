//! PostgreSQL persistence for the tenancy core.

pub mod db;

pub use db::*;
