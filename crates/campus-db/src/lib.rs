//! Campus Database — SurrealDB connection management, schema
//! migrations, repository implementations, and the tenant directory.
//!
//! Tenant isolation model: one store, one table set, and an explicit
//! partition key (`tenant_id`) on every per-tenant table, bound by every
//! query through a [`campus_core::TenantScope`]. The shared partition
//! (identities, role grants, the organization registry) carries no
//! partition key. There are no cross-partition foreign keys anywhere —
//! `profile.identity_ref` is a soft reference owned by the purge reactor
//! and the consistency auditor.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
