//! Campus Core — domain models, repository traits, and error types for
//! the cross-tenant identity consistency engine.
//!
//! One global identity pool spans every customer organization; each
//! organization's person records live in an isolated tenant partition and
//! are soft-linked to identities by id, without any storage-enforced
//! cross-partition foreign key. This crate defines the shared vocabulary:
//! the models, the repository traits the storage layer implements, and
//! the error taxonomy every other crate converts into.

pub mod error;
pub mod events;
pub mod models;
pub mod repository;
pub mod tenant;

pub use error::{CampusError, CampusResult};
pub use tenant::TenantScope;
