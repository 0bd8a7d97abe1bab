//! ORGKIT Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - SurrealDB implementations of the `orgkit-core` repository traits
//!
//! Tree-structural writes (`create_unit`, `reparent`, `delete_forced`,
//! role deletion) run as multi-statement transactions so the structural
//! invariants hold even under concurrent requests.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
