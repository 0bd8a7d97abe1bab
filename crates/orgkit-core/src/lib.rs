//! ORGKIT Core — domain models, error taxonomy, repository traits, and the
//! compiled hierarchy/feature rule tables.
//!
//! This crate performs no I/O. Persistence is reached exclusively through
//! the traits in [`repository`], implemented by `orgkit-db`.

pub mod error;
pub mod models;
pub mod repository;
pub mod rules;
