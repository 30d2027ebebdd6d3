//! Repository layer: generic CRUD and bulk writes over model tables.
//!
//! # Responsibility
//! - Map `Model` snapshots to parameterized SQL statements.
//! - Keep SQL construction and driver details inside this module.
//!
//! # Invariants
//! - Repository writes run `Model::validate()` before persistence.
//! - Repository APIs return semantic errors (`MissingKey`, `TypeMismatch`)
//!   in addition to storage errors.

pub mod error;
pub mod repository;
mod sql;
