//! Model layer: static field schemas, scalar values and snapshots.
//!
//! # Responsibility
//! - Define how a plain struct exposes its persistable fields.
//! - Provide the value and snapshot types the repository binds from.
//!
//! # Invariants
//! - Field sets are declared statically per type; there is no runtime
//!   discovery and no per-instance schema state.
//! - Field names are implementer-controlled metadata, never user input.

mod macros;
pub mod schema;
pub mod snapshot;
pub mod value;
