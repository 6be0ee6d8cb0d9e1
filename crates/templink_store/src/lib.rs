//! # Templink Store
//!
//! Storage seam for the template linkage engine.
//!
//! This crate provides:
//! - [`LinkStore`] - the typed trait the engine runs against
//! - [`MemoryStore`] - the in-memory reference implementation
//! - Snapshot and update shapes exchanged through the trait
//!
//! ## Architecture
//!
//! The engine never renders SQL itself; it reads typed snapshots and emits
//! typed batched DML through `LinkStore`. The production implementation in
//! `templink_sql` renders the statement shapes of the relational schema;
//! `MemoryStore` keeps the tables as vectors and emulates the schema's
//! foreign-key cascades, which makes every engine behaviour testable
//! without a database.
//!
//! ## Key Invariants
//!
//! - Id blocks are dense, monotonic and never reused
//! - Deleting a parent row drops its owned child rows
//! - All methods run inside the caller's transaction; the engine is the
//!   sole mutator within it

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod store;
mod types;

pub use error::{StoreError, StoreResult};
pub use memory::{Dataset, MemoryStore, FIRST_ALLOCATED_ID};
pub use store::LinkStore;
pub use types::{
    FunctionKeyRow, GraphItemKeyRow, GroupPrototypeUpdate, InterfaceUpdate, MacroUpdate,
    PrototypeUpdate, SnmpChange, TagUpdate, TemplatePrototypeRow, TriggerUpdate,
};
