//! # Templink SQL
//!
//! The SQL face of the linkage engine's store seam.
//!
//! This crate provides:
//! - [`SqlClient`] - the connection contract (query, execute, id-block
//!   reservation) with a [`RecordingClient`] test double
//! - [`SqlBuffer`] - batched statements wrapped in the store's
//!   `begin … end;` envelope, flushed automatically on overflow
//! - [`SqlStore`] - a `LinkStore` implementation that renders the schema's
//!   statement shapes: multi-row inserts, dirty-column updates and
//!   `delete … where id in (…)` lists
//!
//! ## Key Invariants
//!
//! - Every rendered statement starts with a verb and names an explicit
//!   column list; an empty column list is an error, never a malformed
//!   statement handed to the driver
//! - A buffer holding only the envelope executes nothing
//! - String literals pass through [`escape_str`] exactly once

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod client;
pub mod codes;
mod store;

pub use buffer::SqlBuffer;
pub use client::{escape_str, RecordingClient, SqlClient, SqlError, SqlResult, SqlRow, SqlValue};
pub use store::SqlStore;
