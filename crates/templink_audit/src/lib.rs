//! # Templink Audit
//!
//! Request-scoped audit collection for the linkage engine.
//!
//! This crate provides:
//! - [`AuditBuffer`] - one entry per mutated entity, merged by id,
//!   flushed as a single batch inside the request's transaction
//! - [`AuditEntry`] detail documents - dotted attribute paths mapped to
//!   string or integer values, serialized flat on flush
//! - [`CuidGenerator`] - the 25-character collision-resistant identifiers
//!   used for audit row ids and record-set ids
//!
//! ## Key Invariants
//!
//! - The buffer lives and dies with one request; no process-global state
//! - A detail for an id without an entry is a fatal integrity error
//! - Buffered entries are discarded with the transaction on rollback

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod cuid;
mod entry;

pub use buffer::{AuditBuffer, AuditError, AuditResult, SUPER_ADMIN_USER_ID};
pub use cuid::{is_valid_cuid, CuidGenerator};
pub use entry::{AuditAction, AuditEntry, DetailValue, ResourceType};
