//! # Templink Testkit
//!
//! Deterministic fixtures for linkage tests.
//!
//! [`Fixture`] wraps a [`MemoryStore`] and hands out small ids (always
//! below the store's allocation floor) while wiring the cross-table
//! relationships for you: triggers get their function rows, prototypes get
//! their discovery mapping, scenarios get their steps.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fixtures;

pub use fixtures::{EntityCounts, Fixture};
