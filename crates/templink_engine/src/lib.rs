//! # Templink Engine
//!
//! The template linkage engine of the monitoring platform.
//!
//! A *template* bundles monitored-entity definitions: items, triggers,
//! graphs, web scenarios, host prototypes, tags, macros and interfaces.
//! Linking a template to a host materializes those definitions into
//! host-scoped copies; re-linking keeps them in sync; unlinking cascades
//! the copies and their dependents away. Every mutation lands in a
//! request-scoped audit buffer flushed inside the same transaction.
//!
//! ## Architecture
//!
//! One request = one [`LinkEngine`] call = one database transaction:
//!
//! 1. **Validator** - pre-flight consistency checks, first failure wins
//! 2. **Differs** - per family (triggers, graphs, host prototypes, web
//!    scenarios), classify each template entity as insert, update or skip
//! 3. **Writers** - execute the classified plans as batched DML, feeding
//!    the audit buffer as each row is emitted
//! 4. **Cascade** - ordered parent-before-child deletes on unlink
//!
//! ## Key Invariants
//!
//! - No write before validation passes; no partial commit ever
//! - A trigger/graph/scenario/prototype with a non-null parent link is
//!   owned by its template and overwritten from it
//! - Item keys stay unique per host through any link
//! - Every inserted expression placeholder resolves to a function owned by
//!   the inserted trigger

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cascade;
mod error;
mod graphs;
mod link;
mod prototypes;
mod scenarios;
mod triggers;
mod validate;

pub use cascade::{
    delete_graph_hierarchy, delete_host_prototypes, delete_hosts, delete_items,
    delete_scenarios, delete_template_elements, delete_trigger_hierarchy, CascadeStats,
};
pub use error::{LinkError, LinkResult};
pub use graphs::{link_graphs, GraphLinkStats};
pub use link::{LinkEngine, LinkOutcome, UnlinkOutcome};
pub use prototypes::{link_host_prototypes, PrototypeLinkStats};
pub use scenarios::{link_scenarios, ScenarioLinkStats};
pub use triggers::{link_triggers, TriggerLinkStats};
pub use validate::{validate_host, validate_linked_templates};
