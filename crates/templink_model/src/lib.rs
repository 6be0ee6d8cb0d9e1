//! # Templink Model
//!
//! Flat entity records for the template linkage engine.
//!
//! Every entity is a plain record addressable by id; relationships between
//! entities are id-to-id references resolved through the store, never
//! in-memory pointer graphs. Records carry only the columns the linkage
//! core reads and writes.
//!
//! ## Key Invariants
//!
//! - Ids are allocated in monotonic per-table blocks and never reused
//! - An entity with a non-null `template_id` mirrors the pointed entity
//! - Item keys are unique per host
//! - Dirty-column bitsets describe exactly the columns an update touches

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod audit;
mod flags;
mod graph;
mod host;
mod item;
mod prototype;
mod trigger;
mod web;

pub mod ids;

pub use audit::AuditRow;
pub use flags::{
    InterfaceUpdateFlags, MacroUpdateFlags, PrototypeUpdateFlags, SnmpUpdateFlags, TagUpdateFlags,
    TriggerUpdateFlags,
};
pub use graph::{AxisBound, GraphItemRow, GraphRow};
pub use host::{
    ActionConditionRow, ConditionKind, HostKind, HostRow, HousekeeperRow, SysmapElementKind,
    SysmapElementRow, TemplateLinkRow,
};
pub use ids::*;
pub use item::{InterfaceRequirement, InterfaceType, ItemKind, ItemRow, ItemType};
pub use prototype::{
    GroupPrototypeRow, HostPrototypeRow, HostTagRow, PrototypeInterfaceRow, PrototypeMacroRow,
    PrototypeRule, SnmpDetails,
};
pub use trigger::{
    CorrelationMode, FunctionRow, RecoveryMode, TriggerDependencyRow, TriggerDiscoveryRow,
    TriggerRow, TriggerTagRow,
};
pub use web::{
    FieldKind, ScenarioItemRow, StepItemRow, WebFieldRow, WebScenarioRow, WebStepRow, WebTagRow,
};

/// Discovery back-links from spawned entities to their parents.
///
/// Each discovery table maps an auto-created child to the prototype (or
/// rule) it was spawned from; the cascade walks these to split parent
/// deletions from child deletions.
pub mod discovery {
    use crate::ids::{GraphId, GroupId, GroupPrototypeId, HostId, ItemId};

    /// Links a discovered host to the prototype that spawned it.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct HostDiscoveryRow {
        /// The discovered (or prototype) host.
        pub host_id: HostId,
        /// The prototype this host was spawned from, if any.
        pub parent_host_id: Option<HostId>,
        /// The discovery rule the prototype hangs off.
        pub parent_item_id: Option<ItemId>,
    }

    /// Links a created item to its prototype.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ItemDiscoveryRow {
        /// The created item.
        pub item_id: ItemId,
        /// The item prototype it was created from.
        pub parent_item_id: ItemId,
    }

    /// Links an auto-created graph to its prototype.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GraphDiscoveryRow {
        /// The created graph.
        pub graph_id: GraphId,
        /// The graph prototype it was created from.
        pub parent_graph_id: GraphId,
    }

    /// Links a discovered group to its group prototype.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GroupDiscoveryRow {
        /// The discovered group.
        pub group_id: GroupId,
        /// The group prototype it was created from.
        pub parent_group_prototype_id: GroupPrototypeId,
    }
}
