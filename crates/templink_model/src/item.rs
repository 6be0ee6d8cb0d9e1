//! Items: metric collectors, prototypes and discovery rules.

use crate::ids::{HostId, InterfaceId, ItemId};

/// Collector type. Decides which host interface an item needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// Passive agent check.
    Agent,
    /// Active agent check; no interface needed.
    AgentActive,
    /// Simple check (ping et al.); any interface will do.
    SimpleCheck,
    /// SNMP poll.
    Snmp,
    /// Value pushed by a trapper; no interface needed.
    Trapper,
    /// Server-internal metric; no interface needed.
    Internal,
    /// Aggregate over other items; no interface needed.
    Aggregate,
    /// External script; any interface will do.
    External,
    /// Database monitor; no interface needed.
    DbMonitor,
    /// IPMI sensor.
    Ipmi,
    /// SSH check; any interface will do.
    Ssh,
    /// Telnet check; any interface will do.
    Telnet,
    /// Calculated from other items; no interface needed.
    Calculated,
    /// JMX poll.
    Jmx,
    /// Value produced by a web scenario; no interface needed.
    HttpTest,
    /// Dependent on a master item; no interface needed.
    Dependent,
    /// HTTP agent; any interface will do.
    HttpAgent,
}

/// Interface type an item requires on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceType {
    /// Zabbix agent interface.
    Agent,
    /// SNMP interface.
    Snmp,
    /// IPMI interface.
    Ipmi,
    /// JMX interface.
    Jmx,
}

impl InterfaceType {
    /// All concrete types, in validation order.
    pub const ALL: [InterfaceType; 4] = [
        InterfaceType::Agent,
        InterfaceType::Snmp,
        InterfaceType::Ipmi,
        InterfaceType::Jmx,
    ];

    /// Human-readable name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceType::Agent => "Zabbix agent",
            InterfaceType::Snmp => "SNMP",
            InterfaceType::Ipmi => "IPMI",
            InterfaceType::Jmx => "JMX",
        }
    }
}

/// What an item type needs from the host to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceRequirement {
    /// No interface at all.
    None,
    /// At least one interface of any type.
    Any,
    /// A `main` interface of the given type.
    Specific(InterfaceType),
}

impl ItemType {
    /// The interface requirement for this collector type.
    pub fn interface_requirement(&self) -> InterfaceRequirement {
        match self {
            ItemType::Agent => InterfaceRequirement::Specific(InterfaceType::Agent),
            ItemType::Snmp => InterfaceRequirement::Specific(InterfaceType::Snmp),
            ItemType::Ipmi => InterfaceRequirement::Specific(InterfaceType::Ipmi),
            ItemType::Jmx => InterfaceRequirement::Specific(InterfaceType::Jmx),
            ItemType::SimpleCheck
            | ItemType::External
            | ItemType::Ssh
            | ItemType::Telnet
            | ItemType::HttpAgent => InterfaceRequirement::Any,
            ItemType::AgentActive
            | ItemType::Trapper
            | ItemType::Internal
            | ItemType::Aggregate
            | ItemType::DbMonitor
            | ItemType::Calculated
            | ItemType::HttpTest
            | ItemType::Dependent => InterfaceRequirement::None,
        }
    }
}

/// Item flavour, stored in the `flags` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A plain item.
    Normal,
    /// An item prototype under a discovery rule.
    Prototype,
    /// A discovery (LLD) rule.
    Rule,
    /// An item created by a discovery rule.
    Created,
}

/// A metric collector.
///
/// The original row carries ~40 scalar columns; this record keeps the ones
/// the linkage core reads or copies. `template_item_id` is the parent link:
/// set when the item was materialized from a template, null when it was
/// created locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    /// Item id.
    pub item_id: ItemId,
    /// Owning host.
    pub host_id: HostId,
    /// Item key, unique per host.
    pub key: String,
    /// Visible name.
    pub name: String,
    /// Collector type.
    pub item_type: ItemType,
    /// Stored value type (numeric/float/log/text/…) as its schema code.
    pub value_type: i32,
    /// Poll interval expression.
    pub delay: String,
    /// Item flavour.
    pub flags: ItemKind,
    /// Parent item on the linked template, if template-owned.
    pub template_item_id: Option<ItemId>,
    /// Value map, if any.
    pub value_map_id: Option<u64>,
    /// Host interface the collector binds to, if any.
    pub interface_id: Option<InterfaceId>,
    /// Master item for dependent items.
    pub master_item_id: Option<ItemId>,
    /// Inventory slot this item populates; 0 = none.
    pub inventory_link: i32,
    /// History retention expression.
    pub history: String,
    /// Trends retention expression.
    pub trends: String,
    /// Units string.
    pub units: String,
    /// Free-form description.
    pub description: String,
    /// Item status (0 enabled, 1 disabled).
    pub status: i32,
}

impl ItemRow {
    /// A minimal enabled item; fixtures adjust the rest.
    pub fn new(item_id: ItemId, host_id: HostId, key: impl Into<String>) -> Self {
        let key = key.into();
        ItemRow {
            item_id,
            host_id,
            name: key.clone(),
            key,
            item_type: ItemType::Trapper,
            value_type: 0,
            delay: "1m".into(),
            flags: ItemKind::Normal,
            template_item_id: None,
            value_map_id: None,
            interface_id: None,
            master_item_id: None,
            inventory_link: 0,
            history: "90d".into(),
            trends: "365d".into(),
            units: String::new(),
            description: String::new(),
            status: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_requirements() {
        assert_eq!(
            ItemType::Snmp.interface_requirement(),
            InterfaceRequirement::Specific(InterfaceType::Snmp)
        );
        assert_eq!(
            ItemType::SimpleCheck.interface_requirement(),
            InterfaceRequirement::Any
        );
        assert_eq!(
            ItemType::Calculated.interface_requirement(),
            InterfaceRequirement::None
        );
    }

    #[test]
    fn new_item_defaults() {
        let item = ItemRow::new(7, 3, "cpu.util");
        assert_eq!(item.key, "cpu.util");
        assert_eq!(item.name, "cpu.util");
        assert!(item.template_item_id.is_none());
        assert_eq!(item.flags, ItemKind::Normal);
    }
}
