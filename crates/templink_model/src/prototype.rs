//! Host prototypes and their five sub-collections.

use crate::ids::{GroupId, GroupPrototypeId, HostId, InterfaceId, ItemId, MacroId, TagId};
use crate::item::InterfaceType;

/// A host prototype: the pattern a discovery rule spawns hosts from.
///
/// The prototype itself is a row in the hosts table (kind = prototype); the
/// discovery mapping table links it to its rule item. `template_id` points
/// at the template-side prototype it was materialized from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPrototypeRow {
    /// Host id of the prototype.
    pub host_id: HostId,
    /// Technical host pattern (`{#VMNAME}` style); the pairing key.
    pub host: String,
    /// Visible name pattern.
    pub name: String,
    /// Status spawned hosts start with.
    pub status: i32,
    /// Discover flag.
    pub discover: i32,
    /// Whether spawned hosts get their own interface list.
    pub custom_interfaces: i32,
    /// Parent prototype on the linked template.
    pub template_id: Option<HostId>,
}

/// A group pattern attached to a host prototype.
///
/// Either a fixed group (`group_id` set) or a name pattern to be created at
/// discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPrototypeRow {
    /// Group prototype id.
    pub group_prototype_id: GroupPrototypeId,
    /// Owning host prototype.
    pub host_id: HostId,
    /// Group name pattern; empty when `group_id` is set.
    pub name: String,
    /// Fixed group, if any.
    pub group_id: Option<GroupId>,
    /// Parent group prototype on the template side.
    pub template_id: Option<GroupPrototypeId>,
}

/// A user macro attached to a host prototype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrototypeMacroRow {
    /// Macro row id.
    pub macro_id: MacroId,
    /// Owning host prototype.
    pub host_id: HostId,
    /// Macro name, `{$NAME}` form; the identity key within a prototype.
    pub macro_name: String,
    /// Macro value.
    pub value: String,
    /// Description.
    pub description: String,
    /// Text / secret / vault, as its schema code.
    pub macro_type: i32,
}

/// A tag attached to a host (prototype).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTagRow {
    /// Tag row id.
    pub tag_id: TagId,
    /// Owning host.
    pub host_id: HostId,
    /// Tag name.
    pub tag: String,
    /// Tag value.
    pub value: String,
}

/// SNMP details of an interface, stored in a side table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnmpDetails {
    /// Protocol version (1 / 2c / 3), as its schema code.
    pub version: i32,
    /// Use bulk requests.
    pub bulk: i32,
    /// v1/v2c community.
    pub community: String,
    /// v3 security name.
    pub security_name: String,
    /// v3 security level, as its schema code.
    pub security_level: i32,
    /// v3 authentication passphrase.
    pub auth_passphrase: String,
    /// v3 privacy passphrase.
    pub priv_passphrase: String,
    /// v3 authentication protocol, as its schema code.
    pub auth_protocol: i32,
    /// v3 privacy protocol, as its schema code.
    pub priv_protocol: i32,
    /// v3 context name.
    pub context_name: String,
}

/// An interface attached to a host prototype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrototypeInterfaceRow {
    /// Interface id.
    pub interface_id: InterfaceId,
    /// Owning host prototype.
    pub host_id: HostId,
    /// Default interface of its type.
    pub main: i32,
    /// Interface type.
    pub interface_type: InterfaceType,
    /// Connect via IP (1) or DNS (0).
    pub use_ip: i32,
    /// IP address.
    pub ip: String,
    /// DNS name.
    pub dns: String,
    /// Port.
    pub port: String,
    /// SNMP sub-record, present exactly for SNMP interfaces.
    pub snmp: Option<SnmpDetails>,
}

/// The discovery-rule attachment of a host prototype, resolved through the
/// host-discovery mapping: which rule item spawns this prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrototypeRule {
    /// The prototype host.
    pub host_id: HostId,
    /// The discovery rule item it hangs off.
    pub rule_item_id: ItemId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snmp_presence_tracks_type() {
        let iface = PrototypeInterfaceRow {
            interface_id: 1,
            host_id: 2,
            main: 1,
            interface_type: InterfaceType::Agent,
            use_ip: 1,
            ip: "127.0.0.1".into(),
            dns: String::new(),
            port: "10050".into(),
            snmp: None,
        };
        assert!(iface.snmp.is_none());
    }
}
