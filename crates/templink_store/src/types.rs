//! Snapshot and update shapes exchanged through [`crate::LinkStore`].
//!
//! Snapshot shapes are join results the differs consume; update shapes carry
//! the target id, the new values and a dirty bitset naming the columns the
//! writer must emit.

use templink_model::{
    CorrelationMode, FunctionId, GraphItemRow, GroupPrototypeId, HostId, HostPrototypeRow,
    InterfaceId, InterfaceUpdateFlags, ItemId, MacroId, MacroUpdateFlags, PrototypeUpdateFlags,
    SnmpDetails, SnmpUpdateFlags, TagId, TagUpdateFlags, TriggerId, TriggerUpdateFlags,
};

/// A trigger function joined with the key of its item.
///
/// The trigger differ matches functions across hosts by `(item_key,
/// parameter)`; carrying the key in the snapshot avoids a second item pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionKeyRow {
    /// Function id.
    pub function_id: FunctionId,
    /// Owning trigger.
    pub trigger_id: TriggerId,
    /// The item the function evaluates.
    pub item_id: ItemId,
    /// Key of that item.
    pub item_key: String,
    /// Function name.
    pub name: String,
    /// Function parameter string.
    pub parameter: String,
}

/// A graph curve joined with the key of its item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphItemKeyRow {
    /// The curve.
    pub row: GraphItemRow,
    /// Key of the plotted item.
    pub item_key: String,
}

/// A template-side host prototype paired with the host-side rule item it
/// must hang off after linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePrototypeRow {
    /// The discovery-rule item on the target host (the host-side mirror of
    /// the template rule).
    pub host_rule_item_id: ItemId,
    /// The prototype as defined on the template.
    pub prototype: HostPrototypeRow,
}

/// Adoption of template attributes by an equivalent host trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerUpdate {
    /// The host trigger being updated.
    pub trigger_id: TriggerId,
    /// The template trigger it now mirrors.
    pub template_id: TriggerId,
    /// Columns to emit.
    pub dirty: TriggerUpdateFlags,
    /// New `flags` value.
    pub flags: templink_model::ItemKind,
    /// New recovery mode.
    pub recovery_mode: templink_model::RecoveryMode,
    /// New correlation mode.
    pub correlation_mode: CorrelationMode,
    /// New correlation tag.
    pub correlation_tag: String,
    /// New manual-close setting.
    pub manual_close: i32,
    /// New operational data.
    pub opdata: String,
    /// New discover flag.
    pub discover: i32,
    /// New event name.
    pub event_name: String,
}

/// Scalar update of a linked host prototype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrototypeUpdate {
    /// The host-side prototype.
    pub host_id: HostId,
    /// The template-side prototype it mirrors.
    pub template_id: HostId,
    /// Columns to emit.
    pub dirty: PrototypeUpdateFlags,
    /// New visible name.
    pub name: String,
    /// New status.
    pub status: i32,
    /// New discover flag.
    pub discover: i32,
    /// New custom-interfaces mode.
    pub custom_interfaces: i32,
}

/// Re-point of a group prototype at its template counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPrototypeUpdate {
    /// The host-side group prototype.
    pub group_prototype_id: GroupPrototypeId,
    /// The template-side group prototype it mirrors.
    pub template_id: GroupPrototypeId,
}

/// Content update of a prototype macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroUpdate {
    /// The macro row.
    pub macro_id: MacroId,
    /// Columns to emit.
    pub dirty: MacroUpdateFlags,
    /// New value.
    pub value: String,
    /// New description.
    pub description: String,
    /// New type.
    pub macro_type: i32,
}

/// Positional replacement of a host tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUpdate {
    /// The tag row being overwritten in place.
    pub tag_id: TagId,
    /// Columns to emit.
    pub dirty: TagUpdateFlags,
    /// New tag name.
    pub tag: String,
    /// New tag value.
    pub value: String,
}

/// Content update of a prototype interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceUpdate {
    /// The interface row.
    pub interface_id: InterfaceId,
    /// Columns to emit.
    pub dirty: InterfaceUpdateFlags,
    /// New default marker.
    pub main: i32,
    /// New type.
    pub interface_type: templink_model::InterfaceType,
    /// New IP-vs-DNS setting.
    pub use_ip: i32,
    /// New IP.
    pub ip: String,
    /// New DNS.
    pub dns: String,
    /// New port.
    pub port: String,
    /// SNMP side: how the detail row changes.
    pub snmp: SnmpChange,
}

/// What happens to the SNMP detail row of an updated interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpChange {
    /// The interface is not SNMP on either side.
    None,
    /// A detail row must be created (host side had none).
    Create(SnmpDetails),
    /// The existing detail row is updated with the dirty columns.
    Update {
        /// Columns to emit.
        dirty: SnmpUpdateFlags,
        /// New values.
        details: SnmpDetails,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use templink_model::TriggerUpdateFlags;

    #[test]
    fn trigger_update_dirty_defaults_empty() {
        let update = TriggerUpdate {
            trigger_id: 1,
            template_id: 2,
            dirty: TriggerUpdateFlags::none(),
            flags: templink_model::ItemKind::Normal,
            recovery_mode: templink_model::RecoveryMode::Expression,
            correlation_mode: CorrelationMode::Disabled,
            correlation_tag: String::new(),
            manual_close: 0,
            opdata: String::new(),
            discover: 0,
            event_name: String::new(),
        };
        assert!(update.dirty.is_empty());
    }
}
