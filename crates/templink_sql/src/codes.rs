//! Conversions between model enums and their schema codes.

use crate::client::{SqlError, SqlResult};
use templink_model::{
    AxisBound, ConditionKind, CorrelationMode, FieldKind, HostKind, InterfaceType, ItemKind,
    ItemType, RecoveryMode, SysmapElementKind,
};

/// `hosts.status` for regular hosts.
pub const HOST_STATUS_MONITORED: i32 = 0;
/// `hosts.status` for templates.
pub const HOST_STATUS_TEMPLATE: i32 = 3;
/// `hosts.flags` for prototypes.
pub const HOST_FLAG_PROTOTYPE: i32 = 2;

/// Encodes an item type.
pub fn item_type_code(value: ItemType) -> i32 {
    match value {
        ItemType::Agent => 0,
        ItemType::Trapper => 2,
        ItemType::SimpleCheck => 3,
        ItemType::Internal => 5,
        ItemType::AgentActive => 7,
        ItemType::Aggregate => 8,
        ItemType::HttpTest => 9,
        ItemType::External => 10,
        ItemType::DbMonitor => 11,
        ItemType::Ipmi => 12,
        ItemType::Ssh => 13,
        ItemType::Telnet => 14,
        ItemType::Calculated => 15,
        ItemType::Jmx => 16,
        ItemType::Dependent => 18,
        ItemType::HttpAgent => 19,
        ItemType::Snmp => 20,
    }
}

/// Decodes an item type.
pub fn item_type_from(code: i64) -> SqlResult<ItemType> {
    Ok(match code {
        0 => ItemType::Agent,
        2 => ItemType::Trapper,
        3 => ItemType::SimpleCheck,
        5 => ItemType::Internal,
        7 => ItemType::AgentActive,
        8 => ItemType::Aggregate,
        9 => ItemType::HttpTest,
        10 => ItemType::External,
        11 => ItemType::DbMonitor,
        12 => ItemType::Ipmi,
        13 => ItemType::Ssh,
        14 => ItemType::Telnet,
        15 => ItemType::Calculated,
        16 => ItemType::Jmx,
        18 => ItemType::Dependent,
        19 => ItemType::HttpAgent,
        20 => ItemType::Snmp,
        other => return Err(SqlError::RowShape(format!("unknown item type {other}"))),
    })
}

/// Encodes the `flags` column.
pub fn item_kind_code(value: ItemKind) -> i32 {
    match value {
        ItemKind::Normal => 0,
        ItemKind::Rule => 1,
        ItemKind::Prototype => 2,
        ItemKind::Created => 4,
    }
}

/// Decodes the `flags` column.
pub fn item_kind_from(code: i64) -> SqlResult<ItemKind> {
    Ok(match code {
        0 => ItemKind::Normal,
        1 => ItemKind::Rule,
        2 => ItemKind::Prototype,
        4 => ItemKind::Created,
        other => return Err(SqlError::RowShape(format!("unknown flags value {other}"))),
    })
}

/// Decodes a host row's kind from its status and flags columns.
pub fn host_kind_from(status: i64, flags: i64) -> HostKind {
    if flags == i64::from(HOST_FLAG_PROTOTYPE) {
        HostKind::Prototype
    } else if status == i64::from(HOST_STATUS_TEMPLATE) {
        HostKind::Template
    } else {
        HostKind::Regular
    }
}

/// Encodes an interface type.
pub fn interface_type_code(value: InterfaceType) -> i32 {
    match value {
        InterfaceType::Agent => 1,
        InterfaceType::Snmp => 2,
        InterfaceType::Ipmi => 3,
        InterfaceType::Jmx => 4,
    }
}

/// Decodes an interface type.
pub fn interface_type_from(code: i64) -> SqlResult<InterfaceType> {
    Ok(match code {
        1 => InterfaceType::Agent,
        2 => InterfaceType::Snmp,
        3 => InterfaceType::Ipmi,
        4 => InterfaceType::Jmx,
        other => {
            return Err(SqlError::RowShape(format!(
                "unknown interface type {other}"
            )))
        }
    })
}

/// Encodes a recovery mode.
pub fn recovery_mode_code(value: RecoveryMode) -> i32 {
    match value {
        RecoveryMode::Expression => 0,
        RecoveryMode::RecoveryExpression => 1,
        RecoveryMode::None => 2,
    }
}

/// Decodes a recovery mode.
pub fn recovery_mode_from(code: i64) -> SqlResult<RecoveryMode> {
    Ok(match code {
        0 => RecoveryMode::Expression,
        1 => RecoveryMode::RecoveryExpression,
        2 => RecoveryMode::None,
        other => return Err(SqlError::RowShape(format!("unknown recovery mode {other}"))),
    })
}

/// Encodes a correlation mode.
pub fn correlation_mode_code(value: CorrelationMode) -> i32 {
    match value {
        CorrelationMode::Disabled => 0,
        CorrelationMode::Tag => 1,
    }
}

/// Decodes a correlation mode.
pub fn correlation_mode_from(code: i64) -> SqlResult<CorrelationMode> {
    Ok(match code {
        0 => CorrelationMode::Disabled,
        1 => CorrelationMode::Tag,
        other => {
            return Err(SqlError::RowShape(format!(
                "unknown correlation mode {other}"
            )))
        }
    })
}

/// Encodes an axis bound mode.
pub fn axis_bound_code(value: AxisBound) -> i32 {
    match value {
        AxisBound::Calculated => 0,
        AxisBound::Fixed => 1,
        AxisBound::ItemValue => 2,
    }
}

/// Decodes an axis bound mode.
pub fn axis_bound_from(code: i64) -> SqlResult<AxisBound> {
    Ok(match code {
        0 => AxisBound::Calculated,
        1 => AxisBound::Fixed,
        2 => AxisBound::ItemValue,
        other => return Err(SqlError::RowShape(format!("unknown axis bound {other}"))),
    })
}

/// Encodes a web field kind.
pub fn field_kind_code(value: FieldKind) -> i32 {
    match value {
        FieldKind::Header => 0,
        FieldKind::Variable => 1,
        FieldKind::PostField => 2,
        FieldKind::QueryField => 3,
    }
}

/// Decodes a web field kind.
pub fn field_kind_from(code: i64) -> SqlResult<FieldKind> {
    Ok(match code {
        0 => FieldKind::Header,
        1 => FieldKind::Variable,
        2 => FieldKind::PostField,
        3 => FieldKind::QueryField,
        other => return Err(SqlError::RowShape(format!("unknown field kind {other}"))),
    })
}

/// Encodes a sysmap element kind.
pub fn sysmap_kind_code(value: SysmapElementKind) -> i32 {
    match value {
        SysmapElementKind::Host => 0,
        SysmapElementKind::Trigger => 2,
    }
}

/// Encodes an action condition kind.
pub fn condition_kind_code(value: ConditionKind) -> i32 {
    match value {
        ConditionKind::HostGroup => 0,
        ConditionKind::Host => 1,
        ConditionKind::Trigger => 2,
    }
}

/// Decodes an action condition kind.
pub fn condition_kind_from(code: i64) -> SqlResult<ConditionKind> {
    Ok(match code {
        0 => ConditionKind::HostGroup,
        1 => ConditionKind::Host,
        2 => ConditionKind::Trigger,
        other => {
            return Err(SqlError::RowShape(format!(
                "unknown condition kind {other}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_roundtrip() {
        for ty in [
            ItemType::Agent,
            ItemType::Snmp,
            ItemType::Dependent,
            ItemType::HttpTest,
        ] {
            assert_eq!(item_type_from(i64::from(item_type_code(ty))).unwrap(), ty);
        }
    }

    #[test]
    fn host_kind_decoding() {
        assert_eq!(host_kind_from(0, 0), HostKind::Regular);
        assert_eq!(host_kind_from(3, 0), HostKind::Template);
        assert_eq!(host_kind_from(0, 2), HostKind::Prototype);
    }

    #[test]
    fn unknown_codes_are_row_shape_errors() {
        assert!(item_type_from(99).is_err());
        assert!(interface_type_from(9).is_err());
    }
}
