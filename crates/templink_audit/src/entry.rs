//! Audit entry shapes.

use std::collections::BTreeMap;

/// What happened to the audited entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Entity was created.
    Add,
    /// Entity attributes changed.
    Update,
    /// Entity was removed.
    Delete,
}

impl AuditAction {
    /// The numeric code stored in the audit table.
    pub fn code(&self) -> i32 {
        match self {
            AuditAction::Add => 1,
            AuditAction::Update => 2,
            AuditAction::Delete => 3,
        }
    }
}

/// The audited entity's resource type, with its schema code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// A host (also covers the template-link change on a host).
    Host,
    /// A graph.
    Graph,
    /// A trigger.
    Trigger,
    /// An item.
    Item,
    /// A web scenario.
    Scenario,
    /// A low-level discovery rule.
    DiscoveryRule,
    /// A trigger prototype.
    TriggerPrototype,
    /// A graph prototype.
    GraphPrototype,
    /// An item prototype.
    ItemPrototype,
    /// A host prototype.
    HostPrototype,
}

impl ResourceType {
    /// The numeric code stored in the audit table.
    pub fn code(&self) -> i32 {
        match self {
            ResourceType::Host => 4,
            ResourceType::Graph => 6,
            ResourceType::Trigger => 13,
            ResourceType::Item => 15,
            ResourceType::Scenario => 22,
            ResourceType::DiscoveryRule => 23,
            ResourceType::TriggerPrototype => 31,
            ResourceType::GraphPrototype => 35,
            ResourceType::ItemPrototype => 36,
            ResourceType::HostPrototype => 37,
        }
    }

    /// The json-path prefix used for this resource's detail keys.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            ResourceType::Host => "host",
            ResourceType::Graph => "graph",
            ResourceType::Trigger => "trigger",
            ResourceType::Item => "item",
            ResourceType::Scenario => "httptest",
            ResourceType::DiscoveryRule => "discoveryrule",
            ResourceType::TriggerPrototype => "triggerprototype",
            ResourceType::GraphPrototype => "graphprototype",
            ResourceType::ItemPrototype => "itemprototype",
            ResourceType::HostPrototype => "hostprototype",
        }
    }
}

/// A value stored under a detail path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailValue {
    /// String attribute.
    Str(String),
    /// Integer attribute.
    Int(i64),
}

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::Str(value.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(value: String) -> Self {
        DetailValue::Str(value)
    }
}

impl From<i64> for DetailValue {
    fn from(value: i64) -> Self {
        DetailValue::Int(value)
    }
}

impl From<u64> for DetailValue {
    fn from(value: u64) -> Self {
        DetailValue::Int(value as i64)
    }
}

impl From<i32> for DetailValue {
    fn from(value: i32) -> Self {
        DetailValue::Int(i64::from(value))
    }
}

/// One buffered audit entry: an entity plus its accumulated details.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    /// Entity id.
    pub id: u64,
    /// Entity name at mutation time.
    pub name: String,
    /// What happened.
    pub action: AuditAction,
    /// Resource type.
    pub resource_type: ResourceType,
    /// Detail document: dotted path → value, flushed as flat JSON.
    pub details: BTreeMap<String, DetailValue>,
}

impl AuditEntry {
    /// Serializes the detail document as a flat JSON object.
    pub fn details_json(&self) -> String {
        let mut map = serde_json::Map::new();
        for (path, value) in &self.details {
            let json = match value {
                DetailValue::Str(s) => serde_json::Value::String(s.clone()),
                DetailValue::Int(i) => serde_json::Value::Number((*i).into()),
            };
            map.insert(path.clone(), json);
        }
        serde_json::Value::Object(map).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_and_resource_codes() {
        assert_eq!(AuditAction::Add.code(), 1);
        assert_eq!(AuditAction::Delete.code(), 3);
        assert_eq!(ResourceType::Host.code(), 4);
        assert_eq!(ResourceType::HostPrototype.code(), 37);
    }

    #[test]
    fn details_render_as_flat_object() {
        let mut entry = AuditEntry {
            id: 7,
            name: "CPU high".into(),
            action: AuditAction::Update,
            resource_type: ResourceType::Trigger,
            details: BTreeMap::new(),
        };
        entry
            .details
            .insert("trigger.opdata".into(), DetailValue::Str("load".into()));
        entry
            .details
            .insert("trigger.priority".into(), DetailValue::Int(4));

        assert_eq!(
            entry.details_json(),
            r#"{"trigger.opdata":"load","trigger.priority":4}"#
        );
    }
}
