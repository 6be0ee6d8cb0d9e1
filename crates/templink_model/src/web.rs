//! Web scenarios: multi-step HTTP probes and their sub-collections.

use crate::ids::{HostId, ItemId, ScenarioId, StepId, TagId};

/// A multi-step HTTP probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebScenarioRow {
    /// Scenario id.
    pub scenario_id: ScenarioId,
    /// Owning host.
    pub host_id: HostId,
    /// Scenario name; the pairing key between template and host side.
    pub name: String,
    /// Execution interval expression.
    pub delay: String,
    /// Status (0 enabled, 1 disabled).
    pub status: i32,
    /// User-agent string.
    pub agent: String,
    /// HTTP authentication mode, as its schema code.
    pub authentication: i32,
    /// Authentication user.
    pub http_user: String,
    /// Authentication password.
    pub http_password: String,
    /// Proxy URL.
    pub http_proxy: String,
    /// Retry count.
    pub retries: i32,
    /// Parent scenario on the linked template.
    pub template_id: Option<ScenarioId>,
}

/// One step of a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebStepRow {
    /// Step id.
    pub step_id: StepId,
    /// Owning scenario.
    pub scenario_id: ScenarioId,
    /// Step name.
    pub name: String,
    /// Ordinal within the scenario, 1-based.
    pub no: i32,
    /// Target URL.
    pub url: String,
    /// Timeout expression.
    pub timeout: String,
    /// POST body.
    pub posts: String,
    /// Required response substring.
    pub required: String,
    /// Accepted status code ranges.
    pub status_codes: String,
    /// Follow redirects.
    pub follow_redirects: i32,
    /// What to retrieve (body / headers / both), as its schema code.
    pub retrieve_mode: i32,
    /// Raw or form-encoded POST.
    pub post_type: i32,
}

/// Field kinds attachable to scenarios and steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// HTTP header.
    Header,
    /// Scenario variable.
    Variable,
    /// POST form field.
    PostField,
    /// Query-string field.
    QueryField,
}

impl FieldKind {
    /// The audit-path segment for this kind.
    pub fn audit_segment(&self) -> &'static str {
        match self {
            FieldKind::Header => "headers",
            FieldKind::Variable => "variables",
            FieldKind::PostField => "posts",
            FieldKind::QueryField => "query_fields",
        }
    }
}

/// A name/value field on a scenario or step. Owner is implied by the table
/// the row lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebFieldRow {
    /// Field row id.
    pub field_id: u64,
    /// Owning scenario or step.
    pub owner_id: u64,
    /// Field kind.
    pub kind: FieldKind,
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
}

/// The hidden item a scenario reports into (status, duration, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioItemRow {
    /// Row id.
    pub row_id: u64,
    /// Owning scenario.
    pub scenario_id: ScenarioId,
    /// The backing item.
    pub item_id: ItemId,
    /// What the item records, as its schema code.
    pub item_purpose: i32,
}

/// The hidden item a step reports into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepItemRow {
    /// Row id.
    pub row_id: u64,
    /// Owning step.
    pub step_id: StepId,
    /// The backing item.
    pub item_id: ItemId,
    /// What the item records, as its schema code.
    pub item_purpose: i32,
}

/// A tag on a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebTagRow {
    /// Tag row id.
    pub tag_id: TagId,
    /// Owning scenario.
    pub scenario_id: ScenarioId,
    /// Tag name.
    pub tag: String,
    /// Tag value.
    pub value: String,
}

impl WebScenarioRow {
    /// A minimal enabled scenario.
    pub fn new(scenario_id: ScenarioId, host_id: HostId, name: impl Into<String>) -> Self {
        WebScenarioRow {
            scenario_id,
            host_id,
            name: name.into(),
            delay: "1m".into(),
            status: 0,
            agent: "Templink".into(),
            authentication: 0,
            http_user: String::new(),
            http_password: String::new(),
            http_proxy: String::new(),
            retries: 1,
            template_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kind_audit_segments() {
        assert_eq!(FieldKind::Header.audit_segment(), "headers");
        assert_eq!(FieldKind::QueryField.audit_segment(), "query_fields");
    }
}
