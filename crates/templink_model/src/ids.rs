//! Id aliases and the id-domain enumeration.
//!
//! All ids are 64-bit and come out of per-table monotonic counters; the
//! aliases exist to keep signatures readable, not to enforce typing at the
//! boundary (expressions legitimately mix function ids into text).

/// Host identifier. Templates and host prototypes are hosts too.
pub type HostId = u64;
/// Item identifier.
pub type ItemId = u64;
/// Trigger identifier.
pub type TriggerId = u64;
/// Trigger function identifier, referenced from expressions as `{id}`.
pub type FunctionId = u64;
/// Graph identifier.
pub type GraphId = u64;
/// Graph item (curve) identifier.
pub type GraphItemId = u64;
/// Group prototype identifier.
pub type GroupPrototypeId = u64;
/// Host group identifier.
pub type GroupId = u64;
/// User macro identifier.
pub type MacroId = u64;
/// Tag row identifier (host, trigger or scenario tags).
pub type TagId = u64;
/// Interface identifier.
pub type InterfaceId = u64;
/// Web scenario identifier.
pub type ScenarioId = u64;
/// Web scenario step identifier.
pub type StepId = u64;
/// Host-template link row identifier.
pub type LinkId = u64;
/// Trigger dependency row identifier.
pub type DependencyId = u64;
/// Housekeeper queue row identifier.
pub type HousekeeperId = u64;

/// The id-bearing tables an allocator reserves blocks for.
///
/// One counter per domain; `reserve_ids(domain, n)` returns the first id of
/// a dense block of `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdDomain {
    /// `hosts` (regular hosts, templates and host prototypes).
    Hosts,
    /// `hosts_templates` link rows.
    TemplateLinks,
    /// `items`.
    Items,
    /// `triggers`.
    Triggers,
    /// `functions`.
    Functions,
    /// `trigger_depends`.
    TriggerDependencies,
    /// `trigger_tag`.
    TriggerTags,
    /// `graphs`.
    Graphs,
    /// `graphs_items`.
    GraphItems,
    /// `group_prototype`.
    GroupPrototypes,
    /// `hostmacro`.
    HostMacros,
    /// `host_tag`.
    HostTags,
    /// `interface`.
    Interfaces,
    /// `httptest`.
    Scenarios,
    /// `httpstep`.
    Steps,
    /// `httptest_field` and `httpstep_field`.
    WebFields,
    /// `httptestitem` and `httpstepitem`.
    WebItems,
    /// `httptest_tag`.
    WebTags,
    /// `housekeeper`.
    Housekeeper,
}

impl IdDomain {
    /// The underlying table name, as used in diagnostics.
    pub fn table(&self) -> &'static str {
        match self {
            IdDomain::Hosts => "hosts",
            IdDomain::TemplateLinks => "hosts_templates",
            IdDomain::Items => "items",
            IdDomain::Triggers => "triggers",
            IdDomain::Functions => "functions",
            IdDomain::TriggerDependencies => "trigger_depends",
            IdDomain::TriggerTags => "trigger_tag",
            IdDomain::Graphs => "graphs",
            IdDomain::GraphItems => "graphs_items",
            IdDomain::GroupPrototypes => "group_prototype",
            IdDomain::HostMacros => "hostmacro",
            IdDomain::HostTags => "host_tag",
            IdDomain::Interfaces => "interface",
            IdDomain::Scenarios => "httptest",
            IdDomain::Steps => "httpstep",
            IdDomain::WebFields => "httptest_field",
            IdDomain::WebItems => "httptestitem",
            IdDomain::WebTags => "httptest_tag",
            IdDomain::Housekeeper => "housekeeper",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_table_names() {
        assert_eq!(IdDomain::Triggers.table(), "triggers");
        assert_eq!(IdDomain::TemplateLinks.table(), "hosts_templates");
        assert_eq!(IdDomain::WebFields.table(), "httptest_field");
    }
}
