//! The store trait the linkage engine runs against.

use crate::error::StoreResult;
use crate::types::{
    FunctionKeyRow, GraphItemKeyRow, GroupPrototypeUpdate, InterfaceUpdate, MacroUpdate,
    PrototypeUpdate, TagUpdate, TemplatePrototypeRow, TriggerUpdate,
};
use templink_model::discovery::{GraphDiscoveryRow, GroupDiscoveryRow, ItemDiscoveryRow};
use templink_model::{
    ActionConditionRow, AuditRow, ConditionKind, FunctionRow, GraphId, GraphItemRow, GraphRow,
    GroupId, GroupPrototypeId, GroupPrototypeRow, HostId, HostPrototypeRow, HostRow, HostTagRow,
    HousekeeperRow, IdDomain, InterfaceId, ItemId, ItemRow, LinkId, MacroId,
    PrototypeInterfaceRow, PrototypeMacroRow, ScenarioId, ScenarioItemRow, StepId, StepItemRow,
    SysmapElementKind,
    SysmapElementRow, TagId, TemplateLinkRow, TriggerDependencyRow, TriggerDiscoveryRow,
    TriggerId, TriggerRow, TriggerTagRow, WebFieldRow, WebScenarioRow, WebStepRow, WebTagRow,
};

/// Relational access for one linkage request.
///
/// All methods run inside the caller's transaction; the engine is the sole
/// mutator within it. Reads are snapshots of committed-or-own state; writes
/// are batched by the implementation. Child rows follow their parents on
/// delete the way the schema's foreign keys cascade: deleting a trigger
/// drops its functions, tags and dependency edges; deleting a scenario
/// drops its steps, fields, item links and tags; deleting a host drops its
/// macros, tags, interfaces, template links and discovery mappings.
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - reference implementation, used by every test
/// - `templink_sql::SqlStore` - renders SQL through a client connection
pub trait LinkStore: Send + Sync {
    // ----- id allocation -------------------------------------------------

    /// Reserves `count` contiguous ids in `domain` and returns the first.
    ///
    /// The reservation must be atomic with respect to concurrent linkers;
    /// ids are never reused within the lifetime of the database.
    fn reserve_ids(&self, domain: IdDomain, count: u64) -> StoreResult<u64>;

    // ----- hosts and template links --------------------------------------

    /// Fetches one host row.
    fn host(&self, host_id: HostId) -> StoreResult<Option<HostRow>>;

    /// Fetches host rows by id; missing ids are silently absent.
    fn hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<HostRow>>;

    /// Template links attached to the given hosts (or host prototypes).
    fn template_links(&self, host_ids: &[HostId]) -> StoreResult<Vec<TemplateLinkRow>>;

    /// Inserts host ↔ template link rows.
    fn insert_template_links(&self, rows: &[TemplateLinkRow]) -> StoreResult<()>;

    /// Deletes the links between one host and the given templates.
    fn delete_template_links(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<()>;

    /// Deletes link rows by id (host-prototype linked-template sub-diff).
    fn delete_links_by_id(&self, link_ids: &[LinkId]) -> StoreResult<()>;

    /// Deletes host rows and their owned sub-rows.
    fn delete_hosts(&self, host_ids: &[HostId]) -> StoreResult<()>;

    // ----- items ---------------------------------------------------------

    /// All items on the given hosts.
    fn items_by_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<ItemRow>>;

    /// Items by id; missing ids are silently absent.
    fn items_by_ids(&self, item_ids: &[ItemId]) -> StoreResult<Vec<ItemRow>>;

    /// Items on `host_id` whose parent link points at an item of one of the
    /// given template hosts.
    fn template_items_on_host(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<ItemRow>>;

    /// Child items (created and prototypes) of the given items.
    fn item_children(&self, item_ids: &[ItemId]) -> StoreResult<Vec<ItemDiscoveryRow>>;

    /// Deletes items. Functions referencing them are the caller's problem:
    /// the cascade deletes orphaned triggers and graphs first.
    fn delete_items(&self, item_ids: &[ItemId]) -> StoreResult<()>;

    // ----- triggers ------------------------------------------------------

    /// Distinct triggers whose functions reference items of the given
    /// (template) hosts.
    fn triggers_of_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<TriggerRow>>;

    /// Host triggers that are linking candidates: reachable from the host's
    /// items, `template_id` null, description in the given set.
    fn host_trigger_candidates(
        &self,
        host_id: HostId,
        descriptions: &[String],
    ) -> StoreResult<Vec<TriggerRow>>;

    /// Host triggers whose `template_id` is one of the given triggers.
    fn host_triggers_by_template_triggers(
        &self,
        host_id: HostId,
        template_trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<TriggerRow>>;

    /// Triggers referencing any of the given items through a function.
    fn triggers_by_items(&self, item_ids: &[ItemId]) -> StoreResult<Vec<TriggerRow>>;

    /// Triggers by id; missing ids are silently absent.
    fn triggers_by_ids(&self, trigger_ids: &[TriggerId]) -> StoreResult<Vec<TriggerRow>>;

    /// Triggers among the given set that still reference an item outside
    /// the given item set (orphan check on item deletion).
    fn triggers_with_other_items(
        &self,
        trigger_ids: &[TriggerId],
        item_ids: &[ItemId],
    ) -> StoreResult<Vec<TriggerId>>;

    /// Functions of the given triggers, joined with their item keys.
    fn functions_with_keys(&self, trigger_ids: &[TriggerId])
        -> StoreResult<Vec<FunctionKeyRow>>;

    /// Auto-created children of the given triggers.
    fn trigger_children(&self, trigger_ids: &[TriggerId])
        -> StoreResult<Vec<TriggerDiscoveryRow>>;

    /// Dependency edges touching any of the given triggers.
    fn dependencies_touching(
        &self,
        trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<TriggerDependencyRow>>;

    /// Tags of the given triggers.
    fn trigger_tags(&self, trigger_ids: &[TriggerId]) -> StoreResult<Vec<TriggerTagRow>>;

    /// Inserts triggers.
    fn insert_triggers(&self, rows: &[TriggerRow]) -> StoreResult<()>;

    /// Applies equivalence-link updates: always re-points `template_id`,
    /// plus the dirty columns of each update.
    fn update_triggers(&self, updates: &[TriggerUpdate]) -> StoreResult<()>;

    /// Deletes triggers and their owned functions, tags and dependency
    /// edges.
    fn delete_triggers(&self, trigger_ids: &[TriggerId]) -> StoreResult<()>;

    /// Inserts functions.
    fn insert_functions(&self, rows: &[FunctionRow]) -> StoreResult<()>;

    /// Inserts dependency edges.
    fn insert_trigger_dependencies(&self, rows: &[TriggerDependencyRow]) -> StoreResult<()>;

    /// Deletes all tags of the given triggers.
    fn delete_trigger_tags(&self, trigger_ids: &[TriggerId]) -> StoreResult<()>;

    /// Inserts trigger tags.
    fn insert_trigger_tags(&self, rows: &[TriggerTagRow]) -> StoreResult<()>;

    // ----- graphs --------------------------------------------------------

    /// Distinct graphs whose curves reference items of the given hosts.
    fn graphs_of_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<GraphRow>>;

    /// Host graphs with the given name and `template_id` null, reachable
    /// from the host's items.
    fn host_graphs_by_name(&self, host_id: HostId, name: &str) -> StoreResult<Vec<GraphRow>>;

    /// Graphs referencing any of the given items.
    fn graphs_by_items(&self, item_ids: &[ItemId]) -> StoreResult<Vec<GraphRow>>;

    /// Graphs by id; missing ids are silently absent.
    fn graphs_by_ids(&self, graph_ids: &[GraphId]) -> StoreResult<Vec<GraphRow>>;

    /// Graphs among the given set that still reference an item outside the
    /// given item set.
    fn graphs_with_other_items(
        &self,
        graph_ids: &[GraphId],
        item_ids: &[ItemId],
    ) -> StoreResult<Vec<GraphId>>;

    /// Curves of one graph, ordered by the key of the plotted item.
    fn graph_items_by_key(&self, graph_id: GraphId) -> StoreResult<Vec<GraphItemKeyRow>>;

    /// Auto-created children of the given graphs.
    fn graph_children(&self, graph_ids: &[GraphId]) -> StoreResult<Vec<GraphDiscoveryRow>>;

    /// Inserts graphs.
    fn insert_graphs(&self, rows: &[GraphRow]) -> StoreResult<()>;

    /// Replaces the scalar columns of existing graphs (full-row adoption on
    /// equivalence match, including `template_id`).
    fn update_graphs(&self, rows: &[GraphRow]) -> StoreResult<()>;

    /// Inserts curves.
    fn insert_graph_items(&self, rows: &[GraphItemRow]) -> StoreResult<()>;

    /// Replaces the presentation columns of existing curves.
    fn update_graph_items(&self, rows: &[GraphItemRow]) -> StoreResult<()>;

    /// Deletes graphs and their curves.
    fn delete_graphs(&self, graph_ids: &[GraphId]) -> StoreResult<()>;

    // ----- host prototypes -----------------------------------------------

    /// Template-side prototypes reachable from `host_id` through its
    /// template-parented rule items, paired with the host-side rule item.
    fn template_prototypes(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<TemplatePrototypeRow>>;

    /// Host-side prototypes attached to the given rule items.
    fn prototypes_by_rules(
        &self,
        rule_item_ids: &[ItemId],
    ) -> StoreResult<Vec<TemplatePrototypeRow>>;

    /// Host prototypes on `host_id` whose `template_id` chain roots at the
    /// given template hosts (unlink selection).
    fn host_prototypes_by_templates(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<HostPrototypeRow>>;

    /// Host prototypes by id; missing ids are silently absent.
    fn host_prototypes_by_ids(
        &self,
        prototype_ids: &[HostId],
    ) -> StoreResult<Vec<HostPrototypeRow>>;

    /// Hosts discovered from the given prototypes.
    fn discovered_hosts(&self, prototype_ids: &[HostId]) -> StoreResult<Vec<HostId>>;

    /// Group prototypes of the given (prototype) hosts.
    fn group_prototypes(&self, host_ids: &[HostId]) -> StoreResult<Vec<GroupPrototypeRow>>;

    /// Groups discovered from the given group prototypes.
    fn discovered_groups(
        &self,
        group_prototype_ids: &[GroupPrototypeId],
    ) -> StoreResult<Vec<GroupDiscoveryRow>>;

    /// Macros of the given (prototype) hosts.
    fn prototype_macros(&self, host_ids: &[HostId]) -> StoreResult<Vec<PrototypeMacroRow>>;

    /// Tags of the given hosts.
    fn host_tags(&self, host_ids: &[HostId]) -> StoreResult<Vec<HostTagRow>>;

    /// Interfaces of the given (prototype) hosts, SNMP details joined.
    fn prototype_interfaces(
        &self,
        host_ids: &[HostId],
    ) -> StoreResult<Vec<PrototypeInterfaceRow>>;

    /// Inserts host prototypes: the host rows (kind = prototype) plus their
    /// discovery attachment to the given rule items.
    fn insert_host_prototypes(
        &self,
        rows: &[(HostPrototypeRow, ItemId)],
    ) -> StoreResult<()>;

    /// Applies scalar prototype updates (always re-points `template_id`).
    fn update_host_prototypes(&self, updates: &[PrototypeUpdate]) -> StoreResult<()>;

    /// Inserts group prototypes.
    fn insert_group_prototypes(&self, rows: &[GroupPrototypeRow]) -> StoreResult<()>;

    /// Re-points existing group prototypes at their template counterparts.
    fn update_group_prototypes(&self, updates: &[GroupPrototypeUpdate]) -> StoreResult<()>;

    /// Deletes group prototypes.
    fn delete_group_prototypes(
        &self,
        group_prototype_ids: &[GroupPrototypeId],
    ) -> StoreResult<()>;

    /// Deletes discovered groups (and their membership rows).
    fn delete_groups(&self, group_ids: &[GroupId]) -> StoreResult<()>;

    /// Inserts prototype macros.
    fn insert_prototype_macros(&self, rows: &[PrototypeMacroRow]) -> StoreResult<()>;

    /// Applies macro content updates.
    fn update_prototype_macros(&self, updates: &[MacroUpdate]) -> StoreResult<()>;

    /// Deletes prototype macros.
    fn delete_prototype_macros(&self, macro_ids: &[MacroId]) -> StoreResult<()>;

    /// Inserts host tags.
    fn insert_host_tags(&self, rows: &[HostTagRow]) -> StoreResult<()>;

    /// Overwrites host tags in place (positional pairing).
    fn update_host_tags(&self, updates: &[TagUpdate]) -> StoreResult<()>;

    /// Deletes host tags.
    fn delete_host_tags(&self, tag_ids: &[TagId]) -> StoreResult<()>;

    /// Inserts prototype interfaces (SNMP details included).
    fn insert_prototype_interfaces(&self, rows: &[PrototypeInterfaceRow]) -> StoreResult<()>;

    /// Applies interface updates, including SNMP detail creation or update.
    fn update_prototype_interfaces(&self, updates: &[InterfaceUpdate]) -> StoreResult<()>;

    /// Deletes interfaces and their SNMP details.
    fn delete_prototype_interfaces(&self, interface_ids: &[InterfaceId]) -> StoreResult<()>;

    /// Deletes only the SNMP detail rows of the given interfaces.
    fn delete_snmp_details(&self, interface_ids: &[InterfaceId]) -> StoreResult<()>;

    // ----- web scenarios -------------------------------------------------

    /// Scenarios owned by the given hosts.
    fn scenarios_of_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<WebScenarioRow>>;

    /// Host scenarios whose `template_id` is a scenario of the given
    /// template hosts (unlink selection).
    fn host_scenarios_by_templates(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<WebScenarioRow>>;

    /// Scenarios by id; missing ids are silently absent.
    fn scenarios_by_ids(&self, scenario_ids: &[ScenarioId])
        -> StoreResult<Vec<WebScenarioRow>>;

    /// Steps of the given scenarios.
    fn scenario_steps(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<WebStepRow>>;

    /// Scenario-level fields of the given scenarios, in definition order.
    fn scenario_fields(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<WebFieldRow>>;

    /// Step-level fields of the given steps, in definition order.
    fn step_fields(&self, step_ids: &[StepId]) -> StoreResult<Vec<WebFieldRow>>;

    /// Tags of the given scenarios.
    fn scenario_tags(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<WebTagRow>>;

    /// Backing-item links of the given scenarios.
    fn scenario_items(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<ScenarioItemRow>>;

    /// Backing-item links of the given steps.
    fn step_items(&self, step_ids: &[StepId]) -> StoreResult<Vec<StepItemRow>>;

    /// Inserts scenarios.
    fn insert_scenarios(&self, rows: &[WebScenarioRow]) -> StoreResult<()>;

    /// Re-points a host scenario at its template counterpart.
    fn update_scenario_template(
        &self,
        scenario_id: ScenarioId,
        template_id: ScenarioId,
    ) -> StoreResult<()>;

    /// Inserts steps.
    fn insert_steps(&self, rows: &[WebStepRow]) -> StoreResult<()>;

    /// Inserts scenario-level fields.
    fn insert_scenario_fields(&self, rows: &[WebFieldRow]) -> StoreResult<()>;

    /// Inserts step-level fields.
    fn insert_step_fields(&self, rows: &[WebFieldRow]) -> StoreResult<()>;

    /// Inserts scenario item links.
    fn insert_scenario_items(&self, rows: &[ScenarioItemRow]) -> StoreResult<()>;

    /// Inserts step item links.
    fn insert_step_items(&self, rows: &[StepItemRow]) -> StoreResult<()>;

    /// Inserts scenario tags.
    fn insert_web_tags(&self, rows: &[WebTagRow]) -> StoreResult<()>;

    /// Deletes scenarios and all their sub-rows.
    fn delete_scenarios(&self, scenario_ids: &[ScenarioId]) -> StoreResult<()>;

    /// Items backing the given scenarios and their steps.
    fn scenario_backing_items(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<ItemId>>;

    // ----- collaterals, housekeeper, audit -------------------------------

    /// Map elements referencing the given entities.
    fn sysmap_elements(
        &self,
        kind: SysmapElementKind,
        referenced_ids: &[u64],
    ) -> StoreResult<Vec<SysmapElementRow>>;

    /// Deletes map elements.
    fn delete_sysmap_elements(&self, element_ids: &[u64]) -> StoreResult<()>;

    /// Action conditions of the given kind referencing the given ids.
    fn action_conditions(
        &self,
        kind: ConditionKind,
        referenced_ids: &[u64],
    ) -> StoreResult<Vec<ActionConditionRow>>;

    /// Deletes conditions and disables the owning actions.
    fn delete_action_conditions(&self, condition_ids: &[u64]) -> StoreResult<()>;

    /// Enqueues data-reclamation intents for the housekeeper.
    fn enqueue_housekeeper(&self, rows: &[HousekeeperRow]) -> StoreResult<()>;

    /// Inserts flushed audit rows.
    fn insert_audit_rows(&self, rows: &[AuditRow]) -> StoreResult<()>;
}
