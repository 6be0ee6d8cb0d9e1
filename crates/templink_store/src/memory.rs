//! In-memory store implementation.
//!
//! `MemoryStore` keeps every table as a typed `Vec` behind one lock and
//! emulates the schema's foreign-key cascades on delete. It backs every
//! engine test and the round-trip/idempotence properties.

use crate::error::{StoreError, StoreResult};
use crate::store::LinkStore;
use crate::types::{
    FunctionKeyRow, GraphItemKeyRow, GroupPrototypeUpdate, InterfaceUpdate, MacroUpdate,
    PrototypeUpdate, SnmpChange, TagUpdate, TemplatePrototypeRow, TriggerUpdate,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use templink_model::discovery::{
    GraphDiscoveryRow, GroupDiscoveryRow, HostDiscoveryRow, ItemDiscoveryRow,
};
use templink_model::{
    ActionConditionRow, AuditRow, ConditionKind, FunctionRow, GraphId, GraphItemRow, GraphRow,
    GroupId, GroupPrototypeId, GroupPrototypeRow, HostId, HostPrototypeRow, HostRow, HostTagRow,
    HousekeeperRow, IdDomain, InterfaceId, ItemId, ItemRow, LinkId, MacroId,
    PrototypeInterfaceRow, PrototypeMacroRow, ScenarioId, ScenarioItemRow, StepId, StepItemRow,
    SysmapElementKind, SysmapElementRow, TagId, TemplateLinkRow, TriggerDependencyRow,
    TriggerDiscoveryRow, TriggerId, TriggerRow, TriggerTagRow, WebFieldRow, WebScenarioRow,
    WebStepRow, WebTagRow,
};

/// First id handed out by the in-memory allocator. Fixture ids must stay
/// below this so allocated blocks never collide with seeded rows.
pub const FIRST_ALLOCATED_ID: u64 = 100_000;

/// Every table of the linkage schema as a typed vector.
///
/// Fields are public so fixtures can seed state directly and tests can
/// assert on the final contents.
#[derive(Debug, Default, Clone)]
pub struct Dataset {
    /// Regular hosts and templates.
    pub hosts: Vec<HostRow>,
    /// Host prototypes (hosts with kind = prototype, prototype columns).
    pub host_prototypes: Vec<HostPrototypeRow>,
    /// Host ↔ template links.
    pub links: Vec<TemplateLinkRow>,
    /// Items.
    pub items: Vec<ItemRow>,
    /// Item → prototype mapping.
    pub item_discovery: Vec<ItemDiscoveryRow>,
    /// Triggers.
    pub triggers: Vec<TriggerRow>,
    /// Trigger functions.
    pub functions: Vec<FunctionRow>,
    /// Trigger dependency edges.
    pub trigger_deps: Vec<TriggerDependencyRow>,
    /// Trigger tags.
    pub trigger_tags: Vec<TriggerTagRow>,
    /// Trigger → prototype mapping.
    pub trigger_discovery: Vec<TriggerDiscoveryRow>,
    /// Graphs.
    pub graphs: Vec<GraphRow>,
    /// Graph curves.
    pub graph_items: Vec<GraphItemRow>,
    /// Graph → prototype mapping.
    pub graph_discovery: Vec<GraphDiscoveryRow>,
    /// Host → prototype/rule mapping.
    pub host_discovery: Vec<HostDiscoveryRow>,
    /// Group prototypes.
    pub group_prototypes: Vec<GroupPrototypeRow>,
    /// Group → group prototype mapping.
    pub group_discovery: Vec<GroupDiscoveryRow>,
    /// Discovered host groups (ids only; the cascade needs presence).
    pub groups: Vec<GroupId>,
    /// Host (prototype) macros.
    pub host_macros: Vec<PrototypeMacroRow>,
    /// Host tags.
    pub host_tags: Vec<HostTagRow>,
    /// Host (prototype) interfaces.
    pub interfaces: Vec<PrototypeInterfaceRow>,
    /// Web scenarios.
    pub scenarios: Vec<WebScenarioRow>,
    /// Web scenario steps.
    pub steps: Vec<WebStepRow>,
    /// Scenario-level fields.
    pub scenario_fields: Vec<WebFieldRow>,
    /// Step-level fields.
    pub step_fields: Vec<WebFieldRow>,
    /// Scenario backing-item links.
    pub scenario_items: Vec<ScenarioItemRow>,
    /// Step backing-item links.
    pub step_items: Vec<StepItemRow>,
    /// Scenario tags.
    pub web_tags: Vec<WebTagRow>,
    /// Map elements.
    pub sysmap_elements: Vec<SysmapElementRow>,
    /// Action conditions.
    pub action_conditions: Vec<ActionConditionRow>,
    /// Actions disabled because a condition was removed.
    pub disabled_actions: Vec<u64>,
    /// Housekeeper queue.
    pub housekeeper: Vec<HousekeeperRow>,
    /// Flushed audit rows.
    pub audit: Vec<AuditRow>,
}

impl Dataset {
    fn item(&self, item_id: ItemId) -> Option<&ItemRow> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    fn item_key(&self, item_id: ItemId) -> Option<&str> {
        self.item(item_id).map(|i| i.key.as_str())
    }

    /// Trigger ids reachable from items of the given hosts.
    fn trigger_ids_on_hosts(&self, host_ids: &[HostId]) -> Vec<TriggerId> {
        let mut ids: Vec<TriggerId> = self
            .functions
            .iter()
            .filter(|f| {
                self.item(f.item_id)
                    .is_some_and(|i| host_ids.contains(&i.host_id))
            })
            .map(|f| f.trigger_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// The reference [`LinkStore`] implementation.
pub struct MemoryStore {
    data: RwLock<Dataset>,
    counters: RwLock<HashMap<IdDomain, u64>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore {
            data: RwLock::new(Dataset::default()),
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Mutates the dataset directly; used by fixtures.
    pub fn seed<F>(&self, f: F)
    where
        F: FnOnce(&mut Dataset),
    {
        f(&mut self.data.write());
    }

    /// Reads the dataset; used by test assertions.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Dataset) -> R,
    {
        f(&self.data.read())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read();
        f.debug_struct("MemoryStore")
            .field("hosts", &data.hosts.len())
            .field("items", &data.items.len())
            .field("triggers", &data.triggers.len())
            .finish_non_exhaustive()
    }
}

impl LinkStore for MemoryStore {
    fn reserve_ids(&self, domain: IdDomain, count: u64) -> StoreResult<u64> {
        let mut counters = self.counters.write();
        let next = counters.entry(domain).or_insert(FIRST_ALLOCATED_ID);
        let first = *next;
        *next += count;
        Ok(first)
    }

    fn host(&self, host_id: HostId) -> StoreResult<Option<HostRow>> {
        Ok(self
            .data
            .read()
            .hosts
            .iter()
            .find(|h| h.host_id == host_id)
            .cloned())
    }

    fn hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<HostRow>> {
        Ok(self
            .data
            .read()
            .hosts
            .iter()
            .filter(|h| host_ids.contains(&h.host_id))
            .cloned()
            .collect())
    }

    fn template_links(&self, host_ids: &[HostId]) -> StoreResult<Vec<TemplateLinkRow>> {
        Ok(self
            .data
            .read()
            .links
            .iter()
            .filter(|l| host_ids.contains(&l.host_id))
            .copied()
            .collect())
    }

    fn insert_template_links(&self, rows: &[TemplateLinkRow]) -> StoreResult<()> {
        self.data.write().links.extend_from_slice(rows);
        Ok(())
    }

    fn delete_template_links(&self, host_id: HostId, template_ids: &[HostId]) -> StoreResult<()> {
        self.data
            .write()
            .links
            .retain(|l| !(l.host_id == host_id && template_ids.contains(&l.template_id)));
        Ok(())
    }

    fn delete_links_by_id(&self, link_ids: &[LinkId]) -> StoreResult<()> {
        self.data
            .write()
            .links
            .retain(|l| !link_ids.contains(&l.link_id));
        Ok(())
    }

    fn delete_hosts(&self, host_ids: &[HostId]) -> StoreResult<()> {
        let mut data = self.data.write();
        data.hosts.retain(|h| !host_ids.contains(&h.host_id));
        data.host_prototypes
            .retain(|p| !host_ids.contains(&p.host_id));
        data.links.retain(|l| !host_ids.contains(&l.host_id));
        data.host_macros.retain(|m| !host_ids.contains(&m.host_id));
        data.host_tags.retain(|t| !host_ids.contains(&t.host_id));
        data.interfaces.retain(|i| !host_ids.contains(&i.host_id));
        data.host_discovery
            .retain(|d| !host_ids.contains(&d.host_id));
        Ok(())
    }

    fn items_by_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<ItemRow>> {
        Ok(self
            .data
            .read()
            .items
            .iter()
            .filter(|i| host_ids.contains(&i.host_id))
            .cloned()
            .collect())
    }

    fn items_by_ids(&self, item_ids: &[ItemId]) -> StoreResult<Vec<ItemRow>> {
        Ok(self
            .data
            .read()
            .items
            .iter()
            .filter(|i| item_ids.contains(&i.item_id))
            .cloned()
            .collect())
    }

    fn template_items_on_host(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<ItemRow>> {
        let data = self.data.read();
        Ok(data
            .items
            .iter()
            .filter(|i| {
                i.host_id == host_id
                    && i.template_item_id.is_some_and(|parent| {
                        data.item(parent)
                            .is_some_and(|p| template_ids.contains(&p.host_id))
                    })
            })
            .cloned()
            .collect())
    }

    fn item_children(&self, item_ids: &[ItemId]) -> StoreResult<Vec<ItemDiscoveryRow>> {
        Ok(self
            .data
            .read()
            .item_discovery
            .iter()
            .filter(|d| item_ids.contains(&d.parent_item_id))
            .copied()
            .collect())
    }

    fn delete_items(&self, item_ids: &[ItemId]) -> StoreResult<()> {
        let mut data = self.data.write();
        data.items.retain(|i| !item_ids.contains(&i.item_id));
        data.item_discovery
            .retain(|d| !item_ids.contains(&d.item_id) && !item_ids.contains(&d.parent_item_id));
        Ok(())
    }

    fn triggers_of_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<TriggerRow>> {
        let data = self.data.read();
        let ids = data.trigger_ids_on_hosts(host_ids);
        Ok(data
            .triggers
            .iter()
            .filter(|t| ids.contains(&t.trigger_id))
            .cloned()
            .collect())
    }

    fn host_trigger_candidates(
        &self,
        host_id: HostId,
        descriptions: &[String],
    ) -> StoreResult<Vec<TriggerRow>> {
        let data = self.data.read();
        let ids = data.trigger_ids_on_hosts(&[host_id]);
        Ok(data
            .triggers
            .iter()
            .filter(|t| {
                ids.contains(&t.trigger_id)
                    && t.template_id.is_none()
                    && descriptions.contains(&t.description)
            })
            .cloned()
            .collect())
    }

    fn host_triggers_by_template_triggers(
        &self,
        host_id: HostId,
        template_trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<TriggerRow>> {
        let data = self.data.read();
        let ids = data.trigger_ids_on_hosts(&[host_id]);
        Ok(data
            .triggers
            .iter()
            .filter(|t| {
                ids.contains(&t.trigger_id)
                    && t.template_id
                        .is_some_and(|parent| template_trigger_ids.contains(&parent))
            })
            .cloned()
            .collect())
    }

    fn triggers_by_items(&self, item_ids: &[ItemId]) -> StoreResult<Vec<TriggerRow>> {
        let data = self.data.read();
        let mut ids: Vec<TriggerId> = data
            .functions
            .iter()
            .filter(|f| item_ids.contains(&f.item_id))
            .map(|f| f.trigger_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(data
            .triggers
            .iter()
            .filter(|t| ids.contains(&t.trigger_id))
            .cloned()
            .collect())
    }

    fn triggers_by_ids(&self, trigger_ids: &[TriggerId]) -> StoreResult<Vec<TriggerRow>> {
        Ok(self
            .data
            .read()
            .triggers
            .iter()
            .filter(|t| trigger_ids.contains(&t.trigger_id))
            .cloned()
            .collect())
    }

    fn triggers_with_other_items(
        &self,
        trigger_ids: &[TriggerId],
        item_ids: &[ItemId],
    ) -> StoreResult<Vec<TriggerId>> {
        let data = self.data.read();
        let mut ids: Vec<TriggerId> = data
            .functions
            .iter()
            .filter(|f| trigger_ids.contains(&f.trigger_id) && !item_ids.contains(&f.item_id))
            .map(|f| f.trigger_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    fn functions_with_keys(
        &self,
        trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<FunctionKeyRow>> {
        let data = self.data.read();
        data.functions
            .iter()
            .filter(|f| trigger_ids.contains(&f.trigger_id))
            .map(|f| {
                let item_key = data
                    .item_key(f.item_id)
                    .ok_or(StoreError::MissingEntity {
                        entity: "item",
                        id: f.item_id,
                    })?
                    .to_string();
                Ok(FunctionKeyRow {
                    function_id: f.function_id,
                    trigger_id: f.trigger_id,
                    item_id: f.item_id,
                    item_key,
                    name: f.name.clone(),
                    parameter: f.parameter.clone(),
                })
            })
            .collect()
    }

    fn trigger_children(
        &self,
        trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<TriggerDiscoveryRow>> {
        Ok(self
            .data
            .read()
            .trigger_discovery
            .iter()
            .filter(|d| trigger_ids.contains(&d.parent_trigger_id))
            .copied()
            .collect())
    }

    fn dependencies_touching(
        &self,
        trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<TriggerDependencyRow>> {
        Ok(self
            .data
            .read()
            .trigger_deps
            .iter()
            .filter(|d| {
                trigger_ids.contains(&d.trigger_down) || trigger_ids.contains(&d.trigger_up)
            })
            .copied()
            .collect())
    }

    fn trigger_tags(&self, trigger_ids: &[TriggerId]) -> StoreResult<Vec<TriggerTagRow>> {
        Ok(self
            .data
            .read()
            .trigger_tags
            .iter()
            .filter(|t| trigger_ids.contains(&t.trigger_id))
            .cloned()
            .collect())
    }

    fn insert_triggers(&self, rows: &[TriggerRow]) -> StoreResult<()> {
        self.data.write().triggers.extend_from_slice(rows);
        Ok(())
    }

    fn update_triggers(&self, updates: &[TriggerUpdate]) -> StoreResult<()> {
        use templink_model::TriggerUpdateFlags as F;
        let mut data = self.data.write();
        for update in updates {
            let trigger = data
                .triggers
                .iter_mut()
                .find(|t| t.trigger_id == update.trigger_id)
                .ok_or(StoreError::MissingEntity {
                    entity: "trigger",
                    id: update.trigger_id,
                })?;
            trigger.template_id = Some(update.template_id);
            if update.dirty.contains(F::FLAGS) {
                trigger.flags = update.flags;
            }
            if update.dirty.contains(F::RECOVERY_MODE) {
                trigger.recovery_mode = update.recovery_mode;
            }
            if update.dirty.contains(F::CORRELATION_MODE) {
                trigger.correlation_mode = update.correlation_mode;
                trigger.correlation_tag = update.correlation_tag.clone();
            }
            if update.dirty.contains(F::MANUAL_CLOSE) {
                trigger.manual_close = update.manual_close;
            }
            if update.dirty.contains(F::OPDATA) {
                trigger.opdata = update.opdata.clone();
            }
            if update.dirty.contains(F::DISCOVER) {
                trigger.discover = update.discover;
            }
            if update.dirty.contains(F::EVENT_NAME) {
                trigger.event_name = update.event_name.clone();
            }
        }
        Ok(())
    }

    fn delete_triggers(&self, trigger_ids: &[TriggerId]) -> StoreResult<()> {
        let mut data = self.data.write();
        data.triggers.retain(|t| !trigger_ids.contains(&t.trigger_id));
        data.functions
            .retain(|f| !trigger_ids.contains(&f.trigger_id));
        data.trigger_tags
            .retain(|t| !trigger_ids.contains(&t.trigger_id));
        data.trigger_deps.retain(|d| {
            !trigger_ids.contains(&d.trigger_down) && !trigger_ids.contains(&d.trigger_up)
        });
        data.trigger_discovery.retain(|d| {
            !trigger_ids.contains(&d.trigger_id) && !trigger_ids.contains(&d.parent_trigger_id)
        });
        Ok(())
    }

    fn insert_functions(&self, rows: &[FunctionRow]) -> StoreResult<()> {
        self.data.write().functions.extend_from_slice(rows);
        Ok(())
    }

    fn insert_trigger_dependencies(&self, rows: &[TriggerDependencyRow]) -> StoreResult<()> {
        self.data.write().trigger_deps.extend_from_slice(rows);
        Ok(())
    }

    fn delete_trigger_tags(&self, trigger_ids: &[TriggerId]) -> StoreResult<()> {
        self.data
            .write()
            .trigger_tags
            .retain(|t| !trigger_ids.contains(&t.trigger_id));
        Ok(())
    }

    fn insert_trigger_tags(&self, rows: &[TriggerTagRow]) -> StoreResult<()> {
        self.data.write().trigger_tags.extend_from_slice(rows);
        Ok(())
    }

    fn graphs_of_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<GraphRow>> {
        let data = self.data.read();
        let mut ids: Vec<GraphId> = data
            .graph_items
            .iter()
            .filter(|gi| {
                data.item(gi.item_id)
                    .is_some_and(|i| host_ids.contains(&i.host_id))
            })
            .map(|gi| gi.graph_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(data
            .graphs
            .iter()
            .filter(|g| ids.contains(&g.graph_id))
            .cloned()
            .collect())
    }

    fn host_graphs_by_name(&self, host_id: HostId, name: &str) -> StoreResult<Vec<GraphRow>> {
        let data = self.data.read();
        let mut ids: Vec<GraphId> = data
            .graph_items
            .iter()
            .filter(|gi| {
                data.item(gi.item_id)
                    .is_some_and(|i| i.host_id == host_id)
            })
            .map(|gi| gi.graph_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(data
            .graphs
            .iter()
            .filter(|g| ids.contains(&g.graph_id) && g.name == name && g.template_id.is_none())
            .cloned()
            .collect())
    }

    fn graphs_by_items(&self, item_ids: &[ItemId]) -> StoreResult<Vec<GraphRow>> {
        let data = self.data.read();
        let mut ids: Vec<GraphId> = data
            .graph_items
            .iter()
            .filter(|gi| item_ids.contains(&gi.item_id))
            .map(|gi| gi.graph_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(data
            .graphs
            .iter()
            .filter(|g| ids.contains(&g.graph_id))
            .cloned()
            .collect())
    }

    fn graphs_by_ids(&self, graph_ids: &[GraphId]) -> StoreResult<Vec<GraphRow>> {
        Ok(self
            .data
            .read()
            .graphs
            .iter()
            .filter(|g| graph_ids.contains(&g.graph_id))
            .cloned()
            .collect())
    }

    fn graphs_with_other_items(
        &self,
        graph_ids: &[GraphId],
        item_ids: &[ItemId],
    ) -> StoreResult<Vec<GraphId>> {
        let data = self.data.read();
        let mut ids: Vec<GraphId> = data
            .graph_items
            .iter()
            .filter(|gi| graph_ids.contains(&gi.graph_id) && !item_ids.contains(&gi.item_id))
            .map(|gi| gi.graph_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    fn graph_items_by_key(&self, graph_id: GraphId) -> StoreResult<Vec<GraphItemKeyRow>> {
        let data = self.data.read();
        let mut rows: Vec<GraphItemKeyRow> = data
            .graph_items
            .iter()
            .filter(|gi| gi.graph_id == graph_id)
            .map(|gi| {
                let item_key = data
                    .item_key(gi.item_id)
                    .ok_or(StoreError::MissingEntity {
                        entity: "item",
                        id: gi.item_id,
                    })?
                    .to_string();
                Ok(GraphItemKeyRow {
                    row: gi.clone(),
                    item_key,
                })
            })
            .collect::<StoreResult<_>>()?;
        rows.sort_by(|a, b| a.item_key.cmp(&b.item_key));
        Ok(rows)
    }

    fn graph_children(&self, graph_ids: &[GraphId]) -> StoreResult<Vec<GraphDiscoveryRow>> {
        Ok(self
            .data
            .read()
            .graph_discovery
            .iter()
            .filter(|d| graph_ids.contains(&d.parent_graph_id))
            .copied()
            .collect())
    }

    fn insert_graphs(&self, rows: &[GraphRow]) -> StoreResult<()> {
        self.data.write().graphs.extend_from_slice(rows);
        Ok(())
    }

    fn update_graphs(&self, rows: &[GraphRow]) -> StoreResult<()> {
        let mut data = self.data.write();
        for row in rows {
            let graph = data
                .graphs
                .iter_mut()
                .find(|g| g.graph_id == row.graph_id)
                .ok_or(StoreError::MissingEntity {
                    entity: "graph",
                    id: row.graph_id,
                })?;
            *graph = row.clone();
        }
        Ok(())
    }

    fn insert_graph_items(&self, rows: &[GraphItemRow]) -> StoreResult<()> {
        self.data.write().graph_items.extend_from_slice(rows);
        Ok(())
    }

    fn update_graph_items(&self, rows: &[GraphItemRow]) -> StoreResult<()> {
        let mut data = self.data.write();
        for row in rows {
            let gi = data
                .graph_items
                .iter_mut()
                .find(|gi| gi.graph_item_id == row.graph_item_id)
                .ok_or(StoreError::MissingEntity {
                    entity: "graph item",
                    id: row.graph_item_id,
                })?;
            gi.draw_type = row.draw_type;
            gi.sort_order = row.sort_order;
            gi.color = row.color.clone();
            gi.yaxis_side = row.yaxis_side;
            gi.calc_fnc = row.calc_fnc;
            gi.item_type = row.item_type;
        }
        Ok(())
    }

    fn delete_graphs(&self, graph_ids: &[GraphId]) -> StoreResult<()> {
        let mut data = self.data.write();
        data.graphs.retain(|g| !graph_ids.contains(&g.graph_id));
        data.graph_items
            .retain(|gi| !graph_ids.contains(&gi.graph_id));
        data.graph_discovery.retain(|d| {
            !graph_ids.contains(&d.graph_id) && !graph_ids.contains(&d.parent_graph_id)
        });
        Ok(())
    }

    fn template_prototypes(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<TemplatePrototypeRow>> {
        let data = self.data.read();
        let mut out = Vec::new();
        for host_rule in data.items.iter().filter(|i| i.host_id == host_id) {
            let Some(template_rule_id) = host_rule.template_item_id else {
                continue;
            };
            let Some(template_rule) = data.item(template_rule_id) else {
                continue;
            };
            if !template_ids.contains(&template_rule.host_id) {
                continue;
            }
            for mapping in data
                .host_discovery
                .iter()
                .filter(|d| d.parent_item_id == Some(template_rule_id))
            {
                if let Some(prototype) = data
                    .host_prototypes
                    .iter()
                    .find(|p| p.host_id == mapping.host_id)
                {
                    out.push(TemplatePrototypeRow {
                        host_rule_item_id: host_rule.item_id,
                        prototype: prototype.clone(),
                    });
                }
            }
        }
        Ok(out)
    }

    fn prototypes_by_rules(
        &self,
        rule_item_ids: &[ItemId],
    ) -> StoreResult<Vec<TemplatePrototypeRow>> {
        let data = self.data.read();
        let mut out = Vec::new();
        for mapping in data
            .host_discovery
            .iter()
            .filter(|d| d.parent_item_id.is_some_and(|r| rule_item_ids.contains(&r)))
        {
            if let Some(prototype) = data
                .host_prototypes
                .iter()
                .find(|p| p.host_id == mapping.host_id)
            {
                out.push(TemplatePrototypeRow {
                    host_rule_item_id: mapping.parent_item_id.unwrap_or_default(),
                    prototype: prototype.clone(),
                });
            }
        }
        Ok(out)
    }

    fn host_prototypes_by_templates(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<HostPrototypeRow>> {
        let data = self.data.read();
        let mut out = Vec::new();
        for prototype in &data.host_prototypes {
            // the prototype must hang off a rule item on the target host
            let on_host = data.host_discovery.iter().any(|d| {
                d.host_id == prototype.host_id
                    && d.parent_item_id
                        .is_some_and(|rule| data.item(rule).is_some_and(|i| i.host_id == host_id))
            });
            if !on_host {
                continue;
            }
            // and mirror a template prototype hanging off a rule of the
            // given templates
            let from_template = prototype.template_id.is_some_and(|tp| {
                data.host_discovery.iter().any(|d| {
                    d.host_id == tp
                        && d.parent_item_id.is_some_and(|rule| {
                            data.item(rule)
                                .is_some_and(|i| template_ids.contains(&i.host_id))
                        })
                })
            });
            if from_template {
                out.push(prototype.clone());
            }
        }
        Ok(out)
    }

    fn host_prototypes_by_ids(
        &self,
        prototype_ids: &[HostId],
    ) -> StoreResult<Vec<HostPrototypeRow>> {
        Ok(self
            .data
            .read()
            .host_prototypes
            .iter()
            .filter(|p| prototype_ids.contains(&p.host_id))
            .cloned()
            .collect())
    }

    fn discovered_hosts(&self, prototype_ids: &[HostId]) -> StoreResult<Vec<HostId>> {
        Ok(self
            .data
            .read()
            .host_discovery
            .iter()
            .filter(|d| d.parent_host_id.is_some_and(|p| prototype_ids.contains(&p)))
            .map(|d| d.host_id)
            .collect())
    }

    fn group_prototypes(&self, host_ids: &[HostId]) -> StoreResult<Vec<GroupPrototypeRow>> {
        Ok(self
            .data
            .read()
            .group_prototypes
            .iter()
            .filter(|g| host_ids.contains(&g.host_id))
            .cloned()
            .collect())
    }

    fn discovered_groups(
        &self,
        group_prototype_ids: &[GroupPrototypeId],
    ) -> StoreResult<Vec<GroupDiscoveryRow>> {
        Ok(self
            .data
            .read()
            .group_discovery
            .iter()
            .filter(|d| group_prototype_ids.contains(&d.parent_group_prototype_id))
            .copied()
            .collect())
    }

    fn prototype_macros(&self, host_ids: &[HostId]) -> StoreResult<Vec<PrototypeMacroRow>> {
        Ok(self
            .data
            .read()
            .host_macros
            .iter()
            .filter(|m| host_ids.contains(&m.host_id))
            .cloned()
            .collect())
    }

    fn host_tags(&self, host_ids: &[HostId]) -> StoreResult<Vec<HostTagRow>> {
        Ok(self
            .data
            .read()
            .host_tags
            .iter()
            .filter(|t| host_ids.contains(&t.host_id))
            .cloned()
            .collect())
    }

    fn prototype_interfaces(
        &self,
        host_ids: &[HostId],
    ) -> StoreResult<Vec<PrototypeInterfaceRow>> {
        Ok(self
            .data
            .read()
            .interfaces
            .iter()
            .filter(|i| host_ids.contains(&i.host_id))
            .cloned()
            .collect())
    }

    fn insert_host_prototypes(&self, rows: &[(HostPrototypeRow, ItemId)]) -> StoreResult<()> {
        let mut data = self.data.write();
        for (prototype, rule_item_id) in rows {
            data.host_prototypes.push(prototype.clone());
            data.host_discovery.push(HostDiscoveryRow {
                host_id: prototype.host_id,
                parent_host_id: None,
                parent_item_id: Some(*rule_item_id),
            });
        }
        Ok(())
    }

    fn update_host_prototypes(&self, updates: &[PrototypeUpdate]) -> StoreResult<()> {
        use templink_model::PrototypeUpdateFlags as F;
        let mut data = self.data.write();
        for update in updates {
            let prototype = data
                .host_prototypes
                .iter_mut()
                .find(|p| p.host_id == update.host_id)
                .ok_or(StoreError::MissingEntity {
                    entity: "host prototype",
                    id: update.host_id,
                })?;
            prototype.template_id = Some(update.template_id);
            if update.dirty.contains(F::NAME) {
                prototype.name = update.name.clone();
            }
            if update.dirty.contains(F::STATUS) {
                prototype.status = update.status;
            }
            if update.dirty.contains(F::DISCOVER) {
                prototype.discover = update.discover;
            }
            if update.dirty.contains(F::CUSTOM_INTERFACES) {
                prototype.custom_interfaces = update.custom_interfaces;
            }
        }
        Ok(())
    }

    fn insert_group_prototypes(&self, rows: &[GroupPrototypeRow]) -> StoreResult<()> {
        self.data.write().group_prototypes.extend_from_slice(rows);
        Ok(())
    }

    fn update_group_prototypes(&self, updates: &[GroupPrototypeUpdate]) -> StoreResult<()> {
        let mut data = self.data.write();
        for update in updates {
            let gp = data
                .group_prototypes
                .iter_mut()
                .find(|g| g.group_prototype_id == update.group_prototype_id)
                .ok_or(StoreError::MissingEntity {
                    entity: "group prototype",
                    id: update.group_prototype_id,
                })?;
            gp.template_id = Some(update.template_id);
        }
        Ok(())
    }

    fn delete_group_prototypes(
        &self,
        group_prototype_ids: &[GroupPrototypeId],
    ) -> StoreResult<()> {
        let mut data = self.data.write();
        data.group_prototypes
            .retain(|g| !group_prototype_ids.contains(&g.group_prototype_id));
        data.group_discovery
            .retain(|d| !group_prototype_ids.contains(&d.parent_group_prototype_id));
        Ok(())
    }

    fn delete_groups(&self, group_ids: &[GroupId]) -> StoreResult<()> {
        let mut data = self.data.write();
        data.groups.retain(|g| !group_ids.contains(g));
        data.group_discovery
            .retain(|d| !group_ids.contains(&d.group_id));
        Ok(())
    }

    fn insert_prototype_macros(&self, rows: &[PrototypeMacroRow]) -> StoreResult<()> {
        self.data.write().host_macros.extend_from_slice(rows);
        Ok(())
    }

    fn update_prototype_macros(&self, updates: &[MacroUpdate]) -> StoreResult<()> {
        use templink_model::MacroUpdateFlags as F;
        let mut data = self.data.write();
        for update in updates {
            let row = data
                .host_macros
                .iter_mut()
                .find(|m| m.macro_id == update.macro_id)
                .ok_or(StoreError::MissingEntity {
                    entity: "host macro",
                    id: update.macro_id,
                })?;
            if update.dirty.contains(F::VALUE) {
                row.value = update.value.clone();
            }
            if update.dirty.contains(F::DESCRIPTION) {
                row.description = update.description.clone();
            }
            if update.dirty.contains(F::TYPE) {
                row.macro_type = update.macro_type;
            }
        }
        Ok(())
    }

    fn delete_prototype_macros(&self, macro_ids: &[MacroId]) -> StoreResult<()> {
        self.data
            .write()
            .host_macros
            .retain(|m| !macro_ids.contains(&m.macro_id));
        Ok(())
    }

    fn insert_host_tags(&self, rows: &[HostTagRow]) -> StoreResult<()> {
        self.data.write().host_tags.extend_from_slice(rows);
        Ok(())
    }

    fn update_host_tags(&self, updates: &[TagUpdate]) -> StoreResult<()> {
        use templink_model::TagUpdateFlags as F;
        let mut data = self.data.write();
        for update in updates {
            let row = data
                .host_tags
                .iter_mut()
                .find(|t| t.tag_id == update.tag_id)
                .ok_or(StoreError::MissingEntity {
                    entity: "host tag",
                    id: update.tag_id,
                })?;
            if update.dirty.contains(F::TAG) {
                row.tag = update.tag.clone();
            }
            if update.dirty.contains(F::VALUE) {
                row.value = update.value.clone();
            }
        }
        Ok(())
    }

    fn delete_host_tags(&self, tag_ids: &[TagId]) -> StoreResult<()> {
        self.data
            .write()
            .host_tags
            .retain(|t| !tag_ids.contains(&t.tag_id));
        Ok(())
    }

    fn insert_prototype_interfaces(&self, rows: &[PrototypeInterfaceRow]) -> StoreResult<()> {
        self.data.write().interfaces.extend_from_slice(rows);
        Ok(())
    }

    fn update_prototype_interfaces(&self, updates: &[InterfaceUpdate]) -> StoreResult<()> {
        use templink_model::InterfaceUpdateFlags as F;
        use templink_model::SnmpUpdateFlags as S;
        let mut data = self.data.write();
        for update in updates {
            let row = data
                .interfaces
                .iter_mut()
                .find(|i| i.interface_id == update.interface_id)
                .ok_or(StoreError::MissingEntity {
                    entity: "interface",
                    id: update.interface_id,
                })?;
            if update.dirty.contains(F::MAIN) {
                row.main = update.main;
            }
            if update.dirty.contains(F::TYPE) {
                row.interface_type = update.interface_type;
            }
            if update.dirty.contains(F::USEIP) {
                row.use_ip = update.use_ip;
            }
            if update.dirty.contains(F::IP) {
                row.ip = update.ip.clone();
            }
            if update.dirty.contains(F::DNS) {
                row.dns = update.dns.clone();
            }
            if update.dirty.contains(F::PORT) {
                row.port = update.port.clone();
            }
            match &update.snmp {
                SnmpChange::None => {}
                SnmpChange::Create(details) => {
                    row.snmp = Some(details.clone());
                }
                SnmpChange::Update { dirty, details } => {
                    let snmp = row.snmp.as_mut().ok_or(StoreError::MissingEntity {
                        entity: "interface snmp",
                        id: update.interface_id,
                    })?;
                    if dirty.contains(S::VERSION) {
                        snmp.version = details.version;
                    }
                    if dirty.contains(S::BULK) {
                        snmp.bulk = details.bulk;
                    }
                    if dirty.contains(S::COMMUNITY) {
                        snmp.community = details.community.clone();
                    }
                    if dirty.contains(S::SECNAME) {
                        snmp.security_name = details.security_name.clone();
                    }
                    if dirty.contains(S::SECLEVEL) {
                        snmp.security_level = details.security_level;
                    }
                    if dirty.contains(S::AUTHPASS) {
                        snmp.auth_passphrase = details.auth_passphrase.clone();
                    }
                    if dirty.contains(S::PRIVPASS) {
                        snmp.priv_passphrase = details.priv_passphrase.clone();
                    }
                    if dirty.contains(S::AUTHPROTO) {
                        snmp.auth_protocol = details.auth_protocol;
                    }
                    if dirty.contains(S::PRIVPROTO) {
                        snmp.priv_protocol = details.priv_protocol;
                    }
                    if dirty.contains(S::CONTEXT) {
                        snmp.context_name = details.context_name.clone();
                    }
                }
            }
        }
        Ok(())
    }

    fn delete_prototype_interfaces(&self, interface_ids: &[InterfaceId]) -> StoreResult<()> {
        self.data
            .write()
            .interfaces
            .retain(|i| !interface_ids.contains(&i.interface_id));
        Ok(())
    }

    fn delete_snmp_details(&self, interface_ids: &[InterfaceId]) -> StoreResult<()> {
        let mut data = self.data.write();
        for iface in data
            .interfaces
            .iter_mut()
            .filter(|i| interface_ids.contains(&i.interface_id))
        {
            iface.snmp = None;
        }
        Ok(())
    }

    fn scenarios_of_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<WebScenarioRow>> {
        Ok(self
            .data
            .read()
            .scenarios
            .iter()
            .filter(|s| host_ids.contains(&s.host_id))
            .cloned()
            .collect())
    }

    fn host_scenarios_by_templates(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<WebScenarioRow>> {
        let data = self.data.read();
        Ok(data
            .scenarios
            .iter()
            .filter(|s| {
                s.host_id == host_id
                    && s.template_id.is_some_and(|parent| {
                        data.scenarios
                            .iter()
                            .any(|t| t.scenario_id == parent && template_ids.contains(&t.host_id))
                    })
            })
            .cloned()
            .collect())
    }

    fn scenarios_by_ids(
        &self,
        scenario_ids: &[ScenarioId],
    ) -> StoreResult<Vec<WebScenarioRow>> {
        Ok(self
            .data
            .read()
            .scenarios
            .iter()
            .filter(|s| scenario_ids.contains(&s.scenario_id))
            .cloned()
            .collect())
    }

    fn scenario_steps(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<WebStepRow>> {
        Ok(self
            .data
            .read()
            .steps
            .iter()
            .filter(|s| scenario_ids.contains(&s.scenario_id))
            .cloned()
            .collect())
    }

    fn scenario_fields(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<WebFieldRow>> {
        Ok(self
            .data
            .read()
            .scenario_fields
            .iter()
            .filter(|f| scenario_ids.contains(&f.owner_id))
            .cloned()
            .collect())
    }

    fn step_fields(&self, step_ids: &[StepId]) -> StoreResult<Vec<WebFieldRow>> {
        Ok(self
            .data
            .read()
            .step_fields
            .iter()
            .filter(|f| step_ids.contains(&f.owner_id))
            .cloned()
            .collect())
    }

    fn scenario_tags(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<WebTagRow>> {
        Ok(self
            .data
            .read()
            .web_tags
            .iter()
            .filter(|t| scenario_ids.contains(&t.scenario_id))
            .cloned()
            .collect())
    }

    fn scenario_items(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<ScenarioItemRow>> {
        Ok(self
            .data
            .read()
            .scenario_items
            .iter()
            .filter(|si| scenario_ids.contains(&si.scenario_id))
            .copied()
            .collect())
    }

    fn step_items(&self, step_ids: &[StepId]) -> StoreResult<Vec<StepItemRow>> {
        Ok(self
            .data
            .read()
            .step_items
            .iter()
            .filter(|si| step_ids.contains(&si.step_id))
            .copied()
            .collect())
    }

    fn insert_scenarios(&self, rows: &[WebScenarioRow]) -> StoreResult<()> {
        self.data.write().scenarios.extend_from_slice(rows);
        Ok(())
    }

    fn update_scenario_template(
        &self,
        scenario_id: ScenarioId,
        template_id: ScenarioId,
    ) -> StoreResult<()> {
        let mut data = self.data.write();
        let scenario = data
            .scenarios
            .iter_mut()
            .find(|s| s.scenario_id == scenario_id)
            .ok_or(StoreError::MissingEntity {
                entity: "web scenario",
                id: scenario_id,
            })?;
        scenario.template_id = Some(template_id);
        Ok(())
    }

    fn insert_steps(&self, rows: &[WebStepRow]) -> StoreResult<()> {
        self.data.write().steps.extend_from_slice(rows);
        Ok(())
    }

    fn insert_scenario_fields(&self, rows: &[WebFieldRow]) -> StoreResult<()> {
        self.data.write().scenario_fields.extend_from_slice(rows);
        Ok(())
    }

    fn insert_step_fields(&self, rows: &[WebFieldRow]) -> StoreResult<()> {
        self.data.write().step_fields.extend_from_slice(rows);
        Ok(())
    }

    fn insert_scenario_items(&self, rows: &[ScenarioItemRow]) -> StoreResult<()> {
        self.data.write().scenario_items.extend_from_slice(rows);
        Ok(())
    }

    fn insert_step_items(&self, rows: &[StepItemRow]) -> StoreResult<()> {
        self.data.write().step_items.extend_from_slice(rows);
        Ok(())
    }

    fn insert_web_tags(&self, rows: &[WebTagRow]) -> StoreResult<()> {
        self.data.write().web_tags.extend_from_slice(rows);
        Ok(())
    }

    fn delete_scenarios(&self, scenario_ids: &[ScenarioId]) -> StoreResult<()> {
        let mut data = self.data.write();
        let step_ids: Vec<StepId> = data
            .steps
            .iter()
            .filter(|s| scenario_ids.contains(&s.scenario_id))
            .map(|s| s.step_id)
            .collect();
        data.scenarios
            .retain(|s| !scenario_ids.contains(&s.scenario_id));
        data.steps.retain(|s| !scenario_ids.contains(&s.scenario_id));
        data.scenario_fields
            .retain(|f| !scenario_ids.contains(&f.owner_id));
        data.step_fields.retain(|f| !step_ids.contains(&f.owner_id));
        data.scenario_items
            .retain(|si| !scenario_ids.contains(&si.scenario_id));
        data.step_items.retain(|si| !step_ids.contains(&si.step_id));
        data.web_tags
            .retain(|t| !scenario_ids.contains(&t.scenario_id));
        Ok(())
    }

    fn scenario_backing_items(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<ItemId>> {
        let data = self.data.read();
        let step_ids: Vec<StepId> = data
            .steps
            .iter()
            .filter(|s| scenario_ids.contains(&s.scenario_id))
            .map(|s| s.step_id)
            .collect();
        let mut ids: Vec<ItemId> = data
            .scenario_items
            .iter()
            .filter(|si| scenario_ids.contains(&si.scenario_id))
            .map(|si| si.item_id)
            .chain(
                data.step_items
                    .iter()
                    .filter(|si| step_ids.contains(&si.step_id))
                    .map(|si| si.item_id),
            )
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    fn sysmap_elements(
        &self,
        kind: SysmapElementKind,
        referenced_ids: &[u64],
    ) -> StoreResult<Vec<SysmapElementRow>> {
        Ok(self
            .data
            .read()
            .sysmap_elements
            .iter()
            .filter(|e| e.kind == kind && referenced_ids.contains(&e.referenced_id))
            .copied()
            .collect())
    }

    fn delete_sysmap_elements(&self, element_ids: &[u64]) -> StoreResult<()> {
        self.data
            .write()
            .sysmap_elements
            .retain(|e| !element_ids.contains(&e.element_id));
        Ok(())
    }

    fn action_conditions(
        &self,
        kind: ConditionKind,
        referenced_ids: &[u64],
    ) -> StoreResult<Vec<ActionConditionRow>> {
        Ok(self
            .data
            .read()
            .action_conditions
            .iter()
            .filter(|c| c.kind == kind && referenced_ids.contains(&c.value))
            .cloned()
            .collect())
    }

    fn delete_action_conditions(&self, condition_ids: &[u64]) -> StoreResult<()> {
        let mut data = self.data.write();
        let mut owners: Vec<u64> = data
            .action_conditions
            .iter()
            .filter(|c| condition_ids.contains(&c.condition_id))
            .map(|c| c.action_id)
            .collect();
        owners.sort_unstable();
        owners.dedup();
        data.action_conditions
            .retain(|c| !condition_ids.contains(&c.condition_id));
        for owner in owners {
            if !data.disabled_actions.contains(&owner) {
                data.disabled_actions.push(owner);
            }
        }
        Ok(())
    }

    fn enqueue_housekeeper(&self, rows: &[HousekeeperRow]) -> StoreResult<()> {
        self.data.write().housekeeper.extend_from_slice(rows);
        Ok(())
    }

    fn insert_audit_rows(&self, rows: &[AuditRow]) -> StoreResult<()> {
        self.data.write().audit.extend_from_slice(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use templink_model::ItemRow;

    #[test]
    fn id_blocks_are_dense_and_disjoint() {
        let store = MemoryStore::new();
        let first = store.reserve_ids(IdDomain::Triggers, 3).unwrap();
        let second = store.reserve_ids(IdDomain::Triggers, 2).unwrap();
        assert_eq!(first, FIRST_ALLOCATED_ID);
        assert_eq!(second, first + 3);

        // separate domain, separate counter
        let other = store.reserve_ids(IdDomain::Functions, 1).unwrap();
        assert_eq!(other, FIRST_ALLOCATED_ID);
    }

    #[test]
    fn trigger_reachability_goes_through_functions() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.items.push(ItemRow::new(1, 10, "cpu.util"));
            data.triggers
                .push(TriggerRow::new(100, "CPU high", "{1000}>5"));
            data.functions.push(FunctionRow {
                function_id: 1000,
                trigger_id: 100,
                item_id: 1,
                name: "avg".into(),
                parameter: "5m".into(),
            });
        });

        let found = store.triggers_of_hosts(&[10]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].trigger_id, 100);

        assert!(store.triggers_of_hosts(&[11]).unwrap().is_empty());
    }

    #[test]
    fn delete_triggers_cascades_to_owned_rows() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.triggers.push(TriggerRow::new(1, "a", "{5}>0"));
            data.triggers.push(TriggerRow::new(2, "b", "{6}>0"));
            data.functions.push(FunctionRow {
                function_id: 5,
                trigger_id: 1,
                item_id: 9,
                name: "last".into(),
                parameter: "".into(),
            });
            data.trigger_tags.push(TriggerTagRow {
                tag_id: 1,
                trigger_id: 1,
                tag: "scope".into(),
                value: "cpu".into(),
            });
            data.trigger_deps.push(TriggerDependencyRow {
                dep_id: 1,
                trigger_down: 2,
                trigger_up: 1,
            });
        });

        store.delete_triggers(&[1]).unwrap();

        store.read(|data| {
            assert_eq!(data.triggers.len(), 1);
            assert!(data.functions.is_empty());
            assert!(data.trigger_tags.is_empty());
            assert!(data.trigger_deps.is_empty());
        });
    }

    #[test]
    fn graph_items_sorted_by_item_key() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.items.push(ItemRow::new(1, 10, "zzz"));
            data.items.push(ItemRow::new(2, 10, "aaa"));
            for (gi, item) in [(1u64, 1u64), (2, 2)] {
                data.graph_items.push(GraphItemRow {
                    graph_item_id: gi,
                    graph_id: 7,
                    item_id: item,
                    draw_type: 0,
                    sort_order: 0,
                    color: "1A7C11".into(),
                    yaxis_side: 0,
                    calc_fnc: 2,
                    item_type: 0,
                });
            }
        });

        let rows = store.graph_items_by_key(7).unwrap();
        assert_eq!(rows[0].item_key, "aaa");
        assert_eq!(rows[1].item_key, "zzz");
    }

    #[test]
    fn update_trigger_applies_only_dirty_columns() {
        use templink_model::TriggerUpdateFlags as F;
        let store = MemoryStore::new();
        store.seed(|data| {
            let mut t = TriggerRow::new(1, "t", "{2}>0");
            t.opdata = "old".into();
            data.triggers.push(t);
        });

        let mut dirty = F::none();
        dirty.set(F::OPDATA);
        store
            .update_triggers(&[TriggerUpdate {
                trigger_id: 1,
                template_id: 42,
                dirty,
                flags: templink_model::ItemKind::Created,
                recovery_mode: templink_model::RecoveryMode::None,
                correlation_mode: templink_model::CorrelationMode::Disabled,
                correlation_tag: String::new(),
                manual_close: 1,
                opdata: "new".into(),
                discover: 0,
                event_name: String::new(),
            }])
            .unwrap();

        store.read(|data| {
            let t = &data.triggers[0];
            assert_eq!(t.template_id, Some(42));
            assert_eq!(t.opdata, "new");
            // not dirty, so untouched
            assert_eq!(t.manual_close, 0);
            assert_eq!(t.flags, templink_model::ItemKind::Normal);
        });
    }

    #[test]
    fn unknown_update_target_is_reported() {
        let store = MemoryStore::new();
        let err = store
            .update_scenario_template(99, 1)
            .expect_err("missing scenario must error");
        assert!(matches!(err, StoreError::MissingEntity { id: 99, .. }));
    }
}
