//! Cascading deletes for unlink and host removal.
//!
//! Deletion walks parent → child in a strict order: web scenarios, graphs
//! (auto-created children split off through the discovery mapping),
//! triggers (same split, plus dependency edges and map elements), host
//! prototypes (with the hosts they discovered, recursively), and finally
//! the items whose orphaned triggers and graphs have to go with them.
//! Every step records its delete-audit entries before issuing the DML so a
//! post-mortem can reconstruct the exact set removed.

use crate::error::LinkResult;
use templink_audit::{AuditBuffer, ResourceType};
use templink_model::{
    ConditionKind, GraphId, HostId, HousekeeperRow, IdDomain, ItemId, ItemKind, ScenarioId,
    SysmapElementKind, TriggerId,
};
use templink_store::LinkStore;
use tracing::debug;

/// History and trend tables reclaimed per deleted item.
const ITEM_HISTORY_TABLES: [&str; 7] = [
    "history",
    "history_str",
    "history_uint",
    "history_log",
    "history_text",
    "trends",
    "trends_uint",
];

/// Counters for one unlink pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CascadeStats {
    /// Web scenarios removed.
    pub scenarios: usize,
    /// Graphs removed (children included).
    pub graphs: usize,
    /// Triggers removed (children included).
    pub triggers: usize,
    /// Host prototypes removed.
    pub prototypes: usize,
    /// Items removed (child closure included).
    pub items: usize,
}

fn item_resource(flags: ItemKind) -> ResourceType {
    match flags {
        ItemKind::Prototype => ResourceType::ItemPrototype,
        ItemKind::Rule => ResourceType::DiscoveryRule,
        _ => ResourceType::Item,
    }
}

fn trigger_resource(flags: ItemKind) -> ResourceType {
    match flags {
        ItemKind::Prototype => ResourceType::TriggerPrototype,
        _ => ResourceType::Trigger,
    }
}

fn graph_resource(flags: ItemKind) -> ResourceType {
    match flags {
        ItemKind::Prototype => ResourceType::GraphPrototype,
        _ => ResourceType::Graph,
    }
}

/// Removes every entity on `host_id` whose parent chain roots at one of the
/// given templates. The link rows themselves are the caller's last step.
pub fn delete_template_elements(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<CascadeStats> {
    debug!(host_id, templates = template_ids.len(), "cascading template unlink");
    let mut stats = CascadeStats::default();

    let scenarios: Vec<ScenarioId> = store
        .host_scenarios_by_templates(host_id, template_ids)?
        .iter()
        .map(|s| s.scenario_id)
        .collect();
    stats.scenarios = scenarios.len();
    delete_scenarios(store, audit, &scenarios)?;

    // ownership is the parent-link chain: a host graph or trigger whose
    // template_id points into the unlinked templates goes away
    let template_graph_ids: Vec<GraphId> = store
        .graphs_of_hosts(template_ids)?
        .iter()
        .map(|g| g.graph_id)
        .collect();
    let graphs: Vec<GraphId> = store
        .graphs_of_hosts(&[host_id])?
        .iter()
        .filter(|g| {
            g.template_id
                .is_some_and(|parent| template_graph_ids.contains(&parent))
        })
        .map(|g| g.graph_id)
        .collect();
    stats.graphs = delete_graph_hierarchy(store, audit, graphs)?;

    let template_trigger_ids: Vec<TriggerId> = store
        .triggers_of_hosts(template_ids)?
        .iter()
        .map(|t| t.trigger_id)
        .collect();
    let triggers: Vec<TriggerId> = store
        .host_triggers_by_template_triggers(host_id, &template_trigger_ids)?
        .iter()
        .map(|t| t.trigger_id)
        .collect();
    stats.triggers = delete_trigger_hierarchy(store, audit, triggers)?;

    let prototypes: Vec<HostId> = store
        .host_prototypes_by_templates(host_id, template_ids)?
        .iter()
        .map(|p| p.host_id)
        .collect();
    stats.prototypes = prototypes.len();
    delete_host_prototypes(store, audit, &prototypes)?;

    // removing the items also removes the discovery rules among them
    let items: Vec<ItemId> = store
        .template_items_on_host(host_id, template_ids)?
        .iter()
        .map(|i| i.item_id)
        .collect();
    stats.items = delete_items(store, audit, items)?;

    Ok(stats)
}

/// Deletes web scenarios with their backing items.
pub fn delete_scenarios(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    scenario_ids: &[ScenarioId],
) -> LinkResult<()> {
    if scenario_ids.is_empty() {
        return Ok(());
    }

    let backing = store.scenario_backing_items(scenario_ids)?;
    delete_items(store, audit, backing)?;

    for scenario in store.scenarios_by_ids(scenario_ids)? {
        audit.record_delete(scenario.scenario_id, &scenario.name, ResourceType::Scenario);
    }
    store.delete_scenarios(scenario_ids)?;
    Ok(())
}

/// Splits auto-created children off the given graphs and deletes children
/// first. Returns the total number of graphs removed.
pub fn delete_graph_hierarchy(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    mut graph_ids: Vec<GraphId>,
) -> LinkResult<usize> {
    if graph_ids.is_empty() {
        return Ok(0);
    }

    let children: Vec<GraphId> = store
        .graph_children(&graph_ids)?
        .iter()
        .map(|d| d.graph_id)
        .collect();
    graph_ids.retain(|id| !children.contains(id));

    let mut total = 0;
    for batch in [children, graph_ids] {
        if batch.is_empty() {
            continue;
        }
        total += batch.len();
        for graph in store.graphs_by_ids(&batch)? {
            audit.record_delete(graph.graph_id, &graph.name, graph_resource(graph.flags));
        }
        store.delete_graphs(&batch)?;
    }
    Ok(total)
}

/// Splits auto-created children off the given triggers, removes their map
/// elements and action conditions, deletes them and queues their events
/// for reclamation. Returns the total removed.
pub fn delete_trigger_hierarchy(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    mut trigger_ids: Vec<TriggerId>,
) -> LinkResult<usize> {
    if trigger_ids.is_empty() {
        return Ok(0);
    }

    let children: Vec<TriggerId> = store
        .trigger_children(&trigger_ids)?
        .iter()
        .map(|d| d.trigger_id)
        .collect();
    trigger_ids.retain(|id| !children.contains(id));

    let mut total = 0;
    for batch in [children, trigger_ids] {
        if batch.is_empty() {
            continue;
        }
        total += batch.len();

        let elements: Vec<u64> = store
            .sysmap_elements(SysmapElementKind::Trigger, &batch)?
            .iter()
            .map(|e| e.element_id)
            .collect();
        store.delete_sysmap_elements(&elements)?;

        let conditions: Vec<u64> = store
            .action_conditions(ConditionKind::Trigger, &batch)?
            .iter()
            .map(|c| c.condition_id)
            .collect();
        store.delete_action_conditions(&conditions)?;

        for trigger in store.triggers_by_ids(&batch)? {
            audit.record_delete(
                trigger.trigger_id,
                &trigger.description,
                trigger_resource(trigger.flags),
            );
        }
        store.delete_triggers(&batch)?;

        enqueue_housekeeper(store, &batch, "triggerid", &["events"])?;
    }
    Ok(total)
}

/// Deletes host prototypes: the hosts they discovered first (recursively),
/// then their group prototypes with the groups those discovered.
pub fn delete_host_prototypes(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    prototype_ids: &[HostId],
) -> LinkResult<()> {
    if prototype_ids.is_empty() {
        return Ok(());
    }

    let discovered = store.discovered_hosts(prototype_ids)?;
    delete_hosts(store, audit, &discovered)?;

    let group_prototypes = store.group_prototypes(prototype_ids)?;
    let group_prototype_ids: Vec<u64> = group_prototypes
        .iter()
        .map(|g| g.group_prototype_id)
        .collect();
    let discovered_groups: Vec<u64> = store
        .discovered_groups(&group_prototype_ids)?
        .iter()
        .map(|d| d.group_id)
        .collect();
    store.delete_groups(&discovered_groups)?;
    store.delete_group_prototypes(&group_prototype_ids)?;

    for prototype in store.host_prototypes_by_ids(prototype_ids)? {
        audit.record_delete(prototype.host_id, &prototype.host, ResourceType::HostPrototype);
    }
    store.delete_hosts(prototype_ids)?;
    Ok(())
}

/// Deletes hosts with everything they own: scenarios, items (and through
/// them triggers and graphs), map elements and action conditions.
pub fn delete_hosts(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    host_ids: &[HostId],
) -> LinkResult<()> {
    if host_ids.is_empty() {
        return Ok(());
    }
    debug!(hosts = host_ids.len(), "deleting hosts");

    let scenarios: Vec<ScenarioId> = store
        .scenarios_of_hosts(host_ids)?
        .iter()
        .map(|s| s.scenario_id)
        .collect();
    delete_scenarios(store, audit, &scenarios)?;

    let items: Vec<ItemId> = store
        .items_by_hosts(host_ids)?
        .iter()
        .map(|i| i.item_id)
        .collect();
    delete_items(store, audit, items)?;

    let elements: Vec<u64> = store
        .sysmap_elements(SysmapElementKind::Host, host_ids)?
        .iter()
        .map(|e| e.element_id)
        .collect();
    store.delete_sysmap_elements(&elements)?;

    let conditions: Vec<u64> = store
        .action_conditions(ConditionKind::Host, host_ids)?
        .iter()
        .map(|c| c.condition_id)
        .collect();
    store.delete_action_conditions(&conditions)?;

    for host in store.hosts(host_ids)? {
        audit.record_delete(host.host_id, &host.host, ResourceType::Host);
    }
    store.delete_hosts(host_ids)?;
    Ok(())
}

/// Deletes items after closing over their created and prototype children,
/// taking orphaned triggers and graphs with them and queueing history,
/// trend and event reclamation. Returns the number of items removed.
pub fn delete_items(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    mut item_ids: Vec<ItemId>,
) -> LinkResult<usize> {
    if item_ids.is_empty() {
        return Ok(0);
    }

    // child closure: created items and prototypes hang off their parents
    loop {
        let before = item_ids.len();
        let children = store.item_children(&item_ids)?;
        for child in children {
            if !item_ids.contains(&child.item_id) {
                item_ids.push(child.item_id);
            }
        }
        if item_ids.len() == before {
            break;
        }
    }

    // graphs that keep no item outside the doomed set go away with them
    let graph_ids: Vec<GraphId> = store
        .graphs_by_items(&item_ids)?
        .iter()
        .map(|g| g.graph_id)
        .collect();
    let keep = store.graphs_with_other_items(&graph_ids, &item_ids)?;
    let orphaned_graphs: Vec<GraphId> = graph_ids
        .into_iter()
        .filter(|id| !keep.contains(id))
        .collect();
    delete_graph_hierarchy(store, audit, orphaned_graphs)?;

    // triggers likewise; a trigger with a surviving reference stays
    let trigger_ids: Vec<TriggerId> = store
        .triggers_by_items(&item_ids)?
        .iter()
        .map(|t| t.trigger_id)
        .collect();
    let keep = store.triggers_with_other_items(&trigger_ids, &item_ids)?;
    let orphaned_triggers: Vec<TriggerId> = trigger_ids
        .into_iter()
        .filter(|id| !keep.contains(id))
        .collect();
    delete_trigger_hierarchy(store, audit, orphaned_triggers)?;

    for item in store.items_by_ids(&item_ids)? {
        audit.record_delete(item.item_id, &item.name, item_resource(item.flags));
    }

    enqueue_housekeeper(store, &item_ids, "itemid", &ITEM_HISTORY_TABLES)?;
    enqueue_housekeeper(store, &item_ids, "itemid", &["events"])?;
    enqueue_housekeeper(store, &item_ids, "lldruleid", &["events"])?;

    let removed = item_ids.len();
    store.delete_items(&item_ids)?;
    Ok(removed)
}

/// Queues one reclamation row per `(table, id)` pair.
fn enqueue_housekeeper(
    store: &dyn LinkStore,
    ids: &[u64],
    field: &str,
    tables: &[&str],
) -> LinkResult<()> {
    if ids.is_empty() || tables.is_empty() {
        return Ok(());
    }
    let count = (ids.len() * tables.len()) as u64;
    let mut housekeeper_id = store.reserve_ids(IdDomain::Housekeeper, count)?;
    let mut rows = Vec::with_capacity(count as usize);
    for id in ids {
        for table in tables {
            rows.push(HousekeeperRow {
                housekeeper_id,
                table_name: (*table).to_string(),
                field: field.to_string(),
                value: *id,
            });
            housekeeper_id += 1;
        }
    }
    store.enqueue_housekeeper(&rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use templink_model::discovery::GraphDiscoveryRow;
    use templink_model::{FunctionRow, GraphItemRow, GraphRow, HostRow, ItemRow, TriggerRow};
    use templink_store::MemoryStore;

    #[test]
    fn orphaned_triggers_go_with_their_items() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.items.push(ItemRow::new(50, 5, "cpu.util"));
            data.items.push(ItemRow::new(51, 5, "cpu.load"));
            // trigger on the doomed item only
            data.triggers.push(TriggerRow::new(500, "t1", "{1}>0"));
            data.functions.push(FunctionRow {
                function_id: 1,
                trigger_id: 500,
                item_id: 50,
                name: "last".into(),
                parameter: String::new(),
            });
            // trigger also referencing the surviving item
            data.triggers.push(TriggerRow::new(501, "t2", "{2}>0 or {3}>0"));
            data.functions.push(FunctionRow {
                function_id: 2,
                trigger_id: 501,
                item_id: 50,
                name: "last".into(),
                parameter: String::new(),
            });
            data.functions.push(FunctionRow {
                function_id: 3,
                trigger_id: 501,
                item_id: 51,
                name: "last".into(),
                parameter: String::new(),
            });
        });
        let mut audit = AuditBuffer::new();

        delete_items(&store, &mut audit, vec![50]).unwrap();

        store.read(|data| {
            assert!(data.triggers.iter().all(|t| t.trigger_id != 500));
            assert!(data.triggers.iter().any(|t| t.trigger_id == 501));
            assert!(data.items.iter().all(|i| i.item_id != 50));
            assert!(data.items.iter().any(|i| i.item_id == 51));
        });
    }

    #[test]
    fn housekeeper_rows_cover_history_and_events() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.items.push(ItemRow::new(50, 5, "cpu.util"));
        });
        let mut audit = AuditBuffer::new();

        delete_items(&store, &mut audit, vec![50]).unwrap();

        store.read(|data| {
            // 7 history tables + events by itemid + events by lldruleid
            assert_eq!(data.housekeeper.len(), 9);
            assert!(data
                .housekeeper
                .iter()
                .any(|h| h.table_name == "trends_uint" && h.field == "itemid"));
            assert!(data
                .housekeeper
                .iter()
                .any(|h| h.table_name == "events" && h.field == "lldruleid"));
        });
    }

    #[test]
    fn graph_children_are_deleted_before_parents() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.items.push(ItemRow::new(50, 5, "cpu.util"));
            data.graphs.push(GraphRow::new(600, "parent"));
            data.graphs.push(GraphRow::new(601, "child"));
            data.graph_discovery.push(GraphDiscoveryRow {
                graph_id: 601,
                parent_graph_id: 600,
            });
            for (gi, graph) in [(1u64, 600u64), (2, 601)] {
                data.graph_items.push(GraphItemRow {
                    graph_item_id: gi,
                    graph_id: graph,
                    item_id: 50,
                    draw_type: 0,
                    sort_order: 0,
                    color: "1A7C11".into(),
                    yaxis_side: 0,
                    calc_fnc: 2,
                    item_type: 0,
                });
            }
        });
        let mut audit = AuditBuffer::new();

        let removed = delete_graph_hierarchy(&store, &mut audit, vec![600]).unwrap();
        assert_eq!(removed, 2);
        store.read(|data| assert!(data.graphs.is_empty()));
    }
}
