//! Pre-flight validation of a candidate template set.
//!
//! All checks run before the first write; the first failure wins and aborts
//! the request with a diagnostic naming the offending entity.

use crate::error::{LinkError, LinkResult};
use std::collections::{HashMap, HashSet};
use templink_model::{
    HostId, HostKind, InterfaceRequirement, InterfaceType, ItemId, TriggerId,
};
use templink_store::LinkStore;
use tracing::debug;

/// Checks the internal consistency of a linked template set, independent of
/// any target host.
///
/// Runs over the union of already-linked and candidate templates: linking a
/// new template must not make the combined set inconsistent.
pub fn validate_linked_templates(
    store: &dyn LinkStore,
    template_ids: &[HostId],
) -> LinkResult<()> {
    if template_ids.is_empty() {
        return Ok(());
    }
    debug!(templates = template_ids.len(), "validating linked template set");

    if template_ids.len() > 1 {
        check_duplicate_keys(store, template_ids)?;
    }
    check_trigger_items(store, template_ids)?;
    check_trigger_dependencies(store, template_ids)?;
    if template_ids.len() > 1 {
        check_duplicate_graphs(store, template_ids)?;
        check_duplicate_scenarios(store, template_ids)?;
    }
    Ok(())
}

/// Checks collisions between the target host and the candidate templates.
pub fn validate_host(
    store: &dyn LinkStore,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<()> {
    debug!(host_id, templates = template_ids.len(), "validating host against templates");

    check_inventory_links(store, host_id, template_ids)?;
    check_scenario_steps(store, host_id, template_ids)?;
    check_graph_compatibility(store, host_id, template_ids)?;
    check_item_kinds(store, host_id, template_ids)?;
    check_interface_coverage(store, host_id, template_ids)?;
    Ok(())
}

fn check_duplicate_keys(store: &dyn LinkStore, template_ids: &[HostId]) -> LinkResult<()> {
    let items = store.items_by_hosts(template_ids)?;
    let mut seen: HashMap<&str, u32> = HashMap::new();
    for item in &items {
        let count = seen.entry(item.key.as_str()).or_insert(0);
        *count += 1;
        if *count > 1 {
            return Err(LinkError::validation(format!(
                "conflicting item key \"{}\" found",
                item.key
            )));
        }
    }
    Ok(())
}

/// A template trigger must not reference items of a template outside the
/// linked set.
fn check_trigger_items(store: &dyn LinkStore, template_ids: &[HostId]) -> LinkResult<()> {
    let triggers = store.triggers_of_hosts(template_ids)?;
    let trigger_ids: Vec<TriggerId> = triggers.iter().map(|t| t.trigger_id).collect();
    let functions = store.functions_with_keys(&trigger_ids)?;

    let item_ids: Vec<ItemId> = functions.iter().map(|f| f.item_id).collect();
    let items = store.items_by_ids(&item_ids)?;
    let item_hosts: HashMap<ItemId, HostId> =
        items.iter().map(|i| (i.item_id, i.host_id)).collect();

    let mut host_ids: Vec<HostId> = item_hosts.values().copied().collect();
    host_ids.sort_unstable();
    host_ids.dedup();
    let hosts = store.hosts(&host_ids)?;

    for function in &functions {
        let Some(host_id) = item_hosts.get(&function.item_id) else {
            continue;
        };
        if template_ids.contains(host_id) {
            continue;
        }
        let Some(host) = hosts.iter().find(|h| h.host_id == *host_id) else {
            continue;
        };
        if host.kind == HostKind::Template {
            let description = triggers
                .iter()
                .find(|t| t.trigger_id == function.trigger_id)
                .map(|t| t.description.as_str())
                .unwrap_or("");
            return Err(LinkError::validation(format!(
                "trigger \"{}\" has items from template \"{}\"",
                description, host.host
            )));
        }
    }
    Ok(())
}

/// A dependency of a template trigger must not reach a trigger of a
/// template outside the linked set.
fn check_trigger_dependencies(store: &dyn LinkStore, template_ids: &[HostId]) -> LinkResult<()> {
    let triggers = store.triggers_of_hosts(template_ids)?;
    let trigger_ids: HashSet<TriggerId> = triggers.iter().map(|t| t.trigger_id).collect();
    let id_list: Vec<TriggerId> = trigger_ids.iter().copied().collect();
    let deps = store.dependencies_touching(&id_list)?;

    let mut foreign_ups: Vec<TriggerId> = deps
        .iter()
        .filter(|d| trigger_ids.contains(&d.trigger_down) && !trigger_ids.contains(&d.trigger_up))
        .map(|d| d.trigger_up)
        .collect();
    foreign_ups.sort_unstable();
    foreign_ups.dedup();
    if foreign_ups.is_empty() {
        return Ok(());
    }

    let up_functions = store.functions_with_keys(&foreign_ups)?;
    let up_items = store.items_by_ids(
        &up_functions.iter().map(|f| f.item_id).collect::<Vec<_>>(),
    )?;
    let up_hosts = store.hosts(
        &up_items.iter().map(|i| i.host_id).collect::<Vec<_>>(),
    )?;
    let up_triggers = store.triggers_by_ids(&foreign_ups)?;

    for dep in &deps {
        if !trigger_ids.contains(&dep.trigger_down) || trigger_ids.contains(&dep.trigger_up) {
            continue;
        }
        for function in up_functions.iter().filter(|f| f.trigger_id == dep.trigger_up) {
            let Some(item) = up_items.iter().find(|i| i.item_id == function.item_id) else {
                continue;
            };
            let Some(host) = up_hosts.iter().find(|h| h.host_id == item.host_id) else {
                continue;
            };
            if host.kind == HostKind::Template && !template_ids.contains(&host.host_id) {
                let down = triggers
                    .iter()
                    .find(|t| t.trigger_id == dep.trigger_down)
                    .map(|t| t.description.as_str())
                    .unwrap_or("");
                let up = up_triggers
                    .iter()
                    .find(|t| t.trigger_id == dep.trigger_up)
                    .map(|t| t.description.as_str())
                    .unwrap_or("");
                return Err(LinkError::validation(format!(
                    "trigger \"{down}\" has dependency from trigger \"{up}\" in template \"{}\"",
                    host.host
                )));
            }
        }
    }
    Ok(())
}

/// Same-named graphs across the linked set must carry identical item-key
/// sequences; anything else would be two different graphs fighting over one
/// host-side name.
fn check_duplicate_graphs(store: &dyn LinkStore, template_ids: &[HostId]) -> LinkResult<()> {
    let graphs = store.graphs_of_hosts(template_ids)?;
    let mut by_name: HashMap<&str, Vec<u64>> = HashMap::new();
    for graph in &graphs {
        by_name.entry(graph.name.as_str()).or_default().push(graph.graph_id);
    }
    for (name, graph_ids) in by_name {
        if graph_ids.len() < 2 {
            continue;
        }
        let reference: Vec<String> = store
            .graph_items_by_key(graph_ids[0])?
            .into_iter()
            .map(|g| g.item_key)
            .collect();
        for other in &graph_ids[1..] {
            let keys: Vec<String> = store
                .graph_items_by_key(*other)?
                .into_iter()
                .map(|g| g.item_key)
                .collect();
            if keys != reference {
                return Err(LinkError::validation(format!(
                    "template with graph \"{name}\" already linked to the host"
                )));
            }
        }
    }
    Ok(())
}

fn check_duplicate_scenarios(store: &dyn LinkStore, template_ids: &[HostId]) -> LinkResult<()> {
    let scenarios = store.scenarios_of_hosts(template_ids)?;
    let mut seen: HashSet<&str> = HashSet::new();
    for scenario in &scenarios {
        if !seen.insert(scenario.name.as_str()) {
            return Err(LinkError::validation(format!(
                "template with web scenario \"{}\" already linked to the host",
                scenario.name
            )));
        }
    }
    Ok(())
}

fn check_inventory_links(
    store: &dyn LinkStore,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<()> {
    let template_items = store.items_by_hosts(template_ids)?;

    let mut slots: HashSet<i32> = HashSet::new();
    for item in template_items.iter().filter(|i| i.inventory_link != 0) {
        if !slots.insert(item.inventory_link) {
            return Err(LinkError::validation(
                "two items cannot populate one host inventory field",
            ));
        }
    }

    let template_keys: HashSet<&str> = template_items.iter().map(|i| i.key.as_str()).collect();
    let host_items = store.items_by_hosts(&[host_id])?;
    for template_item in template_items.iter().filter(|i| i.inventory_link != 0) {
        for host_item in host_items.iter().filter(|i| {
            i.inventory_link == template_item.inventory_link && i.key != template_item.key
        }) {
            // the host item survives the link (no template item replaces
            // it), so both would feed the same inventory slot
            if !template_keys.contains(host_item.key.as_str()) {
                return Err(LinkError::validation(
                    "two items cannot populate one host inventory field",
                ));
            }
        }
    }
    Ok(())
}

fn check_scenario_steps(
    store: &dyn LinkStore,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<()> {
    let template_scenarios = store.scenarios_of_hosts(template_ids)?;
    let host_scenarios = store.scenarios_of_hosts(&[host_id])?;

    for template_scenario in &template_scenarios {
        let Some(host_scenario) = host_scenarios
            .iter()
            .find(|s| s.name == template_scenario.name)
        else {
            continue;
        };

        let mut template_steps: Vec<(i32, String)> = store
            .scenario_steps(&[template_scenario.scenario_id])?
            .into_iter()
            .map(|s| (s.no, s.name))
            .collect();
        let mut host_steps: Vec<(i32, String)> = store
            .scenario_steps(&[host_scenario.scenario_id])?
            .into_iter()
            .map(|s| (s.no, s.name))
            .collect();
        template_steps.sort();
        host_steps.sort();

        if template_steps != host_steps {
            return Err(LinkError::validation(format!(
                "web scenario \"{}\" already exists on the host (steps are not identical)",
                template_scenario.name
            )));
        }
    }
    Ok(())
}

fn check_graph_compatibility(
    store: &dyn LinkStore,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<()> {
    let template_graphs = store.graphs_of_hosts(template_ids)?;

    for template_graph in &template_graphs {
        let template_keys: Vec<String> = store
            .graph_items_by_key(template_graph.graph_id)?
            .into_iter()
            .map(|g| g.item_key)
            .collect();

        for host_graph in store.host_graphs_by_name(host_id, &template_graph.name)? {
            if host_graph.flags != template_graph.flags {
                return Err(LinkError::validation(format!(
                    "graph prototype and real graph \"{}\" have the same name",
                    template_graph.name
                )));
            }

            let host_keys: Vec<String> = store
                .graph_items_by_key(host_graph.graph_id)?
                .into_iter()
                .map(|g| g.item_key)
                .collect();
            if host_keys != template_keys {
                return Err(LinkError::validation(format!(
                    "graph \"{}\" already exists on the host (items are not identical)",
                    template_graph.name
                )));
            }
        }
    }
    Ok(())
}

fn check_item_kinds(
    store: &dyn LinkStore,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<()> {
    let template_items = store.items_by_hosts(template_ids)?;
    let host_items = store.items_by_hosts(&[host_id])?;

    for host_item in &host_items {
        if let Some(template_item) = template_items.iter().find(|i| i.key == host_item.key) {
            if template_item.flags != host_item.flags {
                return Err(LinkError::validation(format!(
                    "item prototype and real item \"{}\" have the same key",
                    host_item.key
                )));
            }
        }
    }
    Ok(())
}

fn check_interface_coverage(
    store: &dyn LinkStore,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<()> {
    let interfaces = store.prototype_interfaces(&[host_id])?;
    let mut available: HashSet<InterfaceType> = HashSet::new();
    let mut has_any = false;
    for interface in &interfaces {
        has_any = true;
        if interface.main == 1 {
            available.insert(interface.interface_type);
        }
    }

    let template_items = store.items_by_hosts(template_ids)?;
    for item in &template_items {
        match item.item_type.interface_requirement() {
            InterfaceRequirement::None => {}
            InterfaceRequirement::Any => {
                if !has_any {
                    return Err(LinkError::validation("cannot find any interfaces on host"));
                }
            }
            InterfaceRequirement::Specific(required) => {
                if !available.contains(&required) {
                    return Err(LinkError::validation(format!(
                        "cannot find \"{}\" host interface",
                        required.as_str()
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use templink_model::{
        HostRow, InterfaceType, ItemKind, ItemRow, ItemType, PrototypeInterfaceRow, WebScenarioRow,
        WebStepRow,
    };
    use templink_store::MemoryStore;

    fn step(step_id: u64, scenario_id: u64, no: i32, name: &str) -> WebStepRow {
        WebStepRow {
            step_id,
            scenario_id,
            name: name.into(),
            no,
            url: "http://localhost/".into(),
            timeout: "15s".into(),
            posts: String::new(),
            required: String::new(),
            status_codes: "200".into(),
            follow_redirects: 1,
            retrieve_mode: 0,
            post_type: 0,
        }
    }

    #[test]
    fn conflicting_keys_across_templates_are_rejected() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::template(2, "T2"));
            data.items.push(ItemRow::new(10, 1, "cpu.util"));
            data.items.push(ItemRow::new(11, 2, "cpu.util"));
        });

        let err = validate_linked_templates(&store, &[1, 2]).unwrap_err();
        assert_eq!(err.to_string(), "conflicting item key \"cpu.util\" found");
    }

    #[test]
    fn single_template_key_clash_is_impossible() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.items.push(ItemRow::new(10, 1, "cpu.util"));
        });
        assert!(validate_linked_templates(&store, &[1]).is_ok());
    }

    #[test]
    fn scenario_step_mismatch_is_rejected() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.scenarios.push(WebScenarioRow::new(100, 1, "Login"));
            data.scenarios.push(WebScenarioRow::new(200, 5, "Login"));
            data.steps.push(step(101, 100, 1, "GET /"));
            data.steps.push(step(102, 100, 2, "POST /auth"));
            data.steps.push(step(201, 200, 1, "GET /"));
            data.steps.push(step(202, 200, 2, "POST /login"));
        });

        let err = validate_host(&store, 5, &[1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "web scenario \"Login\" already exists on the host (steps are not identical)"
        );
    }

    #[test]
    fn identical_scenario_steps_pass() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.scenarios.push(WebScenarioRow::new(100, 1, "Login"));
            data.scenarios.push(WebScenarioRow::new(200, 5, "Login"));
            data.steps.push(step(101, 100, 1, "GET /"));
            data.steps.push(step(201, 200, 1, "GET /"));
        });

        assert!(validate_host(&store, 5, &[1]).is_ok());
    }

    #[test]
    fn item_kind_collision_is_rejected() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            let mut prototype = ItemRow::new(10, 1, "net.if[{#IF}]");
            prototype.flags = ItemKind::Prototype;
            data.items.push(prototype);
            data.items.push(ItemRow::new(50, 5, "net.if[{#IF}]"));
        });

        let err = validate_host(&store, 5, &[1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "item prototype and real item \"net.if[{#IF}]\" have the same key"
        );
    }

    #[test]
    fn missing_snmp_interface_is_rejected() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            let mut item = ItemRow::new(10, 1, "ifInOctets");
            item.item_type = ItemType::Snmp;
            data.items.push(item);
        });

        let err = validate_host(&store, 5, &[1]).unwrap_err();
        assert_eq!(err.to_string(), "cannot find \"SNMP\" host interface");
    }

    #[test]
    fn main_interface_of_required_type_passes() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            let mut item = ItemRow::new(10, 1, "agent.ping");
            item.item_type = ItemType::Agent;
            data.items.push(item);
            data.interfaces.push(PrototypeInterfaceRow {
                interface_id: 900,
                host_id: 5,
                main: 1,
                interface_type: InterfaceType::Agent,
                use_ip: 1,
                ip: "192.0.2.1".into(),
                dns: String::new(),
                port: "10050".into(),
                snmp: None,
            });
        });

        assert!(validate_host(&store, 5, &[1]).is_ok());
    }

    #[test]
    fn inventory_slot_collision_is_rejected() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            let mut a = ItemRow::new(10, 1, "system.hostname");
            a.inventory_link = 3;
            let mut b = ItemRow::new(11, 1, "system.uname");
            b.inventory_link = 3;
            data.items.push(a);
            data.items.push(b);
        });

        let err = validate_host(&store, 5, &[1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "two items cannot populate one host inventory field"
        );
    }
}
