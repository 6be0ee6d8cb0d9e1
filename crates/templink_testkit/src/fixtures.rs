//! Dataset fixtures.

use templink_model::discovery::HostDiscoveryRow;
use templink_model::{
    FunctionId, FunctionRow, GraphItemRow, GraphRow, HostId, HostPrototypeRow, HostRow, ItemId,
    ItemKind, ItemRow, PrototypeMacroRow, ScenarioId, TemplateLinkRow, TriggerId, TriggerRow,
    WebScenarioRow, WebStepRow,
};
use templink_store::MemoryStore;

/// Table sizes of interest for round-trip assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityCounts {
    /// Rows in the links table.
    pub links: usize,
    /// Items.
    pub items: usize,
    /// Triggers.
    pub triggers: usize,
    /// Trigger functions.
    pub functions: usize,
    /// Graphs.
    pub graphs: usize,
    /// Graph curves.
    pub graph_items: usize,
    /// Host prototypes.
    pub prototypes: usize,
    /// Web scenarios.
    pub scenarios: usize,
    /// Web scenario steps.
    pub steps: usize,
}

/// A seeded [`MemoryStore`] plus an id dispenser.
///
/// Fixture ids start at 1 and stay far below the store's allocation floor,
/// so engine-allocated rows never collide with seeded ones.
pub struct Fixture {
    /// The store under test.
    pub store: MemoryStore,
    next_id: u64,
}

impl Fixture {
    /// Creates an empty fixture.
    pub fn new() -> Self {
        Fixture {
            store: MemoryStore::new(),
            next_id: 1,
        }
    }

    /// Hands out the next fixture id.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Seeds a template.
    pub fn template(&mut self, name: &str) -> HostId {
        let id = self.next_id();
        self.store
            .seed(|data| data.hosts.push(HostRow::template(id, name)));
        id
    }

    /// Seeds a regular host.
    pub fn host(&mut self, name: &str) -> HostId {
        let id = self.next_id();
        self.store
            .seed(|data| data.hosts.push(HostRow::regular(id, name)));
        id
    }

    /// Seeds an item.
    pub fn item(&mut self, host_id: HostId, key: &str) -> ItemId {
        let id = self.next_id();
        self.store
            .seed(|data| data.items.push(ItemRow::new(id, host_id, key)));
        id
    }

    /// Seeds an item mirroring a template item (parent link set).
    pub fn mirrored_item(
        &mut self,
        host_id: HostId,
        key: &str,
        template_item_id: ItemId,
    ) -> ItemId {
        let id = self.next_id();
        self.store.seed(|data| {
            let mut row = ItemRow::new(id, host_id, key);
            row.template_item_id = Some(template_item_id);
            data.items.push(row);
        });
        id
    }

    /// Seeds a discovery-rule item.
    pub fn rule(&mut self, host_id: HostId, key: &str) -> ItemId {
        let id = self.next_id();
        self.store.seed(|data| {
            let mut row = ItemRow::new(id, host_id, key);
            row.flags = ItemKind::Rule;
            data.items.push(row);
        });
        id
    }

    /// Seeds a trigger with one function over `item_id`; the expression is
    /// `{<function>}<comparison>`.
    pub fn trigger(
        &mut self,
        description: &str,
        item_id: ItemId,
        parameter: &str,
        comparison: &str,
    ) -> (TriggerId, FunctionId) {
        let trigger_id = self.next_id();
        let function_id = self.next_id();
        self.store.seed(|data| {
            data.triggers.push(TriggerRow::new(
                trigger_id,
                description,
                format!("{{{function_id}}}{comparison}"),
            ));
            data.functions.push(FunctionRow {
                function_id,
                trigger_id,
                item_id,
                name: "avg".into(),
                parameter: parameter.into(),
            });
        });
        (trigger_id, function_id)
    }

    /// Seeds a graph with one curve per item.
    pub fn graph(&mut self, name: &str, item_ids: &[ItemId]) -> u64 {
        let graph_id = self.next_id();
        let curve_ids: Vec<u64> = item_ids.iter().map(|_| self.next_id()).collect();
        self.store.seed(|data| {
            data.graphs.push(GraphRow::new(graph_id, name));
            for (curve_id, item_id) in curve_ids.iter().zip(item_ids) {
                data.graph_items.push(GraphItemRow {
                    graph_item_id: *curve_id,
                    graph_id,
                    item_id: *item_id,
                    draw_type: 0,
                    sort_order: 0,
                    color: "1A7C11".into(),
                    yaxis_side: 0,
                    calc_fnc: 2,
                    item_type: 0,
                });
            }
        });
        graph_id
    }

    /// Seeds a host prototype hanging off `rule_item_id`.
    pub fn prototype(&mut self, rule_item_id: ItemId, host: &str) -> HostId {
        let id = self.next_id();
        self.store.seed(|data| {
            data.host_prototypes.push(HostPrototypeRow {
                host_id: id,
                host: host.into(),
                name: host.into(),
                status: 0,
                discover: 0,
                custom_interfaces: 0,
                template_id: None,
            });
            data.host_discovery.push(HostDiscoveryRow {
                host_id: id,
                parent_host_id: None,
                parent_item_id: Some(rule_item_id),
            });
        });
        id
    }

    /// Seeds a prototype macro.
    pub fn prototype_macro(&mut self, host_id: HostId, name: &str, value: &str) -> u64 {
        let id = self.next_id();
        self.store.seed(|data| {
            data.host_macros.push(PrototypeMacroRow {
                macro_id: id,
                host_id,
                macro_name: name.into(),
                value: value.into(),
                description: String::new(),
                macro_type: 0,
            });
        });
        id
    }

    /// Seeds a web scenario with numbered steps.
    pub fn scenario(&mut self, host_id: HostId, name: &str, steps: &[&str]) -> ScenarioId {
        let scenario_id = self.next_id();
        let step_ids: Vec<u64> = steps.iter().map(|_| self.next_id()).collect();
        self.store.seed(|data| {
            data.scenarios
                .push(WebScenarioRow::new(scenario_id, host_id, name));
            for (index, (step_id, step_name)) in step_ids.iter().zip(steps).enumerate() {
                data.steps.push(WebStepRow {
                    step_id: *step_id,
                    scenario_id,
                    name: (*step_name).to_string(),
                    no: index as i32 + 1,
                    url: format!("http://localhost/{index}"),
                    timeout: "15s".into(),
                    posts: String::new(),
                    required: String::new(),
                    status_codes: "200".into(),
                    follow_redirects: 1,
                    retrieve_mode: 0,
                    post_type: 0,
                });
            }
        });
        scenario_id
    }

    /// Seeds an existing host ↔ template link row.
    pub fn link(&mut self, host_id: HostId, template_id: HostId) -> u64 {
        let id = self.next_id();
        self.store.seed(|data| {
            data.links.push(TemplateLinkRow {
                link_id: id,
                host_id,
                template_id,
            });
        });
        id
    }

    /// Current table sizes.
    pub fn counts(&self) -> EntityCounts {
        self.store.read(|data| EntityCounts {
            links: data.links.len(),
            items: data.items.len(),
            triggers: data.triggers.len(),
            functions: data.functions.len(),
            graphs: data.graphs.len(),
            graph_items: data.graph_items.len(),
            prototypes: data.host_prototypes.len(),
            scenarios: data.scenarios.len(),
            steps: data.steps.len(),
        })
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_wires_trigger_functions() {
        let mut fixture = Fixture::new();
        let template = fixture.template("T1");
        let item = fixture.item(template, "cpu.util");
        let (trigger_id, function_id) = fixture.trigger("CPU high", item, "5m", ">5");

        fixture.store.read(|data| {
            let trigger = data
                .triggers
                .iter()
                .find(|t| t.trigger_id == trigger_id)
                .unwrap();
            assert_eq!(trigger.expression, format!("{{{function_id}}}>5"));
            assert!(data
                .functions
                .iter()
                .any(|f| f.function_id == function_id && f.item_id == item));
        });
    }

    #[test]
    fn counts_reflect_seeded_rows() {
        let mut fixture = Fixture::new();
        let template = fixture.template("T1");
        let item = fixture.item(template, "cpu.util");
        fixture.graph("CPU", &[item]);
        fixture.scenario(template, "Login", &["GET /"]);

        let counts = fixture.counts();
        assert_eq!(counts.items, 1);
        assert_eq!(counts.graphs, 1);
        assert_eq!(counts.graph_items, 1);
        assert_eq!(counts.scenarios, 1);
        assert_eq!(counts.steps, 1);
    }
}
