//! Graph linking: key-sequence matching and curve copy.

use crate::error::LinkResult;
use std::collections::HashMap;
use templink_audit::{AuditBuffer, ResourceType};
use templink_model::{
    AxisBound, GraphItemRow, GraphRow, HostId, IdDomain, ItemId, ItemKind,
};
use templink_store::{GraphItemKeyRow, LinkStore};
use tracing::{debug, warn};

/// Counters for one graph family pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GraphLinkStats {
    /// New host graphs inserted.
    pub added: usize,
    /// Host graphs overwritten from the template.
    pub updated: usize,
}

fn graph_resource(flags: ItemKind) -> ResourceType {
    match flags {
        ItemKind::Prototype => ResourceType::GraphPrototype,
        _ => ResourceType::Graph,
    }
}

/// A template curve resolved onto the host: the template's presentation
/// columns, the host's item.
struct ResolvedCurve {
    item_id: ItemId,
    item_key: String,
    template: GraphItemRow,
}

/// Copies the template graphs of `template_ids` onto `host_id`.
///
/// A host graph with the same name, a null parent link and the identical
/// item-key sequence is overwritten in place; otherwise a new graph is
/// inserted with its curves re-pointed at key-matching host items.
pub fn link_graphs(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<GraphLinkStats> {
    let template_graphs = store.graphs_of_hosts(template_ids)?;
    if template_graphs.is_empty() {
        return Ok(GraphLinkStats::default());
    }
    debug!(host_id, graphs = template_graphs.len(), "linking template graphs");

    let host_items = store.items_by_hosts(&[host_id])?;
    let host_item_by_key: HashMap<&str, ItemId> = host_items
        .iter()
        .map(|i| (i.key.as_str(), i.item_id))
        .collect();

    // y-axis items are referenced by template item id; resolve them through
    // their keys in one pass
    let mut axis_item_ids: Vec<ItemId> = template_graphs
        .iter()
        .flat_map(|g| [g.ymin_item_id, g.ymax_item_id])
        .flatten()
        .collect();
    axis_item_ids.sort_unstable();
    axis_item_ids.dedup();
    let axis_items = store.items_by_ids(&axis_item_ids)?;
    let axis_key_of: HashMap<ItemId, &str> = axis_items
        .iter()
        .map(|i| (i.item_id, i.key.as_str()))
        .collect();
    let resolve_axis = |kind: AxisBound, item_id: Option<ItemId>| -> Option<ItemId> {
        if kind != AxisBound::ItemValue {
            return None;
        }
        item_id
            .and_then(|id| axis_key_of.get(&id))
            .and_then(|key| host_item_by_key.get(key))
            .copied()
    };

    let mut stats = GraphLinkStats::default();

    for template_graph in &template_graphs {
        let template_curves = store.graph_items_by_key(template_graph.graph_id)?;

        // resolve curves onto the host; curves whose item the host does not
        // carry are dropped, matching the inner join of the copy query
        let mut resolved: Vec<ResolvedCurve> = Vec::new();
        for curve in template_curves {
            match host_item_by_key.get(curve.item_key.as_str()) {
                Some(item_id) => resolved.push(ResolvedCurve {
                    item_id: *item_id,
                    item_key: curve.item_key,
                    template: curve.row,
                }),
                None => warn!(
                    host_id,
                    key = curve.item_key.as_str(),
                    graph = template_graph.name.as_str(),
                    "graph curve references an item the host does not carry"
                ),
            }
        }

        // look for an equivalent unlinked host graph
        let mut matched: Option<(GraphRow, Vec<GraphItemKeyRow>)> = None;
        for candidate in store.host_graphs_by_name(host_id, &template_graph.name)? {
            let candidate_curves = store.graph_items_by_key(candidate.graph_id)?;
            let keys_equal = candidate_curves.len() == resolved.len()
                && candidate_curves
                    .iter()
                    .zip(resolved.iter())
                    .all(|(c, r)| c.item_key == r.item_key);
            if keys_equal {
                matched = Some((candidate, candidate_curves));
                break;
            }
        }

        let ymin_item_id = resolve_axis(template_graph.ymin_kind, template_graph.ymin_item_id);
        let ymax_item_id = resolve_axis(template_graph.ymax_kind, template_graph.ymax_item_id);

        match matched {
            Some((host_graph, host_curves)) => {
                stats.updated += 1;
                let mut row = template_graph.clone();
                row.graph_id = host_graph.graph_id;
                row.template_id = Some(template_graph.graph_id);
                row.ymin_item_id = ymin_item_id;
                row.ymax_item_id = ymax_item_id;

                let prefix = graph_resource(row.flags).path_prefix();
                audit.record_update(row.graph_id, &row.name, graph_resource(row.flags));
                audit.update_field(
                    row.graph_id,
                    format!("{prefix}.templateid"),
                    template_graph.graph_id,
                )?;

                let mut curve_updates = Vec::with_capacity(host_curves.len());
                for (host_curve, template_curve) in host_curves.iter().zip(resolved.iter()) {
                    curve_updates.push(GraphItemRow {
                        graph_item_id: host_curve.row.graph_item_id,
                        graph_id: host_graph.graph_id,
                        item_id: host_curve.row.item_id,
                        draw_type: template_curve.template.draw_type,
                        sort_order: template_curve.template.sort_order,
                        color: template_curve.template.color.clone(),
                        yaxis_side: template_curve.template.yaxis_side,
                        calc_fnc: template_curve.template.calc_fnc,
                        item_type: template_curve.template.item_type,
                    });
                    audit.update_field(
                        row.graph_id,
                        format!(
                            "{prefix}.gitems[{}].color",
                            host_curve.row.graph_item_id
                        ),
                        template_curve.template.color.as_str(),
                    )?;
                }

                store.update_graphs(&[row])?;
                store.update_graph_items(&curve_updates)?;
            }
            None => {
                stats.added += 1;
                let graph_id = store.reserve_ids(IdDomain::Graphs, 1)?;
                let mut curve_id =
                    store.reserve_ids(IdDomain::GraphItems, resolved.len() as u64)?;

                let mut row = template_graph.clone();
                row.graph_id = graph_id;
                row.template_id = Some(template_graph.graph_id);
                row.ymin_item_id = ymin_item_id;
                row.ymax_item_id = ymax_item_id;

                let prefix = graph_resource(row.flags).path_prefix();
                audit.record_add(graph_id, &row.name, graph_resource(row.flags));
                audit.update_field(
                    graph_id,
                    format!("{prefix}.templateid"),
                    template_graph.graph_id,
                )?;

                let mut curves = Vec::with_capacity(resolved.len());
                for template_curve in &resolved {
                    curves.push(GraphItemRow {
                        graph_item_id: curve_id,
                        graph_id,
                        item_id: template_curve.item_id,
                        draw_type: template_curve.template.draw_type,
                        sort_order: template_curve.template.sort_order,
                        color: template_curve.template.color.clone(),
                        yaxis_side: template_curve.template.yaxis_side,
                        calc_fnc: template_curve.template.calc_fnc,
                        item_type: template_curve.template.item_type,
                    });
                    audit.update_field(
                        graph_id,
                        format!("{prefix}.gitems[{curve_id}].color"),
                        template_curve.template.color.as_str(),
                    )?;
                    curve_id += 1;
                }

                store.insert_graphs(&[row])?;
                store.insert_graph_items(&curves)?;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use templink_model::{HostRow, ItemRow};
    use templink_store::MemoryStore;

    fn curve(graph_item_id: u64, graph_id: u64, item_id: u64, color: &str) -> GraphItemRow {
        GraphItemRow {
            graph_item_id,
            graph_id,
            item_id,
            draw_type: 0,
            sort_order: 0,
            color: color.into(),
            yaxis_side: 0,
            calc_fnc: 2,
            item_type: 0,
        }
    }

    fn seed_template_graph(store: &MemoryStore) {
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.items.push(ItemRow::new(10, 1, "cpu.util"));
            data.items.push(ItemRow::new(50, 5, "cpu.util"));
            data.graphs.push(GraphRow::new(300, "CPU usage"));
            data.graph_items.push(curve(301, 300, 10, "1A7C11"));
        });
    }

    #[test]
    fn graph_is_copied_with_host_items() {
        let store = MemoryStore::new();
        seed_template_graph(&store);
        let mut audit = AuditBuffer::new();

        let stats = link_graphs(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 1);

        store.read(|data| {
            let copied = data
                .graphs
                .iter()
                .find(|g| g.template_id == Some(300))
                .expect("copied graph");
            let curves: Vec<_> = data
                .graph_items
                .iter()
                .filter(|gi| gi.graph_id == copied.graph_id)
                .collect();
            assert_eq!(curves.len(), 1);
            assert_eq!(curves[0].item_id, 50);
        });
    }

    #[test]
    fn same_key_sequence_updates_in_place() {
        let store = MemoryStore::new();
        seed_template_graph(&store);
        store.seed(|data| {
            data.graphs.push(GraphRow::new(600, "CPU usage"));
            data.graph_items.push(curve(601, 600, 50, "FFFFFF"));
        });
        let mut audit = AuditBuffer::new();

        let stats = link_graphs(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 0);
        assert_eq!(stats.updated, 1);

        store.read(|data| {
            assert_eq!(data.graphs.len(), 2);
            let host_graph = data.graphs.iter().find(|g| g.graph_id == 600).unwrap();
            assert_eq!(host_graph.template_id, Some(300));
            // curve adopted the template colour, kept its own item
            let host_curve = data
                .graph_items
                .iter()
                .find(|gi| gi.graph_item_id == 601)
                .unwrap();
            assert_eq!(host_curve.color, "1A7C11");
            assert_eq!(host_curve.item_id, 50);
        });
    }

    #[test]
    fn different_key_sequence_inserts_a_second_graph() {
        let store = MemoryStore::new();
        seed_template_graph(&store);
        store.seed(|data| {
            data.items.push(ItemRow::new(51, 5, "cpu.load"));
            data.graphs.push(GraphRow::new(600, "CPU usage"));
            data.graph_items.push(curve(601, 600, 51, "FFFFFF"));
        });
        let mut audit = AuditBuffer::new();

        let stats = link_graphs(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.updated, 0);
        store.read(|data| assert_eq!(data.graphs.len(), 3));
    }

    #[test]
    fn unresolvable_axis_item_becomes_null() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.items.push(ItemRow::new(10, 1, "cpu.util"));
            data.items.push(ItemRow::new(11, 1, "cpu.max"));
            data.items.push(ItemRow::new(50, 5, "cpu.util"));
            // cpu.max has no host counterpart
            let mut graph = GraphRow::new(300, "CPU usage");
            graph.ymax_kind = AxisBound::ItemValue;
            graph.ymax_item_id = Some(11);
            data.graphs.push(graph);
            data.graph_items.push(curve(301, 300, 10, "1A7C11"));
        });
        let mut audit = AuditBuffer::new();

        link_graphs(&store, &mut audit, 5, &[1]).unwrap();

        store.read(|data| {
            let copied = data
                .graphs
                .iter()
                .find(|g| g.template_id == Some(300))
                .unwrap();
            assert_eq!(copied.ymax_kind, AxisBound::ItemValue);
            assert_eq!(copied.ymax_item_id, None);
        });
    }
}
