//! Trigger linking: equivalence matching, attribute adoption and copy.
//!
//! The matching predicate is not textual equality. The same logical trigger
//! carries different function ids on the template and on the host, so a
//! host candidate is compared in its equivalence-normal form: each of its
//! function ids is rewritten to the template function whose `(item key,
//! parameter)` pair matches, and the rewritten expressions must equal the
//! template's exactly.

use crate::error::{LinkError, LinkResult};
use std::collections::HashMap;
use templink_audit::{AuditBuffer, ResourceType};
use templink_expr::Expression;
use templink_model::{
    FunctionRow, HostId, IdDomain, ItemId, ItemKind, RecoveryMode, TriggerDependencyRow,
    TriggerId, TriggerRow, TriggerTagRow, TriggerUpdateFlags,
};
use templink_store::{FunctionKeyRow, LinkStore, TriggerUpdate};
use tracing::{debug, warn};

/// Counters for one trigger family pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TriggerLinkStats {
    /// New host triggers inserted.
    pub added: usize,
    /// Host triggers that adopted template attributes.
    pub updated: usize,
    /// Host triggers already equivalent and unchanged.
    pub skipped: usize,
}

/// The audit resource for a trigger row.
fn trigger_resource(flags: ItemKind) -> ResourceType {
    match flags {
        ItemKind::Prototype => ResourceType::TriggerPrototype,
        _ => ResourceType::Trigger,
    }
}

fn group_functions(rows: Vec<FunctionKeyRow>) -> HashMap<TriggerId, Vec<FunctionKeyRow>> {
    let mut map: HashMap<TriggerId, Vec<FunctionKeyRow>> = HashMap::new();
    for row in rows {
        map.entry(row.trigger_id).or_default().push(row);
    }
    map
}

/// Tries to rewrite `host` into the template's function ids. Returns the
/// rewritten `(expression, recovery_expression)` when every template
/// function found a `(item key, parameter)` partner.
fn normalized_expressions(
    template_funcs: &[FunctionKeyRow],
    host: &TriggerRow,
    host_funcs: &[FunctionKeyRow],
) -> LinkResult<(String, String)> {
    let mut expression = Expression::parse(&host.expression)?;
    let mut recovery = Expression::parse(&host.recovery_expression)?;

    for template_func in template_funcs {
        if let Some(partner) = host_funcs.iter().find(|f| {
            f.item_key == template_func.item_key && f.parameter == template_func.parameter
        }) {
            expression.replace_function_id(partner.function_id, template_func.function_id);
            recovery.replace_function_id(partner.function_id, template_func.function_id);
        }
    }

    Ok((expression.serialize(), recovery.serialize()))
}

/// Marks the template attributes a matched host trigger must adopt.
fn mark_updates(template: &TriggerRow, host: &TriggerRow) -> (TriggerUpdateFlags, TriggerUpdate) {
    let mut dirty = TriggerUpdateFlags::none();
    if template.flags != host.flags {
        dirty.set(TriggerUpdateFlags::FLAGS);
    }
    if template.recovery_mode != host.recovery_mode {
        dirty.set(TriggerUpdateFlags::RECOVERY_MODE);
    }
    if template.correlation_mode != host.correlation_mode
        || template.correlation_tag != host.correlation_tag
    {
        dirty.set(TriggerUpdateFlags::CORRELATION_MODE);
    }
    if template.manual_close != host.manual_close {
        dirty.set(TriggerUpdateFlags::MANUAL_CLOSE);
    }
    if template.opdata != host.opdata {
        dirty.set(TriggerUpdateFlags::OPDATA);
    }
    if template.discover != host.discover {
        dirty.set(TriggerUpdateFlags::DISCOVER);
    }
    if template.event_name != host.event_name {
        dirty.set(TriggerUpdateFlags::EVENT_NAME);
    }

    let update = TriggerUpdate {
        trigger_id: host.trigger_id,
        template_id: template.trigger_id,
        dirty,
        flags: template.flags,
        recovery_mode: template.recovery_mode,
        correlation_mode: template.correlation_mode,
        correlation_tag: template.correlation_tag.clone(),
        manual_close: template.manual_close,
        opdata: template.opdata.clone(),
        discover: template.discover,
        event_name: template.event_name.clone(),
    };
    (dirty, update)
}

/// Copies the template triggers of `template_ids` onto `host_id`.
pub fn link_triggers(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<TriggerLinkStats> {
    let template_triggers = store.triggers_of_hosts(template_ids)?;
    if template_triggers.is_empty() {
        return Ok(TriggerLinkStats::default());
    }
    debug!(
        host_id,
        triggers = template_triggers.len(),
        "linking template triggers"
    );

    let mut descriptions: Vec<String> = template_triggers
        .iter()
        .map(|t| t.description.clone())
        .collect();
    descriptions.sort();
    descriptions.dedup();

    let host_candidates = store.host_trigger_candidates(host_id, &descriptions)?;

    let template_funcs = group_functions(
        store.functions_with_keys(
            &template_triggers
                .iter()
                .map(|t| t.trigger_id)
                .collect::<Vec<_>>(),
        )?,
    );
    let host_funcs = group_functions(
        store.functions_with_keys(
            &host_candidates
                .iter()
                .map(|t| t.trigger_id)
                .collect::<Vec<_>>(),
        )?,
    );

    let mut candidates_by_description: HashMap<&str, Vec<&TriggerRow>> = HashMap::new();
    for candidate in &host_candidates {
        candidates_by_description
            .entry(candidate.description.as_str())
            .or_default()
            .push(candidate);
    }

    let empty: Vec<FunctionKeyRow> = Vec::new();
    let mut stats = TriggerLinkStats::default();
    let mut updates: Vec<TriggerUpdate> = Vec::new();
    let mut matched: Vec<(&TriggerRow, &TriggerRow)> = Vec::new();
    let mut to_insert: Vec<&TriggerRow> = Vec::new();

    for template in &template_triggers {
        let tfuncs = template_funcs
            .get(&template.trigger_id)
            .unwrap_or(&empty);

        let mut equivalent = None;
        for candidate in candidates_by_description
            .get(template.description.as_str())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
        {
            let cfuncs = host_funcs.get(&candidate.trigger_id).unwrap_or(&empty);
            let (expression, recovery) = normalized_expressions(tfuncs, candidate, cfuncs)?;
            if expression == template.expression && recovery == template.recovery_expression {
                equivalent = Some(*candidate);
                break;
            }
        }

        match equivalent {
            Some(host_trigger) => {
                let (dirty, update) = mark_updates(template, host_trigger);
                if dirty.is_empty() {
                    stats.skipped += 1;
                } else {
                    stats.updated += 1;
                }
                matched.push((template, host_trigger));
                updates.push(update);
            }
            None => {
                stats.added += 1;
                to_insert.push(template);
            }
        }
    }

    // adopt attributes on matched triggers
    if !updates.is_empty() {
        for update in &updates {
            let host_trigger = matched
                .iter()
                .find(|(_, h)| h.trigger_id == update.trigger_id)
                .map(|(_, h)| *h);
            if let Some(host_trigger) = host_trigger {
                audit.record_update(
                    host_trigger.trigger_id,
                    &host_trigger.description,
                    trigger_resource(host_trigger.flags),
                );
                record_update_details(audit, host_trigger.trigger_id, update)?;
            }
        }
        store.update_triggers(&updates)?;
    }

    // copy unmatched triggers with freshly wired functions
    let new_triggers = insert_triggers(store, audit, host_id, &to_insert, &template_funcs)?;

    let new_ids: Vec<TriggerId> = new_triggers.iter().map(|t| t.trigger_id).collect();
    add_dependencies_for_new_triggers(store, host_id, &new_triggers)?;

    let matched_ids: Vec<TriggerId> = matched.iter().map(|(_, h)| h.trigger_id).collect();
    copy_trigger_tags(store, &new_triggers, &matched, &matched_ids, &new_ids)?;

    Ok(stats)
}

fn recovery_mode_detail(mode: RecoveryMode) -> i64 {
    match mode {
        RecoveryMode::Expression => 0,
        RecoveryMode::RecoveryExpression => 1,
        RecoveryMode::None => 2,
    }
}

fn record_update_details(
    audit: &mut AuditBuffer,
    trigger_id: TriggerId,
    update: &TriggerUpdate,
) -> LinkResult<()> {
    use TriggerUpdateFlags as F;
    let prefix = trigger_resource(update.flags).path_prefix();
    audit.update_field(trigger_id, format!("{prefix}.templateid"), update.template_id)?;
    if update.dirty.contains(F::RECOVERY_MODE) {
        audit.update_field(
            trigger_id,
            format!("{prefix}.recovery_mode"),
            recovery_mode_detail(update.recovery_mode),
        )?;
    }
    if update.dirty.contains(F::CORRELATION_MODE) {
        audit.update_field(
            trigger_id,
            format!("{prefix}.correlation_tag"),
            update.correlation_tag.as_str(),
        )?;
    }
    if update.dirty.contains(F::MANUAL_CLOSE) {
        audit.update_field(
            trigger_id,
            format!("{prefix}.manual_close"),
            update.manual_close,
        )?;
    }
    if update.dirty.contains(F::OPDATA) {
        audit.update_field(trigger_id, format!("{prefix}.opdata"), update.opdata.as_str())?;
    }
    if update.dirty.contains(F::DISCOVER) {
        audit.update_field(trigger_id, format!("{prefix}.discover"), update.discover)?;
    }
    if update.dirty.contains(F::EVENT_NAME) {
        audit.update_field(
            trigger_id,
            format!("{prefix}.event_name"),
            update.event_name.as_str(),
        )?;
    }
    Ok(())
}

/// Builds and writes the new trigger rows: template attributes, host-local
/// functions and rewritten expressions.
fn insert_triggers(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    host_id: HostId,
    to_insert: &[&TriggerRow],
    template_funcs: &HashMap<TriggerId, Vec<FunctionKeyRow>>,
) -> LinkResult<Vec<TriggerRow>> {
    if to_insert.is_empty() {
        return Ok(Vec::new());
    }

    let host_items = store.items_by_hosts(&[host_id])?;
    let items_by_key: HashMap<&str, ItemId> = host_items
        .iter()
        .map(|i| (i.key.as_str(), i.item_id))
        .collect();

    let empty: Vec<FunctionKeyRow> = Vec::new();
    let function_count: usize = to_insert
        .iter()
        .map(|t| template_funcs.get(&t.trigger_id).map_or(0, Vec::len))
        .sum();

    let mut next_trigger_id = store.reserve_ids(IdDomain::Triggers, to_insert.len() as u64)?;
    let mut next_function_id = store.reserve_ids(IdDomain::Functions, function_count as u64)?;

    let mut new_triggers = Vec::with_capacity(to_insert.len());
    let mut new_functions = Vec::with_capacity(function_count);

    for template in to_insert {
        let trigger_id = next_trigger_id;
        next_trigger_id += 1;

        let tfuncs = template_funcs.get(&template.trigger_id).unwrap_or(&empty);
        let mut expression = Expression::parse(&template.expression)?;
        let mut recovery =
            if template.recovery_mode == RecoveryMode::RecoveryExpression {
                Some(Expression::parse(&template.recovery_expression)?)
            } else {
                None
            };
        let stale: Vec<u64> = tfuncs.iter().map(|f| f.function_id).collect();

        for template_func in tfuncs {
            let Some(item_id) = items_by_key.get(template_func.item_key.as_str()) else {
                warn!(
                    host_id,
                    key = template_func.item_key.as_str(),
                    "template trigger references an item the host does not carry"
                );
                return Err(LinkError::integrity(format!(
                    "missing similar key \"{}\" for host {host_id}",
                    template_func.item_key
                )));
            };

            let function_id = next_function_id;
            next_function_id += 1;
            new_functions.push(FunctionRow {
                function_id,
                trigger_id,
                item_id: *item_id,
                name: template_func.name.clone(),
                parameter: template_func.parameter.clone(),
            });

            expression.replace_function_id(template_func.function_id, function_id);
            if let Some(recovery) = recovery.as_mut() {
                recovery.replace_function_id(template_func.function_id, function_id);
            }
        }

        expression.validate_replaced(&stale)?;
        if let Some(recovery) = recovery.as_ref() {
            recovery.validate_replaced(&stale)?;
        }

        let mut row = (*template).clone();
        row.trigger_id = trigger_id;
        row.template_id = Some(template.trigger_id);
        row.expression = expression.serialize();
        row.recovery_expression = recovery
            .map(|r| r.serialize())
            .unwrap_or_else(|| template.recovery_expression.clone());
        row.value = 0;
        row.state = 0;

        let prefix = trigger_resource(row.flags).path_prefix();
        audit.record_add(trigger_id, &row.description, trigger_resource(row.flags));
        audit.update_field(
            trigger_id,
            format!("{prefix}.expression"),
            row.expression.as_str(),
        )?;
        if !row.recovery_expression.is_empty() {
            audit.update_field(
                trigger_id,
                format!("{prefix}.recovery_expression"),
                row.recovery_expression.as_str(),
            )?;
        }

        new_triggers.push(row);
    }

    store.insert_triggers(&new_triggers)?;
    store.insert_functions(&new_functions)?;
    Ok(new_triggers)
}

/// Copies the template-side dependency edges of the freshly created
/// triggers, mapping both ends onto the host where a mirror exists. An
/// up-side without a host mirror keeps the template trigger id: a
/// dependency may legitimately point outside the host.
fn add_dependencies_for_new_triggers(
    store: &dyn LinkStore,
    host_id: HostId,
    new_triggers: &[TriggerRow],
) -> LinkResult<()> {
    if new_triggers.is_empty() {
        return Ok(());
    }

    let parent_ids: Vec<TriggerId> = new_triggers
        .iter()
        .filter_map(|t| t.template_id)
        .collect();
    let edges = store.dependencies_touching(&parent_ids)?;
    if edges.is_empty() {
        return Ok(());
    }

    let mut all_parents: Vec<TriggerId> = edges
        .iter()
        .flat_map(|e| [e.trigger_down, e.trigger_up])
        .collect();
    all_parents.sort_unstable();
    all_parents.dedup();

    let mirrors = store.host_triggers_by_template_triggers(host_id, &all_parents)?;
    let mirror_of: HashMap<TriggerId, TriggerId> = mirrors
        .iter()
        .filter_map(|t| t.template_id.map(|parent| (parent, t.trigger_id)))
        .collect();

    let mut links: Vec<(TriggerId, TriggerId)> = Vec::new();
    for edge in &edges {
        let Some(down) = mirror_of.get(&edge.trigger_down) else {
            continue;
        };
        let up = mirror_of
            .get(&edge.trigger_up)
            .copied()
            .unwrap_or(edge.trigger_up);
        links.push((*down, up));
    }
    if links.is_empty() {
        return Ok(());
    }

    let mut dep_id = store.reserve_ids(IdDomain::TriggerDependencies, links.len() as u64)?;
    let rows: Vec<TriggerDependencyRow> = links
        .into_iter()
        .map(|(down, up)| {
            let row = TriggerDependencyRow {
                dep_id,
                trigger_down: down,
                trigger_up: up,
            };
            dep_id += 1;
            row
        })
        .collect();
    store.insert_trigger_dependencies(&rows)?;
    Ok(())
}

/// Re-copies template tags onto created and linked triggers. Linked
/// triggers lose their own tags first so the template's set wins.
fn copy_trigger_tags(
    store: &dyn LinkStore,
    new_triggers: &[TriggerRow],
    matched: &[(&TriggerRow, &TriggerRow)],
    matched_ids: &[TriggerId],
    new_ids: &[TriggerId],
) -> LinkResult<()> {
    if new_ids.is_empty() && matched_ids.is_empty() {
        return Ok(());
    }

    store.delete_trigger_tags(matched_ids)?;

    // host trigger → template parent, for both created and linked rows
    let mut parent_of: Vec<(TriggerId, TriggerId)> = new_triggers
        .iter()
        .filter_map(|t| t.template_id.map(|parent| (t.trigger_id, parent)))
        .collect();
    parent_of.extend(
        matched
            .iter()
            .map(|(template, host)| (host.trigger_id, template.trigger_id)),
    );

    let parent_ids: Vec<TriggerId> = parent_of.iter().map(|(_, parent)| *parent).collect();
    let template_tags = store.trigger_tags(&parent_ids)?;
    if template_tags.is_empty() {
        return Ok(());
    }

    let mut rows: Vec<TriggerTagRow> = Vec::new();
    for (host_trigger, parent) in &parent_of {
        for tag in template_tags.iter().filter(|t| t.trigger_id == *parent) {
            rows.push(TriggerTagRow {
                tag_id: 0,
                trigger_id: *host_trigger,
                tag: tag.tag.clone(),
                value: tag.value.clone(),
            });
        }
    }
    if rows.is_empty() {
        return Ok(());
    }

    let mut tag_id = store.reserve_ids(IdDomain::TriggerTags, rows.len() as u64)?;
    for row in &mut rows {
        row.tag_id = tag_id;
        tag_id += 1;
    }
    store.insert_trigger_tags(&rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use templink_audit::AuditBuffer;
    use templink_model::{HostRow, ItemRow};
    use templink_store::MemoryStore;

    fn function(
        function_id: u64,
        trigger_id: u64,
        item_id: u64,
        parameter: &str,
    ) -> FunctionRow {
        FunctionRow {
            function_id,
            trigger_id,
            item_id,
            name: "avg".into(),
            parameter: parameter.into(),
        }
    }

    /// Template T1 (host 1) with one trigger over `cpu.util`; host 5 carries
    /// a key-matching item.
    fn seed_basic(store: &MemoryStore) {
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.items.push(ItemRow::new(10, 1, "cpu.util"));
            data.items.push(ItemRow::new(50, 5, "cpu.util"));
            data.triggers
                .push(TriggerRow::new(100, "CPU high", "{1000}>5"));
            data.functions.push(function(1000, 100, 10, "avg,5m"));
        });
    }

    #[test]
    fn unmatched_template_trigger_is_copied_with_rewritten_functions() {
        let store = MemoryStore::new();
        seed_basic(&store);
        let mut audit = AuditBuffer::new();

        let stats = link_triggers(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.updated, 0);

        store.read(|data| {
            let created = data
                .triggers
                .iter()
                .find(|t| t.template_id == Some(100))
                .expect("copied trigger");
            let new_function = data
                .functions
                .iter()
                .find(|f| f.trigger_id == created.trigger_id)
                .expect("host function");
            assert_eq!(new_function.item_id, 50);
            assert_eq!(
                created.expression,
                format!("{{{}}}>5", new_function.function_id)
            );
        });
    }

    #[test]
    fn equivalent_host_trigger_is_linked_not_copied() {
        let store = MemoryStore::new();
        seed_basic(&store);
        store.seed(|data| {
            data.triggers
                .push(TriggerRow::new(500, "CPU high", "{5000}>5"));
            data.functions.push(function(5000, 500, 50, "avg,5m"));
        });
        let mut audit = AuditBuffer::new();

        let stats = link_triggers(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 0);
        assert_eq!(stats.skipped, 1);

        store.read(|data| {
            assert_eq!(data.triggers.len(), 2);
            let host_trigger = data.triggers.iter().find(|t| t.trigger_id == 500).unwrap();
            assert_eq!(host_trigger.template_id, Some(100));
            // expression text untouched
            assert_eq!(host_trigger.expression, "{5000}>5");
        });
    }

    #[test]
    fn matched_trigger_adopts_differing_attributes() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.items.push(ItemRow::new(10, 1, "cpu.util"));
            data.items.push(ItemRow::new(50, 5, "cpu.util"));

            let mut template = TriggerRow::new(100, "CPU high", "{1000}>5");
            template.opdata = "load {ITEM.LASTVALUE1}".into();
            data.triggers.push(template);
            data.functions.push(function(1000, 100, 10, "avg,5m"));

            data.triggers
                .push(TriggerRow::new(500, "CPU high", "{5000}>5"));
            data.functions.push(function(5000, 500, 50, "avg,5m"));
        });
        let mut audit = AuditBuffer::new();

        let stats = link_triggers(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.skipped, 0);

        store.read(|data| {
            let host_trigger = data.triggers.iter().find(|t| t.trigger_id == 500).unwrap();
            assert_eq!(host_trigger.opdata, "load {ITEM.LASTVALUE1}");
        });
    }

    #[test]
    fn parameter_mismatch_prevents_equivalence() {
        let store = MemoryStore::new();
        seed_basic(&store);
        store.seed(|data| {
            // same description and key, different function parameter
            data.triggers
                .push(TriggerRow::new(500, "CPU high", "{5000}>5"));
            data.functions.push(function(5000, 500, 50, "avg,15m"));
        });
        let mut audit = AuditBuffer::new();

        let stats = link_triggers(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 1);

        store.read(|data| {
            let host_trigger = data.triggers.iter().find(|t| t.trigger_id == 500).unwrap();
            assert_eq!(host_trigger.template_id, None);
        });
    }

    #[test]
    fn missing_host_item_aborts_the_family() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.items.push(ItemRow::new(10, 1, "cpu.util"));
            // host has no cpu.util item
            data.triggers
                .push(TriggerRow::new(100, "CPU high", "{1000}>5"));
            data.functions.push(function(1000, 100, 10, "avg,5m"));
        });
        let mut audit = AuditBuffer::new();

        let err = link_triggers(&store, &mut audit, 5, &[1]).unwrap_err();
        assert!(matches!(err, LinkError::Integrity { .. }));
        assert!(err.to_string().contains("cpu.util"));
    }

    #[test]
    fn dependencies_are_mirrored_for_new_triggers() {
        let store = MemoryStore::new();
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.items.push(ItemRow::new(10, 1, "cpu.util"));
            data.items.push(ItemRow::new(11, 1, "cpu.load"));
            data.items.push(ItemRow::new(50, 5, "cpu.util"));
            data.items.push(ItemRow::new(51, 5, "cpu.load"));

            data.triggers
                .push(TriggerRow::new(100, "CPU high", "{1000}>5"));
            data.functions.push(function(1000, 100, 10, "avg,5m"));
            data.triggers
                .push(TriggerRow::new(101, "Load high", "{1001}>10"));
            data.functions.push(function(1001, 101, 11, "avg,5m"));

            data.trigger_deps.push(TriggerDependencyRow {
                dep_id: 1,
                trigger_down: 100,
                trigger_up: 101,
            });
        });
        let mut audit = AuditBuffer::new();

        let stats = link_triggers(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 2);

        store.read(|data| {
            let down = data
                .triggers
                .iter()
                .find(|t| t.template_id == Some(100))
                .unwrap()
                .trigger_id;
            let up = data
                .triggers
                .iter()
                .find(|t| t.template_id == Some(101))
                .unwrap()
                .trigger_id;
            assert!(data
                .trigger_deps
                .iter()
                .any(|d| d.trigger_down == down && d.trigger_up == up));
        });
    }

    #[test]
    fn template_tags_replace_host_tags_on_link() {
        let store = MemoryStore::new();
        seed_basic(&store);
        store.seed(|data| {
            data.trigger_tags.push(TriggerTagRow {
                tag_id: 1,
                trigger_id: 100,
                tag: "scope".into(),
                value: "performance".into(),
            });
            data.triggers
                .push(TriggerRow::new(500, "CPU high", "{5000}>5"));
            data.functions.push(function(5000, 500, 50, "avg,5m"));
            data.trigger_tags.push(TriggerTagRow {
                tag_id: 2,
                trigger_id: 500,
                tag: "local".into(),
                value: "yes".into(),
            });
        });
        let mut audit = AuditBuffer::new();

        link_triggers(&store, &mut audit, 5, &[1]).unwrap();

        store.read(|data| {
            let tags: Vec<_> = data
                .trigger_tags
                .iter()
                .filter(|t| t.trigger_id == 500)
                .collect();
            assert_eq!(tags.len(), 1);
            assert_eq!(tags[0].tag, "scope");
        });
    }
}
