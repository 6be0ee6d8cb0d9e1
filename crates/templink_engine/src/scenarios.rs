//! Web-scenario linking.
//!
//! Pairing is by scenario name on the target host. A paired scenario is
//! only re-pointed at its template counterpart; the validator has already
//! guaranteed step parity. An unpaired scenario is copied whole: steps,
//! fields on both levels, backing-item links resolved by item key across
//! hosts, and tags.

use crate::error::LinkResult;
use std::collections::HashMap;
use templink_audit::{AuditBuffer, ResourceType};
use templink_model::{
    HostId, IdDomain, ItemId, ScenarioItemRow, StepItemRow, WebFieldRow, WebScenarioRow, WebTagRow,
};
use templink_store::LinkStore;
use tracing::{debug, warn};

/// Counters for one web-scenario family pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioLinkStats {
    /// New scenarios copied to the host.
    pub added: usize,
    /// Host scenarios re-pointed at their template counterpart.
    pub updated: usize,
}

/// Copies the web scenarios of `template_ids` onto `host_id`.
pub fn link_scenarios(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<ScenarioLinkStats> {
    let template_scenarios = store.scenarios_of_hosts(template_ids)?;
    if template_scenarios.is_empty() {
        return Ok(ScenarioLinkStats::default());
    }
    debug!(
        host_id,
        scenarios = template_scenarios.len(),
        "linking web scenarios"
    );

    let host_scenarios = store.scenarios_of_hosts(&[host_id])?;
    let mut stats = ScenarioLinkStats::default();
    let mut to_copy: Vec<&WebScenarioRow> = Vec::new();

    for template in &template_scenarios {
        match host_scenarios.iter().find(|s| s.name == template.name) {
            Some(existing) => {
                stats.updated += 1;
                store.update_scenario_template(existing.scenario_id, template.scenario_id)?;
                audit.record_update(existing.scenario_id, &existing.name, ResourceType::Scenario);
                audit.update_field(
                    existing.scenario_id,
                    "httptest.templateid",
                    template.scenario_id,
                )?;
            }
            None => {
                stats.added += 1;
                to_copy.push(template);
            }
        }
    }

    copy_scenarios(store, audit, host_id, &to_copy)?;
    Ok(stats)
}

fn copy_scenarios(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    host_id: HostId,
    templates: &[&WebScenarioRow],
) -> LinkResult<()> {
    if templates.is_empty() {
        return Ok(());
    }

    let template_ids: Vec<u64> = templates.iter().map(|s| s.scenario_id).collect();
    let steps = store.scenario_steps(&template_ids)?;
    let step_ids: Vec<u64> = steps.iter().map(|s| s.step_id).collect();
    let scenario_fields = store.scenario_fields(&template_ids)?;
    let step_fields = store.step_fields(&step_ids)?;
    let tags = store.scenario_tags(&template_ids)?;
    let scenario_items = store.scenario_items(&template_ids)?;
    let step_items = store.step_items(&step_ids)?;

    // resolve backing items onto the host by key
    let mut referenced: Vec<ItemId> = scenario_items
        .iter()
        .map(|si| si.item_id)
        .chain(step_items.iter().map(|si| si.item_id))
        .collect();
    referenced.sort_unstable();
    referenced.dedup();
    let template_items = store.items_by_ids(&referenced)?;
    let host_items = store.items_by_hosts(&[host_id])?;
    let host_by_key: HashMap<&str, ItemId> = host_items
        .iter()
        .map(|i| (i.key.as_str(), i.item_id))
        .collect();
    let resolve = |template_item: ItemId| -> Option<ItemId> {
        template_items
            .iter()
            .find(|i| i.item_id == template_item)
            .and_then(|i| host_by_key.get(i.key.as_str()))
            .copied()
    };

    let field_count = scenario_fields.len() + step_fields.len();
    let item_link_count = scenario_items.len() + step_items.len();
    let mut scenario_id = store.reserve_ids(IdDomain::Scenarios, templates.len() as u64)?;
    let mut step_id = store.reserve_ids(IdDomain::Steps, steps.len() as u64)?;
    let mut field_id = store.reserve_ids(IdDomain::WebFields, field_count as u64)?;
    let mut item_link_id = store.reserve_ids(IdDomain::WebItems, item_link_count as u64)?;
    let mut tag_id = store.reserve_ids(IdDomain::WebTags, tags.len() as u64)?;

    let mut new_scenarios = Vec::new();
    let mut new_steps = Vec::new();
    let mut new_scenario_fields = Vec::new();
    let mut new_step_fields = Vec::new();
    let mut new_scenario_items = Vec::new();
    let mut new_step_items = Vec::new();
    let mut new_tags = Vec::new();

    for template in templates {
        let new_scenario_id = scenario_id;
        scenario_id += 1;

        let mut row = (*template).clone();
        row.scenario_id = new_scenario_id;
        row.host_id = host_id;
        row.template_id = Some(template.scenario_id);

        audit.record_add(new_scenario_id, &row.name, ResourceType::Scenario);
        audit.update_field(
            new_scenario_id,
            "httptest.templateid",
            template.scenario_id,
        )?;
        new_scenarios.push(row);

        for field in scenario_fields
            .iter()
            .filter(|f| f.owner_id == template.scenario_id)
        {
            new_scenario_fields.push(WebFieldRow {
                field_id,
                owner_id: new_scenario_id,
                kind: field.kind,
                name: field.name.clone(),
                value: field.value.clone(),
            });
            field_id += 1;
        }

        for item_link in scenario_items
            .iter()
            .filter(|si| si.scenario_id == template.scenario_id)
        {
            let Some(item_id) = resolve(item_link.item_id) else {
                warn!(
                    host_id,
                    item_id = item_link.item_id,
                    "scenario item has no key-matching host item"
                );
                continue;
            };
            new_scenario_items.push(ScenarioItemRow {
                row_id: item_link_id,
                scenario_id: new_scenario_id,
                item_id,
                item_purpose: item_link.item_purpose,
            });
            item_link_id += 1;
        }

        for tag in tags.iter().filter(|t| t.scenario_id == template.scenario_id) {
            new_tags.push(WebTagRow {
                tag_id,
                scenario_id: new_scenario_id,
                tag: tag.tag.clone(),
                value: tag.value.clone(),
            });
            tag_id += 1;
        }

        for step in steps
            .iter()
            .filter(|s| s.scenario_id == template.scenario_id)
        {
            let new_step_id = step_id;
            step_id += 1;

            let mut step_row = step.clone();
            step_row.step_id = new_step_id;
            step_row.scenario_id = new_scenario_id;

            // step audit paths are scoped by the step ordinal within this
            // scenario, so two scenarios can never collide
            audit.update_field(
                new_scenario_id,
                format!("httptest.steps[{}].name", step.no),
                step.name.as_str(),
            )?;
            audit.update_field(
                new_scenario_id,
                format!("httptest.steps[{}].url", step.no),
                step.url.as_str(),
            )?;

            for field in step_fields.iter().filter(|f| f.owner_id == step.step_id) {
                new_step_fields.push(WebFieldRow {
                    field_id,
                    owner_id: new_step_id,
                    kind: field.kind,
                    name: field.name.clone(),
                    value: field.value.clone(),
                });
                audit.update_field(
                    new_scenario_id,
                    format!(
                        "httptest.steps[{}].{}[{}].name",
                        step.no,
                        field.kind.audit_segment(),
                        field_id
                    ),
                    field.name.as_str(),
                )?;
                field_id += 1;
            }

            for item_link in step_items.iter().filter(|si| si.step_id == step.step_id) {
                let Some(item_id) = resolve(item_link.item_id) else {
                    warn!(
                        host_id,
                        item_id = item_link.item_id,
                        "step item has no key-matching host item"
                    );
                    continue;
                };
                new_step_items.push(StepItemRow {
                    row_id: item_link_id,
                    step_id: new_step_id,
                    item_id,
                    item_purpose: item_link.item_purpose,
                });
                item_link_id += 1;
            }

            new_steps.push(step_row);
        }
    }

    store.insert_scenarios(&new_scenarios)?;
    store.insert_steps(&new_steps)?;
    store.insert_step_fields(&new_step_fields)?;
    store.insert_step_items(&new_step_items)?;
    store.insert_scenario_fields(&new_scenario_fields)?;
    store.insert_scenario_items(&new_scenario_items)?;
    store.insert_web_tags(&new_tags)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use templink_model::{FieldKind, HostRow, ItemRow, ItemType, WebStepRow};
    use templink_store::MemoryStore;

    fn seed_template_scenario(store: &MemoryStore) {
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));
            data.scenarios.push(WebScenarioRow::new(100, 1, "Login"));
            data.steps.push(WebStepRow {
                step_id: 110,
                scenario_id: 100,
                name: "GET /".into(),
                no: 1,
                url: "http://localhost/".into(),
                timeout: "15s".into(),
                posts: String::new(),
                required: String::new(),
                status_codes: "200".into(),
                follow_redirects: 1,
                retrieve_mode: 0,
                post_type: 0,
            });
            data.step_fields.push(WebFieldRow {
                field_id: 120,
                owner_id: 110,
                kind: FieldKind::Header,
                name: "User-Agent".into(),
                value: "templink".into(),
            });

            let mut template_item = ItemRow::new(10, 1, "web.test.fail[Login]");
            template_item.item_type = ItemType::HttpTest;
            data.items.push(template_item);
            data.scenario_items.push(ScenarioItemRow {
                row_id: 130,
                scenario_id: 100,
                item_id: 10,
                item_purpose: 3,
            });
        });
    }

    #[test]
    fn unmatched_scenario_is_copied_with_steps_and_items() {
        let store = MemoryStore::new();
        seed_template_scenario(&store);
        store.seed(|data| {
            let mut host_item = ItemRow::new(50, 5, "web.test.fail[Login]");
            host_item.item_type = ItemType::HttpTest;
            data.items.push(host_item);
        });
        let mut audit = AuditBuffer::new();

        let stats = link_scenarios(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 1);

        store.read(|data| {
            let copied = data
                .scenarios
                .iter()
                .find(|s| s.template_id == Some(100))
                .expect("copied scenario");
            assert_eq!(copied.host_id, 5);

            let copied_steps: Vec<_> = data
                .steps
                .iter()
                .filter(|s| s.scenario_id == copied.scenario_id)
                .collect();
            assert_eq!(copied_steps.len(), 1);

            let copied_fields: Vec<_> = data
                .step_fields
                .iter()
                .filter(|f| f.owner_id == copied_steps[0].step_id)
                .collect();
            assert_eq!(copied_fields.len(), 1);
            assert_eq!(copied_fields[0].name, "User-Agent");

            // scenario item resolved onto the host by key
            let copied_items: Vec<_> = data
                .scenario_items
                .iter()
                .filter(|si| si.scenario_id == copied.scenario_id)
                .collect();
            assert_eq!(copied_items.len(), 1);
            assert_eq!(copied_items[0].item_id, 50);
        });
    }

    #[test]
    fn same_named_scenario_is_repointed_only() {
        let store = MemoryStore::new();
        seed_template_scenario(&store);
        store.seed(|data| {
            data.scenarios.push(WebScenarioRow::new(500, 5, "Login"));
        });
        let mut audit = AuditBuffer::new();

        let stats = link_scenarios(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 0);
        assert_eq!(stats.updated, 1);

        store.read(|data| {
            assert_eq!(data.scenarios.len(), 2);
            let host_scenario = data
                .scenarios
                .iter()
                .find(|s| s.scenario_id == 500)
                .unwrap();
            assert_eq!(host_scenario.template_id, Some(100));
            // nothing was copied
            assert!(data.steps.iter().all(|s| s.scenario_id == 100));
        });
    }
}
