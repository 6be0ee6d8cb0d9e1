//! Host-prototype linking: scalar diff plus five sub-collection diffs.
//!
//! A template-side prototype pairs with the host-side prototype hanging off
//! the mirrored discovery rule whose `host` string matches. Paired
//! prototypes diff their linked templates (presence by template id), group
//! prototypes (`(name, group)` identity), macros (name identity, content
//! compared), tags (positional replacement, ids preserved) and interfaces
//! (positional pairing, per-column flags, SNMP detail row handled apart).

use crate::error::LinkResult;
use templink_audit::{AuditBuffer, ResourceType};
use templink_model::{
    GroupPrototypeId, GroupPrototypeRow, HostId, HostPrototypeRow, HostTagRow, IdDomain,
    InterfaceId, InterfaceType, InterfaceUpdateFlags, ItemId, LinkId, MacroId, MacroUpdateFlags,
    PrototypeInterfaceRow, PrototypeMacroRow, PrototypeUpdateFlags, SnmpUpdateFlags, TagId,
    TagUpdateFlags, TemplateLinkRow,
};
use templink_store::{
    GroupPrototypeUpdate, InterfaceUpdate, LinkStore, MacroUpdate, PrototypeUpdate, SnmpChange,
    TagUpdate,
};
use tracing::debug;

/// Counters for one host-prototype family pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PrototypeLinkStats {
    /// New prototypes created on the host.
    pub added: usize,
    /// Existing prototypes re-synced from the template.
    pub updated: usize,
}

/// Everything to write after diffing, collected first so id blocks can be
/// reserved in bulk.
#[derive(Default)]
struct WritePlan {
    new_prototypes: Vec<(HostPrototypeRow, ItemId)>,
    prototype_updates: Vec<PrototypeUpdate>,
    link_inserts: Vec<TemplateLinkRow>,
    link_deletes: Vec<LinkId>,
    group_inserts: Vec<GroupPrototypeRow>,
    group_updates: Vec<GroupPrototypeUpdate>,
    group_deletes: Vec<GroupPrototypeId>,
    macro_inserts: Vec<PrototypeMacroRow>,
    macro_updates: Vec<MacroUpdate>,
    macro_deletes: Vec<MacroId>,
    tag_inserts: Vec<HostTagRow>,
    tag_updates: Vec<TagUpdate>,
    tag_deletes: Vec<TagId>,
    interface_inserts: Vec<PrototypeInterfaceRow>,
    interface_updates: Vec<InterfaceUpdate>,
    interface_deletes: Vec<InterfaceId>,
    snmp_deletes: Vec<InterfaceId>,
}

/// Copies the host prototypes of the templates' discovery rules onto the
/// mirrored rules of `host_id`.
pub fn link_host_prototypes(
    store: &dyn LinkStore,
    audit: &mut AuditBuffer,
    host_id: HostId,
    template_ids: &[HostId],
) -> LinkResult<PrototypeLinkStats> {
    let template_side = store.template_prototypes(host_id, template_ids)?;
    if template_side.is_empty() {
        return Ok(PrototypeLinkStats::default());
    }
    debug!(
        host_id,
        prototypes = template_side.len(),
        "linking host prototypes"
    );

    let mut rule_ids: Vec<ItemId> = template_side.iter().map(|t| t.host_rule_item_id).collect();
    rule_ids.sort_unstable();
    rule_ids.dedup();
    let host_side = store.prototypes_by_rules(&rule_ids)?;

    // (template prototype, rule, partner)
    let mut pairs: Vec<(&HostPrototypeRow, ItemId, Option<&HostPrototypeRow>)> = Vec::new();
    for template in &template_side {
        let partner = host_side
            .iter()
            .find(|h| {
                h.host_rule_item_id == template.host_rule_item_id
                    && h.prototype.host == template.prototype.host
            })
            .map(|h| &h.prototype);
        pairs.push((&template.prototype, template.host_rule_item_id, partner));
    }

    let template_host_ids: Vec<HostId> =
        pairs.iter().map(|(t, _, _)| t.host_id).collect();
    let partner_host_ids: Vec<HostId> = pairs
        .iter()
        .filter_map(|(_, _, p)| p.map(|p| p.host_id))
        .collect();

    // sub-collection snapshots, both sides in two passes
    let template_links = store.template_links(&template_host_ids)?;
    let host_links = store.template_links(&partner_host_ids)?;
    let template_groups = store.group_prototypes(&template_host_ids)?;
    let host_groups = store.group_prototypes(&partner_host_ids)?;
    let template_macros = store.prototype_macros(&template_host_ids)?;
    let host_macros = store.prototype_macros(&partner_host_ids)?;
    let template_tags = store.host_tags(&template_host_ids)?;
    let host_tags = store.host_tags(&partner_host_ids)?;
    let template_interfaces = store.prototype_interfaces(&template_host_ids)?;
    let host_interfaces = store.prototype_interfaces(&partner_host_ids)?;

    let mut stats = PrototypeLinkStats::default();
    let mut plan = WritePlan::default();

    let insert_count = pairs.iter().filter(|(_, _, p)| p.is_none()).count();
    let mut next_host_id = store.reserve_ids(IdDomain::Hosts, insert_count as u64)?;

    for (template, rule_item_id, partner) in &pairs {
        let owner_id = match partner {
            Some(existing) => {
                stats.updated += 1;
                let mut dirty = PrototypeUpdateFlags::none();
                if template.name != existing.name {
                    dirty.set(PrototypeUpdateFlags::NAME);
                }
                if template.status != existing.status {
                    dirty.set(PrototypeUpdateFlags::STATUS);
                }
                if template.discover != existing.discover {
                    dirty.set(PrototypeUpdateFlags::DISCOVER);
                }
                if template.custom_interfaces != existing.custom_interfaces {
                    dirty.set(PrototypeUpdateFlags::CUSTOM_INTERFACES);
                }
                plan.prototype_updates.push(PrototypeUpdate {
                    host_id: existing.host_id,
                    template_id: template.host_id,
                    dirty,
                    name: template.name.clone(),
                    status: template.status,
                    discover: template.discover,
                    custom_interfaces: template.custom_interfaces,
                });
                audit.record_update(existing.host_id, &existing.host, ResourceType::HostPrototype);
                existing.host_id
            }
            None => {
                stats.added += 1;
                let new_id = next_host_id;
                next_host_id += 1;
                let mut row = (*template).clone();
                row.host_id = new_id;
                row.template_id = Some(template.host_id);
                audit.record_add(new_id, &row.host, ResourceType::HostPrototype);
                plan.new_prototypes.push((row, *rule_item_id));
                new_id
            }
        };

        let tpl = |rows: &[TemplateLinkRow]| -> Vec<HostId> {
            rows.iter()
                .filter(|l| l.host_id == template.host_id)
                .map(|l| l.template_id)
                .collect()
        };
        diff_linked_templates(
            audit,
            &mut plan,
            owner_id,
            &tpl(&template_links),
            partner.map(|p| {
                host_links
                    .iter()
                    .filter(|l| l.host_id == p.host_id)
                    .collect::<Vec<_>>()
            }),
        )?;

        diff_group_prototypes(
            audit,
            &mut plan,
            owner_id,
            template_groups
                .iter()
                .filter(|g| g.host_id == template.host_id),
            partner
                .map(|p| {
                    host_groups
                        .iter()
                        .filter(|g| g.host_id == p.host_id)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
        )?;

        diff_macros(
            audit,
            &mut plan,
            owner_id,
            template_macros
                .iter()
                .filter(|m| m.host_id == template.host_id),
            partner
                .map(|p| {
                    host_macros
                        .iter()
                        .filter(|m| m.host_id == p.host_id)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
        )?;

        diff_tags(
            audit,
            &mut plan,
            owner_id,
            template_tags
                .iter()
                .filter(|t| t.host_id == template.host_id)
                .collect::<Vec<_>>(),
            partner
                .map(|p| {
                    host_tags
                        .iter()
                        .filter(|t| t.host_id == p.host_id)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
        )?;

        diff_interfaces(
            audit,
            &mut plan,
            owner_id,
            template_interfaces
                .iter()
                .filter(|i| i.host_id == template.host_id)
                .collect::<Vec<_>>(),
            partner
                .map(|p| {
                    host_interfaces
                        .iter()
                        .filter(|i| i.host_id == p.host_id)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
        )?;
    }

    execute_plan(store, plan)?;
    Ok(stats)
}

/// Presence-only diff on linked template ids.
fn diff_linked_templates(
    audit: &mut AuditBuffer,
    plan: &mut WritePlan,
    owner_id: HostId,
    wanted: &[HostId],
    existing: Option<Vec<&TemplateLinkRow>>,
) -> LinkResult<()> {
    let existing = existing.unwrap_or_default();
    for template_id in wanted {
        if !existing.iter().any(|l| l.template_id == *template_id) {
            plan.link_inserts.push(TemplateLinkRow {
                link_id: 0,
                host_id: owner_id,
                template_id: *template_id,
            });
            audit.update_field(
                owner_id,
                format!("hostprototype.templates[{template_id}]"),
                *template_id,
            )?;
        }
    }
    for link in existing {
        if !wanted.contains(&link.template_id) {
            plan.link_deletes.push(link.link_id);
            audit.update_field(
                owner_id,
                format!("hostprototype.templates[{}]", link.template_id),
                "unlinked",
            )?;
        }
    }
    Ok(())
}

/// `(name, group)` identity; only the parent pointer is content.
fn diff_group_prototypes<'a>(
    audit: &mut AuditBuffer,
    plan: &mut WritePlan,
    owner_id: HostId,
    wanted: impl Iterator<Item = &'a GroupPrototypeRow>,
    existing: Vec<&GroupPrototypeRow>,
) -> LinkResult<()> {
    let mut claimed: Vec<GroupPrototypeId> = Vec::new();
    for template_group in wanted {
        let partner = existing.iter().find(|g| {
            g.name == template_group.name && g.group_id == template_group.group_id
        });
        match partner {
            Some(host_group) => {
                claimed.push(host_group.group_prototype_id);
                plan.group_updates.push(GroupPrototypeUpdate {
                    group_prototype_id: host_group.group_prototype_id,
                    template_id: template_group.group_prototype_id,
                });
            }
            None => {
                plan.group_inserts.push(GroupPrototypeRow {
                    group_prototype_id: 0,
                    host_id: owner_id,
                    name: template_group.name.clone(),
                    group_id: template_group.group_id,
                    template_id: Some(template_group.group_prototype_id),
                });
                audit.update_field(
                    owner_id,
                    format!(
                        "hostprototype.groupLinks[{}]",
                        template_group.group_prototype_id
                    ),
                    template_group.name.as_str(),
                )?;
            }
        }
    }
    for host_group in existing {
        if !claimed.contains(&host_group.group_prototype_id) {
            plan.group_deletes.push(host_group.group_prototype_id);
            audit.update_field(
                owner_id,
                format!(
                    "hostprototype.groupLinks[{}]",
                    host_group.group_prototype_id
                ),
                "deleted",
            )?;
        }
    }
    Ok(())
}

/// Macro-name identity; value, description and type are content.
fn diff_macros<'a>(
    audit: &mut AuditBuffer,
    plan: &mut WritePlan,
    owner_id: HostId,
    wanted: impl Iterator<Item = &'a PrototypeMacroRow>,
    existing: Vec<&PrototypeMacroRow>,
) -> LinkResult<()> {
    let mut claimed: Vec<MacroId> = Vec::new();
    for template_macro in wanted {
        let partner = existing
            .iter()
            .find(|m| m.macro_name == template_macro.macro_name);
        match partner {
            Some(host_macro) => {
                claimed.push(host_macro.macro_id);
                let mut dirty = MacroUpdateFlags::none();
                if host_macro.value != template_macro.value {
                    dirty.set(MacroUpdateFlags::VALUE);
                    audit.update_field(
                        owner_id,
                        format!("hostprototype.macros[{}].value", host_macro.macro_id),
                        template_macro.value.as_str(),
                    )?;
                }
                if host_macro.description != template_macro.description {
                    dirty.set(MacroUpdateFlags::DESCRIPTION);
                    audit.update_field(
                        owner_id,
                        format!("hostprototype.macros[{}].description", host_macro.macro_id),
                        template_macro.description.as_str(),
                    )?;
                }
                if host_macro.macro_type != template_macro.macro_type {
                    dirty.set(MacroUpdateFlags::TYPE);
                    audit.update_field(
                        owner_id,
                        format!("hostprototype.macros[{}].type", host_macro.macro_id),
                        template_macro.macro_type,
                    )?;
                }
                if !dirty.is_empty() {
                    plan.macro_updates.push(MacroUpdate {
                        macro_id: host_macro.macro_id,
                        dirty,
                        value: template_macro.value.clone(),
                        description: template_macro.description.clone(),
                        macro_type: template_macro.macro_type,
                    });
                }
            }
            None => {
                plan.macro_inserts.push(PrototypeMacroRow {
                    macro_id: 0,
                    host_id: owner_id,
                    macro_name: template_macro.macro_name.clone(),
                    value: template_macro.value.clone(),
                    description: template_macro.description.clone(),
                    macro_type: template_macro.macro_type,
                });
                audit.update_field(
                    owner_id,
                    format!("hostprototype.macros[{}].macro", template_macro.macro_id),
                    template_macro.macro_name.as_str(),
                )?;
                audit.update_field(
                    owner_id,
                    format!("hostprototype.macros[{}].value", template_macro.macro_id),
                    template_macro.value.as_str(),
                )?;
            }
        }
    }
    for host_macro in existing {
        if !claimed.contains(&host_macro.macro_id) {
            plan.macro_deletes.push(host_macro.macro_id);
            audit.update_field(
                owner_id,
                format!("hostprototype.macros[{}]", host_macro.macro_id),
                "deleted",
            )?;
        }
    }
    Ok(())
}

/// Positional replacement: host tags are overwritten one-for-one in order,
/// template surplus appended, host surplus deleted. Keeps tag ids stable
/// for audit attribution.
fn diff_tags(
    audit: &mut AuditBuffer,
    plan: &mut WritePlan,
    owner_id: HostId,
    wanted: Vec<&HostTagRow>,
    existing: Vec<&HostTagRow>,
) -> LinkResult<()> {
    for (index, template_tag) in wanted.iter().enumerate() {
        match existing.get(index) {
            Some(host_tag) => {
                let mut dirty = TagUpdateFlags::none();
                dirty.set(TagUpdateFlags::TAG);
                dirty.set(TagUpdateFlags::VALUE);
                plan.tag_updates.push(TagUpdate {
                    tag_id: host_tag.tag_id,
                    dirty,
                    tag: template_tag.tag.clone(),
                    value: template_tag.value.clone(),
                });
                audit.update_field(
                    owner_id,
                    format!("hostprototype.tags[{}].tag", host_tag.tag_id),
                    template_tag.tag.as_str(),
                )?;
            }
            None => {
                plan.tag_inserts.push(HostTagRow {
                    tag_id: 0,
                    host_id: owner_id,
                    tag: template_tag.tag.clone(),
                    value: template_tag.value.clone(),
                });
            }
        }
    }
    for host_tag in existing.iter().skip(wanted.len()) {
        plan.tag_deletes.push(host_tag.tag_id);
        audit.update_field(
            owner_id,
            format!("hostprototype.tags[{}]", host_tag.tag_id),
            "deleted",
        )?;
    }
    Ok(())
}

/// Positional pairing; every column gets its own flag, and the SNMP detail
/// row diffs with its own flag family.
fn diff_interfaces(
    audit: &mut AuditBuffer,
    plan: &mut WritePlan,
    owner_id: HostId,
    wanted: Vec<&PrototypeInterfaceRow>,
    existing: Vec<&PrototypeInterfaceRow>,
) -> LinkResult<()> {
    for (index, template_iface) in wanted.iter().enumerate() {
        match existing.get(index) {
            Some(host_iface) => {
                let mut dirty = InterfaceUpdateFlags::none();
                if template_iface.main != host_iface.main {
                    dirty.set(InterfaceUpdateFlags::MAIN);
                }
                if template_iface.interface_type != host_iface.interface_type {
                    dirty.set(InterfaceUpdateFlags::TYPE);
                }
                if template_iface.use_ip != host_iface.use_ip {
                    dirty.set(InterfaceUpdateFlags::USEIP);
                }
                if template_iface.ip != host_iface.ip {
                    dirty.set(InterfaceUpdateFlags::IP);
                }
                if template_iface.dns != host_iface.dns {
                    dirty.set(InterfaceUpdateFlags::DNS);
                }
                if template_iface.port != host_iface.port {
                    dirty.set(InterfaceUpdateFlags::PORT);
                }

                let snmp = match (&template_iface.snmp, &host_iface.snmp) {
                    (None, None) => SnmpChange::None,
                    (Some(details), None) => SnmpChange::Create(details.clone()),
                    (None, Some(_)) => {
                        plan.snmp_deletes.push(host_iface.interface_id);
                        SnmpChange::None
                    }
                    (Some(template_snmp), Some(host_snmp)) => {
                        let mut snmp_dirty = SnmpUpdateFlags::none();
                        if template_snmp.version != host_snmp.version {
                            snmp_dirty.set(SnmpUpdateFlags::VERSION);
                        }
                        if template_snmp.bulk != host_snmp.bulk {
                            snmp_dirty.set(SnmpUpdateFlags::BULK);
                        }
                        if template_snmp.community != host_snmp.community {
                            snmp_dirty.set(SnmpUpdateFlags::COMMUNITY);
                        }
                        if template_snmp.security_name != host_snmp.security_name {
                            snmp_dirty.set(SnmpUpdateFlags::SECNAME);
                        }
                        if template_snmp.security_level != host_snmp.security_level {
                            snmp_dirty.set(SnmpUpdateFlags::SECLEVEL);
                        }
                        if template_snmp.auth_passphrase != host_snmp.auth_passphrase {
                            snmp_dirty.set(SnmpUpdateFlags::AUTHPASS);
                        }
                        if template_snmp.priv_passphrase != host_snmp.priv_passphrase {
                            snmp_dirty.set(SnmpUpdateFlags::PRIVPASS);
                        }
                        if template_snmp.auth_protocol != host_snmp.auth_protocol {
                            snmp_dirty.set(SnmpUpdateFlags::AUTHPROTO);
                        }
                        if template_snmp.priv_protocol != host_snmp.priv_protocol {
                            snmp_dirty.set(SnmpUpdateFlags::PRIVPROTO);
                        }
                        if template_snmp.context_name != host_snmp.context_name {
                            snmp_dirty.set(SnmpUpdateFlags::CONTEXT);
                        }
                        if snmp_dirty.is_empty() {
                            SnmpChange::None
                        } else {
                            SnmpChange::Update {
                                dirty: snmp_dirty,
                                details: template_snmp.clone(),
                            }
                        }
                    }
                };

                let snmp_changed = !matches!(snmp, SnmpChange::None);
                if !dirty.is_empty() || snmp_changed {
                    audit.update_field(
                        owner_id,
                        format!(
                            "hostprototype.interfaces[{}].ip",
                            host_iface.interface_id
                        ),
                        template_iface.ip.as_str(),
                    )?;
                    plan.interface_updates.push(InterfaceUpdate {
                        interface_id: host_iface.interface_id,
                        dirty,
                        main: template_iface.main,
                        interface_type: template_iface.interface_type,
                        use_ip: template_iface.use_ip,
                        ip: template_iface.ip.clone(),
                        dns: template_iface.dns.clone(),
                        port: template_iface.port.clone(),
                        snmp,
                    });
                }
            }
            None => {
                let mut row = (*template_iface).clone();
                row.interface_id = 0;
                row.host_id = owner_id;
                plan.interface_inserts.push(row);
            }
        }
    }
    for host_iface in existing.iter().skip(wanted.len()) {
        if host_iface.interface_type == InterfaceType::Snmp {
            plan.snmp_deletes.push(host_iface.interface_id);
        }
        plan.interface_deletes.push(host_iface.interface_id);
        audit.update_field(
            owner_id,
            format!("hostprototype.interfaces[{}]", host_iface.interface_id),
            "deleted",
        )?;
    }
    Ok(())
}

/// Reserves id blocks and applies the plan, parents before children.
fn execute_plan(store: &dyn LinkStore, mut plan: WritePlan) -> LinkResult<()> {
    store.insert_host_prototypes(&plan.new_prototypes)?;
    store.update_host_prototypes(&plan.prototype_updates)?;

    if !plan.link_inserts.is_empty() {
        let mut link_id =
            store.reserve_ids(IdDomain::TemplateLinks, plan.link_inserts.len() as u64)?;
        for row in &mut plan.link_inserts {
            row.link_id = link_id;
            link_id += 1;
        }
        store.insert_template_links(&plan.link_inserts)?;
    }
    store.delete_links_by_id(&plan.link_deletes)?;

    if !plan.group_inserts.is_empty() {
        let mut group_id =
            store.reserve_ids(IdDomain::GroupPrototypes, plan.group_inserts.len() as u64)?;
        for row in &mut plan.group_inserts {
            row.group_prototype_id = group_id;
            group_id += 1;
        }
        store.insert_group_prototypes(&plan.group_inserts)?;
    }
    store.update_group_prototypes(&plan.group_updates)?;
    store.delete_group_prototypes(&plan.group_deletes)?;

    if !plan.macro_inserts.is_empty() {
        let mut macro_id =
            store.reserve_ids(IdDomain::HostMacros, plan.macro_inserts.len() as u64)?;
        for row in &mut plan.macro_inserts {
            row.macro_id = macro_id;
            macro_id += 1;
        }
        store.insert_prototype_macros(&plan.macro_inserts)?;
    }
    store.update_prototype_macros(&plan.macro_updates)?;
    store.delete_prototype_macros(&plan.macro_deletes)?;

    if !plan.tag_inserts.is_empty() {
        let mut tag_id = store.reserve_ids(IdDomain::HostTags, plan.tag_inserts.len() as u64)?;
        for row in &mut plan.tag_inserts {
            row.tag_id = tag_id;
            tag_id += 1;
        }
        store.insert_host_tags(&plan.tag_inserts)?;
    }
    store.update_host_tags(&plan.tag_updates)?;
    store.delete_host_tags(&plan.tag_deletes)?;

    if !plan.interface_inserts.is_empty() {
        let mut interface_id =
            store.reserve_ids(IdDomain::Interfaces, plan.interface_inserts.len() as u64)?;
        for row in &mut plan.interface_inserts {
            row.interface_id = interface_id;
            interface_id += 1;
        }
        store.insert_prototype_interfaces(&plan.interface_inserts)?;
    }
    store.delete_snmp_details(&plan.snmp_deletes)?;
    store.update_prototype_interfaces(&plan.interface_updates)?;
    store.delete_prototype_interfaces(&plan.interface_deletes)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use templink_model::discovery::HostDiscoveryRow;
    use templink_model::{HostRow, ItemKind, ItemRow};
    use templink_store::MemoryStore;

    /// Template T1 (host 1) with rule item 20, prototype host 30
    /// `{#VM.NAME}`; host 5 mirrors the rule as item 60.
    fn seed_rule_and_prototype(store: &MemoryStore) {
        store.seed(|data| {
            data.hosts.push(HostRow::template(1, "T1"));
            data.hosts.push(HostRow::regular(5, "web-1"));

            let mut template_rule = ItemRow::new(20, 1, "vm.discovery");
            template_rule.flags = ItemKind::Rule;
            data.items.push(template_rule);

            let mut host_rule = ItemRow::new(60, 5, "vm.discovery");
            host_rule.flags = ItemKind::Rule;
            host_rule.template_item_id = Some(20);
            data.items.push(host_rule);

            data.host_prototypes.push(HostPrototypeRow {
                host_id: 30,
                host: "{#VM.NAME}".into(),
                name: "{#VM.NAME}".into(),
                status: 0,
                discover: 0,
                custom_interfaces: 0,
                template_id: None,
            });
            data.host_discovery.push(HostDiscoveryRow {
                host_id: 30,
                parent_host_id: None,
                parent_item_id: Some(20),
            });
        });
    }

    fn macro_row(macro_id: u64, host_id: u64, name: &str, value: &str) -> PrototypeMacroRow {
        PrototypeMacroRow {
            macro_id,
            host_id,
            macro_name: name.into(),
            value: value.into(),
            description: String::new(),
            macro_type: 0,
        }
    }

    #[test]
    fn unmatched_prototype_is_created_with_sub_collections() {
        let store = MemoryStore::new();
        seed_rule_and_prototype(&store);
        store.seed(|data| {
            data.host_macros.push(macro_row(700, 30, "{$X}", "1"));
            data.host_tags.push(HostTagRow {
                tag_id: 800,
                host_id: 30,
                tag: "env".into(),
                value: "prod".into(),
            });
        });
        let mut audit = AuditBuffer::new();

        let stats = link_host_prototypes(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(stats.updated, 0);

        store.read(|data| {
            let created = data
                .host_prototypes
                .iter()
                .find(|p| p.template_id == Some(30))
                .expect("created prototype");
            assert!(data.host_discovery.iter().any(
                |d| d.host_id == created.host_id && d.parent_item_id == Some(60)
            ));
            assert!(data
                .host_macros
                .iter()
                .any(|m| m.host_id == created.host_id && m.macro_name == "{$X}"));
            assert!(data
                .host_tags
                .iter()
                .any(|t| t.host_id == created.host_id && t.tag == "env"));
        });
    }

    #[test]
    fn macro_sub_diff_adds_deletes_and_keeps() {
        let store = MemoryStore::new();
        seed_rule_and_prototype(&store);
        store.seed(|data| {
            // template side: {$X}=1, {$Y}=2
            data.host_macros.push(macro_row(700, 30, "{$X}", "1"));
            data.host_macros.push(macro_row(701, 30, "{$Y}", "2"));

            // host side prototype from a prior link: {$X}=1, {$Z}=3
            data.host_prototypes.push(HostPrototypeRow {
                host_id: 90,
                host: "{#VM.NAME}".into(),
                name: "{#VM.NAME}".into(),
                status: 0,
                discover: 0,
                custom_interfaces: 0,
                template_id: Some(30),
            });
            data.host_discovery.push(HostDiscoveryRow {
                host_id: 90,
                parent_host_id: None,
                parent_item_id: Some(60),
            });
            data.host_macros.push(macro_row(900, 90, "{$X}", "1"));
            data.host_macros.push(macro_row(901, 90, "{$Z}", "3"));
        });
        let mut audit = AuditBuffer::new();

        let stats = link_host_prototypes(&store, &mut audit, 5, &[1]).unwrap();
        assert_eq!(stats.updated, 1);

        store.read(|data| {
            let macros: Vec<_> = data
                .host_macros
                .iter()
                .filter(|m| m.host_id == 90)
                .collect();
            let names: Vec<&str> = macros.iter().map(|m| m.macro_name.as_str()).collect();
            assert!(names.contains(&"{$X}"));
            assert!(names.contains(&"{$Y}"));
            assert!(!names.contains(&"{$Z}"));
            // the untouched macro kept its row id
            assert!(macros
                .iter()
                .any(|m| m.macro_name == "{$X}" && m.macro_id == 900));
        });
    }

    #[test]
    fn positional_tags_preserve_row_ids() {
        let store = MemoryStore::new();
        seed_rule_and_prototype(&store);
        store.seed(|data| {
            data.host_tags.push(HostTagRow {
                tag_id: 800,
                host_id: 30,
                tag: "env".into(),
                value: "prod".into(),
            });

            data.host_prototypes.push(HostPrototypeRow {
                host_id: 90,
                host: "{#VM.NAME}".into(),
                name: "{#VM.NAME}".into(),
                status: 0,
                discover: 0,
                custom_interfaces: 0,
                template_id: Some(30),
            });
            data.host_discovery.push(HostDiscoveryRow {
                host_id: 90,
                parent_host_id: None,
                parent_item_id: Some(60),
            });
            data.host_tags.push(HostTagRow {
                tag_id: 900,
                host_id: 90,
                tag: "old".into(),
                value: "value".into(),
            });
            data.host_tags.push(HostTagRow {
                tag_id: 901,
                host_id: 90,
                tag: "stale".into(),
                value: "gone".into(),
            });
        });
        let mut audit = AuditBuffer::new();

        link_host_prototypes(&store, &mut audit, 5, &[1]).unwrap();

        store.read(|data| {
            let tags: Vec<_> = data.host_tags.iter().filter(|t| t.host_id == 90).collect();
            // first row overwritten in place, trailing row deleted
            assert_eq!(tags.len(), 1);
            assert_eq!(tags[0].tag_id, 900);
            assert_eq!(tags[0].tag, "env");
            assert_eq!(tags[0].value, "prod");
        });
    }

    #[test]
    fn scalar_divergence_marks_dirty_columns_only() {
        let store = MemoryStore::new();
        seed_rule_and_prototype(&store);
        store.seed(|data| {
            data.host_prototypes.push(HostPrototypeRow {
                host_id: 90,
                host: "{#VM.NAME}".into(),
                name: "old display name".into(),
                status: 0,
                discover: 0,
                custom_interfaces: 0,
                template_id: Some(30),
            });
            data.host_discovery.push(HostDiscoveryRow {
                host_id: 90,
                parent_host_id: None,
                parent_item_id: Some(60),
            });
        });
        let mut audit = AuditBuffer::new();

        link_host_prototypes(&store, &mut audit, 5, &[1]).unwrap();

        store.read(|data| {
            let prototype = data
                .host_prototypes
                .iter()
                .find(|p| p.host_id == 90)
                .unwrap();
            assert_eq!(prototype.name, "{#VM.NAME}");
            assert_eq!(prototype.status, 0);
        });
    }
}
