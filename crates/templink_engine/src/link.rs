//! Request entry points: link, unlink, host deletion.

use crate::cascade::{self, CascadeStats};
use crate::error::{LinkError, LinkResult};
use crate::graphs::{link_graphs, GraphLinkStats};
use crate::prototypes::{link_host_prototypes, PrototypeLinkStats};
use crate::scenarios::{link_scenarios, ScenarioLinkStats};
use crate::triggers::{link_triggers, TriggerLinkStats};
use crate::validate;
use std::time::{SystemTime, UNIX_EPOCH};
use templink_audit::{AuditBuffer, CuidGenerator, ResourceType};
use templink_model::{HostId, IdDomain, ItemKind, TemplateLinkRow};
use templink_store::LinkStore;
use tracing::{debug, info};

/// Result of a link request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Templates actually linked (already-linked ones are dropped).
    pub linked: Vec<HostId>,
    /// Trigger family counters.
    pub triggers: TriggerLinkStats,
    /// Graph family counters.
    pub graphs: GraphLinkStats,
    /// Host-prototype family counters.
    pub prototypes: PrototypeLinkStats,
    /// Web-scenario family counters.
    pub scenarios: ScenarioLinkStats,
    /// Audit rows flushed for this request.
    pub audit_rows: usize,
}

/// Result of an unlink request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnlinkOutcome {
    /// Templates actually unlinked (not-linked ones are dropped).
    pub unlinked: Vec<HostId>,
    /// Deletion counters.
    pub removed: CascadeStats,
    /// Audit rows flushed for this request.
    pub audit_rows: usize,
}

/// The template linkage engine.
///
/// One instance serves one request inside the caller's transaction; the
/// audit buffer lives and dies with the request, and the record-set id
/// supplied by the caller ties all flushed rows together. Cancellation is
/// the transaction's rollback: buffered audit entries and emitted DML
/// vanish with it.
pub struct LinkEngine<'a> {
    store: &'a dyn LinkStore,
    ids: &'a CuidGenerator,
    clock: i64,
}

impl<'a> LinkEngine<'a> {
    /// Creates an engine stamping audit rows with the current time.
    pub fn new(store: &'a dyn LinkStore, ids: &'a CuidGenerator) -> Self {
        let clock = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self::with_clock(store, ids, clock)
    }

    /// Creates an engine with an explicit audit clock (deterministic tests).
    pub fn with_clock(store: &'a dyn LinkStore, ids: &'a CuidGenerator, clock: i64) -> Self {
        LinkEngine { store, ids, clock }
    }

    /// Links `template_ids` to `host_id`, materializing their contents.
    ///
    /// Validation runs before the first write; a validation failure leaves
    /// the transaction untouched. Already-linked templates are skipped.
    pub fn link_templates(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
        recordset_id: &str,
    ) -> LinkResult<LinkOutcome> {
        let host = self
            .store
            .host(host_id)?
            .ok_or_else(|| LinkError::validation(format!("host {host_id} not found")))?;

        let existing: Vec<HostId> = self
            .store
            .template_links(&[host_id])?
            .iter()
            .map(|l| l.template_id)
            .collect();

        let mut candidates: Vec<HostId> = Vec::new();
        for template_id in template_ids {
            if !existing.contains(template_id) && !candidates.contains(template_id) {
                candidates.push(*template_id);
            }
        }
        if candidates.is_empty() {
            debug!(host_id, "all templates already linked");
            return Ok(LinkOutcome::default());
        }

        let mut combined = existing.clone();
        combined.extend_from_slice(&candidates);
        combined.sort_unstable();

        validate::validate_linked_templates(self.store, &combined)?;
        validate::validate_host(self.store, host_id, &candidates)?;

        let mut audit = AuditBuffer::new();

        let mut link_id = self
            .store
            .reserve_ids(IdDomain::TemplateLinks, candidates.len() as u64)?;
        let rows: Vec<TemplateLinkRow> = candidates
            .iter()
            .map(|template_id| {
                let row = TemplateLinkRow {
                    link_id,
                    host_id,
                    template_id: *template_id,
                };
                link_id += 1;
                row
            })
            .collect();
        self.store.insert_template_links(&rows)?;

        audit.record_add(host_id, &host.host, ResourceType::Host);
        for template_id in &candidates {
            audit.update_field(
                host_id,
                format!("host.parent_templates[{template_id}]"),
                *template_id,
            )?;
        }

        let prototypes = link_host_prototypes(self.store, &mut audit, host_id, &candidates)?;
        let triggers = link_triggers(self.store, &mut audit, host_id, &candidates)?;
        let graphs = link_graphs(self.store, &mut audit, host_id, &candidates)?;
        let scenarios = link_scenarios(self.store, &mut audit, host_id, &candidates)?;

        let audit_rows = audit.flush(self.store, self.ids, recordset_id, self.clock)?;
        info!(
            host_id,
            templates = candidates.len(),
            audit_rows,
            "templates linked"
        );

        Ok(LinkOutcome {
            linked: candidates,
            triggers,
            graphs,
            prototypes,
            scenarios,
            audit_rows,
        })
    }

    /// Unlinks `template_ids` from `host_id`, cascading over every entity
    /// whose parent chain roots at one of them.
    pub fn unlink_templates(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
        recordset_id: &str,
    ) -> LinkResult<UnlinkOutcome> {
        let existing: Vec<HostId> = self
            .store
            .template_links(&[host_id])?
            .iter()
            .map(|l| l.template_id)
            .collect();

        let mut to_unlink: Vec<HostId> = Vec::new();
        for template_id in template_ids {
            if existing.contains(template_id) && !to_unlink.contains(template_id) {
                to_unlink.push(*template_id);
            }
        }
        if to_unlink.is_empty() {
            debug!(host_id, "no linked template to remove");
            return Ok(UnlinkOutcome::default());
        }

        // the set that stays linked must remain internally consistent
        let remaining: Vec<HostId> = existing
            .iter()
            .copied()
            .filter(|id| !to_unlink.contains(id))
            .collect();
        validate::validate_linked_templates(self.store, &remaining)?;

        let mut audit = AuditBuffer::new();
        let removed = cascade::delete_template_elements(self.store, &mut audit, host_id, &to_unlink)?;
        self.store.delete_template_links(host_id, &to_unlink)?;

        let audit_rows = audit.flush(self.store, self.ids, recordset_id, self.clock)?;
        info!(
            host_id,
            templates = to_unlink.len(),
            audit_rows,
            "templates unlinked"
        );

        Ok(UnlinkOutcome {
            unlinked: to_unlink,
            removed,
            audit_rows,
        })
    }

    /// Deletes hosts with all their elements, removing the host prototypes
    /// hanging off their discovery rules first.
    pub fn delete_hosts(
        &self,
        host_ids: &[HostId],
        recordset_id: &str,
    ) -> LinkResult<usize> {
        let mut audit = AuditBuffer::new();

        let rule_ids: Vec<u64> = self
            .store
            .items_by_hosts(host_ids)?
            .iter()
            .filter(|i| i.flags == ItemKind::Rule)
            .map(|i| i.item_id)
            .collect();
        let prototype_ids: Vec<HostId> = self
            .store
            .prototypes_by_rules(&rule_ids)?
            .iter()
            .map(|p| p.prototype.host_id)
            .collect();
        cascade::delete_host_prototypes(self.store, &mut audit, &prototype_ids)?;

        cascade::delete_hosts(self.store, &mut audit, host_ids)?;

        let audit_rows = audit.flush(self.store, self.ids, recordset_id, self.clock)?;
        info!(hosts = host_ids.len(), audit_rows, "hosts deleted");
        Ok(audit_rows)
    }
}

impl std::fmt::Debug for LinkEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkEngine")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
