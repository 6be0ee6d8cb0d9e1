//! The request-scoped audit buffer.

use crate::cuid::CuidGenerator;
use crate::entry::{AuditAction, AuditEntry, DetailValue, ResourceType};
use std::collections::BTreeMap;
use templink_model::AuditRow;
use templink_store::{LinkStore, StoreError};
use thiserror::Error;

/// The acting user recorded on flushed rows; linkage runs as super-admin.
pub const SUPER_ADMIN_USER_ID: i32 = 1;

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors raised by the audit buffer.
#[derive(Debug, Error)]
pub enum AuditError {
    /// A detail was recorded for an entity no entry exists for. This means
    /// a linkage invariant broke upstream; the request must abort.
    #[error("audit detail for unknown entity {id}")]
    UnknownEntity {
        /// The entity id that had no buffered entry.
        id: u64,
    },

    /// The flush insert failed.
    #[error("audit flush failed: {0}")]
    Store(#[from] StoreError),
}

/// Collects one audit entry per mutated entity and flushes them as a single
/// batch at the end of the request.
///
/// The buffer is request-scoped: one instance is created per link/unlink
/// call and dropped with it. Entry insertion is idempotent on the entity
/// id: a second `record` for the same id keeps the first entry and its
/// accumulated details, which is how nested updates (expression rewrites,
/// tag and curve changes) attach to the same change record.
#[derive(Debug, Default)]
pub struct AuditBuffer {
    entries: BTreeMap<u64, AuditEntry>,
}

impl AuditBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        AuditBuffer {
            entries: BTreeMap::new(),
        }
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records an entry for an entity. Idempotent on `id`.
    pub fn record(&mut self, id: u64, name: &str, action: AuditAction, resource_type: ResourceType) {
        self.entries.entry(id).or_insert_with(|| AuditEntry {
            id,
            name: name.to_string(),
            action,
            resource_type,
            details: BTreeMap::new(),
        });
    }

    /// Records an add entry.
    pub fn record_add(&mut self, id: u64, name: &str, resource_type: ResourceType) {
        self.record(id, name, AuditAction::Add, resource_type);
    }

    /// Records an update entry.
    pub fn record_update(&mut self, id: u64, name: &str, resource_type: ResourceType) {
        self.record(id, name, AuditAction::Update, resource_type);
    }

    /// Records a delete entry.
    pub fn record_delete(&mut self, id: u64, name: &str, resource_type: ResourceType) {
        self.record(id, name, AuditAction::Delete, resource_type);
    }

    /// Attaches a detail to the entry of `id`.
    ///
    /// An unknown id is fatal: details always follow a `record` call in the
    /// same writer, so a miss indicates a broken linkage invariant.
    pub fn update_field(
        &mut self,
        id: u64,
        path: impl Into<String>,
        value: impl Into<DetailValue>,
    ) -> AuditResult<()> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(AuditError::UnknownEntity { id })?;
        entry.details.insert(path.into(), value.into());
        Ok(())
    }

    /// Inserts one audit row per buffered entry and empties the buffer.
    ///
    /// Update entries that accumulated no details are suppressed; an
    /// update that changed nothing auditable would only add noise. Row ids
    /// are freshly generated; `recordset_id` ties the batch to its request.
    pub fn flush(
        &mut self,
        store: &dyn LinkStore,
        generator: &CuidGenerator,
        recordset_id: &str,
        clock: i64,
    ) -> AuditResult<usize> {
        let mut rows = Vec::with_capacity(self.entries.len());
        for entry in self.entries.values() {
            if entry.action == AuditAction::Update && entry.details.is_empty() {
                continue;
            }
            rows.push(AuditRow {
                audit_id: generator.next_id(),
                user_id: SUPER_ADMIN_USER_ID,
                clock,
                action: entry.action.code(),
                ip: String::new(),
                resource_id: entry.id,
                resource_name: entry.name.clone(),
                resource_type: entry.resource_type.code(),
                recordset_id: recordset_id.to_string(),
                details_json: entry.details_json(),
            });
        }
        store.insert_audit_rows(&rows)?;
        self.entries.clear();
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use templink_store::MemoryStore;

    fn flush_all(buffer: &mut AuditBuffer, store: &MemoryStore) -> usize {
        let generator = CuidGenerator::with_pid("test-node", 7);
        buffer.flush(store, &generator, "c000000000000000000000000", 1700000000)
            .unwrap()
    }

    #[test]
    fn record_is_idempotent_on_id() {
        let mut buffer = AuditBuffer::new();
        buffer.record_add(5, "first", ResourceType::Trigger);
        buffer.record_update(5, "second", ResourceType::Trigger);

        assert_eq!(buffer.len(), 1);
        buffer.update_field(5, "trigger.opdata", "x").unwrap();

        let store = MemoryStore::new();
        flush_all(&mut buffer, &store);
        store.read(|data| {
            assert_eq!(data.audit.len(), 1);
            // the first record wins
            assert_eq!(data.audit[0].action, AuditAction::Add.code());
            assert_eq!(data.audit[0].resource_name, "first");
        });
    }

    #[test]
    fn update_field_for_unknown_id_is_fatal() {
        let mut buffer = AuditBuffer::new();
        let err = buffer.update_field(9, "trigger.opdata", "x").unwrap_err();
        assert!(matches!(err, AuditError::UnknownEntity { id: 9 }));
    }

    #[test]
    fn empty_updates_are_suppressed() {
        let mut buffer = AuditBuffer::new();
        buffer.record_update(1, "silent", ResourceType::Graph);
        buffer.record_update(2, "changed", ResourceType::Graph);
        buffer.update_field(2, "graph.width", 900i64).unwrap();

        let store = MemoryStore::new();
        let flushed = flush_all(&mut buffer, &store);

        assert_eq!(flushed, 1);
        store.read(|data| {
            assert_eq!(data.audit.len(), 1);
            assert_eq!(data.audit[0].resource_id, 2);
        });
    }

    #[test]
    fn flush_empties_the_buffer() {
        let mut buffer = AuditBuffer::new();
        buffer.record_delete(3, "gone", ResourceType::Scenario);

        let store = MemoryStore::new();
        flush_all(&mut buffer, &store);

        assert!(buffer.is_empty());
        store.read(|data| {
            assert_eq!(data.audit.len(), 1);
            assert_eq!(data.audit[0].action, AuditAction::Delete.code());
            assert_eq!(
                data.audit[0].resource_type,
                ResourceType::Scenario.code()
            );
            assert_eq!(data.audit[0].recordset_id, "c000000000000000000000000");
        });
    }
}
