//! The flushed audit row.

/// One row of the audit log, as inserted at flush time.
///
/// `audit_id` and `recordset_id` are 25-character collision-resistant
/// identifiers; `details_json` is a flat object keyed by dotted attribute
/// paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    /// Row id (cuid).
    pub audit_id: String,
    /// Acting user id; linkage always runs as the super-admin.
    pub user_id: i32,
    /// Unix timestamp of the flush.
    pub clock: i64,
    /// 1 add, 2 update, 3 delete.
    pub action: i32,
    /// Source address; empty for server-side changes.
    pub ip: String,
    /// Id of the affected entity.
    pub resource_id: u64,
    /// Name of the affected entity at mutation time.
    pub resource_name: String,
    /// Resource type code.
    pub resource_type: i32,
    /// Change-set identifier shared by all rows of one request.
    pub recordset_id: String,
    /// Flat JSON object of attribute paths to values.
    pub details_json: String,
}
