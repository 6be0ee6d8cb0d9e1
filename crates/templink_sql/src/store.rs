//! [`LinkStore`] implemented by rendering SQL through a [`SqlClient`].
//!
//! Statement shapes follow the relational schema: multi-row inserts,
//! batched updates carrying only dirty columns, `delete … where id in (…)`
//! lists. Every statement is rendered from a verb and an explicit column
//! list; a render call that would produce an empty column list fails
//! instead of emitting a malformed statement.

use crate::buffer::SqlBuffer;
use crate::client::{escape_str, SqlClient, SqlError, SqlResult, SqlRow, SqlValue};
use crate::codes;
use templink_model::discovery::{GraphDiscoveryRow, GroupDiscoveryRow, ItemDiscoveryRow};
use templink_model::{
    ActionConditionRow, AuditRow, ConditionKind, FunctionRow, GraphId, GraphItemRow, GraphRow,
    GroupId, GroupPrototypeId, GroupPrototypeRow, HostId, HostPrototypeRow, HostRow,
    HostTagRow, HousekeeperRow, IdDomain, InterfaceId, ItemId, ItemRow, LinkId, MacroId,
    PrototypeInterfaceRow, PrototypeMacroRow, ScenarioId, ScenarioItemRow, SnmpDetails, StepId,
    StepItemRow, SysmapElementKind, SysmapElementRow, TagId, TemplateLinkRow,
    TriggerDependencyRow, TriggerDiscoveryRow, TriggerId, TriggerRow, TriggerTagRow, WebFieldRow,
    WebScenarioRow, WebStepRow, WebTagRow,
};
use templink_store::{
    FunctionKeyRow, GraphItemKeyRow, GroupPrototypeUpdate, InterfaceUpdate, LinkStore,
    MacroUpdate, PrototypeUpdate, SnmpChange, StoreError, StoreResult, TagUpdate,
    TemplatePrototypeRow, TriggerUpdate,
};

/// A [`LinkStore`] over a SQL connection.
pub struct SqlStore<C: SqlClient> {
    client: C,
}

impl<C: SqlClient> SqlStore<C> {
    /// Wraps a client connection.
    pub fn new(client: C) -> Self {
        SqlStore { client }
    }

    /// The wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }
}

fn store_err(err: SqlError) -> StoreError {
    match err {
        SqlError::Client { message, retryable } => StoreError::Transport { message, retryable },
        other => StoreError::MalformedStatement(other.to_string()),
    }
}

fn in_list(ids: &[u64]) -> String {
    let mut out = String::from("(");
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&id.to_string());
    }
    out.push(')');
    out
}

fn str_list(values: &[String]) -> String {
    let mut out = String::from("(");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('\'');
        out.push_str(&escape_str(value));
        out.push('\'');
    }
    out.push(')');
    out
}

fn quoted(value: &str) -> String {
    format!("'{}'", escape_str(value))
}

fn opt_id(value: Option<u64>) -> String {
    match value {
        Some(id) => id.to_string(),
        None => "null".to_string(),
    }
}

// ----- row accessors ------------------------------------------------------

fn col<'a>(row: &'a SqlRow, idx: usize) -> SqlResult<&'a SqlValue> {
    row.get(idx)
        .ok_or_else(|| SqlError::RowShape(format!("missing column {idx}")))
}

fn col_i64(row: &SqlRow, idx: usize) -> SqlResult<i64> {
    match col(row, idx)? {
        SqlValue::Int(v) => Ok(*v),
        other => Err(SqlError::RowShape(format!(
            "column {idx}: expected integer, got {other:?}"
        ))),
    }
}

fn col_u64(row: &SqlRow, idx: usize) -> SqlResult<u64> {
    Ok(col_i64(row, idx)? as u64)
}

fn col_i32(row: &SqlRow, idx: usize) -> SqlResult<i32> {
    Ok(col_i64(row, idx)? as i32)
}

fn col_opt_u64(row: &SqlRow, idx: usize) -> SqlResult<Option<u64>> {
    match col(row, idx)? {
        SqlValue::Null => Ok(None),
        SqlValue::Int(v) if *v == 0 => Ok(None),
        SqlValue::Int(v) => Ok(Some(*v as u64)),
        other => Err(SqlError::RowShape(format!(
            "column {idx}: expected nullable integer, got {other:?}"
        ))),
    }
}

fn col_f64(row: &SqlRow, idx: usize) -> SqlResult<f64> {
    match col(row, idx)? {
        SqlValue::Float(v) => Ok(*v),
        SqlValue::Int(v) => Ok(*v as f64),
        other => Err(SqlError::RowShape(format!(
            "column {idx}: expected float, got {other:?}"
        ))),
    }
}

fn col_str(row: &SqlRow, idx: usize) -> SqlResult<String> {
    match col(row, idx)? {
        SqlValue::Str(v) => Ok(v.clone()),
        SqlValue::Null => Ok(String::new()),
        other => Err(SqlError::RowShape(format!(
            "column {idx}: expected text, got {other:?}"
        ))),
    }
}

// ----- shared column lists and row parsers --------------------------------

const TRIGGER_COLUMNS: &str = "t.triggerid,t.description,t.expression,t.recovery_expression,\
t.recovery_mode,t.status,t.type,t.priority,t.comments,t.url,t.flags,t.correlation_mode,\
t.correlation_tag,t.manual_close,t.opdata,t.discover,t.event_name,t.templateid,t.value,t.state";

fn parse_trigger(row: &SqlRow) -> SqlResult<TriggerRow> {
    Ok(TriggerRow {
        trigger_id: col_u64(row, 0)?,
        description: col_str(row, 1)?,
        expression: col_str(row, 2)?,
        recovery_expression: col_str(row, 3)?,
        recovery_mode: codes::recovery_mode_from(col_i64(row, 4)?)?,
        status: col_i32(row, 5)?,
        trigger_type: col_i32(row, 6)?,
        priority: col_i32(row, 7)?,
        comments: col_str(row, 8)?,
        url: col_str(row, 9)?,
        flags: codes::item_kind_from(col_i64(row, 10)?)?,
        correlation_mode: codes::correlation_mode_from(col_i64(row, 11)?)?,
        correlation_tag: col_str(row, 12)?,
        manual_close: col_i32(row, 13)?,
        opdata: col_str(row, 14)?,
        discover: col_i32(row, 15)?,
        event_name: col_str(row, 16)?,
        template_id: col_opt_u64(row, 17)?,
        value: col_i32(row, 18)?,
        state: col_i32(row, 19)?,
    })
}

const ITEM_COLUMNS: &str = "i.itemid,i.hostid,i.key_,i.name,i.type,i.value_type,i.delay,\
i.flags,i.templateid,i.valuemapid,i.interfaceid,i.master_itemid,i.inventory_link,i.history,\
i.trends,i.units,i.description,i.status";

fn parse_item(row: &SqlRow) -> SqlResult<ItemRow> {
    Ok(ItemRow {
        item_id: col_u64(row, 0)?,
        host_id: col_u64(row, 1)?,
        key: col_str(row, 2)?,
        name: col_str(row, 3)?,
        item_type: codes::item_type_from(col_i64(row, 4)?)?,
        value_type: col_i32(row, 5)?,
        delay: col_str(row, 6)?,
        flags: codes::item_kind_from(col_i64(row, 7)?)?,
        template_item_id: col_opt_u64(row, 8)?,
        value_map_id: col_opt_u64(row, 9)?,
        interface_id: col_opt_u64(row, 10)?,
        master_item_id: col_opt_u64(row, 11)?,
        inventory_link: col_i32(row, 12)?,
        history: col_str(row, 13)?,
        trends: col_str(row, 14)?,
        units: col_str(row, 15)?,
        description: col_str(row, 16)?,
        status: col_i32(row, 17)?,
    })
}

const GRAPH_COLUMNS: &str = "g.graphid,g.name,g.width,g.height,g.yaxismin,g.yaxismax,\
g.show_work_period,g.show_triggers,g.graphtype,g.show_legend,g.show_3d,g.percent_left,\
g.percent_right,g.ymin_type,g.ymax_type,g.ymin_itemid,g.ymax_itemid,g.flags,g.discover,\
g.templateid";

fn parse_graph(row: &SqlRow) -> SqlResult<GraphRow> {
    Ok(GraphRow {
        graph_id: col_u64(row, 0)?,
        name: col_str(row, 1)?,
        width: col_i32(row, 2)?,
        height: col_i32(row, 3)?,
        yaxis_min: col_f64(row, 4)?,
        yaxis_max: col_f64(row, 5)?,
        show_work_period: col_i32(row, 6)?,
        show_triggers: col_i32(row, 7)?,
        graph_type: col_i32(row, 8)?,
        show_legend: col_i32(row, 9)?,
        show_3d: col_i32(row, 10)?,
        percent_left: col_f64(row, 11)?,
        percent_right: col_f64(row, 12)?,
        ymin_kind: codes::axis_bound_from(col_i64(row, 13)?)?,
        ymax_kind: codes::axis_bound_from(col_i64(row, 14)?)?,
        ymin_item_id: col_opt_u64(row, 15)?,
        ymax_item_id: col_opt_u64(row, 16)?,
        flags: codes::item_kind_from(col_i64(row, 17)?)?,
        discover: col_i32(row, 18)?,
        template_id: col_opt_u64(row, 19)?,
    })
}

const SCENARIO_COLUMNS: &str = "ht.httptestid,ht.hostid,ht.name,ht.delay,ht.status,ht.agent,\
ht.authentication,ht.http_user,ht.http_password,ht.http_proxy,ht.retries,ht.templateid";

fn parse_scenario(row: &SqlRow) -> SqlResult<WebScenarioRow> {
    Ok(WebScenarioRow {
        scenario_id: col_u64(row, 0)?,
        host_id: col_u64(row, 1)?,
        name: col_str(row, 2)?,
        delay: col_str(row, 3)?,
        status: col_i32(row, 4)?,
        agent: col_str(row, 5)?,
        authentication: col_i32(row, 6)?,
        http_user: col_str(row, 7)?,
        http_password: col_str(row, 8)?,
        http_proxy: col_str(row, 9)?,
        retries: col_i32(row, 10)?,
        template_id: col_opt_u64(row, 11)?,
    })
}

const PROTOTYPE_COLUMNS: &str =
    "h.hostid,h.host,h.name,h.status,h.discover,h.custom_interfaces,h.templateid";

fn parse_prototype(row: &SqlRow, offset: usize) -> SqlResult<HostPrototypeRow> {
    Ok(HostPrototypeRow {
        host_id: col_u64(row, offset)?,
        host: col_str(row, offset + 1)?,
        name: col_str(row, offset + 2)?,
        status: col_i32(row, offset + 3)?,
        discover: col_i32(row, offset + 4)?,
        custom_interfaces: col_i32(row, offset + 5)?,
        template_id: col_opt_u64(row, offset + 6)?,
    })
}

const INTERFACE_COLUMNS: &str = "hi.interfaceid,hi.hostid,hi.main,hi.type,hi.useip,hi.ip,\
hi.dns,hi.port,s.version,s.bulk,s.community,s.securityname,s.securitylevel,s.authpassphrase,\
s.privpassphrase,s.authprotocol,s.privprotocol,s.contextname";

fn parse_interface(row: &SqlRow) -> SqlResult<PrototypeInterfaceRow> {
    let interface_type = codes::interface_type_from(col_i64(row, 3)?)?;
    let snmp = if matches!(col(row, 8)?, SqlValue::Null) {
        None
    } else {
        Some(SnmpDetails {
            version: col_i32(row, 8)?,
            bulk: col_i32(row, 9)?,
            community: col_str(row, 10)?,
            security_name: col_str(row, 11)?,
            security_level: col_i32(row, 12)?,
            auth_passphrase: col_str(row, 13)?,
            priv_passphrase: col_str(row, 14)?,
            auth_protocol: col_i32(row, 15)?,
            priv_protocol: col_i32(row, 16)?,
            context_name: col_str(row, 17)?,
        })
    };
    Ok(PrototypeInterfaceRow {
        interface_id: col_u64(row, 0)?,
        host_id: col_u64(row, 1)?,
        main: col_i32(row, 2)?,
        interface_type,
        use_ip: col_i32(row, 4)?,
        ip: col_str(row, 5)?,
        dns: col_str(row, 6)?,
        port: col_str(row, 7)?,
        snmp,
    })
}

impl<C: SqlClient> SqlStore<C> {
    fn query_triggers(&self, sql: &str) -> StoreResult<Vec<TriggerRow>> {
        let rows = self.client.query(sql).map_err(store_err)?;
        rows.iter()
            .map(|r| parse_trigger(r).map_err(store_err))
            .collect()
    }

    fn query_graphs(&self, sql: &str) -> StoreResult<Vec<GraphRow>> {
        let rows = self.client.query(sql).map_err(store_err)?;
        rows.iter()
            .map(|r| parse_graph(r).map_err(store_err))
            .collect()
    }

    fn query_items(&self, sql: &str) -> StoreResult<Vec<ItemRow>> {
        let rows = self.client.query(sql).map_err(store_err)?;
        rows.iter()
            .map(|r| parse_item(r).map_err(store_err))
            .collect()
    }

    fn query_scenarios(&self, sql: &str) -> StoreResult<Vec<WebScenarioRow>> {
        let rows = self.client.query(sql).map_err(store_err)?;
        rows.iter()
            .map(|r| parse_scenario(r).map_err(store_err))
            .collect()
    }

    /// Renders and executes one multi-row insert.
    fn bulk_insert(
        &self,
        table: &'static str,
        columns: &[&str],
        values: Vec<Vec<String>>,
    ) -> StoreResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        if columns.is_empty() {
            return Err(store_err(SqlError::EmptyColumnList { table }));
        }
        let mut sql = format!("insert into {} ({}) values ", table, columns.join(","));
        for (i, row) in values.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            sql.push('(');
            sql.push_str(&row.join(","));
            sql.push(')');
        }
        self.client.execute(&sql).map_err(store_err)?;
        Ok(())
    }

    fn execute(&self, sql: &str) -> StoreResult<()> {
        self.client.execute(sql).map_err(store_err)?;
        Ok(())
    }
}

impl<C: SqlClient> LinkStore for SqlStore<C> {
    fn reserve_ids(&self, domain: IdDomain, count: u64) -> StoreResult<u64> {
        self.client
            .next_id_block(domain.table(), count)
            .map_err(store_err)
    }

    fn host(&self, host_id: HostId) -> StoreResult<Option<HostRow>> {
        let rows = self
            .client
            .query(&format!(
                "select hostid,host,name,status,flags from hosts where hostid={host_id}"
            ))
            .map_err(store_err)?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let status = col_i64(row, 3).map_err(store_err)?;
        let flags = col_i64(row, 4).map_err(store_err)?;
        Ok(Some(HostRow {
            host_id: col_u64(row, 0).map_err(store_err)?,
            host: col_str(row, 1).map_err(store_err)?,
            name: col_str(row, 2).map_err(store_err)?,
            kind: codes::host_kind_from(status, flags),
            status: status as i32,
        }))
    }

    fn hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<HostRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select hostid,host,name,status,flags from hosts where hostid in {}",
                in_list(host_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|row| {
                let status = col_i64(row, 3).map_err(store_err)?;
                let flags = col_i64(row, 4).map_err(store_err)?;
                Ok(HostRow {
                    host_id: col_u64(row, 0).map_err(store_err)?,
                    host: col_str(row, 1).map_err(store_err)?,
                    name: col_str(row, 2).map_err(store_err)?,
                    kind: codes::host_kind_from(status, flags),
                    status: status as i32,
                })
            })
            .collect()
    }

    fn template_links(&self, host_ids: &[HostId]) -> StoreResult<Vec<TemplateLinkRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select hosttemplateid,hostid,templateid from hosts_templates \
                 where hostid in {} order by hosttemplateid",
                in_list(host_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(TemplateLinkRow {
                    link_id: col_u64(r, 0).map_err(store_err)?,
                    host_id: col_u64(r, 1).map_err(store_err)?,
                    template_id: col_u64(r, 2).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn insert_template_links(&self, rows: &[TemplateLinkRow]) -> StoreResult<()> {
        self.bulk_insert(
            "hosts_templates",
            &["hosttemplateid", "hostid", "templateid"],
            rows.iter()
                .map(|r| {
                    vec![
                        r.link_id.to_string(),
                        r.host_id.to_string(),
                        r.template_id.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn delete_template_links(&self, host_id: HostId, template_ids: &[HostId]) -> StoreResult<()> {
        if template_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from hosts_templates where hostid={host_id} and templateid in {}",
            in_list(template_ids)
        ))
    }

    fn delete_links_by_id(&self, link_ids: &[LinkId]) -> StoreResult<()> {
        if link_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from hosts_templates where hosttemplateid in {}",
            in_list(link_ids)
        ))
    }

    fn delete_hosts(&self, host_ids: &[HostId]) -> StoreResult<()> {
        if host_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from hosts where hostid in {}",
            in_list(host_ids)
        ))
    }

    fn items_by_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<ItemRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_items(&format!(
            "select {ITEM_COLUMNS} from items i where i.hostid in {}",
            in_list(host_ids)
        ))
    }

    fn items_by_ids(&self, item_ids: &[ItemId]) -> StoreResult<Vec<ItemRow>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_items(&format!(
            "select {ITEM_COLUMNS} from items i where i.itemid in {}",
            in_list(item_ids)
        ))
    }

    fn template_items_on_host(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<ItemRow>> {
        if template_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_items(&format!(
            "select {ITEM_COLUMNS} from items i,items ti \
             where i.templateid=ti.itemid and i.hostid={host_id} and ti.hostid in {}",
            in_list(template_ids)
        ))
    }

    fn item_children(&self, item_ids: &[ItemId]) -> StoreResult<Vec<ItemDiscoveryRow>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select itemid,parent_itemid from item_discovery where parent_itemid in {}",
                in_list(item_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(ItemDiscoveryRow {
                    item_id: col_u64(r, 0).map_err(store_err)?,
                    parent_item_id: col_u64(r, 1).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn delete_items(&self, item_ids: &[ItemId]) -> StoreResult<()> {
        if item_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from items where itemid in {}",
            in_list(item_ids)
        ))
    }

    fn triggers_of_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<TriggerRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_triggers(&format!(
            "select distinct {TRIGGER_COLUMNS} from triggers t,functions f,items i \
             where t.triggerid=f.triggerid and f.itemid=i.itemid and i.hostid in {}",
            in_list(host_ids)
        ))
    }

    fn host_trigger_candidates(
        &self,
        host_id: HostId,
        descriptions: &[String],
    ) -> StoreResult<Vec<TriggerRow>> {
        if descriptions.is_empty() {
            return Ok(Vec::new());
        }
        self.query_triggers(&format!(
            "select distinct {TRIGGER_COLUMNS} from triggers t,functions f,items i \
             where t.triggerid=f.triggerid and f.itemid=i.itemid \
             and t.templateid is null and i.hostid={host_id} and t.description in {}",
            str_list(descriptions)
        ))
    }

    fn host_triggers_by_template_triggers(
        &self,
        host_id: HostId,
        template_trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<TriggerRow>> {
        if template_trigger_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_triggers(&format!(
            "select distinct {TRIGGER_COLUMNS} from triggers t,functions f,items i \
             where t.triggerid=f.triggerid and f.itemid=i.itemid and i.hostid={host_id} \
             and t.templateid in {}",
            in_list(template_trigger_ids)
        ))
    }

    fn triggers_by_items(&self, item_ids: &[ItemId]) -> StoreResult<Vec<TriggerRow>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_triggers(&format!(
            "select distinct {TRIGGER_COLUMNS} from triggers t,functions f \
             where t.triggerid=f.triggerid and f.itemid in {}",
            in_list(item_ids)
        ))
    }

    fn triggers_by_ids(&self, trigger_ids: &[TriggerId]) -> StoreResult<Vec<TriggerRow>> {
        if trigger_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_triggers(&format!(
            "select {TRIGGER_COLUMNS} from triggers t where t.triggerid in {}",
            in_list(trigger_ids)
        ))
    }

    fn triggers_with_other_items(
        &self,
        trigger_ids: &[TriggerId],
        item_ids: &[ItemId],
    ) -> StoreResult<Vec<TriggerId>> {
        if trigger_ids.is_empty() || item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select distinct triggerid from functions \
                 where triggerid in {} and not itemid in {}",
                in_list(trigger_ids),
                in_list(item_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| col_u64(r, 0).map_err(store_err))
            .collect()
    }

    fn functions_with_keys(
        &self,
        trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<FunctionKeyRow>> {
        if trigger_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select f.functionid,f.triggerid,f.itemid,i.key_,f.name,f.parameter \
                 from functions f,items i where i.itemid=f.itemid and f.triggerid in {}",
                in_list(trigger_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(FunctionKeyRow {
                    function_id: col_u64(r, 0).map_err(store_err)?,
                    trigger_id: col_u64(r, 1).map_err(store_err)?,
                    item_id: col_u64(r, 2).map_err(store_err)?,
                    item_key: col_str(r, 3).map_err(store_err)?,
                    name: col_str(r, 4).map_err(store_err)?,
                    parameter: col_str(r, 5).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn trigger_children(
        &self,
        trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<TriggerDiscoveryRow>> {
        if trigger_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select triggerid,parent_triggerid from trigger_discovery \
                 where parent_triggerid in {}",
                in_list(trigger_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(TriggerDiscoveryRow {
                    trigger_id: col_u64(r, 0).map_err(store_err)?,
                    parent_trigger_id: col_u64(r, 1).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn dependencies_touching(
        &self,
        trigger_ids: &[TriggerId],
    ) -> StoreResult<Vec<TriggerDependencyRow>> {
        if trigger_ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = in_list(trigger_ids);
        let rows = self
            .client
            .query(&format!(
                "select distinct triggerdepid,triggerid_down,triggerid_up from trigger_depends \
                 where triggerid_down in {list} or triggerid_up in {list}"
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(TriggerDependencyRow {
                    dep_id: col_u64(r, 0).map_err(store_err)?,
                    trigger_down: col_u64(r, 1).map_err(store_err)?,
                    trigger_up: col_u64(r, 2).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn trigger_tags(&self, trigger_ids: &[TriggerId]) -> StoreResult<Vec<TriggerTagRow>> {
        if trigger_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select triggertagid,triggerid,tag,value from trigger_tag \
                 where triggerid in {}",
                in_list(trigger_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(TriggerTagRow {
                    tag_id: col_u64(r, 0).map_err(store_err)?,
                    trigger_id: col_u64(r, 1).map_err(store_err)?,
                    tag: col_str(r, 2).map_err(store_err)?,
                    value: col_str(r, 3).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn insert_triggers(&self, rows: &[TriggerRow]) -> StoreResult<()> {
        self.bulk_insert(
            "triggers",
            &[
                "triggerid",
                "description",
                "expression",
                "recovery_expression",
                "recovery_mode",
                "status",
                "type",
                "priority",
                "comments",
                "url",
                "flags",
                "correlation_mode",
                "correlation_tag",
                "manual_close",
                "opdata",
                "discover",
                "event_name",
                "templateid",
                "value",
                "state",
            ],
            rows.iter()
                .map(|t| {
                    vec![
                        t.trigger_id.to_string(),
                        quoted(&t.description),
                        quoted(&t.expression),
                        quoted(&t.recovery_expression),
                        codes::recovery_mode_code(t.recovery_mode).to_string(),
                        t.status.to_string(),
                        t.trigger_type.to_string(),
                        t.priority.to_string(),
                        quoted(&t.comments),
                        quoted(&t.url),
                        codes::item_kind_code(t.flags).to_string(),
                        codes::correlation_mode_code(t.correlation_mode).to_string(),
                        quoted(&t.correlation_tag),
                        t.manual_close.to_string(),
                        quoted(&t.opdata),
                        t.discover.to_string(),
                        quoted(&t.event_name),
                        opt_id(t.template_id),
                        t.value.to_string(),
                        t.state.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn update_triggers(&self, updates: &[TriggerUpdate]) -> StoreResult<()> {
        use templink_model::TriggerUpdateFlags as F;
        if updates.is_empty() {
            return Ok(());
        }
        let mut buffer = SqlBuffer::new(&self.client);
        for update in updates {
            let mut sql = format!(
                "update triggers set templateid={}",
                update.template_id
            );
            if update.dirty.contains(F::FLAGS) {
                sql.push_str(&format!(
                    ",flags={}",
                    codes::item_kind_code(update.flags)
                ));
            }
            if update.dirty.contains(F::RECOVERY_MODE) {
                sql.push_str(&format!(
                    ",recovery_mode={}",
                    codes::recovery_mode_code(update.recovery_mode)
                ));
            }
            if update.dirty.contains(F::CORRELATION_MODE) {
                sql.push_str(&format!(
                    ",correlation_mode={},correlation_tag={}",
                    codes::correlation_mode_code(update.correlation_mode),
                    quoted(&update.correlation_tag)
                ));
            }
            if update.dirty.contains(F::MANUAL_CLOSE) {
                sql.push_str(&format!(",manual_close={}", update.manual_close));
            }
            if update.dirty.contains(F::OPDATA) {
                sql.push_str(&format!(",opdata={}", quoted(&update.opdata)));
            }
            if update.dirty.contains(F::DISCOVER) {
                sql.push_str(&format!(",discover={}", update.discover));
            }
            if update.dirty.contains(F::EVENT_NAME) {
                sql.push_str(&format!(",event_name={}", quoted(&update.event_name)));
            }
            sql.push_str(&format!(" where triggerid={}", update.trigger_id));
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn delete_triggers(&self, trigger_ids: &[TriggerId]) -> StoreResult<()> {
        if trigger_ids.is_empty() {
            return Ok(());
        }
        let list = in_list(trigger_ids);
        let mut buffer = SqlBuffer::new(&self.client);
        for sql in [
            format!("delete from functions where triggerid in {list}"),
            format!("delete from trigger_tag where triggerid in {list}"),
            format!(
                "delete from trigger_depends where triggerid_down in {list} \
                 or triggerid_up in {list}"
            ),
            format!("delete from triggers where triggerid in {list}"),
        ] {
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn insert_functions(&self, rows: &[FunctionRow]) -> StoreResult<()> {
        self.bulk_insert(
            "functions",
            &["functionid", "itemid", "triggerid", "name", "parameter"],
            rows.iter()
                .map(|f| {
                    vec![
                        f.function_id.to_string(),
                        f.item_id.to_string(),
                        f.trigger_id.to_string(),
                        quoted(&f.name),
                        quoted(&f.parameter),
                    ]
                })
                .collect(),
        )
    }

    fn insert_trigger_dependencies(&self, rows: &[TriggerDependencyRow]) -> StoreResult<()> {
        self.bulk_insert(
            "trigger_depends",
            &["triggerdepid", "triggerid_down", "triggerid_up"],
            rows.iter()
                .map(|d| {
                    vec![
                        d.dep_id.to_string(),
                        d.trigger_down.to_string(),
                        d.trigger_up.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn delete_trigger_tags(&self, trigger_ids: &[TriggerId]) -> StoreResult<()> {
        if trigger_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from trigger_tag where triggerid in {}",
            in_list(trigger_ids)
        ))
    }

    fn insert_trigger_tags(&self, rows: &[TriggerTagRow]) -> StoreResult<()> {
        self.bulk_insert(
            "trigger_tag",
            &["triggertagid", "triggerid", "tag", "value"],
            rows.iter()
                .map(|t| {
                    vec![
                        t.tag_id.to_string(),
                        t.trigger_id.to_string(),
                        quoted(&t.tag),
                        quoted(&t.value),
                    ]
                })
                .collect(),
        )
    }

    fn graphs_of_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<GraphRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_graphs(&format!(
            "select distinct {GRAPH_COLUMNS} from graphs g,graphs_items gi,items i \
             where g.graphid=gi.graphid and gi.itemid=i.itemid and i.hostid in {}",
            in_list(host_ids)
        ))
    }

    fn host_graphs_by_name(&self, host_id: HostId, name: &str) -> StoreResult<Vec<GraphRow>> {
        self.query_graphs(&format!(
            "select distinct {GRAPH_COLUMNS} from graphs g,graphs_items gi,items i \
             where g.graphid=gi.graphid and gi.itemid=i.itemid and i.hostid={host_id} \
             and g.name={} and g.templateid is null",
            quoted(name)
        ))
    }

    fn graphs_by_items(&self, item_ids: &[ItemId]) -> StoreResult<Vec<GraphRow>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_graphs(&format!(
            "select distinct {GRAPH_COLUMNS} from graphs g,graphs_items gi \
             where g.graphid=gi.graphid and gi.itemid in {}",
            in_list(item_ids)
        ))
    }

    fn graphs_by_ids(&self, graph_ids: &[GraphId]) -> StoreResult<Vec<GraphRow>> {
        if graph_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_graphs(&format!(
            "select {GRAPH_COLUMNS} from graphs g where g.graphid in {}",
            in_list(graph_ids)
        ))
    }

    fn graphs_with_other_items(
        &self,
        graph_ids: &[GraphId],
        item_ids: &[ItemId],
    ) -> StoreResult<Vec<GraphId>> {
        if graph_ids.is_empty() || item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select distinct graphid from graphs_items \
                 where graphid in {} and not itemid in {}",
                in_list(graph_ids),
                in_list(item_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| col_u64(r, 0).map_err(store_err))
            .collect()
    }

    fn graph_items_by_key(&self, graph_id: GraphId) -> StoreResult<Vec<GraphItemKeyRow>> {
        let rows = self
            .client
            .query(&format!(
                "select gi.gitemid,gi.graphid,gi.itemid,gi.drawtype,gi.sortorder,gi.color,\
                 gi.yaxisside,gi.calc_fnc,gi.type,i.key_ \
                 from graphs_items gi,items i \
                 where gi.itemid=i.itemid and gi.graphid={graph_id} order by i.key_"
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(GraphItemKeyRow {
                    row: GraphItemRow {
                        graph_item_id: col_u64(r, 0).map_err(store_err)?,
                        graph_id: col_u64(r, 1).map_err(store_err)?,
                        item_id: col_u64(r, 2).map_err(store_err)?,
                        draw_type: col_i32(r, 3).map_err(store_err)?,
                        sort_order: col_i32(r, 4).map_err(store_err)?,
                        color: col_str(r, 5).map_err(store_err)?,
                        yaxis_side: col_i32(r, 6).map_err(store_err)?,
                        calc_fnc: col_i32(r, 7).map_err(store_err)?,
                        item_type: col_i32(r, 8).map_err(store_err)?,
                    },
                    item_key: col_str(r, 9).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn graph_children(&self, graph_ids: &[GraphId]) -> StoreResult<Vec<GraphDiscoveryRow>> {
        if graph_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select graphid,parent_graphid from graph_discovery where parent_graphid in {}",
                in_list(graph_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(GraphDiscoveryRow {
                    graph_id: col_u64(r, 0).map_err(store_err)?,
                    parent_graph_id: col_u64(r, 1).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn insert_graphs(&self, rows: &[GraphRow]) -> StoreResult<()> {
        self.bulk_insert(
            "graphs",
            &[
                "graphid",
                "name",
                "width",
                "height",
                "yaxismin",
                "yaxismax",
                "show_work_period",
                "show_triggers",
                "graphtype",
                "show_legend",
                "show_3d",
                "percent_left",
                "percent_right",
                "ymin_type",
                "ymax_type",
                "ymin_itemid",
                "ymax_itemid",
                "flags",
                "discover",
                "templateid",
            ],
            rows.iter()
                .map(|g| {
                    vec![
                        g.graph_id.to_string(),
                        quoted(&g.name),
                        g.width.to_string(),
                        g.height.to_string(),
                        g.yaxis_min.to_string(),
                        g.yaxis_max.to_string(),
                        g.show_work_period.to_string(),
                        g.show_triggers.to_string(),
                        g.graph_type.to_string(),
                        g.show_legend.to_string(),
                        g.show_3d.to_string(),
                        g.percent_left.to_string(),
                        g.percent_right.to_string(),
                        codes::axis_bound_code(g.ymin_kind).to_string(),
                        codes::axis_bound_code(g.ymax_kind).to_string(),
                        opt_id(g.ymin_item_id),
                        opt_id(g.ymax_item_id),
                        codes::item_kind_code(g.flags).to_string(),
                        g.discover.to_string(),
                        opt_id(g.template_id),
                    ]
                })
                .collect(),
        )
    }

    fn update_graphs(&self, rows: &[GraphRow]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut buffer = SqlBuffer::new(&self.client);
        for g in rows {
            let sql = format!(
                "update graphs set name={},width={},height={},yaxismin={},yaxismax={},\
                 templateid={},show_work_period={},show_triggers={},graphtype={},\
                 show_legend={},show_3d={},percent_left={},percent_right={},ymin_type={},\
                 ymax_type={},ymin_itemid={},ymax_itemid={},flags={},discover={} \
                 where graphid={}",
                quoted(&g.name),
                g.width,
                g.height,
                g.yaxis_min,
                g.yaxis_max,
                opt_id(g.template_id),
                g.show_work_period,
                g.show_triggers,
                g.graph_type,
                g.show_legend,
                g.show_3d,
                g.percent_left,
                g.percent_right,
                codes::axis_bound_code(g.ymin_kind),
                codes::axis_bound_code(g.ymax_kind),
                opt_id(g.ymin_item_id),
                opt_id(g.ymax_item_id),
                codes::item_kind_code(g.flags),
                g.discover,
                g.graph_id
            );
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn insert_graph_items(&self, rows: &[GraphItemRow]) -> StoreResult<()> {
        self.bulk_insert(
            "graphs_items",
            &[
                "gitemid",
                "graphid",
                "itemid",
                "drawtype",
                "sortorder",
                "color",
                "yaxisside",
                "calc_fnc",
                "type",
            ],
            rows.iter()
                .map(|gi| {
                    vec![
                        gi.graph_item_id.to_string(),
                        gi.graph_id.to_string(),
                        gi.item_id.to_string(),
                        gi.draw_type.to_string(),
                        gi.sort_order.to_string(),
                        quoted(&gi.color),
                        gi.yaxis_side.to_string(),
                        gi.calc_fnc.to_string(),
                        gi.item_type.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn update_graph_items(&self, rows: &[GraphItemRow]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut buffer = SqlBuffer::new(&self.client);
        for gi in rows {
            let sql = format!(
                "update graphs_items set drawtype={},sortorder={},color={},yaxisside={},\
                 calc_fnc={},type={} where gitemid={}",
                gi.draw_type,
                gi.sort_order,
                quoted(&gi.color),
                gi.yaxis_side,
                gi.calc_fnc,
                gi.item_type,
                gi.graph_item_id
            );
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn delete_graphs(&self, graph_ids: &[GraphId]) -> StoreResult<()> {
        if graph_ids.is_empty() {
            return Ok(());
        }
        let list = in_list(graph_ids);
        let mut buffer = SqlBuffer::new(&self.client);
        for sql in [
            format!("delete from graphs_items where graphid in {list}"),
            format!("delete from graphs where graphid in {list}"),
        ] {
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn template_prototypes(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<TemplatePrototypeRow>> {
        if template_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select hi.itemid,{PROTOTYPE_COLUMNS} \
                 from items hi,items ti,host_discovery thd,hosts h \
                 where hi.templateid=ti.itemid and ti.itemid=thd.parent_itemid \
                 and thd.hostid=h.hostid and hi.hostid={host_id} and ti.hostid in {}",
                in_list(template_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(TemplatePrototypeRow {
                    host_rule_item_id: col_u64(r, 0).map_err(store_err)?,
                    prototype: parse_prototype(r, 1).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn prototypes_by_rules(
        &self,
        rule_item_ids: &[ItemId],
    ) -> StoreResult<Vec<TemplatePrototypeRow>> {
        if rule_item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select hd.parent_itemid,{PROTOTYPE_COLUMNS} \
                 from host_discovery hd,hosts h \
                 where hd.hostid=h.hostid and hd.parent_itemid in {}",
                in_list(rule_item_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(TemplatePrototypeRow {
                    host_rule_item_id: col_u64(r, 0).map_err(store_err)?,
                    prototype: parse_prototype(r, 1).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn host_prototypes_by_templates(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<HostPrototypeRow>> {
        if template_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select {PROTOTYPE_COLUMNS} \
                 from items hi,host_discovery hhd,hosts h,host_discovery thd,items ti \
                 where hi.itemid=hhd.parent_itemid and hhd.hostid=h.hostid \
                 and h.templateid=thd.hostid and thd.parent_itemid=ti.itemid \
                 and hi.hostid={host_id} and ti.hostid in {}",
                in_list(template_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| parse_prototype(r, 0).map_err(store_err))
            .collect()
    }

    fn host_prototypes_by_ids(
        &self,
        prototype_ids: &[HostId],
    ) -> StoreResult<Vec<HostPrototypeRow>> {
        if prototype_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select {PROTOTYPE_COLUMNS} from hosts h where h.hostid in {}",
                in_list(prototype_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| parse_prototype(r, 0).map_err(store_err))
            .collect()
    }

    fn discovered_hosts(&self, prototype_ids: &[HostId]) -> StoreResult<Vec<HostId>> {
        if prototype_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select hostid from host_discovery where parent_hostid in {}",
                in_list(prototype_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| col_u64(r, 0).map_err(store_err))
            .collect()
    }

    fn group_prototypes(&self, host_ids: &[HostId]) -> StoreResult<Vec<GroupPrototypeRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select group_prototypeid,hostid,name,groupid,templateid from group_prototype \
                 where hostid in {} order by hostid,group_prototypeid",
                in_list(host_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(GroupPrototypeRow {
                    group_prototype_id: col_u64(r, 0).map_err(store_err)?,
                    host_id: col_u64(r, 1).map_err(store_err)?,
                    name: col_str(r, 2).map_err(store_err)?,
                    group_id: col_opt_u64(r, 3).map_err(store_err)?,
                    template_id: col_opt_u64(r, 4).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn discovered_groups(
        &self,
        group_prototype_ids: &[GroupPrototypeId],
    ) -> StoreResult<Vec<GroupDiscoveryRow>> {
        if group_prototype_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select groupid,parent_group_prototypeid from group_discovery \
                 where parent_group_prototypeid in {}",
                in_list(group_prototype_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(GroupDiscoveryRow {
                    group_id: col_u64(r, 0).map_err(store_err)?,
                    parent_group_prototype_id: col_u64(r, 1).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn prototype_macros(&self, host_ids: &[HostId]) -> StoreResult<Vec<PrototypeMacroRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select hostmacroid,hostid,macro,value,description,type from hostmacro \
                 where hostid in {} order by hostid,hostmacroid",
                in_list(host_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(PrototypeMacroRow {
                    macro_id: col_u64(r, 0).map_err(store_err)?,
                    host_id: col_u64(r, 1).map_err(store_err)?,
                    macro_name: col_str(r, 2).map_err(store_err)?,
                    value: col_str(r, 3).map_err(store_err)?,
                    description: col_str(r, 4).map_err(store_err)?,
                    macro_type: col_i32(r, 5).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn host_tags(&self, host_ids: &[HostId]) -> StoreResult<Vec<HostTagRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select hosttagid,hostid,tag,value from host_tag \
                 where hostid in {} order by hostid,hosttagid",
                in_list(host_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(HostTagRow {
                    tag_id: col_u64(r, 0).map_err(store_err)?,
                    host_id: col_u64(r, 1).map_err(store_err)?,
                    tag: col_str(r, 2).map_err(store_err)?,
                    value: col_str(r, 3).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn prototype_interfaces(
        &self,
        host_ids: &[HostId],
    ) -> StoreResult<Vec<PrototypeInterfaceRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select {INTERFACE_COLUMNS} from interface hi \
                 left join interface_snmp s on hi.interfaceid=s.interfaceid \
                 where hi.hostid in {} order by hi.hostid,hi.interfaceid",
                in_list(host_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| parse_interface(r).map_err(store_err))
            .collect()
    }

    fn insert_host_prototypes(&self, rows: &[(HostPrototypeRow, ItemId)]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.bulk_insert(
            "hosts",
            &[
                "hostid",
                "host",
                "name",
                "status",
                "flags",
                "discover",
                "custom_interfaces",
                "templateid",
            ],
            rows.iter()
                .map(|(p, _)| {
                    vec![
                        p.host_id.to_string(),
                        quoted(&p.host),
                        quoted(&p.name),
                        p.status.to_string(),
                        codes::HOST_FLAG_PROTOTYPE.to_string(),
                        p.discover.to_string(),
                        p.custom_interfaces.to_string(),
                        opt_id(p.template_id),
                    ]
                })
                .collect(),
        )?;
        self.bulk_insert(
            "host_discovery",
            &["hostid", "parent_itemid"],
            rows.iter()
                .map(|(p, rule)| vec![p.host_id.to_string(), rule.to_string()])
                .collect(),
        )
    }

    fn update_host_prototypes(&self, updates: &[PrototypeUpdate]) -> StoreResult<()> {
        use templink_model::PrototypeUpdateFlags as F;
        if updates.is_empty() {
            return Ok(());
        }
        let mut buffer = SqlBuffer::new(&self.client);
        for update in updates {
            let mut sql = format!("update hosts set templateid={}", update.template_id);
            if update.dirty.contains(F::NAME) {
                sql.push_str(&format!(",name={}", quoted(&update.name)));
            }
            if update.dirty.contains(F::STATUS) {
                sql.push_str(&format!(",status={}", update.status));
            }
            if update.dirty.contains(F::DISCOVER) {
                sql.push_str(&format!(",discover={}", update.discover));
            }
            if update.dirty.contains(F::CUSTOM_INTERFACES) {
                sql.push_str(&format!(",custom_interfaces={}", update.custom_interfaces));
            }
            sql.push_str(&format!(" where hostid={}", update.host_id));
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn insert_group_prototypes(&self, rows: &[GroupPrototypeRow]) -> StoreResult<()> {
        self.bulk_insert(
            "group_prototype",
            &["group_prototypeid", "hostid", "name", "groupid", "templateid"],
            rows.iter()
                .map(|g| {
                    vec![
                        g.group_prototype_id.to_string(),
                        g.host_id.to_string(),
                        quoted(&g.name),
                        opt_id(g.group_id),
                        opt_id(g.template_id),
                    ]
                })
                .collect(),
        )
    }

    fn update_group_prototypes(&self, updates: &[GroupPrototypeUpdate]) -> StoreResult<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut buffer = SqlBuffer::new(&self.client);
        for update in updates {
            let sql = format!(
                "update group_prototype set templateid={} where group_prototypeid={}",
                update.template_id, update.group_prototype_id
            );
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn delete_group_prototypes(
        &self,
        group_prototype_ids: &[GroupPrototypeId],
    ) -> StoreResult<()> {
        if group_prototype_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from group_prototype where group_prototypeid in {}",
            in_list(group_prototype_ids)
        ))
    }

    fn delete_groups(&self, group_ids: &[GroupId]) -> StoreResult<()> {
        if group_ids.is_empty() {
            return Ok(());
        }
        let list = in_list(group_ids);
        let mut buffer = SqlBuffer::new(&self.client);
        for sql in [
            format!("delete from hosts_groups where groupid in {list}"),
            format!("delete from hstgrp where groupid in {list}"),
        ] {
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn insert_prototype_macros(&self, rows: &[PrototypeMacroRow]) -> StoreResult<()> {
        self.bulk_insert(
            "hostmacro",
            &["hostmacroid", "hostid", "macro", "value", "description", "type"],
            rows.iter()
                .map(|m| {
                    vec![
                        m.macro_id.to_string(),
                        m.host_id.to_string(),
                        quoted(&m.macro_name),
                        quoted(&m.value),
                        quoted(&m.description),
                        m.macro_type.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn update_prototype_macros(&self, updates: &[MacroUpdate]) -> StoreResult<()> {
        use templink_model::MacroUpdateFlags as F;
        if updates.is_empty() {
            return Ok(());
        }
        let mut buffer = SqlBuffer::new(&self.client);
        for update in updates {
            let mut parts = Vec::new();
            if update.dirty.contains(F::VALUE) {
                parts.push(format!("value={}", quoted(&update.value)));
            }
            if update.dirty.contains(F::DESCRIPTION) {
                parts.push(format!("description={}", quoted(&update.description)));
            }
            if update.dirty.contains(F::TYPE) {
                parts.push(format!("type={}", update.macro_type));
            }
            if parts.is_empty() {
                continue;
            }
            let sql = format!(
                "update hostmacro set {} where hostmacroid={}",
                parts.join(","),
                update.macro_id
            );
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn delete_prototype_macros(&self, macro_ids: &[MacroId]) -> StoreResult<()> {
        if macro_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from hostmacro where hostmacroid in {}",
            in_list(macro_ids)
        ))
    }

    fn insert_host_tags(&self, rows: &[HostTagRow]) -> StoreResult<()> {
        self.bulk_insert(
            "host_tag",
            &["hosttagid", "hostid", "tag", "value"],
            rows.iter()
                .map(|t| {
                    vec![
                        t.tag_id.to_string(),
                        t.host_id.to_string(),
                        quoted(&t.tag),
                        quoted(&t.value),
                    ]
                })
                .collect(),
        )
    }

    fn update_host_tags(&self, updates: &[TagUpdate]) -> StoreResult<()> {
        use templink_model::TagUpdateFlags as F;
        if updates.is_empty() {
            return Ok(());
        }
        let mut buffer = SqlBuffer::new(&self.client);
        for update in updates {
            let mut parts = Vec::new();
            if update.dirty.contains(F::TAG) {
                parts.push(format!("tag={}", quoted(&update.tag)));
            }
            if update.dirty.contains(F::VALUE) {
                parts.push(format!("value={}", quoted(&update.value)));
            }
            if parts.is_empty() {
                continue;
            }
            let sql = format!(
                "update host_tag set {} where hosttagid={}",
                parts.join(","),
                update.tag_id
            );
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn delete_host_tags(&self, tag_ids: &[TagId]) -> StoreResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from host_tag where hosttagid in {}",
            in_list(tag_ids)
        ))
    }

    fn insert_prototype_interfaces(&self, rows: &[PrototypeInterfaceRow]) -> StoreResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.bulk_insert(
            "interface",
            &["interfaceid", "hostid", "main", "type", "useip", "ip", "dns", "port"],
            rows.iter()
                .map(|i| {
                    vec![
                        i.interface_id.to_string(),
                        i.host_id.to_string(),
                        i.main.to_string(),
                        codes::interface_type_code(i.interface_type).to_string(),
                        i.use_ip.to_string(),
                        quoted(&i.ip),
                        quoted(&i.dns),
                        quoted(&i.port),
                    ]
                })
                .collect(),
        )?;
        let snmp_rows: Vec<Vec<String>> = rows
            .iter()
            .filter_map(|i| i.snmp.as_ref().map(|s| (i.interface_id, s)))
            .map(|(id, s)| {
                vec![
                    id.to_string(),
                    s.version.to_string(),
                    s.bulk.to_string(),
                    quoted(&s.community),
                    quoted(&s.security_name),
                    s.security_level.to_string(),
                    quoted(&s.auth_passphrase),
                    quoted(&s.priv_passphrase),
                    s.auth_protocol.to_string(),
                    s.priv_protocol.to_string(),
                    quoted(&s.context_name),
                ]
            })
            .collect();
        self.bulk_insert(
            "interface_snmp",
            &[
                "interfaceid",
                "version",
                "bulk",
                "community",
                "securityname",
                "securitylevel",
                "authpassphrase",
                "privpassphrase",
                "authprotocol",
                "privprotocol",
                "contextname",
            ],
            snmp_rows,
        )
    }

    fn update_prototype_interfaces(&self, updates: &[InterfaceUpdate]) -> StoreResult<()> {
        use templink_model::InterfaceUpdateFlags as F;
        use templink_model::SnmpUpdateFlags as S;
        if updates.is_empty() {
            return Ok(());
        }
        let mut buffer = SqlBuffer::new(&self.client);
        let mut snmp_creates = Vec::new();
        for update in updates {
            let mut parts = Vec::new();
            if update.dirty.contains(F::MAIN) {
                parts.push(format!("main={}", update.main));
            }
            if update.dirty.contains(F::TYPE) {
                parts.push(format!(
                    "type={}",
                    codes::interface_type_code(update.interface_type)
                ));
            }
            if update.dirty.contains(F::USEIP) {
                parts.push(format!("useip={}", update.use_ip));
            }
            if update.dirty.contains(F::IP) {
                parts.push(format!("ip={}", quoted(&update.ip)));
            }
            if update.dirty.contains(F::DNS) {
                parts.push(format!("dns={}", quoted(&update.dns)));
            }
            if update.dirty.contains(F::PORT) {
                parts.push(format!("port={}", quoted(&update.port)));
            }
            if !parts.is_empty() {
                let sql = format!(
                    "update interface set {} where interfaceid={}",
                    parts.join(","),
                    update.interface_id
                );
                buffer.push(&self.client, &sql).map_err(store_err)?;
            }
            match &update.snmp {
                SnmpChange::None => {}
                SnmpChange::Create(details) => {
                    snmp_creates.push((update.interface_id, details.clone()));
                }
                SnmpChange::Update { dirty, details } => {
                    let mut snmp_parts = Vec::new();
                    if dirty.contains(S::VERSION) {
                        snmp_parts.push(format!("version={}", details.version));
                    }
                    if dirty.contains(S::BULK) {
                        snmp_parts.push(format!("bulk={}", details.bulk));
                    }
                    if dirty.contains(S::COMMUNITY) {
                        snmp_parts.push(format!("community={}", quoted(&details.community)));
                    }
                    if dirty.contains(S::SECNAME) {
                        snmp_parts
                            .push(format!("securityname={}", quoted(&details.security_name)));
                    }
                    if dirty.contains(S::SECLEVEL) {
                        snmp_parts.push(format!("securitylevel={}", details.security_level));
                    }
                    if dirty.contains(S::AUTHPASS) {
                        snmp_parts.push(format!(
                            "authpassphrase={}",
                            quoted(&details.auth_passphrase)
                        ));
                    }
                    if dirty.contains(S::PRIVPASS) {
                        snmp_parts.push(format!(
                            "privpassphrase={}",
                            quoted(&details.priv_passphrase)
                        ));
                    }
                    if dirty.contains(S::AUTHPROTO) {
                        snmp_parts.push(format!("authprotocol={}", details.auth_protocol));
                    }
                    if dirty.contains(S::PRIVPROTO) {
                        snmp_parts.push(format!("privprotocol={}", details.priv_protocol));
                    }
                    if dirty.contains(S::CONTEXT) {
                        snmp_parts.push(format!("contextname={}", quoted(&details.context_name)));
                    }
                    if !snmp_parts.is_empty() {
                        let sql = format!(
                            "update interface_snmp set {} where interfaceid={}",
                            snmp_parts.join(","),
                            update.interface_id
                        );
                        buffer.push(&self.client, &sql).map_err(store_err)?;
                    }
                }
            }
        }
        buffer.flush(&self.client).map_err(store_err)?;
        self.bulk_insert(
            "interface_snmp",
            &[
                "interfaceid",
                "version",
                "bulk",
                "community",
                "securityname",
                "securitylevel",
                "authpassphrase",
                "privpassphrase",
                "authprotocol",
                "privprotocol",
                "contextname",
            ],
            snmp_creates
                .iter()
                .map(|(id, s)| {
                    vec![
                        id.to_string(),
                        s.version.to_string(),
                        s.bulk.to_string(),
                        quoted(&s.community),
                        quoted(&s.security_name),
                        s.security_level.to_string(),
                        quoted(&s.auth_passphrase),
                        quoted(&s.priv_passphrase),
                        s.auth_protocol.to_string(),
                        s.priv_protocol.to_string(),
                        quoted(&s.context_name),
                    ]
                })
                .collect(),
        )
    }

    fn delete_prototype_interfaces(&self, interface_ids: &[InterfaceId]) -> StoreResult<()> {
        if interface_ids.is_empty() {
            return Ok(());
        }
        let list = in_list(interface_ids);
        let mut buffer = SqlBuffer::new(&self.client);
        for sql in [
            format!("delete from interface_snmp where interfaceid in {list}"),
            format!("delete from interface where interfaceid in {list}"),
        ] {
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn delete_snmp_details(&self, interface_ids: &[InterfaceId]) -> StoreResult<()> {
        if interface_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from interface_snmp where interfaceid in {}",
            in_list(interface_ids)
        ))
    }

    fn scenarios_of_hosts(&self, host_ids: &[HostId]) -> StoreResult<Vec<WebScenarioRow>> {
        if host_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_scenarios(&format!(
            "select {SCENARIO_COLUMNS} from httptest ht \
             where ht.hostid in {} order by ht.httptestid",
            in_list(host_ids)
        ))
    }

    fn host_scenarios_by_templates(
        &self,
        host_id: HostId,
        template_ids: &[HostId],
    ) -> StoreResult<Vec<WebScenarioRow>> {
        if template_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_scenarios(&format!(
            "select {SCENARIO_COLUMNS} from httptest ht join httptest t \
             on t.httptestid=ht.templateid and t.hostid in {} \
             where ht.hostid={host_id}",
            in_list(template_ids)
        ))
    }

    fn scenarios_by_ids(
        &self,
        scenario_ids: &[ScenarioId],
    ) -> StoreResult<Vec<WebScenarioRow>> {
        if scenario_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_scenarios(&format!(
            "select {SCENARIO_COLUMNS} from httptest ht where ht.httptestid in {}",
            in_list(scenario_ids)
        ))
    }

    fn scenario_steps(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<WebStepRow>> {
        if scenario_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select httpstepid,httptestid,name,no,url,timeout,posts,required,\
                 status_codes,follow_redirects,retrieve_mode,post_type from httpstep \
                 where httptestid in {} order by httptestid,httpstepid",
                in_list(scenario_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(WebStepRow {
                    step_id: col_u64(r, 0).map_err(store_err)?,
                    scenario_id: col_u64(r, 1).map_err(store_err)?,
                    name: col_str(r, 2).map_err(store_err)?,
                    no: col_i32(r, 3).map_err(store_err)?,
                    url: col_str(r, 4).map_err(store_err)?,
                    timeout: col_str(r, 5).map_err(store_err)?,
                    posts: col_str(r, 6).map_err(store_err)?,
                    required: col_str(r, 7).map_err(store_err)?,
                    status_codes: col_str(r, 8).map_err(store_err)?,
                    follow_redirects: col_i32(r, 9).map_err(store_err)?,
                    retrieve_mode: col_i32(r, 10).map_err(store_err)?,
                    post_type: col_i32(r, 11).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn scenario_fields(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<WebFieldRow>> {
        if scenario_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select httptest_fieldid,httptestid,type,name,value from httptest_field \
                 where httptestid in {} order by httptestid,httptest_fieldid",
                in_list(scenario_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(WebFieldRow {
                    field_id: col_u64(r, 0).map_err(store_err)?,
                    owner_id: col_u64(r, 1).map_err(store_err)?,
                    kind: codes::field_kind_from(col_i64(r, 2).map_err(store_err)?)
                        .map_err(store_err)?,
                    name: col_str(r, 3).map_err(store_err)?,
                    value: col_str(r, 4).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn step_fields(&self, step_ids: &[StepId]) -> StoreResult<Vec<WebFieldRow>> {
        if step_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select httpstep_fieldid,httpstepid,type,name,value from httpstep_field \
                 where httpstepid in {} order by httpstepid,httpstep_fieldid",
                in_list(step_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(WebFieldRow {
                    field_id: col_u64(r, 0).map_err(store_err)?,
                    owner_id: col_u64(r, 1).map_err(store_err)?,
                    kind: codes::field_kind_from(col_i64(r, 2).map_err(store_err)?)
                        .map_err(store_err)?,
                    name: col_str(r, 3).map_err(store_err)?,
                    value: col_str(r, 4).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn scenario_tags(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<WebTagRow>> {
        if scenario_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select httptesttagid,httptestid,tag,value from httptest_tag \
                 where httptestid in {} order by httptestid,httptesttagid",
                in_list(scenario_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(WebTagRow {
                    tag_id: col_u64(r, 0).map_err(store_err)?,
                    scenario_id: col_u64(r, 1).map_err(store_err)?,
                    tag: col_str(r, 2).map_err(store_err)?,
                    value: col_str(r, 3).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn scenario_items(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<ScenarioItemRow>> {
        if scenario_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select httptestitemid,httptestid,itemid,type from httptestitem \
                 where httptestid in {}",
                in_list(scenario_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(ScenarioItemRow {
                    row_id: col_u64(r, 0).map_err(store_err)?,
                    scenario_id: col_u64(r, 1).map_err(store_err)?,
                    item_id: col_u64(r, 2).map_err(store_err)?,
                    item_purpose: col_i32(r, 3).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn step_items(&self, step_ids: &[StepId]) -> StoreResult<Vec<StepItemRow>> {
        if step_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select httpstepitemid,httpstepid,itemid,type from httpstepitem \
                 where httpstepid in {}",
                in_list(step_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(StepItemRow {
                    row_id: col_u64(r, 0).map_err(store_err)?,
                    step_id: col_u64(r, 1).map_err(store_err)?,
                    item_id: col_u64(r, 2).map_err(store_err)?,
                    item_purpose: col_i32(r, 3).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn insert_scenarios(&self, rows: &[WebScenarioRow]) -> StoreResult<()> {
        self.bulk_insert(
            "httptest",
            &[
                "httptestid",
                "name",
                "delay",
                "status",
                "agent",
                "authentication",
                "http_user",
                "http_password",
                "http_proxy",
                "retries",
                "hostid",
                "templateid",
            ],
            rows.iter()
                .map(|s| {
                    vec![
                        s.scenario_id.to_string(),
                        quoted(&s.name),
                        quoted(&s.delay),
                        s.status.to_string(),
                        quoted(&s.agent),
                        s.authentication.to_string(),
                        quoted(&s.http_user),
                        quoted(&s.http_password),
                        quoted(&s.http_proxy),
                        s.retries.to_string(),
                        s.host_id.to_string(),
                        opt_id(s.template_id),
                    ]
                })
                .collect(),
        )
    }

    fn update_scenario_template(
        &self,
        scenario_id: ScenarioId,
        template_id: ScenarioId,
    ) -> StoreResult<()> {
        self.execute(&format!(
            "update httptest set templateid={template_id} where httptestid={scenario_id}"
        ))
    }

    fn insert_steps(&self, rows: &[WebStepRow]) -> StoreResult<()> {
        self.bulk_insert(
            "httpstep",
            &[
                "httpstepid",
                "httptestid",
                "name",
                "no",
                "url",
                "timeout",
                "posts",
                "required",
                "status_codes",
                "follow_redirects",
                "retrieve_mode",
                "post_type",
            ],
            rows.iter()
                .map(|s| {
                    vec![
                        s.step_id.to_string(),
                        s.scenario_id.to_string(),
                        quoted(&s.name),
                        s.no.to_string(),
                        quoted(&s.url),
                        quoted(&s.timeout),
                        quoted(&s.posts),
                        quoted(&s.required),
                        quoted(&s.status_codes),
                        s.follow_redirects.to_string(),
                        s.retrieve_mode.to_string(),
                        s.post_type.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn insert_scenario_fields(&self, rows: &[WebFieldRow]) -> StoreResult<()> {
        self.bulk_insert(
            "httptest_field",
            &["httptest_fieldid", "httptestid", "type", "name", "value"],
            rows.iter()
                .map(|f| {
                    vec![
                        f.field_id.to_string(),
                        f.owner_id.to_string(),
                        codes::field_kind_code(f.kind).to_string(),
                        quoted(&f.name),
                        quoted(&f.value),
                    ]
                })
                .collect(),
        )
    }

    fn insert_step_fields(&self, rows: &[WebFieldRow]) -> StoreResult<()> {
        self.bulk_insert(
            "httpstep_field",
            &["httpstep_fieldid", "httpstepid", "type", "name", "value"],
            rows.iter()
                .map(|f| {
                    vec![
                        f.field_id.to_string(),
                        f.owner_id.to_string(),
                        codes::field_kind_code(f.kind).to_string(),
                        quoted(&f.name),
                        quoted(&f.value),
                    ]
                })
                .collect(),
        )
    }

    fn insert_scenario_items(&self, rows: &[ScenarioItemRow]) -> StoreResult<()> {
        self.bulk_insert(
            "httptestitem",
            &["httptestitemid", "httptestid", "itemid", "type"],
            rows.iter()
                .map(|si| {
                    vec![
                        si.row_id.to_string(),
                        si.scenario_id.to_string(),
                        si.item_id.to_string(),
                        si.item_purpose.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn insert_step_items(&self, rows: &[StepItemRow]) -> StoreResult<()> {
        self.bulk_insert(
            "httpstepitem",
            &["httpstepitemid", "httpstepid", "itemid", "type"],
            rows.iter()
                .map(|si| {
                    vec![
                        si.row_id.to_string(),
                        si.step_id.to_string(),
                        si.item_id.to_string(),
                        si.item_purpose.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn insert_web_tags(&self, rows: &[WebTagRow]) -> StoreResult<()> {
        self.bulk_insert(
            "httptest_tag",
            &["httptesttagid", "httptestid", "tag", "value"],
            rows.iter()
                .map(|t| {
                    vec![
                        t.tag_id.to_string(),
                        t.scenario_id.to_string(),
                        quoted(&t.tag),
                        quoted(&t.value),
                    ]
                })
                .collect(),
        )
    }

    fn delete_scenarios(&self, scenario_ids: &[ScenarioId]) -> StoreResult<()> {
        if scenario_ids.is_empty() {
            return Ok(());
        }
        let list = in_list(scenario_ids);
        let mut buffer = SqlBuffer::new(&self.client);
        for sql in [
            format!(
                "delete from httpstep_field where httpstepid in \
                 (select httpstepid from httpstep where httptestid in {list})"
            ),
            format!(
                "delete from httpstepitem where httpstepid in \
                 (select httpstepid from httpstep where httptestid in {list})"
            ),
            format!("delete from httpstep where httptestid in {list}"),
            format!("delete from httptest_field where httptestid in {list}"),
            format!("delete from httptestitem where httptestid in {list}"),
            format!("delete from httptest_tag where httptestid in {list}"),
            format!("delete from httptest where httptestid in {list}"),
        ] {
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn scenario_backing_items(&self, scenario_ids: &[ScenarioId]) -> StoreResult<Vec<ItemId>> {
        if scenario_ids.is_empty() {
            return Ok(Vec::new());
        }
        let list = in_list(scenario_ids);
        let rows = self
            .client
            .query(&format!(
                "select hsi.itemid from httpstepitem hsi,httpstep hs \
                 where hsi.httpstepid=hs.httpstepid and hs.httptestid in {list} \
                 union all select hti.itemid from httptestitem hti \
                 where hti.httptestid in {list}"
            ))
            .map_err(store_err)?;
        let mut ids: Vec<ItemId> = rows
            .iter()
            .map(|r| col_u64(r, 0).map_err(store_err))
            .collect::<StoreResult<_>>()?;
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    fn sysmap_elements(
        &self,
        kind: SysmapElementKind,
        referenced_ids: &[u64],
    ) -> StoreResult<Vec<SysmapElementRow>> {
        if referenced_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = self
            .client
            .query(&format!(
                "select distinct selementid,elementid from sysmaps_elements \
                 where elementtype={} and elementid in {}",
                codes::sysmap_kind_code(kind),
                in_list(referenced_ids)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                Ok(SysmapElementRow {
                    element_id: col_u64(r, 0).map_err(store_err)?,
                    kind,
                    referenced_id: col_u64(r, 1).map_err(store_err)?,
                })
            })
            .collect()
    }

    fn delete_sysmap_elements(&self, element_ids: &[u64]) -> StoreResult<()> {
        if element_ids.is_empty() {
            return Ok(());
        }
        self.execute(&format!(
            "delete from sysmaps_elements where selementid in {}",
            in_list(element_ids)
        ))
    }

    fn action_conditions(
        &self,
        kind: ConditionKind,
        referenced_ids: &[u64],
    ) -> StoreResult<Vec<ActionConditionRow>> {
        if referenced_ids.is_empty() {
            return Ok(Vec::new());
        }
        let values: Vec<String> = referenced_ids.iter().map(|id| id.to_string()).collect();
        let rows = self
            .client
            .query(&format!(
                "select conditionid,actionid,value from conditions \
                 where conditiontype={} and value in {}",
                codes::condition_kind_code(kind),
                str_list(&values)
            ))
            .map_err(store_err)?;
        rows.iter()
            .map(|r| {
                let value = col_str(r, 2).map_err(store_err)?;
                Ok(ActionConditionRow {
                    condition_id: col_u64(r, 0).map_err(store_err)?,
                    action_id: col_u64(r, 1).map_err(store_err)?,
                    kind,
                    value: value.parse().unwrap_or(0),
                })
            })
            .collect()
    }

    fn delete_action_conditions(&self, condition_ids: &[u64]) -> StoreResult<()> {
        if condition_ids.is_empty() {
            return Ok(());
        }
        let list = in_list(condition_ids);
        let mut buffer = SqlBuffer::new(&self.client);
        for sql in [
            format!(
                "update actions set status=1 where actionid in \
                 (select distinct actionid from conditions where conditionid in {list})"
            ),
            format!("delete from conditions where conditionid in {list}"),
        ] {
            buffer.push(&self.client, &sql).map_err(store_err)?;
        }
        buffer.flush(&self.client).map_err(store_err)
    }

    fn enqueue_housekeeper(&self, rows: &[HousekeeperRow]) -> StoreResult<()> {
        self.bulk_insert(
            "housekeeper",
            &["housekeeperid", "tablename", "field", "value"],
            rows.iter()
                .map(|h| {
                    vec![
                        h.housekeeper_id.to_string(),
                        quoted(&h.table_name),
                        quoted(&h.field),
                        h.value.to_string(),
                    ]
                })
                .collect(),
        )
    }

    fn insert_audit_rows(&self, rows: &[AuditRow]) -> StoreResult<()> {
        self.bulk_insert(
            "auditlog2",
            &[
                "auditid",
                "userid",
                "clock",
                "action",
                "ip",
                "resourceid",
                "resourcename",
                "resourcetype",
                "recsetid",
                "details",
            ],
            rows.iter()
                .map(|a| {
                    vec![
                        quoted(&a.audit_id),
                        a.user_id.to_string(),
                        a.clock.to_string(),
                        a.action.to_string(),
                        quoted(&a.ip),
                        a.resource_id.to_string(),
                        quoted(&a.resource_name),
                        a.resource_type.to_string(),
                        quoted(&a.recordset_id),
                        quoted(&a.details_json),
                    ]
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RecordingClient;
    use templink_model::{HostKind, TriggerUpdateFlags};

    fn store() -> SqlStore<RecordingClient> {
        SqlStore::new(RecordingClient::new())
    }

    #[test]
    fn bulk_insert_renders_multi_row_values() {
        let store = store();
        store
            .insert_template_links(&[
                TemplateLinkRow {
                    link_id: 1,
                    host_id: 10,
                    template_id: 20,
                },
                TemplateLinkRow {
                    link_id: 2,
                    host_id: 10,
                    template_id: 21,
                },
            ])
            .unwrap();

        let executed = store.client().executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0],
            "insert into hosts_templates (hosttemplateid,hostid,templateid) \
             values (1,10,20),(2,10,21)"
        );
    }

    #[test]
    fn empty_insert_is_a_noop() {
        let store = store();
        store.insert_template_links(&[]).unwrap();
        assert!(store.client().executed().is_empty());
    }

    #[test]
    fn trigger_update_emits_only_dirty_columns() {
        let store = store();
        let mut dirty = TriggerUpdateFlags::none();
        dirty.set(TriggerUpdateFlags::OPDATA);
        store
            .update_triggers(&[TriggerUpdate {
                trigger_id: 7,
                template_id: 3,
                dirty,
                flags: templink_model::ItemKind::Normal,
                recovery_mode: templink_model::RecoveryMode::Expression,
                correlation_mode: templink_model::CorrelationMode::Disabled,
                correlation_tag: String::new(),
                manual_close: 0,
                opdata: "cpu: {ITEM.LASTVALUE1}".into(),
                discover: 0,
                event_name: String::new(),
            }])
            .unwrap();

        let executed = store.client().executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0],
            "begin\nupdate triggers set templateid=3,opdata='cpu: {ITEM.LASTVALUE1}' \
             where triggerid=7;\nend;\n"
        );
    }

    #[test]
    fn string_literals_are_escaped() {
        let store = store();
        let mut trigger = templink_model::TriggerRow::new(5, "disk d:\\ 90% 'full'", "{9}>0");
        trigger.comments = String::new();
        store.insert_triggers(&[trigger]).unwrap();

        let executed = store.client().executed();
        assert!(executed[0].contains("'disk d:\\\\ 90% ''full'''"));
    }

    #[test]
    fn host_query_decodes_kind() {
        let store = store();
        store.client().push_rows(vec![vec![
            SqlValue::Int(3),
            SqlValue::Str("Linux by agent".into()),
            SqlValue::Str("Linux by agent".into()),
            SqlValue::Int(3),
            SqlValue::Int(0),
        ]]);

        let host = store.host(3).unwrap().unwrap();
        assert_eq!(host.kind, HostKind::Template);
        assert_eq!(
            store.client().queries()[0],
            "select hostid,host,name,status,flags from hosts where hostid=3"
        );
    }

    #[test]
    fn delete_scenarios_orders_children_first() {
        let store = store();
        store.delete_scenarios(&[4]).unwrap();

        let executed = store.client().executed();
        assert_eq!(executed.len(), 1);
        let batch = &executed[0];
        let step_fields = batch.find("delete from httpstep_field").unwrap();
        let steps = batch.find("delete from httpstep where").unwrap();
        let scenarios = batch.find("delete from httptest where").unwrap();
        assert!(step_fields < steps && steps < scenarios);
    }

    #[test]
    fn functions_query_joins_item_keys() {
        let store = store();
        store.client().push_rows(vec![vec![
            SqlValue::Int(900),
            SqlValue::Int(50),
            SqlValue::Int(11),
            SqlValue::Str("cpu.util".into()),
            SqlValue::Str("avg".into()),
            SqlValue::Str("5m".into()),
        ]]);

        let rows = store.functions_with_keys(&[50]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_key, "cpu.util");
        assert!(store.client().queries()[0].contains("i.itemid=f.itemid"));
    }
}
