//! End-to-end linkage scenarios over the in-memory store.

use templink_audit::CuidGenerator;
use templink_engine::{LinkEngine, LinkError};
use templink_expr::Expression;
use templink_model::{FunctionRow, TriggerRow};
use templink_testkit::Fixture;

const RECORDSET: &str = "c0000000000000000000000s1";

fn generator() -> CuidGenerator {
    CuidGenerator::with_pid("test-node", 99)
}

/// Empty template: the only DML is the link row, the only audit entry is
/// the host-level add.
#[test]
fn empty_template_link() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    let before = fixture.counts();

    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    let outcome = engine.link_templates(host, &[template], RECORDSET).unwrap();

    assert_eq!(outcome.linked, vec![template]);
    assert_eq!(outcome.triggers.added, 0);
    assert_eq!(outcome.audit_rows, 1);

    let after = fixture.counts();
    assert_eq!(after.links, before.links + 1);
    assert_eq!(after.triggers, before.triggers);
    assert_eq!(after.graphs, before.graphs);

    fixture.store.read(|data| {
        assert!(data
            .links
            .iter()
            .any(|l| l.host_id == host && l.template_id == template));
        assert_eq!(data.audit.len(), 1);
        assert_eq!(data.audit[0].action, 1); // add
        assert_eq!(data.audit[0].resource_type, 4); // host
        assert_eq!(data.audit[0].resource_id, host);
        assert_eq!(data.audit[0].recordset_id, RECORDSET);
    });
}

/// An equivalent host trigger is adopted: parent link set, expression text
/// untouched, no new trigger row.
#[test]
fn trigger_equivalence_link() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    let template_item = fixture.item(template, "cpu.util");
    let (template_trigger, _) = fixture.trigger("CPU high", template_item, "avg,5m", ">5");
    let host_item = fixture.item(host, "cpu.util");
    let (host_trigger, host_function) = fixture.trigger("CPU high", host_item, "avg,5m", ">5");

    let before = fixture.counts();
    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    engine.link_templates(host, &[template], RECORDSET).unwrap();

    let after = fixture.counts();
    assert_eq!(after.triggers, before.triggers);
    assert_eq!(after.functions, before.functions);

    fixture.store.read(|data| {
        let linked = data
            .triggers
            .iter()
            .find(|t| t.trigger_id == host_trigger)
            .unwrap();
        assert_eq!(linked.template_id, Some(template_trigger));
        assert_eq!(linked.expression, format!("{{{host_function}}}>5"));

        // one host add plus one trigger update
        let trigger_rows: Vec<_> = data
            .audit
            .iter()
            .filter(|a| a.resource_id == host_trigger)
            .collect();
        assert_eq!(trigger_rows.len(), 1);
        assert_eq!(trigger_rows[0].action, 2); // update
    });
}

/// A template trigger over two items is copied with freshly allocated
/// functions; every placeholder in the stored expression resolves to a
/// function owned by the new trigger.
#[test]
fn trigger_insert_rewrites_functions() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    let template_cpu = fixture.item(template, "cpu.util");
    let template_load = fixture.item(template, "cpu.load");
    fixture.item(host, "cpu.util");
    fixture.item(host, "cpu.load");

    let trigger_id = fixture.next_id();
    let f1 = fixture.next_id();
    let f2 = fixture.next_id();
    fixture.store.seed(|data| {
        data.triggers.push(TriggerRow::new(
            trigger_id,
            "CPU trouble",
            format!("{{{f1}}}>5 or {{{f2}}}>10"),
        ));
        data.functions.push(FunctionRow {
            function_id: f1,
            trigger_id,
            item_id: template_cpu,
            name: "avg".into(),
            parameter: "5m".into(),
        });
        data.functions.push(FunctionRow {
            function_id: f2,
            trigger_id,
            item_id: template_load,
            name: "avg".into(),
            parameter: "5m".into(),
        });
    });

    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    let outcome = engine.link_templates(host, &[template], RECORDSET).unwrap();
    assert_eq!(outcome.triggers.added, 1);

    fixture.store.read(|data| {
        let copied = data
            .triggers
            .iter()
            .find(|t| t.template_id == Some(trigger_id))
            .expect("copied trigger");
        let own_functions: Vec<u64> = data
            .functions
            .iter()
            .filter(|f| f.trigger_id == copied.trigger_id)
            .map(|f| f.function_id)
            .collect();
        assert_eq!(own_functions.len(), 2);

        let expression = Expression::parse(&copied.expression).unwrap();
        let referenced = expression.function_ids();
        assert_eq!(referenced.len(), 2);
        for function_id in referenced {
            assert!(own_functions.contains(&function_id));
            // fresh ids, not the template's
            assert_ne!(function_id, f1);
            assert_ne!(function_id, f2);
        }
    });
}

/// Prototype macro sub-diff: one inserted, one deleted, one untouched;
/// the prototype's change record carries exactly three field entries.
#[test]
fn prototype_macro_sub_diff() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    let template_rule = fixture.rule(template, "vm.discovery");
    let host_rule = fixture.mirrored_item(host, "vm.discovery", template_rule);
    fixture.store.seed(|data| {
        // rules keep their flavour even when mirrored
        for item in data.items.iter_mut().filter(|i| i.item_id == host_rule) {
            item.flags = templink_model::ItemKind::Rule;
        }
    });

    let template_prototype = fixture.prototype(template_rule, "{#VM.NAME}");
    fixture.prototype_macro(template_prototype, "{$X}", "1");
    fixture.prototype_macro(template_prototype, "{$Y}", "2");

    // prior link left a host prototype with {$X} and a stale {$Z}
    let host_prototype = fixture.prototype(host_rule, "{#VM.NAME}");
    fixture.store.seed(|data| {
        for prototype in data
            .host_prototypes
            .iter_mut()
            .filter(|p| p.host_id == host_prototype)
        {
            prototype.template_id = Some(template_prototype);
        }
    });
    let kept_macro = fixture.prototype_macro(host_prototype, "{$X}", "1");
    fixture.prototype_macro(host_prototype, "{$Z}", "3");

    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    let outcome = engine.link_templates(host, &[template], RECORDSET).unwrap();
    assert_eq!(outcome.prototypes.updated, 1);

    fixture.store.read(|data| {
        let names: Vec<&str> = data
            .host_macros
            .iter()
            .filter(|m| m.host_id == host_prototype)
            .map(|m| m.macro_name.as_str())
            .collect();
        assert!(names.contains(&"{$X}"));
        assert!(names.contains(&"{$Y}"));
        assert!(!names.contains(&"{$Z}"));
        // untouched macro kept its row
        assert!(data
            .host_macros
            .iter()
            .any(|m| m.macro_id == kept_macro && m.macro_name == "{$X}"));

        let entry = data
            .audit
            .iter()
            .find(|a| a.resource_id == host_prototype)
            .expect("prototype change record");
        let details: serde_json::Value = serde_json::from_str(&entry.details_json).unwrap();
        assert_eq!(details.as_object().unwrap().len(), 3);
    });
}

/// Step-parity violation is caught before any write.
#[test]
fn scenario_step_mismatch_rejects_the_link() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    fixture.scenario(template, "Login", &["GET /", "POST /auth"]);
    fixture.scenario(host, "Login", &["GET /", "POST /login"]);
    let before = fixture.counts();

    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    let err = engine
        .link_templates(host, &[template], RECORDSET)
        .unwrap_err();

    assert!(matches!(err, LinkError::Validation { .. }));
    assert_eq!(
        err.to_string(),
        "web scenario \"Login\" already exists on the host (steps are not identical)"
    );

    // no DML, no audit
    assert_eq!(fixture.counts(), before);
    fixture.store.read(|data| assert!(data.audit.is_empty()));
}

/// Unlink removes the copied trigger, its functions and the link row;
/// independently owned host items survive.
#[test]
fn unlink_cascades_copied_entities() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    let template_item = fixture.item(template, "cpu.util");
    fixture.trigger("CPU high", template_item, "avg,5m", ">5");
    let host_item = fixture.item(host, "cpu.util");

    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    engine.link_templates(host, &[template], RECORDSET).unwrap();

    let outcome = engine
        .unlink_templates(host, &[template], "c0000000000000000000000s6")
        .unwrap();
    assert_eq!(outcome.unlinked, vec![template]);
    assert_eq!(outcome.removed.triggers, 1);

    fixture.store.read(|data| {
        // nothing with a parent link into T1 survives on the host
        assert!(data
            .triggers
            .iter()
            .all(|t| t.template_id.is_none() || t.trigger_id < 100_000));
        assert!(!data
            .links
            .iter()
            .any(|l| l.host_id == host && l.template_id == template));
        // functions of the copied trigger went with it
        assert!(data.functions.iter().all(|f| f.function_id < 100_000));
        // the independently owned host item remains
        assert!(data.items.iter().any(|i| i.item_id == host_item));

        // a delete entry for the trigger was flushed
        assert!(data
            .audit
            .iter()
            .any(|a| a.action == 3 && a.recordset_id == "c0000000000000000000000s6"));
    });
}

/// Linking the same set twice is a no-op on the second pass.
#[test]
fn relink_is_idempotent() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    let template_item = fixture.item(template, "cpu.util");
    fixture.trigger("CPU high", template_item, "avg,5m", ">5");
    fixture.item(host, "cpu.util");
    fixture.graph("CPU usage", &[template_item]);

    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    engine.link_templates(host, &[template], RECORDSET).unwrap();
    let after_first = fixture.counts();

    let second = engine
        .link_templates(host, &[template], "c0000000000000000000000r2")
        .unwrap();
    assert!(second.linked.is_empty());
    assert_eq!(second.audit_rows, 0);
    assert_eq!(fixture.counts(), after_first);
}

/// Link followed by unlink restores the starting entity counts.
#[test]
fn link_unlink_round_trip() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    let template_item = fixture.item(template, "cpu.util");
    fixture.trigger("CPU high", template_item, "avg,5m", ">5");
    fixture.graph("CPU usage", &[template_item]);
    fixture.scenario(template, "Login", &["GET /"]);
    fixture.item(host, "cpu.util");

    let before = fixture.counts();
    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    engine.link_templates(host, &[template], RECORDSET).unwrap();
    assert_ne!(fixture.counts(), before);

    engine
        .unlink_templates(host, &[template], "c0000000000000000000000r3")
        .unwrap();
    assert_eq!(fixture.counts(), before);
}

/// One audit row per affected entity, action matching the DML kind.
#[test]
fn audit_rows_cover_every_affected_entity() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    let template_item = fixture.item(template, "cpu.util");
    fixture.trigger("CPU high", template_item, "avg,5m", ">5");
    fixture.graph("CPU usage", &[template_item]);
    fixture.scenario(template, "Login", &["GET /"]);
    fixture.item(host, "cpu.util");

    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    let outcome = engine.link_templates(host, &[template], RECORDSET).unwrap();

    // host + trigger + graph + scenario
    assert_eq!(outcome.audit_rows, 4);
    fixture.store.read(|data| {
        assert_eq!(data.audit.len(), 4);
        assert!(data.audit.iter().all(|a| a.action == 1));
        let mut resource_ids: Vec<u64> = data.audit.iter().map(|a| a.resource_id).collect();
        resource_ids.sort_unstable();
        resource_ids.dedup();
        assert_eq!(resource_ids.len(), 4);
    });
}

/// Item keys stay unique per host through a link.
#[test]
fn item_keys_stay_unique_per_host() {
    let mut fixture = Fixture::new();
    let template = fixture.template("T1");
    let host = fixture.host("H1");
    let template_item = fixture.item(template, "cpu.util");
    fixture.trigger("CPU high", template_item, "avg,5m", ">5");
    fixture.item(host, "cpu.util");

    let ids = generator();
    let engine = LinkEngine::with_clock(&fixture.store, &ids, 1_700_000_000);
    engine.link_templates(host, &[template], RECORDSET).unwrap();

    fixture.store.read(|data| {
        let mut seen = std::collections::HashSet::new();
        for item in &data.items {
            assert!(
                seen.insert((item.host_id, item.key.clone())),
                "duplicate key {} on host {}",
                item.key,
                item.host_id
            );
        }
    });
}
