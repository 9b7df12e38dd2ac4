//! Import/export tests

use chrono::{TimeZone, Utc};
use mailflow::builder::{ActionListBuilder, Connection, GraphBuilder, NodeDataPatch};
use mailflow::errors::{AutomationError, ValidationError};
use mailflow::models::{
    ActionConfig, ActionType, AutomationDocument, Branch, CanvasPosition, ConditionConfig,
    ConditionKind, DocumentPatch, NodeConfig, NodeKind, RemoteRef, SendTemplateConfig,
    VersionSnapshot, WaitConfig, WaitUnit,
};
use mailflow::transfer::{export_json, import_json};
use serde_json::json;
use tokio_test::assert_ok;

use crate::common::triggered_document;

fn full_document() -> AutomationDocument {
    let mut doc = triggered_document("Onboarding");
    doc.id = Some(RemoteRef::Number(8));
    doc.description = Some("Three step welcome".to_string());

    let mut actions = ActionListBuilder::new(&mut doc);
    actions
        .add_action(
            ActionType::SendTemplate,
            None,
            Some(ActionConfig::SendTemplate(SendTemplateConfig {
                template_id: Some(RemoteRef::from("tpl_welcome")),
                subject_override: "Welcome aboard".to_string(),
                from_email: "hello@example.com".to_string(),
                from_name: "The Team".to_string(),
            })),
        )
        .unwrap();
    actions
        .add_action(
            ActionType::Wait,
            None,
            Some(ActionConfig::Wait(WaitConfig {
                duration: 2.5,
                unit: WaitUnit::Days,
            })),
        )
        .unwrap();
    let condition = actions
        .add_action(
            ActionType::Condition,
            None,
            Some(ActionConfig::Condition(ConditionConfig {
                kind: ConditionKind::OpenedEmail,
                value: "tpl_welcome".to_string(),
                ..Default::default()
            })),
        )
        .unwrap();
    actions
        .add_branch_action(&condition, Branch::False, ActionType::SendEmail, None, None)
        .unwrap();

    let mut graph = GraphBuilder::new(&mut doc.graph);
    let start = graph.add_node(
        NodeConfig::empty(NodeKind::Trigger),
        CanvasPosition::new(250.0, 50.0),
        "Signup",
        None,
    );
    let check = graph.add_node(
        NodeConfig::empty(NodeKind::Condition),
        CanvasPosition::new(250.0, 200.5),
        "Opened?",
        Some("Checks the first email".to_string()),
    );
    graph
        .update_node_data(
            &check,
            NodeDataPatch {
                condition_type: Some(Some(ConditionKind::OpenedEmail)),
                ..Default::default()
            },
        )
        .unwrap();
    graph.connect(Connection::new(start.as_str(), check.as_str())).unwrap();

    doc.versions.push(VersionSnapshot {
        version: 1,
        user: "ana@example.com".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 2, 14, 30, 0).unwrap(),
        changes: DocumentPatch {
            name: Some("Onboarding v1".to_string()),
            ..Default::default()
        },
    });
    doc
}

#[test]
fn test_export_then_import_is_identity() {
    let doc = full_document();

    let text = assert_ok!(export_json(&doc));
    let back = assert_ok!(import_json(&text));

    assert_eq!(back, doc);
}

#[test]
fn test_export_is_pretty_and_complete() {
    let text = export_json(&full_document()).unwrap();
    assert!(text.contains('\n'));

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    for key in [
        "id",
        "name",
        "description",
        "isActive",
        "trigger",
        "actions",
        "nodes",
        "edges",
        "versions",
    ] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(value["actions"][2]["config"]["falseActions"][0]["type"], json!("send_email"));
    assert_eq!(value["nodes"][1]["data"]["conditionType"], json!("opened_email"));
}

#[test]
fn test_name_only_gives_exactly_two_errors() {
    let err = import_json(r#"{"name":"X"}"#).unwrap_err();
    assert_eq!(
        err.issues(),
        &[ValidationError::MissingTrigger, ValidationError::ActionsNotAList]
    );
}

#[test]
fn test_structural_checks_run_in_order() {
    let err = import_json(r#"{"name": "", "trigger": null, "actions": {}}"#).unwrap_err();
    assert_eq!(
        err.issues(),
        &[
            ValidationError::MissingTrigger,
            ValidationError::ActionsNotAList,
            ValidationError::MissingName
        ]
    );
}

#[test]
fn test_syntax_error_is_a_parse_error() {
    let err = import_json("{not json").unwrap_err();
    assert!(matches!(err, AutomationError::Parse(_)));
    assert!(err.issues().is_empty());
}

#[test]
fn test_wrong_field_shape_is_malformed() {
    let text = json!({
        "name": "Shapes",
        "trigger": {"type": "subscriber_added"},
        "actions": [{"id": "w", "type": "wait", "config": {"duration": "soon"}}]
    })
    .to_string();

    let err = import_json(&text).unwrap_err();
    assert!(matches!(err.issues(), [ValidationError::Malformed(_)]));
}

#[test]
fn test_null_config_and_fractional_wait_import() {
    let text = json!({
        "name": "Nulls",
        "trigger": {"type": "subscriber_added", "config": null},
        "actions": [{"id": "w", "type": "wait", "position": 0, "config": {"duration": 1.5, "unit": "hours"}}]
    })
    .to_string();

    let doc = assert_ok!(import_json(&text));
    assert!(doc.trigger.as_ref().unwrap().config.is_empty());
    assert_eq!(
        doc.actions[0].config,
        ActionConfig::Wait(WaitConfig {
            duration: 1.5,
            unit: WaitUnit::Hours
        })
    );
}

#[test]
fn test_dangling_edges_are_refused_on_import() {
    let text = json!({
        "name": "Dangling",
        "trigger": {"type": "api_call"},
        "actions": [],
        "nodes": [{"id": "trigger-1", "type": "trigger", "position": {"x": 0, "y": 0}, "data": {"label": "Start"}}],
        "edges": [{"id": "e1", "source": "trigger-1", "target": "action-2"}]
    })
    .to_string();

    let err = import_json(&text).unwrap_err();
    assert_eq!(
        err.issues(),
        &[ValidationError::DanglingEdge {
            edge_id: "e1".to_string(),
            node_id: "action-2".to_string()
        }]
    );
}
