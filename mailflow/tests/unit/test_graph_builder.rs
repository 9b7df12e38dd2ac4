//! Node-graph builder tests

use mailflow::builder::{Connection, GraphBuilder, NodeDataPatch};
use mailflow::errors::{AutomationError, ReferenceError};
use mailflow::models::{
    ActionType, Branch, CanvasPosition, ConditionKind, NodeConfig, NodeKind, TriggerType,
    WorkflowGraph,
};
use mailflow::validation::graph_errors;
use tokio_test::{assert_err, assert_ok};

struct Canvas {
    trigger: String,
    condition: String,
    yes: String,
    no: String,
}

fn node(builder: &mut GraphBuilder<'_>, kind: NodeKind, label: &str, y: f64) -> String {
    builder.add_node(NodeConfig::empty(kind), CanvasPosition::new(250.0, y), label, None)
}

fn branching_canvas(graph: &mut WorkflowGraph) -> Canvas {
    let mut builder = GraphBuilder::new(graph);

    let trigger = node(&mut builder, NodeKind::Trigger, "New subscriber", 0.0);
    let condition = node(&mut builder, NodeKind::Condition, "Opened welcome?", 150.0);
    let yes = node(&mut builder, NodeKind::Action, "Tag engaged", 300.0);
    let no = node(&mut builder, NodeKind::Action, "Send reminder", 300.0);

    builder
        .connect(Connection::new(trigger.as_str(), condition.as_str()))
        .unwrap();
    builder
        .connect(Connection::new(condition.as_str(), yes.as_str()).from_branch(Branch::True))
        .unwrap();
    builder
        .connect(Connection::new(condition.as_str(), no.as_str()).from_branch(Branch::False))
        .unwrap();

    Canvas {
        trigger,
        condition,
        yes,
        no,
    }
}

#[test]
fn test_cascade_delete_leaves_no_dangling_edges() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);
    assert_eq!(graph.edges().len(), 3);

    let mut builder = GraphBuilder::new(&mut graph);
    let removed = assert_ok!(builder.delete_node(&canvas.condition));
    assert_eq!(removed.kind(), NodeKind::Condition);

    assert!(graph.edges().is_empty());
    assert_eq!(graph.nodes().len(), 3);
    assert!(graph_errors(&graph).is_empty());
    assert!(graph.node(&canvas.yes).is_some());
}

#[test]
fn test_connect_to_missing_node_is_rejected() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);
    let edges_before = graph.edges().to_vec();

    let mut builder = GraphBuilder::new(&mut graph);
    let err = assert_err!(builder.connect(Connection::new(canvas.yes.as_str(), "action-404")));
    assert!(matches!(
        err,
        AutomationError::Reference(ReferenceError::UnknownNode(ref id)) if id == "action-404"
    ));
    assert_err!(builder.connect(Connection::new("trigger-404", canvas.yes.as_str())));

    assert_eq!(graph.edges(), edges_before.as_slice());
}

#[test]
fn test_identical_connection_is_not_duplicated() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);
    let existing = graph.outgoing(&canvas.trigger).next().unwrap().id.clone();

    let mut builder = GraphBuilder::new(&mut graph);
    let id = assert_ok!(builder.connect(Connection::new(
        canvas.trigger.as_str(),
        canvas.condition.as_str()
    )));

    assert_eq!(id, existing);
    assert_eq!(graph.edges().len(), 3);
}

#[test]
fn test_only_conditions_fan_out() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);

    let mut builder = GraphBuilder::new(&mut graph);
    let err = assert_err!(builder.connect(Connection::new(
        canvas.trigger.as_str(),
        canvas.no.as_str()
    )));
    assert!(matches!(
        err,
        AutomationError::Reference(ReferenceError::FanOut { .. })
    ));
    assert_eq!(graph.edges().len(), 3);
}

#[test]
fn test_new_edges_carry_arrow_and_stroke() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);

    let edge = graph.outgoing(&canvas.condition).next().unwrap();
    assert_eq!(edge.marker_end.kind, "arrowclosed");
    assert_eq!(edge.style.stroke_width, 2.0);
    assert_eq!(edge.source_handle.as_deref(), Some("true"));
}

#[test]
fn test_disconnect_then_reconnect() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);
    let edge_id = graph.outgoing(&canvas.trigger).next().unwrap().id.clone();

    let mut builder = GraphBuilder::new(&mut graph);
    assert_ok!(builder.disconnect(&edge_id));
    assert_err!(builder.disconnect(&edge_id));
    assert_ok!(builder.connect(Connection::new(canvas.trigger.as_str(), canvas.yes.as_str())));

    assert_eq!(graph.edges().len(), 3);
    assert!(graph.edge(&edge_id).is_none());
}

#[test]
fn test_update_node_data_merges_fields() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);
    let position = graph.node(&canvas.condition).unwrap().position;

    let mut builder = GraphBuilder::new(&mut graph);
    assert_ok!(builder.update_node_data(
        &canvas.condition,
        NodeDataPatch {
            condition_type: Some(Some(ConditionKind::OpenedEmail)),
            condition_value: Some("welcome-1".to_string()),
            ..Default::default()
        },
    ));
    assert_ok!(builder.update_node_data(
        &canvas.trigger,
        NodeDataPatch {
            description: Some(Some("Fires on signup".to_string())),
            trigger_type: Some(Some(TriggerType::SubscriberAdded)),
            ..Default::default()
        },
    ));

    let condition = graph.node(&canvas.condition).unwrap();
    assert_eq!(condition.label, "Opened welcome?");
    assert_eq!(condition.position, position);
    assert_eq!(
        condition.config,
        NodeConfig::Condition {
            condition_type: Some(ConditionKind::OpenedEmail),
            condition_value: "welcome-1".to_string()
        }
    );
    let trigger = graph.node(&canvas.trigger).unwrap();
    assert_eq!(trigger.description.as_deref(), Some("Fires on signup"));
}

#[test]
fn test_foreign_field_is_rejected_whole() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);
    let before = graph.clone();

    let mut builder = GraphBuilder::new(&mut graph);
    let err = assert_err!(builder.update_node_data(
        &canvas.yes,
        NodeDataPatch {
            label: Some("Renamed".to_string()),
            action_type: Some(Some(ActionType::AddTag)),
            condition_value: Some("x".to_string()),
            ..Default::default()
        },
    ));

    assert_eq!(err.issues().len(), 1);
    assert_eq!(graph, before);
}

#[test]
fn test_move_node() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);

    let mut builder = GraphBuilder::new(&mut graph);
    assert_ok!(builder.move_node(&canvas.no, CanvasPosition::new(400.0, 320.0)));
    assert_err!(builder.move_node("action-404", CanvasPosition::default()));

    assert_eq!(
        graph.node(&canvas.no).unwrap().position,
        CanvasPosition::new(400.0, 320.0)
    );
}

#[test]
fn test_sub_type_can_be_cleared() {
    let mut graph = WorkflowGraph::new();
    let canvas = branching_canvas(&mut graph);

    let mut builder = GraphBuilder::new(&mut graph);
    assert_ok!(builder.update_node_data(
        &canvas.trigger,
        NodeDataPatch {
            trigger_type: Some(Some(TriggerType::TagAdded)),
            ..Default::default()
        },
    ));
    assert_ok!(builder.update_node_data(
        &canvas.trigger,
        NodeDataPatch {
            label: Some("Any event".to_string()),
            ..Default::default()
        },
    ));
    assert_eq!(
        graph.node(&canvas.trigger).unwrap().config,
        NodeConfig::Trigger {
            trigger_type: Some(TriggerType::TagAdded)
        }
    );

    let mut builder = GraphBuilder::new(&mut graph);
    assert_ok!(builder.update_node_data(
        &canvas.trigger,
        NodeDataPatch {
            trigger_type: Some(None),
            ..Default::default()
        },
    ));
    assert_eq!(
        graph.node(&canvas.trigger).unwrap().config,
        NodeConfig::Trigger { trigger_type: None }
    );
    assert_eq!(graph.node(&canvas.trigger).unwrap().label, "Any event");
}
