//! Visual node-graph builder

use tracing::debug;

use crate::errors::{AutomationError, ReferenceError, ValidationError};
use crate::models::action::{ActionType, Branch, ConditionKind};
use crate::models::automation::TriggerType;
use crate::models::graph::{
    CanvasPosition, EdgeMarker, EdgeStyle, GraphEdge, GraphNode, NodeConfig, NodeKind,
    WorkflowGraph,
};
use crate::utils::now_millis;

/// Parameters of a canvas connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub source: String,
    pub target: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        }
    }

    /// Leave a condition node through its `true` or `false` port
    pub fn from_branch(mut self, branch: Branch) -> Self {
        self.source_handle = Some(branch.as_str().to_string());
        self
    }

    fn edge_id(&self) -> String {
        format!(
            "edge-{}{}-{}{}",
            self.source,
            self.source_handle.as_deref().unwrap_or_default(),
            self.target,
            self.target_handle.as_deref().unwrap_or_default()
        )
    }

    fn matches(&self, edge: &GraphEdge) -> bool {
        edge.source == self.source
            && edge.target == self.target
            && edge.source_handle == self.source_handle
            && edge.target_handle == self.target_handle
    }
}

/// Partial update of a node's `data`. `None` leaves a field alone;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDataPatch {
    pub label: Option<String>,
    pub description: Option<Option<String>>,
    pub trigger_type: Option<Option<TriggerType>>,
    pub action_type: Option<Option<ActionType>>,
    pub condition_type: Option<Option<ConditionKind>>,
    pub condition_value: Option<String>,
}

/// Mutates the node/edge graph of one document
pub struct GraphBuilder<'a> {
    graph: &'a mut WorkflowGraph,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(graph: &'a mut WorkflowGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &WorkflowGraph {
        self.graph
    }

    /// Append a node and return its generated id
    pub fn add_node(
        &mut self,
        config: NodeConfig,
        position: CanvasPosition,
        label: impl Into<String>,
        description: Option<String>,
    ) -> String {
        let kind = config.kind();
        let base = format!("{}-{}", kind, now_millis());
        let mut id = base.clone();
        let mut n = 1;
        while self.graph.contains_node(&id) {
            id = format!("{}-{}", base, n);
            n += 1;
        }

        self.graph.push_node(GraphNode {
            id: id.clone(),
            position,
            label: label.into(),
            description,
            config,
        });
        debug!("Added {} node {}", kind, id);
        id
    }

    /// Connect two existing nodes. Re-connecting an identical pair returns the
    /// existing edge id.
    pub fn connect(&mut self, connection: Connection) -> Result<String, AutomationError> {
        let source = self
            .graph
            .node(&connection.source)
            .ok_or_else(|| ReferenceError::UnknownNode(connection.source.clone()))?;
        if !self.graph.contains_node(&connection.target) {
            return Err(ReferenceError::UnknownNode(connection.target.clone()).into());
        }

        if let Some(existing) = self.graph.edges().iter().find(|e| connection.matches(e)) {
            debug!("Connection already exists as {}", existing.id);
            return Ok(existing.id.clone());
        }

        if source.kind() == NodeKind::Condition {
            if let Some(handle) = connection.source_handle.as_deref() {
                if handle != Branch::True.as_str() && handle != Branch::False.as_str() {
                    return Err(ReferenceError::UnknownHandle {
                        node_id: connection.source.clone(),
                        handle: handle.to_string(),
                    }
                    .into());
                }
            }
        } else if self.graph.outgoing(&connection.source).next().is_some() {
            return Err(ReferenceError::FanOut {
                node_id: connection.source.clone(),
            }
            .into());
        }

        let base = connection.edge_id();
        let mut id = base.clone();
        let mut n = 1;
        while self.graph.edge(&id).is_some() {
            id = format!("{}-{}", base, n);
            n += 1;
        }

        self.graph.push_edge(GraphEdge {
            id: id.clone(),
            source: connection.source,
            target: connection.target,
            source_handle: connection.source_handle,
            target_handle: connection.target_handle,
            marker_end: EdgeMarker::default(),
            style: EdgeStyle::default(),
        });
        debug!("Connected {}", id);
        Ok(id)
    }

    /// Remove a single edge
    pub fn disconnect(&mut self, edge_id: &str) -> Result<GraphEdge, AutomationError> {
        let edge = self
            .graph
            .remove_edge(edge_id)
            .ok_or_else(|| ReferenceError::UnknownEdge(edge_id.to_string()))?;
        debug!("Disconnected {}", edge_id);
        Ok(edge)
    }

    /// Merge label, description and sub-type fields into a node's data
    pub fn update_node_data(&mut self, id: &str, patch: NodeDataPatch) -> Result<(), AutomationError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| ReferenceError::UnknownNode(id.to_string()))?;

        // Check before touching anything
        let kind = node.kind();
        let fields = [
            ("triggerType", NodeKind::Trigger, patch.trigger_type.is_some()),
            ("actionType", NodeKind::Action, patch.action_type.is_some()),
            ("conditionType", NodeKind::Condition, patch.condition_type.is_some()),
            ("conditionValue", NodeKind::Condition, patch.condition_value.is_some()),
        ];
        let issues: Vec<ValidationError> = fields
            .iter()
            .filter(|(_, owner, present)| *present && *owner != kind)
            .map(|(field, _, _)| ValidationError::NodeFieldMismatch {
                node_id: id.to_string(),
                kind: kind.to_string(),
                field: field.to_string(),
            })
            .collect();
        if !issues.is_empty() {
            return Err(AutomationError::Validation(issues));
        }

        if let Some(label) = patch.label {
            node.label = label;
        }
        if let Some(description) = patch.description {
            node.description = description;
        }
        match &mut node.config {
            NodeConfig::Trigger { trigger_type } => {
                if let Some(value) = patch.trigger_type {
                    *trigger_type = value;
                }
            }
            NodeConfig::Action { action_type } => {
                if let Some(value) = patch.action_type {
                    *action_type = value;
                }
            }
            NodeConfig::Condition {
                condition_type,
                condition_value,
            } => {
                if let Some(value) = patch.condition_type {
                    *condition_type = value;
                }
                if let Some(value) = patch.condition_value {
                    *condition_value = value;
                }
            }
        }
        debug!("Updated node {}", id);
        Ok(())
    }

    /// Canvas drag
    pub fn move_node(&mut self, id: &str, position: CanvasPosition) -> Result<(), AutomationError> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or_else(|| ReferenceError::UnknownNode(id.to_string()))?;
        node.position = position;
        Ok(())
    }

    /// Remove a node together with every edge touching it
    pub fn delete_node(&mut self, id: &str) -> Result<GraphNode, AutomationError> {
        let (node, edges) = self
            .graph
            .remove_node(id)
            .ok_or_else(|| ReferenceError::UnknownNode(id.to_string()))?;
        debug!("Deleted node {} and {} edge(s)", id, edges.len());
        Ok(node)
    }
}
