//! Canvas graph models
//!
//! The graph is a second, independently edited view of an automation. Nodes
//! live in insertion order with an id index next to them, and edges refer to
//! nodes by id only.

use std::collections::HashMap;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::action::{ActionType, ConditionKind};
use crate::models::automation::TriggerType;

/// Node type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Trigger,
    Action,
    Condition,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Action => "action",
            NodeKind::Condition => "condition",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canvas coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasPosition {
    pub x: f64,
    pub y: f64,
}

impl CanvasPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Type-specific node settings, chosen in the node's config dialog
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    Trigger {
        trigger_type: Option<TriggerType>,
    },
    Action {
        action_type: Option<ActionType>,
    },
    Condition {
        condition_type: Option<ConditionKind>,
        condition_value: String,
    },
}

impl NodeConfig {
    /// Unconfigured settings for a new node of the given kind
    pub fn empty(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Trigger => NodeConfig::Trigger { trigger_type: None },
            NodeKind::Action => NodeConfig::Action { action_type: None },
            NodeKind::Condition => NodeConfig::Condition {
                condition_type: None,
                condition_value: String::new(),
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Trigger { .. } => NodeKind::Trigger,
            NodeConfig::Action { .. } => NodeKind::Action,
            NodeConfig::Condition { .. } => NodeKind::Condition,
        }
    }
}

/// A node on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// Unique id, `"{type}-{timestamp}"` by convention
    pub id: String,

    /// Canvas position
    pub position: CanvasPosition,

    /// Display label
    pub label: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Type-specific settings (also determines the node type)
    pub config: NodeConfig,
}

impl GraphNode {
    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }
}

/// `data` object of a node as it appears on the wire
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNodeData {
    #[serde(default)]
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trigger_type: Option<TriggerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    action_type: Option<ActionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition_type: Option<ConditionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition_value: Option<String>,
}

#[derive(Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default)]
    position: CanvasPosition,
    #[serde(default)]
    data: RawNodeData,
}

impl Serialize for GraphNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut data = RawNodeData {
            label: self.label.clone(),
            description: self.description.clone(),
            ..Default::default()
        };
        match &self.config {
            NodeConfig::Trigger { trigger_type } => data.trigger_type = *trigger_type,
            NodeConfig::Action { action_type } => data.action_type = *action_type,
            NodeConfig::Condition {
                condition_type,
                condition_value,
            } => {
                data.condition_type = *condition_type;
                data.condition_value = Some(condition_value.clone());
            }
        }

        let mut state = serializer.serialize_struct("GraphNode", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.kind())?;
        state.serialize_field("position", &self.position)?;
        state.serialize_field("data", &data)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for GraphNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawNode::deserialize(deserializer)?;
        let data = raw.data;
        // Sub-type fields that do not belong to the node type are dropped
        let config = match raw.kind {
            NodeKind::Trigger => NodeConfig::Trigger {
                trigger_type: data.trigger_type,
            },
            NodeKind::Action => NodeConfig::Action {
                action_type: data.action_type,
            },
            NodeKind::Condition => NodeConfig::Condition {
                condition_type: data.condition_type,
                condition_value: data.condition_value.unwrap_or_default(),
            },
        };
        Ok(GraphNode {
            id: raw.id,
            position: raw.position,
            label: data.label,
            description: data.description,
            config,
        })
    }
}

/// Arrow drawn at the target end of an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeMarker {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Default for EdgeMarker {
    fn default() -> Self {
        Self {
            kind: "arrowclosed".to_string(),
        }
    }
}

/// Stroke settings of an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke_width: f64,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self { stroke_width: 2.0 }
    }
}

/// A directed connection between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique edge id
    pub id: String,

    /// Source node id
    pub source: String,

    /// Target node id
    pub target: String,

    /// Output port on the source (`true` / `false` for conditions)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,

    /// Input port on the target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,

    /// Arrow marker
    #[serde(default)]
    pub marker_end: EdgeMarker,

    /// Stroke style
    #[serde(default)]
    pub style: EdgeStyle,
}

/// Wire shape of the graph part of a document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GraphData {
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
}

/// Node/edge arena with an id index for constant-time lookups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "GraphData", into = "GraphData")]
pub struct WorkflowGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index: HashMap<String, usize>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from raw parts without checking edge references
    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let mut graph = Self {
            nodes,
            edges,
            index: HashMap::new(),
        };
        graph.reindex();
        graph
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Edges leaving the given node
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        match self.index.get(id) {
            Some(&i) => self.nodes.get_mut(i),
            None => None,
        }
    }

    pub(crate) fn push_node(&mut self, node: GraphNode) {
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub(crate) fn push_edge(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    /// Remove a node and every edge touching it
    pub(crate) fn remove_node(&mut self, id: &str) -> Option<(GraphNode, Vec<GraphEdge>)> {
        let index = self.index.remove(id)?;
        let node = self.nodes.remove(index);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.source == id || e.target == id);
        self.edges = kept;
        self.reindex();
        Some((node, removed))
    }

    pub(crate) fn remove_edge(&mut self, id: &str) -> Option<GraphEdge> {
        let index = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(index))
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();
    }
}

impl PartialEq for WorkflowGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}

impl From<GraphData> for WorkflowGraph {
    fn from(data: GraphData) -> Self {
        WorkflowGraph::from_parts(data.nodes, data.edges)
    }
}

impl From<WorkflowGraph> for GraphData {
    fn from(graph: WorkflowGraph) -> Self {
        GraphData {
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}
