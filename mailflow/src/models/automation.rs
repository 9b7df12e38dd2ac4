//! Automation document models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::action::{renumber_all, Action, RemoteRef};
use crate::models::graph::{GraphEdge, GraphNode, WorkflowGraph};

/// Server-assigned automation id
pub type AutomationId = RemoteRef;

/// Event that starts an automation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    SubscriberAdded,
    TagAdded,
    DateBased,
    Behavior,
    ApiCall,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::SubscriberAdded => "subscriber_added",
            TriggerType::TagAdded => "tag_added",
            TriggerType::DateBased => "date_based",
            TriggerType::Behavior => "behavior",
            TriggerType::ApiCall => "api_call",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single trigger of an automation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger type
    #[serde(rename = "type")]
    pub kind: TriggerType,

    /// Trigger-specific settings (tag id, date field, event name...)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub config: serde_json::Map<String, serde_json::Value>,
}

/// `"config": null` reads as a trigger without settings
fn null_as_empty<'de, D>(
    deserializer: D,
) -> Result<serde_json::Map<String, serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Trigger {
    pub fn new(kind: TriggerType) -> Self {
        Self {
            kind,
            config: serde_json::Map::new(),
        }
    }
}

/// A complete automation: trigger, linear actions, graph and version history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationDocument {
    /// Server id, absent until first saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AutomationId>,

    /// Automation name
    #[serde(default)]
    pub name: String,

    /// Free text description
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the automation is switched on
    #[serde(default)]
    pub is_active: bool,

    /// Starting event
    #[serde(default)]
    pub trigger: Option<Trigger>,

    /// Linear action sequence
    #[serde(default)]
    pub actions: Vec<Action>,

    /// Canvas graph (nodes and edges)
    #[serde(flatten)]
    pub graph: WorkflowGraph,

    /// Snapshots recorded by the server, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<VersionSnapshot>,
}

impl AutomationDocument {
    /// Create an empty, unsaved automation
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the document has been persisted at least once
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Request body sent to the gateway on create/update
    pub fn payload(&self) -> AutomationPayload<'_> {
        AutomationPayload {
            name: &self.name,
            description: self.description.as_deref(),
            is_active: self.is_active,
            trigger: self.trigger.as_ref(),
            actions: &self.actions,
            nodes: self.graph.nodes(),
            edges: self.graph.edges(),
        }
    }

    /// Apply the fields captured by a snapshot. Positions are renumbered.
    pub fn merge(&mut self, changes: &DocumentPatch) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(description) = &changes.description {
            self.description = description.clone();
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
        if let Some(trigger) = &changes.trigger {
            self.trigger = trigger.clone();
        }
        if let Some(actions) = &changes.actions {
            self.actions = actions.clone();
        }
        if changes.nodes.is_some() || changes.edges.is_some() {
            let nodes = changes
                .nodes
                .clone()
                .unwrap_or_else(|| self.graph.nodes().to_vec());
            let edges = changes
                .edges
                .clone()
                .unwrap_or_else(|| self.graph.edges().to_vec());
            self.graph = WorkflowGraph::from_parts(nodes, edges);
        }
        renumber_all(&mut self.actions);
    }
}

/// Borrowed request body with the field names the API expects
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationPayload<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub is_active: bool,
    pub trigger: Option<&'a Trigger>,
    pub actions: &'a [Action],
    pub nodes: &'a [GraphNode],
    pub edges: &'a [GraphEdge],
}

/// Partial document captured by a version snapshot.
///
/// `description` and `trigger` are doubly optional: absent means "not
/// captured", `null` means "captured as empty".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,

    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trigger: Option<Option<Trigger>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<GraphNode>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<GraphEdge>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A previously persisted state of an automation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    /// Monotonically increasing version number
    pub version: u32,

    /// Who saved this version
    #[serde(default)]
    pub user: String,

    /// When this version was saved
    pub created_at: DateTime<Utc>,

    /// Fields captured at this version
    #[serde(default)]
    pub changes: DocumentPatch,
}
