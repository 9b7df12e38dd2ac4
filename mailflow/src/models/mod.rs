//! Automation data models

pub mod action;
pub mod automation;
pub mod graph;

pub use action::{
    Action, ActionConfig, ActionType, Branch, ConditionConfig, ConditionKind, RemoteRef,
    SendEmailConfig, SendTemplateConfig, TagConfig, WaitConfig, WaitUnit,
};
pub use automation::{
    AutomationDocument, AutomationId, AutomationPayload, DocumentPatch, Trigger, TriggerType,
    VersionSnapshot,
};
pub use graph::{
    CanvasPosition, EdgeMarker, EdgeStyle, GraphEdge, GraphNode, NodeConfig, NodeKind,
    WorkflowGraph,
};
