//! Error types for the automation core

use thiserror::Error;

/// Main error type for automation editing and persistence
#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<ValidationError>),

    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Restore error: {0}")]
    Restore(#[from] RestoreError),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("A trigger must be set before actions can be added")]
    TriggerRequired,

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Automation has not been saved yet")]
    NotPersisted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AutomationError {
    /// Validation issues carried by this error, if any
    pub fn issues(&self) -> &[ValidationError] {
        match self {
            AutomationError::Validation(issues) => issues,
            AutomationError::Restore(RestoreError::Inconsistent(issues)) => issues,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for AutomationError {
    fn from(err: reqwest::Error) -> Self {
        AutomationError::Gateway(err.to_string())
    }
}

impl From<Vec<ValidationError>> for AutomationError {
    fn from(issues: Vec<ValidationError>) -> Self {
        AutomationError::Validation(issues)
    }
}

/// A single structural problem found in a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Automation name is required")]
    MissingName,

    #[error("A trigger is required")]
    MissingTrigger,

    #[error("Actions must be a list")]
    ActionsNotAList,

    #[error("At least one action is required")]
    NoActions,

    #[error("Unknown action type '{action_type}' at {path}")]
    UnknownActionType { path: String, action_type: String },

    #[error("Action '{action_id}' expects a {expected} config, got {found}")]
    ConfigTypeMismatch {
        action_id: String,
        expected: String,
        found: String,
    },

    #[error("Action id '{0}' is used more than once")]
    DuplicateActionId(String),

    #[error("Node id '{0}' is used more than once")]
    DuplicateNodeId(String),

    #[error("Edge '{edge_id}' references missing node '{node_id}'")]
    DanglingEdge { edge_id: String, node_id: String },

    #[error("Node '{node_id}' has {count} outgoing edges; only condition nodes may branch")]
    IllegalFanOut { node_id: String, count: usize },

    #[error("Node '{node_id}' is a {kind} node and has no '{field}' field")]
    NodeFieldMismatch {
        node_id: String,
        kind: String,
        field: String,
    },

    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// An operation named an element that does not exist or cannot be linked
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Action '{0}' not found")]
    UnknownAction(String),

    #[error("Action '{0}' is not a condition")]
    NotACondition(String),

    #[error("Node '{0}' not found")]
    UnknownNode(String),

    #[error("Edge '{0}' not found")]
    UnknownEdge(String),

    #[error("Node '{node_id}' already has an outgoing edge; only condition nodes may branch")]
    FanOut { node_id: String },

    #[error("Condition node '{node_id}' has no '{handle}' output")]
    UnknownHandle { node_id: String, handle: String },
}

/// A version restore could not be carried out
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    #[error("Save the automation before restoring a version to the server")]
    NotPersisted,

    #[error("Version {0} not found in history")]
    UnknownVersion(u32),

    #[error("Version would leave the automation inconsistent: {}", join_issues(.0))]
    Inconsistent(Vec<ValidationError>),
}

fn join_issues(issues: &[ValidationError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
