//! Document validation
//!
//! Pure checks over an [`AutomationDocument`]. Nothing here mutates the
//! document; callers decide whether a non-empty result blocks an operation.

use std::collections::{HashMap, HashSet};

use crate::errors::{AutomationError, ValidationError};
use crate::models::action::walk;
use crate::models::automation::AutomationDocument;
use crate::models::graph::{NodeKind, WorkflowGraph};

/// Check a document, reporting every problem found.
///
/// Order: name, trigger, action ids, then the graph (duplicate ids, dangling
/// edges, illegal fan-out).
pub fn validate(doc: &AutomationDocument) -> Vec<ValidationError> {
    let mut issues = Vec::new();
    if doc.name.trim().is_empty() {
        issues.push(ValidationError::MissingName);
    }
    if doc.trigger.is_none() {
        issues.push(ValidationError::MissingTrigger);
    }
    structure_errors(doc, &mut issues);
    issues
}

/// Structural invariants only, ignoring save readiness (an empty name is fine
/// here, actions without a trigger are not).
pub fn integrity_errors(doc: &AutomationDocument) -> Vec<ValidationError> {
    let mut issues = Vec::new();
    if doc.trigger.is_none() && !doc.actions.is_empty() {
        issues.push(ValidationError::MissingTrigger);
    }
    structure_errors(doc, &mut issues);
    issues
}

/// Everything that must hold before a document is handed to the gateway
pub fn save_errors(doc: &AutomationDocument) -> Vec<ValidationError> {
    let mut issues = Vec::new();
    if doc.name.trim().is_empty() {
        issues.push(ValidationError::MissingName);
    }
    if doc.trigger.is_none() {
        issues.push(ValidationError::MissingTrigger);
    }
    if doc.actions.is_empty() {
        issues.push(ValidationError::NoActions);
    }
    structure_errors(doc, &mut issues);
    issues
}

/// Refuse to save unless the document is complete
pub fn check_save(doc: &AutomationDocument) -> Result<(), AutomationError> {
    let issues = save_errors(doc);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(AutomationError::Validation(issues))
    }
}

/// Problems in the graph representation alone
pub fn graph_errors(graph: &WorkflowGraph) -> Vec<ValidationError> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for node in graph.nodes() {
        if !seen.insert(node.id.as_str()) {
            issues.push(ValidationError::DuplicateNodeId(node.id.clone()));
        }
    }

    for edge in graph.edges() {
        for endpoint in [&edge.source, &edge.target] {
            if !graph.contains_node(endpoint) {
                issues.push(ValidationError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
    }

    let mut fan_out: HashMap<&str, usize> = HashMap::new();
    for edge in graph.edges() {
        *fan_out.entry(edge.source.as_str()).or_default() += 1;
    }
    for node in graph.nodes() {
        let count = fan_out.get(node.id.as_str()).copied().unwrap_or(0);
        if node.kind() != NodeKind::Condition && count > 1 {
            issues.push(ValidationError::IllegalFanOut {
                node_id: node.id.clone(),
                count,
            });
        }
    }

    issues
}

fn structure_errors(doc: &AutomationDocument, issues: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    walk(&doc.actions, &mut |action| {
        if !seen.insert(action.id.clone()) {
            duplicates.push(ValidationError::DuplicateActionId(action.id.clone()));
        }
    });
    issues.extend(duplicates);
    issues.extend(graph_errors(&doc.graph));
}
