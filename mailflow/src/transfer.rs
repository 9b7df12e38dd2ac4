//! JSON import/export of whole automation documents

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::{AutomationError, ValidationError};
use crate::models::action::{renumber_all, ActionType};
use crate::models::automation::AutomationDocument;
use crate::validation::integrity_errors;

/// Pretty-printed JSON with every document field
pub fn export_json(doc: &AutomationDocument) -> Result<String, AutomationError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Parse a document from JSON text.
///
/// Nothing is returned unless the whole text is acceptable: a syntax error
/// gives a single [`AutomationError::Parse`], structural problems give every
/// [`ValidationError`] found.
pub fn import_json(text: &str) -> Result<AutomationDocument, AutomationError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| AutomationError::Parse(e.to_string()))?;

    let issues = raw_errors(&value);
    if !issues.is_empty() {
        warn!("Rejected import with {} issue(s)", issues.len());
        return Err(AutomationError::Validation(issues));
    }

    let mut doc: AutomationDocument = serde_json::from_value(value)
        .map_err(|e| AutomationError::Validation(vec![ValidationError::Malformed(e.to_string())]))?;
    renumber_all(&mut doc.actions);

    let issues = integrity_errors(&doc);
    if !issues.is_empty() {
        warn!("Rejected import with {} issue(s)", issues.len());
        return Err(AutomationError::Validation(issues));
    }

    debug!(
        "Imported '{}' with {} action(s) and {} node(s)",
        doc.name,
        doc.actions.len(),
        doc.graph.nodes().len()
    );
    Ok(doc)
}

/// Checks that run on the untyped value, in order: trigger, actions list,
/// name, action types
fn raw_errors(value: &Value) -> Vec<ValidationError> {
    let Some(object) = value.as_object() else {
        return vec![ValidationError::Malformed(
            "expected a JSON object at the top level".to_string(),
        )];
    };

    let mut issues = Vec::new();
    if object.get("trigger").map_or(true, Value::is_null) {
        issues.push(ValidationError::MissingTrigger);
    }
    let actions = object.get("actions").and_then(Value::as_array);
    if actions.is_none() {
        issues.push(ValidationError::ActionsNotAList);
    }
    let has_name = object
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    if !has_name {
        issues.push(ValidationError::MissingName);
    }
    if let Some(actions) = actions {
        check_types(actions, "actions", &mut issues);
    }
    issues
}

fn check_types(actions: &[Value], path: &str, issues: &mut Vec<ValidationError>) {
    for (index, action) in actions.iter().enumerate() {
        let here = format!("{}[{}]", path, index);
        let type_name = action.get("type").and_then(Value::as_str);
        match type_name.map(str::parse::<ActionType>) {
            Some(Ok(ActionType::Condition)) => {
                let config = action.get("config").and_then(Value::as_object);
                for key in ["trueActions", "falseActions"] {
                    if let Some(nested) = config.and_then(|c| branch(c, key)) {
                        check_types(nested, &format!("{}.config.{}", here, key), issues);
                    }
                }
            }
            Some(Ok(_)) => {}
            _ => issues.push(ValidationError::UnknownActionType {
                path: here,
                action_type: action
                    .get("type")
                    .map(|t| t.as_str().map_or_else(|| t.to_string(), str::to_string))
                    .unwrap_or_default(),
            }),
        }
    }
}

fn branch<'v>(config: &'v Map<String, Value>, key: &str) -> Option<&'v Vec<Value>> {
    config.get(key).and_then(Value::as_array)
}
