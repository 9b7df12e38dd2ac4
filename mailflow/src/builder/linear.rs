//! Linear action-list builder
//!
//! Every operation either succeeds and leaves positions contiguous in the
//! list it touched, or fails and leaves the document as it was.

use std::collections::HashSet;

use tracing::debug;

use crate::errors::{AutomationError, ReferenceError, ValidationError};
use crate::models::action::{
    renumber, renumber_all, walk, Action, ActionConfig, ActionType, Branch,
};
use crate::models::automation::{AutomationDocument, Trigger, TriggerType};
use crate::utils::generate_action_id;

/// Where an action sits in the tree: the chain of condition branches leading
/// to its list, then its index in that list
#[derive(Debug, Clone)]
struct Location {
    parents: Vec<(usize, Branch)>,
    index: usize,
}

/// Mutates the trigger and action tree of one document
pub struct ActionListBuilder<'a> {
    document: &'a mut AutomationDocument,
}

impl<'a> ActionListBuilder<'a> {
    pub fn new(document: &'a mut AutomationDocument) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &AutomationDocument {
        self.document
    }

    /// Set or replace the single trigger
    pub fn set_trigger(
        &mut self,
        kind: TriggerType,
        config: serde_json::Map<String, serde_json::Value>,
    ) {
        debug!("Setting trigger: {}", kind);
        self.document.trigger = Some(Trigger { kind, config });
    }

    /// Find an action anywhere in the tree
    pub fn find(&self, id: &str) -> Option<&Action> {
        let location = locate(&self.document.actions, id)?;
        list_at(&self.document.actions, &location.parents)?.get(location.index)
    }

    /// Add a top-level action. `at` of `None` appends; larger indexes clamp
    /// to the end of the list.
    pub fn add_action(
        &mut self,
        action_type: ActionType,
        at: Option<usize>,
        config: Option<ActionConfig>,
    ) -> Result<String, AutomationError> {
        let action = self.new_action(action_type, config)?;
        let id = action.id.clone();
        insert_at(&mut self.document.actions, at, action);
        debug!("Added {} action {}", action_type, id);
        Ok(id)
    }

    /// Add an action inside one branch of a condition
    pub fn add_branch_action(
        &mut self,
        condition_id: &str,
        branch: Branch,
        action_type: ActionType,
        at: Option<usize>,
        config: Option<ActionConfig>,
    ) -> Result<String, AutomationError> {
        let location = locate(&self.document.actions, condition_id)
            .ok_or_else(|| ReferenceError::UnknownAction(condition_id.to_string()))?;
        let action = self.new_action(action_type, config)?;
        let id = action.id.clone();

        let list = list_at_mut(&mut self.document.actions, &location.parents)
            .ok_or_else(|| ReferenceError::UnknownAction(condition_id.to_string()))?;
        let condition = list[location.index]
            .config
            .as_condition_mut()
            .ok_or_else(|| ReferenceError::NotACondition(condition_id.to_string()))?;
        insert_at(condition.branch_mut(branch), at, action);

        debug!(
            "Added {} action {} to {} branch of {}",
            action_type,
            id,
            branch.as_str(),
            condition_id
        );
        Ok(id)
    }

    /// Replace an action's config in place. The config must be of the same
    /// action type.
    pub fn update_action(&mut self, id: &str, config: ActionConfig) -> Result<(), AutomationError> {
        let location = locate(&self.document.actions, id)
            .ok_or_else(|| ReferenceError::UnknownAction(id.to_string()))?;
        let current = list_at(&self.document.actions, &location.parents)
            .and_then(|list| list.get(location.index))
            .ok_or_else(|| ReferenceError::UnknownAction(id.to_string()))?;

        if current.action_type() != config.action_type() {
            return Err(AutomationError::Validation(vec![
                ValidationError::ConfigTypeMismatch {
                    action_id: id.to_string(),
                    expected: current.action_type().to_string(),
                    found: config.action_type().to_string(),
                },
            ]));
        }
        let collisions = nested_collisions(&self.document.actions, Some(current), &config);
        if !collisions.is_empty() {
            return Err(AutomationError::Validation(collisions));
        }

        let list = list_at_mut(&mut self.document.actions, &location.parents)
            .ok_or_else(|| ReferenceError::UnknownAction(id.to_string()))?;
        let action = &mut list[location.index];
        let mut config = config;
        if let Some(condition) = config.as_condition_mut() {
            renumber_all(&mut condition.true_actions);
            renumber_all(&mut condition.false_actions);
        }
        action.config = config;
        debug!("Updated action {}", id);
        Ok(())
    }

    /// Remove an action (and, for a condition, both branches under it)
    pub fn remove_action(&mut self, id: &str) -> Result<Action, AutomationError> {
        let location = locate(&self.document.actions, id)
            .ok_or_else(|| ReferenceError::UnknownAction(id.to_string()))?;
        let list = list_at_mut(&mut self.document.actions, &location.parents)
            .ok_or_else(|| ReferenceError::UnknownAction(id.to_string()))?;

        let removed = list.remove(location.index);
        renumber(list);
        debug!("Removed action {}", id);
        Ok(removed)
    }

    /// Copy an action right after the original. The copy and everything
    /// nested in it get fresh ids.
    pub fn duplicate_action(&mut self, id: &str) -> Result<String, AutomationError> {
        let location = locate(&self.document.actions, id)
            .ok_or_else(|| ReferenceError::UnknownAction(id.to_string()))?;
        let list = list_at_mut(&mut self.document.actions, &location.parents)
            .ok_or_else(|| ReferenceError::UnknownAction(id.to_string()))?;

        let mut copy = list[location.index].clone();
        assign_fresh_ids(&mut copy);
        let copy_id = copy.id.clone();
        list.insert(location.index + 1, copy);
        renumber(list);

        debug!("Duplicated action {} as {}", id, copy_id);
        Ok(copy_id)
    }

    /// Move an action to another index within its own list
    pub fn move_action(&mut self, id: &str, to: usize) -> Result<(), AutomationError> {
        let location = locate(&self.document.actions, id)
            .ok_or_else(|| ReferenceError::UnknownAction(id.to_string()))?;
        let list = list_at_mut(&mut self.document.actions, &location.parents)
            .ok_or_else(|| ReferenceError::UnknownAction(id.to_string()))?;

        let action = list.remove(location.index);
        let to = to.min(list.len());
        list.insert(to, action);
        renumber(list);
        debug!("Moved action {} to position {}", id, to);
        Ok(())
    }

    fn new_action(
        &self,
        action_type: ActionType,
        config: Option<ActionConfig>,
    ) -> Result<Action, AutomationError> {
        if self.document.trigger.is_none() {
            return Err(AutomationError::TriggerRequired);
        }

        let mut config = match config {
            Some(config) if config.action_type() != action_type => {
                return Err(AutomationError::Validation(vec![
                    ValidationError::ConfigTypeMismatch {
                        action_id: "(new)".to_string(),
                        expected: action_type.to_string(),
                        found: config.action_type().to_string(),
                    },
                ]));
            }
            Some(config) => config,
            None => ActionConfig::default_for(action_type),
        };
        let collisions = nested_collisions(&self.document.actions, None, &config);
        if !collisions.is_empty() {
            return Err(AutomationError::Validation(collisions));
        }
        if let Some(condition) = config.as_condition_mut() {
            renumber_all(&mut condition.true_actions);
            renumber_all(&mut condition.false_actions);
        }

        Ok(Action::new(generate_action_id(), config, 0))
    }
}

fn insert_at(list: &mut Vec<Action>, at: Option<usize>, action: Action) {
    let index = at.map_or(list.len(), |i| i.min(list.len()));
    list.insert(index, action);
    renumber(list);
}

fn assign_fresh_ids(action: &mut Action) {
    action.id = generate_action_id();
    if let Some(condition) = action.config.as_condition_mut() {
        for nested in condition
            .true_actions
            .iter_mut()
            .chain(condition.false_actions.iter_mut())
        {
            assign_fresh_ids(nested);
        }
    }
}

/// Ids nested in a supplied condition config that are already taken, either
/// elsewhere in the tree or twice within the config itself. The branches of
/// `replaced` give way to the new config and do not count.
fn nested_collisions(
    actions: &[Action],
    replaced: Option<&Action>,
    config: &ActionConfig,
) -> Vec<ValidationError> {
    let incoming = match config.as_condition() {
        Some(condition) => condition,
        None => return Vec::new(),
    };

    let mut taken = HashSet::new();
    walk(actions, &mut |action| {
        taken.insert(action.id.clone());
    });
    if let Some(outgoing) = replaced.and_then(|action| action.config.as_condition()) {
        for branch in [Branch::True, Branch::False] {
            walk(outgoing.branch(branch), &mut |action| {
                taken.remove(&action.id);
            });
        }
    }

    let mut issues = Vec::new();
    for branch in [Branch::True, Branch::False] {
        walk(incoming.branch(branch), &mut |action| {
            if !taken.insert(action.id.clone()) {
                issues.push(ValidationError::DuplicateActionId(action.id.clone()));
            }
        });
    }
    issues
}

fn locate(list: &[Action], id: &str) -> Option<Location> {
    for (index, action) in list.iter().enumerate() {
        if action.id == id {
            return Some(Location {
                parents: Vec::new(),
                index,
            });
        }
        if let Some(condition) = action.config.as_condition() {
            for branch in [Branch::True, Branch::False] {
                if let Some(mut found) = locate(condition.branch(branch), id) {
                    found.parents.insert(0, (index, branch));
                    return Some(found);
                }
            }
        }
    }
    None
}

fn list_at<'l>(root: &'l [Action], parents: &[(usize, Branch)]) -> Option<&'l [Action]> {
    let mut list = root;
    for &(index, branch) in parents {
        list = list.get(index)?.config.as_condition()?.branch(branch);
    }
    Some(list)
}

fn list_at_mut<'l>(
    root: &'l mut Vec<Action>,
    parents: &[(usize, Branch)],
) -> Option<&'l mut Vec<Action>> {
    let mut list = root;
    for &(index, branch) in parents {
        list = list
            .get_mut(index)?
            .config
            .as_condition_mut()?
            .branch_mut(branch);
    }
    Some(list)
}
