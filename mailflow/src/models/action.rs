//! Linear action models
//!
//! An [`Action`] is one step of the linear sequence. Its configuration is a
//! closed union keyed by the action type; `condition` steps nest two further
//! action lists, one per branch.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ValidationError;

/// Action type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendEmail,
    SendTemplate,
    Wait,
    AddTag,
    RemoveTag,
    Condition,
}

impl ActionType {
    pub const ALL: [ActionType; 6] = [
        ActionType::SendEmail,
        ActionType::SendTemplate,
        ActionType::Wait,
        ActionType::AddTag,
        ActionType::RemoveTag,
        ActionType::Condition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::SendEmail => "send_email",
            ActionType::SendTemplate => "send_template",
            ActionType::Wait => "wait",
            ActionType::AddTag => "add_tag",
            ActionType::RemoveTag => "remove_tag",
            ActionType::Condition => "condition",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownActionType {
                path: "type".to_string(),
                action_type: s.to_string(),
            })
    }
}

/// Reference to a remote resource (campaign, template, tag).
///
/// The API hands out both numeric and string ids, so either is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteRef {
    Number(i64),
    Text(String),
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteRef::Number(n) => write!(f, "{}", n),
            RemoteRef::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RemoteRef {
    fn from(value: &str) -> Self {
        RemoteRef::Text(value.to_string())
    }
}

impl From<i64> for RemoteRef {
    fn from(value: i64) -> Self {
        RemoteRef::Number(value)
    }
}

/// `send_email` configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendEmailConfig {
    pub campaign_id: Option<RemoteRef>,
    pub template: Option<RemoteRef>,
}

/// `send_template` configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendTemplateConfig {
    pub template_id: Option<RemoteRef>,
    pub subject_override: String,
    pub from_email: String,
    pub from_name: String,
}

/// Wait duration unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUnit {
    Minutes,
    Hours,
    #[default]
    Days,
    Weeks,
}

/// `wait` configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Length of the wait in `unit`s; fractions are allowed
    pub duration: f64,
    pub unit: WaitUnit,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            duration: 1.0,
            unit: WaitUnit::Days,
        }
    }
}

/// `add_tag` / `remove_tag` configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TagConfig {
    pub tag_id: Option<RemoteRef>,
}

/// Rule evaluated by a condition step or node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    #[default]
    TagExists,
    OpenedEmail,
    ClickedLink,
    CustomField,
}

/// Which side of a condition an action list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    True,
    False,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::True => "true",
            Branch::False => "false",
        }
    }
}

/// `condition` configuration with its two nested action lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionConfig {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    pub value: String,
    pub true_actions: Vec<Action>,
    pub false_actions: Vec<Action>,
}

impl ConditionConfig {
    pub fn branch(&self, branch: Branch) -> &Vec<Action> {
        match branch {
            Branch::True => &self.true_actions,
            Branch::False => &self.false_actions,
        }
    }

    pub fn branch_mut(&mut self, branch: Branch) -> &mut Vec<Action> {
        match branch {
            Branch::True => &mut self.true_actions,
            Branch::False => &mut self.false_actions,
        }
    }
}

/// Per-type action configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ActionConfig {
    SendEmail(SendEmailConfig),
    SendTemplate(SendTemplateConfig),
    Wait(WaitConfig),
    AddTag(TagConfig),
    RemoveTag(TagConfig),
    Condition(ConditionConfig),
}

impl ActionConfig {
    /// Default configuration for a freshly added action
    pub fn default_for(action_type: ActionType) -> Self {
        match action_type {
            ActionType::SendEmail => ActionConfig::SendEmail(SendEmailConfig::default()),
            ActionType::SendTemplate => ActionConfig::SendTemplate(SendTemplateConfig::default()),
            ActionType::Wait => ActionConfig::Wait(WaitConfig::default()),
            ActionType::AddTag => ActionConfig::AddTag(TagConfig::default()),
            ActionType::RemoveTag => ActionConfig::RemoveTag(TagConfig::default()),
            ActionType::Condition => ActionConfig::Condition(ConditionConfig::default()),
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            ActionConfig::SendEmail(_) => ActionType::SendEmail,
            ActionConfig::SendTemplate(_) => ActionType::SendTemplate,
            ActionConfig::Wait(_) => ActionType::Wait,
            ActionConfig::AddTag(_) => ActionType::AddTag,
            ActionConfig::RemoveTag(_) => ActionType::RemoveTag,
            ActionConfig::Condition(_) => ActionType::Condition,
        }
    }

    pub fn as_condition(&self) -> Option<&ConditionConfig> {
        match self {
            ActionConfig::Condition(condition) => Some(condition),
            _ => None,
        }
    }

    pub fn as_condition_mut(&mut self) -> Option<&mut ConditionConfig> {
        match self {
            ActionConfig::Condition(condition) => Some(condition),
            _ => None,
        }
    }

    fn decode(action_type: ActionType, config: serde_json::Value) -> serde_json::Result<Self> {
        // A missing config decodes like an empty object
        let config = if config.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            config
        };
        Ok(match action_type {
            ActionType::SendEmail => ActionConfig::SendEmail(serde_json::from_value(config)?),
            ActionType::SendTemplate => ActionConfig::SendTemplate(serde_json::from_value(config)?),
            ActionType::Wait => ActionConfig::Wait(serde_json::from_value(config)?),
            ActionType::AddTag => ActionConfig::AddTag(serde_json::from_value(config)?),
            ActionType::RemoveTag => ActionConfig::RemoveTag(serde_json::from_value(config)?),
            ActionType::Condition => ActionConfig::Condition(serde_json::from_value(config)?),
        })
    }
}

/// One step in a linear automation
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Locally unique id, stable for the editing session
    pub id: String,

    /// Type-specific configuration (also determines the action type)
    pub config: ActionConfig,

    /// Index inside the containing list
    pub position: usize,
}

impl Action {
    pub fn new(id: impl Into<String>, config: ActionConfig, position: usize) -> Self {
        Self {
            id: id.into(),
            config,
            position,
        }
    }

    pub fn action_type(&self) -> ActionType {
        self.config.action_type()
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Action", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.action_type())?;
        match &self.config {
            ActionConfig::SendEmail(config) => state.serialize_field("config", config)?,
            ActionConfig::SendTemplate(config) => state.serialize_field("config", config)?,
            ActionConfig::Wait(config) => state.serialize_field("config", config)?,
            ActionConfig::AddTag(config) | ActionConfig::RemoveTag(config) => {
                state.serialize_field("config", config)?
            }
            ActionConfig::Condition(config) => state.serialize_field("config", config)?,
        }
        state.serialize_field("position", &self.position)?;
        state.end()
    }
}

/// Wire shape of an action before its config is decoded against its type
#[derive(Deserialize)]
struct RawAction {
    id: String,
    #[serde(rename = "type")]
    action_type: ActionType,
    #[serde(default)]
    config: serde_json::Value,
    #[serde(default)]
    position: usize,
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawAction::deserialize(deserializer)?;
        let config = ActionConfig::decode(raw.action_type, raw.config).map_err(|e| {
            serde::de::Error::custom(format!(
                "invalid {} config for action '{}': {}",
                raw.action_type, raw.id, e
            ))
        })?;
        Ok(Action {
            id: raw.id,
            config,
            position: raw.position,
        })
    }
}

/// Renumber `position` in a single list so it matches list order
pub fn renumber(actions: &mut [Action]) {
    for (index, action) in actions.iter_mut().enumerate() {
        action.position = index;
    }
}

/// Renumber a list and every nested branch below it
pub fn renumber_all(actions: &mut [Action]) {
    renumber(actions);
    for action in actions.iter_mut() {
        if let Some(condition) = action.config.as_condition_mut() {
            renumber_all(&mut condition.true_actions);
            renumber_all(&mut condition.false_actions);
        }
    }
}

/// Depth-first visit of every action in a tree, nested branches included
pub fn walk(actions: &[Action], visit: &mut dyn FnMut(&Action)) {
    for action in actions {
        visit(action);
        if let Some(condition) = action.config.as_condition() {
            walk(&condition.true_actions, visit);
            walk(&condition.false_actions, visit);
        }
    }
}
