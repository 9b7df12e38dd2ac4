//! API models

use serde::{Deserialize, Serialize};

/// Automation list entry (without actions or graph data)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationSummary {
    pub id: serde_json::Value,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub trigger_type: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Automation list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationListResponse {
    pub automations: Vec<AutomationSummary>,
    #[serde(default)]
    pub total: usize,
}

/// Activity toggle response (start / pause)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub is_active: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Flatten into a single human readable line
    pub fn describe(&self) -> String {
        if self.error.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.error, self.message)
        }
    }
}
