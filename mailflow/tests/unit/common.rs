//! Shared test fixtures

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mailflow::errors::AutomationError;
use mailflow::gateway::AutomationGateway;
use mailflow::models::{
    Action, ActionType, AutomationDocument, AutomationId, RemoteRef, Trigger, TriggerType,
};
use openapi_client::models::{ActivityResponse, AutomationSummary};

/// In-memory gateway that records every call it receives
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<String>>,
    store: Mutex<HashMap<String, AutomationDocument>>,
    next_id: AtomicI64,
    fail: AtomicBool,
    delay: Option<Duration>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            ..Default::default()
        }
    }

    /// Every call sleeps for `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Make every following call fail (or succeed again)
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stored(&self, id: &AutomationId) -> Option<AutomationDocument> {
        self.store.lock().unwrap().get(&id.to_string()).cloned()
    }

    /// Seed the server side with a document, returning it with its id
    pub fn seed(&self, mut doc: AutomationDocument) -> AutomationDocument {
        let id = RemoteRef::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        doc.id = Some(id.clone());
        self.store.lock().unwrap().insert(id.to_string(), doc.clone());
        doc
    }

    async fn enter(&self, call: String) -> Result<(), AutomationError> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AutomationError::Gateway(
                "503 Service Unavailable: try again later".to_string(),
            ));
        }
        Ok(())
    }

    fn fetch(&self, id: &AutomationId) -> Result<AutomationDocument, AutomationError> {
        self.stored(id)
            .ok_or_else(|| AutomationError::Gateway(format!("404 Not Found: automation {}", id)))
    }
}

#[async_trait]
impl AutomationGateway for RecordingGateway {
    async fn list(&self) -> Result<Vec<AutomationSummary>, AutomationError> {
        self.enter("list".to_string()).await?;
        let store = self.store.lock().unwrap();
        Ok(store
            .values()
            .map(|doc| AutomationSummary {
                id: serde_json::to_value(&doc.id).unwrap(),
                name: doc.name.clone(),
                description: doc.description.clone(),
                is_active: doc.is_active,
                trigger_type: doc.trigger.as_ref().map(|t| t.kind.to_string()),
                updated_at: None,
            })
            .collect())
    }

    async fn get(&self, id: &AutomationId) -> Result<AutomationDocument, AutomationError> {
        self.enter(format!("get {}", id)).await?;
        self.fetch(id)
    }

    async fn create(&self, doc: &AutomationDocument) -> Result<AutomationDocument, AutomationError> {
        self.enter("create".to_string()).await?;
        let mut doc = doc.clone();
        doc.versions.clear();
        Ok(self.seed(doc))
    }

    async fn update(
        &self,
        id: &AutomationId,
        doc: &AutomationDocument,
    ) -> Result<AutomationDocument, AutomationError> {
        self.enter(format!("update {}", id)).await?;
        let versions = self.fetch(id).map(|d| d.versions).unwrap_or_default();
        let mut doc = doc.clone();
        doc.id = Some(id.clone());
        doc.versions = versions;
        self.store.lock().unwrap().insert(id.to_string(), doc.clone());
        Ok(doc)
    }

    async fn duplicate(&self, id: &AutomationId) -> Result<AutomationDocument, AutomationError> {
        self.enter(format!("duplicate {}", id)).await?;
        let mut copy = self.fetch(id)?;
        copy.name = format!("{} (copy)", copy.name);
        copy.is_active = false;
        copy.versions.clear();
        Ok(self.seed(copy))
    }

    async fn start(&self, id: &AutomationId) -> Result<ActivityResponse, AutomationError> {
        self.enter(format!("start {}", id)).await?;
        self.set_active(id, true)
    }

    async fn pause(&self, id: &AutomationId) -> Result<ActivityResponse, AutomationError> {
        self.enter(format!("pause {}", id)).await?;
        self.set_active(id, false)
    }
}

impl RecordingGateway {
    fn set_active(&self, id: &AutomationId, active: bool) -> Result<ActivityResponse, AutomationError> {
        let mut store = self.store.lock().unwrap();
        let doc = store
            .get_mut(&id.to_string())
            .ok_or_else(|| AutomationError::Gateway(format!("404 Not Found: automation {}", id)))?;
        doc.is_active = active;
        Ok(ActivityResponse {
            is_active: active,
            message: None,
        })
    }
}

/// A named document with a `subscriber_added` trigger and no actions
pub fn triggered_document(name: &str) -> AutomationDocument {
    let mut doc = AutomationDocument::new(name);
    doc.trigger = Some(Trigger::new(TriggerType::SubscriberAdded));
    doc
}

/// Whether every list in the tree is numbered 0..n in order
pub fn positions_contiguous(actions: &[Action]) -> bool {
    actions.iter().enumerate().all(|(index, action)| {
        action.position == index
            && action.config.as_condition().map_or(true, |condition| {
                positions_contiguous(&condition.true_actions)
                    && positions_contiguous(&condition.false_actions)
            })
    })
}

pub fn types(actions: &[Action]) -> Vec<ActionType> {
    actions.iter().map(Action::action_type).collect()
}
