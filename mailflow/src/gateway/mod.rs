//! Persistence gateway
//!
//! The core never talks to a server directly; it goes through
//! [`AutomationGateway`], which the session holds as a trait object.

pub mod http;

use async_trait::async_trait;
use openapi_client::models::{ActivityResponse, AutomationSummary};

use crate::errors::AutomationError;
use crate::models::automation::{AutomationDocument, AutomationId};

pub use self::http::HttpGateway;

/// Remote CRUD and activity boundary for automations
#[async_trait]
pub trait AutomationGateway: Send + Sync {
    /// List automations without their actions or graph
    async fn list(&self) -> Result<Vec<AutomationSummary>, AutomationError>;

    /// Fetch one automation, versions included
    async fn get(&self, id: &AutomationId) -> Result<AutomationDocument, AutomationError>;

    /// Create a new automation; the response carries the server id
    async fn create(&self, doc: &AutomationDocument) -> Result<AutomationDocument, AutomationError>;

    /// Replace an existing automation
    async fn update(
        &self,
        id: &AutomationId,
        doc: &AutomationDocument,
    ) -> Result<AutomationDocument, AutomationError>;

    /// Server-side copy of an automation
    async fn duplicate(&self, id: &AutomationId) -> Result<AutomationDocument, AutomationError>;

    /// Switch an automation on
    async fn start(&self, id: &AutomationId) -> Result<ActivityResponse, AutomationError>;

    /// Switch an automation off
    async fn pause(&self, id: &AutomationId) -> Result<ActivityResponse, AutomationError>;
}
