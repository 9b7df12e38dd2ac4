//! Editing session
//!
//! An [`EditorSession`] owns one live document plus a gateway handle. Local
//! edits are synchronous and all-or-nothing; persistence goes through the
//! gateway with at most one save in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::builder::{ActionListBuilder, GraphBuilder};
use crate::errors::{AutomationError, RestoreError};
use crate::gateway::AutomationGateway;
use crate::history;
use crate::models::automation::{AutomationDocument, AutomationId, VersionSnapshot};
use crate::transfer;
use crate::utils::sha256_hash;
use crate::validation;

/// Releases the save flag when dropped, whatever the save outcome
struct SaveGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SaveGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, AutomationError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AutomationError::SaveInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn digest(doc: &AutomationDocument) -> String {
    serde_json::to_vec(&doc.payload())
        .map(|bytes| sha256_hash(&bytes))
        .unwrap_or_default()
}

/// One automation being edited
pub struct EditorSession {
    gateway: Arc<dyn AutomationGateway>,
    document: RwLock<AutomationDocument>,
    saving: AtomicBool,
    saved_digest: RwLock<String>,
}

impl EditorSession {
    /// Start editing a new, unsaved automation
    pub fn new(gateway: Arc<dyn AutomationGateway>) -> Self {
        Self::with_document(gateway, AutomationDocument::default())
    }

    /// Start editing from a document already in hand
    pub fn with_document(gateway: Arc<dyn AutomationGateway>, document: AutomationDocument) -> Self {
        let saved = digest(&document);
        Self {
            gateway,
            document: RwLock::new(document),
            saving: AtomicBool::new(false),
            saved_digest: RwLock::new(saved),
        }
    }

    /// Fetch an automation (with its versions) and start editing it
    pub async fn load(
        gateway: Arc<dyn AutomationGateway>,
        id: &AutomationId,
    ) -> Result<Self, AutomationError> {
        let document = gateway.get(id).await?;
        info!(
            "Loaded automation {} '{}' ({} version(s))",
            id,
            document.name,
            document.versions.len()
        );
        Ok(Self::with_document(gateway, document))
    }

    /// Copy of the live document
    pub async fn document(&self) -> AutomationDocument {
        self.document.read().await.clone()
    }

    pub fn gateway(&self) -> &Arc<dyn AutomationGateway> {
        &self.gateway
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Run a batch of action-list edits. Nothing is applied unless the whole
    /// batch succeeds.
    pub async fn edit_actions<F, R>(&self, edit: F) -> Result<R, AutomationError>
    where
        F: FnOnce(&mut ActionListBuilder<'_>) -> Result<R, AutomationError>,
    {
        let mut document = self.document.write().await;
        let mut draft = document.clone();
        let result = edit(&mut ActionListBuilder::new(&mut draft))?;
        *document = draft;
        Ok(result)
    }

    /// Run a batch of graph edits. Nothing is applied unless the whole batch
    /// succeeds.
    pub async fn edit_graph<F, R>(&self, edit: F) -> Result<R, AutomationError>
    where
        F: FnOnce(&mut GraphBuilder<'_>) -> Result<R, AutomationError>,
    {
        let mut document = self.document.write().await;
        let mut graph = document.graph.clone();
        let result = edit(&mut GraphBuilder::new(&mut graph))?;
        document.graph = graph;
        Ok(result)
    }

    pub async fn rename(&self, name: impl Into<String>) {
        self.document.write().await.name = name.into();
    }

    pub async fn set_description(&self, description: Option<String>) {
        self.document.write().await.description = description;
    }

    /// Local activity flag; persisted on the next save
    pub async fn set_active(&self, active: bool) {
        self.document.write().await.is_active = active;
    }

    /// Create or update the automation on the server.
    ///
    /// The document must pass the save checks first. On success the server's
    /// copy becomes the live document; on failure the live document is left
    /// exactly as it was.
    pub async fn save(&self) -> Result<AutomationDocument, AutomationError> {
        let _guard = SaveGuard::acquire(&self.saving)?;

        let snapshot = self.document().await;
        validation::check_save(&snapshot)?;

        let saved = match &snapshot.id {
            Some(id) => {
                debug!("Updating automation {}", id);
                self.gateway.update(id, &snapshot).await
            }
            None => {
                debug!("Creating automation '{}'", snapshot.name);
                self.gateway.create(&snapshot).await
            }
        }
        .inspect_err(|e| warn!("Save failed: {}", e))?;

        self.replace(saved.clone()).await;
        info!(
            "Saved automation {}",
            saved
                .id
                .as_ref()
                .map_or_else(|| "(no id)".to_string(), ToString::to_string)
        );
        Ok(saved)
    }

    /// Replace the live document with one parsed from JSON
    pub async fn import_json(&self, text: &str) -> Result<(), AutomationError> {
        let imported = transfer::import_json(text)?;
        *self.document.write().await = imported;
        Ok(())
    }

    pub async fn export_json(&self) -> Result<String, AutomationError> {
        transfer::export_json(&*self.document.read().await)
    }

    /// Snapshots, newest first
    pub async fn history(&self) -> Vec<VersionSnapshot> {
        let document = self.document.read().await;
        history::most_recent_first(&document.versions)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Merge a snapshot into the live document without contacting the server
    pub async fn restore_local(&self, version: u32) -> Result<(), AutomationError> {
        let mut document = self.document.write().await;
        history::merge_snapshot(&mut document, version)
    }

    /// Merge a snapshot and push the result to the server.
    ///
    /// Unsaved documents are refused before anything changes. When the
    /// server call fails, the merged state stays local.
    pub async fn restore_and_save(&self, version: u32) -> Result<AutomationDocument, AutomationError> {
        let id = self
            .document
            .read()
            .await
            .id
            .clone()
            .ok_or(RestoreError::NotPersisted)?;
        let _guard = SaveGuard::acquire(&self.saving)?;

        let merged = {
            let mut document = self.document.write().await;
            history::merge_snapshot(&mut document, version)?;
            document.clone()
        };

        let saved = self
            .gateway
            .update(&id, &merged)
            .await
            .inspect_err(|e| warn!("Restore of version {} not saved: {}", version, e))?;
        self.replace(saved.clone()).await;
        info!("Restored version {} of automation {}", version, id);
        Ok(saved)
    }

    /// Switch the automation on server-side
    pub async fn start(&self) -> Result<(), AutomationError> {
        let id = self.persisted_id().await?;
        let response = self.gateway.start(&id).await?;
        self.sync_activity(response.is_active).await;
        info!("Started automation {}", id);
        Ok(())
    }

    /// Switch the automation off server-side
    pub async fn pause(&self) -> Result<(), AutomationError> {
        let id = self.persisted_id().await?;
        let response = self.gateway.pause(&id).await?;
        self.sync_activity(response.is_active).await;
        info!("Paused automation {}", id);
        Ok(())
    }

    /// Ask the server for a copy. The session keeps editing the original.
    pub async fn duplicate(&self) -> Result<AutomationDocument, AutomationError> {
        let id = self.persisted_id().await?;
        let copy = self.gateway.duplicate(&id).await?;
        info!("Duplicated automation {}", id);
        Ok(copy)
    }

    /// Whether the live document differs from the last loaded or saved state
    pub async fn is_dirty(&self) -> bool {
        let current = digest(&*self.document.read().await);
        *self.saved_digest.read().await != current
    }

    async fn persisted_id(&self) -> Result<AutomationId, AutomationError> {
        self.document
            .read()
            .await
            .id
            .clone()
            .ok_or(AutomationError::NotPersisted)
    }

    async fn replace(&self, document: AutomationDocument) {
        let saved = digest(&document);
        *self.document.write().await = document;
        *self.saved_digest.write().await = saved;
    }

    /// The server flipped the flag; a clean document stays clean
    async fn sync_activity(&self, active: bool) {
        let was_clean = !self.is_dirty().await;
        let mut document = self.document.write().await;
        document.is_active = active;
        if was_clean {
            *self.saved_digest.write().await = digest(&document);
        }
    }
}
