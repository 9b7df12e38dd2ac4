//! Version history
//!
//! Snapshots are owned by the server and arrive with the document; this module
//! only reads them and merges one back into a document.

use tracing::{info, warn};

use crate::errors::{AutomationError, RestoreError};
use crate::models::automation::{AutomationDocument, VersionSnapshot};
use crate::validation::integrity_errors;

/// Snapshots ordered newest first. The slice itself is left as it is.
pub fn most_recent_first(versions: &[VersionSnapshot]) -> Vec<&VersionSnapshot> {
    let mut ordered: Vec<&VersionSnapshot> = versions.iter().collect();
    ordered.sort_by(|a, b| b.version.cmp(&a.version));
    ordered
}

pub fn find(versions: &[VersionSnapshot], version: u32) -> Option<&VersionSnapshot> {
    versions.iter().find(|s| s.version == version)
}

/// Merge a snapshot's captured fields into the document.
///
/// The merge is tried on a copy first; the document only changes when the
/// result still satisfies every structural invariant.
pub fn merge_snapshot(doc: &mut AutomationDocument, version: u32) -> Result<(), AutomationError> {
    let snapshot = find(&doc.versions, version).ok_or(RestoreError::UnknownVersion(version))?;

    let mut merged = doc.clone();
    merged.merge(&snapshot.changes);

    let issues = integrity_errors(&merged);
    if !issues.is_empty() {
        warn!("Version {} would leave {} issue(s), not restoring", version, issues.len());
        return Err(RestoreError::Inconsistent(issues).into());
    }

    *doc = merged;
    info!("Restored version {} locally", version);
    Ok(())
}
