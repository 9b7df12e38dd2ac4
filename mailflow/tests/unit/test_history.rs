//! Version history tests

use chrono::{TimeZone, Utc};
use mailflow::history::{find, merge_snapshot, most_recent_first};
use mailflow::models::{
    Action, ActionConfig, ActionType, DocumentPatch, Trigger, TriggerType, VersionSnapshot,
};

use crate::common::{positions_contiguous, triggered_document};

fn snapshot(version: u32, changes: DocumentPatch) -> VersionSnapshot {
    VersionSnapshot {
        version,
        user: format!("user{}@example.com", version),
        created_at: Utc.with_ymd_and_hms(2024, 2, 1, version, 0, 0).unwrap(),
        changes,
    }
}

#[test]
fn test_find_and_order() {
    let versions = vec![
        snapshot(2, DocumentPatch::default()),
        snapshot(5, DocumentPatch::default()),
        snapshot(1, DocumentPatch::default()),
    ];

    assert_eq!(find(&versions, 5).map(|s| s.user.as_str()), Some("user5@example.com"));
    assert!(find(&versions, 3).is_none());

    let newest: Vec<u32> = most_recent_first(&versions).iter().map(|s| s.version).collect();
    assert_eq!(newest, vec![5, 2, 1]);
}

#[test]
fn test_merge_restores_captured_fields_and_renumbers() {
    let mut doc = triggered_document("Current name");
    doc.versions.push(snapshot(
        1,
        DocumentPatch {
            name: Some("Launch drip".to_string()),
            trigger: Some(Some(Trigger::new(TriggerType::TagAdded))),
            actions: Some(vec![
                Action::new("a", ActionConfig::default_for(ActionType::SendEmail), 3),
                Action::new("b", ActionConfig::default_for(ActionType::Wait), 3),
            ]),
            ..Default::default()
        },
    ));

    merge_snapshot(&mut doc, 1).unwrap();

    assert_eq!(doc.name, "Launch drip");
    assert_eq!(doc.trigger.as_ref().map(|t| t.kind), Some(TriggerType::TagAdded));
    assert!(positions_contiguous(&doc.actions));
    assert_eq!(doc.versions.len(), 1);
}

#[test]
fn test_merge_keeps_fields_the_snapshot_did_not_capture() {
    let mut doc = triggered_document("Current name");
    doc.description = Some("Still here".to_string());
    doc.is_active = true;
    doc.versions.push(snapshot(
        4,
        DocumentPatch {
            name: Some("Older name".to_string()),
            ..Default::default()
        },
    ));

    merge_snapshot(&mut doc, 4).unwrap();

    assert_eq!(doc.name, "Older name");
    assert_eq!(doc.description.as_deref(), Some("Still here"));
    assert!(doc.is_active);
}
