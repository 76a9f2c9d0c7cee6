//! Classified change events
//!
//! Serialized shape consumers depend on:
//! `{ "name": <absolute path>, "type": "add"|"update"|"delete", "object": <metadata|null>, "oldValue": <metadata> }`
//! with `oldValue` present only for updates and deletes.

use crate::metadata::FileMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of classified change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Path appeared that had no snapshot record
    Add,

    /// Tracked path settled after an in-place modification
    Update,

    /// Tracked path no longer exists
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Add => write!(f, "add"),
            ChangeKind::Update => write!(f, "update"),
            ChangeKind::Delete => write!(f, "delete"),
        }
    }
}

/// One emitted change
///
/// Immutable once built; constructed only through `add`, `update` and `delete`
/// so the metadata slots always match the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    name: PathBuf,

    #[serde(rename = "type")]
    kind: ChangeKind,

    object: Option<FileMetadata>,

    #[serde(rename = "oldValue", default, skip_serializing_if = "Option::is_none")]
    old_value: Option<FileMetadata>,
}

impl ChangeEvent {
    /// A path seen for the first time
    pub fn add(name: PathBuf, current: FileMetadata) -> Self {
        Self {
            name,
            kind: ChangeKind::Add,
            object: Some(current),
            old_value: None,
        }
    }

    /// A settled modification of a tracked path
    pub fn update(name: PathBuf, current: FileMetadata, previous: FileMetadata) -> Self {
        Self {
            name,
            kind: ChangeKind::Update,
            object: Some(current),
            old_value: Some(previous),
        }
    }

    /// Removal of a tracked path, carrying its last known metadata
    pub fn delete(name: PathBuf, previous: FileMetadata) -> Self {
        Self {
            name,
            kind: ChangeKind::Delete,
            object: None,
            old_value: Some(previous),
        }
    }

    /// Absolute path of the changed file
    pub fn name(&self) -> &Path {
        &self.name
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Current metadata (`None` for deletes)
    pub fn object(&self) -> Option<&FileMetadata> {
        self.object.as_ref()
    }

    /// Previous metadata (`None` for adds)
    pub fn old_value(&self) -> Option<&FileMetadata> {
        self.old_value.as_ref()
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_display() {
        assert_eq!(ChangeKind::Add.to_string(), "add");
        assert_eq!(ChangeKind::Update.to_string(), "update");
        assert_eq!(ChangeKind::Delete.to_string(), "delete");
    }

    #[test]
    fn test_add_wire_shape_omits_old_value() {
        let event = ChangeEvent::add(PathBuf::from("/w/a.txt"), FileMetadata::with_size(0));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["name"], "/w/a.txt");
        assert_eq!(value["type"], "add");
        assert_eq!(value["object"]["size"], 0);
        assert!(value.get("oldValue").is_none());
    }

    #[test]
    fn test_update_wire_shape() {
        let event = ChangeEvent::update(
            PathBuf::from("/w/a.txt"),
            FileMetadata::with_size(1000),
            FileMetadata::with_size(0),
        );
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "update");
        assert_eq!(value["object"]["size"], 1000);
        assert_eq!(value["oldValue"]["size"], 0);
    }

    #[test]
    fn test_delete_wire_shape_has_null_object() {
        let event = ChangeEvent::delete(PathBuf::from("/w/a.txt"), FileMetadata::with_size(1000));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "delete");
        assert_eq!(value["object"], json!(null));
        assert_eq!(value["oldValue"]["size"], 1000);
        assert_eq!(event.kind(), ChangeKind::Delete);
        assert!(event.object().is_none());
    }
}
