//! Update results: which references landed where, and every individual edit.

use crate::image::{NamespacedName, Reference};
use serde::Serialize;
use std::collections::BTreeMap;

/// Logical identity of the YAML resource document containing a marked
/// field. Grouping key only; two documents with the same identifying
/// fields compare equal regardless of which file they live in.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectIdentifier {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

/// A reference applied to an object, tagged with the policy that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub reference: Reference,
    pub policy: NamespacedName,
}

/// One atomic field substitution. `old_value` and `new_value` are the raw
/// strings as they appeared/appear in the document; `setter` is the
/// identity that produced the change (`ns:policy` or `ns:policy:part`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub old_value: String,
    pub new_value: String,
    pub setter: String,
}

/// References applied within one file, grouped by object.
///
/// The per-object list is deduplicated per distinct [`ImageRef`] and keeps
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileResult {
    pub objects: BTreeMap<ObjectIdentifier, Vec<ImageRef>>,
}

/// Every individual edit within one file, grouped by object. Change order
/// within an object is document-scan order and is never re-sorted.
pub type ObjectChanges = BTreeMap<ObjectIdentifier, Vec<Change>>;

/// The "what final references landed where" view, keyed by file path
/// relative to the input root. Files with no recorded changes have no
/// entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResult {
    pub files: BTreeMap<String, FileResult>,
}

impl UpdateResult {
    /// Record a reference applied to `id` in `file`, skipping duplicates
    /// of the same [`ImageRef`] while preserving first-seen order.
    pub fn add_image(&mut self, file: &str, id: ObjectIdentifier, image: ImageRef) {
        let images = self
            .files
            .entry(file.to_string())
            .or_default()
            .objects
            .entry(id)
            .or_default();
        if !images.contains(&image) {
            images.push(image);
        }
    }

    /// Merge all files into a single object → references view, keeping
    /// per-file insertion order and dropping cross-file duplicates.
    pub fn objects(&self) -> BTreeMap<ObjectIdentifier, Vec<ImageRef>> {
        let mut merged: BTreeMap<ObjectIdentifier, Vec<ImageRef>> = BTreeMap::new();
        for file_result in self.files.values() {
            for (id, images) in &file_result.objects {
                let entry = merged.entry(id.clone()).or_default();
                for image in images {
                    if !entry.contains(image) {
                        entry.push(image.clone());
                    }
                }
            }
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// [`UpdateResult`] plus the before/after record of every edit. Both views
/// are filled by the same pass; `image_result` is identical to what a
/// result-only run would produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResultV2 {
    pub image_result: UpdateResult,
    pub file_changes: BTreeMap<String, ObjectChanges>,
}

impl UpdateResultV2 {
    /// Append a change for `id` in `file`, preserving scan order.
    pub fn add_change(&mut self, file: &str, id: ObjectIdentifier, change: Change) {
        self.file_changes
            .entry(file.to_string())
            .or_default()
            .entry(id)
            .or_default()
            .push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.image_result.is_empty() && self.file_changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn image(repo: &str, policy: &str) -> ImageRef {
        ImageRef {
            reference: repo.parse().unwrap(),
            policy: NamespacedName::new("ns", policy),
        }
    }

    fn id(kind: &str, name: &str) -> ObjectIdentifier {
        ObjectIdentifier {
            api_version: "v1".to_string(),
            kind: kind.to_string(),
            namespace: String::new(),
            name: name.to_string(),
        }
    }

    #[test]
    fn add_image_deduplicates_but_keeps_order() {
        let mut result = UpdateResult::default();
        result.add_image("a.yaml", id("Kustomization", ""), image("repo:v1", "policy"));
        result.add_image("a.yaml", id("Kustomization", ""), image("other:v2", "second"));
        result.add_image("a.yaml", id("Kustomization", ""), image("repo:v1", "policy"));

        let images = &result.files["a.yaml"].objects[&id("Kustomization", "")];
        assert_eq!(
            images,
            &vec![image("repo:v1", "policy"), image("other:v2", "second")]
        );
    }

    #[test]
    fn add_change_preserves_scan_order() {
        let mut result = UpdateResultV2::default();
        for (old, new, setter) in [
            ("replaced", "updated", "ns:policy:name"),
            ("v1", "v1.0.1", "ns:policy:tag"),
        ] {
            result.add_change(
                "a.yaml",
                id("Kustomization", ""),
                Change {
                    old_value: old.to_string(),
                    new_value: new.to_string(),
                    setter: setter.to_string(),
                },
            );
        }

        let changes = &result.file_changes["a.yaml"][&id("Kustomization", "")];
        assert_eq!(changes[0].setter, "ns:policy:name");
        assert_eq!(changes[1].setter, "ns:policy:tag");
    }

    #[test]
    fn objects_merges_across_files_without_duplicates() {
        let mut result = UpdateResult::default();
        result.add_image("a.yaml", id("CronJob", "foo"), image("repo:v1", "policy"));
        result.add_image("b.yaml", id("CronJob", "foo"), image("repo:v1", "policy"));
        result.add_image("b.yaml", id("CronJob", "foo"), image("other:v2", "second"));

        let merged = result.objects();
        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[&id("CronJob", "foo")],
            vec![image("repo:v1", "policy"), image("other:v2", "second")]
        );
    }

    #[test]
    fn empty_results_report_empty() {
        assert!(UpdateResult::default().is_empty());
        assert!(UpdateResultV2::default().is_empty());
    }

    #[test]
    fn change_serializes_for_downstream_consumers() {
        let change = Change {
            old_value: "image:v1.0.0".to_string(),
            new_value: "image:v1.0.1".to_string(),
            setter: "ns:policy".to_string(),
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["setter"], "ns:policy");
        assert_eq!(json["old_value"], "image:v1.0.0");
    }
}
