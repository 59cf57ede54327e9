//! Setter markers: the comment-embedded grammar linking manifest fields to
//! image policies, and the resolution of a marker to its replacement text.
//!
//! A marker is a JSON object in an inline comment:
//!
//! ```yaml
//! image: image:v1.0.0 # {"$imagepolicy": "automation-ns:policy"}
//! newTag: v1 # {"$imagepolicy": "automation-ns:policy:tag"}
//! ```
//!
//! "No marker" and "malformed marker" are first-class outcomes, not
//! errors: a repository may carry markers for policies that are not
//! tracked this run, and ordinary comments are everywhere.

mod marker;

pub use marker::{parse_marker, Marker, SETTER_SHORTHAND};

use refsync_types::{ImagePolicy, NamespacedName, RefPart};
use std::collections::BTreeMap;

/// Lookup of the supplied policy collection by identity. Later duplicates
/// of the same identity win.
#[derive(Debug, Clone, Default)]
pub struct PolicyIndex {
    by_id: BTreeMap<NamespacedName, ImagePolicy>,
}

impl PolicyIndex {
    pub fn new(policies: impl IntoIterator<Item = ImagePolicy>) -> Self {
        let mut by_id = BTreeMap::new();
        for policy in policies {
            by_id.insert(policy.id.clone(), policy);
        }
        Self { by_id }
    }

    pub fn get(&self, id: &NamespacedName) -> Option<&ImagePolicy> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Resolve the replacement text for a marker against a policy.
///
/// `None` selects the whole reference (`repository[:tag][@digest]`); a
/// part selects exactly that component. A part absent from the resolved
/// reference yields `None`: nothing to set, not an error.
pub fn resolve(policy: &ImagePolicy, part: Option<RefPart>) -> Option<String> {
    match part {
        None => Some(policy.latest_ref.to_string()),
        Some(RefPart::Name) => Some(policy.latest_ref.repository.clone()),
        Some(RefPart::Tag) => policy.latest_ref.tag.clone(),
        Some(RefPart::Digest) => policy.latest_ref.digest.clone(),
    }
}

/// The setter identity recorded on a [`refsync_types::Change`]:
/// `namespace:name` for whole-reference setters, `namespace:name:part`
/// for part setters.
pub fn setter_identity(policy: &NamespacedName, part: Option<RefPart>) -> String {
    match part {
        None => format!("{}:{}", policy.namespace, policy.name),
        Some(part) => format!("{}:{}:{}", policy.namespace, policy.name, part),
    }
}
