//! Per-file substitution: scan marked scalars, resolve, mutate, record.

use refsync_setters::{parse_marker, resolve, setter_identity, Marker, PolicyIndex};
use refsync_types::{Change, ImageRef, ObjectIdentifier, UpdateResultV2};
use refsync_yaml::{Node, SourceFile};
use tracing::debug;

/// Identity of the resource a document describes, from its own
/// `apiVersion`/`kind`/`metadata` fields. Missing fields become empty
/// strings; marker content plays no part.
pub fn object_identifier(doc: &Node) -> ObjectIdentifier {
    let field = |path: &[&str]| -> String {
        let mut node = doc;
        for key in path {
            match node.get(key) {
                Some(next) => node = next,
                None => return String::new(),
            }
        }
        node.as_str().unwrap_or_default().to_string()
    };

    ObjectIdentifier {
        api_version: field(&["apiVersion"]),
        kind: field(&["kind"]),
        namespace: field(&["metadata", "namespace"]),
        name: field(&["metadata", "name"]),
    }
}

/// Apply every applicable setter in `file`, accumulating changes and
/// applied references under `rel_path`.
///
/// Scalars are visited depth-first in document order, so recorded change
/// order is scan order. A marker is skipped — silently, these are all
/// steady-state conditions — when it is malformed, references a policy
/// missing from `policies`, selects a part the resolved reference does
/// not carry, or resolves to the value already present.
pub fn apply_setters(
    file: &mut SourceFile,
    rel_path: &str,
    policies: &PolicyIndex,
    result: &mut UpdateResultV2,
) {
    for doc in file.documents_mut() {
        let id = object_identifier(doc);
        doc.visit_scalars_mut(&mut |scalar| {
            let Some(comment) = scalar.comment() else {
                return;
            };
            let (policy_id, part) = match parse_marker(comment) {
                Marker::None => return,
                Marker::Malformed => {
                    debug!(file = rel_path, comment, "ignoring malformed setter marker");
                    return;
                }
                Marker::Setter { policy, part } => (policy, part),
            };

            let Some(policy) = policies.get(&policy_id) else {
                debug!(
                    file = rel_path,
                    policy = %policy_id,
                    "marker references a policy not tracked this run"
                );
                return;
            };
            let Some(new_value) = resolve(policy, part) else {
                debug!(
                    file = rel_path,
                    policy = %policy_id,
                    "resolved reference lacks the selected part"
                );
                return;
            };
            if scalar.value() == new_value {
                return;
            }

            let change = Change {
                old_value: scalar.value().to_string(),
                new_value: new_value.clone(),
                setter: setter_identity(&policy_id, part),
            };
            scalar.set(&new_value);
            result.add_change(rel_path, id.clone(), change);
            result.image_result.add_image(
                rel_path,
                id.clone(),
                ImageRef {
                    reference: policy.latest_ref.clone(),
                    policy: policy_id,
                },
            );
        });
    }
}
