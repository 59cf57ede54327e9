//! The inline marker grammar.

use refsync_types::{NamespacedName, RefPart};
use tracing::debug;

/// Key of the JSON object that marks a field as a setter target.
pub const SETTER_SHORTHAND: &str = "$imagepolicy";

/// Outcome of testing a comment against the marker grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Not a marker at all: an ordinary comment, or none.
    None,
    /// Carries the shorthand key but does not satisfy the grammar.
    /// Ignored, never an error.
    Malformed,
    /// A recognized setter referencing a policy, optionally selecting one
    /// part of its reference.
    Setter {
        policy: NamespacedName,
        part: Option<RefPart>,
    },
}

/// Test a comment against the marker grammar.
///
/// The comment may include its leading `#`s. Anything that is not a JSON
/// object carrying [`SETTER_SHORTHAND`] is [`Marker::None`]; a carrier
/// whose value is not `namespace:name` or `namespace:name:part` with a
/// known part is [`Marker::Malformed`].
pub fn parse_marker(comment: &str) -> Marker {
    let body = comment.trim_start().trim_start_matches('#').trim();
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Marker::None;
    };
    let Some(setter) = value.as_object().and_then(|obj| obj.get(SETTER_SHORTHAND)) else {
        return Marker::None;
    };
    let Some(setter) = setter.as_str() else {
        debug!(marker = %setter, "setter marker value is not a string");
        return Marker::Malformed;
    };

    let segments: Vec<&str> = setter.split(':').collect();
    if segments.iter().any(|s| s.is_empty()) {
        debug!(marker = setter, "setter marker has empty segments");
        return Marker::Malformed;
    }
    match segments.as_slice() {
        [namespace, name] => Marker::Setter {
            policy: NamespacedName::new(*namespace, *name),
            part: None,
        },
        [namespace, name, part] => match part.parse::<RefPart>() {
            Ok(part) => Marker::Setter {
                policy: NamespacedName::new(*namespace, *name),
                part: Some(part),
            },
            Err(_) => {
                debug!(marker = setter, "setter marker selects an unknown part");
                Marker::Malformed
            }
        },
        _ => {
            debug!(marker = setter, "setter marker is not namespace:name[:part]");
            Marker::Malformed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ordinary_comments_are_not_markers() {
        assert_eq!(parse_marker("# just a note"), Marker::None);
        assert_eq!(parse_marker("# {\"other\": \"key\"}"), Marker::None);
        assert_eq!(parse_marker("# [1, 2]"), Marker::None);
        assert_eq!(parse_marker("#"), Marker::None);
    }

    #[test]
    fn whole_reference_marker() {
        assert_eq!(
            parse_marker("# {\"$imagepolicy\": \"automation-ns:policy\"}"),
            Marker::Setter {
                policy: NamespacedName::new("automation-ns", "policy"),
                part: None,
            }
        );
    }

    #[test]
    fn part_markers() {
        for (text, part) in [
            ("name", RefPart::Name),
            ("tag", RefPart::Tag),
            ("digest", RefPart::Digest),
        ] {
            let comment = format!("# {{\"$imagepolicy\": \"automation-ns:policy:{text}\"}}");
            assert_eq!(
                parse_marker(&comment),
                Marker::Setter {
                    policy: NamespacedName::new("automation-ns", "policy"),
                    part: Some(part),
                }
            );
        }
    }

    #[test]
    fn malformed_markers_are_flagged_not_rejected() {
        for comment in [
            "# {\"$imagepolicy\": \"not-a-setter\"}",
            "# {\"$imagepolicy\": \"ns:policy:latest\"}",
            "# {\"$imagepolicy\": \"ns:policy:tag:extra\"}",
            "# {\"$imagepolicy\": \"ns::tag\"}",
            "# {\"$imagepolicy\": 42}",
        ] {
            assert_eq!(parse_marker(comment), Marker::Malformed, "{comment}");
        }
    }

    #[test]
    fn leading_hashes_and_whitespace_are_tolerated() {
        assert_eq!(
            parse_marker("  ## {\"$imagepolicy\": \"ns:p:tag\"}  "),
            Marker::Setter {
                policy: NamespacedName::new("ns", "p"),
                part: Some(RefPart::Tag),
            }
        );
    }
}
