//! Image policies and resolved image references.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Namespace/name identity of a policy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A resolved image reference: repository plus optional tag and digest.
///
/// The textual form is `repository[:tag][@digest]`. The tag is omitted for
/// digest-only references; the digest is appended whenever present,
/// regardless of whether a tag is also present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseReferenceError {
    #[error("empty repository in image reference {0:?}")]
    EmptyRepository(String),
    #[error("empty tag in image reference {0:?}")]
    EmptyTag(String),
    #[error("empty digest in image reference {0:?}")]
    EmptyDigest(String),
}

impl FromStr for Reference {
    type Err = ParseReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (rest, digest) = match s.rsplit_once('@') {
            Some((_, d)) if d.is_empty() => {
                return Err(ParseReferenceError::EmptyDigest(s.to_string()));
            }
            Some((r, d)) => (r, Some(d.to_string())),
            None => (s, None),
        };

        // A `:` only separates a tag when it comes after the final `/`;
        // otherwise it belongs to a registry port (`reg.example.com:5000/app`).
        let name_start = rest.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match rest[name_start..].rfind(':') {
            Some(i) => {
                let split = name_start + i;
                let tag = &rest[split + 1..];
                if tag.is_empty() {
                    return Err(ParseReferenceError::EmptyTag(s.to_string()));
                }
                (rest[..split].to_string(), Some(tag.to_string()))
            }
            None => (rest.to_string(), None),
        };

        if repository.is_empty() {
            return Err(ParseReferenceError::EmptyRepository(s.to_string()));
        }

        Ok(Reference {
            repository,
            tag,
            digest,
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

/// An externally supplied policy: identity plus the latest resolved
/// reference. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePolicy {
    pub id: NamespacedName,
    pub latest_ref: Reference,
}

impl ImagePolicy {
    pub fn new(id: NamespacedName, latest_ref: Reference) -> Self {
        Self { id, latest_ref }
    }
}

/// The part of a reference a part-setter marker selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefPart {
    Name,
    Tag,
    Digest,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown reference part {0:?}")]
pub struct ParseRefPartError(String);

impl FromStr for RefPart {
    type Err = ParseRefPartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(RefPart::Name),
            "tag" => Ok(RefPart::Tag),
            "digest" => Ok(RefPart::Digest),
            other => Err(ParseRefPartError(other.to_string())),
        }
    }
}

impl fmt::Display for RefPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefPart::Name => "name",
            RefPart::Tag => "tag",
            RefPart::Digest => "digest",
        })
    }
}
