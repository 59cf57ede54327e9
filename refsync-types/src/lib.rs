//! Shared data model for the refsync workspace.
//!
//! # Design constraints
//! - Change and reference records are serialized by downstream consumers
//!   (commit-message generation); be conservative with breaking changes.
//! - Result containers preserve insertion order wherever order is part of
//!   the contract; map iteration order is deterministic (`BTreeMap`).

pub mod image;
pub mod result;

pub use image::{ImagePolicy, NamespacedName, ParseReferenceError, RefPart, Reference};
pub use result::{
    Change, FileResult, ImageRef, ObjectChanges, ObjectIdentifier, UpdateResult, UpdateResultV2,
};
