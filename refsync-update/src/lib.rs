//! Marker-driven manifest updates.
//!
//! The public entry points walk a directory tree of YAML manifests,
//! rewrite every marked scalar whose policy resolves to a different
//! value, write the results under an output root, and return a full
//! accounting of what changed:
//!
//! - [`update_with_setters`] returns the "which references landed where"
//!   view ([`refsync_types::UpdateResult`]);
//! - [`update_v2_with_setters`] additionally returns every individual
//!   edit with its before/after values
//!   ([`refsync_types::UpdateResultV2`]).
//!
//! Both views come from one pass and agree by construction. Files are
//! independent: no state is shared across them beyond the result maps.

mod engine;
mod rules;
mod update;

pub use engine::{apply_setters, object_identifier};
pub use rules::SelectionRules;
pub use update::{update_v2_with_setters, update_with_setters};
