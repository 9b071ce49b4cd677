//! **Structural diff and best-effort patch for dynamic value graphs.**
//!
//! `structdiff` computes the structural difference between two values of
//! compatible shape (records, ordered sequences, keyed maps, nullable
//! references, polymorphic slots and primitives) as an ordered
//! [`Changelog`] of atomic [`Change`]s, and replays such a changelog onto a
//! third, possibly different, target value with per-change outcome
//! bookkeeping in a [`PatchLog`].
//!
//! ## Key behaviors
//!
//! - **Identity-based reconciliation**: elements of unordered collections
//!   whose records declare an `identifier` field are matched by identity
//!   key instead of position, so reordering alone produces no changes.
//! - **Cycle-safe traversal**: reference pairs already compared within a
//!   diff call are assumed unchanged, bounding recursion on cyclic graphs.
//! - **Best-effort patching**: every changelog entry is applied
//!   independently with equality-verify-then-fallback-scan semantics;
//!   failures are recorded per entry and never abort the batch.
//!
//! ## Example
//!
//! ```
//! use structdiff::{diff, patch, ChangeKind, Record, Value};
//!
//! let left = Value::Record(
//!     Record::new("Fruit")
//!         .with_field("name", Value::from("Green Apple"))
//!         .with_field("nutrients,create", Value::List(vec![Value::from("vitamin c")])),
//! );
//! let right = Value::Record(
//!     Record::new("Fruit")
//!         .with_field("name", Value::from("Red Apple"))
//!         .with_field(
//!             "nutrients,create",
//!             Value::List(vec![Value::from("vitamin c"), Value::from("vitamin e")]),
//!         ),
//! );
//!
//! let changelog = diff(&left, &right)?;
//! assert_eq!(changelog.len(), 2);
//! assert_eq!(changelog[0].kind, ChangeKind::Update);
//! assert_eq!(changelog[0].path, vec!["name"]);
//!
//! let mut target = left.clone();
//! let log = patch(&changelog, &mut target);
//! assert!(!log.has_errors());
//! assert_eq!(target, right);
//! # Ok::<(), structdiff::DiffError>(())
//! ```
//!
//! ## Configuration
//!
//! [`Differ::builder`] exposes the configuration surface: sequence-order
//! significance, type-mismatch tolerance, parent retention, embedded-field
//! flattening, custom per-type comparators, a field-descent filter and
//! patch-time type conversion. A `Differ`'s changelog buffer is reset at
//! the start of every diff call; reuse an instance sequentially, never
//! concurrently.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // # Errors / # Panics doc sections are not enforced for this crate
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // `diff::DiffError` style repetition is a deliberate naming choice
    clippy::module_name_repetitions
)]

pub mod change;
pub mod diff;
pub mod error;
pub mod patch;
pub mod value;

// Re-export main types for convenience
pub use change::{Change, ChangeKind, Changelog};
pub use diff::{CustomDiffer, DiffContext, Differ, DifferBuilder, FilterFn};
pub use error::{DiffError, PatchError, Result};
pub use patch::{PatchFlags, PatchLog, PatchLogEntry};
pub use value::{Field, FieldMeta, Kind, Record, Value};

/// Compute the changelog of all mutated values between `left` and `right`
/// with default configuration.
pub fn diff(left: &Value, right: &Value) -> Result<Changelog> {
    Differ::new().diff(left, right)
}

/// True when the two values differ.
#[must_use]
pub fn changed(left: &Value, right: &Value) -> bool {
    Differ::new().changed(left, right)
}

/// Itemize a single record's fields as created or deleted entries, as if
/// the record were wholly created or deleted, honoring the same field
/// metadata as [`diff`].
pub fn struct_values(
    kind: ChangeKind,
    base_path: &[String],
    value: &Value,
) -> Result<Changelog> {
    Differ::new().struct_values(kind, base_path, value)
}

/// Apply a changelog to `target` with default configuration. Patching is
/// infallible; inspect the returned [`PatchLog`] for per-entry outcomes.
pub fn patch(changelog: &Changelog, target: &mut Value) -> PatchLog {
    Differ::new().patch(changelog, target)
}

/// Diff `original` against `modified` and apply the result to `target` in
/// one call. Only the diff phase can fail.
pub fn merge(original: &Value, modified: &Value, target: &mut Value) -> Result<PatchLog> {
    Differ::new().merge(original, modified, target)
}
