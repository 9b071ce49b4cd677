//! Best-effort replay of a changelog onto a live target.
//!
//! Each change in the changelog is applied independently: the engine
//! resolves the change's path against the target, executes the
//! create/update/delete with equality-verify-then-fallback-scan semantics,
//! and records the outcome, flags plus an optional chained error, on one
//! [`PatchLogEntry`]. A failing entry never aborts the rest of the batch:
//! a changelog computed from one pair of values is frequently replayed
//! against a third, structurally similar but not identical, value, and
//! index-based sequence addressing is inherently fragile under such
//! replay.

mod cursor;
mod log;

pub use log::{PatchFlags, PatchLog, PatchLogEntry};

use crate::change::Changelog;
use crate::diff::Differ;
use crate::error::Result;
use crate::value::Value;

use cursor::PatchOptions;

impl Differ {
    /// Apply a changelog to `target`, honoring this differ's patch-time
    /// options. Returns one outcome entry per input change; inspect the
    /// log rather than expecting an error; patching itself is infallible.
    pub fn patch(&self, changelog: &Changelog, target: &mut Value) -> PatchLog {
        let opts = PatchOptions {
            convert_compatible: self.convert_compatible_types,
        };
        let entries = changelog
            .iter()
            .map(|change| cursor::apply_change(change, target, &opts))
            .collect();
        PatchLog::from_entries(entries)
    }

    /// Diff `original` against `modified` and apply the result to
    /// `target` in one call. Only the diff phase can fail.
    pub fn merge(
        &mut self,
        original: &Value,
        modified: &Value,
        target: &mut Value,
    ) -> Result<PatchLog> {
        let changelog = self.diff(original, modified)?;
        Ok(self.patch(&changelog, target))
    }
}
