//! User-supplied per-type comparators.

use crate::error::Result;
use crate::value::{Record, Value};

use super::DiffContext;

/// A comparator consulted before built-in dispatch.
///
/// Comparators are tried in registration order; the first whose
/// [`matches`](CustomDiffer::matches) returns true for a (left, right)
/// pair fully owns the decision for that node, including whether to
/// recurse. The [`DiffContext`] passed to
/// [`diff`](CustomDiffer::diff) is the recursion capability:
/// [`DiffContext::diff_builtin`] continues with built-in dispatch (useful
/// for descending into a node of the comparator's own type without
/// matching it again), [`DiffContext::diff_values`] re-enters the full
/// pipeline, and [`DiffContext::add`] appends changes directly. This lets
/// recursive user-defined shapes such as trees short-circuit with custom
/// logic.
pub trait CustomDiffer {
    /// Whether this comparator owns the given pair. Either side may be
    /// absent.
    fn matches(&self, left: Option<&Value>, right: Option<&Value>) -> bool;

    /// Diff the pair, emitting changes through the context.
    fn diff(
        &self,
        ctx: &mut DiffContext<'_>,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()>;
}
