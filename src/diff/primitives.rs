//! Leaf comparators: booleans, numbers, strings and timestamps.

use crate::change::ChangeKind;
use crate::error::Result;
use crate::value::{Record, Value};

use super::DiffContext;

impl DiffContext<'_> {
    /// Compare two primitives by value equality. Numeric kinds are
    /// distinct (signed, unsigned and float never compare equal to each
    /// other; a disagreement is a kind mismatch upstream); strings
    /// compare byte-for-byte.
    pub(crate) fn diff_primitive(
        &mut self,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()> {
        match (left, right) {
            (None, Some(r)) => {
                self.push(ChangeKind::Create, path.to_vec(), None, Some(r.clone()), parent);
            }
            (Some(l), None) => {
                self.push(ChangeKind::Delete, path.to_vec(), Some(l.clone()), None, parent);
            }
            (Some(l), Some(r)) => {
                if l != r {
                    self.push(
                        ChangeKind::Update,
                        path.to_vec(),
                        Some(l.clone()),
                        Some(r.clone()),
                        parent,
                    );
                }
            }
            (None, None) => {}
        }
        Ok(())
    }

    /// Compare two timestamps at the full stored nanosecond precision, so
    /// equality is unaffected by any serialization round-trip of the
    /// surrounding values.
    pub(crate) fn diff_time(
        &mut self,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()> {
        // DateTime equality is already instant-based at nanosecond
        // precision, which is exactly the comparison wanted here.
        self.diff_primitive(path, left, right, parent)
    }
}
