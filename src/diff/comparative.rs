//! Identity-based reconciliation of unordered collections.

use indexmap::IndexMap;

use crate::change::ChangeKind;
use crate::error::Result;
use crate::value::{Record, Value};

use super::{child_path, DiffContext};

/// One reconciled pair: the element carrying a given identity key on each
/// side, either of which may be missing.
#[derive(Debug, Default)]
pub(crate) struct Comparative<'v> {
    pub left: Option<&'v Value>,
    pub right: Option<&'v Value>,
}

/// Scratch mapping from identity key to reconciled pair, local to one
/// diff-of-collection call. Iteration follows insertion order of first
/// occurrence, so repeated runs over identical inputs produce identical
/// changelog ordering.
#[derive(Debug, Default)]
pub(crate) struct ComparativeList<'v> {
    entries: IndexMap<String, Comparative<'v>>,
}

impl<'v> ComparativeList<'v> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_left(&mut self, key: String, value: &'v Value) {
        self.entries.entry(key).or_default().left = Some(value);
    }

    pub(crate) fn add_right(&mut self, key: String, value: &'v Value) {
        self.entries.entry(key).or_default().right = Some(value);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Comparative<'v>)> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl DiffContext<'_> {
    /// Emit changes for a reconciled collection: an element present only on
    /// the left is a delete, only on the right a create, and present on
    /// both recurses the diff at the key's path.
    pub(crate) fn reconcile(
        &mut self,
        path: &[String],
        list: &ComparativeList<'_>,
        parent: Option<&Record>,
    ) -> Result<()> {
        for (key, pair) in list.iter() {
            let kpath = child_path(path, key.clone());
            match (pair.left, pair.right) {
                (Some(l), None) => {
                    self.push(ChangeKind::Delete, kpath, Some(l.clone()), None, parent);
                }
                (None, Some(r)) => {
                    self.push(ChangeKind::Create, kpath, None, Some(r.clone()), parent);
                }
                (Some(l), Some(r)) => self.diff_values(&kpath, Some(l), Some(r), parent)?,
                (None, None) => {}
            }
        }
        Ok(())
    }
}
