//! Ordered-sequence comparison.

use crate::change::ChangeKind;
use crate::error::{DiffError, Result};
use crate::value::{Record, Value};

use super::{child_path, ComparativeList, DiffContext};

impl DiffContext<'_> {
    /// Diff two sequences. When every element exposes an identifier the
    /// comparative reconciler matches elements by identity; otherwise
    /// comparison is by membership (default) or by position when sequence
    /// ordering is significant. An absent side is treated as the empty
    /// sequence, itemizing per-element changes.
    pub(crate) fn diff_sequence(
        &mut self,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()> {
        let l_items: &[Value] = match left {
            Some(Value::List(items)) => items.as_slice(),
            None => &[],
            Some(_) => return Err(DiffError::TypeMismatch),
        };
        let r_items: &[Value] = match right {
            Some(Value::List(items)) => items.as_slice(),
            None => &[],
            Some(_) => return Err(DiffError::TypeMismatch),
        };

        if is_comparative(l_items, r_items) {
            return self.diff_sequence_comparative(path, l_items, r_items, parent);
        }
        if self.opts.slice_ordering {
            return self.diff_sequence_ordered(path, l_items, r_items, parent);
        }
        self.diff_sequence_unordered(path, l_items, r_items, parent)
    }

    /// Membership comparison: an element present on one side with no
    /// unconsumed equal counterpart on the other is a delete (left) or
    /// create (right) at its own index. Duplicate values are matched once
    /// each, not all at once.
    fn diff_sequence_unordered(
        &mut self,
        path: &[String],
        a: &[Value],
        b: &[Value],
        parent: Option<&Record>,
    ) -> Result<()> {
        let mut used_b = vec![false; b.len()];
        for (i, ae) in a.iter().enumerate() {
            let counterpart = b
                .iter()
                .enumerate()
                .find(|(j, be)| !used_b[*j] && *be == ae)
                .map(|(j, _)| j);
            match counterpart {
                Some(j) => used_b[j] = true,
                None => self.push(
                    ChangeKind::Delete,
                    child_path(path, i.to_string()),
                    Some(ae.clone()),
                    None,
                    parent,
                ),
            }
        }

        let mut used_a = vec![false; a.len()];
        for (j, be) in b.iter().enumerate() {
            let counterpart = a
                .iter()
                .enumerate()
                .find(|(i, ae)| !used_a[*i] && *ae == be)
                .map(|(i, _)| i);
            match counterpart {
                Some(i) => used_a[i] = true,
                None => self.push(
                    ChangeKind::Create,
                    child_path(path, j.to_string()),
                    None,
                    Some(be.clone()),
                    parent,
                ),
            }
        }
        Ok(())
    }

    /// Positional comparison: recurse per index up to the shorter length,
    /// then delete or create the tail of the longer side.
    fn diff_sequence_ordered(
        &mut self,
        path: &[String],
        a: &[Value],
        b: &[Value],
        parent: Option<&Record>,
    ) -> Result<()> {
        let shared = a.len().min(b.len());
        for i in 0..shared {
            self.diff_values(&child_path(path, i.to_string()), Some(&a[i]), Some(&b[i]), parent)?;
        }
        for (i, ae) in a.iter().enumerate().skip(shared) {
            self.push(
                ChangeKind::Delete,
                child_path(path, i.to_string()),
                Some(ae.clone()),
                None,
                parent,
            );
        }
        for (j, be) in b.iter().enumerate().skip(shared) {
            self.push(
                ChangeKind::Create,
                child_path(path, j.to_string()),
                None,
                Some(be.clone()),
                parent,
            );
        }
        Ok(())
    }

    fn diff_sequence_comparative(
        &mut self,
        path: &[String],
        a: &[Value],
        b: &[Value],
        parent: Option<&Record>,
    ) -> Result<()> {
        let mut list = ComparativeList::new();
        for ae in a {
            if let Some(key) = ae.identity_key() {
                list.add_left(key, ae);
            }
        }
        for be in b {
            if let Some(key) = be.identity_key() {
                list.add_right(key, be);
            }
        }
        self.reconcile(path, &list, parent)
    }
}

/// A sequence reconciles by identity only when it has elements and every
/// element on both sides, behind any reference or slot wrappers, is a
/// record declaring an identifier field.
fn is_comparative(a: &[Value], b: &[Value]) -> bool {
    if a.is_empty() && b.is_empty() {
        return false;
    }
    a.iter().chain(b.iter()).all(Value::has_identifier)
}
