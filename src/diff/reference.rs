//! Reference and polymorphic-slot comparison.

use crate::change::ChangeKind;
use crate::error::{DiffError, Result};
use crate::value::{Record, Value};

use super::DiffContext;

impl DiffContext<'_> {
    /// Diff two nullable references. Both nil is no change; one nil is an
    /// update against nil (or a create/delete when the corresponding side
    /// is structurally absent rather than merely nil); both present
    /// consults the cycle guard and then dereferences and recurses.
    pub(crate) fn diff_reference(
        &mut self,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()> {
        match (left, right) {
            (None, Some(value @ Value::Ref(inner))) => match inner {
                Some(cell) => {
                    let pointee = cell.borrow();
                    self.diff_values(path, None, Some(&*pointee), parent)
                }
                None => {
                    self.push(ChangeKind::Create, path.to_vec(), None, Some(value.clone()), parent);
                    Ok(())
                }
            },
            (Some(value @ Value::Ref(inner)), None) => match inner {
                Some(cell) => {
                    let pointee = cell.borrow();
                    self.diff_values(path, Some(&*pointee), None, parent)
                }
                None => {
                    self.push(ChangeKind::Delete, path.to_vec(), Some(value.clone()), None, parent);
                    Ok(())
                }
            },
            (Some(lv @ Value::Ref(l)), Some(rv @ Value::Ref(r))) => match (l, r) {
                (None, None) => Ok(()),
                (None, Some(_)) => {
                    self.push(ChangeKind::Update, path.to_vec(), None, Some(rv.clone()), parent);
                    Ok(())
                }
                (Some(_), None) => {
                    self.push(ChangeKind::Update, path.to_vec(), Some(lv.clone()), None, parent);
                    Ok(())
                }
                (Some(lc), Some(rc)) => {
                    // Already-compared pairs are assumed unchanged, which
                    // bounds traversal on cyclic graphs.
                    if self.guard.visit(lc, rc) {
                        return Ok(());
                    }
                    let lp = lc.borrow();
                    let rp = rc.borrow();
                    self.diff_values(path, Some(&*lp), Some(&*rp), parent)
                }
            },
            (None, None) => Ok(()),
            _ => Err(DiffError::TypeMismatch),
        }
    }

    /// Diff two polymorphic slots: both empty is no change, one empty is an
    /// update against nil carrying the held value, both held unwrap to the
    /// concrete values and recurse.
    pub(crate) fn diff_slot(
        &mut self,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()> {
        match (left, right) {
            (None, Some(value)) => {
                self.push(ChangeKind::Create, path.to_vec(), None, Some(value.clone()), parent);
                Ok(())
            }
            (Some(value), None) => {
                self.push(ChangeKind::Delete, path.to_vec(), Some(value.clone()), None, parent);
                Ok(())
            }
            (Some(Value::Slot(l)), Some(Value::Slot(r))) => match (l, r) {
                (None, None) => Ok(()),
                (None, Some(held)) => {
                    self.push(
                        ChangeKind::Update,
                        path.to_vec(),
                        None,
                        Some((**held).clone()),
                        parent,
                    );
                    Ok(())
                }
                (Some(held), None) => {
                    self.push(
                        ChangeKind::Update,
                        path.to_vec(),
                        Some((**held).clone()),
                        None,
                        parent,
                    );
                    Ok(())
                }
                (Some(lh), Some(rh)) => self.diff_values(path, Some(&**lh), Some(&**rh), parent),
            },
            (None, None) => Ok(()),
            _ => Err(DiffError::TypeMismatch),
        }
    }
}
