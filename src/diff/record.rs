//! Record comparison and whole-record materialization.

use crate::change::ChangeKind;
use crate::error::{DiffError, Result};
use crate::value::{Record, Value};

use super::{child_path, DiffContext};

impl DiffContext<'_> {
    /// Diff two records field-by-field, skipping excluded and immutable
    /// fields and consulting the configured filter predicate. A wholly
    /// absent side collapses to one create/delete leaf change per field
    /// (or a single opaque change when itemization is disabled).
    pub(crate) fn diff_record(
        &mut self,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()> {
        match (left, right) {
            (None, Some(Value::Record(rec))) => {
                self.materialize_record(ChangeKind::Create, path, rec, parent)
            }
            (Some(Value::Record(rec)), None) => {
                self.materialize_record(ChangeKind::Delete, path, rec, parent)
            }
            (Some(Value::Record(l)), Some(Value::Record(r))) => {
                for field in l.fields() {
                    let meta = &field.meta;
                    if meta.skip || meta.immutable {
                        continue;
                    }
                    if let Some(filter) = self.opts.filter {
                        if !filter(path, l, meta) {
                            continue;
                        }
                    }
                    let fpath = if meta.embedded && self.opts.flatten_embedded {
                        path.to_vec()
                    } else {
                        child_path(path, meta.name.clone())
                    };
                    self.diff_values(&fpath, Some(&field.value), r.get(&meta.name), Some(l))?;
                }
                Ok(())
            }
            (None, None) => Ok(()),
            _ => Err(DiffError::TypeMismatch),
        }
    }

    fn materialize_record(
        &mut self,
        kind: ChangeKind,
        path: &[String],
        rec: &Record,
        parent: Option<&Record>,
    ) -> Result<()> {
        if self.opts.disable_struct_values {
            let whole = Some(Value::Record(rec.clone()));
            match kind {
                ChangeKind::Create => self.push(kind, path.to_vec(), None, whole, parent),
                ChangeKind::Delete => self.push(kind, path.to_vec(), whole, None, parent),
                ChangeKind::Update => {}
            }
            return Ok(());
        }
        self.record_values(kind, path, rec)
    }

    /// Itemize a record's fields as create or delete entries: each field is
    /// diffed against absence and the resulting changes are relabeled to
    /// the requested kind. This yields a flat itemization of a whole-record
    /// creation or deletion instead of one opaque blob, preserving the
    /// detail patch-time allocation needs.
    pub(crate) fn record_values(
        &mut self,
        kind: ChangeKind,
        path: &[String],
        rec: &Record,
    ) -> Result<()> {
        let start = self.mark();
        for field in rec.fields() {
            if field.meta.skip || field.meta.immutable {
                continue;
            }
            let fpath = child_path(path, field.meta.name.clone());
            self.diff_values(&fpath, None, Some(&field.value), Some(rec))?;
        }
        self.relabel_since(start, kind);
        Ok(())
    }
}
