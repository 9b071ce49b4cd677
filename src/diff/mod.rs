//! The recursive type-dispatch diff engine.
//!
//! A [`Differ`] fixes the configuration once at construction and owns the
//! changelog buffer; the buffer is reset at the start of every
//! [`diff`](Differ::diff) call, so one instance may be reused sequentially
//! for unrelated calls but must not be shared across threads. Each call
//! allocates a fresh cycle guard, walks both values in lock-step and emits
//! [`Change`]s in traversal order.

mod comparative;
mod custom;
mod cycle;
mod keyed;
mod primitives;
mod record;
mod reference;
mod sequence;

pub use custom::CustomDiffer;

pub(crate) use comparative::ComparativeList;
pub(crate) use cycle::CycleGuard;

use crate::change::{Change, ChangeKind, Changelog};
use crate::error::{DiffError, Result};
use crate::value::{FieldMeta, Kind, Record, Value};

/// Predicate deciding whether the differ descends into a record field.
/// Receives the path to the enclosing record, the record itself and the
/// field's metadata; returning false skips the field entirely.
pub type FilterFn = Box<dyn Fn(&[String], &Record, &FieldMeta) -> bool>;

type FilterPredicate = dyn Fn(&[String], &Record, &FieldMeta) -> bool;

/// A configurable diff instance.
pub struct Differ {
    /// Positional ordering of sequences is significant.
    pub slice_ordering: bool,
    /// Emit one opaque change for a wholly created/deleted record instead
    /// of itemizing its fields.
    pub disable_struct_values: bool,
    /// Tolerate fundamental-kind mismatches as a single update instead of
    /// failing the call.
    pub allow_type_mismatch: bool,
    /// Drop the enclosing composite from emitted changes. Saves memory at
    /// the cost of patch-time allocation context.
    pub discard_parent: bool,
    /// Flatten fields marked embedded into the parent's path.
    pub flatten_embedded: bool,
    /// At patch time, convert values whose representation is compatible
    /// with the target's kind instead of rejecting the write.
    pub convert_compatible_types: bool,
    filter: Option<FilterFn>,
    custom: Vec<Box<dyn CustomDiffer>>,
    changes: Vec<Change>,
}

impl Default for Differ {
    fn default() -> Self {
        Self::new()
    }
}

impl Differ {
    /// A differ with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slice_ordering: false,
            disable_struct_values: false,
            allow_type_mismatch: false,
            discard_parent: false,
            flatten_embedded: false,
            convert_compatible_types: false,
            filter: None,
            custom: Vec::new(),
            changes: Vec::new(),
        }
    }

    #[must_use]
    pub fn builder() -> DifferBuilder {
        DifferBuilder::default()
    }

    /// Compute the changelog of all mutated values between `left` and
    /// `right`.
    pub fn diff(&mut self, left: &Value, right: &Value) -> Result<Changelog> {
        self.changes.clear();
        let mut guard = CycleGuard::default();
        let mut ctx = self.context(&mut guard);
        ctx.diff_values(&[], Some(left), Some(right), None)?;
        tracing::debug!(changes = self.changes.len(), "diff complete");
        Ok(Changelog::from_vec(std::mem::take(&mut self.changes)))
    }

    /// True when the two values differ. Errors count as "unchanged",
    /// matching the convenience contract.
    pub fn changed(&mut self, left: &Value, right: &Value) -> bool {
        self.diff(left, right).map(|cl| !cl.is_empty()).unwrap_or(false)
    }

    /// Itemize a single record's fields as if the record were wholly
    /// created or deleted, honoring the same field metadata as
    /// [`diff`](Differ::diff).
    pub fn struct_values(
        &mut self,
        kind: ChangeKind,
        base_path: &[String],
        value: &Value,
    ) -> Result<Changelog> {
        if kind == ChangeKind::Update {
            return Err(DiffError::InvalidChangeKind(kind));
        }
        let Value::Record(rec) = value else {
            return Err(DiffError::UnsupportedKind(value.kind()));
        };

        self.changes.clear();
        let mut guard = CycleGuard::default();
        let mut ctx = self.context(&mut guard);
        ctx.record_values(kind, base_path, rec)?;
        Ok(Changelog::from_vec(std::mem::take(&mut self.changes)))
    }

    fn context<'a>(&'a mut self, guard: &'a mut CycleGuard) -> DiffContext<'a> {
        DiffContext {
            opts: DiffOptions {
                slice_ordering: self.slice_ordering,
                disable_struct_values: self.disable_struct_values,
                allow_type_mismatch: self.allow_type_mismatch,
                discard_parent: self.discard_parent,
                flatten_embedded: self.flatten_embedded,
                filter: self.filter.as_deref(),
            },
            custom: &self.custom,
            changes: &mut self.changes,
            guard,
        }
    }
}

/// Builder for [`Differ`] configuration.
#[derive(Default)]
pub struct DifferBuilder {
    slice_ordering: bool,
    disable_struct_values: bool,
    allow_type_mismatch: bool,
    discard_parent: bool,
    flatten_embedded: bool,
    convert_compatible_types: bool,
    filter: Option<FilterFn>,
    custom: Vec<Box<dyn CustomDiffer>>,
}

impl DifferBuilder {
    /// Make positional ordering of sequences significant.
    #[must_use]
    pub fn slice_ordering(mut self, enabled: bool) -> Self {
        self.slice_ordering = enabled;
        self
    }

    /// Emit one opaque change for wholly created/deleted records.
    #[must_use]
    pub fn disable_struct_values(mut self, enabled: bool) -> Self {
        self.disable_struct_values = enabled;
        self
    }

    /// Report kind mismatches as updates instead of failing.
    #[must_use]
    pub fn allow_type_mismatch(mut self, enabled: bool) -> Self {
        self.allow_type_mismatch = enabled;
        self
    }

    /// Drop the enclosing composite from emitted changes.
    #[must_use]
    pub fn discard_parent(mut self, enabled: bool) -> Self {
        self.discard_parent = enabled;
        self
    }

    /// Flatten embedded fields into the parent's path.
    #[must_use]
    pub fn flatten_embedded(mut self, enabled: bool) -> Self {
        self.flatten_embedded = enabled;
        self
    }

    /// Convert representation-compatible values at patch time.
    #[must_use]
    pub fn convert_compatible_types(mut self, enabled: bool) -> Self {
        self.convert_compatible_types = enabled;
        self
    }

    /// Install a field-descent filter predicate.
    #[must_use]
    pub fn filter(
        mut self,
        f: impl Fn(&[String], &Record, &FieldMeta) -> bool + 'static,
    ) -> Self {
        self.filter = Some(Box::new(f));
        self
    }

    /// Register a custom per-type comparator, consulted in registration
    /// order before built-in dispatch.
    #[must_use]
    pub fn custom_differ(mut self, differ: impl CustomDiffer + 'static) -> Self {
        self.custom.push(Box::new(differ));
        self
    }

    #[must_use]
    pub fn build(self) -> Differ {
        Differ {
            slice_ordering: self.slice_ordering,
            disable_struct_values: self.disable_struct_values,
            allow_type_mismatch: self.allow_type_mismatch,
            discard_parent: self.discard_parent,
            flatten_embedded: self.flatten_embedded,
            convert_compatible_types: self.convert_compatible_types,
            filter: self.filter,
            custom: self.custom,
            changes: Vec::new(),
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct DiffOptions<'a> {
    pub slice_ordering: bool,
    pub disable_struct_values: bool,
    pub allow_type_mismatch: bool,
    pub discard_parent: bool,
    pub flatten_embedded: bool,
    pub filter: Option<&'a FilterPredicate>,
}

/// State of one in-flight diff call, handed to custom comparators as the
/// recursion capability.
pub struct DiffContext<'a> {
    pub(crate) opts: DiffOptions<'a>,
    custom: &'a [Box<dyn CustomDiffer>],
    changes: &'a mut Vec<Change>,
    pub(crate) guard: &'a mut CycleGuard,
}

impl DiffContext<'_> {
    /// Full recursion for one node: absence/mismatch handling, custom
    /// comparators, then built-in dispatch.
    pub fn diff_values(
        &mut self,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()> {
        if let (Some(l), Some(r)) = (left, right) {
            if l.kind() != r.kind() {
                if self.opts.allow_type_mismatch {
                    self.push(
                        ChangeKind::Update,
                        path.to_vec(),
                        Some(l.clone()),
                        Some(r.clone()),
                        parent,
                    );
                    return Ok(());
                }
                return Err(DiffError::TypeMismatch);
            }
        }

        let custom = self.custom;
        for differ in custom {
            if differ.matches(left, right) {
                return differ.diff(self, path, left, right, parent);
            }
        }

        self.diff_builtin(path, left, right, parent)
    }

    /// Built-in kind dispatch: the continuation handed to custom
    /// comparators for descending without re-entering custom matching at
    /// the same node.
    pub fn diff_builtin(
        &mut self,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()> {
        let Some(probe) = left.or(right) else {
            return Ok(());
        };
        match probe.kind() {
            Kind::Bool | Kind::Int | Kind::Uint | Kind::Float | Kind::String => {
                self.diff_primitive(path, left, right, parent)
            }
            Kind::Time => self.diff_time(path, left, right, parent),
            Kind::Record => self.diff_record(path, left, right, parent),
            Kind::List => self.diff_sequence(path, left, right, parent),
            Kind::Map => self.diff_keyed(path, left, right, parent),
            Kind::Ref => self.diff_reference(path, left, right, parent),
            Kind::Slot => self.diff_slot(path, left, right, parent),
        }
    }

    /// Append a change. Available to custom comparators.
    pub fn add(
        &mut self,
        kind: ChangeKind,
        path: Vec<String>,
        from: Option<Value>,
        to: Option<Value>,
    ) {
        self.push(kind, path, from, to, None);
    }

    pub(crate) fn push(
        &mut self,
        kind: ChangeKind,
        path: Vec<String>,
        from: Option<Value>,
        to: Option<Value>,
        parent: Option<&Record>,
    ) {
        let parent = if self.opts.discard_parent {
            None
        } else {
            parent.map(|rec| Value::Record(rec.clone()))
        };
        self.changes.push(Change {
            kind,
            path,
            from,
            to,
            parent,
        });
    }

    pub(crate) fn mark(&self) -> usize {
        self.changes.len()
    }

    /// Relabel every change emitted since `start` to the given kind,
    /// moving values into the matching slot: creates keep only `to`,
    /// deletes take the itemized value as `from`.
    pub(crate) fn relabel_since(&mut self, start: usize, kind: ChangeKind) {
        for change in self.changes[start..].iter_mut() {
            change.kind = kind;
            match kind {
                ChangeKind::Create => change.from = None,
                ChangeKind::Delete => {
                    if change.to.is_some() {
                        change.from = change.to.take();
                    }
                    change.to = None;
                }
                ChangeKind::Update => {}
            }
        }
    }
}

pub(crate) fn child_path(path: &[String], segment: impl Into<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(path.len() + 1);
    out.extend_from_slice(path);
    out.push(segment.into());
    out
}
