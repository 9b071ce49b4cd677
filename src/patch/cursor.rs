//! Path resolution and per-change application against a live target.
//!
//! Each change is applied independently: a cursor walks the change's path
//! through the target value, carrying per-field patch options forward, and
//! the terminal operation executes with verify-then-fallback-scan
//! semantics. Every failure is recorded on the entry's flags and error
//! chain; nothing here panics or aborts the surrounding batch.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::change::{Change, ChangeKind};
use crate::error::PatchError;
use crate::value::{Kind, Value};

use super::log::{PatchFlags, PatchLogEntry};

#[derive(Clone, Copy, Default)]
pub(crate) struct PatchOptions {
    pub convert_compatible: bool,
}

#[derive(Default)]
struct EntryState {
    flags: PatchFlags,
    error: Option<PatchError>,
}

impl EntryState {
    /// Record an error, wrapping any previously recorded one as the cause
    /// so the chain preserves the root failure.
    fn record(&mut self, err: PatchError) {
        self.error = Some(match self.error.take() {
            Some(prev) => err.with_cause(prev),
            None => err,
        });
    }
}

/// Replay one change onto the target, producing its outcome entry.
pub(crate) fn apply_change(
    change: &Change,
    target: &mut Value,
    opts: &PatchOptions,
) -> PatchLogEntry {
    let mut st = EntryState::default();
    apply_at(target, &change.path, change, &mut st, opts);
    if st.error.is_some() {
        tracing::debug!(path = ?change.path, "patch entry recorded an error");
    }
    PatchLogEntry {
        path: change.path.clone(),
        from: change.from.clone(),
        to: change.to.clone(),
        flags: st.flags,
        error: st.error,
    }
}

fn apply_at(node: &mut Value, segs: &[String], change: &Change, st: &mut EntryState, opts: &PatchOptions) {
    if segs.is_empty() {
        apply_direct(node, change, st, opts);
        return;
    }
    if node.is_nil() {
        materialize_into(node, segs, change, st, opts);
        return;
    }
    match node {
        Value::Record(rec) => {
            let seg = &segs[0];
            match rec.field_mut(seg) {
                Some(field) if field.meta.skip || field.meta.immutable => {
                    st.flags.ignored = true;
                    st.record(PatchError::new(format!(
                        "field {seg} is immutable or excluded"
                    )));
                }
                Some(field) => {
                    st.flags.allow_create = field.meta.create;
                    st.flags.omit_unequal = field.meta.omit_unequal;
                    apply_at(&mut field.value, &segs[1..], change, st, opts);
                }
                None => {
                    st.flags.failed = true;
                    st.flags.invalid_target = true;
                    st.record(PatchError::new(format!(
                        "unable to access path value {seg}: target field is invalid"
                    )));
                }
            }
        }
        // A sequence consumes the next segment as its index; a map as its
        // key. Path walking stops there.
        Value::List(items) => apply_sequence(items, &segs[0], change, st, opts),
        Value::Map(map) => apply_map(map, &segs[0], change, st),
        Value::Ref(Some(cell)) => match cell.try_borrow_mut() {
            Ok(mut pointee) => apply_at(&mut *pointee, segs, change, st, opts),
            Err(_) => {
                st.flags.failed = true;
                st.flags.invalid_target = true;
                st.record(PatchError::new(
                    "cannot mutate target: reference is already borrowed",
                ));
            }
        },
        Value::Slot(Some(held)) => apply_at(&mut **held, segs, change, st, opts),
        // Nil wrappers were handled above.
        Value::Ref(None) | Value::Slot(None) => {}
        other => {
            st.flags.failed = true;
            st.flags.invalid_target = true;
            st.record(PatchError::new(format!(
                "cannot resolve path segment {} in {}",
                segs[0],
                other.kind()
            )));
        }
    }
}

/// Allocate a zeroed composite behind a nil reference or slot from the
/// change's captured parent, then continue the walk into it. Requires the
/// allow-create option; without it the entry is ignored with the
/// nil-collection error.
fn materialize_into(
    node: &mut Value,
    segs: &[String],
    change: &Change,
    st: &mut EntryState,
    opts: &PatchOptions,
) {
    if !st.flags.allow_create {
        st.flags.ignored = true;
        st.record(PatchError::new("nil reference without create permission"));
        return;
    }
    let Some(parent) = change.parent() else {
        st.flags.ignored = true;
        st.record(PatchError::new(
            "nil reference and no captured parent to allocate from",
        ));
        return;
    };
    let zero = parent.zero_like();
    match node {
        Value::Ref(inner) => *inner = Some(Rc::new(RefCell::new(zero))),
        Value::Slot(inner) => *inner = Some(Box::new(zero)),
        _ => return,
    }
    st.flags.created = true;
    tracing::debug!(path = ?change.path, "materialized composite behind nil reference");
    apply_at(node, segs, change, st, opts);
}

/// Terminal operation on the location the cursor resolved to.
fn apply_direct(node: &mut Value, change: &Change, st: &mut EntryState, opts: &PatchOptions) {
    match change.kind {
        ChangeKind::Delete => {
            *node = node.zero_like();
            st.flags.deleted = true;
            st.flags.applied = true;
        }
        ChangeKind::Create | ChangeKind::Update => {
            if st.flags.omit_unequal && !current_matches(Some(&*node), change.from.as_ref()) {
                st.flags.ignored = true;
                st.record(PatchError::new("target change doesn't match original"));
                return;
            }
            write_value(node, change.to.as_ref(), st, opts);
        }
    }
}

fn current_matches(current: Option<&Value>, from: Option<&Value>) -> bool {
    match (current, from) {
        (Some(cur), Some(from)) => cur == from,
        (None, None) => true,
        _ => false,
    }
}

/// Overwrite `node` with the change's new value. A missing new value zeroes
/// the location (an update against nil). Kind-mismatched writes fail the
/// entry unless the target is a nullable wrapper (which absorbs the value)
/// or representation conversion is enabled and applies.
fn write_value(node: &mut Value, to: Option<&Value>, st: &mut EntryState, opts: &PatchOptions) {
    let Some(to) = to else {
        *node = node.zero_like();
        st.flags.updated = true;
        st.flags.applied = true;
        return;
    };
    if node.kind() == to.kind() {
        *node = to.clone();
        st.flags.updated = true;
        st.flags.applied = true;
        return;
    }
    match node {
        Value::Slot(held) => {
            *held = Some(Box::new(to.clone()));
            st.flags.updated = true;
            st.flags.applied = true;
            return;
        }
        Value::Ref(inner) => {
            *inner = Some(Rc::new(RefCell::new(to.clone())));
            st.flags.updated = true;
            st.flags.applied = true;
            return;
        }
        _ => {}
    }
    if opts.convert_compatible {
        if let Some(converted) = convert_compatible(to, node.kind()) {
            *node = converted;
            st.flags.updated = true;
            st.flags.applied = true;
            return;
        }
    }
    st.flags.failed = true;
    st.flags.invalid_target = true;
    st.record(PatchError::new(format!(
        "cannot set {} value into {} target",
        to.kind(),
        node.kind()
    )));
}

/// Conversions between compatible underlying representations, applied only
/// when the differ opted in.
fn convert_compatible(value: &Value, want: Kind) -> Option<Value> {
    match (value, want) {
        (Value::Int(i), Kind::Uint) => u64::try_from(*i).ok().map(Value::Uint),
        (Value::Uint(u), Kind::Int) => i64::try_from(*u).ok().map(Value::Int),
        (Value::Int(i), Kind::Float) => Some(Value::Float(*i as f64)),
        (Value::Uint(u), Kind::Float) => Some(Value::Float(*u as f64)),
        (Value::String(s), Kind::Time) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| Value::Time(t.with_timezone(&Utc))),
        _ => None,
    }
}

fn apply_sequence(
    items: &mut Vec<Value>,
    seg: &str,
    change: &Change,
    st: &mut EntryState,
    opts: &PatchOptions,
) {
    let index = seg.parse::<usize>().ok();
    match change.kind {
        ChangeKind::Delete => match locate(items, index, change.from.as_ref(), st) {
            Some(i) => {
                // Swap removal: overwrite with the last element, then
                // shrink. Remaining-element order changes.
                items.swap_remove(i);
                st.flags.deleted = true;
                st.flags.applied = true;
            }
            None => {
                st.flags.ignored = true;
                st.record(not_found(seg, index));
            }
        },
        ChangeKind::Create | ChangeKind::Update => {
            match locate(items, index, change.from.as_ref(), st) {
                Some(i) => write_value(&mut items[i], change.to.as_ref(), st, opts),
                None if st.flags.allow_create && change.kind == ChangeKind::Create => {
                    match change.to.as_ref() {
                        Some(to) => {
                            items.push(to.clone());
                            st.flags.created = true;
                            st.flags.applied = true;
                        }
                        None => {
                            st.flags.ignored = true;
                            st.record(PatchError::new("change has no value to append"));
                        }
                    }
                }
                None => {
                    st.flags.ignored = true;
                    st.record(not_found(seg, index));
                }
            }
        }
    }
}

fn not_found(seg: &str, index: Option<usize>) -> PatchError {
    let err = PatchError::new("unable to find matching sequence entry");
    if index.is_none() {
        return err.with_cause(PatchError::new(format!("invalid index in path: {seg}")));
    }
    err
}

/// Verify the element at the recorded index still equals the change's
/// `from`; if not, fall back to a linear scan for an equal element
/// elsewhere and retarget the index. When a recorded numeric index missed,
/// the retarget is recorded on the entry as a warning; identity-keyed
/// segments scan silently, since no index was recorded for them.
/// Omit-if-unequal suppresses the scan.
fn locate(
    items: &[Value],
    index: Option<usize>,
    from: Option<&Value>,
    st: &mut EntryState,
) -> Option<usize> {
    if let (Some(i), Some(expected)) = (index, from) {
        if items.get(i) == Some(expected) {
            return Some(i);
        }
    }
    if st.flags.omit_unequal {
        return None;
    }
    let expected = from?;
    if let Some(i) = items.iter().position(|v| v == expected) {
        if index.is_some() {
            st.record(
                PatchError::new(format!("value changed index to {i}"))
                    .with_cause(PatchError::new("scanning for value index")),
            );
        }
        tracing::debug!(index = i, "sequence element located by fallback scan");
        return Some(i);
    }
    None
}

fn apply_map(map: &mut IndexMap<String, Value>, key: &str, change: &Change, st: &mut EntryState) {
    if st.flags.omit_unequal && !current_matches(map.get(key), change.from.as_ref()) {
        st.flags.ignored = true;
        st.record(PatchError::new("target change doesn't match original"));
        return;
    }
    match change.kind {
        ChangeKind::Delete => {
            map.shift_remove(key);
            st.flags.deleted = true;
            st.flags.applied = true;
        }
        ChangeKind::Create | ChangeKind::Update => match change.to.as_ref() {
            Some(to) => {
                let existed = map.contains_key(key);
                map.insert(key.to_owned(), to.clone());
                if existed {
                    st.flags.updated = true;
                } else {
                    st.flags.created = true;
                }
                st.flags.applied = true;
            }
            None => {
                st.flags.ignored = true;
                st.record(PatchError::new("change has no value to apply"));
            }
        },
    }
}
