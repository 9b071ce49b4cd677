//! Patch outcome records.

use std::ops::Deref;

use serde::{Serialize, Serializer};

use crate::error::PatchError;
use crate::value::Value;

/// Independent boolean outcome flags for one patch entry. Several may be
/// set together (a failed write on a bad target is both `failed` and
/// `invalid_target`). The last two are input flags carried from the field
/// metadata encountered while resolving the change's path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatchFlags {
    /// The mutation was performed.
    pub applied: bool,
    /// The write itself failed.
    pub failed: bool,
    /// A missing element or composite was allocated or appended.
    pub created: bool,
    /// The entry was skipped without mutating the target.
    pub ignored: bool,
    /// An element or field was removed or zeroed.
    pub deleted: bool,
    /// An existing value was overwritten.
    pub updated: bool,
    /// The change's path could not be resolved against the target.
    pub invalid_target: bool,
    /// Input flag: the resolved field permits allocation/append.
    pub allow_create: bool,
    /// Input flag: skip the change when the current value differs from
    /// the change's `from`.
    pub omit_unequal: bool,
}

/// The outcome of replaying one change onto the target.
#[derive(Debug, Clone, Serialize)]
pub struct PatchLogEntry {
    pub path: Vec<String>,
    pub from: Option<Value>,
    pub to: Option<Value>,
    pub flags: PatchFlags,
    /// The chained error recorded for this entry, if any. Present errors do
    /// not imply the entry failed outright: a successful fallback scan
    /// records its index retarget here as a warning.
    #[serde(serialize_with = "serialize_error_chain")]
    pub error: Option<PatchError>,
}

impl PatchLogEntry {
    /// True when an error (including warnings) was recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

fn serialize_error_chain<S>(error: &Option<PatchError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => {
            let mut parts = vec![err.to_string()];
            let mut cur = err.cause();
            while let Some(cause) = cur {
                parts.push(cause.to_string());
                cur = cause.cause();
            }
            serializer.serialize_some(&parts.join(": "))
        }
        None => serializer.serialize_none(),
    }
}

/// One outcome entry per input change, in changelog order. The patch engine
/// never aborts a run because one entry failed; callers inspect the log to
/// learn which entries succeeded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PatchLog {
    entries: Vec<PatchLogEntry>,
}

impl PatchLog {
    pub(crate) fn from_entries(entries: Vec<PatchLogEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatchLogEntry> {
        self.entries.iter()
    }

    /// Number of entries that recorded an error.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.has_error()).count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of entries whose mutation was performed.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.entries.iter().filter(|e| e.flags.applied).count()
    }
}

impl Deref for PatchLog {
    type Target = [PatchLogEntry];

    fn deref(&self) -> &[PatchLogEntry] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a PatchLog {
    type Item = &'a PatchLogEntry;
    type IntoIter = std::slice::Iter<'a, PatchLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(flags: PatchFlags, error: Option<PatchError>) -> PatchLogEntry {
        PatchLogEntry {
            path: vec!["x".into()],
            from: None,
            to: Some(Value::Int(1)),
            flags,
            error,
        }
    }

    #[test]
    fn test_error_accounting() {
        let log = PatchLog::from_entries(vec![
            entry(
                PatchFlags {
                    applied: true,
                    updated: true,
                    ..PatchFlags::default()
                },
                None,
            ),
            entry(
                PatchFlags {
                    ignored: true,
                    ..PatchFlags::default()
                },
                Some(PatchError::new("unable to find matching sequence entry")),
            ),
        ]);

        assert_eq!(log.len(), 2);
        assert_eq!(log.error_count(), 1);
        assert!(log.has_errors());
        assert_eq!(log.applied_count(), 1);
    }

    #[test]
    fn test_entry_serializes_error_chain() {
        let err = PatchError::new("could not locate patch target")
            .with_cause(PatchError::new("scanning for value index"));
        let encoded = serde_json::to_string(&entry(PatchFlags::default(), Some(err))).unwrap();
        assert!(encoded.contains("could not locate patch target: scanning for value index"));
    }
}
