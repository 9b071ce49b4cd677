//! Keyed-map comparison.

use indexmap::IndexMap;

use crate::error::{DiffError, Result};
use crate::value::{Record, Value};

use super::{ComparativeList, DiffContext};

impl DiffContext<'_> {
    /// Diff two keyed maps by reconciling on the maps' own keys: a value
    /// present only on one side is a create or delete, present on both
    /// recurses. An absent side is treated as the empty map.
    pub(crate) fn diff_keyed(
        &mut self,
        path: &[String],
        left: Option<&Value>,
        right: Option<&Value>,
        parent: Option<&Record>,
    ) -> Result<()> {
        let empty = IndexMap::new();
        let l = match left {
            Some(Value::Map(map)) => map,
            None => &empty,
            Some(_) => return Err(DiffError::TypeMismatch),
        };
        let r = match right {
            Some(Value::Map(map)) => map,
            None => &empty,
            Some(_) => return Err(DiffError::TypeMismatch),
        };

        let mut list = ComparativeList::new();
        for (key, value) in l {
            list.add_left(key.clone(), value);
        }
        for (key, value) in r {
            list.add_right(key.clone(), value);
        }
        self.reconcile(path, &list, parent)
    }
}
