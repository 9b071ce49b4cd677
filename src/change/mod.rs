//! The change model shared between the diff and patch engines.
//!
//! A [`Change`] is one atomic mutation; a [`Changelog`] is an ordered list
//! of them, replayed in the same order at patch time. Changes serialize as
//! `{"type", "path", "from", "to"}`, the crate's only wire format.

use std::fmt;
use std::ops::{Deref, DerefMut};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The kind of an atomic change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        })
    }
}

/// One atomic mutation: a path of segment identifiers (field names,
/// sequence indexes rendered as strings, or reconciled identity keys), the
/// prior and new values, and (not serialized) the enclosing composite
/// captured at diff time so patch-time allocation of new composites has
/// enough context to build a full replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub path: Vec<String>,
    pub from: Option<Value>,
    pub to: Option<Value>,
    #[serde(skip)]
    pub(crate) parent: Option<Value>,
}

impl Change {
    /// A change with no captured parent.
    pub fn new(
        kind: ChangeKind,
        path: Vec<String>,
        from: Option<Value>,
        to: Option<Value>,
    ) -> Self {
        Self {
            kind,
            path,
            from,
            to,
            parent: None,
        }
    }

    /// The enclosing composite captured at diff time, if retained.
    #[must_use]
    pub fn parent(&self) -> Option<&Value> {
        self.parent.as_ref()
    }
}

/// An ordered list of changes. Insertion order is meaningful and preserved;
/// there is no deduplication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Changelog {
    changes: Vec<Change>,
}

impl Changelog {
    pub(crate) fn from_vec(changes: Vec<Change>) -> Self {
        Self { changes }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// Keep only changes whose path matches the pattern, returning a fresh
    /// changelog. Pattern segments are unanchored regular expressions
    /// (invalid patterns fall back to literal comparison), matched
    /// positionally from the start of each change's path; a pattern longer
    /// than a path never matches it.
    #[must_use]
    pub fn filter(&self, pattern: &[&str]) -> Changelog {
        let matchers = compile(pattern);
        Changelog::from_vec(
            self.changes
                .iter()
                .filter(|c| path_match(pattern, &matchers, &c.path))
                .cloned()
                .collect(),
        )
    }

    /// The complement of [`filter`](Changelog::filter): drop matching
    /// changes, keeping the rest.
    #[must_use]
    pub fn filter_out(&self, pattern: &[&str]) -> Changelog {
        let matchers = compile(pattern);
        Changelog::from_vec(
            self.changes
                .iter()
                .filter(|c| !path_match(pattern, &matchers, &c.path))
                .cloned()
                .collect(),
        )
    }
}

fn compile(pattern: &[&str]) -> Vec<Option<Regex>> {
    pattern.iter().map(|p| Regex::new(p).ok()).collect()
}

fn path_match(pattern: &[&str], matchers: &[Option<Regex>], path: &[String]) -> bool {
    if pattern.len() > path.len() {
        return false;
    }
    pattern
        .iter()
        .zip(matchers)
        .zip(path)
        .all(|((raw, re), seg)| match re {
            Some(re) => re.is_match(seg),
            None => *raw == seg.as_str(),
        })
}

impl Deref for Changelog {
    type Target = [Change];

    fn deref(&self) -> &[Change] {
        &self.changes
    }
}

impl DerefMut for Changelog {
    fn deref_mut(&mut self) -> &mut [Change] {
        &mut self.changes
    }
}

impl From<Vec<Change>> for Changelog {
    fn from(changes: Vec<Change>) -> Self {
        Self { changes }
    }
}

impl FromIterator<Change> for Changelog {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Changelog {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

impl<'a> IntoIterator for &'a Changelog {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Changelog {
        Changelog::from(vec![
            Change::new(
                ChangeKind::Update,
                vec!["name".into()],
                Some(Value::from("a")),
                Some(Value::from("b")),
            ),
            Change::new(
                ChangeKind::Create,
                vec!["tags".into(), "popularity".into()],
                None,
                Some(Value::from("high")),
            ),
            Change::new(
                ChangeKind::Delete,
                vec!["items".into(), "2".into()],
                Some(Value::Int(3)),
                None,
            ),
        ])
    }

    #[test]
    fn test_filter_literal_prefix() {
        let cl = sample();
        let tags = cl.filter(&["tags"]);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].path, vec!["tags", "popularity"]);
    }

    #[test]
    fn test_filter_regex_segment() {
        let cl = sample();
        let hits = cl.filter(&["tags|items", r"\d+"]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, vec!["items", "2"]);
    }

    #[test]
    fn test_filter_out_complements_filter() {
        let cl = sample();
        let out = cl.filter_out(&["tags"]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.path[0] != "tags"));
        // The source changelog is untouched.
        assert_eq!(cl.len(), 3);
    }

    #[test]
    fn test_pattern_longer_than_path_never_matches() {
        let cl = sample();
        assert!(cl.filter(&["name", "deeper", "still"]).is_empty());
    }

    #[test]
    fn test_wire_shape_round_trip() {
        let cl = sample();
        let encoded = serde_json::to_string(&cl).unwrap();
        assert!(encoded.contains(r#""type":"update""#));
        assert!(encoded.contains(r#""from":null"#));

        let decoded: Changelog = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.len(), cl.len());
        for (d, c) in decoded.iter().zip(cl.iter()) {
            assert_eq!(d.kind, c.kind);
            assert_eq!(d.path, c.path, "path ordering survives the round trip");
        }
    }
}
