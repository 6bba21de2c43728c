//! # Record tree
//!
//! ```text
//! Record ─┬─ projectName: Scalar
//!         ├─ changeOrdersPrevious: Object ─┬─ additions: Scalar
//!         │                                └─ deductions: Scalar
//!         └─ items: List ─┬─ Row #1 { qty, rate, amount }
//!                         └─ Row #2 { qty, rate, amount }
//! ```
//!
//! Every row carries a [`RowId`] that is unique within its list and never
//! derived from the row's position.

use crate::error::{PathError, PathResult};
use crate::path::{FieldPath, FieldPattern, Segment};
use crate::value::Scalar;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node of the record tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Object(BTreeMap<String, Node>),
    List(Vec<Row>),
}

impl Node {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Row]> {
        match self {
            Node::List(rows) => Some(rows),
            _ => None,
        }
    }
}

impl From<Scalar> for Node {
    fn from(s: Scalar) -> Self {
        Node::Scalar(s)
    }
}

/// Element of a list field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct Row {
    pub id: RowId,
    pub fields: BTreeMap<String, Node>,
}

impl Row {
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_fields(id: RowId, fields: BTreeMap<String, Node>) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.fields.get(name).and_then(Node::as_scalar)
    }
}

/// Next id for a list: one past the largest id in use.
///
/// Ids are unique among the current rows; the id of a removed last row
/// may be handed out again. When the largest id is `u64::MAX` the
/// smallest unused id is taken instead.
pub fn next_row_id(rows: &[Row]) -> RowId {
    let Some(max) = rows.iter().map(|r| r.id.0).max() else {
        return RowId(1);
    };
    match max.checked_add(1) {
        Some(next) => RowId(next),
        None => {
            let used: BTreeSet<u64> = rows.iter().map(|r| r.id.0).collect();
            (1..).map(RowId).find(|id| !used.contains(&id.0)).unwrap_or(RowId(1))
        }
    }
}

/// What a scalar write changed
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// Where the value landed, with every row addressed by id
    pub path: FieldPath,
    /// Value that was replaced, `None` if the field did not exist
    pub previous: Option<Scalar>,
    /// Outermost node the write had to create (object, list or row), if any
    pub created: Option<FieldPath>,
}

/// In-memory form document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub struct Record {
    pub(crate) fields: BTreeMap<String, Node>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: BTreeMap<String, Node>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &BTreeMap<String, Node> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Node at `path`, if present
    pub fn get(&self, path: &FieldPath) -> Option<&Node> {
        let segments = path.segments();
        let mut fields = &self.fields;
        let mut i = 0;
        loop {
            let node = fields.get(segments.get(i)?.as_key()?)?;
            match (node, segments.get(i + 1)) {
                (_, None) => return Some(node),
                (Node::Object(inner), Some(Segment::Key(_))) => {
                    fields = inner;
                    i += 1;
                }
                (Node::List(rows), Some(Segment::Index(index))) => {
                    fields = &rows.get(*index)?.fields;
                    i += 2;
                }
                (Node::List(rows), Some(Segment::Row(id))) => {
                    fields = &rows.iter().find(|r| r.id == *id)?.fields;
                    i += 2;
                }
                _ => return None,
            }
        }
    }

    pub fn scalar(&self, path: &FieldPath) -> Option<&Scalar> {
        self.get(path).and_then(Node::as_scalar)
    }

    /// Rows of the list at `path`, if it is a list
    pub fn list(&self, path: &FieldPath) -> Option<&[Row]> {
        self.get(path).and_then(Node::as_list)
    }

    /// Row by id within the list at `path`
    pub fn row(&self, list: &FieldPath, id: RowId) -> Option<&Row> {
        self.list(list)?.iter().find(|r| r.id == id)
    }

    /// Rewrite positional row segments as row ids.
    ///
    /// Every row the path walks through must exist.
    pub fn canonicalize(&self, path: &FieldPath) -> PathResult<FieldPath> {
        if path.is_canonical() {
            return Ok(path.clone());
        }
        let source = path.to_string();
        let mut segments = Vec::with_capacity(path.len());
        let mut fields = Some(&self.fields);
        let mut rows: Option<&[Row]> = None;
        for (i, segment) in path.segments().iter().enumerate() {
            let at = || FieldPath::from_segments(path.segments()[..i].to_vec()).to_string();
            match segment {
                Segment::Key(name) => {
                    let node = fields.and_then(|f| f.get(name));
                    fields = None;
                    rows = None;
                    match node {
                        Some(Node::Object(inner)) => fields = Some(inner),
                        Some(Node::List(list)) => rows = Some(list),
                        _ => {}
                    }
                    segments.push(segment.clone());
                }
                Segment::Index(index) => {
                    let list = rows.ok_or_else(|| PathError::NotAList {
                        path: source.clone(),
                        at: at(),
                    })?;
                    let row = list.get(*index).ok_or(PathError::IndexOutOfRange {
                        path: source.clone(),
                        index: *index,
                        len: list.len(),
                    })?;
                    fields = Some(&row.fields);
                    rows = None;
                    segments.push(Segment::Row(row.id));
                }
                Segment::Row(id) => {
                    let list = rows.ok_or_else(|| PathError::NotAList {
                        path: source.clone(),
                        at: at(),
                    })?;
                    let row = list.iter().find(|r| r.id == *id).ok_or(PathError::RowNotFound {
                        path: source.clone(),
                        id: id.0,
                    })?;
                    fields = Some(&row.fields);
                    rows = None;
                    segments.push(segment.clone());
                }
                Segment::Any => {
                    return Err(PathError::WildcardNotAllowed { path: source });
                }
            }
        }
        Ok(FieldPath::from_segments(segments))
    }

    /// Write a scalar, creating intermediate objects, lists and rows.
    ///
    /// A positional index equal to the list length appends a fresh row.
    pub fn set(&mut self, path: &FieldPath, value: Scalar) -> PathResult<WriteOutcome> {
        let source = path.to_string();
        let mut writer = Writer {
            source: &source,
            resolved: Vec::with_capacity(path.len()),
            created: None,
        };
        let previous = match writer.write_in_object(&mut self.fields, path.segments(), value) {
            Ok(previous) => previous,
            Err(err) => {
                if let Some(created) = writer.created {
                    self.discard(&created);
                }
                return Err(err);
            }
        };
        Ok(WriteOutcome {
            path: FieldPath::from_segments(writer.resolved),
            previous,
            created: writer.created,
        })
    }

    // Undo the containers a failed write left behind
    fn discard(&mut self, created: &FieldPath) {
        match (created.last(), created.parent()) {
            (Some(Segment::Row(id)), Some(list)) => {
                if let Ok(rows) = self.list_mut(&list) {
                    rows.retain(|r| r.id != *id);
                }
            }
            _ => {
                let _ = self.remove(created);
            }
        }
    }

    /// Remove the node at `path` (which must end in a field name).
    ///
    /// Returns the removed node; absent paths are a no-op.
    pub fn remove(&mut self, path: &FieldPath) -> PathResult<Option<Node>> {
        let Some(Segment::Key(name)) = path.last() else {
            return Err(PathError::NotAScalar {
                path: path.to_string(),
            });
        };
        let fields = match path.parent() {
            None => Some(&mut self.fields),
            Some(parent) => self.fields_mut(&parent)?,
        };
        Ok(fields.and_then(|f| f.remove(name)))
    }

    /// Put a whole node at `path` (which must end in a field name),
    /// creating missing objects above it. Returns the node it replaced.
    pub fn insert_node(&mut self, path: &FieldPath, node: Node) -> PathResult<Option<Node>> {
        let Some(Segment::Key(name)) = path.last() else {
            return Err(PathError::NotAScalar {
                path: path.to_string(),
            });
        };
        let parent = path.parent();
        let in_row = matches!(
            parent.as_ref().and_then(FieldPath::last),
            Some(Segment::Index(_) | Segment::Row(_))
        );
        if in_row && name == "id" {
            return Err(PathError::ReservedField {
                path: path.to_string(),
            });
        }
        let fields = match parent {
            None => &mut self.fields,
            Some(parent) => self.fields_mut_or_create(&parent)?,
        };
        Ok(fields.insert(name.clone(), node))
    }

    /// Mutable rows of the list at `path`, creating the list (and any
    /// missing objects above it) when absent.
    pub fn list_mut(&mut self, path: &FieldPath) -> PathResult<&mut Vec<Row>> {
        let source = path.to_string();
        let Some(Segment::Key(name)) = path.last() else {
            return Err(PathError::NotAList {
                path: source.clone(),
                at: source,
            });
        };
        let fields = match path.parent() {
            None => &mut self.fields,
            Some(parent) => self.fields_mut_or_create(&parent)?,
        };
        let node = fields
            .entry(name.clone())
            .or_insert_with(|| Node::List(Vec::new()));
        match node {
            Node::List(rows) => Ok(rows),
            _ => Err(PathError::NotAList {
                path: source.clone(),
                at: source,
            }),
        }
    }

    /// Fields of the object or row at `path`; `None` when it does not exist
    fn fields_mut(&mut self, path: &FieldPath) -> PathResult<Option<&mut BTreeMap<String, Node>>> {
        let source = path.to_string();
        let mut fields = &mut self.fields;
        let segments = path.segments();
        let mut i = 0;
        while i < segments.len() {
            let Segment::Key(name) = &segments[i] else {
                return Err(PathError::NotAnObject {
                    path: source.clone(),
                    at: FieldPath::from_segments(segments[..i].to_vec()).to_string(),
                });
            };
            let Some(node) = fields.get_mut(name) else {
                return Ok(None);
            };
            fields = match node {
                Node::Object(inner) => {
                    i += 1;
                    inner
                }
                Node::List(rows) => {
                    let Some(row_segment) = segments.get(i + 1) else {
                        return Err(PathError::NotAnObject {
                            path: source.clone(),
                            at: FieldPath::from_segments(segments[..=i].to_vec()).to_string(),
                        });
                    };
                    let row = match row_segment {
                        Segment::Index(index) => rows.get_mut(*index),
                        Segment::Row(id) => rows.iter_mut().find(|r| r.id == *id),
                        _ => {
                            return Err(PathError::NotAnObject {
                                path: source.clone(),
                                at: FieldPath::from_segments(segments[..=i].to_vec()).to_string(),
                            })
                        }
                    };
                    let Some(row) = row else {
                        return Ok(None);
                    };
                    i += 2;
                    &mut row.fields
                }
                Node::Scalar(_) => {
                    return Err(PathError::NotAnObject {
                        path: source.clone(),
                        at: FieldPath::from_segments(segments[..=i].to_vec()).to_string(),
                    })
                }
            };
        }
        Ok(Some(fields))
    }

    fn fields_mut_or_create(&mut self, path: &FieldPath) -> PathResult<&mut BTreeMap<String, Node>> {
        let source = path.to_string();
        let mut writer = Writer {
            source: &source,
            resolved: Vec::new(),
            created: None,
        };
        writer.object_in(&mut self.fields, path.segments())
    }

    /// Every instance of `pattern` reachable in the record, with its value.
    ///
    /// Wildcards expand over existing rows. A missing field yields `None`
    /// when nothing below it needs expanding, so a fully bound pattern
    /// always produces exactly one entry.
    pub fn expand(&self, pattern: &FieldPattern) -> Vec<(FieldPath, Option<&Scalar>)> {
        let mut out = Vec::new();
        expand_in_object(&self.fields, pattern.segments(), Vec::new(), &mut out);
        out
    }

    /// Drop top-level fields holding `null`, which a merge-put deletes
    pub fn drop_null_fields(&mut self) {
        self.fields.retain(|_, node| !matches!(node, Node::Scalar(Scalar::Null)));
    }

    /// Top-level keys whose value differs from `baseline`
    pub fn changed_keys<'a>(&'a self, baseline: &'a Record) -> Vec<&'a str> {
        let mut keys: Vec<&str> = self
            .fields
            .iter()
            .filter(|(key, node)| baseline.fields.get(*key) != Some(*node))
            .map(|(key, _)| key.as_str())
            .collect();
        keys.extend(
            baseline
                .fields
                .keys()
                .filter(|key| !self.fields.contains_key(*key))
                .map(String::as_str),
        );
        keys.sort_unstable();
        keys
    }
}

fn expand_in_object<'r>(
    fields: &'r BTreeMap<String, Node>,
    segments: &[Segment],
    mut prefix: Vec<Segment>,
    out: &mut Vec<(FieldPath, Option<&'r Scalar>)>,
) {
    let Some((Segment::Key(name), rest)) = segments.split_first() else {
        return;
    };
    prefix.push(Segment::Key(name.clone()));
    match fields.get(name) {
        None => {
            if !rest.contains(&Segment::Any) {
                let mut path = prefix;
                path.extend(rest.iter().cloned());
                out.push((FieldPath::from_segments(path), None));
            }
        }
        Some(node) => match rest.split_first() {
            None => out.push((FieldPath::from_segments(prefix), node.as_scalar())),
            Some((next, tail)) => match (node, next) {
                (Node::Object(inner), Segment::Key(_)) => {
                    expand_in_object(inner, rest, prefix, out);
                }
                (Node::List(rows), Segment::Any) => {
                    for row in rows {
                        let mut row_prefix = prefix.clone();
                        row_prefix.push(Segment::Row(row.id));
                        expand_in_object(&row.fields, tail, row_prefix, out);
                    }
                }
                (Node::List(rows), Segment::Row(id)) => {
                    if let Some(row) = rows.iter().find(|r| r.id == *id) {
                        let mut row_prefix = prefix;
                        row_prefix.push(Segment::Row(row.id));
                        expand_in_object(&row.fields, tail, row_prefix, out);
                    }
                }
                _ => {}
            },
        },
    }
}

struct Writer<'a> {
    source: &'a str,
    resolved: Vec<Segment>,
    created: Option<FieldPath>,
}

impl Writer<'_> {
    fn at(&self) -> String {
        FieldPath::from_segments(self.resolved.clone()).to_string()
    }

    fn mark_created(&mut self) {
        if self.created.is_none() {
            self.created = Some(FieldPath::from_segments(self.resolved.clone()));
        }
    }

    fn not_an_object(&self) -> PathError {
        PathError::NotAnObject {
            path: self.source.to_string(),
            at: self.at(),
        }
    }

    fn not_a_list(&self) -> PathError {
        PathError::NotAList {
            path: self.source.to_string(),
            at: self.at(),
        }
    }

    fn write_in_object(
        &mut self,
        fields: &mut BTreeMap<String, Node>,
        segments: &[Segment],
        value: Scalar,
    ) -> PathResult<Option<Scalar>> {
        let Some((Segment::Key(name), rest)) = segments.split_first() else {
            return Err(self.not_an_object());
        };
        self.resolved.push(Segment::Key(name.clone()));

        let Some((next, _)) = rest.split_first() else {
            return match fields.get_mut(name) {
                Some(Node::Scalar(existing)) => Ok(Some(std::mem::replace(existing, value))),
                Some(_) => Err(PathError::NotAScalar {
                    path: self.source.to_string(),
                }),
                None => {
                    fields.insert(name.clone(), Node::Scalar(value));
                    Ok(None)
                }
            };
        };

        if !fields.contains_key(name) {
            self.mark_created();
            let container = match next {
                Segment::Key(_) => Node::Object(BTreeMap::new()),
                _ => Node::List(Vec::new()),
            };
            fields.insert(name.clone(), container);
        }

        match (fields.get_mut(name), next) {
            (Some(Node::Object(inner)), Segment::Key(_)) => self.write_in_object(inner, rest, value),
            (Some(Node::List(rows)), Segment::Index(_) | Segment::Row(_)) => {
                self.write_in_list(rows, rest, value)
            }
            (_, Segment::Key(_)) => Err(self.not_an_object()),
            _ => Err(self.not_a_list()),
        }
    }

    fn write_in_list(
        &mut self,
        rows: &mut Vec<Row>,
        segments: &[Segment],
        value: Scalar,
    ) -> PathResult<Option<Scalar>> {
        let rest = segments.get(1..).unwrap_or_default();
        match rest.first() {
            None => {
                return Err(PathError::NotAScalar {
                    path: self.source.to_string(),
                })
            }
            Some(Segment::Key(name)) if name == "id" => {
                return Err(PathError::ReservedField {
                    path: self.source.to_string(),
                })
            }
            Some(_) => {}
        }
        let row = self.row_in(rows, segments)?;
        self.write_in_object(&mut row.fields, rest, value)
    }

    fn row_in<'r>(&mut self, rows: &'r mut Vec<Row>, segments: &[Segment]) -> PathResult<&'r mut Row> {
        let position = match segments.first() {
            Some(Segment::Index(index)) if *index < rows.len() => *index,
            Some(Segment::Index(index)) if *index == rows.len() => {
                let id = next_row_id(rows);
                rows.push(Row::new(id));
                self.resolved.push(Segment::Row(id));
                self.mark_created();
                self.resolved.pop();
                *index
            }
            Some(Segment::Index(index)) => {
                return Err(PathError::IndexOutOfRange {
                    path: self.source.to_string(),
                    index: *index,
                    len: rows.len(),
                })
            }
            Some(Segment::Row(id)) => {
                rows.iter()
                    .position(|r| r.id == *id)
                    .ok_or(PathError::RowNotFound {
                        path: self.source.to_string(),
                        id: id.0,
                    })?
            }
            _ => return Err(self.not_a_list()),
        };
        let row = &mut rows[position];
        self.resolved.push(Segment::Row(row.id));
        Ok(row)
    }

    fn object_in<'r>(
        &mut self,
        fields: &'r mut BTreeMap<String, Node>,
        segments: &[Segment],
    ) -> PathResult<&'r mut BTreeMap<String, Node>> {
        let Some((Segment::Key(name), rest)) = segments.split_first() else {
            return Ok(fields);
        };
        self.resolved.push(Segment::Key(name.clone()));
        let node = fields.entry(name.clone()).or_insert_with(|| match rest.first() {
            Some(Segment::Index(_) | Segment::Row(_)) => Node::List(Vec::new()),
            _ => Node::Object(BTreeMap::new()),
        });
        match node {
            Node::Object(inner) => self.object_in(inner, rest),
            Node::List(rows) if !rest.is_empty() => {
                let row = self.row_in(rows, rest)?;
                self.object_in(&mut row.fields, &rest[1..])
            }
            _ => Err(PathError::NotAnObject {
                path: self.source.to_string(),
                at: FieldPath::from_segments(self.resolved.clone()).to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut record = Record::new();
        let outcome = record
            .set(&path("changeOrdersPrevious.additions"), Scalar::text("1200"))
            .unwrap();
        assert_eq!(outcome.previous, None);
        assert_eq!(outcome.created, Some(path("changeOrdersPrevious")));
        assert_eq!(
            record.scalar(&path("changeOrdersPrevious.additions")),
            Some(&Scalar::text("1200"))
        );
    }

    #[test]
    fn test_set_appends_row_at_list_length() {
        let mut record = Record::new();
        let outcome = record.set(&path("items.0.qty"), Scalar::text("3")).unwrap();
        assert_eq!(outcome.path, path("items[#1].qty"));
        assert_eq!(outcome.created, Some(path("items")));

        let outcome = record.set(&path("items.1.qty"), Scalar::text("4")).unwrap();
        assert_eq!(outcome.path, path("items[#2].qty"));
        assert_eq!(outcome.created, Some(path("items[#2]")));

        let err = record.set(&path("items.5.qty"), Scalar::text("4")).unwrap_err();
        assert!(matches!(err, PathError::IndexOutOfRange { index: 5, len: 2, .. }));
    }

    #[test]
    fn test_set_replaces_and_reports_previous() {
        let mut record = Record::new();
        record.set(&path("title"), Scalar::text("A")).unwrap();
        let outcome = record.set(&path("title"), Scalar::text("B")).unwrap();
        assert_eq!(outcome.previous, Some(Scalar::text("A")));
        assert_eq!(outcome.created, None);
    }

    #[test]
    fn test_set_rejects_type_conflicts() {
        let mut record = Record::new();
        record.set(&path("title"), Scalar::text("A")).unwrap();
        assert!(matches!(
            record.set(&path("title.sub"), Scalar::Null),
            Err(PathError::NotAnObject { .. })
        ));
        record.set(&path("items.0.qty"), Scalar::text("1")).unwrap();
        assert!(matches!(
            record.set(&path("items"), Scalar::Null),
            Err(PathError::NotAScalar { .. })
        ));
        assert!(matches!(
            record.set(&path("items.0.id"), Scalar::Number(9.0)),
            Err(PathError::ReservedField { .. })
        ));
    }

    #[test]
    fn test_get_walks_rows() {
        let mut record = Record::new();
        record.set(&path("items.0.qty"), Scalar::text("1")).unwrap();
        record.set(&path("items.1.qty"), Scalar::text("2")).unwrap();
        assert_eq!(record.scalar(&path("items.1.qty")), Some(&Scalar::text("2")));
        assert_eq!(record.scalar(&path("items[#1].qty")), Some(&Scalar::text("1")));
        assert_eq!(record.scalar(&path("items.2.qty")), None);
        assert_eq!(record.list(&path("items")).map(|r| r.len()), Some(2));
    }

    #[test]
    fn test_canonicalize() {
        let mut record = Record::new();
        record.set(&path("items.0.qty"), Scalar::text("1")).unwrap();
        record.set(&path("items.1.qty"), Scalar::text("2")).unwrap();
        assert_eq!(
            record.canonicalize(&path("items.1.qty")).unwrap(),
            path("items[#2].qty")
        );
        assert!(record.canonicalize(&path("items.7.qty")).is_err());
    }

    #[test]
    fn test_remove_nested_field() {
        let mut record = Record::new();
        record.set(&path("items.0.qty"), Scalar::text("1")).unwrap();
        let removed = record.remove(&path("items[#1].qty")).unwrap();
        assert_eq!(removed, Some(Node::Scalar(Scalar::text("1"))));
        assert_eq!(record.remove(&path("items[#1].qty")).unwrap(), None);
        assert_eq!(record.remove(&path("missing.field")).unwrap(), None);
    }

    #[test]
    fn test_expand_pattern() {
        let mut record = Record::new();
        record.set(&path("items.0.qty"), Scalar::text("1")).unwrap();
        record.set(&path("items.1.rate"), Scalar::text("2")).unwrap();

        let qty = record.expand(&FieldPattern::parse("items.*.qty").unwrap());
        assert_eq!(qty.len(), 2);
        assert_eq!(qty[0], (path("items[#1].qty"), Some(&Scalar::text("1"))));
        assert_eq!(qty[1], (path("items[#2].qty"), None));

        let absent = record.expand(&FieldPattern::parse("totals.sum").unwrap());
        assert_eq!(absent, vec![(path("totals.sum"), None)]);
        assert!(record
            .expand(&FieldPattern::parse("phases.*.start").unwrap())
            .is_empty());
    }

    #[test]
    fn test_next_row_id_reuses_only_free_ids() {
        assert_eq!(next_row_id(&[]), RowId(1));
        let rows = vec![Row::new(RowId(1)), Row::new(RowId(2))];
        assert_eq!(next_row_id(&rows), RowId(3));
        // Removing the last row frees its id
        assert_eq!(next_row_id(&rows[..1]), RowId(2));
    }

    #[test]
    fn test_next_row_id_at_max_takes_smallest_free() {
        let rows = vec![Row::new(RowId(u64::MAX))];
        assert_eq!(next_row_id(&rows), RowId(1));
        let rows = vec![Row::new(RowId(1)), Row::new(RowId(2)), Row::new(RowId(u64::MAX))];
        assert_eq!(next_row_id(&rows), RowId(3));
    }

    #[test]
    fn test_drop_null_fields_is_top_level_only() {
        let mut record = Record::try_from(serde_json::json!({
            "notes": null,
            "owner": { "phone": null },
            "title": "A"
        }))
        .unwrap();
        record.drop_null_fields();
        assert_eq!(
            serde_json::Value::from(record),
            serde_json::json!({ "owner": { "phone": null }, "title": "A" })
        );
    }

    #[test]
    fn test_changed_keys() {
        let mut baseline = Record::new();
        baseline.set(&path("a"), Scalar::text("1")).unwrap();
        baseline.set(&path("b"), Scalar::text("2")).unwrap();
        let mut edited = baseline.clone();
        edited.set(&path("b"), Scalar::text("3")).unwrap();
        edited.set(&path("c"), Scalar::text("4")).unwrap();
        assert_eq!(edited.changed_keys(&baseline), vec!["b", "c"]);
    }
}
