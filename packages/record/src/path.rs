//! # Field paths and patterns
//!
//! A [`FieldPath`] addresses one node of a record. Rows can be addressed by
//! position (`items.0.qty`, `items[0].qty`) or by identity (`items[#3].qty`).
//! Positions are resolved against the current record before anything is
//! stored, so mutations recorded for undo always carry row ids.
//!
//! A [`FieldPattern`] is what field descriptors are declared against:
//! `items.*.amount` covers the `amount` field of every row of `items`.

use crate::error::{PathError, PathResult};
use crate::lexer::{lex, PathToken, SpannedToken};
use crate::record::RowId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named field of an object or row
    Key(String),
    /// Row by position
    Index(usize),
    /// Row by identity
    Row(RowId),
    /// Every row (patterns only)
    Any,
}

impl Segment {
    pub fn key(name: impl Into<String>) -> Self {
        Segment::Key(name.into())
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(name) => Some(name),
            _ => None,
        }
    }
}

fn write_segments(f: &mut fmt::Formatter<'_>, segments: &[Segment]) -> fmt::Result {
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Key(name) if i == 0 => write!(f, "{}", name)?,
            Segment::Key(name) => write!(f, ".{}", name)?,
            Segment::Index(index) => write!(f, ".{}", index)?,
            Segment::Row(id) => write!(f, "[#{}]", id.0)?,
            Segment::Any => write!(f, ".*")?,
        }
    }
    Ok(())
}

struct SegmentParser<'a, 'src> {
    source: &'a str,
    tokens: std::iter::Peekable<std::vec::IntoIter<SpannedToken<'src>>>,
}

impl<'a, 'src> SegmentParser<'a, 'src> {
    fn next(&mut self, expected: &str) -> PathResult<SpannedToken<'src>> {
        self.tokens
            .next()
            .ok_or_else(|| PathError::unexpected_end(self.source, expected))
    }

    fn unexpected(&self, token: &SpannedToken<'_>, expected: &str) -> PathError {
        PathError::unexpected_token(self.source, token.start, expected, token.token.describe())
    }

    fn index(&self, token: &SpannedToken<'_>, n: u64) -> PathResult<Segment> {
        usize::try_from(n)
            .map(Segment::Index)
            .map_err(|_| self.unexpected(token, "a row index"))
    }

    fn parse(mut self) -> PathResult<Vec<Segment>> {
        let first = self.next("a field name")?;
        let mut segments = match first.token {
            PathToken::Name(name) => vec![Segment::key(name)],
            _ => {
                return Err(PathError::MustStartWithField {
                    path: self.source.to_string(),
                })
            }
        };

        while let Some(token) = self.tokens.next() {
            match token.token {
                PathToken::Dot => {
                    let next = self.next("a field name, row index or `*`")?;
                    let segment = match next.token {
                        PathToken::Name(name) => Segment::key(name),
                        PathToken::Number(n) => self.index(&next, n)?,
                        PathToken::Star => Segment::Any,
                        _ => return Err(self.unexpected(&next, "a field name, row index or `*`")),
                    };
                    segments.push(segment);
                }
                PathToken::LBracket => {
                    let next = self.next("a row index, `#id` or `*`")?;
                    let segment = match next.token {
                        PathToken::Number(n) => self.index(&next, n)?,
                        PathToken::Star => Segment::Any,
                        PathToken::Hash => {
                            let id = self.next("a row id")?;
                            match id.token {
                                PathToken::Number(n) => Segment::Row(RowId(n)),
                                _ => return Err(self.unexpected(&id, "a row id")),
                            }
                        }
                        _ => return Err(self.unexpected(&next, "a row index, `#id` or `*`")),
                    };
                    let close = self.next("`]`")?;
                    if close.token != PathToken::RBracket {
                        return Err(self.unexpected(&close, "`]`"));
                    }
                    segments.push(segment);
                }
                _ => return Err(self.unexpected(&token, "`.` or `[`")),
            }
        }

        Ok(segments)
    }
}

fn parse_segments(source: &str) -> PathResult<Vec<Segment>> {
    if source.is_empty() {
        return Err(PathError::Empty);
    }
    let tokens = lex(source).map_err(|pos| PathError::UnexpectedChar {
        path: source.to_string(),
        pos,
    })?;
    SegmentParser {
        source,
        tokens: tokens.into_iter().peekable(),
    }
    .parse()
}

/// Validated address of a node inside a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(source: &str) -> PathResult<Self> {
        let segments = parse_segments(source)?;
        if segments.contains(&Segment::Any) {
            return Err(PathError::WildcardNotAllowed {
                path: source.to_string(),
            });
        }
        Ok(Self { segments })
    }

    /// Top-level field
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::key(name)],
        }
    }

    pub(crate) fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Top-level field this path lives under
    pub fn top_level(&self) -> Option<&str> {
        self.segments.first().and_then(Segment::as_key)
    }

    pub fn parent(&self) -> Option<FieldPath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self::from_segments(
            self.segments[..self.segments.len() - 1].to_vec(),
        ))
    }

    pub fn child(&self, name: impl Into<String>) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(Segment::key(name));
        Self::from_segments(segments)
    }

    pub fn row(&self, id: RowId) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(Segment::Row(id));
        Self::from_segments(segments)
    }

    /// True when no segment refers to a row by position
    pub fn is_canonical(&self) -> bool {
        !self.segments.iter().any(|s| matches!(s, Segment::Index(_)))
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_segments(f, &self.segments)
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// Field path with `*` wildcards over list rows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPattern {
    segments: Vec<Segment>,
}

impl FieldPattern {
    pub fn parse(source: &str) -> PathResult<Self> {
        let segments = parse_segments(source)?;
        if segments.iter().any(|s| matches!(s, Segment::Index(_))) {
            return Err(PathError::PositionInPattern {
                path: source.to_string(),
            });
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn wildcard_count(&self) -> usize {
        self.segments.iter().filter(|s| **s == Segment::Any).count()
    }

    pub fn has_wildcards(&self) -> bool {
        self.wildcard_count() > 0
    }

    /// Row bindings when `path` is an instance of this pattern
    pub fn matches(&self, path: &FieldPath) -> Option<Vec<RowId>> {
        if self.segments.len() != path.segments.len() {
            return None;
        }
        let mut bindings = Vec::new();
        for (pattern, concrete) in self.segments.iter().zip(&path.segments) {
            match (pattern, concrete) {
                (Segment::Key(a), Segment::Key(b)) if a == b => {}
                (Segment::Row(a), Segment::Row(b)) if a == b => {}
                (Segment::Any, Segment::Row(id)) => bindings.push(*id),
                _ => return None,
            }
        }
        Some(bindings)
    }

    /// Like [`matches`](Self::matches), but also accepts positional rows
    pub fn covers(&self, path: &FieldPath) -> bool {
        self.segments.len() == path.segments.len()
            && self
                .segments
                .iter()
                .zip(&path.segments)
                .all(|(pattern, concrete)| match (pattern, concrete) {
                    (Segment::Key(a), Segment::Key(b)) => a == b,
                    (Segment::Row(a), Segment::Row(b)) => a == b,
                    (Segment::Any, Segment::Row(_) | Segment::Index(_)) => true,
                    _ => false,
                })
    }

    /// True when a change at `path` can alter a value this pattern covers:
    /// either the path is an instance of the pattern, or it replaces a
    /// subtree (a list, a row) the pattern reaches into.
    pub fn is_touched_by(&self, path: &FieldPath) -> bool {
        if path.segments.len() > self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&path.segments)
            .all(|(pattern, concrete)| match (pattern, concrete) {
                (Segment::Key(a), Segment::Key(b)) => a == b,
                (Segment::Row(a), Segment::Row(b)) => a == b,
                (Segment::Any, Segment::Row(_)) => true,
                _ => false,
            })
    }

    /// Substitute the leading wildcards with concrete rows
    pub fn bind(&self, rows: &[RowId]) -> FieldPattern {
        let mut rows = rows.iter();
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Any => rows.next().map(|id| Segment::Row(*id)).unwrap_or(Segment::Any),
                other => other.clone(),
            })
            .collect();
        FieldPattern { segments }
    }

    /// Concrete path, when the pattern has no wildcards left
    pub fn to_path(&self) -> Option<FieldPath> {
        if self.has_wildcards() {
            None
        } else {
            Some(FieldPath::from_segments(self.segments.clone()))
        }
    }

    /// Export column this pattern maps to: `items.*.qty` becomes `items.qty`
    pub fn column_name(&self) -> String {
        column_name(&self.segments)
    }
}

pub(crate) fn column_name(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter_map(Segment::as_key)
        .collect::<Vec<_>>()
        .join(".")
}

impl fmt::Display for FieldPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_segments(f, &self.segments)
    }
}

impl FromStr for FieldPattern {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPattern {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldPattern> for String {
    fn from(pattern: FieldPattern) -> Self {
        pattern.to_string()
    }
}

impl From<&FieldPath> for FieldPattern {
    fn from(path: &FieldPath) -> Self {
        FieldPattern {
            segments: path.segments.clone(),
        }
    }
}
