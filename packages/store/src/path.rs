//! Slash-delimited document paths

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Location of one document, e.g. `users/u1/boq/bill-of-quantity`.
///
/// Segments are non-empty and never `.` or `..`, so a path can be mapped
/// onto a directory tree without escaping it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentPath(String);

fn check_segment(path: &str, segment: &str) -> Result<(), StoreError> {
    let reason = if segment.is_empty() {
        "empty segment"
    } else if segment == "." || segment == ".." {
        "relative segment"
    } else if segment.contains(['\\', '\0']) {
        "illegal character"
    } else {
        return Ok(());
    };
    Err(StoreError::InvalidPath {
        path: path.to_string(),
        reason,
    })
}

impl DocumentPath {
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        for segment in path.split('/') {
            check_segment(path, segment)?;
        }
        Ok(Self(path.to_string()))
    }

    /// `users/<identity>/<rest>`; the identity must be a single segment
    pub fn scoped(identity: &str, rest: &str) -> Result<Self, StoreError> {
        let path = format!("users/{}/{}", identity, rest);
        check_segment(&path, identity)?;
        if identity.contains('/') {
            return Err(StoreError::InvalidPath {
                path,
                reason: "identity must be a single segment",
            });
        }
        Self::parse(&path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Relative file location: `a/b/c` becomes `a/b/c.json`
    pub fn to_file_path(&self) -> PathBuf {
        let mut file: PathBuf = self.segments().collect();
        let name = format!("{}.json", self.segments().last().unwrap_or_default());
        file.set_file_name(name);
        file
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentPath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocumentPath {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentPath> for String {
    fn from(path: DocumentPath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let path = DocumentPath::parse("users/u1/boq/bill-of-quantity").unwrap();
        assert_eq!(path.segments().count(), 4);
        assert_eq!(
            path.to_file_path(),
            PathBuf::from("users/u1/boq/bill-of-quantity.json")
        );
    }

    #[test]
    fn test_parse_rejects_escapes() {
        for bad in ["", "users//x", "users/../etc", "/abs", "trailing/", "a/./b", "a\\b"] {
            assert!(
                matches!(DocumentPath::parse(bad), Err(StoreError::InvalidPath { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_scoped() {
        let path = DocumentPath::scoped("u1", "boq/bill-of-quantity").unwrap();
        assert_eq!(path.as_str(), "users/u1/boq/bill-of-quantity");
        assert!(DocumentPath::scoped("a/b", "boq/x").is_err());
        assert!(DocumentPath::scoped("..", "boq/x").is_err());
        assert!(DocumentPath::scoped("", "boq/x").is_err());
    }
}
