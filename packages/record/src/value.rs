//! Scalar field values

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used by every date field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Leaf value of a record
///
/// Forms store most user input as text (quantities arrive as `"100"`),
/// so numeric and date helpers parse text leniently.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn text(value: impl Into<String>) -> Self {
        Scalar::Text(value.into())
    }

    /// Null or whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric reading of the value; text may carry thousands separators
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) if n.is_finite() => Some(*n),
            Scalar::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                if cleaned.is_empty() {
                    return None;
                }
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_str()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
    }

    /// Text shown in views and exports
    pub fn display(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(true) => "Yes".to_string(),
            Scalar::Bool(false) => "No".to_string(),
            Scalar::Number(n) => format_number(*n),
            Scalar::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n as f64)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// Integral values print without a fraction
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Two-decimal currency text, e.g. `500.00`
pub fn format_money(n: f64) -> String {
    format!("{:.2}", n)
}

/// Declared kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Text,
    Number,
    Date,
    Boolean,
}

impl ScalarKind {
    /// Whether `value` is acceptable for a field of this kind.
    ///
    /// Null and blank text are accepted by every kind (an empty input).
    pub fn accepts(&self, value: &Scalar) -> bool {
        if value.is_blank() {
            return true;
        }
        match self {
            ScalarKind::Text => matches!(value, Scalar::Text(_)),
            ScalarKind::Number => value.as_number().is_some(),
            ScalarKind::Date => value.as_date().is_some(),
            ScalarKind::Boolean => matches!(value, Scalar::Bool(_)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Number => "number",
            ScalarKind::Date => "date",
            ScalarKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_parsing_from_text() {
        assert_eq!(Scalar::text("100").as_number(), Some(100.0));
        assert_eq!(Scalar::text(" 1,250.5 ").as_number(), Some(1250.5));
        assert_eq!(Scalar::text("").as_number(), None);
        assert_eq!(Scalar::text("ten").as_number(), None);
        assert_eq!(Scalar::Bool(true).as_number(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Scalar::Number(119944.0).display(), "119944");
        assert_eq!(Scalar::Number(2.5).display(), "2.5");
        assert_eq!(Scalar::Bool(false).display(), "No");
        assert_eq!(Scalar::Null.display(), "");
        assert_eq!(format_money(500.0), "500.00");
    }

    #[test]
    fn test_kind_accepts() {
        assert!(ScalarKind::Number.accepts(&Scalar::text("42")));
        assert!(ScalarKind::Number.accepts(&Scalar::text("")));
        assert!(!ScalarKind::Number.accepts(&Scalar::text("forty")));
        assert!(ScalarKind::Date.accepts(&Scalar::text("2024-03-01")));
        assert!(!ScalarKind::Date.accepts(&Scalar::text("03/01/2024")));
        assert!(!ScalarKind::Boolean.accepts(&Scalar::text("yes")));
        assert!(ScalarKind::Boolean.accepts(&Scalar::Null));
    }

    #[test]
    fn test_untagged_serde() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[null, true, 3, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::Bool(true),
                Scalar::Number(3.0),
                Scalar::text("x")
            ]
        );
    }
}
