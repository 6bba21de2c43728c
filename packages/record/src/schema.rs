//! # Field descriptors and form schemas
//!
//! A [`FormSchema`] is static metadata for one kind of form: which fields
//! exist, their kinds, which are derived from others, the default template
//! used for a brand-new record and the default row for each list.
//!
//! Schemas are declared with [`SchemaBuilder`] and [`FieldSpec`]; patterns
//! are parsed once in [`SchemaBuilder::build`].
//!
//! ```rust,ignore
//! let schema = SchemaBuilder::new("bill-of-quantity")
//!     .field(FieldSpec::number("items.*.qty"))
//!     .field(FieldSpec::number("items.*.rate"))
//!     .field(FieldSpec::text("items.*.amount").derived(derive::product("items.*.qty", "items.*.rate")))
//!     .row_template("items", json!({ "qty": "", "rate": "", "amount": "" }))
//!     .build()?;
//! ```

use crate::error::SchemaError;
use crate::path::{FieldPath, FieldPattern};
use crate::record::{Node, Record, Row};
use crate::value::{format_money, Scalar, ScalarKind};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Pure function from the values of a derivation's inputs to its output.
///
/// `values[i]` holds the values matched by input `i`: exactly one for a
/// bound input, one per row for an input that still has wildcards.
pub type DeriveFn = Arc<dyn Fn(&[Vec<Scalar>]) -> Scalar + Send + Sync>;

/// Rule computing a field from other fields
#[derive(Clone)]
pub struct Derivation {
    pub name: &'static str,
    pub inputs: Vec<FieldPattern>,
    compute: DeriveFn,
}

impl Derivation {
    pub fn compute(&self, values: &[Vec<Scalar>]) -> Scalar {
        (self.compute)(values)
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derivation")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// Static description of one field (or one field of every row)
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub pattern: FieldPattern,
    pub kind: ScalarKind,
    pub label: Option<String>,
    pub derivation: Option<Derivation>,
    pub allowed: Option<Vec<Scalar>>,
}

impl FieldDescriptor {
    pub fn is_derived(&self) -> bool {
        self.derivation.is_some()
    }

    /// Whether `value` is one of the allowed values (always true when unrestricted)
    pub fn allows(&self, value: &Scalar) -> bool {
        match &self.allowed {
            None => true,
            Some(_) if matches!(value, Scalar::Null) => true,
            Some(allowed) => allowed.contains(value),
        }
    }
}

/// Unparsed derivation, see [`derive`]
#[derive(Clone)]
pub struct DeriveSpec {
    name: &'static str,
    inputs: Vec<String>,
    compute: DeriveFn,
}

/// Unparsed field descriptor
#[derive(Clone)]
pub struct FieldSpec {
    pattern: String,
    kind: ScalarKind,
    label: Option<String>,
    derive: Option<DeriveSpec>,
    allowed: Option<Vec<Scalar>>,
}

impl FieldSpec {
    pub fn new(pattern: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
            label: None,
            derive: None,
            allowed: None,
        }
    }

    pub fn text(pattern: impl Into<String>) -> Self {
        Self::new(pattern, ScalarKind::Text)
    }

    pub fn number(pattern: impl Into<String>) -> Self {
        Self::new(pattern, ScalarKind::Number)
    }

    pub fn date(pattern: impl Into<String>) -> Self {
        Self::new(pattern, ScalarKind::Date)
    }

    pub fn boolean(pattern: impl Into<String>) -> Self {
        Self::new(pattern, ScalarKind::Boolean)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn derived(mut self, derive: DeriveSpec) -> Self {
        self.derive = Some(derive);
        self
    }

    pub fn allowed<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Built-in derivation rules
pub mod derive {
    use super::*;

    pub fn custom<F>(name: &'static str, inputs: &[&str], compute: F) -> DeriveSpec
    where
        F: Fn(&[Vec<Scalar>]) -> Scalar + Send + Sync + 'static,
    {
        DeriveSpec {
            name,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            compute: Arc::new(compute),
        }
    }

    fn first_number(values: &[Vec<Scalar>], input: usize) -> Option<f64> {
        values.get(input)?.first()?.as_number()
    }

    fn first_blank(values: &[Vec<Scalar>], input: usize) -> bool {
        values
            .get(input)
            .and_then(|v| v.first())
            .map_or(true, Scalar::is_blank)
    }

    /// `a * b` as money text; empty unless both inputs are numeric
    pub fn product(a: &str, b: &str) -> DeriveSpec {
        custom("product", &[a, b], |values| {
            match (first_number(values, 0), first_number(values, 1)) {
                (Some(a), Some(b)) => Scalar::Text(format_money(a * b)),
                _ => Scalar::text(""),
            }
        })
    }

    /// Sum of every numeric value matched by the inputs, as money text
    pub fn sum(inputs: &[&str]) -> DeriveSpec {
        custom("sum", inputs, |values| {
            let numbers: Vec<f64> = values.iter().flatten().filter_map(Scalar::as_number).collect();
            if numbers.is_empty() {
                Scalar::text("")
            } else {
                Scalar::Text(format_money(numbers.iter().sum()))
            }
        })
    }

    /// `a - b` as money text; a blank side counts as zero unless both are blank
    pub fn difference(a: &str, b: &str) -> DeriveSpec {
        custom("difference", &[a, b], |values| {
            if first_blank(values, 0) && first_blank(values, 1) {
                return Scalar::text("");
            }
            let a = first_number(values, 0).unwrap_or(0.0);
            let b = first_number(values, 1).unwrap_or(0.0);
            Scalar::Text(format_money(a - b))
        })
    }

    /// `a / b * 100` rounded to two decimals; empty when `b` is zero or missing
    pub fn percent_of(a: &str, b: &str) -> DeriveSpec {
        custom("percent_of", &[a, b], |values| {
            match (first_number(values, 0), first_number(values, 1)) {
                (Some(a), Some(b)) if b != 0.0 => Scalar::Text(format_money(a / b * 100.0)),
                _ => Scalar::text(""),
            }
        })
    }

    /// Calendar days from `start` to `end`, both inclusive
    pub fn days_between(start: &str, end: &str) -> DeriveSpec {
        custom("days_between", &[start, end], |values| {
            let date = |input: usize| values.get(input).and_then(|v| v.first()).and_then(Scalar::as_date);
            match (date(0), date(1)) {
                (Some(start), Some(end)) if end >= start => {
                    Scalar::Number(((end - start).num_days() + 1) as f64)
                }
                _ => Scalar::text(""),
            }
        })
    }
}

/// Static metadata for one kind of form
#[derive(Debug, Clone)]
pub struct FormSchema {
    name: String,
    title: String,
    descriptors: Vec<FieldDescriptor>,
    template: Record,
    row_templates: Vec<(FieldPattern, BTreeMap<String, Node>)>,
}

impl FormSchema {
    /// Schema with no descriptors and an empty template
    pub fn untyped(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            descriptors: Vec::new(),
            template: Record::new(),
            row_templates: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// Derived descriptors in declaration order
    pub fn derivations(&self) -> impl Iterator<Item = (&FieldDescriptor, &Derivation)> {
        self.descriptors
            .iter()
            .filter_map(|d| d.derivation.as_ref().map(|rule| (d, rule)))
    }

    /// First descriptor declared for a path
    pub fn descriptor_for(&self, path: &FieldPath) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|d| d.pattern.covers(path))
    }

    /// Record a brand-new document starts from
    pub fn default_record(&self) -> Record {
        self.template.clone()
    }

    /// Default fields of a new row in the list at a canonical path
    pub fn row_template(&self, list: &FieldPath) -> Option<&BTreeMap<String, Node>> {
        self.row_templates
            .iter()
            .find(|(pattern, _)| pattern.matches(list).is_some())
            .map(|(_, fields)| fields)
    }

    /// Export columns in declaration order
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for descriptor in &self.descriptors {
            let column = descriptor.pattern.column_name();
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    /// Human label for an export column, when one of its descriptors has one
    pub fn column_label(&self, column: &str) -> Option<&str> {
        self.descriptors
            .iter()
            .find(|d| d.pattern.column_name() == column)
            .and_then(|d| d.label.as_deref())
    }
}

/// Builder for [`FormSchema`]
pub struct SchemaBuilder {
    name: String,
    title: Option<String>,
    fields: Vec<FieldSpec>,
    template: Option<Value>,
    row_templates: Vec<(String, Value)>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            fields: Vec::new(),
            template: None,
            row_templates: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn template(mut self, template: Value) -> Self {
        self.template = Some(template);
        self
    }

    pub fn row_template(mut self, list: impl Into<String>, row: Value) -> Self {
        self.row_templates.push((list.into(), row));
        self
    }

    pub fn build(self) -> Result<FormSchema, SchemaError> {
        let schema = self.name;
        let pattern = |source: &str| {
            FieldPattern::parse(source).map_err(|source| SchemaError::Pattern {
                schema: schema.clone(),
                source,
            })
        };

        let mut descriptors = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            let derivation = match field.derive {
                None => None,
                Some(spec) => {
                    if spec.inputs.is_empty() {
                        return Err(SchemaError::NoInputs {
                            schema: schema.clone(),
                            field: field.pattern,
                        });
                    }
                    let inputs = spec
                        .inputs
                        .iter()
                        .map(|input| pattern(input))
                        .collect::<Result<Vec<_>, _>>()?;
                    Some(Derivation {
                        name: spec.name,
                        inputs,
                        compute: spec.compute,
                    })
                }
            };
            descriptors.push(FieldDescriptor {
                pattern: pattern(&field.pattern)?,
                kind: field.kind,
                label: field.label,
                derivation,
                allowed: field.allowed,
            });
        }

        let template = match self.template {
            None => Record::new(),
            Some(Value::Object(document)) => {
                Record::from_document(&document).map_err(|source| SchemaError::Template {
                    schema: schema.clone(),
                    source,
                })?
            }
            Some(_) => return Err(SchemaError::TemplateNotAnObject { schema: schema.clone() }),
        };

        let mut row_templates = Vec::with_capacity(self.row_templates.len());
        for (list, row) in self.row_templates {
            if !row.is_object() {
                return Err(SchemaError::TemplateNotAnObject { schema: schema.clone() });
            }
            let row = Row::try_from(row).map_err(|source| SchemaError::Template {
                schema: schema.clone(),
                source,
            })?;
            row_templates.push((pattern(&list)?, row.fields));
        }

        Ok(FormSchema {
            title: self.title.unwrap_or_else(|| schema.clone()),
            name: schema,
            descriptors,
            template,
            row_templates,
        })
    }
}
