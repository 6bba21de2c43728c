//! Flattening a record into a header + rows table for exporters
//!
//! Scalars become columns named by their dotted path (`owner.name`). Each
//! list expands into one table row per list row (`items.qty`), with the
//! record's other scalars repeated on every row. Several lists are stacked
//! one after another. Row ids are not exported.

use crate::record::{Node, Record};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlatTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FlatTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Cell by row index and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let column = self.column(column)?;
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Replace column names with display labels, leaving unlabeled ones
    pub fn relabel<F>(mut self, label: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in &mut self.header {
            if let Some(text) = label(name) {
                *name = text;
            }
        }
        self
    }
}

type FlatRow = BTreeMap<String, String>;

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn flatten_fields(fields: &BTreeMap<String, Node>, prefix: &str) -> Vec<FlatRow> {
    let mut base = FlatRow::new();
    let mut groups: Vec<Vec<FlatRow>> = Vec::new();

    for (key, node) in fields {
        let column = join(prefix, key);
        match node {
            Node::Scalar(scalar) => {
                base.insert(column, scalar.display());
            }
            Node::Object(inner) => {
                let mut nested = flatten_fields(inner, &column);
                if nested.len() == 1 {
                    base.append(&mut nested[0]);
                } else {
                    groups.push(nested);
                }
            }
            Node::List(rows) => {
                groups.push(
                    rows.iter()
                        .flat_map(|row| flatten_fields(&row.fields, &column))
                        .collect(),
                );
            }
        }
    }

    let expanded: Vec<FlatRow> = groups
        .into_iter()
        .flatten()
        .map(|row| {
            let mut merged = base.clone();
            merged.extend(row);
            merged
        })
        .collect();

    if expanded.is_empty() {
        vec![base]
    } else {
        expanded
    }
}

impl Record {
    /// Flatten into a table. `columns` come first in the given order (and
    /// are always present); any other column follows alphabetically.
    pub fn flatten(&self, columns: &[String]) -> FlatTable {
        let rows = flatten_fields(self.fields(), "");

        let declared: BTreeSet<&str> = columns.iter().map(String::as_str).collect();
        let extra: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .filter(|column| !declared.contains(column))
            .collect();

        let header: Vec<String> = columns
            .iter()
            .cloned()
            .chain(extra.into_iter().map(str::to_string))
            .collect();

        let rows = rows
            .iter()
            .map(|row| {
                header
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        FlatTable { header, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::try_from(value).unwrap()
    }

    #[test]
    fn test_scalars_only_make_one_row() {
        let table = record(json!({ "title": "A", "owner": { "name": "B" } })).flatten(&[]);
        assert_eq!(table.header, vec!["owner.name", "title"]);
        assert_eq!(table.rows, vec![vec!["B", "A"]]);
    }

    #[test]
    fn test_list_rows_repeat_scalars() {
        let table = record(json!({
            "client": "Acme",
            "items": [
                { "id": 1, "qty": "2", "amount": "10.00" },
                { "id": 2, "qty": "3", "amount": "15.00" }
            ]
        }))
        .flatten(&["items.qty".to_string(), "items.amount".to_string()]);

        assert_eq!(table.header, vec!["items.qty", "items.amount", "client"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(1, "items.amount"), Some("15.00"));
        assert_eq!(table.cell(1, "client"), Some("Acme"));
    }

    #[test]
    fn test_nested_lists_expand_recursively() {
        let table = record(json!({
            "phases": [
                { "id": 1, "name": "Design", "tasks": [
                    { "id": 1, "task": "Sketch" },
                    { "id": 2, "task": "Model" }
                ]},
                { "id": 2, "name": "Build", "tasks": [] }
            ]
        }))
        .flatten(&[]);

        assert_eq!(table.header, vec!["phases.name", "phases.tasks.task"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["Design", "Sketch"],
                vec!["Design", "Model"],
                vec!["Build", ""],
            ]
        );
    }

    #[test]
    fn test_declared_columns_always_present() {
        let table = record(json!({})).flatten(&["total".to_string()]);
        assert_eq!(table.header, vec!["total"]);
        assert_eq!(table.rows, vec![vec![""]]);
    }

    #[test]
    fn test_relabel() {
        let table = record(json!({ "qty": "1" }))
            .flatten(&[])
            .relabel(|c| (c == "qty").then(|| "Quantity".to_string()));
        assert_eq!(table.header, vec!["Quantity"]);
    }
}
