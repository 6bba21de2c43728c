use super::{Context, DocumentArgs};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_record::{Node, Record};
use std::collections::BTreeMap;

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub doc: DocumentArgs,

    /// Print the stored JSON document instead of field lines
    #[arg(long)]
    pub json: bool,
}

pub async fn show(args: ShowArgs, ctx: &Context) -> Result<()> {
    let engine = ctx.open(&args.doc).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&engine.record().to_document())?);
        return Ok(());
    }

    let title = format!("{} ({}/{})", engine.schema().title(), args.doc.form, args.doc.doc);
    println!("{}", title.bright_blue().bold());
    if engine.is_new() {
        println!("{}", "New document, showing the default template".dimmed());
    }
    for (path, value) in field_lines(engine.record()) {
        println!("  {} = {}", path.cyan(), value);
    }
    Ok(())
}

/// One `path = value` line per scalar, rows addressed by id
pub fn field_lines(record: &Record) -> Vec<(String, String)> {
    let mut lines = Vec::new();
    collect_lines(record.fields(), "", &mut lines);
    lines
}

fn collect_lines(fields: &BTreeMap<String, Node>, prefix: &str, out: &mut Vec<(String, String)>) {
    for (name, node) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        match node {
            Node::Scalar(value) => out.push((path, value.display())),
            Node::Object(inner) => collect_lines(inner, &path, out),
            Node::List(rows) => {
                for row in rows {
                    collect_lines(&row.fields, &format!("{path}[#{}]", row.id), out);
                }
            }
        }
    }
}
