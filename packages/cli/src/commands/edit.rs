use super::{parse_assignment, Context, DocumentArgs};
use anyhow::{anyhow, Context as _, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{FieldPath, FormSchema, RowId, Scalar};
use folio_record::{encode_node, Document, ScalarKind, ROW_ID_FIELD};
use serde_json::Value;

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub doc: DocumentArgs,

    /// Assignments such as `items.0.qty=100`
    #[arg(required = true, value_name = "FIELD=VALUE")]
    pub assignments: Vec<String>,
}

#[derive(Debug, Args)]
pub struct AddRowArgs {
    #[command(flatten)]
    pub doc: DocumentArgs,

    /// List field to append to, e.g. `items`
    pub list: String,

    /// Initial row values; `id=N` forces the row id
    #[arg(value_name = "FIELD=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RemoveRowArgs {
    #[command(flatten)]
    pub doc: DocumentArgs,

    /// List field holding the row
    pub list: String,

    /// Row id (as shown by `folio show`)
    pub id: u64,
}

/// Typed value for a command-line string, following the field's kind
fn scalar_for(schema: &FormSchema, path: &FieldPath, raw: &str) -> Scalar {
    let kind = schema.descriptor_for(path).map(|d| d.kind);
    match (kind, raw) {
        (Some(ScalarKind::Boolean), "true" | "yes") => Scalar::Bool(true),
        (Some(ScalarKind::Boolean), "false" | "no") => Scalar::Bool(false),
        _ => Scalar::text(raw),
    }
}

pub async fn set(args: SetArgs, ctx: &Context) -> Result<()> {
    let mut engine = ctx.open(&args.doc).await?;
    engine.begin_edit()?;
    engine.begin_batch(Some("set"));

    for raw in &args.assignments {
        let (field, value) = parse_assignment(raw)?;
        let path = FieldPath::parse(field)?;
        let value = scalar_for(engine.schema(), &path, value);
        engine
            .set_field(&path, value)
            .with_context(|| format!("Cannot set `{}`", field))?;
        let stored = engine
            .get(&path)
            .and_then(|node| node.as_scalar())
            .map(Scalar::display)
            .unwrap_or_default();
        println!("  {} {} = {}", "✓".green(), field.cyan(), stored);
    }

    engine.end_batch();
    let ack = engine.save().await.context("Save failed")?;
    println!("{} Saved revision {}", "✅".green(), ack.revision);
    Ok(())
}

pub async fn add_row(args: AddRowArgs, ctx: &Context) -> Result<()> {
    let mut engine = ctx.open(&args.doc).await?;
    let list = FieldPath::parse(&args.list)?;

    // Start from the form's row template so partial rows keep every column
    let mut template: Document = engine
        .record()
        .canonicalize(&list)
        .ok()
        .and_then(|canonical| engine.schema().row_template(&canonical))
        .map(|fields| {
            fields
                .iter()
                .map(|(name, node)| (name.clone(), encode_node(node)))
                .collect()
        })
        .unwrap_or_default();
    for raw in &args.fields {
        let (field, value) = parse_assignment(raw)?;
        let value = if field == ROW_ID_FIELD {
            let id: u64 = value
                .parse()
                .map_err(|_| anyhow!("Row id must be a number, got `{}`", value))?;
            Value::from(id)
        } else {
            Value::String(value.to_string())
        };
        template.insert(field.to_string(), value);
    }

    engine.begin_edit()?;
    let id = engine.add_row(&list, template)?;
    let ack = engine.save().await.context("Save failed")?;
    println!(
        "{} Added {} (revision {})",
        "✅".green(),
        list.row(id).to_string().cyan(),
        ack.revision
    );
    Ok(())
}

pub async fn remove_row(args: RemoveRowArgs, ctx: &Context) -> Result<()> {
    let mut engine = ctx.open(&args.doc).await?;
    let list = FieldPath::parse(&args.list)?;
    let id = RowId(args.id);

    engine.begin_edit()?;
    if !engine.remove_row(&list, id)? {
        engine.cancel_edit()?;
        println!("{} No row {} in {}", "⚠️".yellow(), id, args.list);
        return Ok(());
    }
    let ack = engine.save().await.context("Save failed")?;
    println!(
        "{} Removed {} (revision {})",
        "✅".green(),
        list.row(id).to_string().cyan(),
        ack.revision
    );
    Ok(())
}
