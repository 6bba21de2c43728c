use super::{Context, DocumentArgs};
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use folio_export::{ExportFormat, ExportRegistry};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub doc: DocumentArgs,

    /// Output format (csv, html, pdf)
    #[arg(short, long, default_value = "csv")]
    pub format: String,

    /// Output file (defaults to `<exportDir>/<form>-<doc>.<ext>`)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Write to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

pub async fn export(args: ExportArgs, ctx: &Context) -> Result<()> {
    let format: ExportFormat = args.format.parse().map_err(anyhow::Error::msg)?;
    let engine = ctx.open(&args.doc).await?;
    let snapshot = engine.export_snapshot(format)?;
    let bytes = ExportRegistry::new()
        .export(&snapshot)
        .with_context(|| format!("Cannot export {}/{}", args.doc.form, args.doc.doc))?;

    if args.stdout {
        print!("{}", String::from_utf8_lossy(&bytes));
        return Ok(());
    }

    let out = match args.out {
        Some(out) => ctx.cwd().join(out),
        None => ctx
            .config()
            .get_export_dir(ctx.cwd())
            .join(format!("{}-{}.{}", args.doc.form, args.doc.doc, format.extension())),
    };
    if let Some(parent) = out.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&out, &bytes)
        .await
        .with_context(|| format!("Cannot write {}", out.display()))?;

    println!(
        "{} Exported {} rows → {}",
        "✅".green(),
        snapshot.table.rows.len(),
        out.display()
    );
    Ok(())
}
