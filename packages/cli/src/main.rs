mod commands;
mod config;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use commands::{
    add_row, export, forms, init, remove_row, set, show, AddRowArgs, Context, ExportArgs, InitArgs,
    RemoveRowArgs, SetArgs, ShowArgs,
};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Folio CLI - edit and export the firm's business forms
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Flags that take precedence over `folio.config.json`
#[derive(Args, Debug)]
struct Overrides {
    /// Document store directory
    #[arg(long, global = true)]
    store_dir: Option<String>,

    /// Identity documents are scoped under
    #[arg(long, global = true)]
    identity: Option<String>,

    /// Validate field kinds and allowed values
    #[arg(long, global = true)]
    strict: bool,
}

impl Overrides {
    fn apply(self, mut config: Config) -> Config {
        if let Some(store_dir) = self.store_dir {
            config.store_dir = store_dir;
        }
        if let Some(identity) = self.identity {
            config.identity = identity;
        }
        config.strict |= self.strict;
        config
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create folio.config.json in the current directory
    Init(InitArgs),

    /// List the available forms
    Forms,

    /// Print a document's fields
    Show(ShowArgs),

    /// Set fields and save
    Set(SetArgs),

    /// Append a row to a list field and save
    AddRow(AddRowArgs),

    /// Remove a row by id and save
    RemoveRow(RemoveRowArgs),

    /// Export a document as CSV or HTML
    Export(ExportArgs),
}

fn context(overrides: Overrides, cwd: PathBuf) -> anyhow::Result<Context> {
    let config = overrides.apply(Config::load(&cwd)?);
    Context::new(cwd, config)
}

async fn run(cli: Cli, cwd: PathBuf) -> anyhow::Result<()> {
    let overrides = cli.overrides;
    match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Forms => forms(&context(overrides, cwd)?),
        Command::Show(args) => show(args, &context(overrides, cwd)?).await,
        Command::Set(args) => set(args, &context(overrides, cwd)?).await,
        Command::AddRow(args) => add_row(args, &context(overrides, cwd)?).await,
        Command::RemoveRow(args) => remove_row(args, &context(overrides, cwd)?).await,
        Command::Export(args) => export(args, &context(overrides, cwd)?).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => run(cli, cwd).await,
        Err(err) => Err(anyhow::Error::new(err).context("Cannot get current directory")),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
