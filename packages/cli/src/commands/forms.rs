use super::Context;
use anyhow::Result;
use colored::Colorize;

pub fn forms(ctx: &Context) -> Result<()> {
    println!("{}", "Available forms".bright_blue().bold());
    for schema in ctx.forms().iter() {
        println!("  {:<22} {}", schema.name().green(), schema.title());
    }
    Ok(())
}
