use anyhow::Result;
use clap::Parser;

use setflow::cli::{Cli, Commands};
use setflow::commands;
use setflow::db::open;
use setflow::types::OutputFmt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let db_path = "./setflow.db";

    let pool = open(db_path).await?;
    let fmt = if cli.json {
        OutputFmt::Json
    } else {
        OutputFmt::Plain
    };

    match cli.cmd {
        Commands::Session(cmd) => commands::session::handle(cmd, &pool, fmt).await?,
        Commands::Plan(cmd) => commands::plan::handle(cmd, &pool, fmt).await?,
        Commands::Config(cmd) => commands::config::handle(cmd).await?,
    }

    Ok(())
}
