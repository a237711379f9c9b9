//! promptpage CLI: edit a static site through GitHub issues.
//!
//! Reads a change request from an issue, has Gemini rewrite the page, keeps
//! the page's request form intact and commits the result.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
