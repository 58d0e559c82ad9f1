use std::process::ExitCode;

use clap::Parser;

use crate::app::{App, Commands};
use crate::config::Settings;

mod app;
mod bundle;
mod commands;
mod config;
mod logging;

#[tokio::main]
async fn main() -> ExitCode {
    match run(App::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(app: App) -> anyhow::Result<()> {
    let settings = Settings::load(app.config.as_deref())?;
    logging::init(&settings.logging)?;

    match app.cmd {
        Commands::Assemble(args) => commands::assemble::run(&args, &settings).await,
        Commands::Inspect(args) => commands::inspect::run(&args, &settings),
        Commands::Digest(args) => commands::digest::run(&args, &settings).await,
    }
}
