use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use crate::cli::{App, Runner};
use crate::config::Config;

mod backend;
mod cli;
mod config;
mod logging;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let app = App::parse();
    let config = Config::load(app.config.as_deref()).context("failed to load configuration")?;
    logging::init(&config.log)?;

    let report = Runner::new(config).run(app.cmd).await?;
    println!("{}", serde_json::to_string_pretty(&report.body)?);

    Ok(if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
