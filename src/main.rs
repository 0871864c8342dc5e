/*
 * Responsibility
 * - tokio runtime
 * - CLI parsing, then app::run() (no logic here)
 */
use anyhow::Result;
use clap::Parser;

use ciam_demo::{app, cli::Cli};

#[tokio::main]
async fn main() -> Result<()> {
    app::run(Cli::parse()).await
}
