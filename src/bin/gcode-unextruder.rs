use std::process::ExitCode;

use anyhow::Result;
use gcode_unextruder::cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    cli::run().await
}
