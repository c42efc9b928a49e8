//! Paperproxy - paperproxy command

use anyhow::Result;
use clap::Parser;
use cli_lib::{daemon, logging, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    logging::init(config.level());

    daemon::run(config).await
}
