#![cfg(not(tarpaulin_include))]

use clap::Parser;
use studyflow::app;
use studyflow::config::Config;

/// Main entry point for the StudyFlow API server
///
/// Reads configuration from flags and `STUDYFLOW_*` variables, sets up
/// logging from `RUST_LOG` (default `info`) and serves until ctrl-c.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::debug!("starting with {:?}", config);

    app::run(config).await
}
