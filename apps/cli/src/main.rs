//! quarry - command-line front end for the search layer

mod cli;
mod config;
mod logging;

use clap::Parser;
use quarry_search::{ErrorReport, HttpConnector, SearchService};
use std::process::ExitCode;
use std::sync::Arc;

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init_logging(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let target = args.target(config.backend.index_config());
    let timeout = config.backend.timeout();
    let service =
        SearchService::new(Arc::new(HttpConnector::with_timeout(timeout))).with_timeout(timeout);

    match cli::execute(&service, &target, args.command).await {
        Ok(Some(output)) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            let report = match e.downcast_ref::<quarry_search::Error>() {
                Some(err) => err.report(),
                None => ErrorReport {
                    status: 400,
                    message: format!("{:#}", e),
                },
            };
            eprintln!(
                "{}",
                serde_json::to_string(&report).unwrap_or_else(|_| report.message.clone())
            );
            ExitCode::FAILURE
        }
    }
}
