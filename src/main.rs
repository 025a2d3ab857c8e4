use clap::Parser;
use job_tracker::{cli, config, logging};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Load configuration from environment
    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init(&config.log_dir) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting job-tracker");
    info!("Configuration loaded successfully:");
    info!("  - Jobs service: {}", config.api_base_url);
    info!("  - Request timeout: {:?}", config.request_timeout);
    info!("  - Mutation timeout: {:?}", config.mutation_timeout);
    info!("  - Retry attempts: {}", config.retry.max_attempts);
    info!("  - Bulk concurrency: {}", config.bulk_concurrency);

    match cli::run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
