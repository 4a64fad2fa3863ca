use clap::Parser;
use pairing_registry::api::RegistryServer;
use pairing_registry::cli::Cli;
use pairing_registry::logging::{cleanup_old_logs, init_logging, LoggingConfig};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_config = LoggingConfig::from_args(cli.quiet, cli.verbose > 0, cli.json)
        .with_file_output(cli.log_file.clone());

    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // Rotated files sit next to the live log file
    if let Some(dir) = cli.log_file.as_deref().and_then(|f| f.parent()) {
        if let Err(e) = cleanup_old_logs(dir, cli.log_retention_days) {
            tracing::warn!("Log cleanup failed: {}", e);
        }
    }

    if let Err(e) = RegistryServer::new(cli.server_config()).run().await {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
