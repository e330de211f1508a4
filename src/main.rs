use clap::Parser;
use trade_journal::utils::logger;
use trade_journal::{server, ServeConfig};

#[tokio::main]
async fn main() {
    let config = ServeConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting trade-journal");
    if config.verbose {
        tracing::debug!("Serve config: {:?}", config);
    }

    if let Err(e) = server::serve(&config).await {
        tracing::error!(
            "❌ Server failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}
