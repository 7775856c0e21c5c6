use clap::Parser;
use plc::utils::{logger, validation::Validate};
use plc::{CliConfig, CompilerEngine, LocalStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting plcc");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }

    let store = LocalStore::new();
    let engine = CompilerEngine::new(store, config);

    match engine.run().await {
        Ok(outcome) => {
            println!("{}", outcome);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Compilation failed: {} (category: {:?})", e, e.category());
            eprintln!("error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
