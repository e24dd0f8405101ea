use clap::Parser;
use teachrag::cli::*;
use teachrag::config::AppConfig;
use teachrag::Result;
use tracing::error;
use tracing::info;

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => {
            let mut config = AppConfig::from_file(path)?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => AppConfig::load(),
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Serve {
            host,
            port,
            cors,
            live,
        } => handle_serve_api(&config, host, port, cors, live).await,
        Commands::Ingest { user, source } => handle_ingest_command(&config, &user, source).await,
        Commands::Ask {
            user,
            question,
            show_context,
        } => handle_ask_command(&config, &user, &question, show_context).await,
        Commands::IndexName { user } => handle_index_name_command(&user),
        Commands::Config => handle_config_command(&config),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(&cli)?;

    // Initialize logging
    if cli.verbose {
        teachrag::logging::init_logging_with_level("debug")?;
    } else {
        teachrag::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    if let Err(e) = run(cli, config).await {
        error!("{}", e);
        print_error(&e.to_string());
        std::process::exit(1);
    }

    Ok(())
}
