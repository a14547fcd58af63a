//! Emotion Recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use emotion_recorder::cli::{
    app::{build_run_options, load_merged_config, run, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use emotion_recorder::domain::config::AppConfig;
use emotion_recorder::infrastructure::XdgConfigStore;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "emotion_recorder=debug,info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let presenter = Presenter::new();

    // Handle subcommands
    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Build CLI config from args
    let cli_config = AppConfig {
        endpoint: cli.endpoint,
        timeout: cli.timeout,
        max_duration: cli.max_duration,
        chunk_interval: None,
    };

    // Merge config
    let config = load_merged_config(cli_config).await;
    tracing::debug!(?config, "effective configuration");

    let options = match build_run_options(&config, cli.input, cli.once) {
        Ok(options) => options,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    run(options).await
}
