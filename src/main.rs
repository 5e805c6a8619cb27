use clap::Parser;
use std::process::ExitCode;
use vitrine::cli::Cli;
use vitrine_config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = vitrine::logging::init(cli.log_level.as_deref()) {
        eprintln!("vitrine: {err:?}");
        return ExitCode::FAILURE;
    }
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = ?err, "Could not load configuration");
            return ExitCode::FAILURE;
        },
    };
    match vitrine::serve(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "Release proxy failed");
            ExitCode::FAILURE
        },
    }
}
