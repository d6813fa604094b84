use std::process::ExitCode;

use clap::Parser;

mod commands;
mod config;
mod error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = commands::Cli::parse();
    let settings = match config::load(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "spendsmart={level},client={level},stub_server={level}",
            level = settings.log_level
        ))
        .with_writer(std::io::stderr)
        .init();

    match commands::run(cli.command, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("command failed: {err:?}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
