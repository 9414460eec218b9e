use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;

fn main() -> anyhow::Result<ExitCode> {
    let cli = cli::Cli::parse();
    let config = commands::load_config(&cli)?;
    init_tracing(config.debug, cli.log_format);
    commands::run_command(cli.command, config)
}

fn init_tracing(debug: bool, format: cli::LogFormat) {
    let level = if debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let builder = tracing_subscriber::fmt().with_max_level(level);
    match format {
        cli::LogFormat::Text => builder.init(),
        cli::LogFormat::Json => builder.json().init(),
    }
}
