use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use lazyrest_core::{Body, Dispatcher, Method, Reply};
use lazyrest_server::{LazyRestServer, ServerConfig};
use lazyrest_store::FsDocumentStore;

use crate::cli::*;

/// Defaults, then the config file, then `--debug`.
pub fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    config.debug |= cli.debug;
    Ok(config)
}

pub fn run_command(command: Command, config: ServerConfig) -> anyhow::Result<ExitCode> {
    match command {
        Command::Serve(args) => cmd_serve(apply_serve_args(config, args)),
        Command::Request(args) => cmd_request(config, args),
    }
}

fn apply_serve_args(mut config: ServerConfig, args: ServeArgs) -> ServerConfig {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    if args.in_memory {
        config.storage.in_memory = true;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }
    config
}

fn cmd_serve(config: ServerConfig) -> anyhow::Result<ExitCode> {
    let server = LazyRestServer::new(config).context("cannot open document store")?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_request(config: ServerConfig, args: RequestArgs) -> anyhow::Result<ExitCode> {
    let data_dir = args.data_dir.clone().unwrap_or(config.storage.data_dir);
    let reply = execute_request(data_dir, &args)?;

    let code = reply.status.code().to_string();
    let status = match reply.status.code() {
        200..=299 => code.green().bold(),
        400..=499 => code.yellow().bold(),
        _ => code.red().bold(),
    };
    println!("{status} {} {}", args.method.to_uppercase().dimmed(), args.path);
    match reply.body {
        Body::Empty => {}
        Body::Json(document) => println!("{}", serde_json::to_string_pretty(&document)?),
        Body::Text(message) => println!("{message}"),
    }

    Ok(if reply.status.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Dispatch one request against the filesystem store at `data_dir`.
fn execute_request(data_dir: PathBuf, args: &RequestArgs) -> anyhow::Result<Reply> {
    let body = match (&args.data, &args.file) {
        (Some(data), _) => Some(data.clone().into_bytes()),
        (None, Some(file)) => Some(
            std::fs::read(file).with_context(|| format!("cannot read {}", file.display()))?,
        ),
        (None, None) => None,
    };

    let store = FsDocumentStore::open(&data_dir)
        .with_context(|| format!("cannot open data directory {}", data_dir.display()))?;
    let dispatcher = Dispatcher::new(Arc::new(store));
    let method = Method::parse(&args.method.to_uppercase());
    Ok(dispatcher.handle(&method, &args.path, body.as_deref()))
}
