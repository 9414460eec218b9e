use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lazyrest",
    about = "Lazy REST: a schemaless, hierarchical JSON document store over HTTP",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "LAZY_REST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true, env = "LAZY_REST_DEBUG")]
    pub debug: bool,

    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Run one request against a data directory without a server
    Request(RequestArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Port to listen on, keeping the configured host
    #[arg(short, long, env = "LAZY_REST_PORT")]
    pub port: Option<u16>,
    /// Keep documents in memory only
    #[arg(long, env = "LAZY_REST_IN_MEMORY")]
    pub in_memory: bool,
    /// Directory holding the documents
    #[arg(long, env = "LAZY_REST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct RequestArgs {
    /// Request method, e.g. GET or PUT
    pub method: String,
    /// Request path, e.g. /users/42
    pub path: String,
    /// Inline JSON body
    #[arg(short, long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read the body from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Directory holding the documents
    #[arg(long, env = "LAZY_REST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}
