use clap::{Parser, Subcommand};
use futures::StreamExt;
use netwatch_observer::connectivity::observer::ConnectivityObserver;
use netwatch_observer::connectivity::state::ReachabilityState;
use netwatch_platform::{ProbeConfig, ProbeConnectivitySource};
use serde::Serialize;
use std::process;
use std::sync::Arc;
use std::time::Duration;

/// A CLI tool that reports device network reachability.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Probe endpoint as a host:port socket address (repeatable;
    /// defaults to well-known public DNS resolvers)
    #[arg(long = "endpoint", value_name = "ADDR")]
    endpoints: Vec<String>,

    /// Milliseconds between probe rounds
    #[arg(long, default_value_t = 5000)]
    interval_ms: u64,

    /// Per-endpoint connect timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the current reachability once
    Status {
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Subscribe and print reachability as it changes
    Watch,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[derive(Serialize)]
struct StatusOutput {
    state: ReachabilityState,
    connected: bool,
    label: &'static str,
}

impl From<ReachabilityState> for StatusOutput {
    fn from(state: ReachabilityState) -> Self {
        Self {
            state,
            connected: state.is_connected(),
            label: state.label(),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ProbeConfig::new()
        .with_interval(Duration::from_millis(args.interval_ms))
        .with_connect_timeout(Duration::from_millis(args.timeout_ms));
    if !args.endpoints.is_empty() {
        config = config.with_endpoints(args.endpoints);
    }

    let source = Arc::new(ProbeConnectivitySource::spawn(config).await?);
    let observer = ConnectivityObserver::new(source);

    match args.command {
        Commands::Status { format } => {
            let state = observer.query_current().await;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&StatusOutput::from(state))?);
                }
                OutputFormat::Summary => {
                    println!("{}", state.label());
                }
            }
            Ok(())
        }
        Commands::Watch => {
            let mut changes = observer.observe().await?;
            while let Some(state) = changes.next().await {
                println!("{}", state.label());
            }
            Ok(())
        }
    }
}
