use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use wallet_forensics::blockchain::{ExplorerClient, SnapshotSource};
use wallet_forensics::{DatasetState, ForensicsConfig, ForensicsEngine, Result, TransactionSource};

/// Wallet forensics: relationship trees, risk classification and activity metrics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serve transactions from a snapshot file instead of the explorer API
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify addresses against the flagged dataset
    Check {
        #[arg(required = true)]
        addresses: Vec<String>,
        #[arg(long)]
        chain: Option<String>,
    },
    /// Build the two-level relationship tree of an address
    Tree {
        address: String,
        #[arg(long)]
        chain: Option<String>,
    },
    /// Relationship tree coloured by classification
    Graph {
        address: String,
        #[arg(long)]
        chain: Option<String>,
        /// Emit Graphviz DOT instead of JSON
        #[arg(long)]
        dot: bool,
    },
    /// Metrics over an address's transaction history
    Metrics {
        address: String,
        #[arg(long)]
        chain: Option<String>,
    },
    /// Full report: classification, metrics and analyzer findings
    Report {
        address: String,
        #[arg(long)]
        chain: Option<String>,
        /// Print JSON instead of the terminal report
        #[arg(long)]
        json: bool,
    },
    /// Match addresses against known origins
    Origins {
        #[arg(required = true)]
        addresses: Vec<String>,
        #[arg(long)]
        chain: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose { "wallet_forensics=debug" } else { "wallet_forensics=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ForensicsConfig::load(cli.config.as_deref())?;

    let source: Arc<dyn TransactionSource> = match &cli.snapshot {
        Some(path) => Arc::new(SnapshotSource::load(path)?),
        None => Arc::new(ExplorerClient::new(&config)?),
    };
    let dataset = DatasetState::load(&config.dataset);
    let engine = ForensicsEngine::new(source, dataset, config).with_default_analyzers();

    match cli.command {
        Command::Check { addresses, chain } => {
            let results = engine.classify_addresses(&addresses, chain.as_deref()).await;
            print_json(&results)?;
        }
        Command::Tree { address, chain } => {
            let tree = engine.build_family_tree(&address, chain.as_deref()).await?;
            print_json(&tree)?;
        }
        Command::Graph { address, chain, dot } => {
            let graph = engine.risk_graph(&address, chain.as_deref()).await?;
            if dot {
                print!("{}", graph.to_dot());
            } else {
                print_json(&graph)?;
            }
        }
        Command::Metrics { address, chain } => {
            let fetch = engine.fetch_history(&address, chain.as_deref()).await?;
            let bundle = engine.compute_metrics(&address, &fetch.transactions)?;
            print_json(&bundle)?;
        }
        Command::Report { address, chain, json } => {
            let report = engine.analyze_address(&address, chain.as_deref()).await?;
            if json {
                print_json(&report)?;
            } else {
                println!("{}", report);
            }
        }
        Command::Origins { addresses, chain } => {
            let reports = engine.check_origins(&addresses, chain.as_deref()).await;
            print_json(&reports)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
