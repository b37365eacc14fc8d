use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use wallet_forensics::blockchain::{ExplorerClient, SnapshotSource};
use wallet_forensics::{DatasetState, ForensicsConfig, ForensicsEngine, RiskStatus, TransactionSource};

/// Wallet Forensics - Check a single address against the flagged dataset
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to check
    #[arg(value_name = "ADDRESS")]
    address: String,

    /// Restrict evidence lookups to one chain
    #[arg(long)]
    chain: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve transactions from a snapshot file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("wallet_forensics=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("wallet_forensics=warn")
            .with_writer(std::io::stderr)
            .init();
    }

    println!("\n🔍 Wallet Forensics Address Check");
    println!("==================================\n");
    println!("🎯 Address: {}", args.address);

    let config = ForensicsConfig::load(args.config.as_deref())?;
    let source: Arc<dyn TransactionSource> = match &args.snapshot {
        Some(path) => Arc::new(SnapshotSource::load(path)?),
        None => Arc::new(ExplorerClient::new(&config)?),
    };
    let dataset = DatasetState::load(&config.dataset);
    if let Ok(dataset) = dataset.ready() {
        println!(
            "📂 Dataset: {} records, {} flagged addresses\n",
            dataset.record_count(),
            dataset.flagged_addresses().len()
        );
    }

    let engine = ForensicsEngine::new(source, dataset, config);
    let results = engine
        .classify_addresses(std::slice::from_ref(&args.address), args.chain.as_deref())
        .await;

    let Some(result) = results.into_iter().next() else {
        std::process::exit(3);
    };

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║                    VERDICT                           ║");
    println!("╚══════════════════════════════════════════════════════╝\n");
    println!("{} {}", result.status.emoji(), result.status);
    println!("💬 {}\n", result.description);

    if let Some(related) = &result.related_addresses {
        if args.verbose {
            println!("👥 Grandparent: {}", related.grandparent);
            for parent in &related.parents {
                println!("   • Parent: {}", parent);
            }
            for child in &related.children {
                println!("   • Child: {}", child);
            }
            println!();
        }
    }

    // Exit code: 0 = pass, 1 = fail, 2 = warning, 3 = error
    let code = match result.status {
        RiskStatus::Pass => 0,
        RiskStatus::Fail => 1,
        RiskStatus::Warning => 2,
        RiskStatus::Error => 3,
    };
    std::process::exit(code);
}
