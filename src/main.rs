use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use courtseer::config::{self, EngineConfig};
use courtseer::engine::{ConsensusEngine, Prediction};
use courtseer::fact_pack::FactPack;
use courtseer::monitoring::AuditLog;
use courtseer::oracle::OracleResponse;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at DEBUG instead of INFO
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the oracle council about one game and print the decision
    Evaluate {
        /// Fact pack JSON for the game
        #[arg(long)]
        fact_pack: PathBuf,
        /// Run in simulation mode (offline oracles, no API calls)
        #[arg(long)]
        sim: bool,
        /// Engine policy JSON (quorum, thresholds, unresolved policy)
        #[arg(long)]
        engine_config: Option<PathBuf>,
        /// Do not append the result to the audit trail
        #[arg(long)]
        no_audit: bool,
    },
    /// Decide offline from recorded oracle responses
    Decide {
        #[arg(long)]
        fact_pack: PathBuf,
        /// JSON array of {"sourceId", "text"} objects
        #[arg(long)]
        responses: PathBuf,
        #[arg(long)]
        engine_config: Option<PathBuf>,
    },
    /// Check which oracles are configured
    Init,
    /// Print the audit trail
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Starting CourtSeer - AI consensus decision engine");

    match cli.command {
        Some(Commands::Evaluate {
            fact_pack,
            sim,
            engine_config,
            no_audit,
        }) => {
            if sim {
                info!("Running in SIMULATION mode - no oracle API calls will be made");
            }
            run_evaluate(&fact_pack, sim, engine_config.as_deref(), no_audit).await?;
        }
        Some(Commands::Decide {
            fact_pack,
            responses,
            engine_config,
        }) => {
            run_decide(&fact_pack, &responses, engine_config.as_deref())?;
        }
        Some(Commands::Init) => {
            info!("Initializing CourtSeer configuration...");
            config::initialize_config().await?;
        }
        Some(Commands::History) => {
            let config = config::load_config().await?;
            let audit = AuditLog::new(Some(config.audit_log_dir.as_path()))?;
            let history = audit.history().await?;
            info!("{} predictions in {:?}", history.len(), audit.path());
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        None => {
            info!("No command specified. Use --help for available commands.");
        }
    }

    Ok(())
}

async fn run_evaluate(
    fact_pack_path: &Path,
    simulation_mode: bool,
    engine_config: Option<&Path>,
    no_audit: bool,
) -> Result<()> {
    info!("Loading configuration...");
    let mut config = config::load_config().await?;
    if let Some(path) = engine_config {
        config.engine = EngineConfig::from_file(path)?;
    }

    let fact_pack = load_fact_pack(fact_pack_path)?;

    let council = if simulation_mode {
        config.build_simulated_council(&fact_pack)
    } else {
        config.build_council()
    };
    if council.is_empty() {
        warn!("No oracles configured; the prediction will use the home court fallback");
    }

    let engine = ConsensusEngine::new(&config.engine);
    let prediction = engine.predict(&council, &fact_pack).await;

    if !no_audit {
        let audit = AuditLog::new(Some(config.audit_log_dir.as_path()))?;
        audit.record(&fact_pack, &prediction).await?;
    }

    print_prediction(&prediction)
}

fn run_decide(fact_pack_path: &Path, responses_path: &Path, engine_config: Option<&Path>) -> Result<()> {
    let engine_config = match engine_config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let fact_pack = load_fact_pack(fact_pack_path)?;

    let raw = std::fs::read_to_string(responses_path)
        .with_context(|| format!("Failed to read responses at {:?}", responses_path))?;
    let responses: Vec<OracleResponse> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid responses JSON at {:?}", responses_path))?;
    info!("Deciding {} from {} recorded responses", fact_pack.matchup(), responses.len());

    let prediction = ConsensusEngine::new(&engine_config).evaluate(&fact_pack, &responses);
    print_prediction(&prediction)
}

fn load_fact_pack(path: &Path) -> Result<FactPack> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fact pack at {:?}", path))?;
    FactPack::from_json(&raw).with_context(|| format!("Invalid fact pack at {:?}", path))
}

fn print_prediction(prediction: &Prediction) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(prediction)?);
    Ok(())
}
