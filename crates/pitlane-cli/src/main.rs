//! Pitlane CLI - fantasy motorsport league scoring
//!
//! The `pitlane` command scores race weekends and regenerates standings.
//!
//! ## Commands
//!
//! - `score`: Score a race file, update circuit records, archive the outcome
//! - `standings`: Rebuild standings from the archived outcomes
//! - `normalize`: Show the canonical key of athlete names
//! - `records`: Show stored circuit track records

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pitlane_core::metrics::METRICS;
use pitlane_core::reporting::{render_race_md, render_standings_md, to_json};
use pitlane_core::{
    archive_outcome, init_tracing, load_outcomes, Discipline, LeagueConfig, LogFormat, RaceInput,
    ScoringPipeline, StandingsAggregator, StandingsScope,
};
use pitlane_state::fs::{FsCircuitRecordStore, FsRaceLedger};
use pitlane_state::CircuitRecordStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "pitlane")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fantasy motorsport league scoring", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// League configuration file (TOML)
    #[arg(long, global = true, env = "PITLANE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding circuit records and the race ledger
    #[arg(long, global = true, env = "PITLANE_DATA_DIR", default_value = ".pitlane")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a race weekend and archive the outcome
    Score {
        /// Race input file (JSON)
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,

        /// Score without writing the outcome to the ledger
        #[arg(long)]
        no_archive: bool,
    },

    /// Rebuild season standings from the ledger
    Standings {
        /// Discipline to rank (default: both disciplines combined)
        #[arg(short, long)]
        discipline: Option<Discipline>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: OutputFormat,
    },

    /// Print the canonical key of each name
    Normalize {
        /// Discipline whose keying mode and corrections apply
        #[arg(short, long, default_value = "formula")]
        discipline: Discipline,

        /// Names to normalize
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show stored circuit track records
    Records {
        /// Only this circuit
        circuit: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(format, level);

    let config = load_config(cli.config.as_deref())?;
    let data_dir = cli.data_dir;

    let result = match cli.command {
        Commands::Score {
            input,
            format,
            no_archive,
        } => cmd_score(&config, &data_dir, &input, format, !no_archive).await,
        Commands::Standings { discipline, format } => {
            cmd_standings(&config, &data_dir, discipline, format).await
        }
        Commands::Normalize { discipline, names } => cmd_normalize(&config, discipline, &names),
        Commands::Records { circuit } => cmd_records(&data_dir, circuit.as_deref()).await,
    };

    METRICS.flush();
    result
}

fn load_config(path: Option<&Path>) -> Result<LeagueConfig> {
    match path {
        Some(path) => LeagueConfig::load(path)
            .with_context(|| format!("Failed to load league config {}", path.display())),
        None => Ok(LeagueConfig::default()),
    }
}

fn record_store(data_dir: &Path) -> FsCircuitRecordStore {
    FsCircuitRecordStore::new(data_dir.join("records.json"))
}

fn ledger(data_dir: &Path) -> Result<FsRaceLedger> {
    let root = data_dir.join("ledger");
    FsRaceLedger::new(&root).with_context(|| format!("Failed to open ledger at {}", root.display()))
}

/// Score one race file
async fn cmd_score(
    config: &LeagueConfig,
    data_dir: &Path,
    input: &Path,
    format: OutputFormat,
    archive: bool,
) -> Result<()> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read race file {}", input.display()))?;
    let race: RaceInput = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid race file {}", input.display()))?;

    let profile = config.profile(race.discipline);
    let pipeline = ScoringPipeline::new(Arc::new(record_store(data_dir)));
    let outcome = pipeline
        .score_race(&race, &profile)
        .await
        .with_context(|| format!("Failed to score race {}", race.race_id))?;

    if archive {
        let ledger = ledger(data_dir)?;
        archive_outcome(&ledger, &outcome)
            .await
            .context("Failed to archive race outcome")?;
        info!(race_id = %outcome.race_id, discipline = %outcome.discipline, "outcome archived");
    }

    match format {
        OutputFormat::Markdown => print!("{}", render_race_md(&outcome)),
        OutputFormat::Json => print!("{}", to_json(&outcome)?),
    }
    Ok(())
}

/// Regenerate standings from every archived outcome
async fn cmd_standings(
    config: &LeagueConfig,
    data_dir: &Path,
    discipline: Option<Discipline>,
    format: OutputFormat,
) -> Result<()> {
    let ledger = ledger(data_dir)?;
    let outcomes = load_outcomes(&ledger, discipline)
        .await
        .context("Failed to read the race ledger")?;

    let scope = match discipline {
        Some(d) => StandingsScope::Discipline(d),
        None => StandingsScope::Combined,
    };
    let aggregator = StandingsAggregator::new(config.league.teams.iter().cloned());
    let table = aggregator.compute(scope, &outcomes)?;

    match format {
        OutputFormat::Markdown => {
            print!("{}", render_standings_md(&table));
            println!();
            println!("Races: {}", outcomes.len());
            println!("Digest: {}", table.digest()?);
        }
        OutputFormat::Json => print!("{}", to_json(&table)?),
    }
    Ok(())
}

/// Show the canonical key of each name
fn cmd_normalize(config: &LeagueConfig, discipline: Discipline, names: &[String]) -> Result<()> {
    let profile = config.profile(discipline);
    for name in names {
        let key = profile.normalizer.normalize(name);
        if key.is_empty() {
            println!("{name:?} -> (empty)");
        } else {
            println!("{name:?} -> {key}");
        }
    }
    Ok(())
}

/// Show circuit records
async fn cmd_records(data_dir: &Path, circuit: Option<&str>) -> Result<()> {
    let store = record_store(data_dir);
    let records = match circuit {
        Some(id) => match store.get(id).await? {
            Some(record) => vec![record],
            None => bail!("No records stored for circuit '{}'", id),
        },
        None => store.list().await?,
    };

    if records.is_empty() {
        println!("No circuit records in {}", store.path().display());
        return Ok(());
    }

    for record in records {
        println!("circuit {}", record.circuit_id);
        for (label, lap) in [("qualifying", &record.qualifying), ("race", &record.race)] {
            match lap {
                Some(lap) => println!(
                    "  {label:<10} {} ms  {} ({}, {})",
                    lap.time_ms,
                    lap.athlete,
                    lap.race_id,
                    lap.set_at.format("%Y-%m-%d")
                ),
                None => println!("  {label:<10} -"),
            }
        }
    }
    Ok(())
}
