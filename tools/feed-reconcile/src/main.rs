//! Feed Reconcile
//!
//! Drives one Mikiri reconciliation cycle from the command line:
//! tracked titles and candidate listings come in as JSON files, the
//! per-title decisions and the cycle report go out as JSON. Also
//! exposes the extractor, comparator, and similarity scorer directly
//! for poking at single titles.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use mikiri_classify::{ClassifierClient, ResolverClient};
use mikiri_core::engine::{CycleContext, DecisionEngine, EngineConfig};
use mikiri_core::extract::VersionExtractor;
use mikiri_core::scoring::SimilarityScorer;
use mikiri_core::types::{CandidateListing, TrackedTitle};
use tracing::info;

/// CLI arguments
#[derive(Parser)]
#[command(name = "feed-reconcile")]
#[command(about = "Run a Mikiri reconciliation cycle over JSON fixtures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Classifier endpoint; unset runs the heuristic-only path
    #[arg(long, env = "MIKIRI_CLASSIFIER_URL")]
    classifier: Option<String>,

    /// Catalogue resolver base URL
    #[arg(long, env = "MIKIRI_RESOLVER_URL")]
    resolver: Option<String>,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one cycle: tracked titles against candidate listings
    Run {
        /// Tracked titles JSON file
        tracked: PathBuf,
        /// Candidate listings JSON file
        candidates: PathBuf,
        /// Write the mutated tracked titles back to this file
        #[arg(short, long)]
        save: Option<PathBuf>,
        /// Auto-track detected sequels
        #[arg(long)]
        auto_track: bool,
    },
    /// Extract the structured version signal from one raw title
    Extract {
        /// Raw listing title
        title: String,
    },
    /// Compare two raw titles through the extractor and comparator
    Compare {
        /// Current release title
        current: String,
        /// Candidate listing title
        candidate: String,
    },
    /// Score the similarity of two titles
    Similarity {
        /// First title
        a: String,
        /// Second title
        b: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            ref tracked,
            ref candidates,
            ref save,
            auto_track,
        } => {
            run_cycle(
                &cli,
                tracked,
                candidates,
                save.as_deref(),
                auto_track,
            )
            .await
        }
        Commands::Extract { ref title } => extract(&cli, title),
        Commands::Compare {
            ref current,
            ref candidate,
        } => compare(&cli, current, candidate),
        Commands::Similarity { ref a, ref b } => similarity(a, b),
    }
}

async fn run_cycle(
    cli: &Cli,
    tracked_path: &std::path::Path,
    candidates_path: &std::path::Path,
    save: Option<&std::path::Path>,
    auto_track: bool,
) -> Result<()> {
    let tracked_raw = fs::read_to_string(tracked_path)
        .with_context(|| format!("failed to read tracked titles from {}", tracked_path.display()))?;
    let mut titles: Vec<TrackedTitle> =
        serde_json::from_str(&tracked_raw).context("tracked titles file is not valid JSON")?;

    let candidates_raw = fs::read_to_string(candidates_path).with_context(|| {
        format!(
            "failed to read candidate listings from {}",
            candidates_path.display()
        )
    })?;
    let candidates: Vec<CandidateListing> =
        serde_json::from_str(&candidates_raw).context("candidate listings file is not valid JSON")?;

    info!(
        titles = titles.len(),
        candidates = candidates.len(),
        "starting reconciliation cycle"
    );

    let config = EngineConfig::default().with_auto_track_sequels(auto_track);
    let classifier = cli
        .classifier
        .as_deref()
        .map(ClassifierClient::new)
        .transpose()?;
    let resolver = cli
        .resolver
        .as_deref()
        .map(ResolverClient::new)
        .transpose()?;
    let engine: DecisionEngine<ClassifierClient, ResolverClient> =
        DecisionEngine::with_services(config, classifier, resolver)?;

    let mut ctx = CycleContext::new(Utc::now());
    let decisions = engine.run_cycle(&mut titles, &candidates, &mut ctx).await;

    let output = serde_json::json!({
        "report": ctx.report,
        "decisions": decisions,
    });
    print_json(cli, &output)?;

    if let Some(path) = save {
        let body = serde_json::to_string_pretty(&titles)?;
        fs::write(path, body)
            .with_context(|| format!("failed to write updated titles to {}", path.display()))?;
        info!(path = %path.display(), "updated tracked titles written");
    }
    Ok(())
}

fn extract(cli: &Cli, title: &str) -> Result<()> {
    let extractor = VersionExtractor::new()?;
    let info = extractor.extract(title);
    print_json(cli, &serde_json::to_value(&info)?)
}

fn compare(cli: &Cli, current: &str, candidate: &str) -> Result<()> {
    let extractor = VersionExtractor::new()?;
    let current_info = extractor.extract(current);
    let candidate_info = extractor.extract(candidate);
    let verdict = mikiri_core::compare(&current_info, &candidate_info, Utc::now().date_naive());

    let output = serde_json::json!({
        "current": current_info,
        "candidate": candidate_info,
        "comparison": verdict,
    });
    print_json(cli, &output)
}

fn similarity(a: &str, b: &str) -> Result<()> {
    let scorer = SimilarityScorer::new()?;
    let normalizer = scorer.normalizer();
    println!(
        "{:.3}  ({:?} vs {:?})",
        scorer.score(a, b),
        normalizer.normalize(a),
        normalizer.normalize(b)
    );
    Ok(())
}

fn print_json(cli: &Cli, value: &serde_json::Value) -> Result<()> {
    if cli.pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}
