// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use ucic_resolver::{
    run_files, BatchReport, ClusterStrategy, ResolverConfig, RunPaths, SimilarityMetric,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve incoming records against the master registry
    Match {
        #[arg(long)]
        master: PathBuf,
        #[arg(long)]
        incoming: PathBuf,
        #[arg(long, default_value = "output")]
        out: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Find duplicate clusters in the master registry
    Dedupe {
        #[arg(long)]
        master: PathBuf,
        #[arg(long, default_value = "output")]
        out: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Match and dedupe in one run
    Run {
        #[arg(long)]
        master: PathBuf,
        #[arg(long)]
        incoming: PathBuf,
        #[arg(long, default_value = "output")]
        out: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Run both steps and browse the results in the terminal
    Review {
        #[arg(long)]
        master: PathBuf,
        #[arg(long)]
        incoming: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

/// Config file plus flag overrides
#[derive(Args)]
struct PolicyArgs {
    /// JSON config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    name_threshold: Option<f64>,

    #[arg(long)]
    org_threshold: Option<f64>,

    #[arg(long)]
    duplicate_threshold: Option<f64>,

    #[arg(long, value_enum)]
    metric: Option<MetricArg>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Abort clustering after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Resolve records one at a time instead of on the thread pool
    #[arg(long)]
    sequential: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    JaroWinkler,
    Indel,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Transitive,
    ForwardScan,
}

impl PolicyArgs {
    fn resolve(&self) -> Result<ResolverConfig> {
        let mut config = ResolverConfig::load(self.config.as_deref())?;

        if let Some(t) = self.name_threshold {
            config.matching.name_threshold = t;
        }
        if let Some(t) = self.org_threshold {
            config.matching.organization_threshold = t;
        }
        if let Some(t) = self.duplicate_threshold {
            config.clustering.duplicate_threshold = t;
        }
        if let Some(metric) = self.metric {
            let metric = match metric {
                MetricArg::JaroWinkler => SimilarityMetric::JaroWinkler,
                MetricArg::Indel => SimilarityMetric::Indel,
            };
            config.matching.metric = metric;
            config.clustering.metric = metric;
        }
        if let Some(strategy) = self.strategy {
            config.clustering.strategy = match strategy {
                StrategyArg::Transitive => ClusterStrategy::Transitive,
                StrategyArg::ForwardScan => ClusterStrategy::ForwardScan,
            };
        }
        if self.timeout.is_some() {
            config.clustering.timeout_secs = self.timeout;
        }
        if self.sequential {
            config.matching.parallel = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    match cli.command {
        Command::Match { master, incoming, out, policy } => {
            run_mode("🔗 UCIC Matching", &master, Some(incoming.as_path()), &out, false, &policy)
        }
        Command::Dedupe { master, out, policy } => {
            run_mode("🔍 Duplicate Detection", &master, None, &out, true, &policy)
        }
        Command::Run { master, incoming, out, policy } => {
            run_mode("🚀 UCIC Matching + Duplicate Detection", &master, Some(incoming.as_path()), &out, true, &policy)
        }
        Command::Review { master, incoming, policy } => run_review(&master, &incoming, &policy),
    }
}

fn run_mode(
    title: &str,
    master: &Path,
    incoming: Option<&Path>,
    out: &Path,
    dedupe: bool,
    policy: &PolicyArgs,
) -> Result<()> {
    println!("{}", title);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = policy.resolve()?;

    println!("\n📂 Loading data...");
    let paths = RunPaths { master, incoming, out_dir: out, dedupe };
    let report = run_files(&paths, &config)?;

    print_report(&report);

    println!("\n💾 Output written to {}", out.display());
    for path in &report.outputs {
        println!("   {}", path.display());
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Run {} complete", report.run_id);

    Ok(())
}

fn print_report(report: &BatchReport) {
    println!("✓ Master: {}", report.master_quality.summary());
    if let Some(quality) = &report.incoming_quality {
        println!("✓ Incoming: {}", quality.summary());
    }
    if let Some(registry) = &report.registry {
        println!(
            "✓ Registry: {} records ({} persons, {} organizations, {} without UCIC skipped)",
            registry.records, registry.persons, registry.organizations, registry.unassigned
        );
    }

    if let Some(matching) = &report.matching {
        println!("\n✅ Matching complete.");
        println!("🔍 Matched: {}", matching.resolved);
        println!("   PAN:        {}", matching.by_primary_id);
        println!("   Aadhar+DOB: {}", matching.by_secondary_id);
        println!("   Name+DOB:   {}", matching.by_name);
        println!("   Org+DOB:    {}", matching.by_organization);
        println!("❌ Unmatched: {}", matching.unresolved);
    }

    if let Some(clusters) = &report.clustering {
        println!("\n✅ Clustering complete.");
        println!(
            "👥 Person clusters: {} (from {} candidates)",
            clusters.person.len(),
            clusters.person_candidates
        );
        println!(
            "🏢 Organization clusters: {} (from {} candidates)",
            clusters.organization.len(),
            clusters.organization_candidates
        );
        println!("   Records in clusters: {}", clusters.total_members());
    }
}

#[cfg(feature = "tui")]
fn run_review(master: &Path, incoming: &Path, policy: &PolicyArgs) -> Result<()> {
    use ucic_resolver::{load_party_rows, normalize_all, run_batch};

    println!("🖥️  Loading UCIC review...\n");

    let config = policy.resolve()?;
    let (_, master_rows) = load_party_rows(master)?;
    let (_, incoming_rows) = load_party_rows(incoming)?;

    let report = run_batch(&master_rows, Some(&incoming_rows), true, &config)?;
    print_report(&report);

    println!("\nStarting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(&report, &normalize_all(&master_rows), &normalize_all(&incoming_rows));
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_review(_master: &Path, _incoming: &Path, _policy: &PolicyArgs) -> Result<()> {
    eprintln!("❌ Review mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: ucic-resolver run --master <FILE> --incoming <FILE>");
    std::process::exit(1);
}
