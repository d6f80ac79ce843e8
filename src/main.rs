use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use driftwatch::{
    seed, CentroidProfileTrainer, DriftMonitor, EventFile, EventLog, LmdbStorage, MonitorConfig, RestConfig,
    RestStore, SeedPlan, VectorStore,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Embedding drift monitor: compare recent vectors against a reference
/// window, retrain on drift, and keep an audit trail
#[derive(Parser, Debug)]
#[command(name = "driftwatch", version)]
#[command(about = "Detect embedding drift and retrain on it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Where embeddings are read from and events written to
    #[arg(long, env = "DRIFTWATCH_BACKEND", value_enum, default_value_t = Backend::Lmdb, global = true)]
    backend: Backend,

    /// Path to the LMDB data directory
    #[arg(short, long, env = "DRIFTWATCH_DATA_DIR", default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// PostgREST / Supabase project URL (rest backend)
    #[arg(long, env = "SUPABASE_URL", global = true)]
    supabase_url: Option<String>,

    /// PostgREST / Supabase API key (rest backend)
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true, global = true)]
    supabase_key: Option<String>,

    /// Log level
    #[arg(long, env = "DRIFTWATCH_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one evaluation cycle (the default)
    Run(RunArgs),
    /// Insert a synthetic reference batch and a shifted recent batch
    Seed(SeedArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    Lmdb,
    Rest,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Drift scores strictly above this trigger retraining
    #[arg(long, env = "DRIFTWATCH_THRESHOLD", default_value_t = driftwatch_monitor::config::DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Width of the recent window in days
    #[arg(long, env = "DRIFTWATCH_DAYS_AGO", default_value_t = driftwatch_monitor::config::DEFAULT_DAYS_AGO)]
    days_ago: u32,

    /// Maximum reference vectors per cycle (0 reads all of them)
    #[arg(long, env = "DRIFTWATCH_REFERENCE_LIMIT", default_value_t = driftwatch_monitor::config::DEFAULT_REFERENCE_LIMIT)]
    reference_limit: usize,

    /// Expected embedding dimensionality; mismatching rows abort the cycle
    #[arg(long, env = "DRIFTWATCH_VECTOR_DIM")]
    vector_dim: Option<usize>,

    /// Also record an event when no drift is found
    #[arg(long, env = "DRIFTWATCH_RECORD_STABLE")]
    record_stable: bool,

    /// Directory for trained model artifacts
    #[arg(long, env = "DRIFTWATCH_MODELS_DIR", default_value = "./models")]
    models_dir: PathBuf,

    /// Write events to this JSON-lines file instead of the backend
    #[arg(long, env = "DRIFTWATCH_EVENTS_FILE")]
    events_file: Option<PathBuf>,

    /// Seed for the trainer's train/holdout split
    #[arg(long, env = "DRIFTWATCH_TRAIN_SEED")]
    train_seed: Option<u64>,

    /// Print the cycle report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct SeedArgs {
    /// Vectors dated before the recent window
    #[arg(long, default_value_t = 50)]
    reference_count: usize,

    /// Vectors dated now
    #[arg(long, default_value_t = 20)]
    recent_count: usize,

    /// Component mean of the reference batch
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    reference_center: f64,

    /// Component mean of the recent batch
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    recent_center: f64,

    /// Standard deviation of every component
    #[arg(long, default_value_t = 0.1)]
    noise: f64,

    /// Embedding dimensionality
    #[arg(long, default_value_t = driftwatch_monitor::seeder::DEFAULT_VECTOR_DIM)]
    dim: usize,

    /// Age of the reference batch in days
    #[arg(long, default_value_t = 10)]
    reference_age_days: u32,

    /// RNG seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,
}

impl From<SeedArgs> for SeedPlan {
    fn from(args: SeedArgs) -> Self {
        SeedPlan {
            reference_count: args.reference_count,
            recent_count: args.recent_count,
            reference_center: args.reference_center,
            recent_center: args.recent_center,
            noise: args.noise,
            dim: args.dim,
            reference_age_days: args.reference_age_days,
        }
    }
}

/// The selected backend, shared between the store and event log roles
enum Storage {
    Lmdb(Arc<LmdbStorage>),
    Rest(Arc<RestStore>),
}

impl Storage {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        match cli.backend {
            Backend::Lmdb => {
                info!("Data directory: {:?}", cli.data_dir);
                let storage = LmdbStorage::new(&cli.data_dir)
                    .with_context(|| format!("opening LMDB store at {}", cli.data_dir.display()))?;
                Ok(Storage::Lmdb(Arc::new(storage)))
            }
            Backend::Rest => {
                let (Some(url), Some(key)) = (&cli.supabase_url, &cli.supabase_key) else {
                    bail!("the rest backend needs SUPABASE_URL and SUPABASE_KEY");
                };
                info!("REST endpoint: {}", url);
                let store = RestStore::new(RestConfig::new(url.as_str(), key.as_str()))
                    .context("configuring REST store")?;
                Ok(Storage::Rest(Arc::new(store)))
            }
        }
    }

    fn vectors(&self) -> Box<dyn VectorStore> {
        match self {
            Storage::Lmdb(s) => Box::new(Arc::clone(s)),
            Storage::Rest(s) => Box::new(Arc::clone(s)),
        }
    }

    fn events(&self) -> Box<dyn EventLog> {
        match self {
            Storage::Lmdb(s) => Box::new(Arc::clone(s)),
            Storage::Rest(s) => Box::new(Arc::clone(s)),
        }
    }
}

fn init_logging(log_level: &str) -> anyhow::Result<()> {
    // RUST_LOG takes precedence for per-target filtering
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        return Ok(());
    }

    let log_level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run(cli: &Cli, args: RunArgs) -> anyhow::Result<()> {
    let config = MonitorConfig {
        threshold: args.threshold,
        days_ago: args.days_ago,
        reference_limit: (args.reference_limit > 0).then_some(args.reference_limit),
        vector_dim: args.vector_dim,
        record_stable: args.record_stable,
    };

    let storage = Storage::open(cli)?;
    let events: Box<dyn EventLog> = match &args.events_file {
        Some(path) => Box::new(
            EventFile::open(path).with_context(|| format!("opening event file {}", path.display()))?,
        ),
        None => storage.events(),
    };

    let mut trainer = CentroidProfileTrainer::new(&args.models_dir);
    if let Some(seed) = args.train_seed {
        trainer = trainer.with_seed(seed);
    }

    let monitor =
        DriftMonitor::new(config, storage.vectors(), events, trainer).context("invalid monitor configuration")?;
    let report = monitor.run_cycle().context("drift cycle aborted")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Drift score: {} (threshold {}, reference={}, recent={})",
            report.decision.score, report.threshold, report.reference_count, report.recent_count
        );
        println!("Result: {}", report.disposition);
    }
    Ok(())
}

fn seed_store(cli: &Cli, args: SeedArgs) -> anyhow::Result<()> {
    let rng_seed = args.seed;
    let plan = SeedPlan::from(args);
    let mut rng = match rng_seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };

    let storage = Storage::open(cli)?;
    let summary = seed(&storage.vectors(), &plan, Utc::now(), &mut rng).context("seeding store")?;

    println!(
        "Inserted {} reference and {} recent embeddings ({} dimensions)",
        summary.reference, summary.recent, plan.dim
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    init_logging(&cli.log_level)?;

    info!("Starting driftwatch v{}", env!("CARGO_PKG_VERSION"));

    let command = match cli.command.take() {
        Some(command) => command,
        None => Command::Run(RunArgs::parse_from([env!("CARGO_PKG_NAME")])),
    };

    match command {
        Command::Run(args) => run(&cli, args),
        Command::Seed(args) => seed_store(&cli, args),
    }
}
