//! Photo Seed CLI
//!
//! Derives coin flips, lucky digits and integer ranges from photos, runs a
//! full capture cycle against a photo file, the mock camera or (with the
//! `camera` feature) a real device, and manages the saved moment history.

use clap::{Args, Parser, Subcommand, ValueEnum};
use photo_seed::{
    capture::{
        CameraCapture, CapturedPhoto, ConfigError, FileCamera, FileConfig, MockCamera, PhotoArea,
        PhotoError, StorageConfig,
    },
    lifecycle::{
        CaptureLifecycle, CoinFlipMode, Collaborators, CycleError, GrantAll, LuckyDigitsMode,
        ModeStrategy, SaveOutcome, SeedResult, StatusMessage, UiFeedback,
    },
    metrics::{MetricsError, MetricsRegistry, MetricsSnapshot},
    seed::{SeedError, SeedGenerator},
    store::{result_line, MomentRepository, MomentStore, StoreError},
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "photo-seed", version)]
#[command(about = "Deterministic coin flips and lucky digits from photographs")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides storage.data_dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flip a coin seeded by a photo
    Flip {
        /// Photo file
        photo: PathBuf,
    },
    /// Draw lucky digits seeded by a photo
    Digits {
        /// Photo file
        photo: PathBuf,
        /// Number of digits
        #[arg(short, long, default_value_t = 6)]
        length: u32,
    },
    /// Draw integers in [lower, upper) seeded by a photo
    Range {
        /// Photo file
        photo: PathBuf,
        /// How many numbers to draw
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// Lower bound (inclusive)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        lower: i64,
        /// Upper bound (exclusive)
        #[arg(long, default_value_t = 1 << 32, allow_hyphen_values = true)]
        upper: i64,
        /// Also print heads/tails for each number
        #[arg(long)]
        coin_flip: bool,
    },
    /// Print the seed digest of a photo
    Digest {
        /// Photo file
        photo: PathBuf,
    },
    /// Run one capture cycle
    Capture(CaptureArgs),
    /// Browse and edit saved moments
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Result mode
    #[arg(long, value_enum, default_value_t = ModeArg::Coin)]
    mode: ModeArg,

    /// Digit count for the digits mode
    #[arg(short, long, default_value = "6")]
    length: String,

    /// Use this photo file as the camera
    #[arg(long, conflicts_with = "mock")]
    photo: Option<PathBuf>,

    /// Use the synthetic mock camera
    #[arg(long)]
    mock: bool,

    /// Save the result as a moment
    #[arg(long)]
    save: bool,

    /// Annotation stored with the moment
    #[arg(long, requires = "save")]
    annotation: Option<String>,

    /// Print lifecycle metrics in Prometheus format
    #[arg(long)]
    metrics: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Coin,
    Digits,
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// List saved moments, newest first
    List,
    /// Replace the annotation of a saved moment
    Annotate {
        /// Moment id
        id: String,
        /// New annotation
        text: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("photo error: {0}")]
    Photo(#[from] PhotoError),
    #[error("{0}")]
    Seed(#[from] SeedError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Cycle(#[from] CycleError),
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("digit count must be between 1 and {0}")]
    InvalidLength(u32),
    #[error("no camera selected: pass --photo or --mock")]
    NoCamera,
}

/// Terminal feedback: statuses go to stderr, results to stdout.
struct ConsoleUi {
    annotation: Option<String>,
}

#[async_trait::async_trait]
impl UiFeedback for ConsoleUi {
    fn show_status(&self, message: StatusMessage) {
        eprintln!("{}", message);
    }

    fn show_result(&self, result: &SeedResult) {
        println!("{}: {}", result.title(), result.value());
    }

    async fn prompt_annotation(&self, _max_chars: usize) -> Option<String> {
        Some(self.annotation.clone().unwrap_or_default())
    }

    fn set_save_available(&self, available: bool) {
        debug!(available, "Save availability changed");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    debug!("Photo Seed v{}", photo_seed::VERSION);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    config.validate()?;

    let generator = SeedGenerator::new(config.capture.hash_algorithm);

    match cli.command {
        Command::Flip { photo } => {
            let photo = CapturedPhoto::read(&photo)?;
            let result = SeedResult::coin_flip(generator.coin_flip(photo.bytes()));
            println!("{}", result.value());
        }
        Command::Digits { photo, length } => {
            let max = config.capture.max_lucky_digits;
            if !(1..=max).contains(&length) {
                return Err(CliError::InvalidLength(max));
            }
            let photo = CapturedPhoto::read(&photo)?;
            println!("{}", generator.lucky_digits(photo.bytes(), length as usize));
        }
        Command::Range {
            photo,
            count,
            lower,
            upper,
            coin_flip,
        } => {
            let photo = CapturedPhoto::read(&photo)?;
            let values = generator.draw_range(photo.bytes(), lower, upper, count)?;
            let digest = generator.derive_digest(photo.bytes());
            println!("Seed ({}): {}", generator.algorithm(), digest.to_hex());
            for value in values {
                if coin_flip {
                    let side = if value.rem_euclid(2) == 0 { "heads" } else { "tails" };
                    println!("{} -> {}", value, side);
                } else {
                    println!("{}", value);
                }
            }
        }
        Command::Digest { photo } => {
            let photo = CapturedPhoto::read(&photo)?;
            info!(
                width = photo.width(),
                height = photo.height(),
                bytes = photo.bytes().len(),
                "Photo decoded"
            );
            println!("{}", generator.derive_digest(photo.bytes()).to_hex());
        }
        Command::Capture(args) => capture(&config, args).await?,
        Command::History { action } => history(&config, action)?,
    }

    Ok(())
}

struct Paths {
    root: PathBuf,
    moments: PathBuf,
}

impl Paths {
    fn new(storage: &StorageConfig) -> Result<Self, CliError> {
        let root = storage.resolved_data_dir()?;
        let moments = storage.moments_path(&root);
        Ok(Self { root, moments })
    }

    fn saved_dir(&self) -> PathBuf {
        StorageConfig::saved_dir(&self.root)
    }

    fn temp_dir(&self) -> PathBuf {
        StorageConfig::temp_dir(&self.root)
    }
}

fn open_store(config: &FileConfig, paths: &Paths) -> MomentStore {
    MomentStore::new(&paths.moments)
        .with_saved_dir(paths.saved_dir())
        .with_annotation_limit(config.capture.max_annotation_chars)
}

fn select_camera(config: &FileConfig, args: &CaptureArgs) -> Result<Arc<dyn CameraCapture>, CliError> {
    if let Some(photo) = &args.photo {
        return Ok(Arc::new(FileCamera::new(photo)));
    }
    if args.mock {
        return Ok(Arc::new(MockCamera::new()));
    }
    native_camera(config)
}

#[cfg(feature = "camera")]
fn native_camera(config: &FileConfig) -> Result<Arc<dyn CameraCapture>, CliError> {
    Ok(Arc::new(photo_seed::capture::NativeCamera::new(&config.capture)))
}

#[cfg(not(feature = "camera"))]
fn native_camera(_config: &FileConfig) -> Result<Arc<dyn CameraCapture>, CliError> {
    Err(CliError::NoCamera)
}

async fn capture(config: &FileConfig, args: CaptureArgs) -> Result<(), CliError> {
    let paths = Paths::new(&config.storage)?;
    let store = Arc::new(open_store(config, &paths));
    let area = PhotoArea::new(
        paths.temp_dir(),
        paths.saved_dir(),
        config.storage.photo_prefix.clone(),
    );
    let collaborators = Collaborators {
        camera: select_camera(config, &args)?,
        permissions: Arc::new(GrantAll),
        ui: Arc::new(ConsoleUi {
            annotation: args.annotation.clone(),
        }),
    };

    info!(data_dir = %paths.root.display(), mode = ?args.mode, "Starting capture");

    match args.mode {
        ModeArg::Coin => {
            let lifecycle =
                CaptureLifecycle::new(CoinFlipMode, store.clone(), area, collaborators, &config.capture);
            run_cycle(lifecycle, store.as_ref(), &args).await
        }
        ModeArg::Digits => {
            let mut mode = LuckyDigitsMode::new(config.capture.max_lucky_digits);
            mode.set_requested(args.length.as_str());
            let lifecycle =
                CaptureLifecycle::new(mode, store.clone(), area, collaborators, &config.capture);
            run_cycle(lifecycle, store.as_ref(), &args).await
        }
    }
}

async fn run_cycle<M: ModeStrategy>(
    mut lifecycle: CaptureLifecycle<M>,
    store: &dyn MomentRepository,
    args: &CaptureArgs,
) -> Result<(), CliError> {
    let outcome = cycle_then_save(&mut lifecycle, args.save).await;

    if args.metrics {
        let registry = MetricsRegistry::new()?;
        let snapshot =
            MetricsSnapshot::from_components(&lifecycle.stats(), lifecycle.phase(), store.load().len());
        registry.update(&snapshot);
        print!("{}", registry.encode()?);
    }

    outcome
}

async fn cycle_then_save<M: ModeStrategy>(
    lifecycle: &mut CaptureLifecycle<M>,
    save: bool,
) -> Result<(), CliError> {
    lifecycle.start_capture()?;
    lifecycle.run_until_settled().await?;

    if save {
        match lifecycle.request_save().await? {
            SaveOutcome::Saved(moment) => println!("Saved moment {}", moment.id),
            SaveOutcome::Dismissed => info!("Save dismissed"),
        }
    }
    Ok(())
}

fn history(config: &FileConfig, action: HistoryAction) -> Result<(), CliError> {
    let paths = Paths::new(&config.storage)?;
    let store = open_store(config, &paths);

    match action {
        HistoryAction::List => {
            let moments = store.load();
            if moments.is_empty() {
                println!("No saved moments in {}", store.path().display());
                return Ok(());
            }
            for moment in &moments {
                println!("{}  {}  {}", moment.id, moment.display_date(), result_line(moment));
                if !moment.annotation.is_empty() {
                    println!("    {}", moment.annotation);
                }
                println!("    {}", moment.photo_path);
            }
        }
        HistoryAction::Annotate { id, text } => {
            let updated = store.update_annotation(&id, &text)?;
            println!("{}  {}", updated.id, updated.annotation);
        }
    }
    Ok(())
}
