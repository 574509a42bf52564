// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use platekeeper::app_config::{self, Config, JobOptions};
use platekeeper::app_controller::Controller;
use platekeeper::errors::AppError;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest a vendor delivery (default command)
    Ingest(IngestArgs),

    /// List the sequences and files an ingest would pick up
    Scan {
        /// Directory to scan
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Scene hint for sequences whose names carry none
        #[arg(long)]
        scene: Option<String>,

        /// Shot hint for sequences whose names carry none
        #[arg(long)]
        shot: Option<String>,
    },

    /// Generate shell completions for platekeeper
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct IngestArgs {
    /// Project code
    #[arg(long, env = "PLATEKEEPER_PROJECT")]
    project: Option<String>,

    /// Vendor name, burned into review movies
    #[arg(long, env = "PLATEKEEPER_VENDOR")]
    vendor: Option<String>,

    /// Delivery date (YYYY-MM-DD)
    #[arg(long, env = "PLATEKEEPER_INPUT_DATE")]
    input_date: Option<String>,

    /// Scene hint used when file names carry none
    #[arg(long, env = "PLATEKEEPER_SCENE")]
    scene: Option<String>,

    /// Shot hint used when file names carry none
    #[arg(long, env = "PLATEKEEPER_SHOT")]
    shot: Option<String>,

    /// Input file or directory; defaults to the vendor delivery folder
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Root of the output tree
    #[arg(short, long, env = "PLATEKEEPER_OUTPUT")]
    output: Option<PathBuf>,

    /// Scene/shot mapping table
    #[arg(long, env = "PLATEKEEPER_CSV_PATH")]
    csv_path: Option<PathBuf>,

    /// Proxy image format
    #[arg(long, default_value = "jpeg")]
    proxy: String,

    /// Proxy resolution: preset name or WIDTHxHEIGHT
    #[arg(short, long, default_value = "2K_DCP")]
    resolution: String,

    /// Regenerate review movies that already exist
    #[arg(short, long)]
    force: bool,

    /// Recopy plates that already exist
    #[arg(long)]
    overwrite: bool,

    /// Generate a review movie per sequence
    #[arg(long)]
    mov: bool,

    /// Generate proxy images per sequence
    #[arg(long)]
    use_proxy: bool,

    /// First frame number of renamed plates
    #[arg(long, default_value_t = 1001)]
    start_frame: u32,

    /// Keep source frame numbers instead of renumbering
    #[arg(long)]
    preserve_frame_numbers: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

impl IngestArgs {
    fn to_job(&self) -> JobOptions {
        JobOptions {
            project: self.project.clone().unwrap_or_default(),
            vendor: self.vendor.clone(),
            input_date: self.input_date.clone(),
            scene: self.scene.clone(),
            shot: self.shot.clone(),
            input: self.input.clone(),
            output: self.output.clone().unwrap_or_default(),
            csv_path: self.csv_path.clone().unwrap_or_default(),
            proxy_format: self.proxy.clone(),
            resolution: self.resolution.clone(),
            force: self.force,
            overwrite: self.overwrite,
            mov: self.mov,
            use_proxy: self.use_proxy,
            start_frame: self.start_frame,
            preserve_frame_numbers: self.preserve_frame_numbers,
        }
    }
}

/// platekeeper - vendor plate ingestion
///
/// Groups vendor-delivered frame files into sequences and publishes them into
/// versioned shot folders, with proxies and review movies.
#[derive(Parser, Debug)]
#[command(name = "platekeeper")]
#[command(version)]
#[command(about = "Vendor plate ingestion tool")]
#[command(long_about = "platekeeper copies vendor frame sequences into versioned shot folders and
builds proxies and review movies from them.

EXAMPLES:
    platekeeper --project gen63 -i /deliveries/0715 -o /proj --csv-path shots.csv
    platekeeper --project gen63 --vendor from_da --input-date 2025-07-15 -o /proj --csv-path shots.csv
    platekeeper -i /deliveries/0715 ... --use-proxy --mov     # Also build proxies and movies
    platekeeper scan /deliveries/0715                        # List what would be ingested
    platekeeper completions bash > platekeeper.bash          # Generate bash completions

CONFIGURATION:
    Tools, resolution presets and path templates are stored in conf.json by default.
    You can specify a different file with --config-path. If the file doesn't exist,
    a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    ingest: IngestArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI colour for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "1;31"),
            Level::Warn => ("WARN ", "1;33"),
            Level::Info => ("INFO ", "1;32"),
            Level::Debug => ("DEBUG", "1;36"),
            Level::Trace => ("TRACE", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (tag, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Trace is the ceiling; the effective level is set once the config is known
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialise logging: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "platekeeper", &mut std::io::stdout());
            Ok(true)
        }
        Some(Commands::Scan { dir, scene, shot }) => run_scan(dir, scene, shot),
        Some(Commands::Ingest(args)) => run_ingest(args).await,
        None => run_ingest(cli.ingest).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run_scan(dir: PathBuf, scene: Option<String>, shot: Option<String>) -> Result<bool, AppError> {
    let controller = Controller::with_config(Config::default())?;
    let mut job = JobOptions::new("", "", "");
    job.scene = scene;
    job.shot = shot;

    let listing = controller.scan_listing(&job, &dir)?;
    print!("{}", listing);
    Ok(true)
}

/// Run an ingest; `Ok(false)` when any item failed
async fn run_ingest(options: IngestArgs) -> Result<bool, AppError> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&level));
    }

    let config = load_or_create_config(&options.config_path, options.log_level.clone())?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let job = options.to_job();
    job.validate().context("Invalid ingest options")?;

    let controller = Controller::with_config(config)?;
    let report = controller.run(job).await?;

    if report.failed() > 0 {
        error!("{} of {} items failed", report.failed(), report.items.len());
        return Ok(false);
    }
    if report.partial() > 0 {
        warn!("{} items completed with errors", report.partial());
    }
    info!("Ingest {} finished", report.run_id);
    Ok(true)
}

// Load the JSON config, or write the defaults when the file is missing
fn load_or_create_config(config_path: &str, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path).context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(level) = log_level {
        config.log_level = level.into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}
