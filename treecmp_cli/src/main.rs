mod export;
mod progress;
mod render;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use treecmp_common::{ensure_config, load_config, AppConfig, HashAlgorithm};
use treecmp_core::{ComparisonEngine, NoProgress, ProgressObserver};

use crate::export::{build_json_report, write_csv};
use crate::progress::CliProgress;
use crate::render::{render_report, RenderOptions};

/// Exit status when the trees differ in any way
const EXIT_DIFFERENCES: i32 = 2;

#[derive(Parser)]
#[command(name = "treecmp")]
#[command(author = "Treecmp Contributors")]
#[command(version)]
#[command(about = "Compare two directory trees by content and detect renamed files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two directories recursively
    #[command(alias = "scan")]
    Compare(CompareArgs),

    /// Show or create the configuration file
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,

        /// Use the configuration file next to the executable
        #[arg(long)]
        portable: bool,
    },
}

#[derive(Args)]
struct CompareArgs {
    /// First folder (A); prompted for when omitted on a terminal
    folder_a: Option<PathBuf>,

    /// Second folder (B); prompted for when omitted on a terminal
    folder_b: Option<PathBuf>,

    /// Ignore patterns in gitignore syntax (can be specified multiple times)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Content digest algorithm (blake3 or sha256)
    #[arg(short, long)]
    algorithm: Option<HashAlgorithm>,

    /// Hashing worker threads (0 = one per CPU)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Output the report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Also write the report as CSV to this file
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Show only differences (hide identical files)
    #[arg(short = 'd', long)]
    diff_only: bool,

    /// Disable progress bars
    #[arg(short, long)]
    quiet: bool,

    /// Disable ANSI colors in output
    #[arg(long)]
    no_color: bool,
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare(args) => run_compare(args),
        Commands::Config { init, portable } => run_config(init, portable).map(|_| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn run_compare(args: CompareArgs) -> Result<i32> {
    let folder_a = resolve_folder(args.folder_a, "Folder A")?;
    let folder_b = resolve_folder(args.folder_b, "Folder B")?;

    let loaded = load_config(false).context("Failed to load configuration")?;
    let config = apply_overrides(
        loaded.config,
        args.ignore,
        args.follow_symlinks,
        args.algorithm,
        args.threads,
    );
    info!("Using configuration from {}", loaded.path.display());

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed)) {
            warn!("Failed to install Ctrl-C handler: {}", e);
        }
    }

    let show_progress = !args.quiet && !args.json && std::io::stderr().is_terminal();
    let cli_progress = CliProgress::default();
    let observer: &dyn ProgressObserver = if show_progress {
        &cli_progress
    } else {
        &NoProgress
    };

    let engine = ComparisonEngine::new(&config);
    let report = engine
        .compare_with_progress(&folder_a, &folder_b, observer, Some(cancel.as_ref()))
        .context("Comparison failed")?;

    if let Some(csv_path) = &args.csv {
        let summary_path = write_csv(&report, csv_path)?;
        info!(
            "Report written to {} and {}",
            csv_path.display(),
            summary_path.display()
        );
    }

    if args.json {
        let json = build_json_report(&report, args.diff_only);
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        let options = RenderOptions {
            use_color: !args.no_color && std::io::stdout().is_terminal(),
            diff_only: args.diff_only,
        };
        let stdout = std::io::stdout();
        render_report(&mut stdout.lock(), &report, &options)?;
        if let Some(csv_path) = &args.csv {
            println!("\nComparison saved to: {}", csv_path.display());
        }
    }

    Ok(if report.trees_match() { 0 } else { EXIT_DIFFERENCES })
}

fn run_config(init: bool, portable: bool) -> Result<()> {
    let loaded = if init {
        ensure_config(portable)?
    } else {
        load_config(portable)?
    };

    println!("Config file: {}", loaded.path.display());
    if !loaded.exists && !init {
        println!("(not present; defaults in use, create it with --init)");
    }
    if loaded.portable {
        println!("Mode: portable");
    }
    println!();
    print!("{}", toml::to_string_pretty(&loaded.config)?);
    Ok(())
}

/// Command-line flags take precedence over the config file
fn apply_overrides(
    mut config: AppConfig,
    ignore: Vec<String>,
    follow_symlinks: bool,
    algorithm: Option<HashAlgorithm>,
    threads: Option<usize>,
) -> AppConfig {
    config.ignore_patterns.extend(ignore);
    if follow_symlinks {
        config.follow_symlinks = true;
    }
    if let Some(algorithm) = algorithm {
        config.algorithm = algorithm;
    }
    if let Some(threads) = threads {
        config.threads = threads;
    }
    config
}

fn resolve_folder(arg: Option<PathBuf>, label: &str) -> Result<PathBuf> {
    if let Some(path) = arg {
        return Ok(path);
    }

    if !std::io::stdin().is_terminal() {
        bail!("Missing path for {label}");
    }

    let input: String = dialoguer::Input::<String>::new()
        .with_prompt(format!("Enter the path for {label}"))
        .interact_text()?;
    Ok(PathBuf::from(input.trim()))
}
