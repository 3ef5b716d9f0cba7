use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use config::Config;
use toolgen::driver::{Driver, Progress, RunOptions, RunReport};
use toolgen::loader::LoadOptions;
use toolgen::render::RustRenderer;
use toolgen::serializer::SaveTarget;
use toolgen::sync::{HttpFetcher, ReferenceStatus, ReferenceSynchronizer};
use toolgen::ToolgenError;

fn setup_logging(level: &str) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toolgen")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("toolgen.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Colored console output for a run.
struct ConsoleProgress {
    verbose: bool,
}

impl Progress for ConsoleProgress {
    fn file_started(&self, file: &Path) {
        println!("{} {}...", "Processing".cyan(), display_name(file));
    }

    fn reference_failed(&self, message: &str) {
        eprintln!("{}", message.yellow());
    }

    fn file_failed(&self, file: &Path, error: &ToolgenError) {
        eprintln!("{} {}: {}", "Failed".red(), display_name(file), error);
    }

    fn finished(&self, report: &RunReport) {
        if self.verbose || report.dry_run {
            print_details(report);
        }

        let summary = format!(
            "Finished: {} succeeded, {} failed, {} reference failures",
            report.succeeded(),
            report.failed(),
            report.failed_references()
        );
        if report.has_failures() {
            println!("{}", summary.red());
        } else {
            println!("{}", summary.green());
        }
        if report.stopped_early {
            println!("{}", "Stopped at first failure (--fail-fast)".yellow());
        }
    }
}

fn print_details(report: &RunReport) {
    let verb = if report.dry_run { "would write" } else { "wrote" };
    for outcome in &report.outcomes {
        let Ok(file) = &outcome.result else { continue };
        println!("  {} ({})", file.tool.bold(), display_name(&outcome.file));
        println!(
            "    {} {} [{} bytes, sha256 {}]",
            verb,
            file.generated.path.display(),
            file.generated.bytes,
            &file.generated.sha256[..12]
        );
        for reference in &file.references {
            match &reference.status {
                ReferenceStatus::Failed(_) => println!("    {} {}", "skipped".yellow(), reference.path.display()),
                _ => println!("    {} {}", verb, reference.path.display()),
            }
        }
        let note = match file.saved.target {
            SaveTarget::Original => String::new(),
            SaveTarget::Sibling => format!(
                " (line count {} -> {})",
                file.saved.original_lines, file.saved.fresh_lines
            ),
        };
        let saved_verb = if file.saved.written || report.dry_run { verb } else { "unchanged" };
        println!("    {} {}{}", saved_verb, file.saved.path.display(), note);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn run_options(cli: &Cli, config: &Config) -> RunOptions {
    RunOptions {
        load: LoadOptions {
            output_root: cli.out_dir.clone().unwrap_or_else(|| config.output.out_dir.clone()),
            provenance_base_url: config.output.provenance_base_url.clone(),
            create_dirs: true,
        },
        verify_determinism: config.output.verify_determinism,
        references: config.references.enabled && !cli.no_references,
        dry_run: cli.dry_run || config.run.dry_run,
        fail_fast: cli.fail_fast_override().unwrap_or(config.run.fail_fast),
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<RunReport> {
    info!("Starting run over {}", cli.directory.display());

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let options = run_options(cli, config);
    if options.dry_run {
        println!("{}", "Dry run: nothing will be written".yellow());
    }

    let fetcher = HttpFetcher::new(config.references.fetch_timeout(), &config.references.user_agent)
        .context("Failed to create reference fetcher")?;
    let synchronizer = ReferenceSynchronizer::new(Arc::new(fetcher))
        .with_timeout(config.references.fetch_timeout())
        .with_max_concurrent(config.references.max_concurrent_fetches);
    let renderer = RustRenderer::new().context("Failed to set up renderer")?;

    let driver = Driver::new(Arc::new(renderer), synchronizer, options);
    let progress = ConsoleProgress { verbose: cli.is_verbose() };
    let report = driver
        .run(&cli.directory, &progress)
        .await
        .context(format!("Failed to process {}", cli.directory.display()))?;
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let config = loaded.config;

    let level = if cli.is_verbose() {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    setup_logging(&level).context("Failed to setup logging")?;

    for skipped in &loaded.skipped {
        warn!("{}", skipped);
        eprintln!("{}", skipped.yellow());
    }
    match &loaded.source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No usable config file found, using defaults"),
    }

    let report = run_application(&cli, &config).await.context("Application failed")?;

    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}
