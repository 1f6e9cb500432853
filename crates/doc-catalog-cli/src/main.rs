mod commands;
mod logging;
mod progress;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, RunArgs};
use doc_catalog_core::config::{self, CatalogConfig};
use doc_catalog_core::storage::Database;
use doc_catalog_core::{export, CatalogEngine, ConflictPolicy};
use dotenv::dotenv;
use progress::CliReporter;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    match args.command {
        Some(Commands::Run(run)) => run_catalog(run)?,
        Some(Commands::Sessions { store }) => list_sessions(&store)?,
        Some(Commands::PrintConfig(run)) => {
            let config = build_config(&run)?;
            println!("{:#?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_catalog(args: RunArgs) -> anyhow::Result<()> {
    let mut config = build_config(&args)?;
    config.conflict_policy = resolve_conflict_policy(&args, &config.store_path)?;

    if let Some(output) = &config.export_path {
        confirm_export_overwrite(output)?;
    }

    let verbose = args.verbose;
    let reporter = CliReporter::new(verbose);
    let export_path = config.export_path.clone();

    let mut engine = CatalogEngine::new(config);
    let report = engine.run(&reporter)?;

    if let Some(output) = &export_path {
        export::write_csv(&report.export, output)?;
        info!("catalog exported to {}", output.display());
    }

    println!();
    info!(
        "Session {}: {} existing, {} new, {} duplicates, {} skipped",
        report.session_id.cyan(),
        format!("{}", report.existing_files).green(),
        format!("{}", report.new_files).green(),
        format!("{}", report.duplicate_files).red(),
        format!("{}", report.skipped_files).yellow(),
    );
    info!(
        "Load: {}, Walk: {}, {} rows written",
        format!("{:.2}s", report.load_duration.as_secs_f64()).green(),
        format!("{:.2}s", report.walk_duration.as_secs_f64()).green(),
        report.flushed_rows,
    );

    Ok(())
}

fn list_sessions(store: &Path) -> anyhow::Result<()> {
    if !store.is_file() {
        bail!("store '{}' does not exist", store.display());
    }
    let db = Database::open(store)?;
    let sessions = db.list_sessions()?;
    if sessions.is_empty() {
        println!("No sessions recorded.");
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}  {}  {}  roots: {}",
            session.session_id.cyan(),
            session.created_at,
            session.hash_algorithm,
            session.search_dirs.join(", "),
        );
    }
    Ok(())
}

/// Layer CLI flags over the optional `Config.toml`, then fill defaults.
fn build_config(args: &RunArgs) -> anyhow::Result<CatalogConfig> {
    let file_config =
        config::load_file_config().context("failed to load Config.toml")?;

    let mut config = CatalogConfig::default();

    if let Some(dirs) = file_config.search_dirs {
        config.search_dirs = dirs.into_iter().map(PathBuf::from).collect();
    }
    if let Some(dirs) = file_config.exclude_dirs {
        config.exclude_dirs = dirs;
    }
    if let Some(store) = file_config.store_path {
        config.store_path = PathBuf::from(store);
    }
    if let Some(export) = file_config.export_path {
        config.export_path = Some(PathBuf::from(export));
    }
    if let Some(algorithm) = file_config.hash_algorithm {
        config.hash_algorithm = algorithm;
    }
    if let Some(threshold) = file_config.flush_threshold {
        config.flush_threshold = threshold;
    }
    if let Some(buffer) = file_config.hash_buffer_size {
        config.hash_buffer_size = buffer;
    }
    let file_base_dir = file_config.base_dir.map(PathBuf::from);

    if !args.search_dirs.is_empty() {
        config.search_dirs = args.search_dirs.clone();
    }
    if config.search_dirs.is_empty() {
        config.search_dirs = vec![std::env::current_dir()?];
    }
    if !args.exclude_dirs.is_empty() {
        config.exclude_dirs = args.exclude_dirs.clone();
    }
    if let Some(store) = &args.store {
        config.store_path = store.clone();
    }
    if let Some(output) = &args.output_file {
        config.export_path = Some(output.clone());
    }
    if let Some(algorithm) = args.hash_algorithm {
        config.hash_algorithm = algorithm;
    }
    if let Some(threshold) = args.flush_threshold {
        config.flush_threshold = threshold;
    }

    config.base_dir = args
        .base_dir
        .clone()
        .or(file_base_dir)
        .unwrap_or_else(|| config.search_dirs[0].clone());
    config.existing_catalog = args.input_file.clone();
    config.existing_store = args.existing_store.clone();
    config.session_id = args.session_id.clone();
    config.check_contents = !args.no_content_check;

    Ok(config)
}

/// Resolve what to do about a pre-existing destination store before the
/// engine starts; the engine itself never blocks on terminal input.
fn resolve_conflict_policy(
    args: &RunArgs,
    store_path: &Path,
) -> anyhow::Result<ConflictPolicy> {
    if let Some(policy) = args.if_store_exists {
        return Ok(policy.into());
    }
    if !store_path.exists() {
        return Ok(ConflictPolicy::Error);
    }

    let append = prompt_confirm(
        &format!(
            "Warning: {} already exists, continue writing to it?",
            store_path.display()
        ),
        Some(false),
    )?;
    if append {
        return Ok(ConflictPolicy::Append);
    }
    if prompt_confirm("Overwrite the existing store?", Some(false))? {
        return Ok(ConflictPolicy::Overwrite);
    }
    bail!("aborted: destination store already exists");
}

fn confirm_export_overwrite(output: &Path) -> anyhow::Result<()> {
    if output.is_file()
        && !prompt_confirm("Output file exists. Allow overwrite?", Some(true))?
    {
        bail!("aborted: output file already exists");
    }
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
