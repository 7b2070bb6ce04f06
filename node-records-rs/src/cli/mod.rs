//! Command-line interface for the node record cleaner.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::loaders::{load_node_records_csv, RawTable};
use crate::core::schema::{parse_column_label, raw_channel_columns, TIME_COLUMN};
use crate::core::writers::write_table;
use crate::processors::cleaning::{clean_node_records, CleanOutput};
use crate::processors::splitting::split_blocks;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "node-records")]
#[command(about = "Clean treatment-delivery node record logs", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean node record CSVs into per-leaf bank A/B tables
    Clean {
        /// Node record CSV files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print the cleaned table to stdout instead of writing a _CLEAN file
        #[arg(long)]
        no_save: bool,
        /// Keep stationary samples and the full time axis
        #[arg(long)]
        keep_stationaries: bool,
        /// Keep every n-th row before removing stationary samples
        #[arg(long)]
        downsample: Option<usize>,
        /// Fail on extra blocks or mismatched bank lengths
        #[arg(long)]
        strict: bool,
        /// Directory for cleaned files (defaults to each input's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show the block layout and leaf columns of a node record CSV
    Inspect {
        /// Node record CSV file
        file: PathBuf,
    },

    /// Write the default configuration as YAML
    WriteConfig {
        /// Output YAML path
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let len = value.chars().count();
        let display_value = if len > 38 {
            let tail: String = value.chars().skip(len - 35).collect();
            format!("...{}", tail)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Config from `--config`, or the defaults when none was given.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let config = PipelineConfig::from_yaml(path)
        .map_err(|e| anyhow::anyhow!("Failed to load config from {}: {}", path.display(), e))?;
    info!("Loaded config from: {}", path.display());
    Ok(config)
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // An explicit config that cannot be used is fatal
    let config = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Clean {
            files,
            no_save,
            keep_stationaries,
            downsample,
            strict,
            output_dir,
        } => {
            let mut config = if strict { config.strict() } else { config };
            if no_save {
                config.output.save = false;
            }
            if keep_stationaries {
                config.stationary.enabled = false;
            }
            if let Some(factor) = downsample {
                config.stationary.downsample_factor = factor;
            }
            if output_dir.is_some() {
                config.output.directory = output_dir;
            }
            cmd_clean(&files, &config);
        }
        Commands::Inspect { file } => {
            if let Err(e) = cmd_inspect(&file, &config) {
                error!("{:#}", e);
                std::process::exit(1);
            }
        }
        Commands::WriteConfig { path } => {
            cmd_write_config(&path, &config);
        }
    }
}

fn cmd_clean(files: &[PathBuf], config: &PipelineConfig) {
    let mut failed = 0usize;

    for file in files {
        let start = Instant::now();
        let spinner = create_spinner(&format!("Cleaning {}...", file.display()));

        let outcome = match clean_node_records(file, config) {
            Ok(outcome) => outcome,
            Err(e) => {
                spinner.finish_and_clear();
                error!("{} ({}): {}", file.display(), e.kind(), e);
                failed += 1;
                continue;
            }
        };
        spinner.finish_and_clear();

        let summary = &outcome.summary;
        match &outcome.output {
            CleanOutput::Saved(path) => {
                println!("Cleaned table saved in '{}'", path.display());

                let mut items = vec![
                    ("Input file", file.display().to_string()),
                    ("Output file", path.display().to_string()),
                    ("Bank A rows", summary.bank_a_rows.to_string()),
                    ("Bank B rows", summary.bank_b_rows.to_string()),
                    ("Cleaned rows", summary.cleaned_rows.to_string()),
                    ("Output rows", summary.output_rows.to_string()),
                    ("Output columns", summary.output_columns.to_string()),
                ];
                if let Some(dropped) = summary.stationary_dropped() {
                    items.push(("Stationary samples", dropped.to_string()));
                }
                if summary.ignored_blocks > 0 {
                    items.push(("Ignored blocks", summary.ignored_blocks.to_string()));
                }
                items.push(("Duration", format!("{:.2?}", start.elapsed())));

                print_summary("Node Records Cleaned", &items);
            }
            CleanOutput::Table(table) => {
                let label = format!("stdout ({})", file.display());
                if let Err(e) = write_table(io::stdout().lock(), table, &label) {
                    error!("{}: {}", file.display(), e);
                    failed += 1;
                }
            }
        }
    }

    if failed > 0 {
        error!("{} of {} file(s) failed", failed, files.len());
        std::process::exit(1);
    }
}

/// Leaf columns missing from a file's header, in canonical order.
fn missing_channel_columns(raw: &RawTable) -> Vec<String> {
    raw_channel_columns()
        .into_iter()
        .filter(|(_, _, label)| raw.column_index(label).is_none())
        .map(|(_, _, label)| label)
        .collect()
}

fn cmd_inspect(file: &Path, config: &PipelineConfig) -> Result<()> {
    let start = Instant::now();

    let raw = load_node_records_csv(file)
        .with_context(|| format!("Failed to inspect {}", file.display()))?;

    let blocks = split_blocks(&raw, &config.blocks.marker_prefix);
    println!("Blocks delimited by '{}' rows:", config.blocks.marker_prefix);
    for block in &blocks {
        let role = match block.index {
            0 => "bank A",
            1 => "bank B",
            _ => "ignored",
        };
        println!(
            "  block {} ({}): rows {}..{} ({} rows)",
            block.index,
            role,
            block.start,
            block.end(),
            block.len()
        );
    }

    let missing = missing_channel_columns(&raw);
    let extra: Vec<&str> = raw
        .headers
        .iter()
        .filter(|h| h.as_str() != TIME_COLUMN && parse_column_label(h).is_none())
        .map(String::as_str)
        .collect();

    if !missing.is_empty() {
        println!("Missing leaf columns: {}", missing.join(", "));
    }
    if !extra.is_empty() {
        println!("Columns dropped when cleaning: {}", extra.join(", "));
    }

    print_summary(
        "Inspection Complete",
        &[
            ("Input file", file.display().to_string()),
            ("Rows", raw.num_rows().to_string()),
            ("Columns", raw.headers.len().to_string()),
            ("Blocks", blocks.len().to_string()),
            ("Time column", raw.column_index(TIME_COLUMN).is_some().to_string()),
            ("Missing leaf columns", missing.len().to_string()),
            ("Extra columns", extra.len().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn cmd_write_config(path: &Path, config: &PipelineConfig) {
    match config.to_yaml(path) {
        Ok(()) => println!("Configuration written to '{}'", path.display()),
        Err(e) => {
            error!("Failed to write config to {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_clean_flags() {
        let cli = Cli::try_parse_from([
            "node-records",
            "-vv",
            "clean",
            "a.csv",
            "b.csv",
            "--no-save",
            "--downsample",
            "4",
            "--strict",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Clean {
                files,
                no_save,
                keep_stationaries,
                downsample,
                strict,
                output_dir,
            } => {
                assert_eq!(files.len(), 2);
                assert!(no_save);
                assert!(!keep_stationaries);
                assert_eq!(downsample, Some(4));
                assert!(strict);
                assert!(output_dir.is_none());
            }
            _ => panic!("Expected clean command"),
        }
    }

    #[test]
    fn test_clean_requires_files() {
        assert!(Cli::try_parse_from(["node-records", "clean"]).is_err());
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(None).unwrap().output.save);

        let missing = dir.path().join("typo.yaml");
        let err = load_config(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("typo.yaml"));

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "stationary: [not, a, map]\n").unwrap();
        assert!(load_config(Some(broken.as_path())).is_err());

        let good = dir.path().join("config.yaml");
        std::fs::write(&good, "output:\n  save: false\n").unwrap();
        assert!(!load_config(Some(good.as_path())).unwrap().output.save);
    }

    #[test]
    fn test_missing_channel_columns() {
        let mut headers = vec!["Time".to_string()];
        headers.extend(raw_channel_columns().into_iter().map(|(_, _, label)| label));
        headers.retain(|h| h != "Sec12");
        let raw = RawTable::new(headers, vec![]);

        assert_eq!(missing_channel_columns(&raw), vec!["Sec12".to_string()]);
    }
}
