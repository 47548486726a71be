mod migrate;

use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::core::settings::{SETTINGS_FILE, Settings};
use crate::core::terminal;
use crate::logging::LogMakeWriter;
use crate::steps::{MigrationOutcome, MigrationState};

pub use migrate::failure_action;

fn print_help() {
    terminal::print_banner();

    println!(" {}", style("Options").bold());
    for (flag, about) in [
        ("--cwd <dir>", "Project directory to migrate (default: current directory)"),
        ("--verbose, -v", "Log debug diagnostics"),
        ("--log-file <path>", "Write diagnostics to a file instead of stderr"),
        ("--help, -h", "Show this help"),
        ("--version, -V", "Show the version"),
    ] {
        println!("   {:<20} {}", style(flag).green(), about);
    }

    println!(
        "\n Optional settings are read from {} in the project directory.",
        style(SETTINGS_FILE).cyan()
    );
    println!(
        "\n {} {} [options]\n",
        style("Usage:").bold(),
        style("jsreport-migration").green()
    );
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MigrateArgs {
    pub cwd: Option<PathBuf>,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
    pub help: bool,
    pub version: bool,
}

pub(crate) fn parse_migrate_args(args: &[String], start: usize) -> MigrateArgs {
    let mut parsed = MigrateArgs::default();
    let mut i = start;
    while i < args.len() {
        match args[i].as_str() {
            "--cwd" => {
                if i + 1 < args.len() {
                    parsed.cwd = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--log-file" => {
                if i + 1 < args.len() {
                    parsed.log_file = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                parsed.verbose = true;
                i += 1;
            }
            "--help" | "-h" => {
                parsed.help = true;
                i += 1;
            }
            "--version" | "-V" => {
                parsed.version = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    parsed
}

/// Absolute project directory: `--cwd` resolved against the process directory.
fn resolve_project_dir(cwd: Option<&Path>) -> Result<PathBuf> {
    let here = std::env::current_dir().context("Failed to read current directory")?;
    Ok(match cwd {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => here.join(dir),
        None => here,
    })
}

fn init_tracing(args: &MigrateArgs) -> Result<()> {
    let make_writer = match &args.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            LogMakeWriter::to_file(file)
        }
        None => LogMakeWriter::default(),
    };

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_ansi(args.log_file.is_none())
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    Ok(())
}

pub async fn run_main(state: &MigrationState) -> Result<Option<MigrationOutcome>> {
    let args: Vec<String> = std::env::args().collect();
    let parsed = parse_migrate_args(&args, 1);

    if parsed.help {
        print_help();
        return Ok(None);
    }
    if parsed.version {
        println!("jsreport-migration {}", env!("CARGO_PKG_VERSION"));
        return Ok(None);
    }

    init_tracing(&parsed)?;

    let project_dir = resolve_project_dir(parsed.cwd.as_deref())?;
    let settings = Settings::load(&project_dir).await?;
    info!(project = %project_dir.display(), ?settings, "starting migration");

    let outcome = migrate::run_migration_wizard(&project_dir, &settings, state).await?;
    Ok(Some(outcome))
}
