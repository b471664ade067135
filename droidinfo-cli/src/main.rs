//! droidinfo CLI - Print Android device metadata through adb.
//!
//! ## Features
//!
//! - Device report grouped by identity, OS, battery, hardware and security
//! - JSON output and export
//! - Device listing with connection states
//! - Shell completion generation
//! - Environment variable and config file support

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use console::style;
use env_logger::Env;
use log::debug;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

mod commands;
mod config;
mod render;

use commands::info::ReportArgs;
use config::{Config, Overrides, Settings};

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: AtomicBool = AtomicBool::new(true);

/// Set by the Ctrl-C handler.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Check if emoji/animations should be used (TTY and colors enabled).
fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(Ordering::Relaxed) && console::colors_enabled_stderr()
}

/// Whether Ctrl-C was pressed.
fn was_interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

/// CLI-level error classes that map to dedicated exit codes.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Invalid invocation detected after argument parsing.
    #[error("{0}")]
    Usage(String),
    /// Explicit configuration file could not be used.
    #[error("{0}")]
    Config(String),
    /// The user cancelled the operation.
    #[error("{0}")]
    Cancelled(String),
}

/// droidinfo - Query an Android device through adb and print its metadata.
///
/// Environment variables:
///   DROIDINFO_ADB               - adb executable
///   ANDROID_SERIAL              - Device to query
///   DROIDINFO_TIMEOUT           - Per-command timeout in seconds (default: 10)
///   DROIDINFO_NON_INTERACTIVE   - Non-interactive mode (disable prompts)
#[derive(Parser)]
#[command(name = "droidinfo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = "Examples:\n  droidinfo\n  droidinfo --json\n  droidinfo -s emulator-5554 -o pixel.json\n  droidinfo devices")]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Path to the adb executable (searched for if not specified).
    #[arg(long, global = true, value_name = "PATH", env = "DROIDINFO_ADB")]
    adb: Option<PathBuf>,

    /// Serial of the device to query.
    #[arg(short, long, global = true, env = "ANDROID_SERIAL")]
    serial: Option<String>,

    /// Timeout for each adb command, in seconds.
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        env = "DROIDINFO_TIMEOUT",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: Option<u64>,

    /// Restart the adb server before querying.
    #[arg(long, global = true)]
    restart_server: bool,

    /// Verbose output level (-v, -vv, -vvv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Non-interactive mode (never prompt).
    #[arg(long, global = true, env = "DROIDINFO_NON_INTERACTIVE")]
    non_interactive: bool,

    /// Path to a configuration file.
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_path: Option<PathBuf>,

    #[command(flatten)]
    report: ReportArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the device report (the default command).
    Info(ReportArgs),

    /// List attached devices and their states.
    Devices {
        /// Output the device list as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (auto-detected if not specified).
        #[arg(value_enum)]
        shell: Option<Shell>,

        /// Install completions into your shell configuration.
        #[arg(long)]
        install: bool,
    },
}

/// Map an error to the process exit code.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return match cli_err {
                CliError::Usage(_) => 2,
                CliError::Config(_) => 3,
                CliError::Cancelled(_) => 130,
            };
        }
        if let Some(lib_err) = cause.downcast_ref::<droidinfo::Error>() {
            return match lib_err {
                droidinfo::Error::MultipleDevices(_) => 5,
                e if e.is_device_selection() => 4,
                droidinfo::Error::AdbNotFound { .. } => 6,
                droidinfo::Error::Interrupted => 130,
                _ => 1,
            };
        }
    }
    1
}

/// Whether the run prints JSON to stdout, in which case stderr stays clean.
fn json_requested(cli: &Cli) -> bool {
    cli.report.json
        || match &cli.command {
            Some(Commands::Info(args)) => args.json,
            Some(Commands::Devices { json }) => *json,
            _ => false,
        }
}

fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    env_logger::Builder::from_env(Env::default().default_filter_or(log_filter(verbose, quiet)))
        .format_target(verbose >= 2)
        .format_timestamp(if verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();
}

fn install_interrupt_handler() {
    if let Err(e) = ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::Relaxed)) {
        debug!("Could not install Ctrl-C handler: {e}");
    }
    droidinfo::set_interrupt_checker(was_interrupted);
}

fn settings(cli: &Cli) -> Result<Settings> {
    let config = match &cli.config_path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };
    Ok(config.settings(&Overrides {
        adb: cli.adb.as_deref(),
        timeout_secs: cli.timeout,
        serial: cli.serial.as_deref(),
        restart_server: cli.restart_server,
    }))
}

fn run(cli: &Cli) -> Result<()> {
    let top = &cli.report;
    match &cli.command {
        Some(Commands::Completions { shell, install }) => {
            if top.json || top.output.is_some() {
                return Err(CliError::Usage("--json and --output do not apply to completions".to_string()).into());
            }
            commands::completions::cmd_completions(*shell, *install)
        },
        Some(Commands::Devices { json }) => {
            if top.output.is_some() {
                return Err(CliError::Usage("--output does not apply to devices".to_string()).into());
            }
            commands::devices::cmd_devices(&settings(cli)?, cli.quiet, *json || top.json)
        },
        Some(Commands::Info(args)) => {
            let args = ReportArgs {
                json: args.json || top.json,
                output: args
                    .output
                    .clone()
                    .or_else(|| top.output.clone()),
            };
            commands::info::cmd_info(&settings(cli)?, &args, cli.quiet, cli.non_interactive)
        },
        None => commands::info::cmd_info(&settings(cli)?, top, cli.quiet, cli.non_interactive),
    }
}

fn main() {
    // --- NO_COLOR and TTY detection (clig.dev best practice) ---
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, Ordering::Relaxed);

    if env::var_os("NO_COLOR").is_some() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    } else {
        if !console::Term::stdout().is_term() {
            console::set_colors_enabled(false);
        }
        if !stderr_is_tty {
            console::set_colors_enabled_stderr(false);
        }
    }

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet || json_requested(&cli));
    install_interrupt_handler();

    debug!(
        "droidinfo v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    if let Err(err) = run(&cli) {
        let code = exit_code_for(&err);
        eprintln!(
            "{} {err:#}",
            style("Error:")
                .red()
                .bold()
        );
        std::process::exit(code);
    }
}
