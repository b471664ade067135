//! Shell completion generation and installation.

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use console::style;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{Cli, CliError};

const BIN: &str = "droidinfo";

/// Print completions to stdout, or install them with `install`.
pub(crate) fn cmd_completions(shell: Option<Shell>, install: bool) -> Result<()> {
    if install {
        return install_completions(shell);
    }

    let shell = shell
        .or_else(detect_shell_type)
        .ok_or_else(|| {
            CliError::Usage(format!(
                "Could not detect your shell; specify one, e.g. `{BIN} completions bash`"
            ))
        })?;
    write_completions(shell, &mut io::stdout());
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn io::Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN, out);
}

/// Detect the user's current shell from environment.
pub(crate) fn detect_shell_type() -> Option<Shell> {
    if let Ok(shell_path) = env::var("SHELL") {
        return shell_from_path(&shell_path);
    }

    if cfg!(windows) && env::var("PSModulePath").is_ok() {
        return Some(Shell::PowerShell);
    }

    None
}

fn shell_from_path(shell_path: &str) -> Option<Shell> {
    let name = Path::new(shell_path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    match name {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "elvish" => Some(Shell::Elvish),
        "pwsh" | "powershell" => Some(Shell::PowerShell),
        _ => None,
    }
}

/// Directories the install paths are derived from.
struct InstallRoots {
    home: PathBuf,
    config: PathBuf,
    data: PathBuf,
}

impl InstallRoots {
    fn from_env() -> Result<Self> {
        let home = env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .context("Could not determine home directory")?;
        let config = env::var_os("XDG_CONFIG_HOME").map_or_else(|| home.join(".config"), PathBuf::from);
        let data = env::var_os("XDG_DATA_HOME").map_or_else(
            || {
                home.join(".local")
                    .join("share")
            },
            PathBuf::from,
        );
        Ok(Self { home, config, data })
    }

    fn path_for(&self, shell: Shell) -> Result<PathBuf> {
        Ok(match shell {
            Shell::Bash => self
                .data
                .join("bash-completion")
                .join("completions")
                .join(BIN),
            Shell::Zsh => self
                .home
                .join(".zfunc")
                .join(format!("_{BIN}")),
            Shell::Fish => self
                .config
                .join("fish")
                .join("completions")
                .join(format!("{BIN}.fish")),
            Shell::Elvish => self
                .config
                .join("elvish")
                .join("lib")
                .join(format!("{BIN}.elv")),
            Shell::PowerShell => self
                .config
                .join("powershell")
                .join("completions")
                .join(format!("{BIN}.ps1")),
            _ => anyhow::bail!(CliError::Usage(format!(
                "Unsupported shell for --install: {shell}"
            ))),
        })
    }
}

fn install_completions(shell: Option<Shell>) -> Result<()> {
    let shell = match shell {
        Some(s) => s,
        None => detect_shell_type().ok_or_else(|| {
            CliError::Usage(format!(
                "Could not detect your shell; specify one, e.g. `{BIN} completions --install bash`"
            ))
        })?,
    };

    let path = InstallRoots::from_env()?.path_for(shell)?;
    let mut script = Vec::new();
    write_completions(shell, &mut script);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(&path, &script)
        .with_context(|| format!("Failed to write completion file: {}", path.display()))?;

    eprintln!(
        "{} Installed {shell} completions to {}",
        style("✓")
            .green()
            .bold(),
        style(path.display()).yellow()
    );
    match shell {
        Shell::Bash => eprintln!(
            "To activate now: {}",
            style(format!("source {}", path.display())).cyan()
        ),
        Shell::Zsh => eprintln!(
            "Add {} to ~/.zshrc before compinit, then restart your shell.",
            style("fpath=(~/.zfunc $fpath)").cyan()
        ),
        Shell::PowerShell => eprintln!(
            "Add {} to your PowerShell profile.",
            style(format!(". {}", path.display())).cyan()
        ),
        _ => eprintln!("Completions load automatically in new sessions."),
    }

    Ok(())
}
