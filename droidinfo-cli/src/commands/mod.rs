//! Command implementations.
//!
//! Each subcommand is implemented in its own module for clean separation.

pub(crate) mod completions;
pub(crate) mod devices;
pub(crate) mod info;

use anyhow::Result;
use console::style;
use droidinfo::{AdbProcess, locate_adb};

use crate::config::Settings;

/// Locate adb and optionally restart its server.
pub(crate) fn connect(settings: &Settings, quiet: bool) -> Result<AdbProcess> {
    let adb = locate_adb(settings.adb.as_deref(), settings.timeout)?;

    if settings.restart_server {
        if !quiet {
            eprintln!("{} Restarting adb server", style("⟳").cyan());
        }
        adb.restart_server()?;
    }

    Ok(adb)
}
