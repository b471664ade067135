//! Device report command implementation.

use {
    anyhow::{Context, Result},
    console::style,
    dialoguer::{Confirm, Error as DialoguerError, theme::ColorfulTheme},
    droidinfo::{Bridge, DeviceQuery, DeviceReport, Error as LibError, select_device},
    indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle},
    log::debug,
    std::{
        fs,
        io::IsTerminal,
        path::{Path, PathBuf},
    },
};

use crate::{
    CliError,
    commands::connect,
    config::Settings,
    render::{default_file_name, ok_envelope, render_report, report_json},
    use_fancy_output,
};

/// Output options shared by the default command and `info`.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct ReportArgs {
    /// Print the report as JSON to stdout.
    #[arg(long)]
    pub(crate) json: bool,

    /// Also write the JSON report to FILE.
    #[arg(short, long, value_name = "FILE")]
    pub(crate) output: Option<PathBuf>,
}

/// Collect and print the report for the selected device.
pub(crate) fn cmd_info(
    settings: &Settings,
    args: &ReportArgs,
    quiet: bool,
    non_interactive: bool,
) -> Result<()> {
    // JSON runs keep stderr clean on success.
    let quiet = quiet || args.json;

    let adb = connect(settings, quiet)?;
    let devices = adb.devices()?;
    let device = match select_device(&devices, settings.serial.as_deref()) {
        Ok(device) => device,
        Err(e) => {
            if !quiet && matches!(e, LibError::NoDevice | LibError::DeviceUnavailable { .. }) {
                for blocked in devices
                    .iter()
                    .filter(|d| !d.state.is_ready())
                {
                    if let Some(hint) = blocked
                        .state
                        .hint()
                    {
                        eprintln!(
                            "{} {} is {}: {hint}",
                            style("⚠").yellow(),
                            blocked.serial,
                            blocked.state
                        );
                    }
                }
            }
            return Err(e.into());
        },
    };

    if !quiet {
        let name = device
            .model
            .as_deref()
            .unwrap_or(&device.serial);
        eprintln!(
            "{} Querying {} ({})",
            style("🔍").cyan(),
            style(name).bold(),
            device.serial
        );
    }

    let pb = if quiet || !use_fancy_output() {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(DeviceQuery::step_count() as u64);
        #[allow(clippy::unwrap_used)] // Static template string
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb
    };

    let result = DeviceQuery::new(&adb, device).collect(&mut |label, step, _total| {
        pb.set_position((step - 1) as u64);
        pb.set_message(label.to_string());
    });
    pb.finish_and_clear();
    let report = result.map_err(|e| match e {
        LibError::Interrupted => CliError::Cancelled("Interrupted".to_string()).into(),
        other => anyhow::Error::from(other),
    })?;

    let data = report_json(&report);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ok_envelope(data.clone()))?
        );
    } else {
        print!("{}", render_report(&report));
    }

    if let Some(path) = &args.output {
        save_report(path, &data)?;
        if !quiet {
            eprintln!(
                "{} Saved report to {}",
                style("✓").green(),
                style(path.display()).yellow()
            );
        }
    } else if !args.json && !non_interactive && prompt_allowed() {
        offer_save(&report, &data)?;
    }

    Ok(())
}

fn prompt_allowed() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

fn save_report(path: &Path, data: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(data)?;
    fs::write(path, format!("{text}\n"))
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    debug!("Wrote {} bytes to {}", text.len() + 1, path.display());
    Ok(())
}

fn offer_save(report: &DeviceReport, data: &serde_json::Value) -> Result<()> {
    let file_name = default_file_name(report);
    let answer = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Save this report to {file_name}?"))
        .default(false)
        .interact();

    match answer {
        Ok(true) => {
            let path = PathBuf::from(&file_name);
            save_report(&path, data)?;
            eprintln!(
                "{} Saved report to {}",
                style("✓").green(),
                style(path.display()).yellow()
            );
            Ok(())
        },
        Ok(false) => Ok(()),
        Err(DialoguerError::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
            Err(CliError::Cancelled("Save prompt cancelled".to_string()).into())
        },
        Err(e) => {
            debug!("Save prompt unavailable: {e}");
            Ok(())
        },
    }
}
