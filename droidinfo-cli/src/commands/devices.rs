//! Device listing command implementation.

use {
    anyhow::Result,
    console::style,
    droidinfo::{Bridge, Device},
};

use crate::{commands::connect, config::Settings, render::ok_envelope};

/// List attached devices with their state.
pub(crate) fn cmd_devices(settings: &Settings, quiet: bool, json: bool) -> Result<()> {
    let adb = connect(settings, quiet || json)?;
    let devices = adb.devices()?;

    if json {
        let output = ok_envelope(serde_json::json!({
            "devices": devices,
        }));
        println!(
            "{}",
            serde_json::to_string_pretty(&output)?
        );
        return Ok(());
    }

    print!("{}", render_devices(&devices));
    Ok(())
}

fn render_devices(devices: &[Device]) -> String {
    if devices.is_empty() {
        return format!(
            "{}\n",
            style("No devices attached").dim()
        );
    }

    let width = devices
        .iter()
        .map(|d| d.serial.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for device in devices {
        let state = if device
            .state
            .is_ready()
        {
            style(device.state.as_str()).green()
        } else {
            style(device.state.as_str()).yellow()
        };
        let model = device
            .model
            .as_deref()
            .map(|m| format!("  {}", style(m.replace('_', " ")).dim()))
            .unwrap_or_default();
        out.push_str(&format!(
            "{:<width$}  {state}{model}\n",
            device.serial,
        ));
        if let Some(hint) = device
            .state
            .hint()
        {
            out.push_str(&format!("{:<width$}  ↳ {hint}\n", ""));
        }
    }
    out
}
