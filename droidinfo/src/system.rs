//! Hardware, OS and security probes built on plain shell commands.
//!
//! Each probe issues one command (plus at most a fallback) and turns its text
//! into a display value. Parsing is kept in free functions so it can be
//! tested against captured output.

use log::debug;

use crate::bridge::Bridge;
use crate::error::{Error, Result};
use crate::props;

const KIB_PER_MIB: f64 = 1024.0;
const KIB_PER_GIB: f64 = 1024.0 * 1024.0;

/// Columns of the `/data` line of `df`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StorageInfo {
    /// Size of the filesystem.
    pub total: String,
    /// Space in use.
    pub used: String,
    /// Space available.
    pub available: String,
    /// Usage percentage, when known.
    pub usage: Option<String>,
}

/// `1234.5 ...` (seconds since boot) to `0h 20m`.
pub fn parse_uptime(text: &str) -> Result<String> {
    let seconds: f64 = text
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .filter(|s: &f64| s.is_finite() && *s >= 0.0)
        .ok_or_else(|| Error::parse("uptime", text))?;
    let total = seconds as u64;
    Ok(format!("{}h {}m", total / 3600, total % 3600 / 60))
}

/// `MemTotal:  5901232 kB` to kibibytes.
pub fn parse_mem_total_kib(text: &str) -> Option<u64> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix("MemTotal:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
}

/// Kibibytes as gigabytes with two decimals, e.g. `5.63 GB`.
pub fn format_ram(kib: u64) -> String {
    format!("{:.2} GB", kib as f64 / KIB_PER_GIB)
}

/// Kibibytes in the largest fitting unit with one decimal.
pub fn format_kib(kib: u64) -> String {
    let value = kib as f64;
    if value >= KIB_PER_GIB {
        format!("{:.1} GB", value / KIB_PER_GIB)
    } else if value >= KIB_PER_MIB {
        format!("{:.1} MB", value / KIB_PER_MIB)
    } else {
        format!("{kib} KB")
    }
}

/// Parse `df /data` output.
///
/// Handles toybox output (1K blocks with a `Use%` column), old toolbox output
/// (human sizes, no percentage) and long filesystem names wrapped onto their
/// own line.
pub fn parse_df(text: &str) -> Option<StorageInfo> {
    let body: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Filesystem"))
        .flat_map(str::split_whitespace)
        .collect();

    if body.len() < 4 {
        return None;
    }

    let (total, used, available) = (body[1], body[2], body[3]);
    let numeric = (
        total.parse::<u64>(),
        used.parse::<u64>(),
        available.parse::<u64>(),
    );

    let usage = body
        .get(4)
        .filter(|col| col.ends_with('%'))
        .map(|col| (*col).to_string())
        .or_else(|| match numeric {
            (Ok(t), Ok(u), _) if t > 0 => Some(format!("{}%", (u * 100).div_ceil(t))),
            _ => None,
        });

    Some(match numeric {
        (Ok(t), Ok(u), Ok(a)) => StorageInfo {
            total: format_kib(t),
            used: format_kib(u),
            available: format_kib(a),
            usage,
        },
        _ => StorageInfo {
            total: total.to_string(),
            used: used.to_string(),
            available: available.to_string(),
            usage,
        },
    })
}

/// `Physical size: 1080x2400` (and an optional `Override size:`) from
/// `wm size`.
pub fn parse_wm_size(text: &str) -> Option<String> {
    let field = |prefix: &str| {
        text.lines()
            .find_map(|line| line.trim().strip_prefix(prefix))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let physical = field("Physical size:")?;
    Some(match field("Override size:") {
        Some(over) => format!("{physical} (override {over})"),
        None => physical.to_string(),
    })
}

/// `cur=1080x2400` from `dumpsys window displays`.
pub fn parse_display_cur(text: &str) -> Option<String> {
    text.split_whitespace()
        .find_map(|token| token.strip_prefix("cur="))
        .map(|value| value.trim_end_matches(','))
        .filter(|value| value.contains('x'))
        .map(str::to_string)
}

/// Whether `which su` found a binary.
pub fn is_rooted(which_output: &str) -> bool {
    which_output.contains("/su")
}

/// `sys.boot_completed` to text.
pub fn boot_state(value: &str) -> Option<&'static str> {
    match value.trim() {
        "1" => Some("Boot Completed"),
        "0" => Some("Booting"),
        _ => None,
    }
}

/// Digits carried in the quoted column of a `service call iphonesubinfo`
/// parcel dump.
pub fn parse_iphonesubinfo(text: &str) -> Option<String> {
    if !text.contains("Parcel") {
        return None;
    }
    let digits: String = text
        .lines()
        .filter_map(|line| {
            let start = line.find('\'')?;
            let end = line.rfind('\'')?;
            (end > start).then(|| &line[start + 1..end])
        })
        .flat_map(str::chars)
        .filter(char::is_ascii_digit)
        .collect();
    valid_imei(digits)
}

/// `Device ID = 35...` from `dumpsys iphonesubinfo`.
pub fn parse_dumpsys_imei(text: &str) -> Option<String> {
    let line = text
        .lines()
        .find(|line| line.contains("Device ID"))?;
    let (_, value) = line.split_once('=')?;
    valid_imei(
        value
            .chars()
            .filter(char::is_ascii_digit)
            .collect(),
    )
}

fn valid_imei(digits: String) -> Option<String> {
    (digits.len() >= 14 && digits.bytes().any(|b| b != b'0')).then_some(digits)
}

/// Last four digits of an identifier.
pub fn last_four(digits: &str) -> String {
    let skip = digits.len().saturating_sub(4);
    digits[skip..].to_string()
}

/// Time since boot.
pub fn uptime<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<String> {
    parse_uptime(&bridge.shell(serial, "cat /proc/uptime 2>/dev/null")?)
}

/// Kernel identification (`uname -a`).
pub fn kernel_version<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<String> {
    non_empty(bridge.shell(serial, "uname -a")?, "uname -a")
}

/// Primary ABI, falling back to the kernel machine name.
pub fn cpu_architecture<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<String> {
    match props::getprop(bridge, serial, "ro.product.cpu.abi") {
        Ok(abi) => Ok(abi),
        Err(e) => {
            debug!("ro.product.cpu.abi unavailable ({e}), trying uname -m");
            non_empty(bridge.shell(serial, "uname -m")?, "uname -m")
        },
    }
}

/// Installed RAM.
pub fn total_ram<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<String> {
    let text = bridge.shell(serial, "cat /proc/meminfo 2>/dev/null | grep MemTotal")?;
    parse_mem_total_kib(&text)
        .map(format_ram)
        .ok_or_else(|| Error::parse("MemTotal", &text))
}

/// Size and usage of the `/data` partition.
pub fn storage<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<StorageInfo> {
    let text = bridge.shell(serial, "df /data 2>/dev/null")?;
    parse_df(&text).ok_or_else(|| Error::parse("df /data", &text))
}

/// Display resolution.
pub fn screen_resolution<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<String> {
    if let Ok(text) = bridge.shell(serial, "wm size 2>/dev/null") {
        if let Some(size) = parse_wm_size(&text) {
            return Ok(size);
        }
    }
    let text = bridge.shell(serial, "dumpsys window displays 2>/dev/null | grep cur=")?;
    parse_display_cur(&text).ok_or_else(|| Error::parse("display size", &text))
}

/// `Rooted` when an `su` binary is on the device `PATH`.
pub fn root_status<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<String> {
    // `which` exits non-zero when nothing is found; that is an answer, not a
    // failed query.
    let found = match bridge.shell(serial, "which su 2>/dev/null") {
        Ok(out) => is_rooted(&out),
        Err(Error::CommandFailed { .. }) => false,
        Err(e) => return Err(e),
    };
    Ok(if found { "Rooted" } else { "Not Rooted" }.to_string())
}

/// Boot completion state.
pub fn boot_completion<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<String> {
    let value = props::getprop(bridge, serial, "sys.boot_completed")?;
    boot_state(&value)
        .map(str::to_string)
        .ok_or_else(|| Error::parse("sys.boot_completed", &value))
}

/// Last four digits of the IMEI.
///
/// Recent Android releases refuse these queries without privileges, in which
/// case the probe fails and the field stays unknown.
pub fn imei<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<String> {
    if let Ok(text) = bridge.shell(serial, "service call iphonesubinfo 1 2>/dev/null") {
        if let Some(digits) = parse_iphonesubinfo(&text) {
            return Ok(last_four(&digits));
        }
    }
    if let Ok(text) = bridge.shell(serial, "dumpsys iphonesubinfo 2>/dev/null") {
        if let Some(digits) = parse_dumpsys_imei(&text) {
            return Ok(last_four(&digits));
        }
    }
    let value = props::getprop(bridge, serial, "gsm.device.id")?;
    valid_imei(
        value
            .chars()
            .filter(char::is_ascii_digit)
            .collect(),
    )
    .map(|digits| last_four(&digits))
    .ok_or_else(|| Error::parse("gsm.device.id", &value))
}

fn non_empty(value: String, command: &str) -> Result<String> {
    if value.is_empty() {
        Err(Error::EmptyOutput(command.to_string()))
    } else {
        Ok(value)
    }
}
