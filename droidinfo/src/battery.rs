//! Battery state from `dumpsys battery` and its fallbacks.

use log::debug;

use crate::bridge::Bridge;
use crate::error::{Error, Result};

/// Fallback commands that print a bare charge level, tried in order.
const CAPACITY_FALLBACKS: &[&str] = &[
    "cat /sys/class/power_supply/battery/capacity",
    "grep POWER_SUPPLY_CAPACITY= /sys/class/power_supply/battery/uevent",
    "dumpsys power | grep mBatteryLevel",
];

/// Parsed battery service state. Every field is optional because OEM builds
/// omit lines freely.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BatteryInfo {
    /// Charge level in units of `scale`.
    pub level: Option<u32>,
    /// Full-scale value of `level` (normally 100).
    pub scale: Option<u32>,
    /// `BatteryManager.BATTERY_STATUS_*` code.
    pub status: Option<u32>,
    /// `BatteryManager.BATTERY_HEALTH_*` code.
    pub health: Option<u32>,
    /// `BatteryManager.BATTERY_PLUGGED_*` bitmask.
    pub plugged: Option<u32>,
    /// `AC powered:` flag.
    pub ac_powered: Option<bool>,
    /// `USB powered:` flag.
    pub usb_powered: Option<bool>,
    /// `Wireless powered:` flag.
    pub wireless_powered: Option<bool>,
    /// Voltage in millivolts.
    pub voltage_mv: Option<u32>,
    /// Temperature in tenths of a degree Celsius.
    pub temperature_dc: Option<i32>,
    /// Cell chemistry, e.g. `Li-ion`.
    pub technology: Option<String>,
    /// Whether a battery is present.
    pub present: Option<bool>,
}

impl BatteryInfo {
    /// Parse the `key: value` lines of `dumpsys battery`.
    pub fn parse_dumpsys(text: &str) -> Self {
        let mut info = Self::default();

        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key
                .trim()
                .to_lowercase()
                .as_str()
            {
                "level" => info.level = value.parse().ok(),
                "scale" => info.scale = value.parse().ok(),
                "status" => info.status = value.parse().ok(),
                "health" => info.health = value.parse().ok(),
                "plugged" => info.plugged = value.parse().ok(),
                "ac powered" => info.ac_powered = value.parse().ok(),
                "usb powered" => info.usb_powered = value.parse().ok(),
                "wireless powered" => info.wireless_powered = value.parse().ok(),
                "voltage" => info.voltage_mv = value.parse().ok(),
                "temperature" => info.temperature_dc = value.parse().ok(),
                "technology" if !value.is_empty() => info.technology = Some(value.to_string()),
                "present" => info.present = value.parse().ok(),
                _ => {},
            }
        }

        info
    }

    /// A record holding only a charge percentage.
    pub fn from_capacity(percent: u32) -> Self {
        Self {
            level: Some(percent),
            scale: Some(100),
            ..Self::default()
        }
    }

    /// Whether nothing useful was parsed.
    pub fn is_empty(&self) -> bool {
        self.level.is_none() && self.status.is_none() && self.health.is_none()
    }

    /// Charge in percent, rounded to one decimal.
    pub fn percentage(&self) -> Option<f64> {
        let level = f64::from(self.level?);
        let scale = f64::from(self.scale.unwrap_or(100));
        if scale <= 0.0 {
            return None;
        }
        Some((level / scale * 1000.0).round() / 10.0)
    }

    /// Human-readable charging status.
    pub fn status_text(&self) -> Option<&'static str> {
        self.status.map(status_name)
    }

    /// Human-readable health.
    pub fn health_text(&self) -> Option<&'static str> {
        self.health.map(health_name)
    }

    /// Human-readable power source, from `plugged` or the `powered` flags.
    pub fn power_source(&self) -> Option<String> {
        if let Some(mask) = self.plugged {
            return Some(plugged_name(mask));
        }

        let flags = [
            (self.ac_powered, "AC"),
            (self.usb_powered, "USB"),
            (self.wireless_powered, "Wireless"),
        ];
        if flags.iter().all(|(flag, _)| flag.is_none()) {
            return None;
        }
        let sources: Vec<&str> = flags
            .iter()
            .filter(|(flag, _)| *flag == Some(true))
            .map(|(_, name)| *name)
            .collect();
        Some(if sources.is_empty() {
            "Not Plugged".to_string()
        } else {
            sources.join(" + ")
        })
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> Option<f64> {
        self.temperature_dc
            .map(|t| f64::from(t) / 10.0)
    }

    /// Voltage in volts.
    pub fn voltage_volts(&self) -> Option<f64> {
        self.voltage_mv
            .map(|v| f64::from(v) / 1000.0)
    }

    /// `85%`, `85.5%`, or `level/scale` when no percentage can be computed.
    pub fn level_text(&self) -> Option<String> {
        if let Some(pct) = self.percentage() {
            return Some(format_percentage(pct));
        }
        self.level
            .map(|level| format!("{level}/{}", self.scale.unwrap_or(100)))
    }

    /// `4.213 V`.
    pub fn voltage_text(&self) -> Option<String> {
        self.voltage_volts()
            .map(|v| format!("{v:.3} V"))
    }

    /// `28.5°C (83.3°F)`.
    pub fn temperature_text(&self) -> Option<String> {
        self.temperature_celsius()
            .map(|c| {
                let f = c * 9.0 / 5.0 + 32.0;
                format!("{c:.1}°C ({f:.1}°F)")
            })
    }
}

/// `BATTERY_STATUS_*` name.
pub fn status_name(code: u32) -> &'static str {
    match code {
        2 => "Charging",
        3 => "Discharging",
        4 => "Not Charging",
        5 => "Full",
        _ => "Unknown",
    }
}

/// `BATTERY_HEALTH_*` name.
pub fn health_name(code: u32) -> &'static str {
    match code {
        2 => "Good",
        3 => "Overheat",
        4 => "Dead",
        5 => "Over Voltage",
        6 => "Unspecified Failure",
        7 => "Cold",
        _ => "Unknown",
    }
}

/// `BATTERY_PLUGGED_*` bitmask as text.
pub fn plugged_name(mask: u32) -> String {
    if mask == 0 {
        return "Not Plugged".to_string();
    }
    let names: Vec<&str> = [(1, "AC"), (2, "USB"), (4, "Wireless"), (8, "Dock")]
        .iter()
        .filter(|(bit, _)| mask & bit != 0)
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        "Unknown".to_string()
    } else {
        names.join(" + ")
    }
}

/// `85` for whole numbers, `85.5` otherwise, with a percent sign.
pub fn format_percentage(pct: f64) -> String {
    if pct.fract() == 0.0 {
        format!("{pct:.0}%")
    } else {
        format!("{pct:.1}%")
    }
}

/// Extract a 0–100 charge level from `85`, `POWER_SUPPLY_CAPACITY=85` or
/// `mBatteryLevel=85` style output.
pub fn parse_capacity(text: &str) -> Option<u32> {
    text.lines()
        .map(|line| {
            line.rsplit('=')
                .next()
                .unwrap_or(line)
                .trim()
        })
        .find_map(|value| value.parse::<u32>().ok())
        .filter(|level| *level <= 100)
}

/// Query the battery, falling back to bare capacity readings.
pub fn query<B: Bridge + ?Sized>(bridge: &B, serial: &str) -> Result<BatteryInfo> {
    match bridge.shell(serial, "dumpsys battery") {
        Ok(text) => {
            let info = BatteryInfo::parse_dumpsys(&text);
            if !info.is_empty() {
                return Ok(info);
            }
            debug!("dumpsys battery gave nothing usable, trying fallbacks");
        },
        Err(e) => debug!("dumpsys battery failed: {e}"),
    }

    for cmd in CAPACITY_FALLBACKS {
        if let Ok(text) = bridge.shell(serial, cmd) {
            if let Some(level) = parse_capacity(&text) {
                debug!("battery level {level}% from `{cmd}`");
                return Ok(BatteryInfo::from_capacity(level));
            }
        }
    }

    Err(Error::EmptyOutput("dumpsys battery".to_string()))
}
