//! Device listing and target selection.
//!
//! Parses the output of `adb devices -l` and picks the single device a run
//! will query.

use std::fmt;

use log::{debug, info};

use crate::error::{Error, Result};

/// Connection state reported by `adb devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    /// Online and authorized.
    Device,
    /// USB debugging has not been authorized on the device.
    Unauthorized,
    /// Known to the server but not responding.
    Offline,
    /// Booted into recovery.
    Recovery,
    /// In sideload mode.
    Sideload,
    /// In the bootloader.
    Bootloader,
    /// The host user lacks permission to open the USB device.
    NoPermissions,
    /// Any other state string.
    Other(String),
}

impl DeviceState {
    /// Map an `adb devices` state token.
    pub fn from_token(token: &str) -> Self {
        match token {
            "device" => Self::Device,
            "unauthorized" => Self::Unauthorized,
            "offline" => Self::Offline,
            "recovery" => Self::Recovery,
            "sideload" => Self::Sideload,
            "bootloader" => Self::Bootloader,
            "no" | "no permissions" => Self::NoPermissions,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether shell commands can be run against a device in this state.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Device)
    }

    /// The state as adb spells it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Device => "device",
            Self::Unauthorized => "unauthorized",
            Self::Offline => "offline",
            Self::Recovery => "recovery",
            Self::Sideload => "sideload",
            Self::Bootloader => "bootloader",
            Self::NoPermissions => "no permissions",
            Self::Other(s) => s,
        }
    }

    /// A short hint for states that block querying.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Unauthorized => Some("accept the USB debugging prompt on the device"),
            Self::Offline => Some("reconnect the cable or restart the adb server"),
            Self::NoPermissions => Some("check udev rules for the device"),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized as the adb spelling, e.g. `"device"` or `"rescue"`.
#[cfg(feature = "serde")]
impl serde::Serialize for DeviceState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One entry of `adb devices -l`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Device {
    /// Serial number or `host:port` for network devices.
    pub serial: String,
    /// Connection state.
    pub state: DeviceState,
    /// `product:` attribute.
    pub product: Option<String>,
    /// `model:` attribute.
    pub model: Option<String>,
    /// `device:` attribute.
    pub device: Option<String>,
    /// `transport_id:` attribute.
    pub transport_id: Option<String>,
}

impl Device {
    /// A device with the given serial and state and no attributes.
    pub fn new(serial: impl Into<String>, state: DeviceState) -> Self {
        Self {
            serial: serial.into(),
            state,
            product: None,
            model: None,
            device: None,
            transport_id: None,
        }
    }
}

/// Parse `adb devices` / `adb devices -l` output.
///
/// The header and daemon status lines (`* daemon not running ...`) are
/// skipped. Unknown attributes are ignored.
pub fn parse_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty() && !line.starts_with('*') && !line.starts_with("List of devices")
        })
        .filter_map(parse_device_line)
        .collect()
}

fn parse_device_line(line: &str) -> Option<Device> {
    let mut tokens = line.split_whitespace();
    let serial = tokens.next()?;
    let state_token = tokens.next()?;

    let mut device = Device::new(serial, DeviceState::from_token(state_token));

    for token in tokens {
        if let Some((key, value)) = token.split_once(':') {
            let value = Some(value.to_string());
            match key {
                "product" => device.product = value,
                "model" => device.model = value,
                "device" => device.device = value,
                "transport_id" => device.transport_id = value,
                _ => {},
            }
        }
    }

    Some(device)
}

/// Pick the device a run will query.
///
/// With `requested`, that serial must be attached and ready. Without it,
/// exactly one ready device must be attached.
pub fn select_device(devices: &[Device], requested: Option<&str>) -> Result<Device> {
    if let Some(serial) = requested {
        let device = devices
            .iter()
            .find(|d| d.serial == serial)
            .ok_or_else(|| Error::DeviceNotFound(serial.to_string()))?;
        if !device.state.is_ready() {
            return Err(Error::DeviceUnavailable {
                serial: serial.to_string(),
                state: device.state.to_string(),
            });
        }
        info!("Using requested device {serial}");
        return Ok(device.clone());
    }

    let ready: Vec<&Device> = devices
        .iter()
        .filter(|d| d.state.is_ready())
        .collect();

    for skipped in devices.iter().filter(|d| !d.state.is_ready()) {
        debug!("Ignoring {} ({})", skipped.serial, skipped.state);
    }

    match ready.as_slice() {
        [] => Err(Error::NoDevice),
        [only] => {
            info!("Using device {}", only.serial);
            Ok((*only).clone())
        },
        many => Err(Error::MultipleDevices(
            many.iter()
                .map(|d| d.serial.clone())
                .collect(),
        )),
    }
}
