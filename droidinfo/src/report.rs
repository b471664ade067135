//! The Device Report: per-run mapping of field key to display value.

use std::collections::HashMap;
use std::fmt;

use crate::battery::BatteryInfo;
use crate::device::Device;

/// Rendered in place of a value whose query failed.
pub const UNKNOWN: &str = "unknown";

/// Report section a field is shown under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Category {
    /// Who the device is.
    Identity,
    /// Android build and runtime.
    Os,
    /// Battery state.
    Battery,
    /// CPU, memory, display, storage.
    Hardware,
    /// Patch level, root, debug state.
    Security,
}

impl Category {
    /// All categories in render order.
    pub const ALL: [Self; 5] = [
        Self::Identity,
        Self::Os,
        Self::Battery,
        Self::Hardware,
        Self::Security,
    ];

    /// Section heading.
    pub fn title(self) -> &'static str {
        match self {
            Self::Identity => "Device Identity",
            Self::Os => "Operating System",
            Self::Battery => "Battery",
            Self::Hardware => "Hardware",
            Self::Security => "Security",
        }
    }

    /// Key used for the section in JSON output.
    pub fn key(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Os => "os",
            Self::Battery => "battery",
            Self::Hardware => "hardware",
            Self::Security => "security",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Static description of one report field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Stable key, used in JSON output.
    pub key: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Section the field belongs to.
    pub category: Category,
}

const fn field(key: &'static str, label: &'static str, category: Category) -> FieldDef {
    FieldDef {
        key,
        label,
        category,
    }
}

/// Every field of the report, in render order.
pub const FIELDS: &[FieldDef] = &[
    field("device_id", "Device ID", Category::Identity),
    field("status", "Status", Category::Identity),
    field("serial_number", "Serial Number", Category::Identity),
    field("manufacturer", "Manufacturer", Category::Identity),
    field("brand", "Brand", Category::Identity),
    field("model", "Model", Category::Identity),
    field("device_name", "Device Name", Category::Identity),
    field("product_name", "Product Name", Category::Identity),
    field("android_version", "Android Version", Category::Os),
    field("api_level", "API Level", Category::Os),
    field("build_number", "Build Number", Category::Os),
    field("kernel_version", "Kernel", Category::Os),
    field("uptime", "Uptime", Category::Os),
    field("region_locale", "Region/Locale", Category::Os),
    field("country_code", "Country Code", Category::Os),
    field("battery_percentage", "Level", Category::Battery),
    field("battery_health", "Health", Category::Battery),
    field("battery_status", "Status", Category::Battery),
    field("battery_power_source", "Power Source", Category::Battery),
    field("battery_voltage", "Voltage", Category::Battery),
    field("battery_temperature", "Temperature", Category::Battery),
    field("battery_technology", "Technology", Category::Battery),
    field("cpu_architecture", "CPU Architecture", Category::Hardware),
    field("total_ram", "Total RAM", Category::Hardware),
    field("screen_resolution", "Screen Resolution", Category::Hardware),
    field("storage_total", "Total Storage", Category::Hardware),
    field("storage_used", "Used Storage", Category::Hardware),
    field("storage_available", "Available Storage", Category::Hardware),
    field("storage_usage", "Storage Usage", Category::Hardware),
    field("security_patch", "Security Patch", Category::Security),
    field("root_status", "Root Status", Category::Security),
    field("usb_debugging", "USB Debugging", Category::Security),
    field("boot_state", "Device State", Category::Security),
    field("imei", "IMEI (last 4)", Category::Security),
];

/// Look up a field definition by key.
pub fn field_def(key: &str) -> Option<&'static FieldDef> {
    FIELDS
        .iter()
        .find(|f| f.key == key)
}

/// Collected values for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    /// The device the report describes.
    pub device: Device,
    values: HashMap<&'static str, String>,
    battery: Option<BatteryInfo>,
}

impl DeviceReport {
    /// An empty report; every field reads as [`UNKNOWN`].
    pub fn new(device: Device) -> Self {
        Self {
            device,
            values: HashMap::new(),
            battery: None,
        }
    }

    /// Store `value` under `key`. Keys outside [`FIELDS`] and empty values
    /// are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        if let Some(def) = field_def(key) {
            self.values.insert(def.key, value);
        }
    }

    /// Store an optional value.
    pub fn set_opt(&mut self, key: &str, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.set(key, value);
        }
    }

    /// The collected value, if any.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
    }

    /// The display value: the collected value or [`UNKNOWN`].
    pub fn get(&self, key: &str) -> &str {
        self.value(key)
            .unwrap_or(UNKNOWN)
    }

    /// Number of fields with a value.
    pub fn known_count(&self) -> usize {
        self.values.len()
    }

    /// Parsed battery record, when the battery query succeeded.
    pub fn battery(&self) -> Option<&BatteryInfo> {
        self.battery.as_ref()
    }

    /// Attach the parsed battery record.
    pub fn set_battery(&mut self, battery: BatteryInfo) {
        self.battery = Some(battery);
    }

    /// Charge percentage for gauges.
    pub fn battery_percentage(&self) -> Option<f64> {
        self.battery
            .as_ref()
            .and_then(BatteryInfo::percentage)
    }

    /// Fields grouped by category in render order, with display values.
    pub fn sections(&self) -> Vec<(Category, Vec<(&'static FieldDef, &str)>)> {
        Category::ALL
            .iter()
            .map(|&category| {
                let rows = FIELDS
                    .iter()
                    .filter(|f| f.category == category)
                    .map(|f| (f, self.get(f.key)))
                    .collect();
                (category, rows)
            })
            .collect()
    }
}
