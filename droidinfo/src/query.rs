//! Sequential collection of a [`DeviceReport`].
//!
//! Each step issues its own queries and writes the fields it owns. A failing
//! step is logged and leaves its fields unset; it never aborts the report.

use log::{debug, info};

use crate::battery;
use crate::bridge::Bridge;
use crate::device::{Device, select_device};
use crate::error::{Error, Result};
use crate::props;
use crate::report::DeviceReport;
use crate::system;

type Probe = fn(&dyn Bridge, &str, &mut DeviceReport) -> Result<()>;

/// Ordered collection steps: progress label and probe.
const STEPS: &[(&str, Probe)] = &[
    ("Serial number", |b, s, r| prop(b, s, r, "serial_number", "ro.serialno")),
    ("Manufacturer", |b, s, r| prop(b, s, r, "manufacturer", "ro.product.manufacturer")),
    ("Brand", |b, s, r| prop(b, s, r, "brand", "ro.product.brand")),
    ("Model", |b, s, r| prop(b, s, r, "model", "ro.product.model")),
    ("Device name", |b, s, r| prop(b, s, r, "device_name", "ro.product.device")),
    ("Product name", |b, s, r| prop(b, s, r, "product_name", "ro.product.name")),
    ("Android version", |b, s, r| prop(b, s, r, "android_version", "ro.build.version.release")),
    ("API level", |b, s, r| prop(b, s, r, "api_level", "ro.build.version.sdk")),
    ("Build number", |b, s, r| prop(b, s, r, "build_number", "ro.build.display.id")),
    ("Kernel", |b, s, r| {
        r.set("kernel_version", system::kernel_version(b, s)?);
        Ok(())
    }),
    ("Uptime", |b, s, r| {
        r.set("uptime", system::uptime(b, s)?);
        Ok(())
    }),
    ("Locale", |b, s, r| prop(b, s, r, "region_locale", "persist.sys.locale")),
    ("Country", |b, s, r| prop(b, s, r, "country_code", "gsm.sim.operator.iso-country")),
    ("Battery", collect_battery),
    ("CPU", |b, s, r| {
        r.set("cpu_architecture", system::cpu_architecture(b, s)?);
        Ok(())
    }),
    ("Memory", |b, s, r| {
        r.set("total_ram", system::total_ram(b, s)?);
        Ok(())
    }),
    ("Screen", |b, s, r| {
        r.set("screen_resolution", system::screen_resolution(b, s)?);
        Ok(())
    }),
    ("Storage", |b, s, r| {
        let storage = system::storage(b, s)?;
        r.set("storage_total", storage.total);
        r.set("storage_used", storage.used);
        r.set("storage_available", storage.available);
        r.set_opt("storage_usage", storage.usage);
        Ok(())
    }),
    ("Security patch", |b, s, r| {
        prop(b, s, r, "security_patch", "ro.build.version.security_patch")
    }),
    ("Root", |b, s, r| {
        r.set("root_status", system::root_status(b, s)?);
        Ok(())
    }),
    ("Boot state", |b, s, r| {
        r.set("boot_state", system::boot_completion(b, s)?);
        Ok(())
    }),
    ("IMEI", |b, s, r| {
        r.set("imei", system::imei(b, s)?);
        Ok(())
    }),
];

fn prop(
    bridge: &dyn Bridge,
    serial: &str,
    report: &mut DeviceReport,
    key: &str,
    name: &str,
) -> Result<()> {
    report.set(key, props::lookup(bridge, serial, name)?);
    Ok(())
}

fn collect_battery(bridge: &dyn Bridge, serial: &str, report: &mut DeviceReport) -> Result<()> {
    let info = battery::query(bridge, serial)?;
    report.set_opt("battery_percentage", info.level_text());
    report.set_opt("battery_health", info.health_text());
    report.set_opt("battery_status", info.status_text());
    report.set_opt("battery_power_source", info.power_source());
    report.set_opt("battery_voltage", info.voltage_text());
    report.set_opt("battery_temperature", info.temperature_text());
    report.set_opt("battery_technology", info.technology.clone());
    report.set_battery(info);
    Ok(())
}

/// Collects a report for one selected device.
pub struct DeviceQuery<'a> {
    bridge: &'a dyn Bridge,
    device: Device,
    interrupted: Box<dyn Fn() -> bool + 'a>,
}

impl<'a> DeviceQuery<'a> {
    /// Query `device` through `bridge`, honouring the global interrupt
    /// checker.
    pub fn new(bridge: &'a dyn Bridge, device: Device) -> Self {
        Self {
            bridge,
            device,
            interrupted: Box::new(crate::is_interrupted_requested),
        }
    }

    /// Replace the interrupt check consulted before each step.
    #[must_use]
    pub fn with_interrupt_check<F>(mut self, check: F) -> Self
    where
        F: Fn() -> bool + 'a,
    {
        self.interrupted = Box::new(check);
        self
    }

    /// The device being queried.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Number of progress steps [`collect`](Self::collect) reports.
    pub fn step_count() -> usize {
        STEPS.len()
    }

    /// Run every step in order.
    ///
    /// `progress` receives `(label, step, total)` before each step, with
    /// `step` counting from 1.
    pub fn collect(&self, progress: &mut dyn FnMut(&str, usize, usize)) -> Result<DeviceReport> {
        let serial = self.device.serial.as_str();
        let mut report = DeviceReport::new(self.device.clone());

        report.set("device_id", serial);
        report.set("status", self.device.state.as_str());
        // Answering shell commands at all means USB debugging is on.
        report.set("usb_debugging", "Enabled");

        let total = STEPS.len();
        let mut failed = 0usize;
        for (index, (label, probe)) in STEPS.iter().enumerate() {
            if (self.interrupted)() {
                return Err(Error::Interrupted);
            }
            progress(label, index + 1, total);
            if let Err(e) = probe(self.bridge, serial, &mut report) {
                debug!("{label} unavailable: {e}");
                failed += 1;
            }
        }

        info!(
            "Collected {} fields from {serial} ({failed} of {total} steps failed)",
            report.known_count()
        );
        Ok(report)
    }
}

/// List devices, select one, and collect its report without progress output.
pub fn query_device(bridge: &dyn Bridge, requested: Option<&str>) -> Result<DeviceReport> {
    let devices = bridge.devices()?;
    let device = select_device(&devices, requested)?;
    DeviceQuery::new(bridge, device).collect(&mut |_, _, _| {})
}
