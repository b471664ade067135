//! # droidinfo
//!
//! A library for reading device metadata from Android devices through the
//! Android Debug Bridge (`adb`).
//!
//! The crate drives the `adb` command-line tool and parses its text output:
//!
//! - locating the `adb` executable and listing attached devices
//! - system property lookup with vendor fallbacks
//! - battery, memory, storage, display and security probes
//! - collecting everything into a [`DeviceReport`]
//!
//! Every query is a single blocking `adb` invocation with a timeout. A query
//! that fails leaves its field unset instead of aborting the report.
//!
//! ## Features
//!
//! - `serde`: Serialization support for data types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use droidinfo::{DeviceQuery, locate_adb, select_device, Bridge};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adb = locate_adb(None, Duration::from_secs(10))?;
//!     let device = select_device(&adb.devices()?, None)?;
//!
//!     let report = DeviceQuery::new(&adb, device).collect(&mut |label, step, total| {
//!         eprintln!("[{step}/{total}] {label}");
//!     })?;
//!
//!     for (category, rows) in report.sections() {
//!         println!("{category}");
//!         for (field, value) in rows {
//!             println!("  {}: {value}", field.label);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::sync::{Arc, OnceLock};

pub mod battery;
pub mod bridge;
pub mod device;
pub mod error;
pub mod locate;
pub mod props;
pub mod query;
pub mod report;
pub mod system;

static INTERRUPT_CHECKER: OnceLock<Arc<dyn Fn() -> bool + Send + Sync>> = OnceLock::new();

/// Register a global interruption checker consulted between queries.
///
/// The checker should return `true` when the current operation should stop
/// (for example after receiving Ctrl-C in CLI applications).
pub fn set_interrupt_checker<F>(checker: F)
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    let _ = INTERRUPT_CHECKER.set(Arc::new(checker));
}

/// Returns whether interruption was requested by the embedding application.
#[must_use]
pub fn is_interrupted_requested() -> bool {
    INTERRUPT_CHECKER
        .get()
        .is_some_and(|checker| checker())
}

// Re-exports for convenience
pub use {
    battery::BatteryInfo,
    bridge::{AdbProcess, Bridge, CommandOutput},
    device::{Device, DeviceState, parse_devices, select_device},
    error::{Error, Result},
    locate::locate_adb,
    query::{DeviceQuery, query_device},
    report::{Category, DeviceReport, FIELDS, FieldDef, UNKNOWN},
    system::StorageInfo,
};
