//! Error types for droidinfo.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type for droidinfo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for droidinfo operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (spawning adb, reading its pipes).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No working adb executable was found.
    #[error("adb executable not found (searched: {searched})")]
    AdbNotFound {
        /// Candidates that were probed, comma-separated.
        searched: String,
    },

    /// An adb invocation did not finish in time and was killed.
    #[error("Timeout after {timeout:?}: adb {command}")]
    Timeout {
        /// The adb arguments, space-joined.
        command: String,
        /// The limit that was exceeded.
        timeout: Duration,
    },

    /// An adb invocation exited unsuccessfully without usable output.
    #[error("Command failed: adb {command} (exit status {status}): {stderr}")]
    CommandFailed {
        /// The adb arguments, space-joined.
        command: String,
        /// Exit status, `-1` when terminated by a signal.
        status: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// A query produced no output.
    #[error("Empty output from: {0}")]
    EmptyOutput(String),

    /// A query produced output that could not be interpreted.
    #[error("Unexpected output for {what}: {output:?}")]
    Parse {
        /// What was being parsed.
        what: &'static str,
        /// The offending text (possibly truncated).
        output: String,
    },

    /// No device in the `device` state is attached.
    #[error("No device connected")]
    NoDevice,

    /// More than one ready device is attached and none was requested.
    #[error("Ambiguous target: {} devices connected ({}); use --serial to choose one", .0.len(), .0.join(", "))]
    MultipleDevices(Vec<String>),

    /// The requested serial is not attached.
    #[error("Device {0} not found")]
    DeviceNotFound(String),

    /// The requested device is attached but cannot be queried.
    #[error("Device {serial} is {state}")]
    DeviceUnavailable {
        /// Serial of the device.
        serial: String,
        /// Connection state reported by adb.
        state: String,
    },

    /// The embedding application asked to stop.
    #[error("Interrupted")]
    Interrupted,
}

impl Error {
    /// Build a [`Error::Parse`] keeping at most a short excerpt of `output`.
    pub(crate) fn parse(what: &'static str, output: &str) -> Self {
        const EXCERPT: usize = 80;
        let output = match output.char_indices().nth(EXCERPT) {
            Some((idx, _)) => format!("{}...", &output[..idx]),
            None => output.to_string(),
        };
        Self::Parse { what, output }
    }

    /// Whether the error means there is no single device to talk to.
    pub fn is_device_selection(&self) -> bool {
        matches!(
            self,
            Self::NoDevice
                | Self::MultipleDevices(_)
                | Self::DeviceNotFound(_)
                | Self::DeviceUnavailable { .. }
        )
    }
}
