//! Bridge abstraction over the `adb` command-line tool.
//!
//! Everything the crate knows about a device comes out of an `adb`
//! invocation. The [`Bridge`] trait models exactly one such invocation so the
//! query layer can be driven by the real executable or by a scripted stand-in:
//!
//! ```text
//! +------------------+
//! |   DeviceQuery    |   getprop / dumpsys / cat / df ...
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! |   Bridge trait   |   exec(["-s", serial, "shell", cmd])
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! |    AdbProcess    |   std::process + timeout
//! +------------------+
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use droidinfo::{AdbProcess, Bridge};
//!
//! fn main() -> droidinfo::Result<()> {
//!     let adb = AdbProcess::new("adb");
//!     for device in adb.devices()? {
//!         println!("{} {}", device.serial, device.state);
//!     }
//!     Ok(())
//! }
//! ```

pub mod native;

pub use native::AdbProcess;

use log::debug;

use crate::device::{Device, parse_devices};
use crate::error::{Error, Result};

/// Captured result of one `adb` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub status: Option<i32>,
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// Return stdout if the invocation succeeded, or a [`Error::CommandFailed`].
    pub fn into_stdout(self, command: &str) -> Result<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(self.into_failure(command))
        }
    }

    fn into_failure(self, command: &str) -> Error {
        Error::CommandFailed {
            command: command.to_string(),
            status: self.status.unwrap_or(-1),
            stderr: self.stderr.trim().to_string(),
        }
    }
}

/// One-shot access to the `adb` tool.
pub trait Bridge {
    /// Run `adb` with `args` and capture its output.
    fn exec(&self, args: &[&str]) -> Result<CommandOutput>;

    /// List devices known to the adb server (`adb devices -l`).
    fn devices(&self) -> Result<Vec<Device>> {
        let stdout = self
            .exec(&["devices", "-l"])?
            .into_stdout("devices -l")?;
        Ok(parse_devices(&stdout))
    }

    /// Run `command` through the device shell and return its cleaned stdout.
    ///
    /// The command is passed as a single argument, so device-side pipes and
    /// redirections work. A non-zero exit is only an error when nothing was
    /// printed.
    fn shell(&self, serial: &str, command: &str) -> Result<String> {
        let output = self.exec(&["-s", serial, "shell", command])?;
        let stdout = clean_output(&output.stdout);

        if output.success {
            return Ok(stdout);
        }
        if stdout.is_empty() {
            return Err(output.into_failure(&format!("-s {serial} shell {command}")));
        }

        debug!(
            "`{command}` exited with {:?} but printed output, keeping it",
            output.status
        );
        Ok(stdout)
    }
}

impl<B: Bridge + ?Sized> Bridge for &B {
    fn exec(&self, args: &[&str]) -> Result<CommandOutput> {
        (**self).exec(args)
    }
}

/// Strip carriage returns (older adb versions translate `\n` to `\r\n`) and
/// surrounding whitespace.
pub fn clean_output(raw: &str) -> String {
    raw.replace('\r', "")
        .trim()
        .to_string()
}
