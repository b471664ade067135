//! Host-side discovery of the `adb` executable.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

use crate::bridge::AdbProcess;
use crate::error::{Error, Result};

#[cfg(windows)]
const ADB_FILE: &str = "adb.exe";
#[cfg(not(windows))]
const ADB_FILE: &str = "adb";

/// Ordered list of executables to try.
///
/// An explicit path is the only candidate when given. Otherwise the search
/// covers `PATH`, the SDK pointed to by `ANDROID_HOME` / `ANDROID_SDK_ROOT`,
/// and a `platform-tools` directory next to or above the working directory.
pub fn candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    candidates_from(
        explicit,
        env::var_os("ANDROID_HOME"),
        env::var_os("ANDROID_SDK_ROOT"),
    )
}

fn candidates_from(
    explicit: Option<&Path>,
    android_home: Option<OsString>,
    sdk_root: Option<OsString>,
) -> Vec<PathBuf> {
    if let Some(path) = explicit {
        return vec![path.to_path_buf()];
    }

    let mut list = vec![PathBuf::from(ADB_FILE)];
    for sdk in [android_home, sdk_root]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
    {
        list.push(
            PathBuf::from(sdk)
                .join("platform-tools")
                .join(ADB_FILE),
        );
    }
    list.push(Path::new("platform-tools").join(ADB_FILE));
    list.push(
        Path::new(".")
            .join("platform-tools")
            .join(ADB_FILE),
    );
    list.push(
        Path::new("..")
            .join("platform-tools")
            .join(ADB_FILE),
    );

    let mut unique: Vec<PathBuf> = Vec::with_capacity(list.len());
    for path in list {
        if !unique.contains(&path) {
            unique.push(path);
        }
    }
    unique
}

/// Find a working `adb` and return a bridge for it.
///
/// Each candidate is probed with `adb version`; the first that answers wins.
pub fn locate_adb(explicit: Option<&Path>, timeout: Duration) -> Result<AdbProcess> {
    let list = candidates(explicit);

    for candidate in &list {
        let adb = AdbProcess::new(candidate).with_timeout(timeout);
        match adb.version() {
            Ok(version) => {
                info!("Using {} ({version})", candidate.display());
                return Ok(adb);
            },
            Err(e) => debug!("{} is not usable: {e}", candidate.display()),
        }
    }

    Err(Error::AdbNotFound {
        searched: list
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}
