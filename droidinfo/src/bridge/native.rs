//! Native bridge backed by the `adb` executable.

use std::ffi::OsStr;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, trace};

use super::{Bridge, CommandOutput};
use crate::error::{Error, Result};

/// Default limit for a single adb invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// `CREATE_NO_WINDOW`: keep Windows from flashing a console per invocation.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs the `adb` executable as a child process.
#[derive(Debug, Clone)]
pub struct AdbProcess {
    program: PathBuf,
    timeout: Duration,
}

impl AdbProcess {
    /// Create a bridge for the given executable with the default timeout.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-invocation timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Per-invocation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `adb version`, first line only.
    pub fn version(&self) -> Result<String> {
        let stdout = self
            .exec(&["version"])?
            .into_stdout("version")?;
        Ok(stdout
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    /// Restart the adb server (`kill-server` followed by `start-server`).
    pub fn restart_server(&self) -> Result<()> {
        info!("Restarting adb server");
        // Fails harmlessly when no server is running.
        if let Err(e) = self
            .exec(&["kill-server"])
            .and_then(|o| o.into_stdout("kill-server"))
        {
            debug!("kill-server: {e}");
        }
        self.exec(&["start-server"])?
            .into_stdout("start-server")?;
        Ok(())
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }

    fn wait_with_timeout(&self, child: &mut Child, joined: &str) -> Result<std::process::ExitStatus> {
        // A timeout too large to represent means no deadline.
        let deadline = Instant::now().checked_add(self.timeout);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {},
                Err(e) => {
                    debug!("adb {joined}: wait failed ({e}), killing");
                    reap(child);
                    return Err(e.into());
                },
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                debug!("adb {joined} timed out after {:?}, killing", self.timeout);
                reap(child);
                return Err(Error::Timeout {
                    command: joined.to_string(),
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Bridge for AdbProcess {
    fn exec(&self, args: &[&str]) -> Result<CommandOutput> {
        let joined = args.join(" ");
        debug!("Running: {} {joined}", self.program.display());

        let mut child = self
            .command(args)
            .spawn()?;

        // Drain both pipes while waiting so a verbose child never blocks on a
        // full pipe buffer.
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = self.wait_with_timeout(&mut child, &joined)?;

        let output = CommandOutput {
            success: status.success(),
            status: status.code(),
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
        };
        trace!(
            "adb {joined} -> {:?}, {} bytes stdout, {} bytes stderr",
            output.status,
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(output)
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
