//! Integration tests for core CLI contract behavior.

use {predicates::prelude::*, std::fs, tempfile::tempdir};

fn cli_cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("droidinfo")
}

/// A command isolated from the caller's environment and config files.
fn isolated_cmd(dir: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cli_cmd();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("ANDROID_SERIAL")
        .env_remove("DROIDINFO_ADB")
        .env_remove("DROIDINFO_TIMEOUT")
        .env_remove("DROIDINFO_NON_INTERACTIVE")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[cfg(unix)]
const ONE_DEVICE: &str = "emulator-5554          device product:sdk_gphone64 model:Pixel_7 device:emu64a transport_id:1";

#[cfg(unix)]
const TWO_DEVICES: &str = "emulator-5554          device product:sdk_gphone64 model:Pixel_7 device:emu64a transport_id:1\nR58M12ABCDE            device product:a52q model:SM_A525F device:a52q transport_id:2";

/// Write an executable stand-in for `adb` into `dir`.
///
/// `overrides` are extra `case "$4"` arms tried before the defaults.
#[cfg(unix)]
fn fake_adb(dir: &std::path::Path, devices: &str, overrides: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let listing = devices
        .lines()
        .map(|line| format!("    printf '%s\\n' '{line}'\n"))
        .collect::<String>();
    let script = format!(
        r#"#!/bin/sh
case "$1" in
  version)
    printf '%s\n' 'Android Debug Bridge version 1.0.41'
    exit 0
    ;;
  kill-server|start-server)
    exit 0
    ;;
  devices)
    printf '%s\n' 'List of devices attached'
{listing}    exit 0
    ;;
  -s)
    ;;
  *)
    exit 1
    ;;
esac

case "$4" in
{overrides}
  'getprop ro.serialno') printf '%s\n' "$2" ;;
  'getprop ro.product.manufacturer') printf '%s\n' 'Google' ;;
  'getprop ro.product.brand') printf '%s\n' 'google' ;;
  'getprop ro.product.model') printf '%s\n' 'Pixel 7' ;;
  'getprop ro.product.device') printf '%s\n' 'panther' ;;
  'getprop ro.product.name') printf '%s\n' 'panther' ;;
  'getprop ro.build.version.release') printf '%s\n' '14' ;;
  'getprop ro.build.version.sdk') printf '%s\n' '34' ;;
  'getprop ro.build.display.id') printf '%s\n' 'UQ1A.240105.004' ;;
  'getprop persist.sys.locale') printf '%s\n' 'en-US' ;;
  'getprop gsm.sim.operator.iso-country') printf '%s\n' 'us' ;;
  'getprop ro.product.cpu.abi') printf '%s\n' 'arm64-v8a' ;;
  'getprop ro.build.version.security_patch') printf '%s\n' '2024-01-05' ;;
  'getprop sys.boot_completed') printf '%s\n' '1' ;;
  'uname -a') printf '%s\n' 'Linux localhost 5.10.198-android13 #1 SMP PREEMPT aarch64' ;;
  'cat /proc/uptime 2>/dev/null') printf '%s\n' '7384.20 28000.11' ;;
  'cat /proc/meminfo 2>/dev/null | grep MemTotal') printf '%s\n' 'MemTotal:        7823448 kB' ;;
  'wm size 2>/dev/null') printf '%s\n' 'Physical size: 1080x2400' ;;
  'df /data 2>/dev/null')
    printf '%s\n' 'Filesystem 1K-blocks Used Available Use% Mounted on'
    printf '%s\n' '/dev/block/dm-45 115393164 30456780 84805312 27% /data'
    ;;
  'dumpsys battery')
    printf '%s\n' 'Current Battery Service state:'
    printf '%s\n' '  AC powered: false'
    printf '%s\n' '  USB powered: true'
    printf '%s\n' '  status: 2'
    printf '%s\n' '  health: 2'
    printf '%s\n' '  level: 76'
    printf '%s\n' '  scale: 100'
    printf '%s\n' '  voltage: 4012'
    printf '%s\n' '  temperature: 301'
    printf '%s\n' '  technology: Li-ion'
    ;;
  *) exit 1 ;;
esac
exit 0
"#
    );

    let path = dir.join("fake-adb");
    fs::write(&path, script).expect("fake adb should be written");
    let mut perms = fs::metadata(&path)
        .expect("fake adb metadata")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("fake adb should be executable");
    path
}

#[test]
fn help_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("droidinfo"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn version_exits_zero_and_writes_stdout_only() {
    let mut cmd = cli_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("droidinfo"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn unknown_subcommand_is_usage_error() {
    let mut cmd = cli_cmd();
    cmd.arg("frobnicate")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty());
}

#[test]
fn zero_timeout_is_rejected() {
    let dir = tempdir().expect("tempdir should be created");
    isolated_cmd(dir.path())
        .args(["--timeout", "0"])
        .assert()
        .code(2);
}

#[test]
fn completions_bash_writes_script_to_stdout() {
    let mut cmd = cli_cmd();
    cmd.args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("droidinfo"));
}

#[test]
fn missing_adb_exits_with_dedicated_code() {
    let dir = tempdir().expect("tempdir should be created");
    let missing = dir
        .path()
        .join("no-such-adb");

    isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&missing)
        .arg("--non-interactive")
        .assert()
        .code(6)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("adb executable not found"));
}

#[test]
fn invalid_explicit_config_exits_with_config_code() {
    let dir = tempdir().expect("tempdir should be created");
    let config = dir
        .path()
        .join("broken.toml");
    fs::write(&config, "[adb\npath = ").expect("config should be written");

    isolated_cmd(dir.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid TOML"));
}

#[cfg(unix)]
#[test]
fn no_device_exits_with_device_code() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), "", "");

    isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .arg("--non-interactive")
        .assert()
        .code(4)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No device connected"));
}

#[cfg(unix)]
#[test]
fn unauthorized_device_is_reported_with_hint() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), "R58M12ABCDE            unauthorized transport_id:3", "");

    isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .arg("--non-interactive")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("unauthorized"));
}

#[cfg(unix)]
#[test]
fn multiple_devices_without_serial_is_ambiguous() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), TWO_DEVICES, "");

    isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .arg("--non-interactive")
        .assert()
        .code(5)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Ambiguous"))
        .stderr(predicate::str::contains("R58M12ABCDE"));
}

#[cfg(unix)]
#[test]
fn single_device_report_lists_every_section() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");

    isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .arg("--non-interactive")
        .assert()
        .success()
        .stdout(predicate::str::contains("Device Identity"))
        .stdout(predicate::str::contains("Operating System"))
        .stdout(predicate::str::contains("Battery"))
        .stdout(predicate::str::contains("Hardware"))
        .stdout(predicate::str::contains("Security"))
        .stdout(predicate::str::contains("Pixel 7"))
        .stdout(predicate::str::contains("2h 3m"))
        .stdout(predicate::str::contains("76%"))
        .stdout(predicate::str::contains("1080x2400"))
        .stdout(predicate::str::contains("Not Rooted"))
        .stdout(predicate::str::contains("Boot Completed"));
}

#[cfg(unix)]
#[test]
fn failed_field_reads_unknown_and_the_rest_survive() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "  'uname -a') exit 1 ;;");

    let output = isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .arg("--non-interactive")
        .output()
        .expect("command should execute");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let kernel = stdout
        .lines()
        .find(|line| line.trim_start().starts_with("Kernel"))
        .expect("kernel line should be printed");
    assert!(kernel.ends_with("unknown"), "unexpected line: {kernel}");
    assert!(stdout.contains("Pixel 7"));
}

#[cfg(unix)]
#[test]
fn repeated_runs_print_identical_reports() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");

    let run = || {
        isolated_cmd(dir.path())
            .arg("--adb")
            .arg(&adb)
            .arg("--non-interactive")
            .output()
            .expect("command should execute")
            .stdout
    };
    assert_eq!(run(), run());
}

#[cfg(unix)]
#[test]
fn json_report_is_valid_and_stderr_is_clean() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");

    let output = isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .arg("--json")
        .output()
        .expect("command should execute");

    assert!(output.status.success());
    assert!(output.stderr.is_empty(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["ok"], true);
    assert_eq!(parsed["data"]["identity"]["model"], "Pixel 7");
    assert_eq!(parsed["data"]["identity"]["serial_number"], "emulator-5554");
    assert_eq!(parsed["data"]["battery"]["battery_percentage"], "76%");
    assert_eq!(parsed["data"]["security"]["root_status"], "Not Rooted");
    assert_eq!(parsed["data"]["security"]["imei"], "unknown");
}

#[cfg(unix)]
#[test]
fn serial_selects_one_of_several_devices() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), TWO_DEVICES, "");

    let output = isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .args(["--serial", "R58M12ABCDE", "--json"])
        .output()
        .expect("command should execute");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["data"]["identity"]["device_id"], "R58M12ABCDE");
    assert_eq!(parsed["data"]["identity"]["serial_number"], "R58M12ABCDE");
}

#[cfg(unix)]
#[test]
fn serial_from_environment_is_honored() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), TWO_DEVICES, "");

    isolated_cmd(dir.path())
        .env("ANDROID_SERIAL", "emulator-5554")
        .env("DROIDINFO_ADB", &adb)
        .arg("--non-interactive")
        .assert()
        .success()
        .stdout(predicate::str::contains("emulator-5554"));
}

#[cfg(unix)]
#[test]
fn unknown_serial_exits_with_device_code() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");

    isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .args(["--serial", "nope", "--non-interactive"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nope"));
}

#[cfg(unix)]
#[test]
fn output_flag_writes_report_file() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");
    let report = dir
        .path()
        .join("report.json");

    isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .arg("-o")
        .arg(&report)
        .arg("--non-interactive")
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved report"));

    let text = fs::read_to_string(&report).expect("report should be written");
    let parsed: serde_json::Value = serde_json::from_str(&text).expect("report should be JSON");
    assert_eq!(parsed["hardware"]["cpu_architecture"], "arm64-v8a");
    assert_eq!(parsed["os"]["api_level"], "34");
    assert!(parsed.get("ok").is_none());
}

#[cfg(unix)]
#[test]
fn info_subcommand_matches_default_command() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");

    let run = |subcommand: Option<&str>| {
        let mut cmd = isolated_cmd(dir.path());
        if let Some(name) = subcommand {
            cmd.arg(name);
        }
        cmd.arg("--adb")
            .arg(&adb)
            .arg("--json")
            .output()
            .expect("command should execute")
            .stdout
    };
    assert_eq!(run(None), run(Some("info")));
}

#[cfg(unix)]
#[test]
fn invalid_local_config_warns_and_continues() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");
    fs::write(
        dir.path()
            .join("droidinfo.toml"),
        "not = [valid",
    )
    .expect("config should be written");

    isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .arg("--non-interactive")
        .assert()
        .success()
        .stderr(predicate::str::contains("Invalid TOML"))
        .stdout(predicate::str::contains("Pixel 7"));
}

#[cfg(unix)]
#[test]
fn local_config_supplies_adb_path() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");
    fs::write(
        dir.path()
            .join("droidinfo.toml"),
        format!("[adb]\npath = {:?}\n", adb.display().to_string()),
    )
    .expect("config should be written");

    isolated_cmd(dir.path())
        .arg("--non-interactive")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pixel 7"));
}

#[cfg(unix)]
#[test]
fn devices_json_lists_all_states() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), TWO_DEVICES, "");

    let output = isolated_cmd(dir.path())
        .args(["devices", "--json"])
        .arg("--adb")
        .arg(&adb)
        .output()
        .expect("command should execute");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["ok"], true);
    let devices = parsed["data"]["devices"]
        .as_array()
        .expect("devices should be an array");
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[1]["serial"], "R58M12ABCDE");
    assert_eq!(devices[1]["state"], "device");
}

#[cfg(unix)]
#[test]
fn restart_server_announces_itself() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");

    isolated_cmd(dir.path())
        .arg("devices")
        .arg("--adb")
        .arg(&adb)
        .arg("--restart-server")
        .assert()
        .success()
        .stderr(predicate::str::contains("Restarting adb server"))
        .stdout(predicate::str::contains("emulator-5554"));
}

#[cfg(unix)]
#[test]
fn huge_timeout_runs_without_deadline() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");

    isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .args(["--timeout", "18446744073709551615", "--non-interactive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pixel 7"));
}

#[cfg(unix)]
#[test]
fn json_report_keeps_stderr_clean_despite_invalid_local_config() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), ONE_DEVICE, "");
    fs::write(
        dir.path()
            .join("droidinfo.toml"),
        "not = [valid",
    )
    .expect("config should be written");

    let output = isolated_cmd(dir.path())
        .arg("--adb")
        .arg(&adb)
        .arg("--json")
        .output()
        .expect("command should execute");

    assert!(output.status.success());
    assert!(output.stderr.is_empty(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["ok"], true);
}

#[cfg(unix)]
#[test]
fn devices_json_spells_unusual_states_as_strings() {
    let dir = tempdir().expect("tempdir should be created");
    let adb = fake_adb(dir.path(), "R58M12ABCDE            rescue transport_id:4", "");

    let output = isolated_cmd(dir.path())
        .args(["devices", "--json"])
        .arg("--adb")
        .arg(&adb)
        .output()
        .expect("command should execute");

    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["data"]["devices"][0]["state"], "rescue");
}
