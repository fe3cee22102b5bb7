use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <bin name="boot.bin">
    <offset>0x0</offset>
    <length>0x1000</length>
  </bin>
  <bin name="app.bin">
    <offset>0x1000</offset>
    <length>0x1F000</length>
  </bin>
</root>
"#;

struct Workspace {
    dir: TempDir,
    data: Vec<u8>,
}

impl Workspace {
    fn new(manifest: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let data: Vec<u8> = (0..0x20000u32).map(|i| (i.wrapping_mul(31) >> 3) as u8).collect();
        fs::write(dir.path().join("flash.bin"), &data).unwrap();
        fs::write(dir.path().join("layout.xml"), manifest).unwrap();
        Self { dir, data }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn out(&self) -> PathBuf {
        self.path("out")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("binsplit").unwrap();
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Runs with relative paths so the CLI has to resolve them itself.
    fn split(&self, extra: &[&str]) -> assert_cmd::assert::Assert {
        self.command()
            .args(["-i", "flash.bin", "-o", "out", "-c", "layout.xml"])
            .args(["--output-format", "plain"])
            .args(extra)
            .assert()
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn splits_image_into_manifest_fragments() {
    let ws = Workspace::new(MANIFEST);

    ws.split(&[])
        .success()
        .stdout(predicate::str::contains("binary length = 4.00KB"))
        .stdout(predicate::str::contains("binary length = 124.00KB"))
        .stdout(predicate::str::contains("INFO - Binary Config Path"));

    assert_eq!(file_names(&ws.out()), vec!["app.bin", "boot.bin"]);
    let boot = fs::read(ws.out().join("boot.bin")).unwrap();
    let app = fs::read(ws.out().join("app.bin")).unwrap();
    assert_eq!(boot.len(), 4096);
    assert_eq!(app.len(), 126976);
    assert_eq!(boot, &ws.data[..0x1000]);
    assert_eq!(app, &ws.data[0x1000..]);
}

#[test]
fn path_log_lines_show_resolved_paths() {
    let ws = Workspace::new(MANIFEST);
    let config = fs::canonicalize(ws.path("layout.xml")).unwrap();
    let config = format!("Binary Config Path = {}", config.display());

    ws.split(&[]).success().stdout(predicate::str::contains(config));
}

#[test]
fn rerunning_replaces_previous_output() {
    let ws = Workspace::new(MANIFEST);
    fs::create_dir_all(ws.out()).unwrap();
    fs::write(ws.out().join("boot.bin"), vec![0u8; 9000]).unwrap();

    ws.split(&[]).success();
    let first = fs::read(ws.out().join("boot.bin")).unwrap();
    ws.split(&[]).success();
    let second = fs::read(ws.out().join("boot.bin")).unwrap();

    assert_eq!(first, second);
    assert_eq!(second, &ws.data[..0x1000]);
}

#[test]
fn output_pointing_at_a_file_writes_next_to_it() {
    let ws = Workspace::new(MANIFEST);
    fs::create_dir_all(ws.out()).unwrap();
    fs::write(ws.out().join("marker.txt"), b"keep").unwrap();

    ws.command()
        .args(["-i", "flash.bin", "-o", "out/marker.txt", "-c", "layout.xml"])
        .assert()
        .success();

    assert_eq!(
        file_names(&ws.out()),
        vec!["app.bin", "boot.bin", "marker.txt"]
    );
}

#[test]
fn missing_config_succeeds_without_output() {
    let ws = Workspace::new(MANIFEST);
    fs::remove_file(ws.path("layout.xml")).unwrap();

    ws.split(&[])
        .success()
        .stdout(predicate::str::contains("WARNING"))
        .stdout(predicate::str::contains("does not exist"));

    assert!(!ws.out().exists());
}

#[test]
fn malformed_config_logs_error_and_writes_nothing() {
    let ws = Workspace::new("<root><bin name=\"boot.bin\"><offset>0x0</offset><length>0x10</length></bin><bin name=");

    ws.split(&[])
        .success()
        .stderr(predicate::str::contains("ERROR"))
        .stderr(predicate::str::contains("is parse error"));

    assert!(!ws.out().exists());
}

#[test]
fn missing_input_is_fatal() {
    let ws = Workspace::new(MANIFEST);
    fs::remove_file(ws.path("flash.bin")).unwrap();

    ws.split(&[])
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Input binary not found"));

    assert!(!ws.out().exists());
}

#[test]
fn fragment_past_end_of_input_is_fatal() {
    let ws = Workspace::new(
        r#"<root><bin name="big.bin"><offset>0x1F000</offset><length>0x2000</length></bin></root>"#,
    );

    ws.split(&[]).failure().code(5);
    assert!(!ws.out().join("big.bin").exists());
}

#[test]
fn short_reads_can_be_allowed() {
    let ws = Workspace::new(
        r#"<root><bin name="big.bin"><offset>0x1F000</offset><length>0x2000</length></bin></root>"#,
    );

    ws.split(&["--no-bounds-check", "--allow-short-read"])
        .success()
        .stdout(predicate::str::contains("truncated"));

    let big = fs::read(ws.out().join("big.bin")).unwrap();
    assert_eq!(big, &ws.data[0x1f000..]);
}

#[test]
fn log_threshold_hides_info() {
    let ws = Workspace::new(MANIFEST);

    ws.split(&["-l", "30"])
        .success()
        .stdout(predicate::str::contains("binary output").not());

    assert_eq!(file_names(&ws.out()), vec!["app.bin", "boot.bin"]);
}

#[test]
fn dry_run_writes_nothing() {
    let ws = Workspace::new(MANIFEST);

    ws.split(&["--dry-run"])
        .success()
        .stdout(predicate::str::contains("DRY RUN"))
        .stdout(predicate::str::contains("PLAN: app.bin"));

    assert!(!ws.out().exists());
}

#[test]
fn json_report() {
    let ws = Workspace::new(MANIFEST);

    let output = ws
        .command()
        .args(["-i", "flash.bin", "-o", "out", "-c", "layout.xml"])
        .args(["--output-format", "json", "--log", "50"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["fragments"].as_array().unwrap().len(), 2);
    assert_eq!(report["fragments"][0]["name"], "boot.bin");
    assert_eq!(report["input_size"], 0x20000);
}

#[test]
fn json_logs_stay_off_stdout() {
    let ws = Workspace::new(MANIFEST);

    let output = ws
        .command()
        .args(["-i", "flash.bin", "-o", "out", "-c", "layout.xml"])
        .args(["--output-format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["fragments"].as_array().unwrap().len(), 2);

    let stderr = String::from_utf8(output.stderr).unwrap();
    let first: serde_json::Value = serde_json::from_str(stderr.lines().next().unwrap()).unwrap();
    assert_eq!(first["type"], "log");
    assert!(stderr.contains("Binary Config Path"));
}

#[test]
fn settings_file_supplies_defaults() {
    let ws = Workspace::new(MANIFEST);
    fs::write(ws.path("binsplit.toml"), "[logging]\nlevel = 40\n").unwrap();

    ws.split(&[])
        .success()
        .stdout(predicate::str::contains("binary output").not());

    ws.split(&["--log", "20"])
        .success()
        .stdout(predicate::str::contains("binary output"));
}

#[test]
fn invalid_settings_file_is_reported() {
    let ws = Workspace::new(MANIFEST);
    fs::write(ws.path("custom.toml"), "[extract]\nbounds_check = \"maybe\"\n").unwrap();

    ws.split(&["--settings", "custom.toml"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Settings error"));
}

#[test]
fn version_flag() {
    let ws = Workspace::new(MANIFEST);

    for flag in ["-v", "--version"] {
        ws.command()
            .arg(flag)
            .assert()
            .success()
            .stdout(predicate::str::contains("binsplit 0.1.2"));
    }
}

#[test]
fn missing_required_arguments() {
    let ws = Workspace::new(MANIFEST);

    ws.command()
        .args(["-i", "flash.bin"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn generate_settings_writes_sample() {
    let ws = Workspace::new(MANIFEST);

    ws.command()
        .args(["--generate-settings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("binsplit.toml"));

    let content = fs::read_to_string(ws.path("binsplit.toml")).unwrap();
    assert!(content.contains("[extract]"));
}
