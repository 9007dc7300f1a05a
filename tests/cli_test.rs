/// CLI binary integration tests using assert_cmd
///
/// Each test points the binary at its own config file (with a private cache location) and
/// disables the log file, so nothing outside the temp directory is touched.
mod common;

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use common::{ModsDirBuilder, sample_mods_dir};
use mod_triage::{has_marker, read_marker};
use predicates::prelude::*;

fn write_config(mods: &ModsDirBuilder, extra: &str) -> PathBuf {
    let config = mods.scratch("config.json");
    let cache = mods.scratch("cache.json");
    let body = format!(r#"{{"cache_file": {}{}}}"#, serde_json::to_string(&cache).unwrap(), extra);
    std::fs::write(&config, body).unwrap();
    config
}

fn cli(config: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mod-triage"));
    cmd.env("MOD_TRIAGE_CONFIG", config).env_remove("MOD_TRIAGE_ROOT").arg("--no-log-file");
    cmd
}

#[test]
fn test_cli_no_command_shows_help_message() {
    let mods = ModsDirBuilder::new();
    let config = write_config(&mods, "");
    cli(&config).assert().success().stdout(predicate::str::contains("Use --help for usage information"));
}

#[test]
fn test_cli_help_lists_commands() {
    let mods = ModsDirBuilder::new();
    let config = write_config(&mods, "");
    cli(&config)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("triage"));
}

#[test]
fn test_cli_scan_lists_types() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, "");

    cli(&config)
        .arg("scan")
        .arg(mods.mods_dir())
        .assert()
        .success()
        .stdout(predicate::str::contains("Pickup"))
        .stdout(predicate::str::contains("Test Track"))
        .stdout(predicate::str::contains("3 archives (1 vehicles, 1 maps, 1 other), 0 sorted"));

    assert!(mods.scratch("cache.json").exists());
}

#[test]
fn test_cli_scan_json_with_category_filter() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, "");

    let output = cli(&config).args(["scan", "--json", "--category", "map"]).arg(mods.mods_dir()).output().unwrap();
    assert!(output.status.success());

    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["file"], "B.zip");
    assert_eq!(items[0]["type"], "Map");
}

#[test]
fn test_cli_scan_uses_root_from_environment() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, "");

    cli(&config)
        .env("MOD_TRIAGE_ROOT", mods.mods_dir())
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("A.zip"));
}

#[test]
fn test_cli_inspect() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, "");

    cli(&config)
        .arg("inspect")
        .arg(mods.path_of("A.zip"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Type:        Vehicle"))
        .stdout(predicate::str::contains("Name:        Pickup"))
        .stdout(predicate::str::contains("Configurations:\nbase, offroad"));
}

#[test]
fn test_cli_keep_marker_unmark() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, "");
    let archive = mods.path_of("B.zip");

    cli(&config).arg("keep").arg(&archive).assert().success().stdout(predicate::str::contains("Marked B.zip"));
    assert_eq!(read_marker(&archive).unwrap().name, "Test Track");

    cli(&config).arg("keep").arg(&archive).assert().success().stdout(predicate::str::contains("already marked"));
    cli(&config).arg("marker").arg(&archive).assert().success().stdout(predicate::str::contains("\"type\": \"Map\""));

    cli(&config).arg("unmark").arg(&archive).assert().success().stdout(predicate::str::contains("Removed marker"));
    assert!(!has_marker(&archive));
    cli(&config).arg("marker").arg(&archive).assert().success().stdout(predicate::str::contains("is not marked"));
}

#[test]
fn test_cli_move_to_configured_folder() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, r#", "move_folders": [{"name": "Cars", "path": "sorted/cars", "key": "c"}]"#);
    let archive = mods.path_of("A.zip");

    cli(&config).arg("keep").arg(&archive).assert().success();
    cli(&config)
        .args(["move"])
        .arg(&archive)
        .arg("Cars")
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved A.zip"));

    let moved = mods.mods_dir().join("sorted").join("cars").join("A.zip");
    assert!(!archive.exists());
    assert!(moved.exists());
    assert!(!has_marker(&moved));
}

#[test]
fn test_cli_delete_with_yes() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, "");
    let archive = mods.path_of("C.zip");

    cli(&config).args(["delete", "--yes"]).arg(&archive).assert().success();
    assert!(!archive.exists());
}

#[test]
fn test_cli_delete_cancelled_without_confirmation() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, "");
    let archive = mods.path_of("C.zip");

    cli(&config).arg("delete").arg(&archive).write_stdin("n\n").assert().success().stdout(predicate::str::contains("Cancelled"));
    assert!(archive.exists());
}

#[test]
fn test_cli_missing_archive_fails() {
    let mods = ModsDirBuilder::new();
    let config = write_config(&mods, "");

    cli(&config)
        .arg("inspect")
        .arg(mods.path_of("nope.zip"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Archive not found"));
}

#[test]
fn test_cli_malformed_config_fails() {
    let mods = sample_mods_dir();
    let config = mods.scratch("config.json");
    std::fs::write(&config, "{ broken").unwrap();

    cli(&config).arg("scan").arg(mods.mods_dir()).assert().failure().stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn test_cli_triage_session() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, "");

    cli(&config)
        .arg("triage")
        .arg(mods.mods_dir())
        .write_stdin("k\ns\ns\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/3]"))
        .stdout(predicate::str::contains("Marked as sorted"))
        .stdout(predicate::str::contains("No more mods to review."));

    assert!(has_marker(&mods.path_of("A.zip")));
    assert!(!has_marker(&mods.path_of("B.zip")));
}

#[test]
fn test_cli_triage_skip_marked() {
    let mods = sample_mods_dir();
    let config = write_config(&mods, r#", "skip_marked": true"#);
    cli(&config).arg("keep").arg(mods.path_of("A.zip")).assert().success();

    cli(&config)
        .arg("triage")
        .arg(mods.mods_dir())
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[2/3]"))
        .stdout(predicate::str::contains("B.zip"));
}
