use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn strata_cmd() -> Command {
    Command::cargo_bin("strata").unwrap()
}

const SHA_A: &str = "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb";

fn write_corpus(tmp: &TempDir) -> std::path::PathBuf {
    let dir = tmp.path().join("recipes");
    fs::create_dir(&dir).unwrap();
    fs::write(
        dir.join("widget.toml"),
        format!(
            r#"
[package]
name = "widget"
description = "A demonstration widget"

[[version]]
version = "3.1"
sha256 = "{SHA_A}"

[variants.shared]
kind = "bool"
default = true

[variants.backend]
kind = "single"
values = ["gl", "vulkan"]
default = "gl"
"#
        ),
    )
    .unwrap();
    dir
}

#[test]
fn list_names_every_package() {
    let tmp = TempDir::new().unwrap();
    let recipes = write_corpus(&tmp);

    strata_cmd()
        .args(["list", "--recipes"])
        .arg(&recipes)
        .assert()
        .success()
        .stdout(predicate::str::contains("widget"))
        .stdout(predicate::str::contains("1 packages"));
}

#[test]
fn list_describes_one_package() {
    let tmp = TempDir::new().unwrap();
    let recipes = write_corpus(&tmp);

    strata_cmd()
        .args(["list", "widget", "--recipes"])
        .arg(&recipes)
        .assert()
        .success()
        .stdout(predicate::str::contains("A demonstration widget"))
        .stdout(predicate::str::contains("backend = gl"));
}

#[test]
fn check_reports_a_clean_corpus() {
    let tmp = TempDir::new().unwrap();
    let recipes = write_corpus(&tmp);

    strata_cmd()
        .args(["check", "--recipes"])
        .arg(&recipes)
        .assert()
        .success()
        .stderr(predicate::str::contains("no problems"));
}

#[test]
fn check_warns_about_dangling_dependencies() {
    let tmp = TempDir::new().unwrap();
    let recipes = write_corpus(&tmp);
    fs::write(
        recipes.join("broken.toml"),
        format!(
            r#"
[package]
name = "broken"

[[version]]
version = "1.0"
sha256 = "{SHA_A}"

[[dependency]]
spec = "missing"
"#
        ),
    )
    .unwrap();

    strata_cmd()
        .args(["check", "--recipes"])
        .arg(&recipes)
        .assert()
        .success()
        .stderr(predicate::str::contains("missing"));
}
