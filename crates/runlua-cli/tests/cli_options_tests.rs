use assert_cmd::Command;
use indoc::indoc;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

// Helper to create runlua command using the non-deprecated macro approach
fn runlua_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("runlua"))
}

/// Working directory with a module at the root and a script one level down
fn module_fixture() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("util.lua"),
        "return { tag = \"from util\" }\n",
    )
    .unwrap();
    fs::create_dir_all(temp_dir.path().join("sub")).unwrap();
    fs::write(
        temp_dir.path().join("sub/main.lua"),
        "print(require(\"util\").tag)\n",
    )
    .unwrap();
    temp_dir
}

// ============================================================================
// MODULE-LOADING CAPABILITY
// ============================================================================

/// --modules resolves require against the working directory, not the
/// script's own directory
#[test]
fn test_modules_flag_roots_require_at_the_working_directory() {
    let temp_dir = module_fixture();

    runlua_cmd()
        .current_dir(&temp_dir)
        .arg("--modules")
        .arg("sub/main.lua")
        .assert()
        .success()
        .stdout(predicate::str::contains("from util"));
}

/// Without --modules the same script has no require
#[test]
fn test_require_is_absent_by_default() {
    let temp_dir = module_fixture();

    runlua_cmd()
        .current_dir(&temp_dir)
        .arg("sub/main.lua")
        .assert()
        .failure()
        .stderr(predicate::str::contains("require"));
}

/// --module-root points the capability somewhere other than the cwd
#[test]
fn test_module_root_overrides_the_working_directory() {
    let temp_dir = TempDir::new().unwrap();
    let modules = temp_dir.path().join("modules");
    fs::create_dir_all(&modules).unwrap();
    fs::write(modules.join("util.lua"), "return { tag = \"rooted\" }\n").unwrap();
    let script = temp_dir.path().join("main.lua");
    fs::write(&script, "print(require(\"util\").tag)\n").unwrap();

    runlua_cmd()
        .arg("--modules")
        .arg("--module-root")
        .arg(&modules)
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("rooted"));
}

// ============================================================================
// CONFIGURATION FILE
// ============================================================================

/// An explicit --project config enables modules without the flag
#[test]
fn test_project_config_enables_modules() {
    let temp_dir = module_fixture();
    fs::write(
        temp_dir.path().join("config.json"),
        indoc! {r#"
            {
                "runner": {
                    "modules": true
                }
            }
        "#},
    )
    .unwrap();

    runlua_cmd()
        .current_dir(&temp_dir)
        .arg("--project")
        .arg("config.json")
        .arg("sub/main.lua")
        .assert()
        .success()
        .stdout(predicate::str::contains("from util"));
}

/// runlua.json in the working directory is picked up automatically
#[test]
fn test_runlua_json_is_found_in_the_working_directory() {
    let temp_dir = module_fixture();
    fs::write(
        temp_dir.path().join("runlua.json"),
        "{ \"runner\": { \"modules\": true } }\n",
    )
    .unwrap();

    runlua_cmd()
        .current_dir(&temp_dir)
        .arg("sub/main.lua")
        .assert()
        .success()
        .stdout(predicate::str::contains("from util"));
}

/// A malformed config file is a startup failure
#[test]
fn test_malformed_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("config.json"), "not json").unwrap();
    let script = temp_dir.path().join("ok.lua");
    fs::write(&script, "x = 1\n").unwrap();

    runlua_cmd()
        .arg("--project")
        .arg(temp_dir.path().join("config.json"))
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config"));
}

// ============================================================================
// RESOURCE LIMITS
// ============================================================================

/// A well-formed limit spec is applied before the script runs
#[test]
fn test_rlimit_spec_is_accepted() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("ok.lua");
    fs::write(&script, "x = 1\n").unwrap();

    runlua_cmd()
        .arg("--rlimit")
        .arg("CORE=0")
        .arg(&script)
        .assert()
        .success();
}

/// Limit specs are repeatable
#[test]
fn test_rlimit_specs_are_repeatable() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("ok.lua");
    fs::write(&script, "x = 1\n").unwrap();

    runlua_cmd()
        .arg("-r")
        .arg("CORE=0")
        .arg("-r")
        .arg("fsize=1000000")
        .arg(&script)
        .assert()
        .success();
}

/// A malformed limit spec fails before anything runs
#[test]
fn test_malformed_rlimit_spec_fails() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("ok.lua");
    fs::write(&script, "print(\"ran\")\n").unwrap();

    runlua_cmd()
        .arg("--rlimit")
        .arg("NOFILE")
        .arg(&script)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unable to parse rlimit"));
}

/// An unknown limit name is rejected
#[test]
fn test_unknown_rlimit_name_fails() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("ok.lua");
    fs::write(&script, "x = 1\n").unwrap();

    runlua_cmd()
        .arg("--rlimit")
        .arg("BOGUS=1")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no such limit"));
}
