//! Integration tests for the `stagehand` binary.
//!
//! Each test builds a small collection tree in a temporary directory and
//! drives the binary end to end, checking both output and the resulting
//! state of the tree.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

fn collection(namespace: &str, name: &str) -> TempDir {
    let root = TempDir::new().expect("tempdir");
    fs::write(
        root.path().join("galaxy.yml"),
        format!("namespace: {namespace}\nname: {name}\nversion: 1.0.0\n"),
    )
    .expect("write galaxy.yml");
    root
}

fn write_module(root: &Path, relative: &str) {
    let path = root.join("plugins/modules").join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, b"plugin").expect("write plugin");
}

fn runtime_yaml(root: &Path) -> serde_yaml::Value {
    let text = fs::read_to_string(root.join("meta/runtime.yml")).expect("read runtime");
    serde_yaml::from_str(&text).expect("parse runtime")
}

#[test]
fn help_shows_subcommands() {
    let mut command = cargo_bin_cmd!("stagehand");
    command.arg("--help");
    command
        .assert()
        .failure()
        .stderr(contains("redirect").and(contains("validate")));
}

#[test]
fn redirect_requires_a_collection_root() {
    let root = TempDir::new().expect("tempdir");
    let mut command = cargo_bin_cmd!("stagehand");
    command.current_dir(root.path());
    command.args(["redirect", "--target", "meta"]);
    command
        .assert()
        .failure()
        .stderr(contains("galaxy.yml"));
}

#[test]
fn redirect_to_meta_moves_symlinks_into_the_manifest() {
    let root = collection("ns", "coll");
    write_module(root.path(), "new.py");
    symlink("new.py", root.path().join("plugins/modules/old.py")).expect("symlink");

    let mut command = cargo_bin_cmd!("stagehand");
    command.current_dir(root.path());
    command.args(["redirect", "--target", "meta"]);
    command
        .assert()
        .success()
        .stdout(
            contains("Working on collection ns.coll")
                .and(contains("Found 1 redirect for plugin type modules")),
        );

    // the link is gone, the manifest has the redirect
    assert!(!root.path().join("plugins/modules/old.py").exists());
    let runtime = runtime_yaml(root.path());
    let redirect = runtime
        .get("plugin_routing")
        .and_then(|v| v.get("modules"))
        .and_then(|v| v.get("old"))
        .and_then(|v| v.get("redirect"))
        .and_then(serde_yaml::Value::as_str);
    assert_eq!(redirect, Some("ns.coll.new"));
}

#[test]
fn redirect_to_symlinks_strips_manifest_redirects() {
    let root = collection("ns", "coll");
    write_module(root.path(), "new.py");
    fs::create_dir_all(root.path().join("meta")).expect("mkdir");
    fs::write(
        root.path().join("meta/runtime.yml"),
        "plugin_routing:\n  modules:\n    old:\n      redirect: ns.coll.new\n",
    )
    .expect("write runtime");

    let mut command = cargo_bin_cmd!("stagehand");
    command.current_dir(root.path());
    command.args(["redirect", "--target", "symlinks"]);
    command.assert().success();

    let link = root.path().join("plugins/modules/old.py");
    assert_eq!(
        fs::read_link(&link).expect("read link"),
        Path::new("new.py"),
    );
    let runtime = runtime_yaml(root.path());
    let entry = runtime
        .get("plugin_routing")
        .and_then(|v| v.get("modules"))
        .and_then(|v| v.get("old"))
        .and_then(serde_yaml::Value::as_mapping);
    assert!(
        entry.is_none_or(|m| !m.contains_key("redirect")),
        "manifest still holds the redirect",
    );
}

#[test]
fn redirect_with_flatmap_adds_basename_redirects() {
    let root = collection("ns", "coll");
    write_module(root.path(), "cloud/instance.py");

    let mut command = cargo_bin_cmd!("stagehand");
    command.current_dir(root.path());
    command.args(["redirect", "--target", "meta", "--flatmap"]);
    command.assert().success();

    let runtime = runtime_yaml(root.path());
    let redirect = runtime
        .get("plugin_routing")
        .and_then(|v| v.get("modules"))
        .and_then(|v| v.get("instance"))
        .and_then(|v| v.get("redirect"))
        .and_then(serde_yaml::Value::as_str);
    assert_eq!(redirect, Some("ns.coll.cloud.instance"));
}

#[test]
fn validate_passes_on_consistent_collection() {
    let root = collection("ns", "coll");
    write_module(root.path(), "ping.py");

    let mut command = cargo_bin_cmd!("stagehand");
    command.current_dir(root.path());
    command.arg("validate");
    command.assert().success();
}

#[test]
fn validate_accepts_redirects_with_real_targets() {
    let root = collection("ns", "coll");
    write_module(root.path(), "new.py");
    symlink("new.py", root.path().join("plugins/modules/old.py")).expect("symlink");

    let mut command = cargo_bin_cmd!("stagehand");
    command.current_dir(root.path());
    command.arg("validate");
    command.assert().success();
}

#[test]
fn validate_reports_missing_redirect_targets() {
    let root = collection("ns", "coll");
    fs::create_dir_all(root.path().join("meta")).expect("mkdir");
    fs::write(
        root.path().join("meta/runtime.yml"),
        "plugin_routing:\n  modules:\n    old:\n      redirect: ns.coll.vanished\n",
    )
    .expect("write runtime");

    let mut command = cargo_bin_cmd!("stagehand");
    command.current_dir(root.path());
    command.arg("validate");
    command
        .assert()
        .failure()
        .stdout(
            contains("1 modules plugin are missing:")
                .and(contains("old (redirected to: vanished)")),
        );
}

#[test]
fn check_core_redirects_reports_dangling_targets() {
    let root = collection("ns", "coll");
    write_module(root.path(), "carried.py");
    let core = root.path().join("core_runtime.yml");
    fs::write(
        &core,
        "plugin_routing:\n\
         \x20 modules:\n\
         \x20   moved:\n\
         \x20     redirect: ns.coll.vanished\n\
         \x20   carried:\n\
         \x20     redirect: other.place.carried\n",
    )
    .expect("write core runtime");

    let mut command = cargo_bin_cmd!("stagehand");
    command.current_dir(root.path());
    command.args([
        "check-core-redirects",
        "--core-runtime",
        core.to_str().expect("utf8 path"),
    ]);
    command
        .assert()
        .failure()
        .stdout(
            contains("ERROR: core modules moved redirects to ns.coll.vanished")
                .and(contains("WARNING: core modules carried redirects to other.place.carried")),
        );
}

#[test]
fn show_redirects_inventory_lists_collections() {
    let root = TempDir::new().expect("tempdir");
    let core = root.path().join("core_runtime.yml");
    fs::write(
        &core,
        "plugin_routing:\n\
         \x20 modules:\n\
         \x20   a:\n\
         \x20     redirect: zeta.coll.a\n\
         \x20   b:\n\
         \x20     redirect: alpha.coll.b\n",
    )
    .expect("write core runtime");

    let mut command = cargo_bin_cmd!("stagehand");
    command.args([
        "show-redirects-inventory",
        "--core-runtime",
        core.to_str().expect("utf8 path"),
    ]);
    command
        .assert()
        .success()
        .stdout(contains("alpha.coll\nzeta.coll\n"));
}
