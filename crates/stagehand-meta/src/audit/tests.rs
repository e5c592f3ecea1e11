//! Unit tests for inventory and consistency checks.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use super::*;
use crate::manifest::RuntimeManifest;

fn manifest_from(text: &str) -> RuntimeManifest {
    RuntimeManifest::from_mapping(serde_yaml::from_str(text).expect("parse"))
}

fn write_plugin(root: &Path, plugin_type: PluginType, relative: &str) {
    let path = plugin_type.dir(root).join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, b"plugin").expect("write");
}

#[test]
fn scan_finds_plugin_files_and_nested_names() {
    let root = TempDir::new().expect("tempdir");
    write_plugin(root.path(), PluginType::Modules, "ping.py");
    write_plugin(root.path(), PluginType::Modules, "cloud/instance.py");

    let inventory = scan_plugins(
        &Redirects::new(),
        &RuntimeManifest::new(),
        root.path(),
        false,
    )
    .expect("scan");
    assert!(inventory.contains(PluginType::Modules, "ping"));
    assert!(inventory.contains(PluginType::Modules, "cloud.instance"));
    assert!(!inventory.contains(PluginType::Modules, "cloud"));
}

#[test]
fn scan_counts_module_utils_packages() {
    let root = TempDir::new().expect("tempdir");
    write_plugin(root.path(), PluginType::ModuleUtils, "net/common.py");

    let inventory = scan_plugins(
        &Redirects::new(),
        &RuntimeManifest::new(),
        root.path(),
        false,
    )
    .expect("scan");
    assert!(inventory.contains(PluginType::ModuleUtils, "net"));
    assert!(inventory.contains(PluginType::ModuleUtils, "net.common"));
}

#[test]
fn scan_includes_redirect_sources_and_destinations() {
    let root = TempDir::new().expect("tempdir");
    let mut redirects = Redirects::new();
    redirects
        .record(PluginType::Lookup, "old", "new")
        .expect("record");

    let inventory =
        scan_plugins(&redirects, &RuntimeManifest::new(), root.path(), false).expect("scan");
    assert!(inventory.contains(PluginType::Lookup, "old"));
    assert!(inventory.contains(PluginType::Lookup, "new"));
}

#[test]
fn scan_includes_tombstones_always_and_all_entries_on_request() {
    let root = TempDir::new().expect("tempdir");
    let runtime = manifest_from(
        "plugin_routing:\n\
         \x20 modules:\n\
         \x20   dead:\n\
         \x20     tombstone:\n\
         \x20       removal_version: 1.0.0\n\
         \x20   routed:\n\
         \x20     deprecation:\n\
         \x20       removal_version: 2.0.0\n",
    );

    let tombstones_only =
        scan_plugins(&Redirects::new(), &runtime, root.path(), false).expect("scan");
    assert!(tombstones_only.contains(PluginType::Modules, "dead"));
    assert!(!tombstones_only.contains(PluginType::Modules, "routed"));

    let everything = scan_plugins(&Redirects::new(), &runtime, root.path(), true).expect("scan");
    assert!(everything.contains(PluginType::Modules, "routed"));
}

#[test]
fn validate_accepts_redirect_chains() {
    let root = TempDir::new().expect("tempdir");
    write_plugin(root.path(), PluginType::Modules, "real.py");
    let mut redirects = Redirects::new();
    redirects
        .record(PluginType::Modules, "older", "old")
        .expect("record");
    redirects
        .record(PluginType::Modules, "old", "real")
        .expect("record");

    // inventory without redirect names, so chains must resolve themselves
    let inventory = scan_plugins(
        &Redirects::new(),
        &RuntimeManifest::new(),
        root.path(),
        false,
    )
    .expect("scan");
    let report = validate(&inventory, &redirects, &RuntimeManifest::new());
    assert!(report.is_ok(), "unexpected missing: {:?}", report.missing);
}

#[test]
fn validate_reports_dangling_redirects_with_target() {
    let root = TempDir::new().expect("tempdir");
    let mut redirects = Redirects::new();
    redirects
        .record(PluginType::Modules, "old", "vanished")
        .expect("record");

    let inventory = scan_plugins(
        &Redirects::new(),
        &RuntimeManifest::new(),
        root.path(),
        false,
    )
    .expect("scan");
    let report = validate(&inventory, &redirects, &RuntimeManifest::new());
    assert_eq!(
        report.missing,
        vec![MissingPlugin {
            plugin_type: PluginType::Modules,
            name: "old".to_owned(),
            redirect: Some("vanished".to_owned()),
        }],
    );
}

#[test]
fn validate_reports_routing_entries_without_plugin() {
    let root = TempDir::new().expect("tempdir");
    let runtime = manifest_from(
        "plugin_routing:\n\
         \x20 modules:\n\
         \x20   ghost:\n\
         \x20     deprecation:\n\
         \x20       removal_version: 2.0.0\n",
    );
    let inventory = scan_plugins(&Redirects::new(), &runtime, root.path(), false).expect("scan");
    let report = validate(&inventory, &Redirects::new(), &runtime);
    assert_eq!(report.missing.len(), 1);
    let missing = report.missing.first().expect("missing entry");
    assert_eq!(missing.name, "ghost");
    assert_eq!(missing.redirect, None);
}

#[test]
fn core_check_flags_dangling_and_foreign_redirects() {
    let root = TempDir::new().expect("tempdir");
    write_plugin(root.path(), PluginType::Modules, "carried.py");
    let inventory = scan_plugins(
        &Redirects::new(),
        &RuntimeManifest::new(),
        root.path(),
        false,
    )
    .expect("scan");

    let core = manifest_from(
        "plugin_routing:\n\
         \x20 modules:\n\
         \x20   moved:\n\
         \x20     redirect: ns.coll.vanished\n\
         \x20   carried:\n\
         \x20     redirect: other.place.carried\n\
         \x20   unrelated:\n\
         \x20     redirect: third.coll.thing\n",
    );
    let report = check_core_redirects(&core, &inventory, "ns.coll");
    assert!(report.has_errors());
    assert_eq!(
        report.issues,
        vec![
            CoreIssue::MissingTarget {
                plugin_type: PluginType::Modules,
                plugin_name: "moved".to_owned(),
                target: "vanished".to_owned(),
            },
            CoreIssue::ForeignRedirect {
                plugin_type: PluginType::Modules,
                plugin_name: "carried".to_owned(),
                redirect: "other.place.carried".to_owned(),
            },
        ],
    );
}

#[test]
fn inventory_lists_redirect_collections_sorted() {
    let core = manifest_from(
        "plugin_routing:\n\
         \x20 modules:\n\
         \x20   a:\n\
         \x20     redirect: zeta.coll.a\n\
         \x20   b:\n\
         \x20     redirect: alpha.coll.sub.b\n\
         \x20 lookup:\n\
         \x20   c:\n\
         \x20     redirect: zeta.coll.c\n\
         \x20   d:\n\
         \x20     tombstone:\n\
         \x20       removal_version: 1.0.0\n",
    );
    let collections: Vec<_> = redirect_inventory(&core).into_iter().collect();
    assert_eq!(collections, vec!["alpha.coll".to_owned(), "zeta.coll".to_owned()]);
}
