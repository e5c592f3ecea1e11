//! Consistency checks: plugin inventory, redirect validation and checks
//! against the host core's routing manifest.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_yaml::Value;

use crate::error::MetaError;
use crate::manifest::RuntimeManifest;
use crate::plugins::{PluginType, path_to_name};
use crate::redirects::{Redirects, walk_plugin_dirs, walk_plugin_files};

/// Known plugin names, one set per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginInventory {
    by_type: BTreeMap<PluginType, BTreeSet<String>>,
}

impl PluginInventory {
    /// The names known for one plugin category.
    #[must_use]
    pub fn get(&self, plugin_type: PluginType) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.by_type.get(&plugin_type).unwrap_or(&EMPTY)
    }

    /// Whether the category contains the name.
    #[must_use]
    pub fn contains(&self, plugin_type: PluginType, name: &str) -> bool {
        self.get(plugin_type).contains(name)
    }

    fn insert(&mut self, plugin_type: PluginType, name: impl Into<String>) {
        self.by_type
            .entry(plugin_type)
            .or_default()
            .insert(name.into());
    }
}

/// Enumerates every plugin name the collection knows about.
///
/// A name counts as known when it is a plugin file in the tree, a
/// `module_utils` package directory, a redirect source or destination, or a
/// tombstoned routing entry. With `all_plugins`, every routing entry counts.
///
/// # Errors
///
/// Returns [`MetaError::Io`] when the plugin tree cannot be read.
pub fn scan_plugins(
    redirects: &Redirects,
    runtime: &RuntimeManifest,
    collection_root: &Path,
    all_plugins: bool,
) -> Result<PluginInventory, MetaError> {
    let mut inventory = PluginInventory::default();
    for plugin_type in PluginType::ALL {
        for (source, destination) in redirects.get(plugin_type) {
            inventory.insert(plugin_type, source.clone());
            inventory.insert(plugin_type, destination.clone());
        }

        let base_dir = plugin_type.dir(collection_root);
        if plugin_type == PluginType::ModuleUtils {
            for dir in walk_plugin_dirs(&base_dir)? {
                if let Some(name) = path_to_name(&dir, &base_dir, false) {
                    inventory.insert(plugin_type, name);
                }
            }
        }
        for path in walk_plugin_files(&base_dir)? {
            if let Some(name) = path_to_name(&path, &base_dir, true) {
                inventory.insert(plugin_type, name);
            }
        }

        if let Some(entries) = runtime.routing_entries(plugin_type) {
            for (name_value, data) in entries {
                let Some(name) = name_value.as_str() else {
                    continue;
                };
                let tombstoned = data
                    .as_mapping()
                    .is_some_and(|entry| entry.contains_key("tombstone"));
                if tombstoned || all_plugins {
                    inventory.insert(plugin_type, name);
                }
            }
        }
    }
    Ok(inventory)
}

/// One plugin name that is referenced but does not resolve to anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPlugin {
    /// Category of the missing plugin.
    pub plugin_type: PluginType,
    /// Referenced name.
    pub name: String,
    /// Where the name redirects to, when it is a redirect source.
    pub redirect: Option<String>,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Referenced plugins that do not exist, sorted by category and name.
    pub missing: Vec<MissingPlugin>,
}

impl ValidationReport {
    /// Whether every referenced plugin resolved.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Checks that every referenced plugin name resolves to a real plugin.
///
/// Redirect chains are followed: a redirect source counts as existing when
/// its destination does, transitively. Routing entries without a `redirect`
/// must name an existing plugin themselves.
#[must_use]
pub fn validate(
    inventory: &PluginInventory,
    redirects: &Redirects,
    runtime: &RuntimeManifest,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    for plugin_type in PluginType::ALL {
        let mut known: BTreeSet<String> = inventory.get(plugin_type).clone();
        let table = redirects.get(plugin_type);

        let mut missing: BTreeSet<String> = table
            .keys()
            .filter(|source| !known.contains(*source))
            .cloned()
            .collect();
        loop {
            let resolved: Vec<String> = missing
                .iter()
                .filter(|source| {
                    table
                        .get(*source)
                        .is_some_and(|destination| known.contains(destination))
                })
                .cloned()
                .collect();
            if resolved.is_empty() {
                break;
            }
            for source in resolved {
                missing.remove(&source);
                known.insert(source);
            }
        }

        if let Some(entries) = runtime.routing_entries(plugin_type) {
            for (name_value, data) in entries {
                let Some(name) = name_value.as_str() else {
                    continue;
                };
                let has_redirect = data
                    .as_mapping()
                    .is_some_and(|entry| entry.contains_key("redirect"));
                if !has_redirect && !known.contains(name) {
                    missing.insert(name.to_owned());
                }
            }
        }

        for name in missing {
            let redirect = table.get(&name).cloned();
            report.missing.push(MissingPlugin {
                plugin_type,
                name,
                redirect,
            });
        }
    }
    report
}

/// One discrepancy between the host core's routing and this collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreIssue {
    /// The core redirects a name into this collection, but the target does
    /// not exist here.
    MissingTarget {
        /// Category of the redirected plugin.
        plugin_type: PluginType,
        /// Name the core redirects.
        plugin_name: String,
        /// Redirect target inside this collection, without the prefix.
        target: String,
    },
    /// The core redirects a name we carry to some other collection.
    ForeignRedirect {
        /// Category of the redirected plugin.
        plugin_type: PluginType,
        /// Name the core redirects.
        plugin_name: String,
        /// The fully qualified redirect target.
        redirect: String,
    },
}

/// Outcome of [`check_core_redirects`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreCheckReport {
    /// Discrepancies found, in manifest order.
    pub issues: Vec<CoreIssue>,
}

impl CoreCheckReport {
    /// Whether any issue is a hard error rather than a warning.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| matches!(issue, CoreIssue::MissingTarget { .. }))
    }
}

/// Compares the host core's routing manifest against this collection.
#[must_use]
pub fn check_core_redirects(
    core_runtime: &RuntimeManifest,
    inventory: &PluginInventory,
    collection_name: &str,
) -> CoreCheckReport {
    let prefix = format!("{collection_name}.");
    let mut report = CoreCheckReport::default();
    for plugin_type in PluginType::ALL {
        let Some(entries) = core_runtime.routing_entries(plugin_type) else {
            continue;
        };
        for (name_value, data) in entries {
            let Some(plugin_name) = name_value.as_str() else {
                continue;
            };
            let Some(redirect) = data
                .as_mapping()
                .and_then(|entry| entry.get("redirect"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            if let Some(target) = redirect.strip_prefix(&prefix) {
                if !inventory.contains(plugin_type, target) {
                    report.issues.push(CoreIssue::MissingTarget {
                        plugin_type,
                        plugin_name: plugin_name.to_owned(),
                        target: target.to_owned(),
                    });
                }
            } else if inventory.contains(plugin_type, plugin_name) {
                report.issues.push(CoreIssue::ForeignRedirect {
                    plugin_type,
                    plugin_name: plugin_name.to_owned(),
                    redirect: redirect.to_owned(),
                });
            }
        }
    }
    report
}

/// Lists every collection the host core's routing manifest redirects to.
#[must_use]
pub fn redirect_inventory(core_runtime: &RuntimeManifest) -> BTreeSet<String> {
    let mut collections = BTreeSet::new();
    let Some(routing) = core_runtime
        .as_mapping()
        .get("plugin_routing")
        .and_then(Value::as_mapping)
    else {
        return collections;
    };
    for (_, entries_value) in routing {
        let Some(entries) = entries_value.as_mapping() else {
            continue;
        };
        for (_, data) in entries {
            let Some(redirect) = data
                .as_mapping()
                .and_then(|entry| entry.get("redirect"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            let mut parts = redirect.splitn(3, '.');
            if let (Some(namespace), Some(collection)) = (parts.next(), parts.next()) {
                collections.insert(format!("{namespace}.{collection}"));
            }
        }
    }
    collections
}

#[cfg(test)]
mod tests;
