//! Plugin categories and the dotted-name scheme for plugin files.
//!
//! Plugins live as `.py` files under `plugins/<type>/` in a collection
//! tree. Within one type directory a plugin is identified by its dotted
//! name: the path relative to the type directory with separators replaced
//! by dots and the file extension removed, so
//! `plugins/modules/cloud/instance.py` is the module `cloud.instance`.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// File extension of plugin sources.
pub const PLUGIN_EXTENSION: &str = ".py";

/// The plugin categories a collection can ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[expect(missing_docs, reason = "variant names mirror the category directories")]
pub enum PluginType {
    DocFragments,
    Action,
    Cache,
    Callback,
    Connection,
    Shell,
    Modules,
    ModuleUtils,
    Lookup,
    Filter,
    Test,
    Strategy,
    Terminal,
    Vars,
    Cliconf,
    Netconf,
    Inventory,
    Httpapi,
    Become,
}

impl PluginType {
    /// Every plugin category, in the conventional listing order.
    pub const ALL: [Self; 19] = [
        Self::DocFragments,
        Self::Action,
        Self::Cache,
        Self::Callback,
        Self::Connection,
        Self::Shell,
        Self::Modules,
        Self::ModuleUtils,
        Self::Lookup,
        Self::Filter,
        Self::Test,
        Self::Strategy,
        Self::Terminal,
        Self::Vars,
        Self::Cliconf,
        Self::Netconf,
        Self::Inventory,
        Self::Httpapi,
        Self::Become,
    ];

    /// Directory name of the category under `plugins/`, also its name in
    /// routing manifests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DocFragments => "doc_fragments",
            Self::Action => "action",
            Self::Cache => "cache",
            Self::Callback => "callback",
            Self::Connection => "connection",
            Self::Shell => "shell",
            Self::Modules => "modules",
            Self::ModuleUtils => "module_utils",
            Self::Lookup => "lookup",
            Self::Filter => "filter",
            Self::Test => "test",
            Self::Strategy => "strategy",
            Self::Terminal => "terminal",
            Self::Vars => "vars",
            Self::Cliconf => "cliconf",
            Self::Netconf => "netconf",
            Self::Inventory => "inventory",
            Self::Httpapi => "httpapi",
            Self::Become => "become",
        }
    }

    /// Parses a category from its directory/manifest name.
    #[must_use]
    pub fn from_str_opt(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Whether plugins of this category are backed by files in the plugin
    /// tree. `test` and `filter` plugins live inside shared source files,
    /// so file scans and symlink redirects do not apply to them.
    #[must_use]
    pub const fn is_file_backed(self) -> bool {
        !matches!(self, Self::Test | Self::Filter)
    }

    /// Directory of this category under the collection root.
    #[must_use]
    pub fn dir(self, collection_root: &Path) -> PathBuf {
        collection_root.join("plugins").join(self.as_str())
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts a plugin file path into its dotted name.
///
/// The path is normalized and taken relative to `base_dir`; `strip_extension`
/// removes the trailing [`PLUGIN_EXTENSION`]. Returns `None` when the
/// normalized path does not live under `base_dir`.
#[must_use]
pub fn path_to_name(path: &Path, base_dir: &Path, strip_extension: bool) -> Option<String> {
    let normal = normalize(path);
    let relative = normal.strip_prefix(&normalize(base_dir)).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    if strip_extension {
        if let Some(last) = parts.last_mut() {
            if let Some(stem) = last.strip_suffix(PLUGIN_EXTENSION) {
                *last = stem.to_owned();
            }
        }
    }
    Some(parts.join("."))
}

/// Converts a dotted plugin name back into its file path.
#[must_use]
pub fn name_to_path(name: &str, base_dir: &Path, with_extension: bool) -> PathBuf {
    let mut path = base_dir.to_path_buf();
    for part in name.split('.') {
        path.push(part);
    }
    if with_extension {
        let mut file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        file_name.push_str(PLUGIN_EXTENSION);
        path.set_file_name(file_name);
    }
    path
}

/// Resolves `.` and `..` components without touching the filesystem.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut normal = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normal.pop() {
                    normal.push("..");
                }
            }
            other => normal.push(other),
        }
    }
    normal
}

/// Computes the path of `target` relative to the directory `from_dir`.
#[must_use]
pub fn relative_path(target: &Path, from_dir: &Path) -> PathBuf {
    let target_normal = normalize(target);
    let from_normal = normalize(from_dir);
    let target_parts: Vec<_> = target_normal.components().collect();
    let from_parts: Vec<_> = from_normal.components().collect();

    let common = target_parts
        .iter()
        .zip(from_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in from_parts.iter().skip(common) {
        relative.push("..");
    }
    for part in target_parts.iter().skip(common) {
        relative.push(part);
    }
    relative
}
