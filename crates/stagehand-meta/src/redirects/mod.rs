//! Redirect bookkeeping against the plugin tree.
//!
//! A redirect maps an old plugin name to its canonical new name within the
//! same collection. On disk a redirect is a relative symlink from the old
//! plugin file to the new one; in the manifest it is a `redirect` entry
//! under `plugin_routing`. This module owns the collected [`Redirects`]
//! table and the file-level scans; manifest-level extraction lives in
//! [`manifest`](crate::manifest).

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::MetaError;
use crate::plugins::{
    PLUGIN_EXTENSION, PluginType, name_to_path, path_to_name, relative_path,
};

/// Collected redirects, one name table per plugin category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirects {
    by_type: BTreeMap<PluginType, BTreeMap<String, String>>,
}

impl Redirects {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The redirects recorded for one plugin category.
    #[must_use]
    pub fn get(&self, plugin_type: PluginType) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.by_type.get(&plugin_type).unwrap_or(&EMPTY)
    }

    /// Records one redirect.
    ///
    /// Recording the same source twice is fine as long as the destination
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::RedirectConflict`] when the source was already
    /// recorded with a different destination.
    pub fn record(
        &mut self,
        plugin_type: PluginType,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<(), MetaError> {
        let source = source.into();
        let destination = destination.into();
        let table = self.by_type.entry(plugin_type).or_default();
        if let Some(existing) = table.get(&source) {
            if *existing != destination {
                return Err(MetaError::RedirectConflict {
                    plugin_type,
                    redirect_source: source,
                    first: existing.clone(),
                    second: destination,
                });
            }
            return Ok(());
        }
        table.insert(source, destination);
        Ok(())
    }
}

/// Scans the plugin tree for symlink redirects.
///
/// Every symlinked `.py` file under `plugins/<type>/` is recorded as a
/// redirect from the link's dotted name to the target's dotted name. Links
/// whose target is not a plugin file are skipped with a warning. With
/// `remove`, recorded links are deleted from the tree.
///
/// # Errors
///
/// Returns [`MetaError::RedirectConflict`] on conflicting redirects and
/// [`MetaError::Io`] when the tree cannot be read or a link not removed.
pub fn scan_file_redirects(
    redirects: &mut Redirects,
    collection_root: &Path,
    remove: bool,
) -> Result<(), MetaError> {
    for plugin_type in PluginType::ALL {
        if !plugin_type.is_file_backed() {
            continue;
        }
        let base_dir = plugin_type.dir(collection_root);
        for path in walk_plugin_files(&base_dir)? {
            let metadata = fs::symlink_metadata(&path).map_err(|e| MetaError::io(&path, e))?;
            if !metadata.file_type().is_symlink() {
                continue;
            }
            let target = fs::read_link(&path).map_err(|e| MetaError::io(&path, e))?;
            if !target.to_string_lossy().ends_with(PLUGIN_EXTENSION) {
                warn!(
                    link = %path.display(),
                    target = %target.display(),
                    "link does not point to a plugin file",
                );
                continue;
            }
            let target_path = path.parent().unwrap_or(&base_dir).join(&target);
            let Some(source) = path_to_name(&path, &base_dir, true) else {
                continue;
            };
            let Some(destination) = path_to_name(&target_path, &base_dir, true) else {
                warn!(
                    link = %path.display(),
                    target = %target.display(),
                    "link points outside the plugin type directory",
                );
                continue;
            };
            redirects.record(plugin_type, source, destination)?;
            if remove {
                fs::remove_file(&path).map_err(|e| MetaError::io(&path, e))?;
            }
        }
    }
    Ok(())
}

/// Materializes redirects as relative symlinks in the plugin tree.
///
/// Existing links with the right target are left alone. A regular file in
/// the way of a redirect is skipped with a warning. `test` and `filter`
/// redirects are never written to disk.
///
/// # Errors
///
/// Returns [`MetaError::Io`] when a link cannot be created.
pub fn add_file_redirects(
    redirects: &Redirects,
    collection_root: &Path,
) -> Result<(), MetaError> {
    for plugin_type in PluginType::ALL {
        if !plugin_type.is_file_backed() {
            continue;
        }
        let base_dir = plugin_type.dir(collection_root);
        for (source, destination) in redirects.get(plugin_type) {
            let link_path = name_to_path(source, &base_dir, true);
            let target_path = name_to_path(destination, &base_dir, true);
            let link_dir = link_path.parent().unwrap_or(&base_dir).to_path_buf();
            let link_target = relative_path(&target_path, &link_dir);

            if let Ok(metadata) = fs::symlink_metadata(&link_path) {
                if metadata.file_type().is_symlink() {
                    let current =
                        fs::read_link(&link_path).map_err(|e| MetaError::io(&link_path, e))?;
                    if current == link_target {
                        continue;
                    }
                    fs::remove_file(&link_path).map_err(|e| MetaError::io(&link_path, e))?;
                } else {
                    warn!(
                        path = %link_path.display(),
                        "redirect source exists and is not a link; leaving it alone",
                    );
                    continue;
                }
            }

            fs::create_dir_all(&link_dir).map_err(|e| MetaError::io(&link_dir, e))?;
            debug!(
                link = %link_path.display(),
                target = %link_target.display(),
                "creating redirect link",
            );
            symlink(&link_target, &link_path).map_err(|e| MetaError::io(&link_path, e))?;
        }
    }
    Ok(())
}

/// Adds redirects from flat plugin names to their dotted names.
///
/// Collections that are consumed in flatmapped form look plugins up by
/// their basename. For every plugin living in a subdirectory this records
/// `basename` → `dotted.name` so the flat name keeps resolving.
///
/// # Errors
///
/// Returns [`MetaError::RedirectConflict`] when two nested plugins share a
/// basename and [`MetaError::Io`] when the tree cannot be read.
pub fn scan_flatmap_redirects(
    redirects: &mut Redirects,
    collection_root: &Path,
) -> Result<(), MetaError> {
    for plugin_type in PluginType::ALL {
        if !plugin_type.is_file_backed() {
            continue;
        }
        let base_dir = plugin_type.dir(collection_root);
        for path in walk_plugin_files(&base_dir)? {
            let Some(name) = path_to_name(&path, &base_dir, true) else {
                continue;
            };
            if let Some((_, flat_name)) = name.rsplit_once('.') {
                redirects.record(plugin_type, flat_name, name.as_str())?;
            }
        }
    }
    Ok(())
}

/// Collects every plugin source file under `base_dir`, recursively.
///
/// Symlinked directories are not descended into; `__init__.py` files are
/// not plugins. A missing `base_dir` yields no files.
pub(crate) fn walk_plugin_files(base_dir: &Path) -> Result<Vec<PathBuf>, MetaError> {
    let mut files = Vec::new();
    if fs::symlink_metadata(base_dir).is_err() {
        return Ok(files);
    }
    walk_into(base_dir, &mut files)?;
    Ok(files)
}

fn walk_into(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), MetaError> {
    for item in fs::read_dir(dir).map_err(|e| MetaError::io(dir, e))? {
        let entry = item.map_err(|e| MetaError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| MetaError::io(&path, e))?;
        let is_dir = if file_type.is_symlink() {
            fs::metadata(&path).is_ok_and(|m| m.is_dir())
        } else {
            file_type.is_dir()
        };
        if is_dir {
            if !file_type.is_symlink() {
                walk_into(&path, files)?;
            }
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(PLUGIN_EXTENSION) && name != "__init__.py" {
            files.push(path);
        }
    }
    Ok(())
}

/// Lists the subdirectories of every directory under `base_dir`, paired
/// with the files: used by plugin scans that treat packages as plugins.
pub(crate) fn walk_plugin_dirs(base_dir: &Path) -> Result<Vec<PathBuf>, MetaError> {
    let mut dirs = Vec::new();
    if fs::symlink_metadata(base_dir).is_err() {
        return Ok(dirs);
    }
    collect_dirs(base_dir, &mut dirs)?;
    Ok(dirs)
}

fn collect_dirs(dir: &Path, dirs: &mut Vec<PathBuf>) -> Result<(), MetaError> {
    for item in fs::read_dir(dir).map_err(|e| MetaError::io(dir, e))? {
        let entry = item.map_err(|e| MetaError::io(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| MetaError::io(&path, e))?;
        if file_type.is_dir() {
            dirs.push(path.clone());
            collect_dirs(&path, dirs)?;
        }
    }
    Ok(())
}
