//! The collection's metadata documents: `galaxy.yml` and `meta/runtime.yml`.
//!
//! `galaxy.yml` is only read for the collection's identity. The runtime
//! manifest is edited in place: it is kept as a raw YAML mapping so that
//! keys this tool knows nothing about (`requires_ansible`, deprecation
//! data, ...) survive a rewrite. Only the `plugin_routing` section is
//! interpreted.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::MetaError;
use crate::plugins::PluginType;
use crate::redirects::Redirects;

/// Location of `galaxy.yml` relative to the collection root.
pub const GALAXY_PATH: &str = "galaxy.yml";

/// Location of the runtime manifest relative to the collection root.
pub const RUNTIME_PATH: &str = "meta/runtime.yml";

/// Collection identity from `galaxy.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Galaxy {
    /// Collection namespace.
    pub namespace: String,
    /// Collection name within the namespace.
    pub name: String,
}

impl Galaxy {
    /// Reads the collection identity from `galaxy.yml` under the root.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::NotACollection`] when the file does not exist,
    /// [`MetaError::Io`] when it cannot be read and [`MetaError::Yaml`]
    /// when it cannot be parsed.
    pub fn load(collection_root: &Path) -> Result<Self, MetaError> {
        let path = collection_root.join(GALAXY_PATH);
        if fs::symlink_metadata(&path).is_err() {
            return Err(MetaError::NotACollection { path });
        }
        let text = fs::read_to_string(&path).map_err(|e| MetaError::io(&path, e))?;
        serde_yaml::from_str(&text).map_err(|e| MetaError::yaml(&path, e))
    }

    /// The fully qualified collection name, `namespace.name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// The `meta/runtime.yml` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeManifest {
    doc: Mapping,
}

impl RuntimeManifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-parsed YAML mapping.
    #[must_use]
    pub const fn from_mapping(doc: Mapping) -> Self {
        Self { doc }
    }

    /// The underlying YAML mapping.
    #[must_use]
    pub const fn as_mapping(&self) -> &Mapping {
        &self.doc
    }

    /// Reads the manifest under the collection root.
    ///
    /// A missing or empty file yields an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Io`] when the file cannot be read and
    /// [`MetaError::Yaml`] when it is not a YAML mapping.
    pub fn load(collection_root: &Path) -> Result<Self, MetaError> {
        Self::load_path(&collection_root.join(RUNTIME_PATH))
    }

    /// Reads a routing manifest from an explicit path.
    ///
    /// Used for the host core's own routing manifest, which lives outside
    /// any collection tree.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Io`] when the file cannot be read and
    /// [`MetaError::Yaml`] when it is not a YAML mapping.
    pub fn load_path(path: &Path) -> Result<Self, MetaError> {
        if fs::symlink_metadata(path).is_err() {
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path).map_err(|e| MetaError::io(path, e))?;
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let doc = serde_yaml::from_str(&text).map_err(|e| MetaError::yaml(path, e))?;
        Ok(Self { doc })
    }

    /// Writes the manifest back under the collection root.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Io`] when the file cannot be written and
    /// [`MetaError::Yaml`] when serialization fails.
    pub fn store(&self, collection_root: &Path) -> Result<(), MetaError> {
        let path = collection_root.join(RUNTIME_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MetaError::io(parent, e))?;
        }
        let text = serde_yaml::to_string(&self.doc).map_err(|e| MetaError::yaml(&path, e))?;
        fs::write(&path, text).map_err(|e| MetaError::io(&path, e))?;
        debug!(path = %path.display(), "stored runtime manifest");
        Ok(())
    }

    /// The routing entries for one plugin category, when present.
    #[must_use]
    pub fn routing_entries(&self, plugin_type: PluginType) -> Option<&Mapping> {
        self.doc
            .get("plugin_routing")
            .and_then(Value::as_mapping)
            .and_then(|routing| routing.get(plugin_type.as_str()))
            .and_then(Value::as_mapping)
    }

    /// Pulls same-collection redirects out of `plugin_routing`.
    ///
    /// Only `redirect` entries pointing back into `collection_name` are
    /// recorded, with the collection prefix stripped. With `remove`, the
    /// recorded entries are deleted from the manifest; `test` and `filter`
    /// redirects always stay, they have no file-level representation.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::RedirectConflict`] on conflicting redirects.
    pub fn extract_meta_redirects(
        &mut self,
        redirects: &mut Redirects,
        collection_name: &str,
        remove: bool,
    ) -> Result<(), MetaError> {
        let prefix = format!("{collection_name}.");
        let Some(routing) = self
            .doc
            .get_mut("plugin_routing")
            .and_then(Value::as_mapping_mut)
        else {
            return Ok(());
        };
        for plugin_type in PluginType::ALL {
            let Some(plugins) = routing
                .get_mut(plugin_type.as_str())
                .and_then(Value::as_mapping_mut)
            else {
                continue;
            };
            for (name_value, data) in plugins.iter_mut() {
                let Some(name) = name_value.as_str() else {
                    continue;
                };
                let Some(entry) = data.as_mapping_mut() else {
                    continue;
                };
                let redirect_target = entry
                    .get("redirect")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                if let Some(target) = redirect_target {
                    if let Some(stripped) = target.strip_prefix(&prefix) {
                        redirects.record(plugin_type, name, stripped)?;
                        if remove && plugin_type.is_file_backed() {
                            entry.remove("redirect");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Writes all redirects into `plugin_routing` as fully qualified
    /// `redirect` entries.
    pub fn add_meta_redirects(&mut self, redirects: &Redirects, collection_name: &str) {
        for plugin_type in PluginType::ALL {
            let table = redirects.get(plugin_type);
            if table.is_empty() {
                continue;
            }
            let Some(routing) = ensure_mapping(&mut self.doc, "plugin_routing") else {
                continue;
            };
            let Some(plugins) = ensure_mapping(routing, plugin_type.as_str()) else {
                continue;
            };
            for (source, destination) in table {
                let Some(entry) = ensure_mapping(plugins, source) else {
                    continue;
                };
                entry.insert(
                    Value::String("redirect".to_owned()),
                    Value::String(format!("{collection_name}.{destination}")),
                );
            }
        }
    }

    /// Sorts the routing entries of every plugin category by plugin name.
    pub fn sort_plugin_routing(&mut self) {
        let Some(routing) = self
            .doc
            .get_mut("plugin_routing")
            .and_then(Value::as_mapping_mut)
        else {
            return;
        };
        for (_, plugins_value) in routing.iter_mut() {
            if let Some(plugins) = plugins_value.as_mapping_mut() {
                let mut entries: Vec<(Value, Value)> =
                    std::mem::take(plugins).into_iter().collect();
                entries.sort_by_key(|(key, _)| {
                    key.as_str().unwrap_or_default().to_owned()
                });
                for (key, value) in entries {
                    plugins.insert(key, value);
                }
            }
        }
    }
}

/// Returns the mapping stored under `key`, creating or replacing the slot
/// with an empty mapping when necessary.
fn ensure_mapping<'a>(map: &'a mut Mapping, key: &str) -> Option<&'a mut Mapping> {
    let key_value = Value::String(key.to_owned());
    if !matches!(map.get(&key_value), Some(Value::Mapping(_))) {
        map.insert(key_value.clone(), Value::Mapping(Mapping::new()));
    }
    map.get_mut(&key_value).and_then(Value::as_mapping_mut)
}
