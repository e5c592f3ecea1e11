//! Plugin redirect bookkeeping for collection trees.
//!
//! A collection ships plugins as `.py` files under `plugins/<type>/` and
//! describes renames in the `plugin_routing` section of
//! `meta/runtime.yml`. The same rename can also be expressed on disk as a
//! relative symlink from the old plugin file to the new one. This crate
//! keeps the two representations in sync and checks them for consistency:
//!
//! - [`scan_file_redirects`] and
//!   [`RuntimeManifest::extract_meta_redirects`] collect redirects from
//!   disk and manifest into one [`Redirects`] table;
//! - [`add_file_redirects`] and [`RuntimeManifest::add_meta_redirects`]
//!   write that table back in either representation;
//! - [`scan_plugins`] and [`validate`] make sure every referenced plugin
//!   name actually resolves;
//! - [`check_core_redirects`] and [`redirect_inventory`] audit the host
//!   core's own routing manifest against the collection.

mod audit;
mod error;
mod manifest;
mod plugins;
mod redirects;

pub use audit::{
    CoreCheckReport, CoreIssue, MissingPlugin, PluginInventory, ValidationReport,
    check_core_redirects, redirect_inventory, scan_plugins, validate,
};
pub use error::MetaError;
pub use manifest::{GALAXY_PATH, Galaxy, RUNTIME_PATH, RuntimeManifest};
pub use plugins::{PLUGIN_EXTENSION, PluginType, name_to_path, normalize, path_to_name, relative_path};
pub use redirects::{Redirects, add_file_redirects, scan_file_redirects, scan_flatmap_redirects};
