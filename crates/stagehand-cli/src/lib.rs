//! Command-line runtime for the `stagehand` collection maintenance tool.
//!
//! The CLI wraps the bookkeeping operations of `stagehand-meta`: syncing
//! plugin redirects between the plugin tree and `meta/runtime.yml`,
//! validating that every referenced plugin exists, and auditing the host
//! core's routing manifest. The interface is exercised both from the
//! binary entrypoint and from integration tests where the IO streams are
//! substituted.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use stagehand_meta::{
    CoreIssue, Galaxy, MetaError, PluginType, Redirects, RuntimeManifest, add_file_redirects,
    check_core_redirects, redirect_inventory, scan_file_redirects, scan_flatmap_redirects,
    scan_plugins, validate,
};
use thiserror::Error;
use tracing::debug;

/// Collection plugin redirect maintenance.
#[derive(Debug, Parser)]
#[command(name = "stagehand", version, about = "meta/runtime.yml helper")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Update redirections (meta/runtime.yml or symlinks).
    Redirect(RedirectArgs),
    /// Make sure plugins referenced for this collection actually exist.
    Validate(CollectionArgs),
    /// Compare the collection to the redirects in the host core's routing
    /// manifest.
    CheckCoreRedirects(CoreArgs),
    /// List all collections the host core's routing manifest redirects to.
    ShowRedirectsInventory(InventoryArgs),
}

#[derive(Debug, Args)]
struct CollectionArgs {
    /// The root directory of the collection to work on.
    #[arg(long, default_value = ".")]
    collection_root: PathBuf,
}

#[derive(Debug, Args)]
struct RedirectArgs {
    #[command(flatten)]
    collection: CollectionArgs,

    /// Where the redirects should be recorded.
    #[arg(long, value_enum)]
    target: RedirectTarget,

    /// Make sure all redirections needed for flatmapping are there.
    #[arg(long)]
    flatmap: bool,

    /// Sort plugin routing data in meta/runtime.yml.
    #[arg(long)]
    sort_plugin_routing: bool,
}

#[derive(Debug, Args)]
struct CoreArgs {
    #[command(flatten)]
    collection: CollectionArgs,

    /// Path to the host core's routing manifest.
    #[arg(long)]
    core_runtime: PathBuf,
}

#[derive(Debug, Args)]
struct InventoryArgs {
    /// Path to the host core's routing manifest.
    #[arg(long)]
    core_runtime: PathBuf,
}

/// Representation redirects are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RedirectTarget {
    /// Keep redirects in `meta/runtime.yml` only.
    Meta,
    /// Keep redirects as symlinks only.
    Symlinks,
    /// Keep both representations.
    Both,
}

impl RedirectTarget {
    const fn meta_redirects(self) -> bool {
        matches!(self, Self::Meta | Self::Both)
    }

    const fn symlink_redirects(self) -> bool {
        matches!(self, Self::Symlinks | Self::Both)
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Meta(#[from] MetaError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Parses the arguments and executes the selected subcommand.
///
/// Returns exit code 2 for usage errors, 1 for operational failures and
/// failed checks, and 0 on success.
pub fn run<I, T>(args: I, stdout: &mut impl Write, stderr: &mut impl Write) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            // clap renders help and version on stdout-style errors too
            let _ = write!(stderr, "{error}");
            return ExitCode::from(2);
        }
    };

    let result = match &cli.command {
        Command::Redirect(args) => redirect(args, stdout),
        Command::Validate(args) => validate_collection(args, stdout),
        Command::CheckCoreRedirects(args) => check_core(args, stdout),
        Command::ShowRedirectsInventory(args) => show_inventory(args, stdout),
    };
    match result {
        Ok(code) => code,
        Err(error) => {
            let _ = writeln!(stderr, "ERROR: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Collects redirects from every representation, then rewrites the
/// collection so only the requested representations remain.
fn redirect(args: &RedirectArgs, stdout: &mut impl Write) -> Result<ExitCode, AppError> {
    let root = &args.collection.collection_root;
    let galaxy = Galaxy::load(root)?;
    let collection_name = galaxy.full_name();
    writeln!(stdout, "Working on collection {collection_name}")?;

    let mut runtime = RuntimeManifest::load(root)?;
    let mut redirects = Redirects::new();
    scan_file_redirects(&mut redirects, root, false)?;
    runtime.extract_meta_redirects(&mut redirects, &collection_name, false)?;
    if args.flatmap {
        scan_flatmap_redirects(&mut redirects, root)?;
    }

    for plugin_type in PluginType::ALL {
        let count = redirects.get(plugin_type).len();
        if count > 0 {
            writeln!(
                stdout,
                "Found {count} redirect{} for plugin type {plugin_type}",
                plural(count),
            )?;
        }
    }

    if args.target.meta_redirects() {
        runtime.add_meta_redirects(&redirects, &collection_name);
    } else {
        runtime.extract_meta_redirects(&mut redirects, &collection_name, true)?;
    }
    if args.sort_plugin_routing {
        runtime.sort_plugin_routing();
    }
    runtime.store(root)?;

    if args.target.symlink_redirects() {
        add_file_redirects(&redirects, root)?;
    } else {
        scan_file_redirects(&mut redirects, root, true)?;
    }
    debug!(redirect_target = ?args.target, "redirects rewritten");
    Ok(ExitCode::SUCCESS)
}

fn validate_collection(
    args: &CollectionArgs,
    stdout: &mut impl Write,
) -> Result<ExitCode, AppError> {
    let root = &args.collection_root;
    let galaxy = Galaxy::load(root)?;
    let collection_name = galaxy.full_name();
    writeln!(stdout, "Working on collection {collection_name}")?;

    let mut runtime = RuntimeManifest::load(root)?;
    let mut redirects = Redirects::new();
    scan_file_redirects(&mut redirects, root, false)?;
    runtime.extract_meta_redirects(&mut redirects, &collection_name, false)?;
    // the inventory must hold only real plugins, not the redirect names
    // under validation
    let inventory = scan_plugins(&Redirects::new(), &runtime, root, false)?;

    let report = validate(&inventory, &redirects, &runtime);
    for plugin_type in PluginType::ALL {
        let missing: Vec<_> = report
            .missing
            .iter()
            .filter(|m| m.plugin_type == plugin_type)
            .collect();
        if missing.is_empty() {
            continue;
        }
        writeln!(
            stdout,
            "{count} {plugin_type} plugin{} are missing:",
            plural(missing.len()),
            count = missing.len(),
        )?;
        for entry in missing {
            let redirect = entry.redirect.as_deref().unwrap_or("none");
            writeln!(stdout, "  {} (redirected to: {redirect})", entry.name)?;
        }
    }

    if report.is_ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn check_core(args: &CoreArgs, stdout: &mut impl Write) -> Result<ExitCode, AppError> {
    let root = &args.collection.collection_root;
    let galaxy = Galaxy::load(root)?;
    let collection_name = galaxy.full_name();
    writeln!(stdout, "Working on collection {collection_name}")?;

    let mut runtime = RuntimeManifest::load(root)?;
    let mut redirects = Redirects::new();
    scan_file_redirects(&mut redirects, root, false)?;
    runtime.extract_meta_redirects(&mut redirects, &collection_name, false)?;
    let inventory = scan_plugins(&redirects, &runtime, root, false)?;

    let core_runtime = RuntimeManifest::load_path(&args.core_runtime)?;
    let report = check_core_redirects(&core_runtime, &inventory, &collection_name);
    for issue in &report.issues {
        match issue {
            CoreIssue::MissingTarget {
                plugin_type,
                plugin_name,
                target,
            } => {
                writeln!(
                    stdout,
                    "ERROR: core {plugin_type} {plugin_name} redirects to \
                     {collection_name}.{target}, which does not exist!",
                )?;
            }
            CoreIssue::ForeignRedirect {
                plugin_type,
                plugin_name,
                redirect,
            } => {
                writeln!(
                    stdout,
                    "WARNING: core {plugin_type} {plugin_name} redirects to \
                     {redirect} and not to ours!",
                )?;
            }
        }
    }

    if report.has_errors() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn show_inventory(args: &InventoryArgs, stdout: &mut impl Write) -> Result<ExitCode, AppError> {
    let core_runtime = RuntimeManifest::load_path(&args.core_runtime)?;
    for collection in redirect_inventory(&core_runtime) {
        writeln!(stdout, "{collection}")?;
    }
    Ok(ExitCode::SUCCESS)
}

const fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
