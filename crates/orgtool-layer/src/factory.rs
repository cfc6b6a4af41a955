//! Builds one [`ProcessSpec`] per operation kind.
//!
//! The flag vocabulary here is the collaborator contract with the external
//! tool: every data operation is invoked as `orgtool <topic>:<action>` with
//! `--json --progress`, so responses arrive as JSON reports and progress
//! notifications as JSON lines.

use orgtool_layer_core::{CliError, ProcessSpec};
use std::path::{Path, PathBuf};

pub(crate) const TOOL_COMMAND: &str = "orgtool";
const NPM_PACKAGE: &str = "orgtool-cli";

/// Which manifest files a package generation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageKind {
    #[default]
    Package,
    Destructive,
    Both,
}

impl PackageKind {
    fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Package => "package",
            PackageKind::Destructive => "destructive",
            PackageKind::Both => "both",
        }
    }
}

/// When the destructive manifest is applied relative to the deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteOrder {
    Before,
    #[default]
    After,
}

impl DeleteOrder {
    fn as_str(&self) -> &'static str {
        match self {
            DeleteOrder::Before => "before",
            DeleteOrder::After => "after",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DescribeOptions {
    pub from_org: bool,
    pub types: Option<Vec<String>>,
    pub download_all: bool,
    pub group_global_actions: bool,
    pub api_version: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct RetrieveOptions {
    pub from_org: bool,
    pub include_org: bool,
    pub types: Option<Vec<String>>,
    pub download_all: bool,
    pub compress: bool,
    pub sort_order: Option<String>,
    pub api_version: Option<String>,
}

#[derive(Debug)]
pub(crate) struct PackageOptions {
    pub create_from: &'static str,
    pub source: Option<String>,
    pub target: Option<String>,
    pub create_type: PackageKind,
    pub delete_order: DeleteOrder,
    pub use_ignore: bool,
    pub ignore_file: String,
    pub explicit: bool,
    pub api_version: Option<String>,
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub(crate) struct RepairOptions {
    pub types: Option<Vec<String>>,
    pub only_check: bool,
    pub use_ignore: bool,
    pub ignore_file: String,
    pub compress: bool,
    pub sort_order: Option<String>,
    pub api_version: Option<String>,
}

pub(crate) fn compress_files(
    project: &Path,
    files: &[PathBuf],
    sort_order: Option<&str>,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    Ok(data_spec("compress-files", "metadata:local:compress", project)
        .arg("--file")
        .arg(join_paths(files))
        .opt("--sort-order", sort_order))
}

pub(crate) fn compress_folder(
    project: &Path,
    folder: &Path,
    sort_order: Option<&str>,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    Ok(
        data_spec("compress-folder", "metadata:local:compress", project)
            .arg("--folder")
            .arg(folder.display().to_string())
            .opt("--sort-order", sort_order),
    )
}

pub(crate) fn org_compare(
    project: &Path,
    api_version: Option<&str>,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    Ok(data_spec("org-compare", "metadata:org:compare", project)
        .opt("--api-version", api_version))
}

pub(crate) fn org_compare_between(
    project: &Path,
    source: Option<&str>,
    target: &str,
    api_version: Option<&str>,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    Ok(
        data_spec("org-compare-between", "metadata:org:compare-between", project)
            .opt("--source", source)
            .arg("--target")
            .arg(target)
            .opt("--api-version", api_version),
    )
}

pub(crate) fn describe_metadata(
    project: &Path,
    options: DescribeOptions,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    let (name, subcommand) = if options.from_org {
        ("describe-org-metadata", "metadata:org:describe")
    } else {
        ("describe-local-metadata", "metadata:local:describe")
    };
    let types = options.types.map(|types| types.join(","));
    Ok(data_spec(name, subcommand, project)
        .opt("--types", types.as_deref())
        .flag("--download-all", options.from_org && options.download_all)
        .flag("--group-global-actions", options.group_global_actions)
        .opt("--api-version", options.api_version.as_deref()))
}

pub(crate) fn retrieve_special(
    project: &Path,
    options: RetrieveOptions,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    let (name, subcommand) = if options.from_org {
        ("retrieve-org-special", "metadata:org:retrieve-special")
    } else if options.include_org {
        ("retrieve-mixed-special", "metadata:local:retrieve-special")
    } else {
        ("retrieve-local-special", "metadata:local:retrieve-special")
    };
    let types = options.types.map(|types| types.join(","));
    Ok(data_spec(name, subcommand, project)
        .opt("--types", types.as_deref())
        .flag("--include-org", options.include_org)
        .flag("--download-all", options.download_all)
        .flag("--compress", options.compress)
        .opt("--sort-order", options.sort_order.as_deref())
        .opt("--api-version", options.api_version.as_deref()))
}

pub(crate) fn load_permissions(
    project: &Path,
    api_version: Option<&str>,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    Ok(data_spec("load-permissions", "org:permissions", project)
        .opt("--api-version", api_version))
}

pub(crate) fn package_generator(
    project: &Path,
    options: PackageOptions,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    let name = format!("package-from-{}", options.create_from);
    let output_path = options
        .output_path
        .as_ref()
        .map(|path| path.display().to_string());
    let mut spec = data_spec(&name, "package:create", project)
        .arg("--from")
        .arg(options.create_from)
        .opt("--source", options.source.as_deref())
        .opt("--target", options.target.as_deref())
        .arg("--create-type")
        .arg(options.create_type.as_str())
        .arg("--delete-order")
        .arg(options.delete_order.as_str())
        .flag("--explicit", options.explicit)
        .opt("--api-version", options.api_version.as_deref())
        .opt("--output-path", output_path.as_deref());
    if options.use_ignore {
        spec = spec
            .arg("--use-ignore")
            .opt("--ignore-file", Some(options.ignore_file.as_str()));
    }
    Ok(spec)
}

pub(crate) fn ignore_metadata(
    project: &Path,
    types: Option<Vec<String>>,
    ignore_file: &str,
    compress: bool,
    sort_order: Option<&str>,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    let types = types.map(|types| types.join(","));
    Ok(data_spec("ignore-metadata", "metadata:local:ignore", project)
        .opt("--types", types.as_deref())
        .arg("--ignore-file")
        .arg(ignore_file)
        .flag("--compress", compress)
        .opt("--sort-order", sort_order))
}

pub(crate) fn repair_dependencies(
    project: &Path,
    options: RepairOptions,
) -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    let name = if options.only_check {
        "check-dependencies"
    } else {
        "repair-dependencies"
    };
    let types = options.types.map(|types| types.join(","));
    let mut spec = data_spec(name, "metadata:local:repair", project)
        .opt("--types", types.as_deref())
        .flag("--only-check", options.only_check)
        .flag("--compress", options.compress)
        .opt("--sort-order", options.sort_order.as_deref())
        .opt("--api-version", options.api_version.as_deref());
    if options.use_ignore {
        spec = spec
            .arg("--use-ignore")
            .opt("--ignore-file", Some(options.ignore_file.as_str()));
    }
    Ok(spec)
}

pub(crate) fn tool_installed() -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    Ok(ProcessSpec::new("installation-check", TOOL_COMMAND).arg("--version"))
}

pub(crate) fn tool_version() -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    Ok(ProcessSpec::new("version", TOOL_COMMAND).arg("--version"))
}

pub(crate) fn tool_update() -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    Ok(ProcessSpec::new("update", TOOL_COMMAND).arg("update"))
}

pub(crate) fn tool_update_npm() -> Result<ProcessSpec, CliError> {
    ensure_supported_os()?;
    let npm = if cfg!(windows) { "npm.cmd" } else { "npm" };
    Ok(ProcessSpec::new("update-npm", npm)
        .arg("install")
        .arg("-g")
        .arg(format!("{NPM_PACKAGE}@latest")))
}

fn data_spec(name: &str, subcommand: &str, project: &Path) -> ProcessSpec {
    ProcessSpec::new(name, TOOL_COMMAND)
        .arg(subcommand)
        .args(["--json", "--progress"])
        .working_directory(project)
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn ensure_supported_os() -> Result<(), CliError> {
    if cfg!(any(unix, windows)) {
        Ok(())
    } else {
        Err(CliError::UnsupportedOs(std::env::consts::OS.to_string()))
    }
}
