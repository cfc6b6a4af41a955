use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name picked up from the project root when no explicit ignore file is
/// configured.
pub const DEFAULT_IGNORE_FILE: &str = ".ahignore.json";

/// Per-manager configuration for external tool invocations.
///
/// Every field has a usable default, so `CliConfig::default()` targets the
/// current directory with no API version pinned.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into, strip_option))]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Path to the local project root folder.
    #[builder(default = "default_project_folder()")]
    #[serde(default = "default_project_folder")]
    pub project_folder: String,

    /// API version used to run processes and connect to the org.
    #[builder(default)]
    #[builder(setter(custom))]
    #[serde(default)]
    pub api_version: Option<String>,

    /// Namespace prefix of the project org.
    #[builder(default)]
    #[serde(default)]
    pub namespace_prefix: String,

    /// Compress every XML file affected by an operation.
    #[builder(default)]
    #[serde(default)]
    pub compress_files: bool,

    /// Sort order applied when compressing XML files.
    #[builder(default)]
    #[serde(default)]
    pub sort_order: Option<String>,

    /// Path to the ignore file. `<project_folder>/.ahignore.json` when unset.
    #[builder(default)]
    #[serde(default)]
    pub ignore_file: Option<String>,

    /// Output folder used to redirect responses to files.
    #[builder(default)]
    #[serde(default)]
    pub output_path: Option<PathBuf>,

    /// Allow several operations in flight on the same manager.
    #[builder(default)]
    #[serde(default)]
    pub allow_concurrence: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            project_folder: default_project_folder(),
            api_version: None,
            namespace_prefix: String::new(),
            compress_files: false,
            sort_order: None,
            ignore_file: None,
            output_path: None,
            allow_concurrence: false,
        }
    }
}

impl CliConfig {
    pub fn builder() -> CliConfigBuilder {
        CliConfigBuilder::default()
    }

    /// Configuration rooted at `project_folder`, everything else default.
    pub fn for_project(project_folder: impl Into<String>) -> Self {
        Self {
            project_folder: project_folder.into(),
            ..Self::default()
        }
    }

    /// The configured ignore file, or `<project_folder>/.ahignore.json`.
    pub fn ignore_file_or_default(&self) -> String {
        match &self.ignore_file {
            Some(path) => path.clone(),
            None => format!("{}/{}", self.project_folder, DEFAULT_IGNORE_FILE),
        }
    }
}

impl CliConfigBuilder {
    /// API versions arrive as strings or numbers depending on the caller;
    /// both are stored as the string the tool expects.
    pub fn api_version<V: ToString>(&mut self, value: V) -> &mut Self {
        self.api_version = Some(Some(value.to_string()));
        self
    }
}

fn default_project_folder() -> String {
    "./".to_string()
}
