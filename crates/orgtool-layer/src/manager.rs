use crate::factory::{
    self, DeleteOrder, DescribeOptions, PackageKind, PackageOptions, RepairOptions,
    RetrieveOptions,
};
use crate::platform::default_process_killer;
use crate::results::{
    DependencyCheckReport, DependencyRepairReport, MetadataTypes, PackageGeneratorResult,
    RetrieveResult, from_payload, from_payload_or_default,
};
use crate::runner::TokioToolRunner;
use orgtool_layer_core::{
    CliConfig, CliError, CliEvent, EventBus, OperationTracker, ProcessKiller, ProcessSpec,
    RunContext, SelectionInput, ToolOutcome, ToolRunner, is_file, transform_selection,
    validate_file_path, validate_folder_path,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

const VERSION_BANNER: &str = "OrgTool CLI Version:";

/// Facade over the external `orgtool` CLI.
///
/// A manager runs at most one operation at a time (unless concurrence is
/// explicitly allowed), relays the tool's progress notifications to
/// subscribers, and translates its responses into typed results. Setters
/// follow the builder pattern and return the manager for chaining.
pub struct CliManager {
    config: CliConfig,
    tracker: Arc<OperationTracker>,
    events: EventBus,
    runner: Arc<dyn ToolRunner>,
}

impl Default for CliManager {
    fn default() -> Self {
        Self::new(CliConfig::default())
    }
}

impl CliManager {
    /// Manager with the real tool runner and the platform process killer.
    pub fn new(config: CliConfig) -> Self {
        Self::with_runner(config, Arc::new(TokioToolRunner))
    }

    /// Manager with a custom runner. This is the seam tests use to
    /// substitute the external tool.
    pub fn with_runner(config: CliConfig, runner: Arc<dyn ToolRunner>) -> Self {
        Self::with_runner_and_killer(config, runner, default_process_killer())
    }

    /// Full injection, for tests and embedders with their own kill policy.
    pub fn with_runner_and_killer(
        config: CliConfig,
        runner: Arc<dyn ToolRunner>,
        killer: Arc<dyn ProcessKiller>,
    ) -> Self {
        Self {
            config,
            tracker: Arc::new(OperationTracker::new(killer)),
            events: EventBus::new(),
            runner,
        }
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    /// True while an operation holds the gate.
    pub fn in_progress(&self) -> bool {
        self.tracker.in_progress()
    }

    pub fn set_project_folder(&mut self, project_folder: impl Into<String>) -> &mut Self {
        self.config.project_folder = project_folder.into();
        self
    }

    pub fn set_api_version(&mut self, api_version: impl ToString) -> &mut Self {
        self.config.api_version = Some(api_version.to_string());
        self
    }

    pub fn set_namespace_prefix(&mut self, namespace_prefix: impl Into<String>) -> &mut Self {
        self.config.namespace_prefix = namespace_prefix.into();
        self
    }

    pub fn set_compress_files(&mut self, compress_files: bool) -> &mut Self {
        self.config.compress_files = compress_files;
        self
    }

    pub fn set_sort_order(&mut self, sort_order: impl Into<String>) -> &mut Self {
        self.config.sort_order = Some(sort_order.into());
        self
    }

    pub fn set_ignore_file(&mut self, ignore_file: impl Into<String>) -> &mut Self {
        self.config.ignore_file = Some(ignore_file.into());
        self
    }

    pub fn set_output_path(&mut self, output_path: impl Into<PathBuf>) -> &mut Self {
        self.config.output_path = Some(output_path.into());
        self
    }

    pub fn set_allow_concurrence(&mut self, allow_concurrence: bool) -> &mut Self {
        self.config.allow_concurrence = allow_concurrence;
        self
    }

    /// Subscribe to progress and abort events. Every subscriber receives
    /// every event emitted after it attached, in emission order.
    pub fn subscribe(&self) -> broadcast::Receiver<CliEvent> {
        self.events.subscribe()
    }

    /// Signal every running process to stop, then notify subscribers.
    ///
    /// Kill delivery is best effort; in-flight operations settle on their
    /// own once their process dies. A no-op registry still emits the abort
    /// event exactly once.
    pub fn abort_processes(&self) {
        let killed = self.tracker.abort();
        info!(killed, "abort requested");
        self.events.emit_abort();
    }

    /// Compress XML metadata files in place: one file, several files, or
    /// exactly one folder.
    ///
    /// Mixing files and folders, or passing more than one folder, is
    /// unsupported; an empty selection is a not-found error.
    pub async fn compress<P: AsRef<Path>>(
        &self,
        paths: &[P],
        sort_order: Option<&str>,
    ) -> Result<(), CliError> {
        let _guard = self.begin()?;
        let mut files = Vec::new();
        let mut folders = Vec::new();
        for path in paths {
            if is_file(path) {
                files.push(validate_file_path(path)?);
            } else {
                folders.push(validate_folder_path(path)?);
            }
        }
        if files.is_empty() && folders.is_empty() {
            return Err(CliError::NotFound(
                "no files or folders selected to compress".to_string(),
            ));
        }
        if !files.is_empty() && !folders.is_empty() {
            return Err(CliError::OperationNotSupported(
                "cannot compress files and folders at the same time".to_string(),
            ));
        }
        if folders.len() > 1 {
            return Err(CliError::OperationNotSupported(
                "cannot compress more than one folder at the same time".to_string(),
            ));
        }
        let project = self.project_folder()?;
        let sort_order = sort_order.or(self.config.sort_order.as_deref());
        let spec = if files.is_empty() {
            factory::compress_folder(&project, &folders[0], sort_order)?
        } else {
            factory::compress_files(&project, &files, sort_order)?
        };
        self.run_normalized(spec).await?;
        Ok(())
    }

    /// Metadata types that exist in the project org but not locally.
    pub async fn compare_with_org(&self) -> Result<MetadataTypes, CliError> {
        let _guard = self.begin()?;
        let project = self.project_folder()?;
        let spec = factory::org_compare(&project, self.config.api_version.as_deref())?;
        from_payload(self.run_normalized(spec).await?)
    }

    /// Metadata types that exist on the target org but not on the source.
    ///
    /// With `target` absent, `source_or_target` is the target and the
    /// project org is the source.
    pub async fn compare_org_between(
        &self,
        source_or_target: &str,
        target: Option<&str>,
    ) -> Result<MetadataTypes, CliError> {
        let (source, target) = match target {
            Some(target) => (Some(source_or_target), target),
            None => (None, source_or_target),
        };
        let _guard = self.begin()?;
        let project = self.project_folder()?;
        let spec = factory::org_compare_between(
            &project,
            source,
            target,
            self.config.api_version.as_deref(),
        )?;
        from_payload(self.run_normalized(spec).await?)
    }

    /// Describe all or selected metadata types from the local project.
    pub async fn describe_local_metadata(
        &self,
        types: Option<SelectionInput>,
        group_global_actions: bool,
    ) -> Result<MetadataTypes, CliError> {
        let _guard = self.begin()?;
        let types = transform_selection(types.as_ref(), true)?;
        let project = self.project_folder()?;
        let spec = factory::describe_metadata(
            &project,
            DescribeOptions {
                from_org: false,
                types,
                download_all: false,
                group_global_actions,
                api_version: self.config.api_version.clone(),
            },
        )?;
        from_payload(self.run_normalized(spec).await?)
    }

    /// Describe all or selected metadata types from the project org,
    /// optionally across all namespaces.
    pub async fn describe_org_metadata(
        &self,
        types: Option<SelectionInput>,
        download_all: bool,
        group_global_actions: bool,
    ) -> Result<MetadataTypes, CliError> {
        let _guard = self.begin()?;
        let types = transform_selection(types.as_ref(), true)?;
        let project = self.project_folder()?;
        let spec = factory::describe_metadata(
            &project,
            DescribeOptions {
                from_org: true,
                types,
                download_all,
                group_global_actions,
                api_version: self.config.api_version.clone(),
            },
        )?;
        from_payload(self.run_normalized(spec).await?)
    }

    /// Retrieve special metadata (profiles, permission sets, record types
    /// and friends) from the local project sources.
    pub async fn retrieve_local_special_metadata(
        &self,
        types: Option<SelectionInput>,
    ) -> Result<RetrieveResult, CliError> {
        self.retrieve_special(types, false, false, false).await
    }

    /// Retrieve special metadata from the project org.
    pub async fn retrieve_org_special_metadata(
        &self,
        types: Option<SelectionInput>,
        download_all: bool,
    ) -> Result<RetrieveResult, CliError> {
        self.retrieve_special(types, true, false, download_all).await
    }

    /// Retrieve special metadata mixing local sources with org data.
    pub async fn retrieve_mixed_special_metadata(
        &self,
        types: Option<SelectionInput>,
        download_all: bool,
    ) -> Result<RetrieveResult, CliError> {
        self.retrieve_special(types, false, true, download_all).await
    }

    async fn retrieve_special(
        &self,
        types: Option<SelectionInput>,
        from_org: bool,
        include_org: bool,
        download_all: bool,
    ) -> Result<RetrieveResult, CliError> {
        let _guard = self.begin()?;
        let types = transform_selection(types.as_ref(), false)?;
        let project = self.project_folder()?;
        let spec = factory::retrieve_special(
            &project,
            RetrieveOptions {
                from_org,
                include_org,
                types,
                download_all,
                compress: self.config.compress_files,
                sort_order: self.config.sort_order.clone(),
                api_version: self.config.api_version.clone(),
            },
        )?;
        from_payload_or_default(self.run_normalized(spec).await?)
    }

    /// User permission API names available on the project org.
    pub async fn load_user_permissions(&self) -> Result<Vec<String>, CliError> {
        let _guard = self.begin()?;
        let project = self.project_folder()?;
        let spec = factory::load_permissions(&project, self.config.api_version.as_deref())?;
        from_payload_or_default(self.run_normalized(spec).await?)
    }

    /// Build package and destructive manifests from the git diff between
    /// two commits, tags, or branches.
    pub async fn create_package_from_git(
        &self,
        source: &str,
        target: Option<&str>,
        create_type: PackageKind,
        delete_order: DeleteOrder,
        use_ignore: bool,
    ) -> Result<PackageGeneratorResult, CliError> {
        let _guard = self.begin()?;
        let project = self.project_folder()?;
        let spec = factory::package_generator(
            &project,
            PackageOptions {
                create_from: "git",
                source: Some(source.to_string()),
                target: target.map(ToString::to_string),
                create_type,
                delete_order,
                use_ignore,
                ignore_file: self.config.ignore_file_or_default(),
                explicit: true,
                api_version: self.config.api_version.clone(),
                output_path: self.config.output_path.clone(),
            },
        )?;
        from_payload_or_default(self.run_normalized(spec).await?)
    }

    /// Build a package or destructive manifest from a metadata JSON file.
    pub async fn create_package_from_json(
        &self,
        source: impl AsRef<Path>,
        create_type: PackageKind,
        delete_order: DeleteOrder,
        use_ignore: bool,
        explicit: bool,
    ) -> Result<PackageGeneratorResult, CliError> {
        let _guard = self.begin()?;
        let source = validate_file_path(source)?;
        let project = self.project_folder()?;
        let spec = factory::package_generator(
            &project,
            PackageOptions {
                create_from: "json",
                source: Some(source.display().to_string()),
                target: None,
                create_type,
                delete_order,
                use_ignore,
                ignore_file: self.config.ignore_file_or_default(),
                explicit,
                api_version: self.config.api_version.clone(),
                output_path: self.config.output_path.clone(),
            },
        )?;
        from_payload_or_default(self.run_normalized(spec).await?)
    }

    /// Merge existing manifest files into a new package or destructive
    /// manifest.
    pub async fn create_package_from_other_packages<P: AsRef<Path>>(
        &self,
        sources: &[P],
        create_type: PackageKind,
        delete_order: DeleteOrder,
        use_ignore: bool,
    ) -> Result<PackageGeneratorResult, CliError> {
        let _guard = self.begin()?;
        let mut validated = Vec::with_capacity(sources.len());
        for source in sources {
            validated.push(validate_file_path(source)?.display().to_string());
        }
        if validated.is_empty() {
            return Err(CliError::NotFound(
                "no manifest files selected to merge".to_string(),
            ));
        }
        let project = self.project_folder()?;
        let spec = factory::package_generator(
            &project,
            PackageOptions {
                create_from: "package",
                source: Some(validated.join(",")),
                target: None,
                create_type,
                delete_order,
                use_ignore,
                ignore_file: self.config.ignore_file_or_default(),
                explicit: true,
                api_version: self.config.api_version.clone(),
                output_path: self.config.output_path.clone(),
            },
        )?;
        from_payload_or_default(self.run_normalized(spec).await?)
    }

    /// Mark all or selected metadata types as ignored in the project's
    /// ignore file.
    pub async fn ignore_metadata(&self, types: Option<SelectionInput>) -> Result<(), CliError> {
        let _guard = self.begin()?;
        let types = transform_selection(types.as_ref(), true)?;
        let project = self.project_folder()?;
        let spec = factory::ignore_metadata(
            &project,
            types,
            &self.config.ignore_file_or_default(),
            self.config.compress_files,
            self.config.sort_order.as_deref(),
        )?;
        self.run_normalized(spec).await?;
        Ok(())
    }

    /// Scan the project for broken metadata dependencies without touching
    /// any file.
    pub async fn check_dependencies(
        &self,
        types: Option<SelectionInput>,
        use_ignore: bool,
    ) -> Result<DependencyCheckReport, CliError> {
        let _guard = self.begin()?;
        let spec = self.repair_spec(types, true, use_ignore)?;
        from_payload_or_default(self.run_normalized(spec).await?)
    }

    /// Repair broken metadata dependencies in the project sources.
    pub async fn repair_dependencies(
        &self,
        types: Option<SelectionInput>,
        use_ignore: bool,
    ) -> Result<DependencyRepairReport, CliError> {
        let _guard = self.begin()?;
        let spec = self.repair_spec(types, false, use_ignore)?;
        from_payload_or_default(self.run_normalized(spec).await?)
    }

    fn repair_spec(
        &self,
        types: Option<SelectionInput>,
        only_check: bool,
        use_ignore: bool,
    ) -> Result<ProcessSpec, CliError> {
        let types = transform_selection(types.as_ref(), false)?;
        let project = self.project_folder()?;
        factory::repair_dependencies(
            &project,
            RepairOptions {
                types,
                only_check,
                use_ignore,
                ignore_file: self.config.ignore_file_or_default(),
                compress: self.config.compress_files,
                sort_order: self.config.sort_order.clone(),
                api_version: self.config.api_version.clone(),
            },
        )
    }

    /// Whether the external tool is installed on this system.
    ///
    /// Any probe failure means "not installed"; this never reports an
    /// operation error.
    pub async fn is_cli_installed(&self) -> Result<bool, CliError> {
        let _guard = self.begin()?;
        let spec = factory::tool_installed()?;
        Ok(self.run_tool(spec).await.is_ok())
    }

    /// Installed version of the external tool, banner prefix stripped.
    pub async fn get_cli_version(&self) -> Result<String, CliError> {
        let _guard = self.begin()?;
        let spec = factory::tool_version()?;
        let payload = self.run_normalized(spec).await?;
        let text = payload.as_str().ok_or_else(|| {
            CliError::UnexpectedPayload("the version command printed no text".to_string())
        })?;
        Ok(strip_version_banner(text))
    }

    /// Update the external tool through its own updater.
    pub async fn update_cli(&self) -> Result<Value, CliError> {
        let _guard = self.begin()?;
        let spec = factory::tool_update()?;
        self.run_normalized(spec).await
    }

    /// Update the external tool through the npm registry it is
    /// distributed on.
    pub async fn update_cli_with_npm(&self) -> Result<Value, CliError> {
        let _guard = self.begin()?;
        let spec = factory::tool_update_npm()?;
        self.run_normalized(spec).await
    }

    fn begin(&self) -> Result<orgtool_layer_core::OperationGuard<'_>, CliError> {
        self.tracker.begin(self.config.allow_concurrence)
    }

    fn project_folder(&self) -> Result<PathBuf, CliError> {
        validate_folder_path(&self.config.project_folder)
    }

    async fn run_tool(&self, spec: ProcessSpec) -> Result<ToolOutcome, CliError> {
        let ctx = RunContext::new(&self.tracker, &self.events);
        self.runner.run(spec, ctx).await
    }

    async fn run_normalized(&self, spec: ProcessSpec) -> Result<Value, CliError> {
        self.run_tool(spec).await?.into_result()
    }
}

fn strip_version_banner(text: &str) -> String {
    let trimmed = text.trim();
    let version = trimmed.strip_prefix(VERSION_BANNER).unwrap_or(trimmed).trim();
    version.strip_prefix('v').unwrap_or(version).to_string()
}
