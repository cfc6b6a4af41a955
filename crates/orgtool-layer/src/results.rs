//! Typed views over the payloads the external tool reports.
//!
//! All models tolerate missing fields: the tool omits keys whose values are
//! empty, and older tool versions report fewer fields.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Metadata type map returned by describe and compare operations.
pub type MetadataTypes = HashMap<String, MetadataTypeSummary>;

/// One metadata type with its nested objects and items.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataTypeSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub childs: HashMap<String, MetadataObjectSummary>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataObjectSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub childs: HashMap<String, MetadataItemSummary>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetadataItemSummary {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub path: Option<String>,
}

/// Files written by a retrieve-special operation.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResult {
    #[serde(default)]
    pub files: Vec<RetrievedFile>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedFile {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub metadata_type: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Manifest files produced by a package generation.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PackageGeneratorResult {
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub destructive_changes: Option<String>,
    #[serde(default)]
    pub destructive_changes_post: Option<String>,
}

/// Per-type dependency errors found by a check run.
pub type DependencyCheckReport = HashMap<String, Vec<DependencyCheckError>>;

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DependencyCheckError {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub start_column: Option<u64>,
    #[serde(default)]
    pub end_column: Option<u64>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Per-type results of a repair run.
pub type DependencyRepairReport = HashMap<String, DependencyRepairResult>;

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRepairResult {
    #[serde(default)]
    pub metadata_type: Option<String>,
    #[serde(default)]
    pub errors: Vec<DependencyCheckError>,
}

/// Deserialize helper tolerating the extra keys tools like to add.
pub(crate) fn from_payload<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, crate::CliError> {
    serde_json::from_value(value).map_err(|err| crate::CliError::UnexpectedPayload(err.to_string()))
}

/// Like [`from_payload`], but a null payload becomes the type's default.
/// Some operations legitimately report no result at all.
pub(crate) fn from_payload_or_default<T>(value: Value) -> Result<T, crate::CliError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if value.is_null() {
        Ok(T::default())
    } else {
        from_payload(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_maps_deserialize_with_nested_childs() {
        let payload = json!({
            "CustomObject": {
                "name": "CustomObject",
                "checked": false,
                "suffix": "object",
                "childs": {
                    "Account": {
                        "name": "Account",
                        "checked": true,
                        "childs": {}
                    }
                }
            }
        });
        let types: MetadataTypes = from_payload(payload).unwrap();
        let custom_object = &types["CustomObject"];
        assert_eq!(custom_object.suffix.as_deref(), Some("object"));
        assert!(custom_object.childs["Account"].checked);
    }

    #[test]
    fn package_result_tolerates_missing_manifests() {
        let payload = json!({"package": "/p/manifest/package.xml"});
        let result: PackageGeneratorResult = from_payload(payload).unwrap();
        assert_eq!(result.package.as_deref(), Some("/p/manifest/package.xml"));
        assert_eq!(result.destructive_changes, None);
    }

    #[test]
    fn check_report_keeps_error_positions() {
        let payload = json!({
            "CustomApplication": [{
                "file": "/p/app.app-meta.xml",
                "line": 12,
                "startColumn": 4,
                "endColumn": 19,
                "object": "app_console",
                "severity": "Error",
                "message": "Tab does not exist"
            }]
        });
        let report: DependencyCheckReport = from_payload(payload).unwrap();
        let error = &report["CustomApplication"][0];
        assert_eq!(error.line, Some(12));
        assert_eq!(error.start_column, Some(4));
        assert_eq!(error.message, "Tab does not exist");
    }

    #[test]
    fn null_payloads_fall_back_to_defaults() {
        let report: DependencyRepairReport = from_payload_or_default(Value::Null).unwrap();
        assert!(report.is_empty());
    }
}
