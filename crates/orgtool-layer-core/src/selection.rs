use crate::error::CliError;
use crate::paths::validate_file_path;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A partial metadata selection, as accepted by every operation that can be
/// scoped to a subset of the project.
///
/// The tree form is the externally-defined `type -> object -> item`
/// structure where each node carries a `checked` flag. It is traversed
/// read-only and never mutated by this layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionInput {
    /// Flat list of metadata type API names.
    Types(Vec<String>),
    /// Nested selection tree with `checked` flags.
    Tree(Value),
    /// Path to a JSON file containing such a tree.
    File(PathBuf),
}

impl SelectionInput {
    pub fn types<S: Into<String>, I: IntoIterator<Item = S>>(iter: I) -> Self {
        SelectionInput::Types(iter.into_iter().map(Into::into).collect())
    }

    pub fn tree(tree: Value) -> Self {
        SelectionInput::Tree(tree)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        SelectionInput::File(path.into())
    }
}

/// Flatten a selection into the colon-delimited list the external tool
/// expects.
///
/// `None` input means "no selection" and yields `Ok(None)`, which is
/// distinct from an empty list: operations pass it on as "all types".
///
/// With `only_types` set, a type name is included iff its own `checked`
/// flag is true; children are not inspected. Otherwise unchecked types are
/// descended into, producing `Type:Object` and `Type:Object:Item` entries
/// for checked children, three levels deep. Output order follows the key
/// insertion order of the tree.
pub fn transform_selection(
    input: Option<&SelectionInput>,
    only_types: bool,
) -> Result<Option<Vec<String>>, CliError> {
    let Some(input) = input else {
        return Ok(None);
    };
    match input {
        SelectionInput::Types(types) => Ok(Some(types.clone())),
        SelectionInput::Tree(tree) => flatten(tree, only_types).map(Some),
        SelectionInput::File(path) => {
            let path = validate_file_path(path)?;
            let text = std::fs::read_to_string(&path)
                .map_err(|err| CliError::InvalidSelection(format!("reading {path:?}: {err}")))?;
            let tree: Value = serde_json::from_str(&text).map_err(|err| {
                CliError::InvalidSelection(format!("{} is not valid JSON: {err}", path.display()))
            })?;
            flatten(&tree, only_types).map(Some)
        }
    }
}

fn flatten(tree: &Value, only_types: bool) -> Result<Vec<String>, CliError> {
    // A JSON array is accepted as an alternative spelling of the flat list.
    if let Some(items) = tree.as_array() {
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str() {
                Some(name) => result.push(name.to_string()),
                None => {
                    return Err(CliError::WrongDatatype(
                        "the types list must contain strings only".to_string(),
                    ));
                }
            }
        }
        return Ok(result);
    }

    let types = tree.as_object().ok_or_else(|| {
        CliError::InvalidSelection(
            "the selection root must be an object or an array of type names".to_string(),
        )
    })?;

    let mut result = Vec::new();
    for (type_name, type_node) in types {
        if only_types {
            if checked(type_name, type_node)? {
                result.push(type_name.clone());
            }
            continue;
        }
        if checked(type_name, type_node)? {
            result.push(type_name.clone());
            continue;
        }
        for (object_name, object_node) in childs(type_name, type_node)? {
            if checked(object_name, object_node)? {
                result.push(format!("{type_name}:{object_name}"));
                continue;
            }
            for (item_name, item_node) in childs(object_name, object_node)? {
                if checked(item_name, item_node)? {
                    result.push(format!("{type_name}:{object_name}:{item_name}"));
                }
            }
        }
    }
    Ok(result)
}

fn checked(name: &str, node: &Value) -> Result<bool, CliError> {
    let node = node
        .as_object()
        .ok_or_else(|| CliError::InvalidSelection(format!("node '{name}' is not an object")))?;
    match node.get("checked") {
        Some(Value::Bool(checked)) => Ok(*checked),
        Some(_) => Err(CliError::InvalidSelection(format!(
            "node '{name}' has a non-boolean 'checked' flag"
        ))),
        None => Err(CliError::InvalidSelection(format!(
            "node '{name}' is missing its 'checked' flag"
        ))),
    }
}

fn childs<'a>(name: &str, node: &'a Value) -> Result<&'a Map<String, Value>, CliError> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
    match node.get("childs") {
        None | Some(Value::Null) => Ok(EMPTY.get_or_init(Map::new)),
        Some(Value::Object(childs)) => Ok(childs),
        Some(_) => Err(CliError::InvalidSelection(format!(
            "node '{name}' has a non-object 'childs' field"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_input_is_no_selection() {
        assert_eq!(transform_selection(None, false).unwrap(), None);
    }

    #[test]
    fn flat_lists_pass_through() {
        let input = SelectionInput::types(["CustomObject", "ApexClass"]);
        assert_eq!(
            transform_selection(Some(&input), true).unwrap(),
            Some(vec!["CustomObject".to_string(), "ApexClass".to_string()])
        );
    }

    #[test]
    fn tree_traversal_descends_into_unchecked_types() {
        let input = SelectionInput::tree(json!({
            "TypeA": {"checked": true},
            "TypeB": {"checked": false, "childs": {"Obj1": {"checked": true}}}
        }));
        assert_eq!(
            transform_selection(Some(&input), false).unwrap(),
            Some(vec!["TypeA".to_string(), "TypeB:Obj1".to_string()])
        );
    }

    #[test]
    fn only_types_ignores_children() {
        let input = SelectionInput::tree(json!({
            "TypeA": {"checked": true},
            "TypeB": {"checked": false, "childs": {"Obj1": {"checked": true}}}
        }));
        assert_eq!(
            transform_selection(Some(&input), true).unwrap(),
            Some(vec!["TypeA".to_string()])
        );
    }

    #[test]
    fn items_flatten_to_three_segment_paths() {
        let input = SelectionInput::tree(json!({
            "CustomField": {
                "checked": false,
                "childs": {
                    "Account": {
                        "checked": false,
                        "childs": {
                            "Name": {"checked": true},
                            "Industry": {"checked": false}
                        }
                    }
                }
            }
        }));
        assert_eq!(
            transform_selection(Some(&input), false).unwrap(),
            Some(vec!["CustomField:Account:Name".to_string()])
        );
    }

    #[test]
    fn fully_unchecked_trees_yield_an_empty_list() {
        let input = SelectionInput::tree(json!({"TypeA": {"checked": false}}));
        assert_eq!(
            transform_selection(Some(&input), false).unwrap(),
            Some(Vec::new())
        );
    }

    #[test]
    fn non_string_array_entries_are_a_datatype_error() {
        let input = SelectionInput::tree(json!(["TypeA", 7]));
        assert!(matches!(
            transform_selection(Some(&input), false),
            Err(CliError::WrongDatatype(_))
        ));
    }

    #[test]
    fn malformed_nodes_are_rejected() {
        let missing_checked = SelectionInput::tree(json!({"TypeA": {}}));
        assert!(matches!(
            transform_selection(Some(&missing_checked), false),
            Err(CliError::InvalidSelection(_))
        ));

        let non_object = SelectionInput::tree(json!({"TypeA": 3}));
        assert!(matches!(
            transform_selection(Some(&non_object), false),
            Err(CliError::InvalidSelection(_))
        ));

        let bad_childs = SelectionInput::tree(json!({
            "TypeA": {"checked": false, "childs": ["Obj1"]}
        }));
        assert!(matches!(
            transform_selection(Some(&bad_childs), false),
            Err(CliError::InvalidSelection(_))
        ));
    }

    #[test]
    fn selection_files_are_read_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        std::fs::write(
            &path,
            r#"{"TypeA": {"checked": true}, "TypeB": {"checked": false}}"#,
        )
        .unwrap();

        let input = SelectionInput::file(&path);
        assert_eq!(
            transform_selection(Some(&input), false).unwrap(),
            Some(vec!["TypeA".to_string()])
        );

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            transform_selection(Some(&input), false),
            Err(CliError::InvalidSelection(_))
        ));

        let missing = SelectionInput::file(dir.path().join("missing.json"));
        assert!(matches!(
            transform_selection(Some(&missing), false),
            Err(CliError::PathNotFound { .. })
        ));
    }
}
