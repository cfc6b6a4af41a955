use crate::error::CliError;
use serde_json::{Map, Value};

/// Everything the external tool can hand back for one operation.
///
/// The three shapes are deliberately distinct because different tool
/// operations finish in different ways: most print a JSON report with a
/// status code, version-style commands print plain text, and a few print
/// nothing at all.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The process produced no payload at all.
    Absent,
    /// A JSON-object report; success and failure are decided by its
    /// `status` field.
    Report(Value),
    /// Any non-object value, passed through untouched.
    Raw(Value),
}

impl ToolOutcome {
    /// Classify a raw stdout payload into an outcome.
    pub fn classify(payload: Option<Value>) -> Self {
        match payload {
            None => ToolOutcome::Absent,
            Some(value) if value.is_object() => ToolOutcome::Report(value),
            Some(value) => ToolOutcome::Raw(value),
        }
    }

    /// Normalize the outcome into the operation's result payload.
    ///
    /// - [`ToolOutcome::Absent`] is trivial success with an empty object.
    /// - A report with `status == 0` succeeds with its `result` (or null).
    /// - A report with any other status fails with the tool's `message`
    ///   when present, otherwise with the whole report.
    /// - [`ToolOutcome::Raw`] values succeed as-is.
    pub fn into_result(self) -> Result<Value, CliError> {
        match self {
            ToolOutcome::Absent => Ok(Value::Object(Map::new())),
            ToolOutcome::Raw(value) => Ok(value),
            ToolOutcome::Report(report) => {
                let status = report.get("status").and_then(Value::as_i64);
                if status == Some(0) {
                    return Ok(report.get("result").cloned().unwrap_or(Value::Null));
                }
                match report.get("message").and_then(Value::as_str) {
                    Some(message) if !message.is_empty() => {
                        Err(CliError::ToolReported(Value::String(message.to_string())))
                    }
                    _ => Err(CliError::ToolReported(report)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_response_is_trivial_success() {
        let result = ToolOutcome::classify(None).into_result().unwrap();
        assert_eq!(result, json!({}));
    }

    #[test]
    fn zero_status_report_yields_its_result() {
        let outcome = ToolOutcome::classify(Some(json!({"status": 0, "result": {"x": 1}})));
        assert_eq!(outcome.into_result().unwrap(), json!({"x": 1}));
    }

    #[test]
    fn zero_status_report_without_result_yields_null() {
        let outcome = ToolOutcome::classify(Some(json!({"status": 0})));
        assert_eq!(outcome.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn failing_report_prefers_its_message() {
        let outcome = ToolOutcome::classify(Some(json!({"status": 1, "message": "bad"})));
        let error = outcome.into_result().unwrap_err();
        assert_eq!(error.tool_message(), Some("bad"));
    }

    #[test]
    fn failing_report_without_message_carries_the_whole_report() {
        let outcome = ToolOutcome::classify(Some(json!({"status": 1})));
        match outcome.into_result().unwrap_err() {
            CliError::ToolReported(report) => assert_eq!(report, json!({"status": 1})),
            other => panic!("expected ToolReported, got {other:?}"),
        }
    }

    #[test]
    fn object_without_status_is_a_failure() {
        let outcome = ToolOutcome::classify(Some(json!({"message": "no status here"})));
        let error = outcome.into_result().unwrap_err();
        assert_eq!(error.tool_message(), Some("no status here"));
    }

    #[test]
    fn non_object_values_pass_through() {
        let outcome = ToolOutcome::classify(Some(json!("plain string")));
        assert_eq!(outcome.into_result().unwrap(), json!("plain string"));

        let outcome = ToolOutcome::classify(Some(json!(["a", "b"])));
        assert_eq!(outcome.into_result().unwrap(), json!(["a", "b"]));
    }
}
