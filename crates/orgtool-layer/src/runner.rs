use async_trait::async_trait;
use orgtool_layer_core::{CliError, ProcessSpec, RunContext, ToolOutcome, ToolRunner};
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::debug;

/// How many stderr lines are kept to explain a failed invocation.
const STDERR_TAIL: usize = 20;

/// Runs external tool invocations as real child processes.
///
/// Stdout is consumed line by line while the process runs: JSON-object
/// lines carrying a progress marker are relayed immediately, the last
/// remaining JSON value becomes the response, plain text is collected for
/// pass-through. Stderr is drained in the background and surfaces only in
/// logs and launch failures.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioToolRunner;

#[async_trait]
impl ToolRunner for TokioToolRunner {
    async fn run(&self, spec: ProcessSpec, ctx: RunContext<'_>) -> Result<ToolOutcome, CliError> {
        let mut command = Command::new(&spec.command);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.working_directory {
            command.current_dir(dir);
        }

        debug!(process = %spec.name, command = %spec.command, "spawning external tool");
        let mut child = command.spawn()?;
        if let Some(pid) = child.id() {
            ctx.register(&spec.name, pid);
        }

        let stderr_task = child.stderr.take().map(|stderr| {
            let name = spec.name.clone();
            tokio::spawn(async move {
                let mut tail: Vec<String> = Vec::new();
                let mut lines = FramedRead::new(stderr, LinesCodec::new());
                while let Some(Ok(line)) = lines.next().await {
                    debug!(process = %name, "stderr: {line}");
                    if tail.len() == STDERR_TAIL {
                        tail.remove(0);
                    }
                    tail.push(line);
                }
                tail
            })
        });

        let mut last_payload: Option<Value> = None;
        let mut text = String::new();
        if let Some(stdout) = child.stdout.take() {
            let mut lines = FramedRead::new(stdout, LinesCodec::new());
            while let Some(line) = lines.next().await {
                let line =
                    line.map_err(|err| CliError::Process(format!("reading stdout: {err}")))?;
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(value) if is_progress(&value) => ctx.progress(value),
                    Ok(value) => last_payload = Some(value),
                    Err(_) => {
                        text.push_str(trimmed);
                        text.push('\n');
                    }
                }
            }
        }

        let status = child.wait().await?;
        let stderr_tail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        if ctx.is_aborted() {
            return Err(CliError::Process(format!(
                "process '{}' was aborted",
                spec.name
            )));
        }

        if !status.success() && last_payload.is_none() {
            let detail = if stderr_tail.is_empty() {
                format!("exit status {status}")
            } else {
                stderr_tail.join("\n")
            };
            return Err(CliError::Process(format!(
                "'{}' failed: {detail}",
                spec.command
            )));
        }

        let payload = last_payload.or_else(|| {
            let text = text.trim();
            (!text.is_empty()).then(|| Value::String(text.to_string()))
        });
        Ok(ToolOutcome::classify(payload))
    }
}

/// Progress notifications are JSON lines carrying an `increment` or
/// `percentage` key; the final report never does.
fn is_progress(value: &Value) -> bool {
    value.is_object() && (value.get("increment").is_some() || value.get("percentage").is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn progress_lines_are_recognized_by_their_markers() {
        assert!(is_progress(&json!({"percentage": 10.0})));
        assert!(is_progress(&json!({"increment": 1, "message": "m"})));
        assert!(!is_progress(&json!({"status": 0, "result": {}})));
        assert!(!is_progress(&json!("percentage")));
    }
}
