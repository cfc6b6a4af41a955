//! Drives the real process runner with `/bin/sh` standing in for the
//! external tool.
#![cfg(unix)]

use orgtool_layer::{
    CliEvent, EventBus, OperationTracker, ProcessSpec, RunContext, TokioToolRunner, ToolOutcome,
    ToolRunner, default_process_killer,
};
use serde_json::{Value, json};
use std::time::Duration;

fn sh(name: &str, script: &str) -> ProcessSpec {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
    ProcessSpec::new(name, "/bin/sh").arg("-c").arg(script)
}

fn tracker() -> OperationTracker {
    OperationTracker::new(default_process_killer())
}

#[tokio::test]
async fn report_lines_become_structured_outcomes() {
    let tracker = tracker();
    let events = EventBus::new();

    let outcome = TokioToolRunner
        .run(
            sh("report", r#"echo '{"status":0,"result":{"x":1}}'"#),
            RunContext::new(&tracker, &events),
        )
        .await
        .unwrap();

    assert_eq!(outcome.into_result().unwrap(), json!({"x": 1}));
    // The runner registered the child; nothing has cleared the registry yet.
    assert_eq!(tracker.tracked(), 1);
}

#[tokio::test]
async fn progress_lines_are_relayed_before_the_report() {
    let tracker = tracker();
    let events = EventBus::new();
    let mut rx = events.subscribe();

    let script = concat!(
        r#"echo '{"percentage":10,"message":"working"}'; "#,
        r#"echo '{"percentage":90,"message":"almost"}'; "#,
        r#"echo '{"status":0,"result":[]}'"#
    );
    let outcome = TokioToolRunner
        .run(sh("progress", script), RunContext::new(&tracker, &events))
        .await
        .unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        CliEvent::Progress(json!({"percentage": 10, "message": "working"}))
    );
    assert_eq!(
        rx.recv().await.unwrap(),
        CliEvent::Progress(json!({"percentage": 90, "message": "almost"}))
    );
    assert_eq!(outcome.into_result().unwrap(), json!([]));
}

#[tokio::test]
async fn plain_text_passes_through_raw() {
    let tracker = tracker();
    let events = EventBus::new();

    let outcome = TokioToolRunner
        .run(
            sh("version", "echo 'OrgTool CLI Version: v9.9.9'"),
            RunContext::new(&tracker, &events),
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ToolOutcome::Raw(Value::String("OrgTool CLI Version: v9.9.9".to_string()))
    );
}

#[tokio::test]
async fn silent_success_is_an_absent_outcome() {
    let tracker = tracker();
    let events = EventBus::new();

    let outcome = TokioToolRunner
        .run(sh("silent", "true"), RunContext::new(&tracker, &events))
        .await
        .unwrap();

    assert_eq!(outcome, ToolOutcome::Absent);
    assert_eq!(outcome.into_result().unwrap(), json!({}));
}

#[tokio::test]
async fn failures_without_a_report_surface_stderr() {
    let tracker = tracker();
    let events = EventBus::new();

    let err = TokioToolRunner
        .run(
            sh("broken", "echo oops >&2; exit 3"),
            RunContext::new(&tracker, &events),
        )
        .await
        .unwrap_err();

    assert!(format!("{err}").contains("oops"));
}

#[tokio::test]
async fn a_failing_report_wins_over_the_exit_status() {
    let tracker = tracker();
    let events = EventBus::new();

    let outcome = TokioToolRunner
        .run(
            sh("tool-error", r#"echo '{"status":1,"message":"bad"}'; exit 1"#),
            RunContext::new(&tracker, &events),
        )
        .await
        .unwrap();

    let err = outcome.into_result().unwrap_err();
    assert_eq!(err.tool_message(), Some("bad"));
}

#[tokio::test]
async fn missing_binaries_fail_to_launch() {
    let tracker = tracker();
    let events = EventBus::new();

    let spec = ProcessSpec::new("missing", "definitely-not-a-real-binary-on-path");
    let result = TokioToolRunner
        .run(spec, RunContext::new(&tracker, &events))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn aborting_kills_the_running_invocation() {
    let tracker = tracker();
    let events = EventBus::new();

    let run = TokioToolRunner.run(sh("long", "sleep 30"), RunContext::new(&tracker, &events));
    let abort = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(tracker.abort(), 1);
    };

    let (result, ()) = tokio::join!(run, abort);
    assert!(result.is_err());
}
