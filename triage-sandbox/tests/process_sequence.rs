//! Tool sequences driven through real subprocesses

use std::sync::Arc;
use std::time::Duration;

use triage_core::domain::ToolSpec;
use triage_sandbox::{ProcessToolRunner, SandboxPolicy, ToolSequence};

fn sample_file(content: &[u8]) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), content).unwrap();
    file
}

#[tokio::test]
async fn timed_out_tool_does_not_stop_later_tools() {
    let target = sample_file(b"hello world\n");
    let sequence = ToolSequence::new(
        vec![
            ToolSpec::new("slow", "sleep", &["30"]).with_timeout_seconds(1),
            ToolSpec::new("cat", "cat", &["{file}"]),
            ToolSpec::new("size", "wc", &["-c"]),
        ],
        Arc::new(ProcessToolRunner::new()),
        SandboxPolicy::unrestricted(Duration::from_secs(10)),
    );

    let outcomes = sequence.run_all(target.path()).await;

    assert_eq!(outcomes.len(), 3);

    let slow = &outcomes["slow"];
    assert_eq!(slow.stdout, "");
    assert_eq!(slow.exit_code, -1);
    assert!(slow.stderr.contains("timed out"));

    assert_eq!(outcomes["cat"].stdout, "hello world\n");
    assert_eq!(outcomes["cat"].exit_code, 0);

    // No placeholder: the path is appended and wc prints "<n> <path>"
    let size = &outcomes["size"];
    assert_eq!(size.exit_code, 0);
    assert!(size.stdout.trim_start().starts_with("12"));
}

#[tokio::test]
async fn missing_tool_is_recorded_and_sequence_continues() {
    let target = sample_file(b"abc");
    let sequence = ToolSequence::new(
        vec![
            ToolSpec::new("ghost", "no-such-inspection-tool", &["{file}"]),
            ToolSpec::new("cat", "cat", &["{file}"]),
        ],
        Arc::new(ProcessToolRunner::new()),
        SandboxPolicy::default(),
    );

    let outcomes = sequence.run_all(target.path()).await;

    assert_eq!(outcomes["ghost"].exit_code, -1);
    assert!(!outcomes["ghost"].stderr.is_empty());
    assert_eq!(outcomes["cat"].stdout, "abc");
}

#[tokio::test]
async fn nonzero_exit_codes_are_preserved() {
    let target = sample_file(b"abc");
    let sequence = ToolSequence::new(
        vec![ToolSpec::new("fail", "sh", &["-c", "echo bad >&2; exit 7", "{file}"])],
        Arc::new(ProcessToolRunner::new()),
        SandboxPolicy::unrestricted(Duration::from_secs(10)),
    );

    let outcomes = sequence.run_all(target.path()).await;

    assert_eq!(outcomes["fail"].exit_code, 7);
    assert_eq!(outcomes["fail"].stderr, "bad\n");
}
