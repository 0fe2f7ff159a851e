use super::*;
use std::fs as std_fs;

fn agent_message(text: &str) -> String {
    json!({"type": "item.completed", "item": {"type": "agent_message", "text": text}}).to_string()
}

#[tokio::test]
async fn line_reader_trims_and_skips_blank_lines() {
    let temp = tempfile::tempdir().unwrap();
    let script = "#!/bin/sh\nprintf '  first  \\n\\n   \\n\\tsecond\\r\\n'\nprintf 'third'\n";
    let binary = write_fake_codex(temp.path(), script);

    let child = launch(&ExecRequest::new("ignored").binary(&binary)).unwrap();
    let mut reader = LineReader::new(child).unwrap();
    let mut lines = Vec::new();
    while let Some(line) = reader.next_line().await.unwrap() {
        lines.push(line);
    }

    assert_eq!(lines, ["first", "second", "third"]);
    assert!(reader.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn launch_passes_fixed_arguments_and_working_dir() {
    let temp = tempfile::tempdir().unwrap();
    let workspace = tempfile::tempdir().unwrap();
    let args_path = temp.path().join("args.txt");
    let cwd_path = temp.path().join("cwd.txt");
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\npwd > '{}'\n",
        args_path.display(),
        cwd_path.display()
    );
    let binary = write_fake_codex(temp.path(), &script);

    let request = ExecRequest::new("Explain 'this'\nplease")
        .binary(&binary)
        .model("gpt-5.1-codex-mini")
        .working_dir(workspace.path());
    let events: Vec<_> = stream_events(&request).unwrap().collect().await;
    assert!(events.is_empty(), "{events:?}");

    let args = std_fs::read_to_string(&args_path).unwrap();
    assert_eq!(
        args,
        "exec\n--json\n--skip-git-repo-check\n--sandbox\nread-only\n--color\nnever\n\
         --model\ngpt-5.1-codex-mini\nExplain 'this'\nplease\n"
    );

    let cwd = std_fs::read_to_string(&cwd_path).unwrap();
    assert_eq!(
        std_fs::canonicalize(cwd.trim()).unwrap(),
        std_fs::canonicalize(workspace.path()).unwrap()
    );
}

#[tokio::test]
async fn event_stream_skips_malformed_lines() {
    let temp = tempfile::tempdir().unwrap();
    let first = agent_message("one");
    let second = agent_message("two");
    let script = script_printing(&[&first, "{not json", "", &second], 0);
    let binary = write_fake_codex(temp.path(), &script);

    let events: Vec<_> = stream_events(&ExecRequest::new("p").binary(&binary))
        .unwrap()
        .collect()
        .await;

    let texts: Vec<_> = events
        .into_iter()
        .map(|event| event.unwrap().item.unwrap().text.unwrap())
        .collect();
    assert_eq!(texts, ["one", "two"]);
}

#[tokio::test]
async fn nonzero_exit_surfaces_after_buffered_events() {
    let temp = tempfile::tempdir().unwrap();
    let line = agent_message("partial");
    let script = format!(
        "#!/bin/sh\nprintf '%s\\n' '{line}'\necho '  not logged in  ' >&2\nexit 2\n"
    );
    let binary = write_fake_codex(temp.path(), &script);

    let mut events = stream_events(&ExecRequest::new("p").binary(&binary)).unwrap();
    let first = events.next().await.unwrap().unwrap();
    assert_eq!(first.item.unwrap().text.as_deref(), Some("partial"));

    match events.next().await {
        Some(Err(CodexError::ExecutionFailed { exit_code, stderr })) => {
            assert_eq!(exit_code, 2);
            assert_eq!(stderr, "not logged in");
        }
        other => panic!("expected ExecutionFailed, got {other:?}"),
    }
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn zero_exit_ignores_stderr() {
    let temp = tempfile::tempdir().unwrap();
    let script = "#!/bin/sh\necho 'warning: deprecated flag' >&2\nexit 0\n";
    let binary = write_fake_codex(temp.path(), script);

    let events: Vec<_> = stream_events(&ExecRequest::new("p").binary(&binary))
        .unwrap()
        .collect()
        .await;
    assert!(events.is_empty(), "{events:?}");
}

#[tokio::test]
async fn missing_binary_fails_before_streaming() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("not-installed").join("codex");

    let handler = CodexCliHandler::builder().binary(&missing).build();
    let Err(err) = handler.create_message("sys", &[ChatMessage::user("hi")]) else {
        panic!("expected launch failure");
    };
    match err {
        CodexError::BinaryNotFound {
            binary,
            installation_url,
            ..
        } => {
            assert_eq!(binary, missing);
            assert_eq!(installation_url, "https://github.com/openai/codex");
        }
        other => panic!("expected BinaryNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn handler_yields_chunks_then_turn_failure() {
    let temp = tempfile::tempdir().unwrap();
    let reasoning =
        json!({"type": "item.completed", "item": {"type": "reasoning", "text": "Thinking"}})
            .to_string();
    let message = agent_message("Partial answer");
    let failed = json!({"type": "turn.failed", "error": {"message": "boom"}}).to_string();
    let script = script_printing(
        &[
            r#"{"type":"thread.started","thread_id":"t-1"}"#,
            &reasoning,
            &message,
            &failed,
        ],
        1,
    );
    let binary = write_fake_codex(temp.path(), &script);

    let handler = CodexCliHandler::builder().binary(&binary).build();
    let results: Vec<_> = handler
        .create_message("sys", &[ChatMessage::user("go")])
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 3, "{results:?}");
    assert_eq!(results[0].as_ref().unwrap(), &OutputChunk::reasoning("Thinking"));
    assert_eq!(results[1].as_ref().unwrap(), &OutputChunk::text("Partial answer"));
    match &results[2] {
        Err(CodexError::TurnFailed { message }) => assert_eq!(message, "boom"),
        other => panic!("expected TurnFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn string_error_payload_still_fails_the_turn() {
    let temp = tempfile::tempdir().unwrap();
    let message = agent_message("Working");
    let script = script_printing(&[&message, r#"{"type":"turn.failed","error":"boom"}"#], 0);
    let binary = write_fake_codex(temp.path(), &script);

    let handler = CodexCliHandler::builder().binary(&binary).build();
    let results: Vec<_> = handler
        .create_message("sys", &[ChatMessage::user("go")])
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 2, "{results:?}");
    assert_eq!(results[0].as_ref().unwrap(), &OutputChunk::text("Working"));
    match &results[1] {
        Err(CodexError::TurnFailed { message }) => assert_eq!(message, "Codex CLI turn failed"),
        other => panic!("expected TurnFailed, got {other:?}"),
    }
}

#[test]
#[should_panic]
fn create_message_outside_runtime_panics() {
    let temp = tempfile::tempdir().unwrap();
    let binary = write_fake_codex(temp.path(), "#!/bin/sh\nexit 0\n");

    let handler = CodexCliHandler::builder().binary(&binary).build();
    let _ = handler.create_message("sys", &[ChatMessage::user("hi")]);
}

#[tokio::test]
async fn handler_passes_resolved_model_and_prompt() {
    let temp = tempfile::tempdir().unwrap();
    let args_path = temp.path().join("args.txt");
    let script = format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n", args_path.display());
    let binary = write_fake_codex(temp.path(), &script);

    let handler = CodexCliHandler::builder()
        .binary(&binary)
        .model("not-a-real-model")
        .build();
    assert_eq!(handler.model().id, "gpt-5.1-codex-max");

    let chunks: Vec<_> = handler
        .create_message("System rules.", &[ChatMessage::user("Hello")])
        .unwrap()
        .collect()
        .await;
    assert!(chunks.is_empty());

    let args = std_fs::read_to_string(&args_path).unwrap();
    assert!(args.contains("--model\ngpt-5.1-codex-max\n"), "{args}");
    assert!(args.contains("System rules.\n\nConversation so far:\nUser:\nHello"), "{args}");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn dropping_line_stream_kills_process() {
    let temp = tempfile::tempdir().unwrap();
    let script = "#!/bin/sh\necho first\nexec sleep 30\n";
    let binary = write_fake_codex(temp.path(), script);

    let child = launch(&ExecRequest::new("p").binary(&binary)).unwrap();
    let reader = LineReader::new(child).unwrap();
    let pid = reader.pid().unwrap();

    let mut lines = Box::pin(reader.into_stream());
    assert_eq!(lines.next().await.unwrap().unwrap(), "first");
    assert!(process_alive(pid));

    drop(lines);
    assert!(wait_for_exit(pid).await, "codex process {pid} still running");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn abandoning_chunk_stream_after_first_chunk_kills_process() {
    let temp = tempfile::tempdir().unwrap();
    let pid_path = temp.path().join("codex.pid");
    let first = agent_message("first");
    let script = format!(
        "#!/bin/sh\necho $$ > '{}'\nprintf '%s\\n' '{first}'\nexec sleep 30\n",
        pid_path.display()
    );
    let binary = write_fake_codex(temp.path(), &script);

    let handler = CodexCliHandler::builder().binary(&binary).build();
    let mut chunks = handler.create_message("sys", &[ChatMessage::user("go")]).unwrap();
    assert_eq!(chunks.next().await.unwrap().unwrap(), OutputChunk::text("first"));

    let pid = read_pid_file(&pid_path).await;
    assert!(process_alive(pid));

    drop(chunks);
    assert!(wait_for_exit(pid).await, "codex process {pid} still running");
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn fatal_event_kills_still_running_process() {
    let temp = tempfile::tempdir().unwrap();
    let pid_path = temp.path().join("codex.pid");
    let script = format!(
        "#!/bin/sh\necho $$ > '{}'\nprintf '%s\\n' '{{\"type\":\"error\",\"message\":\"quota\"}}'\nexec sleep 30\n",
        pid_path.display()
    );
    let binary = write_fake_codex(temp.path(), &script);

    let handler = CodexCliHandler::builder().binary(&binary).build();
    let mut chunks = handler.create_message("sys", &[ChatMessage::user("go")]).unwrap();
    match chunks.next().await {
        Some(Err(CodexError::ProtocolError { message })) => assert_eq!(message, "quota"),
        other => panic!("expected ProtocolError, got {other:?}"),
    }

    let pid = read_pid_file(&pid_path).await;
    assert!(chunks.next().await.is_none());
    assert!(wait_for_exit(pid).await, "codex process {pid} still running");
}
