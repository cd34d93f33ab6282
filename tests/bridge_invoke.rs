#![cfg(unix)]

use std::{
    fs,
    path::Path,
    time::{Duration, Instant},
};

use anyhow::Result;
use mailbridge::{
    bridge::{Bridge, ExecutionOutcome, Interpreter, Invoker, ScriptArg, ScriptInvocation, TemplateStore},
    BridgeError,
};

fn sh_bridge(root: &Path, timeout: Duration) -> Bridge {
    Bridge::new(
        TemplateStore::new(root),
        Invoker::new(Interpreter::new("sh", "-c"), timeout),
    )
}

fn write_script(root: &Path, relative: &str, body: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)?;
    Ok(())
}

#[tokio::test]
async fn file_mode_round_trips_arguments() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "debug/echo_args.applescript", "printf '[%s]' \"$@\"\n")?;
    let bridge = sh_bridge(dir.path(), Duration::from_secs(10));

    let args = vec![
        ScriptArg::from("Gmail"),
        ScriptArg::Absent,
        ScriptArg::from("Projects,Amplify Impact"),
        ScriptArg::from(true),
        ScriptArg::from(7i64),
    ];
    let out = bridge
        .execute(&ScriptInvocation::file("debug/echo_args.applescript", args))
        .await?;
    assert_eq!(out, "[Gmail][][Projects,Amplify Impact][true][7]");
    Ok(())
}

#[tokio::test]
async fn file_mode_passes_quotes_raw() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "debug/first.applescript", "printf '%s' \"$1\"\n")?;
    let bridge = sh_bridge(dir.path(), Duration::from_secs(10));

    let out = bridge
        .execute(&ScriptInvocation::file(
            "debug/first.applescript",
            vec![ScriptArg::from(r#"He said "hi""#)],
        ))
        .await?;
    assert_eq!(out, r#"He said "hi""#);
    Ok(())
}

#[tokio::test]
async fn inline_quotes_do_not_break_the_literal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bridge = sh_bridge(dir.path(), Duration::from_secs(10));

    let invocation = ScriptInvocation::inline_template(
        r#"printf '%s' "{{message}}""#,
        &[("message", ScriptArg::from(r#"He said "hi""#))],
    );
    assert_eq!(bridge.execute(&invocation).await?, r#"He said "hi""#);
    Ok(())
}

#[tokio::test]
async fn stdout_is_trimmed_and_newlines_normalized() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bridge = sh_bridge(dir.path(), Duration::from_secs(10));

    let out = bridge
        .execute(&ScriptInvocation::inline(r"printf '  first\rsecond\r\n\n'"))
        .await?;
    assert_eq!(out, "first\nsecond");
    Ok(())
}

#[tokio::test]
async fn slow_script_times_out() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "debug/slow.applescript", "sleep 5\necho done\n")?;
    let bridge = sh_bridge(dir.path(), Duration::from_millis(300));

    let started = Instant::now();
    let outcome = bridge.run(&ScriptInvocation::inline("sleep 5; echo done")).await?;
    assert_eq!(outcome, ExecutionOutcome::TimedOut);

    let outcome = bridge
        .run(&ScriptInvocation::file("debug/slow.applescript", vec![]))
        .await?;
    assert_eq!(outcome, ExecutionOutcome::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(4));

    let err = bridge
        .execute(&ScriptInvocation::inline("sleep 5"))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout(d) if d == Duration::from_millis(300)));
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_fails_in_both_modes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_script(dir.path(), "debug/fail.applescript", "echo partial\necho boom >&2\nexit 3\n")?;
    let bridge = sh_bridge(dir.path(), Duration::from_secs(10));

    let expected = ExecutionOutcome::Failed { exit_code: Some(3), stderr: "boom".to_string() };
    let inline = bridge
        .run(&ScriptInvocation::inline("echo partial; echo boom >&2; exit 3"))
        .await?;
    assert_eq!(inline, expected);

    let file = bridge
        .run(&ScriptInvocation::file("debug/fail.applescript", vec![]))
        .await?;
    assert_eq!(file, expected);

    let err = bridge
        .execute(&ScriptInvocation::file("debug/fail.applescript", vec![]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("boom"));
    Ok(())
}

#[tokio::test]
async fn missing_interpreter_is_a_launch_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let bridge = Bridge::new(
        TemplateStore::new(dir.path()),
        Invoker::new(
            Interpreter::new("/nonexistent/bin/osascript-missing", "-e"),
            Duration::from_secs(5),
        ),
    );

    let outcome = bridge.run(&ScriptInvocation::inline("return 1")).await?;
    assert!(matches!(outcome, ExecutionOutcome::LaunchError { .. }));

    let err = bridge.execute(&ScriptInvocation::inline("return 1")).await.unwrap_err();
    assert!(matches!(
        err,
        BridgeError::LaunchError { program, .. } if program == "/nonexistent/bin/osascript-missing"
    ));
    Ok(())
}

#[tokio::test]
async fn missing_template_never_spawns() -> Result<()> {
    let dir = tempfile::tempdir()?;
    // A broken interpreter proves resolution fails before any launch.
    let bridge = Bridge::new(
        TemplateStore::new(dir.path()),
        Invoker::new(Interpreter::new("/nonexistent/interpreter", "-e"), Duration::from_secs(5)),
    );

    let err = bridge
        .run(&ScriptInvocation::file("search/nope.applescript", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::TemplateNotFound(_)));
    Ok(())
}
