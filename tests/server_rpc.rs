#![cfg(unix)]

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use mailbridge::{
    bridge::{Bridge, Interpreter, Invoker, TemplateStore},
    operations::Registry,
    server::{self, MailServer},
};
use serde_json::{json, Value};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream},
    task::JoinHandle,
};

fn server_with_inline(root: &Path, inline_body: &str) -> Result<MailServer> {
    let inline = root.join("inline.sh");
    fs::write(&inline, inline_body)?;
    let bridge = Bridge::new(
        TemplateStore::new(root),
        Invoker::new(
            Interpreter::new("sh", inline.to_string_lossy()),
            Duration::from_secs(10),
        ),
    );
    Ok(MailServer::new(Registry::with_catalog(Some("Prefer Work".to_string())), bridge))
}

/// A client end of a running server, talking newline-delimited JSON.
struct Session {
    input: DuplexStream,
    output: BufReader<DuplexStream>,
    task: JoinHandle<Result<()>>,
}

impl Session {
    fn start(server: MailServer) -> Self {
        let (input, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, output) = tokio::io::duplex(64 * 1024);
        let task = tokio::spawn(server::serve(server, BufReader::new(server_in), server_out));
        Self { input, output: BufReader::new(output), task }
    }

    async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.input.write_all(bytes).await?;
        Ok(())
    }

    async fn send(&mut self, message: Value) -> Result<()> {
        self.send_raw(format!("{message}\n").as_bytes()).await
    }

    async fn recv(&mut self) -> Result<Value> {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(10), self.output.read_line(&mut line))
            .await
            .context("no reply within 10s")??;
        serde_json::from_str(&line).with_context(|| format!("reply is not JSON: {line:?}"))
    }

    async fn request(&mut self, message: Value) -> Result<Value> {
        self.send(message).await?;
        self.recv().await
    }

    async fn initialize(&mut self) -> Result<Value> {
        let reply = self
            .request(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0.1"}
            }}))
            .await?;
        self.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).await?;
        Ok(reply)
    }

    async fn finish(self) -> Result<()> {
        drop(self.input);
        tokio::time::timeout(Duration::from_secs(10), self.task)
            .await
            .context("server did not stop after end of input")???;
        Ok(())
    }
}

fn text_of(reply: &Value) -> &str {
    reply["result"]["content"][0]["text"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn handshake_and_tool_listing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = Session::start(server_with_inline(dir.path(), "exit 0\n")?);

    let init = session.initialize().await?;
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(init["result"]["serverInfo"]["name"], "Apple Mail MCP");
    assert!(init["result"]["capabilities"]["tools"].is_object());

    let res = session.request(json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"})).await?;
    assert_eq!(res["id"], "a");
    let tools = res["result"]["tools"].as_array().context("tools array")?;
    assert_eq!(tools.len(), 20);
    for tool in tools {
        assert!(tool["description"].as_str().unwrap_or("").ends_with("User Preferences: Prefer Work"));
        assert!(tool["inputSchema"]["properties"].is_object());
    }

    session.finish().await
}

#[tokio::test]
async fn tools_call_returns_text_content() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = Session::start(server_with_inline(dir.path(), "printf 'Gmail:2|Work:ERROR'\n")?);
    session.initialize().await?;

    let res = session
        .request(json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call",
                        "params": {"name": "get_unread_count", "arguments": {}}}))
        .await?;
    assert_eq!(res["id"], 7);
    assert_ne!(res["result"]["isError"], true);
    let counts: Value = serde_json::from_str(text_of(&res))?;
    assert_eq!(counts, json!({"Gmail": 2, "Work": -1}));

    session.finish().await
}

#[tokio::test]
async fn failed_calls_are_tool_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = Session::start(server_with_inline(
        dir.path(),
        "echo 'Mail got an error' >&2; exit 1\n",
    )?);
    session.initialize().await?;

    let res = session
        .request(json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                        "params": {"name": "list_accounts"}}))
        .await?;
    assert_eq!(res["result"]["isError"], true);
    assert!(text_of(&res).starts_with("Error: "));
    assert!(text_of(&res).contains("Mail got an error"));

    let res = session
        .request(json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                        "params": {"name": "no_such_tool", "arguments": {}}}))
        .await?;
    assert_eq!(res["result"]["isError"], true);

    let res = session
        .request(json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
                        "params": {"arguments": {}}}))
        .await?;
    assert_eq!(res["id"], 5);
    assert_eq!(res["error"]["code"], -32602);

    session.finish().await
}

#[tokio::test]
async fn undecodable_lines_do_not_end_the_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = Session::start(server_with_inline(dir.path(), "exit 0\n")?);

    session.send_raw(b"\xff\xfe\n").await?;
    let res = session.recv().await?;
    assert_eq!(res["id"], Value::Null);
    assert_eq!(res["error"]["code"], -32700);

    session.initialize().await?;

    session.send_raw(b"{not json\n").await?;
    assert_eq!(session.recv().await?["error"]["code"], -32700);

    session.send_raw(b"[1, 2]\n").await?;
    assert_eq!(session.recv().await?["error"]["code"], -32600);

    let res = session.request(json!({"jsonrpc": "2.0", "id": 9, "method": "mail/explode"})).await?;
    assert_eq!(res["id"], 9);
    assert_eq!(res["error"]["code"], -32601);

    let res = session.request(json!({"jsonrpc": "2.0", "id": 2, "method": "ping"})).await?;
    assert_eq!(res, json!({"jsonrpc": "2.0", "id": 2, "result": {}}));

    session.finish().await
}

#[tokio::test]
async fn requests_before_initialize_are_refused() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = Session::start(server_with_inline(dir.path(), "exit 0\n")?);

    let res = session.request(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})).await?;
    assert_eq!(res["error"]["code"], -32600);

    let init = session.initialize().await?;
    assert_eq!(init["result"]["serverInfo"]["name"], "Apple Mail MCP");
    session.finish().await
}

#[tokio::test]
async fn end_of_input_before_handshake_stops_cleanly() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let session = Session::start(server_with_inline(dir.path(), "exit 0\n")?);
    session.finish().await
}
