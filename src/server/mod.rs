//! MCP tool server over stdio, built on `rmcp`.
//!
//! Tools are not declared with `#[tool]` macros; [`MailServer`] answers
//! `tools/list` and `tools/call` straight from the operation registry.
//! Incoming lines pass through a gate first, so that a line `rmcp` cannot
//! decode is answered with a JSON-RPC error instead of ending the session.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer, ServiceExt};
use rmcp::ErrorData as McpError;
use serde_json::{json, Value};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream,
};
use tokio::sync::mpsc;

use crate::{bridge::Bridge, operations::Registry};

pub const SERVER_NAME: &str = "Apple Mail MCP";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Buffer size of the in-memory pipes between the gate and `rmcp`.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Requests and notifications a client may send to this server.
const CLIENT_REQUESTS: &[&str] = &[
    "initialize",
    "ping",
    "tools/list",
    "tools/call",
    "resources/list",
    "resources/templates/list",
    "resources/read",
    "resources/subscribe",
    "resources/unsubscribe",
    "prompts/list",
    "prompts/get",
    "completion/complete",
    "logging/setLevel",
];
const CLIENT_NOTIFICATIONS: &[&str] = &[
    "notifications/initialized",
    "notifications/cancelled",
    "notifications/progress",
    "notifications/roots/list_changed",
];

#[derive(Clone)]
pub struct MailServer {
    registry: Arc<Registry>,
    bridge: Arc<Bridge>,
}

impl MailServer {
    pub fn new(registry: Registry, bridge: Bridge) -> Self {
        Self { registry: Arc::new(registry), bridge: Arc::new(bridge) }
    }

    /// One tool per registered operation, descriptions carrying preferences.
    pub fn tools(&self) -> Vec<Tool> {
        self.registry
            .schemas()
            .into_iter()
            .map(|schema| {
                let input: JsonObject = match schema.input_schema {
                    Value::Object(map) => map,
                    _ => JsonObject::new(),
                };
                Tool::new(schema.name, schema.description, Arc::new(input))
            })
            .collect()
    }

    /// Run one operation. Failures become error results, not protocol errors.
    pub async fn call(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        let args = Value::Object(arguments.unwrap_or_default());
        match self.registry.call(&self.bridge, name, args).await {
            Ok(output) => CallToolResult::success(vec![Content::text(output.render())]),
            Err(e) => {
                tracing::warn!(operation = name, "operation failed: {}", e);
                CallToolResult::error(vec![Content::text(format!("Error: {e}"))])
            }
        }
    }

    pub fn operation_count(&self) -> usize {
        self.registry.len()
    }
}

impl rmcp::ServerHandler for MailServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(
                "Apple Mail operations: read, search, organize, compose and export mail \
                 through Mail.app. Call tools/list for the catalog."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.call(&request.name, request.arguments).await)
    }
}

/// What the gate does with one input line.
#[derive(Debug, Clone, PartialEq)]
enum Verdict {
    Forward,
    Reply(Value),
    Drop,
}

fn error_reply(id: Value, code: i64, message: impl Into<String>) -> Verdict {
    Verdict::Reply(json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() },
    }))
}

/// Decide whether a raw line may reach `rmcp`.
fn screen(line: &[u8], initialized: bool) -> Verdict {
    let text = match std::str::from_utf8(line) {
        Ok(t) => t.trim(),
        Err(e) => return error_reply(Value::Null, PARSE_ERROR, format!("invalid UTF-8: {e}")),
    };
    if text.is_empty() {
        return Verdict::Drop;
    }
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return error_reply(Value::Null, PARSE_ERROR, e.to_string()),
    };
    let Value::Object(msg) = &value else {
        return error_reply(Value::Null, INVALID_REQUEST, "message must be a JSON object");
    };
    let id = msg.get("id").cloned();
    let method = match msg.get("method") {
        Some(Value::String(m)) => m.as_str(),
        Some(_) => {
            return error_reply(id.unwrap_or(Value::Null), INVALID_REQUEST, "method must be a string")
        }
        // Responses to our own requests.
        None if id.is_some() && (msg.contains_key("result") || msg.contains_key("error")) => {
            return if initialized { Verdict::Forward } else { Verdict::Drop };
        }
        None => return error_reply(id.unwrap_or(Value::Null), INVALID_REQUEST, "missing method"),
    };

    let Some(id) = id else {
        return if initialized && CLIENT_NOTIFICATIONS.contains(&method) {
            Verdict::Forward
        } else {
            tracing::debug!(method, "dropping unknown notification");
            Verdict::Drop
        };
    };
    if !CLIENT_REQUESTS.contains(&method) {
        return error_reply(id, METHOD_NOT_FOUND, format!("method not found: {method}"));
    }
    if !initialized && method != "initialize" {
        return error_reply(id, INVALID_REQUEST, "server not initialized");
    }
    if method == "tools/call" && !msg.get("params").is_some_and(|p| p["name"].is_string()) {
        return error_reply(id, INVALID_PARAMS, "tools/call needs a string 'name'");
    }
    Verdict::Forward
}

/// Read raw lines, answer the bad ones, pass the rest on to `rmcp`.
async fn gate<R>(
    mut reader: R,
    mut to_rmcp: DuplexStream,
    replies: mpsc::Sender<Vec<u8>>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut initialized = false;
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await.context("reading request")? == 0 {
            break;
        }
        match screen(&line, initialized) {
            Verdict::Forward => {
                // Only `initialize` passes the gate before the handshake.
                initialized = true;
                if !line.ends_with(b"\n") {
                    line.push(b'\n');
                }
                to_rmcp.write_all(&line).await.context("forwarding request")?;
            }
            Verdict::Reply(reply) => {
                tracing::debug!(%reply, "rejected input line");
                let mut out = serde_json::to_vec(&reply)?;
                out.push(b'\n');
                if replies.send(out).await.is_err() {
                    break;
                }
            }
            Verdict::Drop => {}
        }
    }
    to_rmcp.shutdown().await.ok();
    Ok(())
}

/// Copy `rmcp`'s output, line by line, into the shared writer queue.
async fn relay(from_rmcp: DuplexStream, out: mpsc::Sender<Vec<u8>>) -> Result<()> {
    let mut reader = BufReader::new(from_rmcp);
    loop {
        let mut line = Vec::new();
        if reader.read_until(b'\n', &mut line).await.context("reading server output")? == 0 {
            return Ok(());
        }
        if out.send(line).await.is_err() {
            return Ok(());
        }
    }
}

async fn write_lines<W>(mut rx: mpsc::Receiver<Vec<u8>>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(&line).await.context("writing response")?;
        writer.flush().await.context("writing response")?;
    }
    Ok(())
}

/// Serve MCP until the reader reaches end of input.
pub async fn serve<R, W>(server: MailServer, reader: R, writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (to_rmcp, rmcp_in) = tokio::io::duplex(PIPE_CAPACITY);
    let (rmcp_out, from_rmcp) = tokio::io::duplex(PIPE_CAPACITY);
    let (tx, rx) = mpsc::channel(32);

    let writer_task = tokio::spawn(write_lines(rx, writer));
    let relay_task = tokio::spawn(relay(from_rmcp, tx.clone()));
    let gate_task = tokio::spawn(gate(reader, to_rmcp, tx));

    let session = match server.serve((rmcp_in, rmcp_out)).await {
        Ok(service) => service
            .waiting()
            .await
            .map(|reason| tracing::info!(?reason, "session ended"))
            .context("server task panicked"),
        Err(e) => {
            // Typically input closed before the handshake finished.
            tracing::warn!("session not established: {}", e);
            Ok(())
        }
    };

    gate_task.abort();
    match gate_task.await {
        Ok(result) => result?,
        Err(e) if e.is_cancelled() => {}
        Err(e) => return Err(e).context("input task panicked"),
    }
    relay_task.await.context("output task panicked")??;
    writer_task.await.context("writer task panicked")??;
    session
}

pub async fn serve_stdio(server: MailServer) -> Result<()> {
    tracing::info!(operations = server.operation_count(), "serving on stdio");
    serve(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::RawContent;
    use rmcp::ServerHandler;

    fn server() -> MailServer {
        MailServer::new(
            Registry::with_catalog(Some("Prefer Work".to_string())),
            Bridge::from_config(&crate::config::Config::from_pairs(Vec::<(String, String)>::new())),
        )
    }

    #[test]
    fn info_advertises_tools() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert_eq!(info.protocol_version, ProtocolVersion::V_2024_11_05);
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn tools_mirror_the_registry() {
        let tools = server().tools();
        assert_eq!(tools.len(), 20);
        let compose = tools.iter().find(|t| t.name == "compose_email").unwrap();
        assert!(compose.description.as_deref().unwrap_or("").ends_with("User Preferences: Prefer Work"));
        assert_eq!(compose.input_schema["type"], "object");
    }

    #[tokio::test]
    async fn unknown_operation_is_an_error_result() {
        let result = server().call("delete_everything", None).await;
        assert_eq!(result.is_error, Some(true));
        let RawContent::Text(text) = &result.content[0].raw else {
            panic!("expected text content");
        };
        assert_eq!(text.text, "Error: unknown operation: delete_everything");
    }

    #[test]
    fn gate_screens_lines() {
        assert!(matches!(screen(b"\xff\xfe\n", false), Verdict::Reply(r) if r["error"]["code"] == PARSE_ERROR));
        assert!(matches!(screen(b"{oops\n", true), Verdict::Reply(r) if r["error"]["code"] == PARSE_ERROR));
        assert!(matches!(screen(b"[1,2]\n", true), Verdict::Reply(r) if r["error"]["code"] == INVALID_REQUEST));
        assert_eq!(screen(b"   \n", true), Verdict::Drop);

        let ping = br#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#;
        assert!(matches!(screen(ping, false), Verdict::Reply(r) if r["id"] == 4));
        assert_eq!(screen(ping, true), Verdict::Forward);

        let unknown = br#"{"jsonrpc":"2.0","id":5,"method":"mail/explode"}"#;
        assert!(matches!(screen(unknown, true), Verdict::Reply(r) if r["error"]["code"] == METHOD_NOT_FOUND));
        assert_eq!(screen(br#"{"jsonrpc":"2.0","method":"custom/hello"}"#, true), Verdict::Drop);

        let nameless = br#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{}}"#;
        assert!(matches!(screen(nameless, true), Verdict::Reply(r) if r["error"]["code"] == INVALID_PARAMS));
    }
}
