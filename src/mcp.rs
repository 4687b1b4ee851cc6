//! MCP (Model Context Protocol) server over newline-delimited JSON-RPC 2.0.
//!
//! One request per line on the reader, one response per line on the
//! writer. Requests without an `id` are notifications and get no reply.
//! Logging must go to stderr: stdout carries the protocol.
//!
//! Tool failures that are part of normal operation (missing file,
//! unsupported format, …) are returned as a successful JSON-RPC response
//! whose result has `isError: true`. Only protocol misuse (unknown method,
//! unknown tool, malformed arguments) produces a JSON-RPC error object.

use crate::service::DocumentService;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "edgequake-docconv";

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC request (or notification when `id` is absent).
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct McpResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
}

impl McpResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Serve requests from `reader` until EOF.
pub async fn serve<R, W>(service: &DocumentService, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("{} MCP server ready", SERVER_NAME);
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<McpRequest>(line) {
            Ok(request) => handle_request(service, request).await,
            Err(e) => {
                error!("Invalid JSON-RPC message: {}", e);
                Some(McpResponse::err(Value::Null, PARSE_ERROR, format!("Parse error: {e}")))
            }
        };

        if let Some(response) = response {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }

    info!("{} MCP server shutting down", SERVER_NAME);
    Ok(())
}

/// Handle one message. Returns `None` for notifications.
pub async fn handle_request(service: &DocumentService, request: McpRequest) -> Option<McpResponse> {
    debug!("Received request: method={}", request.method);

    let Some(id) = request.id else {
        debug!("Notification {} acknowledged", request.method);
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => McpResponse::ok(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {}
                }
            }),
        ),

        "ping" => McpResponse::ok(id, json!({})),

        "tools/list" => McpResponse::ok(id, json!({ "tools": list_tools() })),

        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            let name = params.get("name").and_then(Value::as_str).unwrap_or("");
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));

            match call_tool(service, name, arguments).await {
                Ok(result) => McpResponse::ok(id, result),
                Err(message) => {
                    warn!("Tool call rejected: {}", message);
                    McpResponse::err(id, INVALID_PARAMS, message)
                }
            }
        }

        other => {
            warn!("Unknown method: {}", other);
            McpResponse::err(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
        }
    };
    Some(response)
}

/// Tool definitions with their input schemas.
pub fn list_tools() -> Vec<Value> {
    vec![
        json!({
            "name": "convert_document",
            "description": "Convert a document to another format (pdf, docx, markdown, html, txt)",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "input_path": { "type": "string", "description": "Path to the input file" },
                    "target_format": {
                        "type": "string",
                        "enum": ["pdf", "docx", "markdown", "html", "txt"]
                    },
                    "output_path": {
                        "type": "string",
                        "description": "Output file; defaults to <input stem>.<ext> next to the input"
                    }
                },
                "required": ["input_path", "target_format"]
            }
        }),
        json!({
            "name": "list_supported_formats",
            "description": "List input/output formats, extensions, engines and available conversion routes",
            "inputSchema": { "type": "object", "properties": {} }
        }),
        json!({
            "name": "get_file_info",
            "description": "Report size, format and timestamps of a file",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "path": { "type": "string" }
                },
                "required": ["path"]
            }
        }),
        json!({
            "name": "batch_convert",
            "description": "Convert every matching file in a directory (non-recursive)",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "input_dir": { "type": "string" },
                    "target_format": {
                        "type": "string",
                        "enum": ["pdf", "docx", "markdown", "html", "txt"]
                    },
                    "output_dir": {
                        "type": "string",
                        "description": "Defaults to <input_dir>/converted_<format>"
                    },
                    "pattern": { "type": "string", "default": "*" }
                },
                "required": ["input_dir", "target_format"]
            }
        }),
        json!({
            "name": "health_check",
            "description": "Engine availability, configuration and version",
            "inputSchema": { "type": "object", "properties": {} }
        }),
    ]
}

#[derive(Debug, Deserialize)]
struct ConvertArgs {
    #[serde(alias = "input_file")]
    input_path: PathBuf,
    #[serde(alias = "output_format")]
    target_format: String,
    #[serde(default, alias = "output_file")]
    output_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct FileInfoArgs {
    #[serde(alias = "file_path")]
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct BatchArgs {
    #[serde(alias = "input_directory")]
    input_dir: PathBuf,
    #[serde(alias = "output_format")]
    target_format: String,
    #[serde(default, alias = "output_directory")]
    output_dir: Option<PathBuf>,
    #[serde(default, alias = "file_pattern")]
    pattern: Option<String>,
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments for {tool}: {e}"))
}

/// Tool result envelope: pretty JSON text plus the error flag.
fn tool_result<T: Serialize>(payload: &T, is_error: bool) -> Value {
    let text = serde_json::to_string_pretty(payload).unwrap_or_else(|e| {
        json!({ "message": format!("failed to serialise result: {e}") }).to_string()
    });
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error
    })
}

fn error_payload(e: &crate::error::ConvertError) -> Value {
    json!({
        "status": "failed",
        "error_kind": e.kind(),
        "message": e.to_string()
    })
}

/// Dispatch a `tools/call`. `Err` means the call itself was malformed.
pub async fn call_tool(service: &DocumentService, name: &str, args: Value) -> Result<Value, String> {
    let start = Instant::now();
    info!("Calling tool: {}", name);

    let result = match name {
        "convert_document" => {
            let a: ConvertArgs = parse_args(name, args)?;
            let r = service
                .convert_document(&a.input_path, &a.target_format, a.output_path.as_deref())
                .await;
            tool_result(&r, !r.is_success())
        }
        "list_supported_formats" => tool_result(&service.list_supported_formats(), false),
        "get_file_info" => {
            let a: FileInfoArgs = parse_args(name, args)?;
            match service.get_file_info(&a.path).await {
                Ok(info) => tool_result(&info, false),
                Err(e) => tool_result(&error_payload(&e), true),
            }
        }
        "batch_convert" => {
            let a: BatchArgs = parse_args(name, args)?;
            match service
                .batch_convert(
                    &a.input_dir,
                    a.output_dir.as_deref(),
                    &a.target_format,
                    a.pattern.as_deref(),
                    None,
                )
                .await
            {
                Ok(r) => tool_result(&r, false),
                Err(e) => tool_result(&error_payload(&e), true),
            }
        }
        "health_check" => tool_result(&service.health_check(), false),
        other => return Err(format!("Unknown tool: {other}")),
    };

    info!("Tool {} finished in {}ms", name, start.elapsed().as_millis());
    Ok(result)
}
