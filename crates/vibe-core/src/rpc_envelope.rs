use serde_json::{json, Map, Value};

pub const RPC_JSONRPC_VERSION: &str = "2.0";
pub const RPC_PROTOCOL_VERSION: &str = "2024-11-05";
pub const RPC_ERROR_PARSE: i64 = -32700;
pub const RPC_ERROR_METHOD_NOT_FOUND: i64 = -32601;
pub const RPC_ERROR_INTERNAL: i64 = -32603;

/// Outbound lines are CRLF-terminated while the read side splits on bare
/// `\n`; the asymmetry is part of the wire contract and must be preserved.
pub const RPC_LINE_TERMINATOR: &str = "\r\n";

/// One parsed JSON-RPC request; immutable for the duration of a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    /// Opaque caller identifier echoed verbatim; an omitted id is
    /// normalized to JSON null.
    pub id: Value,
    pub method: String,
    pub params: Map<String, Value>,
}

/// A dispatch failure destined for an error envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcDispatchError {
    pub id: Value,
    pub code: i64,
    pub message: String,
}

impl RpcDispatchError {
    pub fn new(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            code,
            message: message.into(),
        }
    }
}

/// Parses one framed line into an [`RpcRequest`].
///
/// Any shape failure is a parse error with `id: null` — the id cannot be
/// trusted when the request itself is malformed.
pub fn parse_rpc_request(raw: &str) -> Result<RpcRequest, RpcDispatchError> {
    let value = serde_json::from_str::<Value>(raw).map_err(|error| {
        RpcDispatchError::new(
            Value::Null,
            RPC_ERROR_PARSE,
            format!("Parse error: {error}"),
        )
    })?;
    let Some(object) = value.as_object() else {
        return Err(RpcDispatchError::new(
            Value::Null,
            RPC_ERROR_PARSE,
            "Parse error: request must be a JSON object",
        ));
    };
    let protocol_tag = object
        .get("jsonrpc")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if protocol_tag != RPC_JSONRPC_VERSION {
        return Err(RpcDispatchError::new(
            Value::Null,
            RPC_ERROR_PARSE,
            format!("Parse error: jsonrpc must be '{RPC_JSONRPC_VERSION}'"),
        ));
    }
    let method = object
        .get("method")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            RpcDispatchError::new(
                Value::Null,
                RPC_ERROR_PARSE,
                "Parse error: request must include a non-empty method",
            )
        })?;
    let id = object.get("id").cloned().unwrap_or(Value::Null);
    let params = match object.get("params") {
        Some(Value::Object(params)) => params.clone(),
        _ => Map::new(),
    };
    Ok(RpcRequest {
        id,
        method: method.to_string(),
        params,
    })
}

/// Builds a success envelope; `result` may legitimately be JSON null.
pub fn rpc_result_frame(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": RPC_JSONRPC_VERSION,
        "id": id.clone(),
        "result": result,
    })
}

/// Builds an error envelope; the frame carries no `result` key.
pub fn rpc_error_frame(id: &Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": RPC_JSONRPC_VERSION,
        "id": id.clone(),
        "error": {
            "code": code,
            "message": message.into(),
        }
    })
}

impl From<&RpcDispatchError> for Value {
    fn from(error: &RpcDispatchError) -> Self {
        rpc_error_frame(&error.id, error.code, error.message.clone())
    }
}

/// Serializes one response frame plus the outbound line terminator.
pub fn encode_response_line(frame: &Value) -> String {
    let mut line = frame.to_string();
    line.push_str(RPC_LINE_TERMINATOR);
    line
}
