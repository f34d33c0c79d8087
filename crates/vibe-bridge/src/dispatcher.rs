use serde_json::{json, Value};
use vibe_core::{
    parse_rpc_request, rpc_error_frame, rpc_result_frame, tool_manifest_json, RpcRequest,
    RPC_ERROR_INTERNAL, RPC_ERROR_METHOD_NOT_FOUND, RPC_PROTOCOL_VERSION,
};

use crate::bridge_state::BridgeState;

pub const BRIDGE_SERVER_NAME: &str = env!("CARGO_PKG_NAME");
pub const BRIDGE_SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The closed set of methods the bridge serves.
///
/// Unknown method names never enter this enum; they are rejected up front
/// with a method-not-found envelope naming the offending method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeMethod {
    Initialize,
    ToolsList,
    ResourcesList,
    PromptsList,
    Exec,
    Shutdown,
}

impl BridgeMethod {
    pub fn from_method_name(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "tools/list" => Some(Self::ToolsList),
            "resources/list" => Some(Self::ResourcesList),
            "prompts/list" => Some(Self::PromptsList),
            "exec" => Some(Self::Exec),
            "shutdown" => Some(Self::Shutdown),
            _ => None,
        }
    }
}

/// The response frame for one line, plus whether the caller asked the
/// transport to shut down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub frame: Value,
    pub shutdown_requested: bool,
}

impl DispatchOutcome {
    fn respond(frame: Value) -> Self {
        Self {
            frame,
            shutdown_requested: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.frame
            .as_object()
            .is_some_and(|frame| frame.contains_key("error"))
    }
}

/// Dispatches one framed line and always produces a response frame.
///
/// Every failure mode ends up inside the envelope; the transports treat the
/// outcome as infallible.
pub async fn dispatch_line(state: &BridgeState, raw_line: &str) -> DispatchOutcome {
    let request = match parse_rpc_request(raw_line) {
        Ok(request) => request,
        Err(error) => {
            tracing::warn!(code = error.code, message = %error.message, "rejected unparseable line");
            return DispatchOutcome::respond(Value::from(&error));
        }
    };

    let Some(method) = BridgeMethod::from_method_name(&request.method) else {
        return DispatchOutcome::respond(rpc_error_frame(
            &request.id,
            RPC_ERROR_METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
        ));
    };
    tracing::debug!(method = %request.method, "dispatching request");

    match method {
        BridgeMethod::Initialize => DispatchOutcome::respond(rpc_result_frame(
            &request.id,
            json!({
                "serverInfo": {
                    "name": BRIDGE_SERVER_NAME,
                    "version": BRIDGE_SERVER_VERSION,
                },
                "capabilities": {},
                "protocolVersion": RPC_PROTOCOL_VERSION,
            }),
        )),
        BridgeMethod::ToolsList => DispatchOutcome::respond(rpc_result_frame(
            &request.id,
            json!({ "tools": tool_manifest_json() }),
        )),
        BridgeMethod::ResourcesList => DispatchOutcome::respond(rpc_result_frame(
            &request.id,
            json!({ "resources": [] }),
        )),
        BridgeMethod::PromptsList => DispatchOutcome::respond(rpc_result_frame(
            &request.id,
            json!({ "prompts": [] }),
        )),
        BridgeMethod::Exec => DispatchOutcome::respond(dispatch_exec(state, &request).await),
        BridgeMethod::Shutdown => DispatchOutcome {
            frame: rpc_result_frame(&request.id, Value::Null),
            shutdown_requested: true,
        },
    }
}

/// Runs `exec`: readiness gate, then the backend execute call.
///
/// The backend's JSON body is serialized to text and wrapped as
/// `{stdout, stderr}` so callers always see the shape a terminal tool
/// would produce, whatever the backend returned.
async fn dispatch_exec(state: &BridgeState, request: &RpcRequest) -> Value {
    let command = request
        .params
        .get("command")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|command| !command.is_empty());
    let Some(command) = command else {
        return rpc_error_frame(
            &request.id,
            RPC_ERROR_INTERNAL,
            "exec requires a non-empty string 'command' parameter",
        );
    };

    if let Err(error) = state.ensure_backend_ready().await {
        return rpc_error_frame(
            &request.id,
            RPC_ERROR_INTERNAL,
            format!("Backend not available: {error}"),
        );
    }

    match state.execute_command(command).await {
        Ok(body) => rpc_result_frame(
            &request.id,
            json!({
                "stdout": body.to_string(),
                "stderr": "",
            }),
        ),
        Err(error) => rpc_error_frame(
            &request.id,
            RPC_ERROR_INTERNAL,
            format!("Command execution failed: {error}"),
        ),
    }
}
