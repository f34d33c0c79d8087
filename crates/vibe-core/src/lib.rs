//! Protocol-level primitives for the vibe JSON-RPC bridge.
//!
//! Provides the per-connection line framer, the JSON-RPC 2.0 envelope
//! codec, and the static tool manifest shared by both bridge transports.

pub mod line_framer;
pub mod rpc_envelope;
pub mod tool_manifest;

pub use line_framer::LineFramer;
pub use rpc_envelope::{
    encode_response_line, parse_rpc_request, rpc_error_frame, rpc_result_frame, RpcDispatchError,
    RpcRequest, RPC_ERROR_INTERNAL, RPC_ERROR_METHOD_NOT_FOUND, RPC_ERROR_PARSE,
    RPC_JSONRPC_VERSION, RPC_PROTOCOL_VERSION,
};
pub use tool_manifest::{
    bridge_tool_manifest, tool_manifest_json, ToolDescriptor, ToolParameter, BRIDGE_TOOL_COUNT,
};
