use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use vibe_bridge::{BridgeState, BridgeStateConfig, TcpTransport, TCP_BIND_ADDRESS};
use vibe_core::{BRIDGE_TOOL_COUNT, RPC_PROTOCOL_VERSION};

fn state_for(base_url: String) -> Arc<BridgeState> {
    let mut config = BridgeStateConfig::new(base_url);
    config.readiness_max_attempts = 2;
    config.readiness_retry_delay = Duration::from_millis(5);
    config.exec_timeout = Duration::from_secs(2);
    Arc::new(BridgeState::new(config))
}

fn mock_healthy_backend(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/api/status");
        then.status(200)
            .json_body(json!({"status":"ok","version":"1.0.0"}));
    });
}

async fn serve_tcp(state: Arc<BridgeState>) -> std::net::SocketAddr {
    let transport = TcpTransport::bind(TCP_BIND_ADDRESS)
        .await
        .expect("bind tcp transport");
    let address = transport.local_addr().expect("local addr");
    tokio::spawn(transport.run(state));
    address
}

async fn read_response_line(stream: &mut TcpStream) -> Value {
    let mut collected = Vec::new();
    let mut byte = [0_u8; 1];
    loop {
        let read = stream.read(&mut byte).await.expect("read response byte");
        assert!(read > 0, "connection closed before a full response line");
        if byte[0] == b'\n' {
            break;
        }
        collected.push(byte[0]);
    }
    let text = String::from_utf8(collected).expect("utf-8 response");
    serde_json::from_str(text.trim()).expect("response frame")
}

async fn request_line(stream: &mut TcpStream, line: &str) -> Value {
    stream
        .write_all(format!("{line}\n").as_bytes())
        .await
        .expect("write request");
    read_response_line(stream).await
}

#[tokio::test]
async fn integration_full_method_table_over_tcp_with_live_backend() {
    let server = MockServer::start();
    mock_healthy_backend(&server);
    let execute_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/mcp/execute")
            .json_body(json!({"command":"create project demo"}));
        then.status(200)
            .json_body(json!({"action":"create-project","project":"demo"}));
    });

    let address = serve_tcp(state_for(server.base_url())).await;
    let mut stream = TcpStream::connect(address).await.expect("connect");

    let init = request_line(
        &mut stream,
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
    )
    .await;
    assert_eq!(init["result"]["protocolVersion"], RPC_PROTOCOL_VERSION);
    assert!(init["result"]["serverInfo"]["name"].is_string());

    let tools = request_line(
        &mut stream,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
    )
    .await;
    assert_eq!(
        tools["result"]["tools"].as_array().expect("tools").len(),
        BRIDGE_TOOL_COUNT
    );

    let resources = request_line(
        &mut stream,
        r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#,
    )
    .await;
    assert_eq!(resources["result"]["resources"], json!([]));

    let prompts = request_line(
        &mut stream,
        r#"{"jsonrpc":"2.0","id":4,"method":"prompts/list"}"#,
    )
    .await;
    assert_eq!(prompts["result"]["prompts"], json!([]));

    let exec = request_line(
        &mut stream,
        r#"{"jsonrpc":"2.0","id":5,"method":"exec","params":{"command":"create project demo"}}"#,
    )
    .await;
    let stdout = exec["result"]["stdout"].as_str().expect("stdout text");
    let body = serde_json::from_str::<Value>(stdout).expect("stdout holds JSON text");
    assert_eq!(body["action"], "create-project");
    assert_eq!(exec["result"]["stderr"], "");
    execute_mock.assert();

    let unknown = request_line(
        &mut stream,
        r#"{"jsonrpc":"2.0","id":6,"method":"resources/read"}"#,
    )
    .await;
    assert_eq!(unknown["error"]["code"], -32601);
    assert_eq!(unknown["error"]["message"], "Method not found: resources/read");

    // Shutdown over TCP is acknowledged and the connection keeps serving.
    let ack = request_line(&mut stream, r#"{"jsonrpc":"2.0","id":7,"method":"shutdown"}"#).await;
    assert_eq!(ack["result"], Value::Null);
    let again = request_line(
        &mut stream,
        r#"{"jsonrpc":"2.0","id":8,"method":"initialize"}"#,
    )
    .await;
    assert_eq!(again["id"], 8);
}

#[tokio::test]
async fn integration_concurrent_clients_share_one_readiness_probe_run() {
    let server = MockServer::start();
    let status_mock = server.mock(|when, then| {
        when.method(GET).path("/api/status");
        then.status(200).json_body(json!({"status":"ok"}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/mcp/execute");
        then.status(200).json_body(json!({"ok":true}));
    });

    let address = serve_tcp(state_for(server.base_url())).await;
    let mut first = TcpStream::connect(address).await.expect("connect first");
    let mut second = TcpStream::connect(address).await.expect("connect second");

    let exec_request =
        r#"{"jsonrpc":"2.0","id":"x","method":"exec","params":{"command":"list projects"}}"#;
    let (frame_one, frame_two) = tokio::join!(
        request_line(&mut first, exec_request),
        request_line(&mut second, exec_request),
    );
    assert!(frame_one["result"]["stdout"].is_string());
    assert!(frame_two["result"]["stdout"].is_string());

    // Readiness is probed once and shared; the second caller saw the
    // sticky Ready state instead of issuing its own probe run.
    status_mock.assert_calls(1);
}

#[tokio::test]
async fn regression_requests_split_across_tcp_writes_are_reassembled() {
    let server = MockServer::start();
    let address = serve_tcp(state_for(server.base_url())).await;
    let mut stream = TcpStream::connect(address).await.expect("connect");

    stream
        .write_all(br#"{"jsonrpc":"2.0","id":1,"method":"tools/li"#)
        .await
        .expect("write first fragment");
    tokio::time::sleep(Duration::from_millis(20)).await;
    stream
        .write_all(b"st\"}\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"prompts/list\"}\n")
        .await
        .expect("write second fragment");

    let first = read_response_line(&mut stream).await;
    let second = read_response_line(&mut stream).await;
    assert_eq!(first["id"], 1);
    assert_eq!(
        first["result"]["tools"].as_array().expect("tools").len(),
        BRIDGE_TOOL_COUNT
    );
    assert_eq!(second["id"], 2);
    assert_eq!(second["result"]["prompts"], json!([]));
}

#[cfg(unix)]
mod unix {
    use std::time::Instant;

    use tempfile::tempdir;
    use tokio::io::duplex;
    use vibe_backend::{BackendSupervisor, SupervisorConfig};
    use vibe_bridge::{serve_line_stream, ShutdownPolicy};

    use super::*;

    async fn wait_until<F>(timeout: Duration, predicate: F)
    where
        F: Fn() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if predicate() {
                return;
            }
            assert!(Instant::now() < deadline, "timed out waiting for condition");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    fn process_is_running(pid: u32) -> bool {
        std::process::Command::new("/bin/sh")
            .args(["-c", &format!("kill -0 {pid} >/dev/null 2>&1")])
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn integration_shutdown_response_is_flushed_before_the_backend_dies() {
        let temp = tempdir().expect("tempdir");
        let pid_path = temp.path().join("backend.pid");
        let script = format!(
            "echo $$ > {}; while true; do sleep 1; done",
            pid_path.display()
        );
        let supervisor = BackendSupervisor::launch(SupervisorConfig::new(
            "/bin/sh",
            vec!["-c".to_string(), script],
        ))
        .await
        .expect("launch backend");
        wait_until(Duration::from_secs(2), || pid_path.exists()).await;
        let pid: u32 = std::fs::read_to_string(&pid_path)
            .expect("read pid file")
            .trim()
            .parse()
            .expect("parse pid");

        let (client, transport) = duplex(64 * 1024);
        let (transport_read, transport_write) = tokio::io::split(transport);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        let state = state_for("http://127.0.0.1:9".to_string());
        let serve = tokio::spawn(serve_line_stream(
            transport_read,
            transport_write,
            state,
            ShutdownPolicy::EndStream,
        ));

        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":\"bye\",\"method\":\"shutdown\"}\n")
            .await
            .expect("write shutdown request");

        let mut raw = Vec::new();
        client_read
            .read_to_end(&mut raw)
            .await
            .expect("read shutdown response");
        let frame = serde_json::from_str::<Value>(
            String::from_utf8(raw).expect("utf-8 response").trim(),
        )
        .expect("shutdown frame");
        assert_eq!(frame["id"], "bye");
        assert_eq!(frame["result"], Value::Null);

        // The response has been flushed and the serve loop has ended, yet
        // the backend is still alive; the kill happens strictly after.
        let report = serve.await.expect("serve task").expect("serve report");
        assert!(report.shutdown_requested);
        assert!(process_is_running(pid));

        supervisor.shutdown().await;
        wait_until(Duration::from_secs(2), || !process_is_running(pid)).await;
    }
}
