//! End-to-end `respond` behavior against a canned one-shot HTTP fixture.

use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tunedchat::{ChatAdapter, ConfigStore, InferenceConfig, Message, Role};

const CONFIG_UNAVAILABLE: &str =
    "AI configuration is not available at the moment. Please contact an administrator.";

async fn store_with_active_config(dir: &tempfile::TempDir) -> anyhow::Result<ConfigStore> {
    let url = format!("sqlite://{}", dir.path().join("chat.db").display());
    let store = ConfigStore::connect(&url).await?;

    let config = InferenceConfig {
        name: "test-model".to_string(),
        is_active: true,
        ..Default::default()
    };
    store.insert_config(&config).await?;

    Ok(store)
}

fn http_response(status_line: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serves exactly one request: reads it fully, writes `response`, closes.
/// When `delay` is set, the reply is held back that long first.
async fn one_shot_server(response: String, delay: Option<Duration>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        read_request(&mut socket).await;

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}")
}

/// Reads headers plus a `Content-Length` body so the client never sees a
/// reset mid-request.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.expect("read");
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.expect("read body");
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[tokio::test]
async fn json_reply_is_extracted_and_trimmed() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_with_active_config(&dir).await?;

    let body = r#"{"choices":[{"message":{"content":"  Hello there.  "}}]}"#;
    let endpoint = one_shot_server(http_response("200 OK", "application/json", body), None).await;

    let adapter = ChatAdapter::new(Some(endpoint), store);
    let history = [Message::new(Role::Assistant, "Hello! How can I help you today?")];

    assert_eq!(adapter.respond(&history, "hi").await, "Hello there.");

    Ok(())
}

#[tokio::test]
async fn event_stream_reply_takes_the_last_chunk() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_with_active_config(&dir).await?;

    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"A\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"B\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let endpoint =
        one_shot_server(http_response("200 OK", "text/event-stream", body), None).await;

    let adapter = ChatAdapter::new(Some(endpoint), store);

    assert_eq!(adapter.respond(&[], "hi").await, "B");

    Ok(())
}

#[tokio::test]
async fn upstream_failure_reports_status_and_body() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_with_active_config(&dir).await?;

    let endpoint = one_shot_server(
        http_response("500 Internal Server Error", "text/plain", "server error"),
        None,
    )
    .await;

    let adapter = ChatAdapter::new(Some(endpoint), store);
    let reply = adapter.respond(&[], "hi").await;

    assert!(reply.contains("500"), "missing status in: {reply}");
    assert!(reply.contains("server error"), "missing body in: {reply}");

    Ok(())
}

#[tokio::test]
async fn malformed_json_reply_reports_an_unexpected_format() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_with_active_config(&dir).await?;

    let endpoint = one_shot_server(
        http_response("200 OK", "application/json", r#"{"unexpected":true}"#),
        None,
    )
    .await;

    let adapter = ChatAdapter::new(Some(endpoint), store);
    let reply = adapter.respond(&[], "hi").await;

    assert!(reply.contains("unexpected response format"), "got: {reply}");

    Ok(())
}

#[tokio::test]
async fn slow_reply_reports_a_timeout_within_the_bound() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_with_active_config(&dir).await?;

    let endpoint = one_shot_server(
        http_response("200 OK", "application/json", "{}"),
        Some(Duration::from_secs(10)),
    )
    .await;

    let adapter =
        ChatAdapter::new(Some(endpoint), store).with_timeout(Duration::from_millis(500));

    let start = Instant::now();
    let reply = adapter.respond(&[], "hi").await;
    let elapsed = start.elapsed();

    assert!(reply.contains("timed out"), "got: {reply}");
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");

    Ok(())
}

#[tokio::test]
async fn missing_active_config_short_circuits_before_the_network() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}", dir.path().join("empty.db").display());
    let store = ConfigStore::connect(&url).await?;

    // Nothing listens here; reaching the network would surface a transport
    // error instead of the fixed message.
    let adapter = ChatAdapter::new(Some("http://127.0.0.1:9".to_string()), store);

    assert_eq!(adapter.respond(&[], "hi").await, CONFIG_UNAVAILABLE);

    Ok(())
}

#[tokio::test]
async fn missing_endpoint_reports_a_configuration_error() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_with_active_config(&dir).await?;

    let adapter = ChatAdapter::new(None, store);
    let reply = adapter.respond(&[], "hi").await;

    assert!(reply.contains("CHAT_API_URL"), "got: {reply}");

    Ok(())
}

#[tokio::test]
async fn connection_refused_is_a_transport_error_not_a_timeout() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_with_active_config(&dir).await?;

    let adapter = ChatAdapter::new(Some("http://127.0.0.1:9".to_string()), store);
    let reply = adapter.respond(&[], "hi").await;

    assert!(
        reply.contains("Error communicating with the AI service"),
        "got: {reply}"
    );
    assert!(!reply.contains("timed out"), "got: {reply}");

    Ok(())
}
