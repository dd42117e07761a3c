// tests/transport_http.rs

#![cfg(feature = "transport_http")]

mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

use bayeux_transport::{
    //
    CarrierRegistry,
    Disposition,
    Endpoint,
    HttpConfig,
    Message,
    Transport,
    TransportBuilder,
    TransportError,
    TransportPtr,
    LONG_POLLING,
};

use common::{init_logging, next_event, MockSession, SessionEvent};

/// What the scripted server does with one request.
#[derive(Clone)]
enum Script {
    /// Answer 200 with this body.
    Respond(&'static str),
    /// Read the request, then close the connection without answering.
    HangUp,
}

/// A request as the server saw it.
#[derive(Debug)]
struct Seen {
    head: String,
    body: Vec<u8>,
    at: Instant,
}

impl Seen {
    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }
}

/// Start a one-connection-per-request HTTP server following `script`.
/// When the script runs out, the last step repeats.
async fn serve(script: Vec<Script>) -> (String, mpsc::UnboundedReceiver<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut step = 0;
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let action = script[step.min(script.len() - 1)].clone();
            step += 1;
            if let Some(seen) = handle(stream, action).await {
                let _ = tx.send(seen);
            }
        }
    });

    (format!("http://{addr}/bayeux"), rx)
}

async fn handle(mut stream: TcpStream, action: Script) -> Option<Seen> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let length: usize = head
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())?
        })
        .unwrap_or(0);

    while buf.len() < head_end + length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let seen = Seen {
        head,
        body: buf[head_end..].to_vec(),
        at: Instant::now(),
    };

    match action {
        Script::Respond(body) => {
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        Script::HangUp => drop(stream),
    }

    Some(seen)
}

fn open(url: &str, retry: Duration) -> (TransportPtr, mpsc::UnboundedReceiver<SessionEvent>) {
    let (session, events) = MockSession::builder(Endpoint::from(url))
        .timeout(retry)
        .build();

    let registry = CarrierRegistry::with_defaults(&HttpConfig::default()).expect("registry");
    let transport = TransportBuilder::new(&registry)
        .session(session)
        .build()
        .expect("failed to open long-polling transport");

    (transport, events)
}

async fn next_request(requests: &mut mpsc::UnboundedReceiver<Seen>) -> Seen {
    timeout(Duration::from_secs(2), requests.recv())
        .await
        .expect("timed out waiting for request")
        .expect("server stopped")
}

#[tokio::test]
async fn url_endpoint_selects_long_polling() {
    // ---
    init_logging();

    let (transport, _events) = open("http://localhost:8000/bayeux", Duration::from_millis(50));
    assert_eq!(transport.connection_type(), LONG_POLLING);
}

#[tokio::test]
async fn post_carries_json_and_headers_and_reply_is_received() {
    // ---
    init_logging();

    let (url, mut requests) = serve(vec![Script::Respond(
        r#"[{"id":"1","channel":"/meta/handshake","successful":true,"clientId":"abc"},
            {"channel":"/news","data":{"headline":"hi"}}]"#,
    )])
    .await;
    let (transport, mut events) = open(&url, Duration::from_millis(50));

    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorder = calls.clone();
    transport
        .send(
            Message::new("/meta/handshake").into(),
            Box::new(move |reply| {
                recorder.lock().unwrap().push(reply.clone());
                Disposition::Deliver
            }),
        )
        .await
        .expect("send failed");

    let seen = next_request(&mut requests).await;
    assert!(seen.head.starts_with("POST /bayeux HTTP/1.1"));
    assert_eq!(seen.header("content-type").as_deref(), Some("application/json"));
    let authority = url
        .trim_start_matches("http://")
        .trim_end_matches("/bayeux")
        .to_string();
    assert_eq!(seen.header("host"), Some(authority));
    assert_eq!(seen.header("content-length"), Some(seen.body.len().to_string()));
    assert_eq!(seen.json(), json!({"channel": "/meta/handshake", "id": "1"}));

    match next_event(&mut events).await {
        SessionEvent::Delivered(messages) => {
            assert_eq!(
                messages,
                vec![Message::new("/news").with_data(json!({"headline": "hi"}))]
            );
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].field("clientId"), Some(&json!("abc")));
    assert_eq!(transport.pending_count(), 0);
}

#[tokio::test]
async fn network_failure_is_retried_after_timeout_with_same_body() {
    // ---
    init_logging();

    let retry = Duration::from_millis(100);
    let (url, mut requests) = serve(vec![
        Script::HangUp,
        Script::Respond(r#"{"id":"1","successful":true}"#),
    ])
    .await;
    let (transport, _events) = open(&url, retry);

    let reply = timeout(
        Duration::from_secs(2),
        transport.send_and_wait(Message::new("/meta/connect")),
    )
    .await
    .expect("timed out waiting for reply")
    .expect("send failed");
    assert_eq!(reply.field("successful"), Some(&json!(true)));

    let first = next_request(&mut requests).await;
    let second = next_request(&mut requests).await;
    assert_eq!(first.body, second.body);
    assert!(
        second.at - first.at >= retry,
        "retried too early: {:?}",
        second.at - first.at
    );
}

#[tokio::test]
async fn malformed_body_is_reported_and_not_retried() {
    // ---
    init_logging();

    let (url, mut requests) = serve(vec![Script::Respond("<html>not json</html>")]).await;
    let (transport, mut events) = open(&url, Duration::from_millis(20));

    transport
        .send(
            Message::new("/meta/connect").into(),
            Box::new(|_| Disposition::Deliver),
        )
        .await
        .expect("send failed");

    match next_event(&mut events).await {
        SessionEvent::Error(TransportError::Parse(_)) => {}
        other => panic!("unexpected event: {other:?}"),
    }

    next_request(&mut requests).await;
    let again = timeout(Duration::from_millis(200), requests.recv()).await;
    assert!(again.is_err(), "malformed response must not be retried");
}

#[tokio::test]
async fn close_cancels_pending_retry() {
    // ---
    init_logging();

    let retry = Duration::from_millis(100);
    let (url, mut requests) = serve(vec![Script::HangUp]).await;
    let (transport, _events) = open(&url, retry);

    transport
        .send(
            Message::new("/meta/connect").into(),
            Box::new(|_| Disposition::Deliver),
        )
        .await
        .expect("send failed");

    next_request(&mut requests).await;
    transport.close();

    let again = timeout(retry * 5, requests.recv()).await;
    assert!(again.is_err(), "retry ran after close");
    assert_eq!(transport.pending_count(), 0);

    // A closed transport refuses new work
    let result = transport
        .send(
            Message::new("/meta/connect").into(),
            Box::new(|_| Disposition::Deliver),
        )
        .await;
    assert!(matches!(result, Err(TransportError::Closed)));
}

#[tokio::test]
#[should_panic(expected = "callback bug")]
async fn panicking_callback_resurfaces_on_next_send() {
    // ---
    init_logging();

    let (url, mut requests) = serve(vec![Script::Respond(
        r#"{"id":"1","channel":"/meta/connect","successful":true}"#,
    )])
    .await;
    let (transport, _events) = open(&url, Duration::from_millis(50));

    transport
        .send(
            Message::new("/meta/connect").into(),
            Box::new(|_| panic!("callback bug")),
        )
        .await
        .expect("send failed");

    // Reply received and the callback has run
    next_request(&mut requests).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let _ = transport
        .send(
            Message::new("/meta/connect").into(),
            Box::new(|_| Disposition::Deliver),
        )
        .await;
}
