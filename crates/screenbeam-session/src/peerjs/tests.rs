use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use screenbeam_common::{PeerId, SignalingErrorKind};
use screenbeam_config::schema::SignalingConfig;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::*;
use crate::input::{InputReceiver, SessionInput, SignalSink};
use crate::signaling::{SignalEvent, Signaling};

fn parse(json: &str) -> ServerMessage {
    serde_json::from_str(json).unwrap()
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[test]
fn default_url_targets_public_server() {
    let url = ws_url(
        &SignalingConfig::default(),
        &PeerId::from("screen-abc123xyz"),
        "tok123",
    )
    .unwrap();
    assert_eq!(
        url.as_str(),
        "wss://0.peerjs.com/peerjs?key=peerjs&id=screen-abc123xyz&token=tok123"
    );
}

#[test]
fn custom_url_keeps_port_and_path() {
    let config = SignalingConfig {
        host: "localhost".into(),
        port: 9000,
        path: "myapp".into(),
        secure: false,
        key: "k".into(),
        ..SignalingConfig::default()
    };
    let url = ws_url(&config, &PeerId::from("v 1"), "t").unwrap();
    assert_eq!(
        url.as_str(),
        "ws://localhost:9000/myapp/peerjs?key=k&id=v+1&token=t"
    );
}

#[test]
fn server_messages_parse() {
    assert_eq!(parse(r#"{"type":"OPEN"}"#).kind, MessageType::Open);
    assert_eq!(parse(r#"{"type":"ID-TAKEN"}"#).kind, MessageType::IdTaken);
    assert_eq!(parse(r#"{"type":"INVALID-KEY"}"#).kind, MessageType::InvalidKey);
    assert_eq!(
        parse(r#"{"type":"CANDIDATE","src":"a","dst":"b","payload":{}}"#).kind,
        MessageType::Candidate
    );
    assert_eq!(parse(r#"{"type":"BRAND-NEW"}"#).kind, MessageType::Unknown);

    let msg = parse(r#"{"type":"ERROR","payload":{"msg":"Invalid key"}}"#);
    assert_eq!(msg.message(), Some("Invalid key"));
}

#[test]
fn heartbeat_serializes() {
    let json = serde_json::to_string(&ClientMessage::heartbeat()).unwrap();
    assert_eq!(json, r#"{"type":"HEARTBEAT"}"#);
}

#[test]
fn messages_map_to_registration_events() {
    let id = PeerId::from("screen-a");

    assert!(matches!(
        event_for(&parse(r#"{"type":"OPEN"}"#), &id, "peerjs"),
        Some(SignalEvent::Open { id: opened }) if opened == id
    ));
    assert!(matches!(
        event_for(&parse(r#"{"type":"ID-TAKEN"}"#), &id, "peerjs"),
        Some(SignalEvent::Error { kind: SignalingErrorKind::UnavailableId, message })
            if message == "ID \"screen-a\" is taken"
    ));
    assert!(matches!(
        event_for(&parse(r#"{"type":"INVALID-KEY"}"#), &id, "nope"),
        Some(SignalEvent::Error { kind: SignalingErrorKind::InvalidKey, message })
            if message == "API KEY \"nope\" is invalid"
    ));
    assert!(matches!(
        event_for(&parse(r#"{"type":"ERROR","payload":{"msg":"boom"}}"#), &id, "peerjs"),
        Some(SignalEvent::Error { kind: SignalingErrorKind::ServerError, message })
            if message == "boom"
    ));
    assert!(matches!(
        event_for(&parse(r#"{"type":"EXPIRE","src":"screen-z"}"#), &id, "peerjs"),
        Some(SignalEvent::Error { kind: SignalingErrorKind::PeerUnavailable, message })
            if message == "Could not connect to peer screen-z"
    ));
    for quiet in ["OFFER", "ANSWER", "CANDIDATE", "LEAVE", "HEARTBEAT", "WHATEVER"] {
        let msg = parse(&format!(r#"{{"type":"{quiet}"}}"#));
        assert!(event_for(&msg, &id, "peerjs").is_none(), "{quiet}");
    }
}

// ---------------------------------------------------------------------------
// Link without a server
// ---------------------------------------------------------------------------

#[test]
fn unregistered_link_refuses_reconnect() {
    let mut link = PeerServerLink::new(SignalingConfig::default());
    assert!(!link.is_registered());
    assert!(link.reconnect().is_err());
    link.destroy();
}

#[test]
fn peer_operations_need_media_engine() {
    let mut link = PeerServerLink::new(SignalingConfig::default());
    let err = link.connect(&PeerId::from("screen-a")).unwrap_err();
    assert!(matches!(
        err,
        screenbeam_common::SessionError::Signaling { kind: SignalingErrorKind::Webrtc, .. }
    ));
}

#[test]
fn register_outside_runtime_is_an_error() {
    let mut link = PeerServerLink::new(SignalingConfig::default());
    let (sink, _rx) = SignalSink::detached();
    assert!(link.register(None, sink).is_err());
    assert!(link.id().is_none());
}

// ---------------------------------------------------------------------------
// Link against a local server
// ---------------------------------------------------------------------------

async fn local_server() -> (TcpListener, SignalingConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = SignalingConfig {
        host: "127.0.0.1".into(),
        port: u32::from(port),
        secure: false,
        heartbeat_interval_ms: 50,
        connect_timeout_secs: 5,
        ..SignalingConfig::default()
    };
    (listener, config)
}

async fn next_event(rx: &mut InputReceiver) -> SignalEvent {
    let stamped = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for signal")
        .expect("sink closed");
    match stamped.input {
        SessionInput::Signal(event) => event,
        other => panic!("unexpected input: {other:?}"),
    }
}

#[tokio::test]
async fn open_then_heartbeat_then_destroy() {
    let (listener, config) = local_server().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(WsMessage::Text(r#"{"type":"OPEN"}"#.into()))
            .await
            .unwrap();

        let mut saw_heartbeat = false;
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                WsMessage::Text(text) if text.as_str().contains("HEARTBEAT") => {
                    saw_heartbeat = true;
                }
                WsMessage::Close(_) => break,
                _ => {}
            }
        }
        saw_heartbeat
    });

    let mut link = PeerServerLink::new(config);
    let (sink, mut rx) = SignalSink::detached();
    link.register(Some(PeerId::from("screen-test")), sink).unwrap();

    assert!(matches!(
        next_event(&mut rx).await,
        SignalEvent::Open { id } if id.as_str() == "screen-test"
    ));
    assert!(link.is_registered());

    tokio::time::sleep(Duration::from_millis(200)).await;
    link.destroy();
    let saw_heartbeat = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(saw_heartbeat);
}

#[tokio::test]
async fn taken_id_ends_registration() {
    let (listener, config) = local_server().await;
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = ws
            .send(WsMessage::Text(
                r#"{"type":"ID-TAKEN","payload":{"msg":"ID is taken"}}"#.into(),
            ))
            .await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut link = PeerServerLink::new(config);
    let (sink, mut rx) = SignalSink::detached();
    link.register(Some(PeerId::from("screen-taken")), sink).unwrap();

    assert!(matches!(
        next_event(&mut rx).await,
        SignalEvent::Error { kind: SignalingErrorKind::UnavailableId, message }
            if message == "ID is taken"
    ));
    for _ in 0..100 {
        if !link.is_registered() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!link.is_registered());
}

#[tokio::test]
async fn dropped_socket_reconnects_on_request() {
    let (listener, config) = local_server().await;
    tokio::spawn(async move {
        // First session: open, then drop the socket.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = ws.send(WsMessage::Text(r#"{"type":"OPEN"}"#.into())).await;
        drop(ws);

        // Second session: open and stay up.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let _ = ws.send(WsMessage::Text(r#"{"type":"OPEN"}"#.into())).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut link = PeerServerLink::new(config);
    let (sink, mut rx) = SignalSink::detached();
    link.register(Some(PeerId::from("screen-r")), sink).unwrap();

    assert!(matches!(next_event(&mut rx).await, SignalEvent::Open { .. }));
    assert!(matches!(next_event(&mut rx).await, SignalEvent::Disconnected));

    link.reconnect().unwrap();
    assert!(matches!(
        next_event(&mut rx).await,
        SignalEvent::Open { id } if id.as_str() == "screen-r"
    ));
    link.destroy();
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let (listener, config) = local_server().await;
    drop(listener);

    let mut link = PeerServerLink::new(config);
    let (sink, mut rx) = SignalSink::detached();
    link.register(None, sink).unwrap();

    assert!(matches!(
        next_event(&mut rx).await,
        SignalEvent::Error { kind: SignalingErrorKind::Network, .. }
    ));
    assert!(link.id().is_some());
}
