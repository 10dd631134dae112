//! Tests for message dispatch and turn deadlines.

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use turf_duel::{
    AbortReason, ActionKind, BoardConfig, CardCatalog, ClientMessage, ErrorReason, GameServer,
    Play, PlayerId, ServerConfig, ServerMessage, SessionId, SessionRegistry,
};
use uuid::Uuid;

fn server(turn_timeout: Option<Duration>) -> GameServer {
    let registry = SessionRegistry::new(CardCatalog::builtin(), BoardConfig::default());
    GameServer::with_registry(registry, turn_timeout, Duration::from_secs(30))
}

fn join(server: &GameServer) -> (PlayerId, UnboundedReceiver<ServerMessage>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = server.registry().connect(tx);
    let _ = rx.try_recv();
    (id, rx)
}

fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

fn action(game: SessionId, x: i32, y: i32) -> String {
    format!(
        r#"{{"type":"action","gameId":"{}","card":"dot","action":"play","x":{},"y":{},"turns":0,"special":false}}"#,
        game, x, y
    )
}

fn pair(server: &GameServer, a: PlayerId, b: PlayerId) -> SessionId {
    assert_eq!(server.dispatch(a, ClientMessage::Request { id: b }), None);
    assert_eq!(server.dispatch(b, ClientMessage::Accept { id: a }), None);
    server.registry().session_of(a).expect("session started")
}

#[tokio::test]
async fn test_text_frames_drive_a_turn() {
    let server = server(None);
    let (a, mut rx_a) = join(&server);
    let (b, mut rx_b) = join(&server);
    let game = pair(&server, a, b);
    drain(&mut rx_a);
    drain(&mut rx_b);

    assert_eq!(server.dispatch_text(a, &action(game, 4, 5)), None);
    assert_eq!(server.dispatch_text(b, &action(game, 4, 5)), None);
    assert!(matches!(drain(&mut rx_a).as_slice(), [ServerMessage::Results { .. }]));
    assert!(matches!(drain(&mut rx_b).as_slice(), [ServerMessage::Results { .. }]));
}

#[tokio::test]
async fn test_illegal_play_gets_rejected_reply() {
    let server = server(None);
    let (a, _rx_a) = join(&server);
    let (b, _rx_b) = join(&server);
    let game = pair(&server, a, b);

    match server.dispatch_text(a, &action(game, 0, 0)) {
        Some(ServerMessage::Rejected { reason, .. }) => assert_eq!(reason, "too_far_from_owned"),
        other => panic!("expected rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_routing_failures_reply_with_error() {
    let server = server(None);
    let (a, _rx_a) = join(&server);
    let (b, _rx_b) = join(&server);

    assert_eq!(
        server.dispatch(a, ClientMessage::Request { id: a }),
        Some(ServerMessage::error(ErrorReason::SelfRequest))
    );
    assert_eq!(
        server.dispatch(b, ClientMessage::Accept { id: a }),
        Some(ServerMessage::error(ErrorReason::NoSuchRequest))
    );
    assert_eq!(
        server.dispatch_text(a, &action(Uuid::new_v4(), 4, 5)),
        Some(ServerMessage::error(ErrorReason::UnknownSession))
    );
}

#[tokio::test]
async fn test_undecodable_frames_are_dropped() {
    let server = server(None);
    let (a, mut rx_a) = join(&server);

    assert_eq!(server.dispatch_text(a, "{"), None);
    assert_eq!(server.dispatch_text(a, r#"{"type":"dance"}"#), None);
    assert_eq!(server.dispatch_text(a, r#"{"type":"pong"}"#), None);
    assert!(drain(&mut rx_a).is_empty());
    assert_eq!(server.registry().connection_count(), 1);
}

#[tokio::test]
async fn test_turn_deadline_aborts_stalled_session() {
    let server = server(Some(Duration::from_millis(50)));
    let (a, mut rx_a) = join(&server);
    let (b, mut rx_b) = join(&server);
    let game = pair(&server, a, b);
    drain(&mut rx_a);
    drain(&mut rx_b);

    server.dispatch_text(a, &action(game, 4, 5));
    tokio::time::sleep(Duration::from_millis(300)).await;

    let aborted = ServerMessage::Aborted {
        id: game,
        reason: AbortReason::Timeout,
    };
    assert_eq!(drain(&mut rx_a), vec![aborted.clone()]);
    assert_eq!(drain(&mut rx_b), vec![aborted]);
    assert_eq!(server.registry().session_count(), 0);
}

#[tokio::test]
async fn test_turn_deadline_spares_resolved_turn() {
    let server = server(Some(Duration::from_millis(50)));
    let (a, _rx_a) = join(&server);
    let (b, _rx_b) = join(&server);
    let game = pair(&server, a, b);

    server.dispatch_text(a, &action(game, 4, 5));
    server.dispatch_text(b, &action(game, 4, 5));
    tokio::time::sleep(Duration::from_millis(300)).await;

    let session = server.registry().session(game).expect("session alive");
    assert_eq!(session.turn(), 2);
}

#[test]
fn test_from_config_uses_board_settings() {
    let config = ServerConfig::default()
        .with_board(BoardConfig::default().with_width(10).with_height(6))
        .with_turn_timeout_secs(Some(0));
    let server = GameServer::from_config(&config).expect("valid config");
    assert!(server.registry().catalog().get("dot").is_some());
    assert_eq!(config.turn_timeout(), None);
}

#[test]
fn test_from_config_rejects_bad_board() {
    let config = ServerConfig::default().with_board(BoardConfig::default().with_width(1));
    assert!(GameServer::from_config(&config).is_err());
    let config =
        ServerConfig::default().with_board(BoardConfig::default().with_width(usize::MAX));
    assert!(GameServer::from_config(&config).is_err());
}

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: std::net::SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("websocket handshake");
    ws
}

async fn send(ws: &mut Client, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).expect("serializable");
    ws.send(Message::text(json)).await.expect("send frame");
}

async fn receive(ws: &mut Client) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("frame before deadline")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("server message");
        }
    }
}

#[tokio::test]
async fn test_socket_close_aborts_session_for_peer() {
    let server = server(None);
    let registry = server.registry().clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(server.serve(listener));

    let mut ws_a = connect(addr).await;
    let ServerMessage::Id { id: a } = receive(&mut ws_a).await else {
        panic!("expected id");
    };
    let mut ws_b = connect(addr).await;
    let ServerMessage::Id { id: b } = receive(&mut ws_b).await else {
        panic!("expected id");
    };

    send(&mut ws_a, &ClientMessage::Request { id: b }).await;
    assert_eq!(receive(&mut ws_b).await, ServerMessage::Request { id: a });
    send(&mut ws_b, &ClientMessage::Accept { id: a }).await;
    let ServerMessage::Start { id: game, first, .. } = receive(&mut ws_a).await else {
        panic!("expected start");
    };
    assert_eq!(first, a);
    assert!(matches!(receive(&mut ws_b).await, ServerMessage::Start { .. }));

    let play = Play::new("dot".to_string(), ActionKind::Play, 4, 5, 0, false);
    send(&mut ws_a, &ClientMessage::Action { game_id: game, play }).await;
    drop(ws_a);

    assert_eq!(
        receive(&mut ws_b).await,
        ServerMessage::Aborted {
            id: game,
            reason: AbortReason::Disconnect,
        }
    );
    assert_eq!(registry.session_count(), 0);
    assert_eq!(registry.connection_count(), 1);
}
