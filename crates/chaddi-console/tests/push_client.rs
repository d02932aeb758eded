use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use chaddi_console::{Emit, PushClient, PushConfig, PushEvent};
use crossbeam_channel::{unbounded, Sender};
use serde_json::{json, Value};
use tungstenite::{accept, Message, WebSocket};

/// Reads text frames until one satisfies `want`, reporting each to `seen`.
fn read_until(ws: &mut WebSocket<TcpStream>, seen: &Sender<String>, want: impl Fn(&str) -> bool) {
    loop {
        match ws.read() {
            Ok(Message::Text(text)) => {
                let text = text.as_str().to_string();
                let done = want(&text);
                let _ = seen.send(text);
                if done {
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => panic!("fake server read failed: {}", e),
        }
    }
}

/// Minimal Engine.IO v4 / Socket.IO v5 peer for a single session.
fn fake_server(listener: TcpListener, seen: Sender<String>) {
    let (stream, _) = listener.accept().unwrap();
    let mut ws = match accept(stream) {
        Ok(ws) => ws,
        Err(_) => panic!("websocket handshake failed"),
    };

    let open = json!({
        "sid": "engine-sid",
        "upgrades": [],
        "pingInterval": 25000,
        "pingTimeout": 20000,
        "maxPayload": 1000000,
    });
    ws.send(Message::text(format!("0{}", open))).unwrap();
    read_until(&mut ws, &seen, |t| t == "40");
    ws.send(Message::text(r#"40{"sid":"socket-sid"}"#)).unwrap();

    // queued emits are flushed right after the namespace connect
    read_until(&mut ws, &seen, |t| t.contains("start_log_stream"));

    ws.send(Message::text("2")).unwrap();
    read_until(&mut ws, &seen, |t| t == "3");

    let line = json!(["log_line", { "content": "2024-01-05 14:30:00.123 INFO bot started" }]);
    ws.send(Message::text(format!("42{}", line))).unwrap();
    let error = json!(["log_error", {}]);
    ws.send(Message::text(format!("42{}", error))).unwrap();

    read_until(&mut ws, &seen, |t| t == "41");
}

fn event_payload(frame: &str) -> Value {
    serde_json::from_str(frame.strip_prefix("42").unwrap()).unwrap()
}

#[test]
fn test_push_session_against_fake_server() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (seen_tx, seen_rx) = unbounded();
    let server = std::thread::spawn(move || fake_server(listener, seen_tx));

    let mut client =
        PushClient::connect(PushConfig::new(format!("http://127.0.0.1:{}", port), "/socket.io"))
            .unwrap();
    client.emit(Emit::hello()).unwrap();
    client.emit(Emit::StartLogStream).unwrap();

    let recv = || client.events().recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(recv(), PushEvent::Connected);
    assert_eq!(
        recv(),
        PushEvent::LogLine {
            content: "2024-01-05 14:30:00.123 INFO bot started".to_string()
        }
    );
    assert_eq!(
        recv(),
        PushEvent::LogError {
            message: "unknown error".to_string()
        }
    );

    client.disconnect();
    server.join().unwrap();

    let frames: Vec<String> = seen_rx.try_iter().collect();
    assert_eq!(frames[0], "40");
    assert_eq!(event_payload(&frames[1]), json!(["command", { "data": "I'm connected!" }]));
    assert_eq!(event_payload(&frames[2]), json!(["start_log_stream"]));
    assert_eq!(frames[3], "3");
    assert_eq!(frames.last().map(String::as_str), Some("41"));
}

#[test]
fn test_disconnect_while_upgrade_stalls() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (release_tx, release_rx) = unbounded::<()>();
    // accepts the connection and never answers the upgrade request
    let server = std::thread::spawn(move || {
        let (_stream, _) = listener.accept().unwrap();
        let _ = release_rx.recv_timeout(Duration::from_secs(30));
    });

    let mut client =
        PushClient::connect(PushConfig::new(format!("http://127.0.0.1:{}", port), "/socket.io"))
            .unwrap();
    std::thread::sleep(Duration::from_millis(300));

    let (done_tx, done_rx) = unbounded();
    std::thread::spawn(move || {
        client.disconnect();
        let _ = done_tx.send(());
    });

    let result = done_rx.recv_timeout(Duration::from_secs(5));
    let _ = release_tx.send(());
    server.join().unwrap();
    assert!(result.is_ok(), "disconnect did not return while the upgrade was stalled");
}
