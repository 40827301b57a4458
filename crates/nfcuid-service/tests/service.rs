//! End-to-end runs of the service in both input modes.

use nfcuid_core::{CharFlag, Config, FormatOptions, InputMode, MqttConfig, OutputTarget, TcpConfig};
use nfcuid_hardware::mock::{MockKeyboard, MockKeyboardHandle, MockReader};
use nfcuid_hardware::{AnyKeyboard, ReaderStatus};
use nfcuid_network::{InboundMessage, MqttConnection, TcpSink};
use nfcuid_service::{DispatchOutcome, OutputDispatcher, OutputSink, Service};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn keyboard_service(format: FormatOptions) -> (Service, MockKeyboardHandle) {
    let (keyboard, handle) = MockKeyboard::new();
    let config = Config {
        format,
        ..Config::default()
    };
    let dispatcher = OutputDispatcher::new(OutputSink::Keyboard(AnyKeyboard::Mock(keyboard)));
    (Service::new(config, dispatcher), handle)
}

#[tokio::test]
async fn test_mqtt_payloads_are_dispatched_in_order() {
    let format = FormatOptions::default()
        .with_caps_lock(true)
        .with_in_char(CharFlag::Colon);
    let (mut service, keyboard) = keyboard_service(format);

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(InboundMessage::new("nfcuid/reader", b"0A:BC".to_vec()))
        .unwrap();
    tx.send(InboundMessage::new("nfcuid/reader", Vec::new()))
        .unwrap();
    tx.send(InboundMessage::new("nfcuid/reader", b"zz:01\n".to_vec()))
        .unwrap();
    drop(tx);

    service.run_mqtt(rx, CancellationToken::new()).await.unwrap();

    assert_eq!(keyboard.typed(), vec!["0A:BC", "01"]);
}

#[tokio::test]
async fn test_mqtt_get_as_decimal() {
    let format = FormatOptions::default().with_get_as_decimal(true);
    let (mut service, keyboard) = keyboard_service(format);

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(InboundMessage::new("nfcuid/reader", b"DE:AD:BE:EF".to_vec()))
        .unwrap();
    drop(tx);

    service.run_mqtt(rx, CancellationToken::new()).await.unwrap();

    assert_eq!(keyboard.typed(), vec!["3735928559"]);
}

#[tokio::test]
async fn test_mqtt_stops_on_cancel() {
    let (mut service, keyboard) = keyboard_service(FormatOptions::default());
    let (_tx, rx) = mpsc::unbounded_channel::<InboundMessage>();

    let cancel = CancellationToken::new();
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), service.run_mqtt(rx, cancel))
        .await
        .expect("ingest should stop once cancelled")
        .unwrap();
    assert!(keyboard.typed().is_empty());
}

#[tokio::test]
async fn test_reader_mode_until_cancelled() {
    let (mut service, keyboard) = keyboard_service(FormatOptions::default().with_reverse(true));
    let (reader, handle) = MockReader::new(vec!["Reader 0".to_string()]);
    handle.push_status(ReaderStatus::PRESENT);
    handle.push_response(vec![0x01, 0x02, 0x03, 0x90, 0x00]);
    handle.push_status(ReaderStatus::EMPTY);
    handle.block_when_idle(true);

    let cancel = CancellationToken::new();
    let (result, _) = tokio::join!(
        service.run_reader(&reader, "Reader 0", cancel.clone()),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        }
    );

    assert!(result.is_ok());
    assert_eq!(keyboard.typed(), vec!["030201"]);
    assert_eq!(handle.open_connections(), 0);
}

#[tokio::test]
async fn test_mqtt_to_tcp_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.split();
        let mut line = String::new();
        BufReader::new(reader).read_line(&mut line).await.unwrap();
        writer.write_all(b"OK\n").await.unwrap();
        line
    });

    let tcp = TcpConfig::new(addr.ip().to_string(), addr.port());
    let config = Config {
        format: FormatOptions::default().with_in_char(CharFlag::Hyphen),
        input: InputMode::Mqtt {
            topic: "nfcuid/reader".to_string(),
        },
        output: OutputTarget::Tcp(tcp.clone()),
        ..Config::default()
    };
    let dispatcher = OutputDispatcher::new(OutputSink::Tcp(TcpSink::new(&tcp)));
    let mut service = Service::new(config, dispatcher);

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(InboundMessage::new("nfcuid/reader", b"04:a1".to_vec()))
        .unwrap();
    drop(tx);

    service.run_mqtt(rx, CancellationToken::new()).await.unwrap();

    assert_eq!(peer.await.unwrap(), "04-a1\n");
}

#[tokio::test]
async fn test_mqtt_cancel_during_stuck_tcp_delivery() {
    // Peer accepts and never answers; the sink has no I/O timeout.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let tcp = TcpConfig::new(addr.ip().to_string(), addr.port());
    let config = Config {
        output: OutputTarget::Tcp(tcp.clone()),
        ..Config::default()
    };
    let dispatcher = OutputDispatcher::new(OutputSink::Tcp(TcpSink::new(&tcp)));
    let mut service = Service::new(config, dispatcher);

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(InboundMessage::new("nfcuid/reader", b"04:a1".to_vec()))
        .unwrap();

    let cancel = CancellationToken::new();
    let (result, _) = tokio::join!(
        tokio::time::timeout(
            Duration::from_secs(3),
            service.run_mqtt(rx, cancel.clone())
        ),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        }
    );

    result
        .expect("ingest should stop once cancelled")
        .unwrap();
    drop(tx);
}

#[tokio::test]
async fn test_mqtt_publish_sink_reports_closed_session() {
    // Accepts the CONNECT, then swallows everything until the client leaves.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 256];
        let _ = stream.read(&mut buf).await.unwrap();
        stream.write_all(&[0x20, 0x02, 0x00, 0x00]).await.unwrap();
        while matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {}
    });

    let mut mqtt = MqttConfig::new(addr.ip().to_string());
    mqtt.port = addr.port();
    let connection = MqttConnection::connect(&mqtt, None).await.unwrap();
    let mut dispatcher =
        OutputDispatcher::new(OutputSink::MqttPublish(connection.publisher("nfcuid/output")));

    assert_eq!(dispatcher.sink().kind(), "mqtt");
    assert_eq!(dispatcher.dispatch("04AB").await, DispatchOutcome::Delivered);

    connection.disconnect(Duration::from_millis(500)).await;
    assert_eq!(dispatcher.dispatch("04AC").await, DispatchOutcome::Failed);
}
